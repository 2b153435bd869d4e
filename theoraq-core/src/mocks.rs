// theoraq-core/src/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for unit tests and for dependents that enable the "test-mocks" feature.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};

use crate::encoder::{EncoderProcess, EncoderSpawner, ProcessSignaller, display_command};
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::progress::OutputStream;

/// Counts the signals a mock process received.
#[derive(Debug, Default)]
pub struct SignalLog {
    terminates: AtomicUsize,
    kills: AtomicUsize,
}

impl SignalLog {
    pub fn terminates(&self) -> usize {
        self.terminates.load(Ordering::SeqCst)
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

/// What one mock encoder run does.
#[derive(Debug, Clone)]
pub struct MockScript {
    lines: Vec<String>,
    hold_open: bool,
    honor_terminate: bool,
    spawn_error: Option<io::ErrorKind>,
    signals: Arc<SignalLog>,
}

impl MockScript {
    /// Emits `lines` and exits with code 0.
    pub fn lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            hold_open: false,
            honor_terminate: true,
            spawn_error: None,
            signals: Arc::new(SignalLog::default()),
        }
    }

    /// Fails to spawn with an I/O error of the given kind.
    pub fn spawn_error(kind: io::ErrorKind) -> Self {
        Self {
            spawn_error: Some(kind),
            ..Self::lines(&[])
        }
    }

    /// Keeps the output open after the lines until the process is signalled.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Only a forced kill ends the process.
    pub fn ignore_terminate(mut self) -> Self {
        self.honor_terminate = false;
        self
    }

    /// Signal counters, readable after the script was handed to the spawner.
    pub fn signals(&self) -> Arc<SignalLog> {
        Arc::clone(&self.signals)
    }
}

/// Mock implementation of EncoderSpawner playing scripts in push order.
#[derive(Default)]
pub struct MockSpawner {
    scripts: Mutex<VecDeque<MockScript>>,
    received_calls: Mutex<Vec<Vec<OsString>>>,
}

impl MockSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, script: MockScript) {
        lock(&self.scripts).push_back(script);
    }

    /// Command lines of every spawn attempt, in order.
    pub fn received_calls(&self) -> Vec<Vec<OsString>> {
        lock(&self.received_calls).clone()
    }
}

impl EncoderSpawner for MockSpawner {
    fn spawn(&self, argv: &[OsString], _stream: OutputStream) -> CoreResult<Box<dyn EncoderProcess>> {
        lock(&self.received_calls).push(argv.to_vec());

        let script = lock(&self.scripts)
            .pop_front()
            .ok_or_else(|| CoreError::OperationFailed(format!("unexpected spawn: {}", display_command(argv))))?;
        if let Some(kind) = script.spawn_error {
            let program = argv.first().map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
            return Err(command_start_error(program, io::Error::new(kind, "mock spawn failure")));
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        for line in &script.lines {
            // The receiver is alive until the reader is dropped.
            let _ = tx.send(format!("{line}\n").into_bytes());
        }
        let writer = Arc::new(Mutex::new(script.hold_open.then_some(tx)));

        Ok(Box::new(MockProcess {
            output: Some(Box::new(ChannelReader { rx, pending: Vec::new() })),
            signaller: Arc::new(MockSignaller {
                writer,
                honor_terminate: script.honor_terminate,
                log: script.signals,
            }),
        }))
    }
}

/// Mock implementation of EncoderProcess.
pub struct MockProcess {
    output: Option<Box<dyn Read + Send>>,
    signaller: Arc<MockSignaller>,
}

impl EncoderProcess for MockProcess {
    fn take_output(&mut self) -> Option<Box<dyn Read + Send>> {
        self.output.take()
    }

    fn signaller(&self) -> Arc<dyn ProcessSignaller> {
        self.signaller.clone()
    }

    fn wait(&mut self) -> CoreResult<Option<i32>> {
        Ok(Some(0))
    }
}

/// Closes the mock output when a signal would end the process.
pub struct MockSignaller {
    writer: Arc<Mutex<Option<Sender<Vec<u8>>>>>,
    honor_terminate: bool,
    log: Arc<SignalLog>,
}

impl ProcessSignaller for MockSignaller {
    fn terminate(&self) -> CoreResult<()> {
        self.log.terminates.fetch_add(1, Ordering::SeqCst);
        if self.honor_terminate {
            lock(&self.writer).take();
        }
        Ok(())
    }

    fn kill(&self) -> CoreResult<()> {
        self.log.kills.fetch_add(1, Ordering::SeqCst);
        lock(&self.writer).take();
        Ok(())
    }
}

/// Blocking reader fed by a channel; end of file once all senders are gone.
struct ChannelReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv() {
                Ok(chunk) => self.pending = chunk,
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
