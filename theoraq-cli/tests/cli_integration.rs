use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::error::Error;
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn theoraq_cmd() -> Command {
    let mut cmd = Command::cargo_bin("theoraq").expect("Failed to find theoraq binary");
    cmd.env_remove("THEORAQ_ENCODER").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    theoraq_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("encode").and(contains("probe")));
}

#[test]
fn test_encode_non_existent_input() {
    theoraq_cmd()
        .args(["encode", "surely/this/does/not/exist/input.avi", "--progress-format", "json"])
        .assert()
        .failure()
        .stderr(contains("Cannot read input"));
}

#[test]
fn test_output_with_several_inputs_is_rejected() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let a = dir.path().join("a.avi");
    let b = dir.path().join("b.avi");
    std::fs::write(&a, "dummy")?;
    std::fs::write(&b, "dummy")?;

    theoraq_cmd()
        .arg("encode")
        .arg(&a)
        .arg(&b)
        .args(["-o", "out.ogv"])
        .assert()
        .failure()
        .stderr(contains("--output can only be used with a single input"));
    Ok(())
}

#[test]
fn test_encode_invalid_mode() {
    theoraq_cmd()
        .args(["encode", "a.avi", "--mode", "parallel"])
        .assert()
        .failure()
        .stderr(contains("unknown encode mode"));
}

#[cfg(unix)]
mod fake_encoder {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("ffmpeg2theora");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Encoder that records its arguments and reports success.
    fn succeeding_encoder(dir: &Path) -> PathBuf {
        let args_file = dir.join("args");
        write_script(
            dir,
            &format!(
                r#"if [ "$1" = "--help" ]; then echo "ffmpeg2theora 0.27"; exit 0; fi
printf '%s\n' "$@" > "{}"
echo '{{"duration": 10}}'
echo '{{"position": 5, "remaining": 5}}'
echo '{{"result": "ok"}}'"#,
                args_file.display()
            ),
        )
    }

    #[test]
    fn test_probe_json_output() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let encoder = write_script(dir.path(), r#"echo "ffmpeg2theora 0.20""#);

        theoraq_cmd()
            .args(["probe", "--json", "--encoder"])
            .arg(&encoder)
            .assert()
            .success()
            .stdout(contains(r#""progress_format": "key-value""#).and(contains(r#""supports_subtitles": false"#)));
        Ok(())
    }

    #[test]
    fn test_probe_missing_encoder() {
        theoraq_cmd()
            .args(["probe", "--encoder", "/nonexistent/ffmpeg2theora"])
            .assert()
            .failure()
            .stderr(contains("was not found"));
    }

    #[test]
    fn test_encode_success_as_json() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let encoder = succeeding_encoder(dir.path());
        let input = dir.path().join("clip.avi");
        fs::write(&input, "dummy")?;
        let out_dir = dir.path().join("out");

        theoraq_cmd()
            .env("THEORAQ_ENCODER", &encoder)
            .arg("encode")
            .arg(&input)
            .args(["--json", "--videoquality", "6", "--output-dir"])
            .arg(&out_dir)
            .assert()
            .success()
            .stdout(
                contains(r#""type":"job_added""#)
                    .and(contains(r#""status":"encoding  50 % done / 00:00:05""#))
                    .and(contains(r#""type":"summary""#))
                    .and(contains(r#""succeeded":1"#)),
            );

        let args = fs::read_to_string(dir.path().join("args"))?;
        let args: Vec<&str> = args.lines().collect();
        assert_eq!(args[0], "--frontend");
        assert_eq!(&args[1..3], ["--videoquality", "6.0"]);
        assert_eq!(args[3], input.to_str().unwrap());
        assert_eq!(args[5], out_dir.join("clip.ogv").to_str().unwrap());
        Ok(())
    }

    #[test]
    fn test_encode_failure_sets_exit_code() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let encoder = write_script(
            dir.path(),
            r#"echo "f2t ;duration: 10;" >&2
echo "f2t ;result: Unable to decode input.;" >&2
exit 1"#,
        );
        let input = dir.path().join("broken.avi");
        fs::write(&input, "dummy")?;

        theoraq_cmd()
            .arg("encode")
            .arg(&input)
            .args(["--progress-format", "key-value", "--encoder"])
            .arg(&encoder)
            .assert()
            .failure()
            .stdout(contains("Unable to decode input.").and(contains("Encoded 0 of 1 file(s)")));
        Ok(())
    }

    #[test]
    fn test_interrupt_cancels_encode_and_prints_summary() -> Result<(), Box<dyn Error>> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;
        use std::io::Read;
        use std::process::Stdio;
        use std::thread::sleep;
        use std::time::{Duration, Instant};

        let dir = tempdir()?;
        let started = dir.path().join("started");
        let encoder = write_script(
            dir.path(),
            &format!(
                r#"touch "{}"
echo '{{"duration": 100}}'
exec sleep 30"#,
                started.display()
            ),
        );
        let input = dir.path().join("long.avi");
        fs::write(&input, "dummy")?;

        let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("theoraq"))
            .arg("encode")
            .arg(&input)
            .args(["--progress-format", "json", "--encoder"])
            .arg(&encoder)
            .env_remove("RUST_LOG")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let deadline = Instant::now() + Duration::from_secs(10);
        while !started.exists() {
            assert!(Instant::now() < deadline, "encoder never started");
            sleep(Duration::from_millis(20));
        }
        kill(Pid::from_raw(child.id() as i32), Signal::SIGINT)?;

        let deadline = Instant::now() + Duration::from_secs(10);
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() > deadline {
                child.kill()?;
                panic!("theoraq did not exit after the interrupt");
            }
            sleep(Duration::from_millis(20));
        };

        let mut stdout = String::new();
        child.stdout.take().expect("stdout is piped").read_to_string(&mut stdout)?;
        assert_eq!(status.code(), Some(1));
        assert!(stdout.contains("Encoding cancelled."), "{stdout}");
        assert!(stdout.contains("Encoded 0 of 1 file(s)"), "{stdout}");
        assert!(stdout.contains("1 cancelled"), "{stdout}");
        Ok(())
    }

    #[test]
    fn test_log_dir_receives_session_log() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let encoder = succeeding_encoder(dir.path());
        let input = dir.path().join("clip.avi");
        fs::write(&input, "dummy")?;
        let log_dir = dir.path().join("logs");

        theoraq_cmd()
            .arg("encode")
            .arg(&input)
            .arg("--encoder")
            .arg(&encoder)
            .arg("--log-dir")
            .arg(&log_dir)
            .assert()
            .success()
            .stderr(contains("Logging to"));

        let logs: Vec<_> = fs::read_dir(&log_dir)?.collect::<Result<_, _>>()?;
        assert_eq!(logs.len(), 1);
        let name = logs[0].file_name().to_string_lossy().into_owned();
        assert!(name.starts_with("theoraq_") && name.ends_with(".log"), "{name}");
        let contents = fs::read_to_string(logs[0].path())?;
        assert!(contents.contains("Encoding 1 file(s)"), "{contents}");
        assert!(contents.contains("Encoding done."), "{contents}");
        Ok(())
    }
}
