// theoraq-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use theoraq_core::config::DEFAULT_MAX_CONCURRENT_JOBS;
use theoraq_core::encoder::DEFAULT_ENCODER;
use theoraq_core::{EncodeMode, EncodeOptions, ProgressFormat};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "theoraq: Encoding queue for ffmpeg2theora",
    long_about = "Queues video files and encodes them to Ogg Theora with ffmpeg2theora, showing live progress per file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Queues video files and encodes them
    Encode(EncodeArgs),
    /// Shows what the installed encoder supports
    Probe(ProbeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EncoderArgs {
    /// ffmpeg2theora binary to run
    #[arg(long, value_name = "PATH", env = "THEORAQ_ENCODER", default_value = DEFAULT_ENCODER)]
    pub encoder: PathBuf,
}

/// Encoder options passed through to ffmpeg2theora. Zero values are omitted.
#[derive(Args, Debug, Clone, Default)]
pub struct OptionArgs {
    /// Output frame width
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Output frame height
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Video quality, 0 to 10
    #[arg(long, value_name = "QUALITY")]
    pub videoquality: Option<f64>,

    /// Audio quality, -2 to 10
    #[arg(long, value_name = "QUALITY", allow_negative_numbers = true)]
    pub audioquality: Option<f64>,

    /// Video bitrate in kbps
    #[arg(long, value_name = "KBPS")]
    pub videobitrate: Option<u32>,

    /// Audio bitrate in kbps
    #[arg(long, value_name = "KBPS")]
    pub audiobitrate: Option<u32>,

    /// Audio sample rate in Hz
    #[arg(long, value_name = "HZ")]
    pub samplerate: Option<u32>,

    /// Output frame rate, e.g. 25 or 30000:1001
    #[arg(long, value_name = "RATE")]
    pub framerate: Option<String>,
}

impl OptionArgs {
    pub fn to_options(&self) -> EncodeOptions {
        EncodeOptions {
            width: self.width,
            height: self.height,
            videoquality: self.videoquality,
            audioquality: self.audioquality,
            videobitrate: self.videobitrate,
            audiobitrate: self.audiobitrate,
            samplerate: self.samplerate,
            framerate: self.framerate.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Video files to queue, encoded in the given order
    #[arg(required = true, num_args = 1.., value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub options: OptionArgs,

    #[command(flatten)]
    pub encoder: EncoderArgs,

    /// batch: encode one file at a time after queueing; immediate: start each file as it is queued
    #[arg(long, value_name = "MODE", default_value = "batch")]
    pub mode: EncodeMode,

    /// Encodes allowed to run at once in immediate mode
    #[arg(short = 'j', long, value_name = "N", default_value_t = DEFAULT_MAX_CONCURRENT_JOBS,
          value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub jobs: usize,

    /// Progress grammar of the encoder; auto asks the encoder
    #[arg(long, value_name = "FORMAT", default_value = "auto")]
    pub progress_format: ProgressFormat,

    /// Output file (single input only)
    #[arg(short = 'o', long, value_name = "FILE", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Directory for encoded files (defaults to next to each input)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print JSON lines instead of progress rows
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Write a timestamped log file into this directory
    #[arg(short, long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub encoder: EncoderArgs,

    /// Print the capabilities as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
