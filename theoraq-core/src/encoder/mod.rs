// ============================================================================
// theoraq-core/src/encoder/mod.rs
// ============================================================================
//
// EXTERNAL ENCODER: Interaction with the ffmpeg2theora Binary
//
// This module encapsulates everything that touches the external encoder:
// building its command line, spawning and signalling it, and probing its
// help output once at startup to learn which progress grammar it speaks.
//
// KEY COMPONENTS:
// - build_command_line: argv for one job
// - EncoderSpawner / EncoderProcess / ProcessSignaller: process seams
// - probe_encoder: version and capability detection
//
// DESIGN PHILOSOPHY:
// Consumers can provide their own spawner implementation for testing; the
// default one runs the real binary through std::process.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::error::{CoreResult, command_start_error};
use crate::progress::{LineParser, ProgressFormat};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Command line construction for a single job
pub mod command;

/// Traits and implementations for running the encoder
pub mod process;

pub use command::{FRONTEND_FLAG, build_command_line, display_command};
pub use process::{EncoderProcess, EncoderSpawner, PidSignaller, ProcessSignaller, StdProcess, StdSpawner};

/// Binary name looked up on `PATH` when no encoder path is configured.
pub const DEFAULT_ENCODER: &str = "ffmpeg2theora";

/// First release that reports progress as JSON records.
pub const JSON_PROGRESS_SINCE: (u32, u32) = (0, 21);

/// Marker in the help text of builds with Kate subtitle support.
const SUBTITLES_MARKER: &str = "Subtitles options:";

// ============================================================================
// CAPABILITY PROBING
// ============================================================================

/// What the installed encoder can do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncoderCapabilities {
    pub path: PathBuf,
    /// `(major, minor)` from the help banner, when recognizable
    pub version: Option<(u32, u32)>,
    pub supports_subtitles: bool,
    pub progress_format: ProgressFormat,
}

impl EncoderCapabilities {
    /// Parser for the probed grammar.
    pub fn parser(&self) -> Box<dyn LineParser> {
        self.progress_format.parser()
    }
}

/// Runs `<encoder> --help` and derives the encoder's capabilities.
///
/// # Errors
///
/// * `CoreError::DependencyNotFound` - the binary does not exist
/// * `CoreError::CommandStart` - the binary exists but could not be run
pub fn probe_encoder(encoder: &Path) -> CoreResult<EncoderCapabilities> {
    let output = Command::new(encoder)
        .arg("--help")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| command_start_error(encoder.to_string_lossy(), e))?;

    // The banner has gone to either stream across releases.
    let mut help = String::from_utf8_lossy(&output.stdout).into_owned();
    help.push_str(&String::from_utf8_lossy(&output.stderr));

    let capabilities = capabilities_from_help(encoder, &help);
    log::debug!(
        "Probed {}: version {:?}, progress format {}, subtitles {}",
        encoder.display(),
        capabilities.version,
        capabilities.progress_format,
        capabilities.supports_subtitles
    );
    Ok(capabilities)
}

/// Derives capabilities from help text.
pub fn capabilities_from_help(encoder: &Path, help: &str) -> EncoderCapabilities {
    let version = help.lines().find_map(parse_version_line);
    let progress_format = match version {
        Some(version) if version < JSON_PROGRESS_SINCE => ProgressFormat::KeyValue,
        _ => ProgressFormat::Json,
    };

    EncoderCapabilities {
        path: encoder.to_path_buf(),
        version,
        supports_subtitles: help.contains(SUBTITLES_MARKER),
        progress_format,
    }
}

/// Matches banner lines like `ffmpeg2theora 0.20` or `ffmpeg2theora-0.29 - ...`.
fn parse_version_line(line: &str) -> Option<(u32, u32)> {
    let rest = line.trim().strip_prefix(DEFAULT_ENCODER)?;
    let rest = rest.trim_start_matches([' ', '-', 'v']);
    let token = rest.split_whitespace().next()?;

    let mut parts = token.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor_digits: String = parts.next()?.chars().take_while(char::is_ascii_digit).collect();
    let minor = minor_digits.parse().ok()?;
    Some((major, minor))
}

/// Resolves the grammar to use: an explicit choice wins, `Auto` probes.
pub fn resolve_progress_format(encoder: &Path, configured: ProgressFormat) -> CoreResult<ProgressFormat> {
    match configured {
        ProgressFormat::Auto => Ok(probe_encoder(encoder)?.progress_format),
        explicit => Ok(explicit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_line_variants() {
        assert_eq!(parse_version_line("ffmpeg2theora 0.20"), Some((0, 20)));
        assert_eq!(parse_version_line("ffmpeg2theora-0.29 - built on Jan  1 2012"), Some((0, 29)));
        assert_eq!(parse_version_line("ffmpeg2theora 0.21svn"), Some((0, 21)));
        assert_eq!(parse_version_line("  Usage: ffmpeg2theora [options] input"), None);
        assert_eq!(parse_version_line("something else"), None);
    }

    #[test]
    fn test_old_encoder_uses_key_value_grammar() {
        let help = "ffmpeg2theora 0.19\n\n  Usage: ffmpeg2theora [options] input\n";
        let caps = capabilities_from_help(Path::new("ffmpeg2theora"), help);
        assert_eq!(caps.version, Some((0, 19)));
        assert_eq!(caps.progress_format, ProgressFormat::KeyValue);
        assert!(!caps.supports_subtitles);
    }

    #[test]
    fn test_new_encoder_uses_json_grammar() {
        let help = "ffmpeg2theora 0.24\n\nSubtitles options:\n  --subtitles\n";
        let caps = capabilities_from_help(Path::new("/usr/bin/ffmpeg2theora"), help);
        assert_eq!(caps.progress_format, ProgressFormat::Json);
        assert!(caps.supports_subtitles);
        assert_eq!(caps.parser().name(), "json");
    }

    #[test]
    fn test_unrecognized_banner_defaults_to_json() {
        let caps = capabilities_from_help(Path::new("enc"), "usage: enc [options]\n");
        assert_eq!(caps.version, None);
        assert_eq!(caps.progress_format, ProgressFormat::Json);
    }

    #[test]
    fn test_explicit_format_skips_probe() {
        let format = resolve_progress_format(Path::new("/nonexistent/encoder"), ProgressFormat::KeyValue);
        assert_eq!(format.unwrap(), ProgressFormat::KeyValue);
    }

    #[test]
    fn test_probe_missing_binary() {
        let err = probe_encoder(Path::new("/nonexistent/ffmpeg2theora")).unwrap_err();
        assert!(matches!(err, crate::error::CoreError::DependencyNotFound(_)));
    }
}
