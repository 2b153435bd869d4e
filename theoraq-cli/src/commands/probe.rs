//! Implementation of the 'probe' subcommand.
//!
//! Runs the encoder's help once and prints what theoraq learned from it.

use console::style;
use theoraq_core::{CoreError, EncoderCapabilities, probe_encoder};

use crate::cli::ProbeArgs;
use crate::error::CliResult;

/// Human-readable rendering of probed capabilities.
pub fn format_capabilities(caps: &EncoderCapabilities) -> Vec<String> {
    let version = caps
        .version
        .map(|(major, minor)| format!("{major}.{minor}"))
        .unwrap_or_else(|| "unknown".to_string());
    vec![
        format!("Encoder:         {}", caps.path.display()),
        format!("Version:         {version}"),
        format!("Progress format: {}", caps.progress_format),
        format!(
            "Subtitles:       {}",
            if caps.supports_subtitles { "yes (kate)" } else { "no" }
        ),
    ]
}

pub fn run_probe(args: ProbeArgs) -> CliResult<EncoderCapabilities> {
    let caps = probe_encoder(&args.encoder.encoder)?;

    if args.json {
        let json = serde_json::to_string_pretty(&caps)
            .map_err(|e| CoreError::OperationFailed(format!("Failed to serialize capabilities: {e}")))?;
        println!("{json}");
    } else {
        println!("{}", style("ENCODER").bold());
        for line in format_capabilities(&caps) {
            println!("  {line}");
        }
    }
    Ok(caps)
}
