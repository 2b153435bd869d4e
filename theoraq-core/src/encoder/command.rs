//! Encoder command line construction.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use crate::job::JobSpec;

/// Switches the encoder into machine-readable progress output.
pub const FRONTEND_FLAG: &str = "--frontend";

/// Builds `[encoder, --frontend, settings..., input, (-o output)]`.
///
/// Paths are passed through untouched, so file names that are not valid
/// UTF-8 reach the encoder byte for byte.
pub fn build_command_line(encoder: &Path, job: &JobSpec) -> Vec<OsString> {
    let mut argv = Vec::with_capacity(job.settings.len() + 5);
    argv.push(encoder.as_os_str().to_os_string());
    argv.push(OsString::from(FRONTEND_FLAG));
    argv.extend(job.settings.iter().map(OsString::from));
    argv.push(job.input_path.as_os_str().to_os_string());
    if let Some(output) = &job.output_path {
        argv.push(OsString::from("-o"));
        argv.push(output.as_os_str().to_os_string());
    }
    argv
}

/// Lossy, space-joined rendering of a command line for log messages.
pub fn display_command(argv: &[impl AsRef<OsStr>]) -> String {
    argv.iter()
        .map(|arg| arg.as_ref().to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobId;
    use std::path::PathBuf;

    fn spec(output: Option<&str>) -> JobSpec {
        JobSpec {
            id: JobId(1),
            input_path: PathBuf::from("/videos/in.avi"),
            output_path: output.map(PathBuf::from),
            settings: vec!["--width".to_string(), "320".to_string()],
        }
    }

    #[test]
    fn test_command_line_without_output() {
        assert_eq!(
            build_command_line(Path::new("ffmpeg2theora"), &spec(None)),
            vec!["ffmpeg2theora", "--frontend", "--width", "320", "/videos/in.avi"]
        );
    }

    #[test]
    fn test_command_line_with_output() {
        let argv = build_command_line(Path::new("/opt/bin/ffmpeg2theora"), &spec(Some("/out/x.ogv")));
        assert_eq!(argv[0], "/opt/bin/ffmpeg2theora");
        assert_eq!(argv[1], FRONTEND_FLAG);
        assert_eq!(&argv[argv.len() - 3..], ["/videos/in.avi", "-o", "/out/x.ogv"]);
        assert_eq!(
            display_command(&argv),
            "/opt/bin/ffmpeg2theora --frontend --width 320 /videos/in.avi -o /out/x.ogv"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_are_passed_verbatim() {
        use std::os::unix::ffi::OsStrExt;

        let input = OsStr::from_bytes(b"/videos/caf\xe9.avi");
        let output = OsStr::from_bytes(b"/out/caf\xe9.ogv");
        let job = JobSpec {
            input_path: PathBuf::from(input),
            output_path: Some(PathBuf::from(output)),
            ..spec(None)
        };

        let argv = build_command_line(Path::new("ffmpeg2theora"), &job);
        assert_eq!(argv[4].as_bytes(), input.as_bytes());
        assert_eq!(argv[6].as_bytes(), output.as_bytes());
        assert!(display_command(&argv).contains('\u{FFFD}'));
    }
}
