//! User-facing encode options and their mapping onto encoder flags.
//!
//! Only options that are set and truthy end up on the command line; the
//! encoder's own defaults apply to everything else.

use serde::{Deserialize, Serialize};

/// Options chosen for one queued file.
///
/// Field names match the encoder's long flags (`--width`, `--videoquality`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub videoquality: Option<f64>,
    pub audioquality: Option<f64>,
    /// Video bitrate in kb/s
    pub videobitrate: Option<u32>,
    /// Audio bitrate in kb/s
    pub audiobitrate: Option<u32>,
    pub samplerate: Option<u32>,
    /// Output framerate, either a plain number or `num:den`
    pub framerate: Option<String>,
}

impl EncodeOptions {
    /// Derives the ordered encoder argument list for these options.
    ///
    /// Integer options come first, then the quality floats, then the
    /// bitrate/rate options.
    ///
    /// ```rust
    /// use theoraq_core::EncodeOptions;
    ///
    /// let options = EncodeOptions {
    ///     width: Some(640),
    ///     videoquality: Some(7.0),
    ///     audioquality: Some(0.0),
    ///     ..Default::default()
    /// };
    /// assert_eq!(options.to_settings(), vec!["--width", "640", "--videoquality", "7.0"]);
    /// ```
    pub fn to_settings(&self) -> Vec<String> {
        let mut settings = Vec::new();

        for (flag, value) in [("--width", self.width), ("--height", self.height)] {
            push_integer(&mut settings, flag, value);
        }

        for (flag, value) in [
            ("--videoquality", self.videoquality),
            ("--audioquality", self.audioquality),
        ] {
            if let Some(value) = value.filter(|v| *v != 0.0 && v.is_finite()) {
                settings.push(flag.to_string());
                settings.push(format_float(value));
            }
        }

        for (flag, value) in [
            ("--videobitrate", self.videobitrate),
            ("--audiobitrate", self.audiobitrate),
            ("--samplerate", self.samplerate),
        ] {
            push_integer(&mut settings, flag, value);
        }

        if let Some(rate) = self.framerate.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            settings.push("--framerate".to_string());
            settings.push(rate.to_string());
        }

        settings
    }
}

fn push_integer(settings: &mut Vec<String>, flag: &str, value: Option<u32>) {
    if let Some(value) = value.filter(|v| *v != 0) {
        settings.push(flag.to_string());
        settings.push(value.to_string());
    }
}

/// Renders a float the way the encoder expects it: always with a decimal part.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_options_produce_no_settings() {
        assert!(EncodeOptions::default().to_settings().is_empty());
    }

    #[test]
    fn test_settings_order_and_formatting() {
        let options = EncodeOptions {
            width: Some(320),
            height: Some(240),
            videoquality: Some(5.0),
            audioquality: Some(1.5),
            ..Default::default()
        };
        assert_eq!(
            options.to_settings(),
            vec![
                "--width", "320", "--height", "240", "--videoquality", "5.0",
                "--audioquality", "1.5",
            ]
        );
    }

    #[test]
    fn test_falsy_values_are_omitted() {
        let options = EncodeOptions {
            width: Some(0),
            height: None,
            videoquality: Some(0.0),
            audioquality: Some(-1.0),
            framerate: Some("  ".to_string()),
            ..Default::default()
        };
        // Negative audio quality is valid for the encoder and only zero counts as unset.
        assert_eq!(options.to_settings(), vec!["--audioquality", "-1.0"]);
    }

    #[test]
    fn test_supplementary_rate_options() {
        let options = EncodeOptions {
            videobitrate: Some(600),
            audiobitrate: Some(96),
            samplerate: Some(44100),
            framerate: Some("30000:1001".to_string()),
            ..Default::default()
        };
        assert_eq!(
            options.to_settings(),
            vec![
                "--videobitrate", "600", "--audiobitrate", "96", "--samplerate", "44100",
                "--framerate", "30000:1001",
            ]
        );
    }

    #[test]
    fn test_options_deserialize_with_missing_fields() {
        let options: EncodeOptions =
            serde_json::from_str(r#"{"width": 640, "videoquality": 6.5}"#).unwrap();
        assert_eq!(options.width, Some(640));
        assert_eq!(options.videoquality, Some(6.5));
        assert_eq!(options.height, None);
    }
}
