//! Render settings for a synthesis job.
//!
//! Settings arrive as loosely-typed client fields and are validated once at
//! submission into an immutable bundle; nothing downstream re-checks ranges.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::color::Rgb;

/// Minimum words-per-minute rate.
pub const MIN_WPM: u32 = 100;
/// Maximum words-per-minute rate.
pub const MAX_WPM: u32 = 5000;
/// Maximum words shown together in one display unit.
pub const MAX_WORD_GROUPING: u8 = 3;
/// Maximum word count accepted for a single job.
pub const MAX_WORDS: usize = 100_000;
/// Maximum accepted upload size for document submissions (5 MB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Fixed set of selectable font families.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontFamily::Sans => "sans",
            FontFamily::Serif => "serif",
            FontFamily::Mono => "mono",
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure for a settings bundle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("wpm must be between {MIN_WPM} and {MAX_WPM}, got {0}")]
    WpmOutOfRange(u32),

    #[error("word_grouping must be between 1 and {MAX_WORD_GROUPING}, got {0}")]
    GroupingOutOfRange(u8),
}

/// Immutable per-job render settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    /// Base pacing rate in words per minute
    #[serde(default = "default_wpm")]
    pub wpm: u32,

    /// Words shown together per display unit (1-3)
    #[serde(default = "default_word_grouping")]
    pub word_grouping: u8,

    /// Font family for rendered text
    #[serde(default)]
    pub font: FontFamily,

    /// Body text color
    #[serde(default = "default_text_color")]
    pub text_color: Rgb,

    /// Canvas background color
    #[serde(default = "default_bg_color")]
    pub bg_color: Rgb,

    /// Color of the optimal-recognition-point character
    #[serde(default = "default_highlight_color")]
    pub highlight_color: Rgb,

    /// Lengthen units that end in punctuation
    #[serde(default = "default_pause_on_punctuation")]
    pub pause_on_punctuation: bool,
}

fn default_wpm() -> u32 {
    300
}
fn default_word_grouping() -> u8 {
    1
}
fn default_text_color() -> Rgb {
    Rgb::BLACK
}
fn default_bg_color() -> Rgb {
    Rgb::WHITE
}
fn default_highlight_color() -> Rgb {
    Rgb::RED
}
fn default_pause_on_punctuation() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wpm: default_wpm(),
            word_grouping: default_word_grouping(),
            font: FontFamily::default(),
            text_color: default_text_color(),
            bg_color: default_bg_color(),
            highlight_color: default_highlight_color(),
            pause_on_punctuation: default_pause_on_punctuation(),
        }
    }
}

impl Settings {
    /// Validate all range-checked fields, reporting every violation.
    pub fn validate(&self) -> Result<(), Vec<SettingsError>> {
        let mut errors = Vec::new();

        if !(MIN_WPM..=MAX_WPM).contains(&self.wpm) {
            errors.push(SettingsError::WpmOutOfRange(self.wpm));
        }
        if !(1..=MAX_WORD_GROUPING).contains(&self.word_grouping) {
            errors.push(SettingsError::GroupingOutOfRange(self.word_grouping));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_wpm_bounds() {
        let mut settings = Settings {
            wpm: 99,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        settings.wpm = 100;
        assert!(settings.validate().is_ok());

        settings.wpm = 5000;
        assert!(settings.validate().is_ok());

        settings.wpm = 5001;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_grouping_bounds() {
        let settings = Settings {
            word_grouping: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            word_grouping: 4,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_reports_all_violations() {
        let settings = Settings {
            wpm: 0,
            word_grouping: 9,
            ..Default::default()
        };
        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());

        let settings: Settings =
            serde_json::from_str(r##"{"wpm": 450, "font": "mono", "bg_color": "#112233"}"##)
                .unwrap();
        assert_eq!(settings.wpm, 450);
        assert_eq!(settings.font, FontFamily::Mono);
        assert_eq!(settings.bg_color, Rgb::new(0x11, 0x22, 0x33));
    }
}
