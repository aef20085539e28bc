//! Display units produced by the timing engine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One or more words shown together for a single timed interval.
///
/// Units are produced once per job, in order, and consumed exactly once by
/// the renderer. They are immutable after segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DisplayUnit {
    /// Position of this unit in the sequence
    pub index: usize,

    /// Concatenated display string (1-3 words joined by single spaces)
    pub text: String,

    /// Character index of the optimal recognition point within `text`
    pub orp_index: usize,

    /// Display duration in milliseconds, pause factor already applied
    pub duration_ms: u64,

    /// Whether a punctuation pause factor was applied to this unit
    pub trailing_punctuation: bool,
}

impl DisplayUnit {
    /// The highlighted character, if the ORP index is in range.
    pub fn orp_char(&self) -> Option<char> {
        self.text.chars().nth(self.orp_index)
    }
}
