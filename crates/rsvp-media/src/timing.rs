//! Timing engine: text segmentation, pacing and ORP placement.
//!
//! Segmentation is pure and deterministic given (text, settings); the same
//! input always yields the same unit sequence and no state is retained
//! between calls.

use rsvp_models::{DisplayUnit, Settings, MAX_WORDS};

use crate::error::{MediaError, MediaResult};

/// Punctuation that ends a sentence.
const SENTENCE_PUNCTUATION: [char; 3] = ['.', '!', '?'];
/// Punctuation that ends a clause.
const CLAUSE_PUNCTUATION: [char; 3] = [',', ';', ':'];

/// Pause multipliers applied to punctuation-ending units.
///
/// These are pacing constants, not speed-tier semantics; callers may tune
/// them without touching the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseConfig {
    /// Multiplier for units ending a sentence (`.` `!` `?`)
    pub sentence_factor: f64,
    /// Multiplier for units ending a clause (`,` `;` `:`)
    pub clause_factor: f64,
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self {
            sentence_factor: 2.5,
            clause_factor: 1.5,
        }
    }
}

/// Segment text into ordered display units under the given settings.
///
/// Words are whitespace-separated tokens grouped `word_grouping` at a time
/// (the last group may be shorter). Each unit's base duration is
/// `60000 / wpm * group_size` ms so total nominal duration scales with word
/// count regardless of grouping.
pub fn segment(text: &str, settings: &Settings) -> MediaResult<Vec<DisplayUnit>> {
    segment_with_pauses(text, settings, &PauseConfig::default())
}

/// As [`segment`], with explicit pause multipliers.
pub fn segment_with_pauses(
    text: &str,
    settings: &Settings,
    pauses: &PauseConfig,
) -> MediaResult<Vec<DisplayUnit>> {
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() {
        return Err(MediaError::EmptyText);
    }
    if words.len() > MAX_WORDS {
        return Err(MediaError::TooManyWords {
            found: words.len(),
            limit: MAX_WORDS,
        });
    }

    let group_size = settings.word_grouping.max(1) as usize;
    let per_word_ms = 60_000.0 / settings.wpm as f64;

    let units = words
        .chunks(group_size)
        .enumerate()
        .map(|(index, group)| {
            let base_ms = per_word_ms * group.len() as f64;
            let (duration_ms, trailing_punctuation) = if settings.pause_on_punctuation {
                apply_pause(base_ms, group[group.len() - 1], pauses)
            } else {
                (base_ms, false)
            };

            DisplayUnit {
                index,
                text: group.join(" "),
                orp_index: orp_index(group[0]),
                duration_ms: duration_ms.round() as u64,
                trailing_punctuation,
            }
        })
        .collect();

    Ok(units)
}

/// Apply at most one pause multiplier based on the unit's final character.
fn apply_pause(base_ms: f64, last_word: &str, pauses: &PauseConfig) -> (f64, bool) {
    match last_word.chars().last() {
        Some(c) if SENTENCE_PUNCTUATION.contains(&c) => (base_ms * pauses.sentence_factor, true),
        Some(c) if CLAUSE_PUNCTUATION.contains(&c) => (base_ms * pauses.clause_factor, true),
        _ => (base_ms, false),
    }
}

/// Optimal recognition point of a word: `floor(len / 3)` clamped to a valid
/// character index. For multi-word units the ORP is computed on the first
/// word, which starts at character 0 of the display string.
pub fn orp_index(word: &str) -> usize {
    let len = word.chars().count();
    if len == 0 {
        return 0;
    }
    (len / 3).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(wpm: u32, grouping: u8, pause: bool) -> Settings {
        Settings {
            wpm,
            word_grouping: grouping,
            pause_on_punctuation: pause,
            ..Default::default()
        }
    }

    #[test]
    fn test_orp_index_speed() {
        // "SPEED" has 5 chars: floor(5/3) = 1
        assert_eq!(orp_index("SPEED"), 1);
    }

    #[test]
    fn test_orp_index_clamped() {
        assert_eq!(orp_index("a"), 0);
        assert_eq!(orp_index("ab"), 0);
        assert_eq!(orp_index("abc"), 1);
        assert_eq!(orp_index("extraordinary"), 4);
    }

    #[test]
    fn test_orp_counts_chars_not_bytes() {
        // 6 chars, multi-byte encoded
        assert_eq!(orp_index("señora"), 2);
    }

    #[test]
    fn test_base_duration_scales_with_group_size() {
        for (wpm, grouping) in [(100u32, 1u8), (300, 1), (300, 2), (300, 3), (5000, 3)] {
            let text = "alpha beta gamma delta epsilon zeta";
            let units = segment(text, &settings(wpm, grouping, false)).unwrap();
            for unit in &units {
                let group_len = unit.text.split_whitespace().count();
                let expected = (60_000.0 / wpm as f64 * group_len as f64).round() as u64;
                assert_eq!(unit.duration_ms, expected, "wpm={wpm} grouping={grouping}");
            }
        }
    }

    #[test]
    fn test_reference_scenario() {
        // "Speed reading just got faster." at 300 wpm, grouping 1, pauses on:
        // five units of 200ms base, the last stretched by the sentence factor.
        let units = segment("Speed reading just got faster.", &settings(300, 1, true)).unwrap();
        assert_eq!(units.len(), 5);
        for unit in &units[..4] {
            assert_eq!(unit.duration_ms, 200);
            assert!(!unit.trailing_punctuation);
        }
        assert_eq!(units[4].duration_ms, 500);
        assert!(units[4].trailing_punctuation);
    }

    #[test]
    fn test_pause_tiers() {
        let units = segment("wait, stop. go", &settings(300, 1, true)).unwrap();
        assert_eq!(units[0].duration_ms, 300); // clause: 200 * 1.5
        assert_eq!(units[1].duration_ms, 500); // sentence: 200 * 2.5
        assert_eq!(units[2].duration_ms, 200);
        assert!(units[0].trailing_punctuation);
        assert!(units[1].trailing_punctuation);
        assert!(!units[2].trailing_punctuation);
    }

    #[test]
    fn test_pause_disabled() {
        let units = segment("wait, stop. go", &settings(300, 1, false)).unwrap();
        assert!(units.iter().all(|u| u.duration_ms == 200));
        assert!(units.iter().all(|u| !u.trailing_punctuation));
    }

    #[test]
    fn test_pause_keyed_on_last_word_of_group() {
        let units = segment("one, two three four", &settings(300, 2, true)).unwrap();
        // "one, two" ends in "two": no pause. "three four" ends clean.
        assert!(units.iter().all(|u| !u.trailing_punctuation));

        let units = segment("one two, three four.", &settings(300, 2, true)).unwrap();
        assert!(units[0].trailing_punctuation); // clause
        assert!(units[1].trailing_punctuation); // sentence
        assert_eq!(units[0].duration_ms, 600); // 400 * 1.5
        assert_eq!(units[1].duration_ms, 1000); // 400 * 2.5
    }

    #[test]
    fn test_grouping_last_chunk_short() {
        let units = segment("a b c d e", &settings(300, 2, false)).unwrap();
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].text, "a b");
        assert_eq!(units[2].text, "e");
        assert_eq!(units[2].duration_ms, 200);
    }

    #[test]
    fn test_indices_ordered() {
        let units = segment("a b c d", &settings(300, 1, false)).unwrap();
        let indices: Vec<usize> = units.iter().map(|u| u.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(matches!(
            segment("   \n\t  ", &settings(300, 1, true)),
            Err(MediaError::EmptyText)
        ));
    }

    #[test]
    fn test_word_limit_boundary() {
        let at_limit = "w ".repeat(MAX_WORDS);
        assert!(segment(&at_limit, &settings(300, 1, false)).is_ok());

        let over_limit = "w ".repeat(MAX_WORDS + 1);
        assert!(matches!(
            segment(&over_limit, &settings(300, 1, false)),
            Err(MediaError::TooManyWords { .. })
        ));
    }

    #[test]
    fn test_deterministic() {
        let s = settings(450, 2, true);
        let a = segment("The quick brown fox jumps over.", &s).unwrap();
        let b = segment("The quick brown fox jumps over.", &s).unwrap();
        assert_eq!(a, b);
    }
}
