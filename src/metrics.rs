/// Standard characters-per-word approximation used by typing trainers.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute for `typed_len` characters over `elapsed_ms`.
///
/// Returns 0.0 before any time has elapsed. Always recomputed from the
/// full counts so repeated calls cannot drift.
pub fn wpm(typed_len: usize, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }

    let minutes = elapsed_ms as f64 / 60_000.0;
    (typed_len as f64 / CHARS_PER_WORD) / minutes
}

/// Accuracy in percent over the typed buffer.
///
/// An empty buffer is 100% by convention; otherwise the share of typed
/// positions that match the target at the same index.
pub fn accuracy(typed: &[char], target: &[char]) -> f64 {
    if typed.is_empty() {
        return 100.0;
    }

    let correct = typed
        .iter()
        .zip(target.iter())
        .filter(|(typed_ch, target_ch)| typed_ch == target_ch)
        .count();

    (correct as f64 / typed.len() as f64) * 100.0
}

/// One point of a live metric series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub timestamp_ms: u64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp_ms: u64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}
