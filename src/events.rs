use crate::session::{RealtimeStats, SessionResult};

/// Payload for a progress notification, one per accepted input.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    pub progress_percent: f64,
    pub stats: RealtimeStats,
}

/// Receiver for session notifications.
///
/// All methods default to no-ops so a host registers only what it needs.
/// Dispatch is synchronous and single-threaded, in registration order:
/// `on_progress` fires once per accepted input, `on_error` only when the
/// in-target error count increases (never on decrease, so a one-shot flash
/// does not re-fire while the user corrects), and `on_completion` exactly
/// once per session.
#[allow(unused_variables)]
pub trait SessionObserver {
    fn on_progress(&mut self, update: &ProgressUpdate) {}

    fn on_error(&mut self, new_errors: usize, error_positions: &[usize]) {}

    fn on_completion(&mut self, result: &SessionResult) {}
}
