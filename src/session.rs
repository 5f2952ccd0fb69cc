use crate::clock::{Clock, SystemClock};
use crate::diff::{diff, CharClass, DiffReport};
use crate::events::{ProgressUpdate, SessionObserver};
use crate::metrics::{self, Sample};
use crate::segmenter::{self, DisplayWindow, InvalidLineWidth, Line};
use thiserror::Error;

/// Misuse and configuration failures of the session engine.
///
/// All of these are immediate and deterministic; the engine performs no
/// I/O, so nothing here is retryable.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no active session: call start_session first")]
    NoSession,
    #[error("session has not started running")]
    NotRunning,
    #[error("session already completed; start a new session to continue")]
    AlreadyCompleted,
    #[error("target text must not be empty")]
    EmptyTarget,
    #[error(transparent)]
    LineWidth(#[from] InvalidLineWidth),
}

/// How a session decides it is over.
///
/// `Lenient` ends the session once the final required character is typed
/// correctly, tolerating stray extra characters after the end. `Strict`
/// requires the typed buffer to equal the target exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    #[default]
    Lenient,
    Strict,
}

/// Lifecycle of a typing attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ready,
    Running,
    Completed,
}

/// One accepted input event.
///
/// `character` is `None` for deletions; `position` is the caret index
/// after the event.
#[derive(Clone, Debug, PartialEq)]
pub struct Keystroke {
    pub timestamp_ms: u64,
    pub character: Option<char>,
    pub position: usize,
}

/// Live metrics snapshot, recomputed from scratch on every read.
#[derive(Clone, Debug, PartialEq)]
pub struct RealtimeStats {
    pub wpm: f64,
    pub accuracy: f64,
    pub progress_percent: f64,
    pub errors: usize,
    pub extra_typed: usize,
    pub elapsed_ms: u64,
    pub running: bool,
}

/// Frozen summary of a finished session.
///
/// `completed` is true only for an exact match of typed and target text;
/// a lenient finish with stray trailing characters still produces a
/// result, flagged `completed: false`, and the strays are reported in
/// `extra_typed` rather than `errors`.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionResult {
    pub wpm: f64,
    pub accuracy: f64,
    pub errors: usize,
    pub extra_typed: usize,
    pub time_elapsed_ms: u64,
    pub characters_typed: usize,
    pub target_length: usize,
    pub completed: bool,
    pub error_positions: Vec<usize>,
    pub keystrokes: Vec<Keystroke>,
    pub wpm_samples: Vec<Sample>,
    pub accuracy_samples: Vec<Sample>,
}

#[derive(Clone, Debug)]
struct Session {
    target: Vec<char>,
    typed: Vec<char>,
    started_at_ms: Option<u64>,
    ended_at_ms: Option<u64>,
    report: DiffReport,
    keystrokes: Vec<Keystroke>,
    wpm_samples: Vec<Sample>,
    accuracy_samples: Vec<Sample>,
}

/// Owns one typing attempt at a time and drives it through its lifecycle.
///
/// The host feeds the whole typed buffer into [`Engine::apply_input`] on
/// every input event; the engine reclassifies characters, recomputes
/// metrics and the visible line window, and notifies registered
/// observers. All collaborators (clock, observers) are injected; the
/// engine performs no rendering and no persistence.
pub struct Engine {
    clock: Box<dyn Clock>,
    observers: Vec<Box<dyn SessionObserver>>,
    policy: CompletionPolicy,
    chars_per_line: usize,
    phase: Phase,
    session: Option<Session>,
    result: Option<SessionResult>,
    lines: Vec<Line>,
    window: DisplayWindow,
    current_line: usize,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("policy", &self.policy)
            .field("chars_per_line", &self.chars_per_line)
            .field("phase", &self.phase)
            .field("current_line", &self.current_line)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(chars_per_line: usize, max_visible_lines: usize) -> Result<Self, EngineError> {
        Self::with_clock(Box::new(SystemClock), chars_per_line, max_visible_lines)
    }

    pub fn with_clock(
        clock: Box<dyn Clock>,
        chars_per_line: usize,
        max_visible_lines: usize,
    ) -> Result<Self, EngineError> {
        if chars_per_line == 0 {
            return Err(InvalidLineWidth.into());
        }

        Ok(Self {
            clock,
            observers: Vec::new(),
            policy: CompletionPolicy::default(),
            chars_per_line,
            phase: Phase::Idle,
            session: None,
            result: None,
            lines: Vec::new(),
            window: DisplayWindow::new(max_visible_lines),
            current_line: 0,
        })
    }

    pub fn with_policy(mut self, policy: CompletionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn window(&self) -> DisplayWindow {
        self.window
    }

    pub fn current_line(&self) -> usize {
        self.current_line
    }

    pub fn typed_len(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.typed.len())
    }

    pub fn target_len(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.target.len())
    }

    /// Per-character classifications from the latest reclassification.
    pub fn classes(&self) -> &[CharClass] {
        self.session
            .as_ref()
            .map_or(&[], |s| s.report.classes.as_slice())
    }

    pub fn wpm_samples(&self) -> &[Sample] {
        self.session
            .as_ref()
            .map_or(&[], |s| s.wpm_samples.as_slice())
    }

    pub fn accuracy_samples(&self) -> &[Sample] {
        self.session
            .as_ref()
            .map_or(&[], |s| s.accuracy_samples.as_slice())
    }

    pub fn keystrokes(&self) -> &[Keystroke] {
        self.session
            .as_ref()
            .map_or(&[], |s| s.keystrokes.as_slice())
    }

    /// Result of the last completed session, if any.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Load `text` and reset to a fresh attempt.
    ///
    /// Valid from any phase; the previous session's state is discarded
    /// atomically. The text is segmented immediately for display.
    pub fn start_session(&mut self, text: &str) -> Result<(), EngineError> {
        if text.is_empty() {
            return Err(EngineError::EmptyTarget);
        }

        let target: Vec<char> = text.chars().collect();
        self.lines = segmenter::segment(text, self.chars_per_line)?;
        self.window = DisplayWindow::new(self.window.max_visible);
        self.current_line = 0;
        let report = diff(&[], &target);
        self.session = Some(Session {
            target,
            typed: Vec::new(),
            started_at_ms: None,
            ended_at_ms: None,
            report,
            keystrokes: Vec::new(),
            wpm_samples: Vec::new(),
            accuracy_samples: Vec::new(),
        });
        self.result = None;
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Change the display width and re-segment the current target.
    ///
    /// Purely a view concern; classifications and metrics are unaffected.
    pub fn set_line_width(&mut self, chars_per_line: usize) -> Result<(), EngineError> {
        if chars_per_line == 0 {
            return Err(InvalidLineWidth.into());
        }

        self.chars_per_line = chars_per_line;
        if let Some(session) = self.session.as_ref() {
            let text: String = session.target.iter().collect();
            let caret = caret_of(session);
            self.lines = segmenter::segment(&text, chars_per_line)?;
            self.current_line = segmenter::locate(&self.lines, caret)
                .map(|(line, _)| line)
                .unwrap_or(0);
            self.window.follow(self.current_line, self.lines.len());
        }
        Ok(())
    }

    /// Replace the typed buffer with `new_text` and advance the session.
    ///
    /// The buffer may shrink (backspace) as well as grow; the diff is
    /// always recomputed in full, so the error count can never drift.
    /// The timer starts on the first non-empty buffer and completion is
    /// detected according to the configured policy.
    pub fn apply_input(&mut self, new_text: &str) -> Result<Phase, EngineError> {
        let now = self.clock.now_ms();

        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return Err(EngineError::NoSession),
        };
        if session.ended_at_ms.is_some() {
            return Err(EngineError::AlreadyCompleted);
        }

        let prev_errors = session.report.error_count;
        let typed: Vec<char> = new_text.chars().collect();
        let deleted = typed.len() < session.typed.len();

        // Set at most once per session, on the zero-to-one transition.
        if session.started_at_ms.is_none() && !typed.is_empty() {
            session.started_at_ms = Some(now);
        }

        session.typed = typed;
        session.report = diff(&session.typed, &session.target);

        session.keystrokes.push(if deleted {
            Keystroke {
                timestamp_ms: now,
                character: None,
                position: session.typed.len(),
            }
        } else {
            Keystroke {
                timestamp_ms: now,
                character: session.typed.last().copied(),
                position: session.typed.len().saturating_sub(1),
            }
        });

        if let Some(started) = session.started_at_ms {
            let elapsed = now.saturating_sub(started);
            session
                .wpm_samples
                .push(Sample::new(now, metrics::wpm(session.typed.len(), elapsed)));
            session.accuracy_samples.push(Sample::new(
                now,
                metrics::accuracy(&session.typed, &session.target),
            ));
        }

        if self.phase == Phase::Ready && session.started_at_ms.is_some() {
            self.phase = Phase::Running;
        }

        let error_delta = session.report.error_count.saturating_sub(prev_errors);
        let error_positions = if error_delta > 0 {
            session.report.error_positions.clone()
        } else {
            Vec::new()
        };
        let caret = caret_of(session);
        let finished = completion_reached(self.policy, session);
        let stats = stats_of(session, now, self.phase);

        if let Some((line, _)) = segmenter::locate(&self.lines, caret) {
            self.current_line = line;
        }
        self.window.follow(self.current_line, self.lines.len());

        let update = ProgressUpdate {
            progress_percent: stats.progress_percent,
            stats,
        };
        for observer in self.observers.iter_mut() {
            observer.on_progress(&update);
        }
        if error_delta > 0 {
            for observer in self.observers.iter_mut() {
                observer.on_error(error_delta, &error_positions);
            }
        }

        if finished {
            let result = self.finish(now)?;
            for observer in self.observers.iter_mut() {
                observer.on_completion(&result);
            }
        }

        Ok(self.phase)
    }

    /// End the running session now and return its frozen summary.
    ///
    /// Used by hosts to abandon an attempt; sessions that satisfy the
    /// completion policy are finished by `apply_input` itself.
    pub fn complete(&mut self) -> Result<SessionResult, EngineError> {
        let now = self.clock.now_ms();
        let result = self.finish(now)?;
        for observer in self.observers.iter_mut() {
            observer.on_completion(&result);
        }
        Ok(result)
    }

    /// Current metrics, recomputed from session state.
    pub fn realtime_stats(&self) -> Result<RealtimeStats, EngineError> {
        let session = match self.session.as_ref() {
            Some(session) => session,
            None => return Err(EngineError::NoSession),
        };
        let now = session.ended_at_ms.unwrap_or_else(|| self.clock.now_ms());
        Ok(stats_of(session, now, self.phase))
    }

    fn finish(&mut self, now: u64) -> Result<SessionResult, EngineError> {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return Err(EngineError::NoSession),
        };
        if session.ended_at_ms.is_some() {
            return Err(EngineError::AlreadyCompleted);
        }
        let started = match session.started_at_ms {
            Some(started) => started,
            None => return Err(EngineError::NotRunning),
        };

        session.ended_at_ms = Some(now);
        self.phase = Phase::Completed;

        let elapsed = now.saturating_sub(started);
        let result = SessionResult {
            wpm: metrics::wpm(session.typed.len(), elapsed),
            accuracy: metrics::accuracy(&session.typed, &session.target),
            errors: session.report.error_count,
            extra_typed: session.report.extra_typed,
            time_elapsed_ms: elapsed,
            characters_typed: session.typed.len(),
            target_length: session.target.len(),
            completed: session.typed == session.target,
            error_positions: session.report.error_positions.clone(),
            keystrokes: session.keystrokes.clone(),
            wpm_samples: session.wpm_samples.clone(),
            accuracy_samples: session.accuracy_samples.clone(),
        };
        self.result = Some(result.clone());
        Ok(result)
    }
}

fn completion_reached(policy: CompletionPolicy, session: &Session) -> bool {
    if session.target.is_empty() {
        return false;
    }

    match policy {
        CompletionPolicy::Strict => session.typed == session.target,
        CompletionPolicy::Lenient => {
            let last = session.target.len() - 1;
            session.typed.len() >= session.target.len() && session.typed[last] == session.target[last]
        }
    }
}

fn caret_of(session: &Session) -> usize {
    session
        .typed
        .len()
        .min(session.target.len().saturating_sub(1))
}

fn progress_of(session: &Session) -> f64 {
    if session.target.is_empty() {
        return 0.0;
    }

    ((session.typed.len() as f64 / session.target.len() as f64) * 100.0).min(100.0)
}

fn stats_of(session: &Session, now: u64, phase: Phase) -> RealtimeStats {
    let elapsed = session
        .started_at_ms
        .map_or(0, |started| now.saturating_sub(started));

    RealtimeStats {
        wpm: metrics::wpm(session.typed.len(), elapsed),
        accuracy: metrics::accuracy(&session.typed, &session.target),
        progress_percent: progress_of(session),
        errors: session.report.error_count,
        extra_typed: session.report.extra_typed,
        elapsed_ms: elapsed,
        running: phase == Phase::Running,
    }
}
