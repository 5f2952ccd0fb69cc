// End-to-end checks of the session engine through the library surface,
// driven with a manual clock so timing assertions are exact.

use std::cell::RefCell;
use std::rc::Rc;

use codedrill::clock::ManualClock;
use codedrill::diff::diff;
use codedrill::events::{ProgressUpdate, SessionObserver};
use codedrill::metrics;
use codedrill::segmenter::segment;
use codedrill::session::{CompletionPolicy, Engine, EngineError, Phase, SessionResult};

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn engine_with(clock: &Rc<ManualClock>) -> Engine {
    Engine::with_clock(Box::new(Rc::clone(clock)), 80, 3).unwrap()
}

#[test]
fn diff_is_pure() {
    let typed = chars("for i in rangX");
    let target = chars("for i in range(10):");

    assert_eq!(diff(&typed, &target), diff(&typed, &target));
}

#[test]
fn correct_prefixes_never_accumulate_errors() {
    let clock = Rc::new(ManualClock::new(0));
    let mut engine = engine_with(&clock);
    let target = "def f(x):\n    return x";
    engine.start_session(target).unwrap();

    let mut typed = String::new();
    for ch in target.chars() {
        typed.push(ch);
        clock.advance(80);
        engine.apply_input(&typed).unwrap();

        if engine.phase() == Phase::Completed {
            break;
        }
        let stats = engine.realtime_stats().unwrap();
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.accuracy, 100.0);
    }

    assert_eq!(engine.phase(), Phase::Completed);
    assert!(engine.result().unwrap().completed);
}

#[test]
fn exact_completion_carries_clean_result() {
    let clock = Rc::new(ManualClock::new(0));
    let mut engine = engine_with(&clock);
    engine.start_session("abc").unwrap();

    engine.apply_input("a").unwrap();
    engine.apply_input("ab").unwrap();
    engine.apply_input("abc").unwrap();

    let result = engine.result().unwrap();
    assert!(result.completed);
    assert_eq!(result.errors, 0);
    assert_eq!(result.accuracy, 100.0);
}

#[test]
fn lenient_completion_semantics() {
    // Wrong final character: no completion.
    let clock = Rc::new(ManualClock::new(0));
    let mut engine = engine_with(&clock);
    engine.start_session("abc").unwrap();
    assert_eq!(engine.apply_input("abd").unwrap(), Phase::Running);

    // Exact match completes.
    let mut engine = engine_with(&clock);
    engine.start_session("abc").unwrap();
    assert_eq!(engine.apply_input("abc").unwrap(), Phase::Completed);

    // A stray after a correct final character completes too, with the
    // stray reported separately from the error count.
    let mut engine = engine_with(&clock);
    engine.start_session("abc").unwrap();
    assert_eq!(engine.apply_input("abcx").unwrap(), Phase::Completed);
    let result = engine.result().unwrap();
    assert!(!result.completed);
    assert_eq!(result.errors, 0);
    assert_eq!(result.extra_typed, 1);
}

#[test]
fn strict_policy_rejects_loose_finish() {
    let clock = Rc::new(ManualClock::new(0));
    let mut engine = engine_with(&clock).with_policy(CompletionPolicy::Strict);
    engine.start_session("abc").unwrap();

    assert_eq!(engine.apply_input("abcx").unwrap(), Phase::Running);
    assert_eq!(engine.apply_input("abc").unwrap(), Phase::Completed);
    assert!(engine.result().unwrap().completed);
}

#[test]
fn wpm_and_accuracy_formulas() {
    assert_eq!(metrics::wpm(25, 60_000), 5.0);
    assert_eq!(metrics::accuracy(&chars("abXd"), &chars("abcd")), 75.0);
}

#[test]
fn segmenter_reports_index_ranges() {
    let lines = segment("abcdef", 3).unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text, "abc");
    assert_eq!((lines[0].start_index, lines[0].end_index), (0, 2));
    assert_eq!(lines[1].text, "def");
    assert_eq!((lines[1].start_index, lines[1].end_index), (3, 5));
}

#[test]
fn completed_session_ignores_further_input() {
    let clock = Rc::new(ManualClock::new(0));
    let mut engine = engine_with(&clock);
    engine.start_session("hi").unwrap();
    engine.apply_input("h").unwrap();
    engine.apply_input("hi").unwrap();
    assert_eq!(engine.phase(), Phase::Completed);

    let keystrokes = engine.keystrokes().len();
    let samples = engine.wpm_samples().len();

    assert_eq!(engine.apply_input("hix"), Err(EngineError::AlreadyCompleted));
    assert_eq!(engine.typed_len(), 2);
    assert_eq!(engine.keystrokes().len(), keystrokes);
    assert_eq!(engine.wpm_samples().len(), samples);
}

#[test]
fn timer_starts_once() {
    let clock = Rc::new(ManualClock::new(5_000));
    let mut engine = engine_with(&clock);
    engine.start_session("abcd").unwrap();

    engine.apply_input("a").unwrap();
    clock.advance(30_000);
    engine.apply_input("ab").unwrap();
    clock.advance(30_000);
    engine.apply_input("abc").unwrap();

    assert_eq!(engine.realtime_stats().unwrap().elapsed_ms, 60_000);
}

#[derive(Default)]
struct EventLog {
    progress: u32,
    errors: Vec<usize>,
    completions: u32,
}

struct LogObserver(Rc<RefCell<EventLog>>);

impl SessionObserver for LogObserver {
    fn on_progress(&mut self, _update: &ProgressUpdate) {
        self.0.borrow_mut().progress += 1;
    }

    fn on_error(&mut self, new_errors: usize, _positions: &[usize]) {
        self.0.borrow_mut().errors.push(new_errors);
    }

    fn on_completion(&mut self, _result: &SessionResult) {
        self.0.borrow_mut().completions += 1;
    }
}

#[test]
fn error_events_fire_only_on_increase() {
    let clock = Rc::new(ManualClock::new(0));
    let log = Rc::new(RefCell::new(EventLog::default()));
    let mut engine = engine_with(&clock);
    engine.add_observer(Box::new(LogObserver(Rc::clone(&log))));
    engine.start_session("abcd").unwrap();

    engine.apply_input("aX").unwrap(); // error introduced
    engine.apply_input("a").unwrap(); // corrected: no event
    engine.apply_input("ab").unwrap();
    engine.apply_input("abc").unwrap();
    engine.apply_input("abcd").unwrap();

    let log = log.borrow();
    assert_eq!(log.errors, vec![1]);
    assert_eq!(log.progress, 5);
    assert_eq!(log.completions, 1);
}

#[test]
fn multiline_target_scrolls_display_window() {
    let clock = Rc::new(ManualClock::new(0));
    let mut engine = Engine::with_clock(Box::new(Rc::clone(&clock)), 40, 3).unwrap();
    let target = "line one\nline two\nline three\nline four\nline five";
    engine.start_session(target).unwrap();
    assert_eq!(engine.lines().len(), 5);
    assert_eq!(engine.window().start_line, 0);

    let mut typed = String::new();
    for ch in "line one\nline two\nline three\nline f".chars() {
        typed.push(ch);
        engine.apply_input(&typed).unwrap();
    }

    assert_eq!(engine.current_line(), 3);
    assert_eq!(engine.window().start_line, 1);
}
