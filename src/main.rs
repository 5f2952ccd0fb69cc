pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod diff;
pub mod events;
pub mod history;
pub mod metrics;
pub mod problems;
pub mod runtime;
pub mod segmenter;
pub mod session;
pub mod tracker;
pub mod ui;
pub mod util;

use crate::config::{Config, ConfigStore, FileConfigStore};
use crate::events::SessionObserver;
use crate::history::HistoryDb;
use crate::problems::ProblemSet;
use crate::runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner};
use crate::session::{Engine, Phase, SessionResult};
use crate::tracker::{
    achievements, FileProfileStore, PracticeMode, SessionMeta, SessionOutcome, Tracker,
};
use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    cell::RefCell,
    error::Error,
    io::{self, stdin},
    rc::Rc,
    time::Duration,
};
use time_humanize::{Accuracy, HumanTime, Tense};

const TICK_RATE_MS: u64 = 100;
const FLASH_TICKS: u8 = 3;

/// typing practice for code in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Typing practice for code: type reference solutions and micro drills, watch live speed and accuracy, and track progress, streaks, and achievements over time."
)]
pub struct Cli {
    /// programming language to practice
    #[clap(short = 'l', long, value_enum, default_value_t = SupportedLanguage::Python)]
    language: SupportedLanguage,

    /// problem topic to draw from (random topic when omitted)
    #[clap(short = 't', long)]
    topic: Option<String>,

    /// practice a short micro drill instead of a full problem
    #[clap(short = 'd', long)]
    drill: bool,

    /// require the typed text to match the target exactly before finishing
    #[clap(long)]
    strict: bool,

    /// override the display width in characters per line
    #[clap(short = 'w', long)]
    width: Option<usize>,

    /// list available topics for the selected language and exit
    #[clap(long)]
    list_topics: bool,

    /// print the practice profile summary and exit
    #[clap(long)]
    profile: bool,

    /// export the session history as CSV to the given path and exit
    #[clap(long)]
    export: Option<std::path::PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SupportedLanguage {
    Python,
    Javascript,
}

impl Cli {
    /// Overlay command-line flags on the stored configuration.
    fn to_config(&self, base: Config) -> Config {
        Config {
            language: self.language.to_string(),
            topic: self.topic.clone().or(base.topic),
            drill_mode: self.drill || base.drill_mode,
            strict: self.strict || base.strict,
            max_visible_lines: base.max_visible_lines,
            chars_per_line: self.width.or(base.chars_per_line),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    Results,
}

/// Cross-thread-free mailbox filled by the engine's event bus.
#[derive(Debug, Default)]
pub struct Signals {
    pub error_flashes: u32,
    pub completions: u32,
}

struct SignalRelay {
    signals: Rc<RefCell<Signals>>,
}

impl SessionObserver for SignalRelay {
    fn on_error(&mut self, _new_errors: usize, _error_positions: &[usize]) {
        self.signals.borrow_mut().error_flashes += 1;
    }

    fn on_completion(&mut self, _result: &SessionResult) {
        self.signals.borrow_mut().completions += 1;
    }
}

pub struct App {
    pub settings: Config,
    pub set: ProblemSet,
    pub engine: Engine,
    pub state: AppState,
    pub typed: String,
    pub target_text: String,
    pub title: String,
    pub description: String,
    pub meta: SessionMeta,
    pub flash_ticks: u8,
    pub last_result: Option<SessionResult>,
    pub last_outcome: Option<SessionOutcome>,
    signals: Rc<RefCell<Signals>>,
    seen_flashes: u32,
    seen_completions: u32,
}

impl App {
    pub fn new(settings: Config) -> Result<Self, Box<dyn Error>> {
        let set = ProblemSet::load(&settings.language)
            .ok_or_else(|| format!("no bundled content for language '{}'", settings.language))?;

        let mut engine = Engine::new(
            settings.chars_per_line.unwrap_or(80),
            settings.max_visible_lines,
        )?
        .with_policy(settings.completion_policy());

        let signals = Rc::new(RefCell::new(Signals::default()));
        engine.add_observer(Box::new(SignalRelay {
            signals: Rc::clone(&signals),
        }));

        let mut app = Self {
            meta: SessionMeta {
                language: settings.language.clone(),
                topic: None,
                problem_id: String::new(),
                mode: PracticeMode::Problem,
            },
            settings,
            set,
            engine,
            state: AppState::Typing,
            typed: String::new(),
            target_text: String::new(),
            title: String::new(),
            description: String::new(),
            flash_ticks: 0,
            last_result: None,
            last_outcome: None,
            signals,
            seen_flashes: 0,
            seen_completions: 0,
        };
        app.load_target()?;
        Ok(app)
    }

    /// Pick the next problem or drill and start a fresh session on it.
    pub fn load_target(&mut self) -> Result<(), Box<dyn Error>> {
        let (title, description, target, meta) = if self.settings.drill_mode {
            let drill = self.set.random_drill().ok_or("no drills available")?;
            (
                drill.title.clone(),
                drill.description.clone(),
                drill.pattern.clone(),
                SessionMeta {
                    language: self.set.language.clone(),
                    topic: None,
                    problem_id: drill.id.clone(),
                    mode: PracticeMode::Drill,
                },
            )
        } else {
            let problem = match &self.settings.topic {
                Some(topic) => self
                    .set
                    .random_problem_by_topic(topic)
                    .ok_or_else(|| format!("no problems for topic '{topic}'"))?,
                None => self.set.random_problem().ok_or("no problems available")?,
            };
            (
                problem.title.clone(),
                problem.description.clone(),
                problem.solution.clone(),
                SessionMeta {
                    language: self.set.language.clone(),
                    topic: Some(problem.topic.clone()),
                    problem_id: problem.id.clone(),
                    mode: PracticeMode::Problem,
                },
            )
        };

        self.engine.start_session(&target)?;
        self.typed.clear();
        self.target_text = target;
        self.title = title;
        self.description = description;
        self.meta = meta;
        self.state = AppState::Typing;
        self.flash_ticks = 0;
        self.last_result = None;
        self.last_outcome = None;
        Ok(())
    }

    /// Restart the current target from scratch.
    pub fn retry(&mut self) -> Result<(), Box<dyn Error>> {
        self.engine.start_session(&self.target_text)?;
        self.typed.clear();
        self.state = AppState::Typing;
        self.flash_ticks = 0;
        self.last_result = None;
        self.last_outcome = None;
        Ok(())
    }

    /// Push the host's typed buffer into the engine.
    fn push_input(&mut self) -> Result<(), Box<dyn Error>> {
        self.engine.apply_input(&self.typed)?;

        let flashes = self.signals.borrow().error_flashes;
        if flashes > self.seen_flashes {
            self.seen_flashes = flashes;
            self.flash_ticks = FLASH_TICKS;
        }
        Ok(())
    }

    /// True exactly once per completion event from the bus.
    fn completion_pending(&mut self) -> bool {
        let completions = self.signals.borrow().completions;
        if completions > self.seen_completions {
            self.seen_completions = completions;
            return true;
        }
        false
    }

    pub fn apply_width(&mut self, terminal_width: u16) -> Result<(), Box<dyn Error>> {
        let width = self
            .settings
            .chars_per_line
            .unwrap_or_else(|| ui::chars_per_line_for(terminal_width));
        self.engine.set_line_width(width)?;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let settings = cli.to_config(FileConfigStore::new().load());

    if cli.list_topics {
        let set = ProblemSet::load(&settings.language)
            .ok_or_else(|| format!("no bundled content for language '{}'", settings.language))?;
        for topic in set.topics() {
            println!("{topic}");
        }
        return Ok(());
    }

    if cli.profile {
        print_profile_summary();
        return Ok(());
    }

    if let Some(path) = &cli.export {
        let db = HistoryDb::new()?;
        db.export_csv(path)?;
        println!("history written to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, settings);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    settings: Config,
) -> Result<(), Box<dyn Error>> {
    let mut app = App::new(settings)?;

    let size = terminal.size()?;
    app.apply_width(size.width)?;

    let history = HistoryDb::new().ok();
    let mut tracker = Tracker::new(FileProfileStore::new());

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| f.render_widget(&app, f.area()))?;

    loop {
        match runner.step() {
            AppEvent::Tick => {
                let flashing = app.flash_ticks > 0;
                if flashing {
                    app.flash_ticks -= 1;
                }
                // Redraw while running so the elapsed clock advances.
                if flashing
                    || (app.state == AppState::Typing && app.engine.phase() == Phase::Running)
                {
                    terminal.draw(|f| f.render_widget(&app, f.area()))?;
                }
            }
            AppEvent::Resize(width, _) => {
                app.apply_width(width)?;
                terminal.draw(|f| f.render_widget(&app, f.area()))?;
            }
            AppEvent::Key(key) => {
                let keep_going = match app.state {
                    AppState::Typing => {
                        handle_typing_key(&mut app, key, history.as_ref(), &mut tracker)?
                    }
                    AppState::Results => match key.code {
                        KeyCode::Esc => false,
                        KeyCode::Char('r') => {
                            app.retry()?;
                            true
                        }
                        KeyCode::Char('n') => {
                            app.load_target()?;
                            true
                        }
                        _ => true,
                    },
                };
                if !keep_going {
                    break;
                }
                terminal.draw(|f| f.render_widget(&app, f.area()))?;
            }
        }
    }

    Ok(())
}

fn handle_typing_key(
    app: &mut App,
    key: KeyEvent,
    history: Option<&HistoryDb>,
    tracker: &mut Tracker<FileProfileStore>,
) -> Result<bool, Box<dyn Error>> {
    match key.code {
        KeyCode::Esc => return Ok(false),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Ok(false);
        }
        KeyCode::Backspace => {
            app.typed.pop();
            app.push_input()?;
        }
        KeyCode::Enter => {
            app.typed.push('\n');
            app.push_input()?;
        }
        KeyCode::Tab => {
            // Targets use spaces for indentation.
            app.typed.push_str("    ");
            app.push_input()?;
        }
        KeyCode::Char(c) => {
            app.typed.push(c);
            app.push_input()?;
        }
        _ => {}
    }

    if app.completion_pending() {
        finalize_session(app, history, tracker)?;
    }

    Ok(true)
}

fn finalize_session(
    app: &mut App,
    history: Option<&HistoryDb>,
    tracker: &mut Tracker<FileProfileStore>,
) -> Result<(), Box<dyn Error>> {
    let result = match app.engine.result() {
        Some(result) => result.clone(),
        None => return Ok(()),
    };

    let record = app.meta.record(&result, Local::now());
    // History as it stood before this session feeds the analysis.
    let recent = history
        .and_then(|db| db.recent(10).ok())
        .unwrap_or_default();
    if let Some(db) = history {
        let _ = db.record(&record);
    }

    let outcome = tracker.record(&result, &record, &recent)?;

    app.last_result = Some(result);
    app.last_outcome = Some(outcome);
    app.state = AppState::Results;
    Ok(())
}

fn print_profile_summary() {
    let tracker = Tracker::new(FileProfileStore::new());
    let profile = tracker.profile();

    println!("sessions        {}", profile.total_sessions);
    println!("time practiced  {} min", profile.total_time_ms / 60_000);
    println!(
        "average         {:.0} wpm / {:.0}% acc",
        profile.average_wpm, profile.average_accuracy
    );
    println!(
        "best            {:.0} wpm / {:.0}% acc",
        profile.best_wpm, profile.best_accuracy
    );
    println!("solved          {}", profile.problems_solved);
    println!("streak          {} days", profile.streak_days);
    println!("skill level     {}", profile.skill_level);

    if let Some(date) = profile.last_session_date {
        let days_ago = (Local::now().date_naive() - date).num_days().max(0) as u64;
        let human = HumanTime::from(Duration::from_secs(days_ago * 86_400));
        println!(
            "last session    {}",
            human.to_text_en(Accuracy::Rough, Tense::Past)
        );
    }

    if !profile.achievements.is_empty() {
        let titles = achievements()
            .iter()
            .filter(|a| profile.achievements.iter().any(|id| id == a.id))
            .map(|a| a.title)
            .collect::<Vec<_>>()
            .join(", ");
        println!("achievements    {}", ui::fit_to_width(&titles, 72));
    }

    if let Ok(db) = HistoryDb::new() {
        if let Ok(Some(rate)) = db.completion_rate() {
            println!("exact finishes  {rate:.0}%");
        }
        if let Ok(distribution) = db.language_distribution() {
            for (language, count) in distribution {
                println!("  {language:<12} {count} sessions");
            }
        }
    }
}
