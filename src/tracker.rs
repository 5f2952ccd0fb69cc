use crate::app_dirs::AppDirs;
use crate::history::SessionRecord;
use crate::session::{Keystroke, SessionResult};
use crate::util::{linear_trend, mean, std_dev};
use chrono::{DateTime, Local, NaiveDate};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PracticeMode {
    Problem,
    Drill,
}

/// What was practiced, supplied by the host when a session ends.
#[derive(Clone, Debug)]
pub struct SessionMeta {
    pub language: String,
    pub topic: Option<String>,
    pub problem_id: String,
    pub mode: PracticeMode,
}

impl SessionMeta {
    pub fn record(&self, result: &SessionResult, timestamp: DateTime<Local>) -> SessionRecord {
        SessionRecord {
            timestamp,
            language: self.language.clone(),
            topic: self.topic.clone(),
            problem_id: self.problem_id.clone(),
            mode: self.mode.to_string(),
            wpm: result.wpm,
            accuracy: result.accuracy,
            errors: result.errors as u64,
            extra_typed: result.extra_typed as u64,
            time_elapsed_ms: result.time_elapsed_ms,
            characters_typed: result.characters_typed as u64,
            completed: result.completed,
        }
    }
}

/// Accumulated practice profile, persisted between runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub total_sessions: u64,
    pub total_time_ms: u64,
    pub average_wpm: f64,
    pub average_accuracy: f64,
    pub best_wpm: f64,
    pub best_accuracy: f64,
    pub problems_solved: u64,
    pub streak_days: u32,
    pub last_session_date: Option<NaiveDate>,
    pub preferred_language: String,
    pub skill_level: SkillLevel,
    pub achievements: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            total_sessions: 0,
            total_time_ms: 0,
            average_wpm: 0.0,
            average_accuracy: 0.0,
            best_wpm: 0.0,
            best_accuracy: 0.0,
            problems_solved: 0,
            streak_days: 0,
            last_session_date: None,
            preferred_language: "python".to_string(),
            skill_level: SkillLevel::Beginner,
            achievements: Vec::new(),
        }
    }
}

/// One unlockable milestone. The unlock set only grows.
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    condition: fn(&UserProfile, &[SessionRecord]) -> bool,
}

static ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first-steps",
        title: "First Steps",
        description: "Complete your first typing session",
        condition: |profile, _| profile.total_sessions >= 1,
    },
    Achievement {
        id: "speed-demon",
        title: "Speed Demon",
        description: "Achieve 30+ WPM",
        condition: |profile, _| profile.best_wpm >= 30.0,
    },
    Achievement {
        id: "lightning-fast",
        title: "Lightning Fast",
        description: "Achieve 50+ WPM",
        condition: |profile, _| profile.best_wpm >= 50.0,
    },
    Achievement {
        id: "precision-master",
        title: "Precision Master",
        description: "Achieve 95%+ accuracy",
        condition: |profile, _| profile.best_accuracy >= 95.0,
    },
    Achievement {
        id: "problem-solver",
        title: "Problem Solver",
        description: "Complete 10 problems",
        condition: |profile, _| profile.problems_solved >= 10,
    },
    Achievement {
        id: "week-warrior",
        title: "Week Warrior",
        description: "Practice for 7 consecutive days",
        condition: |profile, _| profile.streak_days >= 7,
    },
    Achievement {
        id: "marathon-coder",
        title: "Marathon Coder",
        description: "Finish a session over 10 minutes long",
        condition: |_, recent| recent.iter().any(|r| r.time_elapsed_ms > 600_000),
    },
];

pub fn achievements() -> &'static [Achievement] {
    ACHIEVEMENTS
}

pub trait ProfileStore {
    fn load(&self) -> UserProfile;
    fn save(&self, profile: &UserProfile) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path =
            AppDirs::profile_path().unwrap_or_else(|| PathBuf::from("codedrill_profile.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self) -> UserProfile {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(profile) = serde_json::from_slice::<UserProfile>(&bytes) {
                return profile;
            }
        }
        UserProfile::default()
    }

    fn save(&self, profile: &UserProfile) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(profile).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RhythmProfile {
    pub steady: bool,
    pub avg_interval_ms: f64,
    pub deviation_ms: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub wpm_change: f64,
    pub accuracy_change: f64,
    pub trend: Trend,
    pub personal_best_wpm: bool,
    pub personal_best_accuracy: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub title: &'static str,
    pub detail: String,
}

/// Breakdown of one finished session against the player's history.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionAnalysis {
    pub consistency: f64,
    pub improvement: f64,
    pub accuracy_trend: Trend,
    pub peak_wpm: f64,
    pub average_wpm: f64,
    pub common_errors: Vec<(char, usize)>,
    pub slowest_keys: Vec<(char, f64)>,
    pub rhythm: RhythmProfile,
    pub recommendations: Vec<Recommendation>,
    pub comparison: Comparison,
}

pub struct SessionOutcome {
    pub analysis: SessionAnalysis,
    pub unlocked: Vec<&'static Achievement>,
}

/// Maintains the profile and produces per-session analysis.
///
/// The tracker never touches the engine; it consumes the frozen
/// `SessionResult` plus whatever history the caller supplies, and owns
/// the profile's persistence through the injected store.
pub struct Tracker<S: ProfileStore> {
    store: S,
    profile: UserProfile,
}

impl<S: ProfileStore> Tracker<S> {
    pub fn new(store: S) -> Self {
        let profile = store.load();
        Self { store, profile }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Fold a finished session into the profile and analyze it.
    ///
    /// `recent` is the history as it stood before this session, newest
    /// first. Only exact-match completions count toward
    /// `problems_solved`; lenient finishes are still recorded sessions.
    pub fn record(
        &mut self,
        result: &SessionResult,
        record: &SessionRecord,
        recent: &[SessionRecord],
    ) -> std::io::Result<SessionOutcome> {
        self.profile.total_sessions += 1;
        self.profile.total_time_ms += record.time_elapsed_ms;

        let n = self.profile.total_sessions as f64;
        self.profile.average_wpm += (record.wpm - self.profile.average_wpm) / n;
        self.profile.average_accuracy += (record.accuracy - self.profile.average_accuracy) / n;

        if record.wpm > self.profile.best_wpm {
            self.profile.best_wpm = record.wpm;
        }
        if record.accuracy > self.profile.best_accuracy {
            self.profile.best_accuracy = record.accuracy;
        }
        if record.completed {
            self.profile.problems_solved += 1;
        }

        self.update_streak(record.timestamp.date_naive());
        self.profile.preferred_language = record.language.clone();
        self.profile.skill_level = skill_level_of(&self.profile);

        let unlocked = self.unlock_achievements(recent);
        self.store.save(&self.profile)?;

        let analysis = analyze(result, &self.profile, recent);
        Ok(SessionOutcome { analysis, unlocked })
    }

    fn update_streak(&mut self, date: NaiveDate) {
        match self.profile.last_session_date {
            Some(last) => {
                let days = (date - last).num_days();
                if days == 1 {
                    self.profile.streak_days += 1;
                } else if days != 0 {
                    self.profile.streak_days = 1;
                }
            }
            None => self.profile.streak_days = 1,
        }
        self.profile.last_session_date = Some(date);
    }

    fn unlock_achievements(&mut self, recent: &[SessionRecord]) -> Vec<&'static Achievement> {
        let mut unlocked = Vec::new();

        for achievement in ACHIEVEMENTS {
            if self.profile.achievements.iter().any(|id| id == achievement.id) {
                continue;
            }
            if (achievement.condition)(&self.profile, recent) {
                self.profile.achievements.push(achievement.id.to_string());
                unlocked.push(achievement);
            }
        }

        unlocked
    }
}

fn skill_level_of(profile: &UserProfile) -> SkillLevel {
    if profile.average_wpm >= 50.0
        && profile.average_accuracy >= 90.0
        && profile.problems_solved >= 50
    {
        SkillLevel::Expert
    } else if profile.average_wpm >= 35.0
        && profile.average_accuracy >= 80.0
        && profile.problems_solved >= 25
    {
        SkillLevel::Advanced
    } else if profile.average_wpm >= 20.0
        && profile.average_accuracy >= 70.0
        && profile.problems_solved >= 10
    {
        SkillLevel::Intermediate
    } else {
        SkillLevel::Beginner
    }
}

/// Consistency as a percentage: 100 minus the coefficient of variation
/// of the live WPM series. Fewer than two samples count as perfectly
/// consistent.
pub fn consistency(wpm_values: &[f64]) -> f64 {
    if wpm_values.len() < 2 {
        return 100.0;
    }

    match (mean(wpm_values), std_dev(wpm_values)) {
        (Some(avg), Some(dev)) if avg > 0.0 => (100.0 - (dev / avg) * 100.0).max(0.0),
        _ => 0.0,
    }
}

/// Second-half vs first-half WPM delta, in percent of the first half.
pub fn improvement(wpm_values: &[f64]) -> f64 {
    if wpm_values.len() < 2 {
        return 0.0;
    }

    let half = wpm_values.len() / 2;
    let (first, second) = (mean(&wpm_values[..half]), mean(&wpm_values[half..]));
    match (first, second) {
        (Some(first_avg), Some(second_avg)) if first_avg > 0.0 => {
            ((second_avg - first_avg) / first_avg) * 100.0
        }
        _ => 0.0,
    }
}

fn accuracy_trend(accuracy_values: &[f64]) -> Trend {
    if accuracy_values.len() < 2 {
        return Trend::Stable;
    }

    let delta = accuracy_values[accuracy_values.len() - 1] - accuracy_values[0];
    if delta > 5.0 {
        Trend::Improving
    } else if delta < -5.0 {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn typed_char_at(keystrokes: &[Keystroke], position: usize) -> Option<char> {
    keystrokes
        .iter()
        .rev()
        .find(|keystroke| keystroke.position == position)
        .and_then(|keystroke| keystroke.character)
}

/// The characters most often left wrong, with occurrence counts.
pub fn common_errors(result: &SessionResult) -> Vec<(char, usize)> {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for &position in &result.error_positions {
        if let Some(ch) = typed_char_at(&result.keystrokes, position) {
            *counts.entry(ch).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
        .take(5)
        .collect()
}

/// Characters with the highest mean inter-key delay, slowest first.
pub fn slowest_keys(keystrokes: &[Keystroke]) -> Vec<(char, f64)> {
    let mut delays: HashMap<char, Vec<f64>> = HashMap::new();

    for pair in keystrokes.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let Some(ch) = current.character else {
            continue;
        };
        let delay = current.timestamp_ms.saturating_sub(previous.timestamp_ms) as f64;
        delays.entry(ch).or_default().push(delay);
    }

    delays
        .into_iter()
        .filter_map(|(ch, times)| mean(&times).map(|avg| (ch, avg)))
        .sorted_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
        .take(5)
        .collect()
}

/// Keystroke cadence: steady when the inter-key deviation stays under
/// half the mean interval.
pub fn rhythm(keystrokes: &[Keystroke]) -> RhythmProfile {
    let intervals: Vec<f64> = keystrokes
        .windows(2)
        .map(|pair| pair[1].timestamp_ms.saturating_sub(pair[0].timestamp_ms) as f64)
        .collect();

    match (mean(&intervals), std_dev(&intervals)) {
        (Some(avg), Some(dev)) => RhythmProfile {
            steady: dev < avg * 0.5,
            avg_interval_ms: avg,
            deviation_ms: dev,
        },
        _ => RhythmProfile {
            steady: true,
            avg_interval_ms: 0.0,
            deviation_ms: 0.0,
        },
    }
}

fn recommendations(result: &SessionResult, errors: &[(char, usize)]) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if result.wpm < 25.0 {
        recommendations.push(Recommendation {
            title: "Focus on speed",
            detail: "Short micro drills build muscle memory for common patterns".to_string(),
        });
    }

    if result.accuracy < 85.0 {
        recommendations.push(Recommendation {
            title: "Improve accuracy",
            detail: "Slow down and type correctly before building speed".to_string(),
        });
    }

    if !errors.is_empty() {
        let problem_chars = errors
            .iter()
            .take(3)
            .map(|(ch, _)| format!("'{ch}'"))
            .join(", ");
        recommendations.push(Recommendation {
            title: "Practice problem characters",
            detail: format!("Focus on: {problem_chars}"),
        });
    }

    recommendations
}

fn comparison(result: &SessionResult, profile: &UserProfile, recent: &[SessionRecord]) -> Comparison {
    let window: Vec<&SessionRecord> = recent.iter().take(5).collect();
    let recent_wpm = mean(&window.iter().map(|r| r.wpm).collect::<Vec<_>>());
    let recent_accuracy = mean(&window.iter().map(|r| r.accuracy).collect::<Vec<_>>());

    let trend = if recent.len() < 3 {
        Trend::InsufficientData
    } else {
        // Oldest-to-newest order for the slope.
        let series: Vec<f64> = recent.iter().take(10).rev().map(|r| r.wpm).collect();
        let slope = linear_trend(&series);
        if slope > 1.0 {
            Trend::Improving
        } else if slope < -1.0 {
            Trend::Declining
        } else {
            Trend::Stable
        }
    };

    Comparison {
        wpm_change: recent_wpm.map_or(0.0, |avg| result.wpm - avg),
        accuracy_change: recent_accuracy.map_or(0.0, |avg| result.accuracy - avg),
        trend,
        personal_best_wpm: result.wpm >= profile.best_wpm,
        personal_best_accuracy: result.accuracy >= profile.best_accuracy,
    }
}

fn analyze(result: &SessionResult, profile: &UserProfile, recent: &[SessionRecord]) -> SessionAnalysis {
    let wpm_values: Vec<f64> = result.wpm_samples.iter().map(|s| s.value).collect();
    let accuracy_values: Vec<f64> = result.accuracy_samples.iter().map(|s| s.value).collect();
    let errors = common_errors(result);

    SessionAnalysis {
        consistency: consistency(&wpm_values),
        improvement: improvement(&wpm_values),
        accuracy_trend: accuracy_trend(&accuracy_values),
        peak_wpm: wpm_values.iter().copied().fold(0.0, f64::max),
        average_wpm: mean(&wpm_values).unwrap_or(0.0),
        slowest_keys: slowest_keys(&result.keystrokes),
        rhythm: rhythm(&result.keystrokes),
        recommendations: recommendations(result, &errors),
        common_errors: errors,
        comparison: comparison(result, profile, recent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Sample;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn result_with(wpm: f64, accuracy: f64, completed: bool) -> SessionResult {
        SessionResult {
            wpm,
            accuracy,
            errors: 0,
            extra_typed: 0,
            time_elapsed_ms: 60_000,
            characters_typed: 100,
            target_length: 100,
            completed,
            error_positions: Vec::new(),
            keystrokes: Vec::new(),
            wpm_samples: vec![Sample::new(0, wpm)],
            accuracy_samples: vec![Sample::new(0, accuracy)],
        }
    }

    fn meta() -> SessionMeta {
        SessionMeta {
            language: "python".to_string(),
            topic: Some("array".to_string()),
            problem_id: "two-sum".to_string(),
            mode: PracticeMode::Problem,
        }
    }

    fn tracker_in(dir: &Path) -> Tracker<FileProfileStore> {
        Tracker::new(FileProfileStore::with_path(dir.join("profile.json")))
    }

    fn day(day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn records_update_totals_and_bests() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_in(dir.path());

        let result = result_with(40.0, 90.0, true);
        let record = meta().record(&result, day(1));
        tracker.record(&result, &record, &[]).unwrap();

        let profile = tracker.profile();
        assert_eq!(profile.total_sessions, 1);
        assert_eq!(profile.problems_solved, 1);
        assert_eq!(profile.best_wpm, 40.0);
        assert_eq!(profile.average_wpm, 40.0);
        assert_eq!(profile.preferred_language, "python");
    }

    #[test]
    fn lenient_finish_is_recorded_but_not_solved() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_in(dir.path());

        let result = result_with(40.0, 90.0, false);
        let record = meta().record(&result, day(1));
        tracker.record(&result, &record, &[]).unwrap();

        assert_eq!(tracker.profile().total_sessions, 1);
        assert_eq!(tracker.profile().problems_solved, 0);
    }

    #[test]
    fn running_average_is_exact() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_in(dir.path());

        for wpm in [30.0, 40.0, 50.0] {
            let result = result_with(wpm, 90.0, true);
            let record = meta().record(&result, day(1));
            tracker.record(&result, &record, &[]).unwrap();
        }

        assert!((tracker.profile().average_wpm - 40.0).abs() < 1e-9);
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_in(dir.path());
        let result = result_with(30.0, 90.0, true);

        for d in [1, 2, 3] {
            let record = meta().record(&result, day(d));
            tracker.record(&result, &record, &[]).unwrap();
        }
        assert_eq!(tracker.profile().streak_days, 3);

        // Second session on the same day leaves the streak alone.
        let record = meta().record(&result, day(3));
        tracker.record(&result, &record, &[]).unwrap();
        assert_eq!(tracker.profile().streak_days, 3);

        // A gap resets to 1.
        let record = meta().record(&result, day(10));
        tracker.record(&result, &record, &[]).unwrap();
        assert_eq!(tracker.profile().streak_days, 1);
    }

    #[test]
    fn achievements_unlock_once() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_in(dir.path());

        let result = result_with(35.0, 90.0, true);
        let record = meta().record(&result, day(1));
        let outcome = tracker.record(&result, &record, &[]).unwrap();

        let ids: Vec<&str> = outcome.unlocked.iter().map(|a| a.id).collect();
        assert!(ids.contains(&"first-steps"));
        assert!(ids.contains(&"speed-demon"));
        assert!(!ids.contains(&"lightning-fast"));

        // Nothing new unlocks for an identical follow-up session.
        let record = meta().record(&result, day(1));
        let outcome = tracker.record(&result, &record, &[]).unwrap();
        assert!(outcome.unlocked.is_empty());
    }

    #[test]
    fn profile_persists_across_tracker_instances() {
        let dir = tempdir().unwrap();

        {
            let mut tracker = tracker_in(dir.path());
            let result = result_with(55.0, 96.0, true);
            let record = meta().record(&result, day(1));
            tracker.record(&result, &record, &[]).unwrap();
        }

        let reloaded = tracker_in(dir.path());
        assert_eq!(reloaded.profile().total_sessions, 1);
        assert_eq!(reloaded.profile().best_wpm, 55.0);
        assert!(reloaded
            .profile()
            .achievements
            .contains(&"lightning-fast".to_string()));
    }

    #[test]
    fn skill_level_thresholds() {
        let mut profile = UserProfile::default();
        assert_eq!(skill_level_of(&profile), SkillLevel::Beginner);

        profile.average_wpm = 22.0;
        profile.average_accuracy = 75.0;
        profile.problems_solved = 12;
        assert_eq!(skill_level_of(&profile), SkillLevel::Intermediate);

        profile.average_wpm = 40.0;
        profile.average_accuracy = 85.0;
        profile.problems_solved = 30;
        assert_eq!(skill_level_of(&profile), SkillLevel::Advanced);

        profile.average_wpm = 60.0;
        profile.average_accuracy = 95.0;
        profile.problems_solved = 60;
        assert_eq!(skill_level_of(&profile), SkillLevel::Expert);
    }

    #[test]
    fn consistency_of_flat_series_is_100() {
        assert_eq!(consistency(&[40.0, 40.0, 40.0]), 100.0);
        assert_eq!(consistency(&[40.0]), 100.0);
    }

    #[test]
    fn improvement_measures_half_over_half() {
        // First half mean 20, second half mean 30: +50%.
        let improvement = improvement(&[20.0, 20.0, 30.0, 30.0]);
        assert!((improvement - 50.0).abs() < 1e-9);
    }

    #[test]
    fn common_errors_rank_by_count() {
        let mut result = result_with(30.0, 80.0, false);
        result.error_positions = vec![0, 1, 2];
        result.keystrokes = vec![
            Keystroke {
                timestamp_ms: 0,
                character: Some('x'),
                position: 0,
            },
            Keystroke {
                timestamp_ms: 100,
                character: Some('y'),
                position: 1,
            },
            Keystroke {
                timestamp_ms: 200,
                character: Some('x'),
                position: 2,
            },
        ];

        assert_eq!(common_errors(&result), vec![('x', 2), ('y', 1)]);
    }

    #[test]
    fn slowest_keys_rank_by_mean_delay() {
        let keystrokes = vec![
            Keystroke {
                timestamp_ms: 0,
                character: Some('a'),
                position: 0,
            },
            Keystroke {
                timestamp_ms: 500,
                character: Some('q'),
                position: 1,
            },
            Keystroke {
                timestamp_ms: 600,
                character: Some('a'),
                position: 2,
            },
        ];

        let slowest = slowest_keys(&keystrokes);
        assert_eq!(slowest[0], ('q', 500.0));
        assert_eq!(slowest[1], ('a', 100.0));
    }

    #[test]
    fn rhythm_of_even_cadence_is_steady() {
        let keystrokes: Vec<Keystroke> = (0..5)
            .map(|i| Keystroke {
                timestamp_ms: i * 200,
                character: Some('a'),
                position: i as usize,
            })
            .collect();

        let profile = rhythm(&keystrokes);
        assert!(profile.steady);
        assert_eq!(profile.avg_interval_ms, 200.0);
    }

    #[test]
    fn slow_sloppy_session_gets_recommendations() {
        let mut result = result_with(15.0, 70.0, false);
        result.error_positions = vec![0];
        result.keystrokes = vec![Keystroke {
            timestamp_ms: 0,
            character: Some('x'),
            position: 0,
        }];

        let dir = tempdir().unwrap();
        let mut tracker = tracker_in(dir.path());
        let record = meta().record(&result, day(1));
        let outcome = tracker.record(&result, &record, &[]).unwrap();

        let titles: Vec<&str> = outcome
            .analysis
            .recommendations
            .iter()
            .map(|r| r.title)
            .collect();
        assert!(titles.contains(&"Focus on speed"));
        assert!(titles.contains(&"Improve accuracy"));
        assert!(titles.contains(&"Practice problem characters"));
    }

    #[test]
    fn comparison_flags_personal_best() {
        let dir = tempdir().unwrap();
        let mut tracker = tracker_in(dir.path());

        let result = result_with(45.0, 92.0, true);
        let record = meta().record(&result, day(1));
        let outcome = tracker.record(&result, &record, &[]).unwrap();

        assert!(outcome.analysis.comparison.personal_best_wpm);
        assert_eq!(outcome.analysis.comparison.trend, Trend::InsufficientData);
    }
}
