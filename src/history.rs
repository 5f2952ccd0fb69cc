use crate::app_dirs::AppDirs;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

/// One finished session as stored in history.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionRecord {
    pub timestamp: DateTime<Local>,
    pub language: String,
    pub topic: Option<String>,
    pub problem_id: String,
    pub mode: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub errors: u64,
    pub extra_typed: u64,
    pub time_elapsed_ms: u64,
    pub characters_typed: u64,
    pub completed: bool,
}

/// Database manager for session history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (or create) the history database in the app state directory.
    pub fn new() -> Result<Self> {
        let db_path =
            AppDirs::db_path().unwrap_or_else(|| PathBuf::from("codedrill_history.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::init(Connection::open(&db_path)?)
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                language TEXT NOT NULL,
                topic TEXT,
                problem_id TEXT NOT NULL,
                mode TEXT NOT NULL,
                wpm REAL NOT NULL,
                accuracy REAL NOT NULL,
                errors INTEGER NOT NULL,
                extra_typed INTEGER NOT NULL,
                time_elapsed_ms INTEGER NOT NULL,
                characters_typed INTEGER NOT NULL,
                completed BOOLEAN NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_timestamp ON sessions(timestamp)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_language ON sessions(language)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    /// Append one session record.
    pub fn record(&self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (timestamp, language, topic, problem_id, mode, wpm, accuracy,
             errors, extra_typed, time_elapsed_ms, characters_typed, completed)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                record.timestamp.to_rfc3339(),
                record.language,
                record.topic,
                record.problem_id,
                record.mode,
                record.wpm,
                record.accuracy,
                record.errors,
                record.extra_typed,
                record.time_elapsed_ms,
                record.characters_typed,
                record.completed,
            ],
        )?;

        Ok(())
    }

    /// The most recent sessions, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT timestamp, language, topic, problem_id, mode, wpm, accuracy,
                   errors, extra_typed, time_elapsed_ms, characters_typed, completed
            FROM sessions
            ORDER BY timestamp DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let record_iter = stmt.query_map([limit as i64], |row| {
            let timestamp_str: String = row.get(0)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(SessionRecord {
                timestamp,
                language: row.get(1)?,
                topic: row.get(2)?,
                problem_id: row.get(3)?,
                mode: row.get(4)?,
                wpm: row.get(5)?,
                accuracy: row.get(6)?,
                errors: row.get(7)?,
                extra_typed: row.get(8)?,
                time_elapsed_ms: row.get(9)?,
                characters_typed: row.get(10)?,
                completed: row.get(11)?,
            })
        })?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }

        Ok(records)
    }

    pub fn session_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn best_wpm(&self) -> Result<Option<f64>> {
        self.conn
            .query_row("SELECT MAX(wpm) FROM sessions", [], |row| row.get(0))
    }

    /// Mean WPM over the last `last` sessions.
    pub fn average_wpm(&self, last: usize) -> Result<Option<f64>> {
        self.conn.query_row(
            r#"
            SELECT AVG(wpm) FROM (
                SELECT wpm FROM sessions ORDER BY timestamp DESC, id DESC LIMIT ?1
            )
            "#,
            [last as i64],
            |row| row.get(0),
        )
    }

    /// Share of sessions finished with an exact match, in percent.
    pub fn completion_rate(&self) -> Result<Option<f64>> {
        let (total, completed): (i64, i64) = self.conn.query_row(
            r#"
            SELECT
                COUNT(*) as total,
                SUM(CASE WHEN completed = 1 THEN 1 ELSE 0 END) as completed
            FROM sessions
            "#,
            [],
            |row| Ok((row.get(0)?, row.get::<_, Option<i64>>(1)?.unwrap_or(0))),
        )?;

        if total == 0 {
            Ok(None)
        } else {
            Ok(Some((completed as f64 / total as f64) * 100.0))
        }
    }

    /// Session counts per language, most practiced first.
    pub fn language_distribution(&self) -> Result<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT language, COUNT(*) as sessions
            FROM sessions
            GROUP BY language
            ORDER BY sessions DESC, language ASC
            "#,
        )?;

        let row_iter = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut distribution = Vec::new();
        for row in row_iter {
            distribution.push(row?);
        }

        Ok(distribution)
    }

    /// Write the full history as CSV, header row included.
    pub fn export_csv(&self, path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let records = self.recent(i64::MAX as usize)?;

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "timestamp",
            "language",
            "topic",
            "problem_id",
            "mode",
            "wpm",
            "accuracy",
            "errors",
            "extra_typed",
            "time_elapsed_ms",
            "characters_typed",
            "completed",
        ])?;

        for record in records {
            writer.write_record([
                record.timestamp.to_rfc3339(),
                record.language.clone(),
                record.topic.clone().unwrap_or_default(),
                record.problem_id.clone(),
                record.mode.clone(),
                format!("{:.2}", record.wpm),
                format!("{:.2}", record.accuracy),
                record.errors.to_string(),
                record.extra_typed.to_string(),
                record.time_elapsed_ms.to_string(),
                record.characters_typed.to_string(),
                record.completed.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}
