use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SinkError;
use crate::workout::Section;

/// One completed timeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub index: usize,
    pub section: Section,
    pub round: Option<u32>,
    pub name: String,
    pub planned_seconds: Option<u32>,
    pub spent_seconds: Option<u32>,
}

/// Handed to the results sink when a session reaches `complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub workout_id: String,
    pub title: String,
    pub user_id: Option<String>,
    pub exercises: Vec<ExerciseResult>,
    pub total_exercises: usize,
    pub total_elapsed_seconds: u32,
    pub main_rounds_completed: u32,
    pub main_circuit_rounds: Option<u32>,
    pub main_circuit_elapsed: Option<u32>,
    pub amrap_rounds_completed: u32,
    pub amrap_elapsed: Option<u32>,
    pub completed_at: DateTime<Utc>,
}

impl ResultsSummary {
    pub fn completion_rate(&self) -> f64 {
        if self.total_exercises == 0 {
            return 0.0;
        }
        (self.exercises.len() as f64 / self.total_exercises as f64 * 100.0).round()
    }
}

pub trait ResultsSink {
    fn record(&self, summary: &ResultsSummary) -> Result<(), SinkError>;
}

impl<T: ResultsSink + ?Sized> ResultsSink for &T {
    fn record(&self, summary: &ResultsSummary) -> Result<(), SinkError> {
        (**self).record(summary)
    }
}

/// An absent sink accepts everything and stores nothing.
impl<T: ResultsSink> ResultsSink for Option<T> {
    fn record(&self, summary: &ResultsSummary) -> Result<(), SinkError> {
        match self {
            Some(sink) => sink.record(summary),
            None => Ok(()),
        }
    }
}

/// A stored session row, as listed by `history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub user_id: String,
    pub workout_id: String,
    pub title: String,
    pub exercises_completed: u32,
    pub total_exercises: u32,
    pub total_elapsed_seconds: u32,
    pub main_rounds_completed: u32,
    pub amrap_rounds_completed: u32,
    pub completed_at: DateTime<Utc>,
}

/// SQLite-backed sink holding `workout_sessions` and their exercises.
#[derive(Debug)]
pub struct SqliteResultsSink {
    conn: Connection,
}

impl SqliteResultsSink {
    /// Open the database at `path`, creating parent directories and tables.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, SinkError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS workout_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                workout_id TEXT NOT NULL,
                title TEXT NOT NULL,
                exercises_completed INTEGER NOT NULL,
                total_exercises INTEGER NOT NULL,
                total_elapsed_seconds INTEGER NOT NULL,
                main_rounds_completed INTEGER NOT NULL,
                main_circuit_rounds INTEGER,
                main_circuit_elapsed INTEGER,
                amrap_rounds_completed INTEGER NOT NULL,
                amrap_elapsed INTEGER,
                completed_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS workout_session_exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                section TEXT NOT NULL,
                round INTEGER,
                name TEXT NOT NULL,
                planned_seconds INTEGER,
                spent_seconds INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_workout_sessions_user ON workout_sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_workout_sessions_completed ON workout_sessions(completed_at);
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Store a summary and its exercises in one transaction. Returns the row id.
    pub fn insert(&self, summary: &ResultsSummary) -> Result<i64, SinkError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO workout_sessions
            (user_id, workout_id, title, exercises_completed, total_exercises,
             total_elapsed_seconds, main_rounds_completed, main_circuit_rounds,
             main_circuit_elapsed, amrap_rounds_completed, amrap_elapsed, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                summary.user_id.as_deref().unwrap_or_default(),
                summary.workout_id,
                summary.title,
                summary.exercises.len() as i64,
                summary.total_exercises as i64,
                summary.total_elapsed_seconds,
                summary.main_rounds_completed,
                summary.main_circuit_rounds,
                summary.main_circuit_elapsed,
                summary.amrap_rounds_completed,
                summary.amrap_elapsed,
                summary.completed_at.to_rfc3339(),
            ],
        )?;
        let session_id = tx.last_insert_rowid();

        for exercise in &summary.exercises {
            tx.execute(
                r#"
                INSERT INTO workout_session_exercises
                (session_id, position, section, round, name, planned_seconds, spent_seconds)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    session_id,
                    exercise.index as i64,
                    exercise.section.to_string(),
                    exercise.round,
                    exercise.name,
                    exercise.planned_seconds,
                    exercise.spent_seconds,
                ],
            )?;
        }

        tx.commit()?;
        Ok(session_id)
    }

    /// Most recent sessions first, optionally for one user.
    pub fn recent_sessions(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, SinkError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, workout_id, title, exercises_completed, total_exercises,
                   total_elapsed_seconds, main_rounds_completed, amrap_rounds_completed,
                   completed_at
            FROM workout_sessions
            WHERE ?1 IS NULL OR user_id = ?1
            ORDER BY completed_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            let completed_at: String = row.get(9)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        9,
                        "completed_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Utc);

            Ok(SessionRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                workout_id: row.get(2)?,
                title: row.get(3)?,
                exercises_completed: row.get(4)?,
                total_exercises: row.get(5)?,
                total_elapsed_seconds: row.get(6)?,
                main_rounds_completed: row.get(7)?,
                amrap_rounds_completed: row.get(8)?,
                completed_at,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn exercise_names(&self, session_id: i64) -> Result<Vec<String>, SinkError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM workout_session_exercises WHERE session_id = ?1 ORDER BY position",
        )?;
        let names = stmt
            .query_map([session_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn last_completed_at(&self, workout_id: &str) -> Result<Option<DateTime<Utc>>, SinkError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT completed_at FROM workout_sessions WHERE workout_id = ?1 ORDER BY completed_at DESC LIMIT 1",
                [workout_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Write every stored session (optionally one user's) to a CSV file.
    pub fn export_csv<P: AsRef<Path>>(
        &self,
        path: P,
        user_id: Option<&str>,
    ) -> Result<usize, SinkError> {
        let records = self.recent_sessions(user_id, i64::MAX as usize)?;
        let mut writer = csv::Writer::from_path(path)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(records.len())
    }

    pub fn clear_all(&self) -> Result<(), SinkError> {
        self.conn.execute_batch(
            "DELETE FROM workout_session_exercises; DELETE FROM workout_sessions;",
        )?;
        Ok(())
    }
}

impl ResultsSink for SqliteResultsSink {
    fn record(&self, summary: &ResultsSummary) -> Result<(), SinkError> {
        let id = self.insert(summary)?;
        tracing::info!(session_id = id, workout = %summary.workout_id, "recorded workout session");
        Ok(())
    }
}
