//! SQLite-based persistence.
//!
//! Two tables:
//! - `sessions` -- one row per finished session (the summary columns)
//! - `kv` -- key-value store; holds the serialized state record under
//!   [`super::STATE_KEY`]

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::DatabaseError;
use crate::scoring::SessionSummary;

/// A finished session as stored in the history table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: i64,
    pub mode: String,
    pub duration_min: u32,
    pub unique_sites: u32,
    pub total_visits: u32,
    pub distraction_count: u32,
    pub focus_score: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Aggregate session statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_minutes: u64,
    pub total_distractions: u64,
    pub avg_focus_score: f64,
    pub today_sessions: u64,
    pub today_minutes: u64,
}

/// SQLite database for session history and the kv store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `data_dir()/focuskit.db`, creating the
    /// schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir()?;
        Self::open_at(&dir.join("focuskit.db"))
    }

    /// Open the database at an explicit path (integration tests point
    /// this at a temp directory).
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id                INTEGER PRIMARY KEY AUTOINCREMENT,
                    mode              TEXT NOT NULL,
                    duration_min      INTEGER NOT NULL,
                    unique_sites      INTEGER NOT NULL,
                    total_visits      INTEGER NOT NULL,
                    distraction_count INTEGER NOT NULL,
                    focus_score       INTEGER NOT NULL,
                    started_at        TEXT NOT NULL,
                    ended_at          TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_ended_at ON sessions(ended_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Record a finished session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        summary: &SessionSummary,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (mode, duration_min, unique_sites, total_visits,
                                   distraction_count, focus_score, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                summary.mode.to_string(),
                summary.duration_min,
                summary.unique_sites,
                summary.total_visits,
                summary.distraction_count,
                summary.focus_score,
                started_at.to_rfc3339(),
                ended_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions, newest first.
    pub fn history(&self, limit: u32) -> Result<Vec<SessionRow>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, duration_min, unique_sites, total_visits,
                    distraction_count, focus_score, started_at, ended_at
             FROM sessions ORDER BY ended_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, mode, duration, sites, visits, distractions, score, started, ended) = row?;
            out.push(SessionRow {
                id,
                mode,
                duration_min: duration,
                unique_sites: sites,
                total_visits: visits,
                distraction_count: distractions,
                focus_score: score,
                started_at: parse_ts(&started)?,
                ended_at: parse_ts(&ended)?,
            });
        }
        Ok(out)
    }

    pub fn stats_today(&self) -> Result<Stats, DatabaseError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.stats_filtered(Some(format!("{today}T00:00:00+00:00")))
    }

    pub fn stats_all(&self) -> Result<Stats, DatabaseError> {
        let mut stats = self.stats_filtered(None)?;
        let today = self.stats_today()?;
        stats.today_sessions = today.total_sessions;
        stats.today_minutes = today.total_minutes;
        Ok(stats)
    }

    fn stats_filtered(&self, since: Option<String>) -> Result<Stats, DatabaseError> {
        let (sql, bind) = match &since {
            Some(cutoff) => (
                "SELECT COUNT(*), COALESCE(SUM(duration_min), 0),
                        COALESCE(SUM(distraction_count), 0), COALESCE(AVG(focus_score), 0.0)
                 FROM sessions WHERE ended_at >= ?1",
                Some(cutoff.as_str()),
            ),
            None => (
                "SELECT COUNT(*), COALESCE(SUM(duration_min), 0),
                        COALESCE(SUM(distraction_count), 0), COALESCE(AVG(focus_score), 0.0)
                 FROM sessions",
                None,
            ),
        };

        let mut stmt = self.conn.prepare(sql)?;
        let map = |row: &rusqlite::Row<'_>| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, f64>(3)?,
            ))
        };
        let (sessions, minutes, distractions, avg_score) = match bind {
            Some(cutoff) => stmt.query_row(params![cutoff], map)?,
            None => stmt.query_row([], map)?,
        };

        let mut stats = Stats {
            total_sessions: sessions,
            total_minutes: minutes,
            total_distractions: distractions,
            avg_focus_score: avg_score,
            ..Stats::default()
        };
        if since.is_some() {
            stats.today_sessions = sessions;
            stats.today_minutes = minutes;
        }
        Ok(stats)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Mode;

    fn summary(score: u32, minutes: u32, distractions: u32) -> SessionSummary {
        SessionSummary {
            mode: Mode::Study,
            duration_min: minutes,
            target_duration_min: 45,
            unique_sites: 3,
            total_visits: 9,
            top_sites: vec![("a.com".to_string(), 5)],
            distraction_count: distractions,
            focus_score: score,
        }
    }

    #[test]
    fn record_and_query_history() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session(&summary(78, 30, 2), now, now).unwrap();
        db.record_session(&summary(100, 45, 0), now, now).unwrap();

        let history = db.history(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].mode, "study");

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_minutes, 75);
        assert_eq!(stats.total_distractions, 2);
        assert!((stats.avg_focus_score - 89.0).abs() < f64::EPSILON);
    }

    #[test]
    fn todays_sessions_show_up_in_both_windows() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_session(&summary(90, 25, 1), now, now).unwrap();

        let today = db.stats_today().unwrap();
        assert_eq!(today.total_sessions, 1);
        let all = db.stats_all().unwrap();
        assert_eq!(all.today_sessions, 1);
        assert_eq!(all.today_minutes, 25);
    }

    #[test]
    fn empty_database_has_zeroed_stats() {
        let db = Database::open_memory().unwrap();
        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.avg_focus_score, 0.0);
    }

    #[test]
    fn reopening_a_file_database_keeps_its_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focuskit.db");
        let now = Utc::now();

        {
            let db = Database::open_at(&path).unwrap();
            db.record_session(&summary(90, 25, 1), now, now).unwrap();
            db.kv_set("marker", "still here").unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.history(10).unwrap().len(), 1);
        assert_eq!(db.kv_get("marker").unwrap().unwrap(), "still here");
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "replaced").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "replaced");
    }
}
