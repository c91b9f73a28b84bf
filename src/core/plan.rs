//! Staged import plans
//!
//! A preview stages its reconciled plan under a session key; commit takes it
//! back out. `take` removes the plan in the same statement that reads it, so
//! a staged plan can be applied at most once and distinct sessions never see
//! each other's plans.

use std::fs;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::import::reconcile::ImportRow;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no staged import for session '{0}'")]
    NoStagedPlan(String),

    #[error("staged plan is not readable: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(String),
}

/// Keyed staged-plan storage in the workspace database
pub struct PlanStore {
    conn: Connection,
}

impl PlanStore {
    /// Open the plan store at the given database path
    pub fn open(path: &Path) -> Result<Self, PlanError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PlanError::Io(e.to_string()))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> Result<Self, PlanError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), PlanError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS staged_plans (
                session_key TEXT PRIMARY KEY,
                plan TEXT NOT NULL,
                staged_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Stage a plan, replacing any plan already staged for the session
    pub fn put(&self, session: &str, rows: &[ImportRow]) -> Result<(), PlanError> {
        let plan = serde_json::to_string(rows)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO staged_plans (session_key, plan, staged_at)
             VALUES (?1, ?2, ?3)",
            params![session, plan, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Take the staged plan for a session, removing it as it is read
    pub fn take(&self, session: &str) -> Result<Vec<ImportRow>, PlanError> {
        let plan: Option<String> = self
            .conn
            .query_row(
                "DELETE FROM staged_plans WHERE session_key = ?1 RETURNING plan",
                params![session],
                |row| row.get(0),
            )
            .optional()?;

        let plan = plan.ok_or_else(|| PlanError::NoStagedPlan(session.to_string()))?;
        Ok(serde_json::from_str(&plan)?)
    }
}
