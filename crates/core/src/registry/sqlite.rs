//! SQLite-backed case registry implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{CaseEntry, CaseRegistry, RegistryError};
use crate::identifier::CaseId;

/// SQLite-backed case registry.
pub struct SqliteCaseRegistry {
    conn: Mutex<Connection>,
}

impl SqliteCaseRegistry {
    /// Create a new SQLite registry, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, RegistryError> {
        let conn = Connection::open(path).map_err(|e| RegistryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite registry (useful for testing).
    pub fn in_memory() -> Result<Self, RegistryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| RegistryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RegistryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cases (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                case_id TEXT NOT NULL UNIQUE,
                label TEXT NOT NULL,
                first_seen_at TEXT NOT NULL,
                first_run_id TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RegistryError> {
        self.conn
            .lock()
            .map_err(|e| RegistryError::Database(e.to_string()))
    }

    fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn into_entry(
        (case_id, label, first_seen_at, first_run_id): (String, String, String, String),
    ) -> Result<CaseEntry, RegistryError> {
        let first_seen_at = DateTime::parse_from_rfc3339(&first_seen_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RegistryError::Database(format!("Invalid timestamp: {}", e)))?;

        Ok(CaseEntry {
            case_id: CaseId::from_stored(case_id),
            label,
            first_seen_at,
            first_run_id,
        })
    }
}

impl CaseRegistry for SqliteCaseRegistry {
    fn register(&self, case_id: &CaseId, label: &str, run_id: &str) -> Result<bool, RegistryError> {
        let conn = self.lock()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO cases (case_id, label, first_seen_at, first_run_id)
                 VALUES (?, ?, ?, ?)",
                params![case_id.as_str(), label, Utc::now().to_rfc3339(), run_id],
            )
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        if inserted > 0 {
            tracing::debug!("Registered case {} ({})", case_id, label);
        }
        Ok(inserted > 0)
    }

    fn get(&self, case_id: &CaseId) -> Result<Option<CaseEntry>, RegistryError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT case_id, label, first_seen_at, first_run_id FROM cases WHERE case_id = ?",
                params![case_id.as_str()],
                Self::row_to_entry,
            )
            .optional()
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        row.map(Self::into_entry).transpose()
    }

    fn list(&self) -> Result<Vec<CaseEntry>, RegistryError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT case_id, label, first_seen_at, first_run_id FROM cases ORDER BY seq")
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_entry)
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let row = row.map_err(|e| RegistryError::Database(e.to_string()))?;
            entries.push(Self::into_entry(row)?);
        }
        Ok(entries)
    }

    fn count(&self) -> Result<u64, RegistryError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))
            .map_err(|e| RegistryError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}
