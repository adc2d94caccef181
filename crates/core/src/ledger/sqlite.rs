use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::{
    ExecutionOutcome, LedgerError, LedgerFilter, LedgerStore, PlacementStatus, RunRecord,
    StoredOutcome,
};
use crate::identifier::CaseId;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS runs (
        run_id TEXT PRIMARY KEY,
        started_at TEXT NOT NULL,
        finished_at TEXT NOT NULL,
        dry_run INTEGER NOT NULL,
        mode TEXT NOT NULL,
        overwrite INTEGER NOT NULL,
        config_hash TEXT NOT NULL,
        counts TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);

    CREATE TABLE IF NOT EXISTS placements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id TEXT NOT NULL REFERENCES runs(run_id) ON DELETE CASCADE,
        seq INTEGER NOT NULL,
        record_id TEXT NOT NULL,
        case_id TEXT NOT NULL,
        label TEXT NOT NULL,
        file_name TEXT,
        source_path TEXT,
        destination_path TEXT,
        status TEXT NOT NULL,
        error TEXT,
        UNIQUE(run_id, seq)
    );

    CREATE INDEX IF NOT EXISTS idx_placements_run_id ON placements(run_id);
    CREATE INDEX IF NOT EXISTS idx_placements_case_id ON placements(case_id);
    CREATE INDEX IF NOT EXISTS idx_placements_status ON placements(status);
"#;

/// SQLite-backed ledger store
pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
}

impl SqliteLedgerStore {
    /// Create a new SQLite ledger store, creating the database file and tables if needed
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory SQLite ledger store (useful for testing)
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory().map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, LedgerError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|e| LedgerError::Database(e.to_string()))
    }

    fn build_where_clause(filter: &LedgerFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref run_id) = filter.run_id {
            conditions.push("p.run_id = ?");
            params.push(Box::new(run_id.clone()));
        }

        if let Some(status) = filter.status {
            conditions.push("p.status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(ref case_id) = filter.case_id {
            conditions.push("p.case_id = ?");
            params.push(Box::new(case_id.as_str().to_string()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_outcome(row: &Row<'_>) -> rusqlite::Result<(String, i64, ExecutionOutcome, String)> {
        let status: String = row.get(9)?;
        Ok((
            row.get(0)?,
            row.get(1)?,
            ExecutionOutcome {
                source_record_id: row.get(2)?,
                case_id: CaseId::from_stored(row.get(3)?),
                label: row.get(4)?,
                file_name: row.get(5)?,
                source_path: row.get::<_, Option<String>>(6)?.map(PathBuf::from),
                destination_path: row.get::<_, Option<String>>(7)?.map(PathBuf::from),
                status: PlacementStatus::Error,
                error: row.get(8)?,
            },
            status,
        ))
    }

    fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRow> {
        Ok(RunRow {
            run_id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            dry_run: row.get(3)?,
            mode: row.get(4)?,
            overwrite: row.get(5)?,
            config_hash: row.get(6)?,
            counts: row.get(7)?,
        })
    }
}

/// Raw column values of a `runs` row.
struct RunRow {
    run_id: String,
    started_at: String,
    finished_at: String,
    dry_run: bool,
    mode: String,
    overwrite: bool,
    config_hash: String,
    counts: String,
}

impl RunRow {
    fn into_record(self) -> Result<RunRecord, LedgerError> {
        Ok(RunRecord {
            run_id: self.run_id,
            started_at: parse_timestamp(&self.started_at)?,
            finished_at: parse_timestamp(&self.finished_at)?,
            dry_run: self.dry_run,
            mode: self.mode.parse().map_err(LedgerError::Serialization)?,
            overwrite: self.overwrite,
            config_hash: self.config_hash,
            counts: serde_json::from_str(&self.counts)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LedgerError::Database(format!("Invalid timestamp: {}", e)))
}

fn path_text(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().to_string())
}

impl LedgerStore for SqliteLedgerStore {
    fn insert_run(
        &self,
        run: &RunRecord,
        outcomes: &[ExecutionOutcome],
    ) -> Result<(), LedgerError> {
        let mut conn = self.lock()?;

        let counts_json = serde_json::to_string(&run.counts)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let tx = conn
            .transaction()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO runs (run_id, started_at, finished_at, dry_run, mode, overwrite, config_hash, counts)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                run.run_id,
                run.started_at.to_rfc3339(),
                run.finished_at.to_rfc3339(),
                run.dry_run,
                run.mode.as_str(),
                run.overwrite,
                run.config_hash,
                counts_json,
            ],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO placements
                     (run_id, seq, record_id, case_id, label, file_name, source_path, destination_path, status, error)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .map_err(|e| LedgerError::Database(e.to_string()))?;

            for (seq, outcome) in outcomes.iter().enumerate() {
                stmt.execute(params![
                    run.run_id,
                    seq as i64,
                    outcome.source_record_id,
                    outcome.case_id.as_str(),
                    outcome.label,
                    outcome.file_name,
                    path_text(&outcome.source_path),
                    path_text(&outcome.destination_path),
                    outcome.status.as_str(),
                    outcome.error,
                ])
                .map_err(|e| LedgerError::Database(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    fn query(&self, filter: &LedgerFilter) -> Result<Vec<StoredOutcome>, LedgerError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT p.run_id, p.seq, p.record_id, p.case_id, p.label, p.file_name, p.source_path,
                    p.destination_path, p.error, p.status
             FROM placements p JOIN runs r ON r.run_id = p.run_id
             {} ORDER BY r.started_at, p.run_id, p.seq LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));
        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_outcome)
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            let (run_id, seq, mut outcome, status) =
                row.map_err(|e| LedgerError::Database(e.to_string()))?;
            outcome.status = status.parse().map_err(LedgerError::Serialization)?;
            results.push(StoredOutcome {
                run_id,
                seq,
                outcome,
            });
        }

        Ok(results)
    }

    fn runs(&self, limit: i64) -> Result<Vec<RunRecord>, LedgerError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT run_id, started_at, finished_at, dry_run, mode, overwrite, config_hash, counts
                 FROM runs ORDER BY started_at DESC, rowid DESC LIMIT ?",
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit], Self::row_to_run)
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            let row = row.map_err(|e| LedgerError::Database(e.to_string()))?;
            results.push(row.into_record()?);
        }

        Ok(results)
    }
}
