//! SQLite-backed snapshot store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use super::{SnapshotError, SnapshotStore};
use crate::identifier::CaseId;
use crate::index::{RawFileRecord, RawIndex};
use crate::metadata::{MetadataRecord, MetadataSet};

/// SQLite-backed snapshot store.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Create a new snapshot store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, SnapshotError> {
        let conn = Connection::open(path).map_err(|e| SnapshotError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory snapshot store (useful for testing).
    pub fn in_memory() -> Result<Self, SnapshotError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SnapshotError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SnapshotError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS raw_index (
                file_name TEXT NOT NULL,
                abs_path TEXT NOT NULL UNIQUE,
                container TEXT NOT NULL,
                rel_path TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_raw_index_file_name ON raw_index(file_name);

            CREATE TABLE IF NOT EXISTS slide_map (
                record_id TEXT PRIMARY KEY,
                case_id TEXT NOT NULL,
                label TEXT NOT NULL,
                file_name TEXT,
                data_type TEXT,
                project_id TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_slide_map_case_id ON slide_map(case_id);
            "#,
        )
        .map_err(|e| SnapshotError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SnapshotError> {
        self.conn
            .lock()
            .map_err(|e| SnapshotError::Database(e.to_string()))
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save_raw_index(&self, index: &RawIndex) -> Result<usize, SnapshotError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| SnapshotError::Database(e.to_string()))?;

        tx.execute("DELETE FROM raw_index", [])
            .map_err(|e| SnapshotError::Database(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO raw_index (file_name, abs_path, container, rel_path) VALUES (?, ?, ?, ?)",
                )
                .map_err(|e| SnapshotError::Database(e.to_string()))?;
            for record in index.records() {
                stmt.execute(params![
                    record.file_name,
                    record.absolute_path.to_string_lossy(),
                    record.container_identifier,
                    record.relative_path.to_string_lossy(),
                ])
                .map_err(|e| SnapshotError::Database(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| SnapshotError::Database(e.to_string()))?;
        Ok(index.len())
    }

    fn save_slide_map(&self, records: &MetadataSet) -> Result<usize, SnapshotError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| SnapshotError::Database(e.to_string()))?;

        tx.execute("DELETE FROM slide_map", [])
            .map_err(|e| SnapshotError::Database(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO slide_map (record_id, case_id, label, file_name, data_type, project_id)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .map_err(|e| SnapshotError::Database(e.to_string()))?;
            for record in records.iter() {
                stmt.execute(params![
                    record.source_record_id,
                    record.case_id.as_str(),
                    record.label,
                    record.expected_file_name,
                    record.data_type,
                    record.project_id,
                ])
                .map_err(|e| SnapshotError::Database(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| SnapshotError::Database(e.to_string()))?;
        Ok(records.len())
    }

    fn raw_index(&self) -> Result<Vec<RawFileRecord>, SnapshotError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT file_name, abs_path, container, rel_path FROM raw_index
                 ORDER BY file_name, rel_path",
            )
            .map_err(|e| SnapshotError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RawFileRecord {
                    file_name: row.get(0)?,
                    absolute_path: PathBuf::from(row.get::<_, String>(1)?),
                    container_identifier: row.get(2)?,
                    relative_path: PathBuf::from(row.get::<_, String>(3)?),
                })
            })
            .map_err(|e| SnapshotError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| SnapshotError::Database(e.to_string()))
    }

    fn slide_map(&self) -> Result<Vec<MetadataRecord>, SnapshotError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_id, case_id, label, file_name, data_type, project_id FROM slide_map
                 ORDER BY case_id, file_name, record_id",
            )
            .map_err(|e| SnapshotError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(MetadataRecord {
                    source_record_id: row.get(0)?,
                    case_id: CaseId::from_stored(row.get(1)?),
                    label: row.get(2)?,
                    expected_file_name: row.get(3)?,
                    data_type: row.get(4)?,
                    project_id: row.get(5)?,
                })
            })
            .map_err(|e| SnapshotError::Database(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| SnapshotError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::normalize;

    fn raw(container: &str, name: &str) -> RawFileRecord {
        RawFileRecord {
            file_name: name.to_string(),
            absolute_path: PathBuf::from("/raw").join(container).join(name),
            container_identifier: container.to_string(),
            relative_path: PathBuf::from(container).join(name),
        }
    }

    fn record(id: &str, case: &str, name: &str) -> MetadataRecord {
        MetadataRecord {
            source_record_id: id.to_string(),
            case_id: normalize(case),
            label: "BRCA".to_string(),
            expected_file_name: Some(name.to_string()),
            data_type: Some("Slide Image".to_string()),
            project_id: Some("TCGA-BRCA".to_string()),
        }
    }

    #[test]
    fn test_raw_index_snapshot_replaces_previous() {
        let store = SqliteSnapshotStore::in_memory().unwrap();

        let first = RawIndex::from_records(
            PathBuf::from("/raw"),
            vec![raw("u1", "a.svs"), raw("u2", "b.svs")],
            0,
        );
        assert_eq!(store.save_raw_index(&first).unwrap(), 2);

        let second = RawIndex::from_records(PathBuf::from("/raw"), vec![raw("u3", "c.svs")], 0);
        store.save_raw_index(&second).unwrap();

        let rows = store.raw_index().unwrap();
        assert_eq!(rows, vec![raw("u3", "c.svs")]);
    }

    #[test]
    fn test_slide_map_snapshot() {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        let set: MetadataSet = vec![
            record("f2", "TCGA-ZZ-0001", "b.svs"),
            record("f1", "TCGA-AB-0001", "a.svs"),
        ]
        .into_iter()
        .collect();

        assert_eq!(store.save_slide_map(&set).unwrap(), 2);

        let rows = store.slide_map().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], record("f1", "TCGA-AB-0001", "a.svs"));
    }
}
