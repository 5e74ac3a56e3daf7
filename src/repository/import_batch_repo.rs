// ==========================================
// Asset inventory - import batch log
// ==========================================
// Table: import_batch (one row per import that wrote data)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::inventory::{ImportBatch, TIMESTAMP_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct ImportBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportBatchRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, cycle_id, source, file_path, row_count, imported_by, imported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                batch.batch_id,
                batch.cycle_id,
                batch.source,
                batch.file_path,
                batch.row_count,
                batch.imported_by,
                batch.imported_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// Batches of one cycle, newest first
    pub fn list_by_cycle(&self, cycle_id: &str) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, cycle_id, source, file_path, row_count, imported_by, imported_at
            FROM import_batch
            WHERE cycle_id = ?1
            ORDER BY imported_at DESC, rowid DESC
            "#,
        )?;
        let batches = stmt
            .query_map(params![cycle_id], |row| {
                Ok(ImportBatch {
                    batch_id: row.get(0)?,
                    cycle_id: row.get(1)?,
                    source: row.get(2)?,
                    file_path: row.get(3)?,
                    row_count: row.get(4)?,
                    imported_by: row.get(5)?,
                    imported_at: row.get::<_, NaiveDateTime>(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }
}
