// ==========================================
// Asset inventory - movement repository
// ==========================================
// Tables: transit_record, supplier_record (append-only)
// Box type labels are stored raw and normalized when aggregated
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::inventory::{GroupedQuantity, SupplierRecord, TransitRecord, TIMESTAMP_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct MovementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MovementRepository {
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

    /// Append one transit record, returning its row id
    pub fn append_transit(&self, record: &TransitRecord) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO transit_record (
                cycle_id, origin, box_type_raw, quantity, user_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.cycle_id,
                record.origin,
                record.box_type_raw,
                record.quantity,
                record.user_name,
                record.created_at.format(TIMESTAMP_FORMAT).to_string(),
                record.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Append a batch of transit records in one transaction
    pub fn append_transit_batch(&self, records: &[TransitRecord]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO transit_record (
                    cycle_id, origin, box_type_raw, quantity, user_name, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for record in records {
                stmt.execute(params![
                    record.cycle_id,
                    record.origin,
                    record.box_type_raw,
                    record.quantity,
                    record.user_name,
                    record.created_at.format(TIMESTAMP_FORMAT).to_string(),
                    record.updated_at.format(TIMESTAMP_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn append_supplier(&self, record: &SupplierRecord) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO supplier_record (cycle_id, supplier_type, box_type_raw, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.cycle_id,
                record.supplier_type,
                record.box_type_raw,
                record.quantity,
                record.created_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_transit(&self, cycle_id: &str) -> RepositoryResult<Vec<TransitRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, cycle_id, origin, box_type_raw, quantity, user_name, created_at, updated_at
            FROM transit_record WHERE cycle_id = ?1 ORDER BY id
            "#,
        )?;
        let records = stmt
            .query_map(params![cycle_id], |row| {
                Ok(TransitRecord {
                    id: row.get(0)?,
                    cycle_id: row.get(1)?,
                    origin: row.get(2)?,
                    box_type_raw: row.get(3)?,
                    quantity: row.get(4)?,
                    user_name: row.get(5)?,
                    created_at: row.get::<_, NaiveDateTime>(6)?,
                    updated_at: row.get::<_, NaiveDateTime>(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn list_supplier(&self, cycle_id: &str) -> RepositoryResult<Vec<SupplierRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, cycle_id, supplier_type, box_type_raw, quantity, created_at
            FROM supplier_record WHERE cycle_id = ?1 ORDER BY id
            "#,
        )?;
        let records = stmt
            .query_map(params![cycle_id], |row| {
                Ok(SupplierRecord {
                    id: row.get(0)?,
                    cycle_id: row.get(1)?,
                    supplier_type: row.get(2)?,
                    box_type_raw: row.get(3)?,
                    quantity: row.get(4)?,
                    created_at: row.get::<_, NaiveDateTime>(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Transit summed per (origin, raw box type)
    pub fn grouped_transit(&self, cycle_id: &str) -> RepositoryResult<Vec<GroupedQuantity>> {
        self.grouped(
            r#"
            SELECT origin, box_type_raw, SUM(quantity)
            FROM transit_record WHERE cycle_id = ?1
            GROUP BY origin, box_type_raw
            ORDER BY origin, box_type_raw
            "#,
            cycle_id,
        )
    }

    /// Supplier records summed per (supplier type, raw box type)
    pub fn grouped_supplier(&self, cycle_id: &str) -> RepositoryResult<Vec<GroupedQuantity>> {
        self.grouped(
            r#"
            SELECT supplier_type, box_type_raw, SUM(quantity)
            FROM supplier_record WHERE cycle_id = ?1
            GROUP BY supplier_type, box_type_raw
            ORDER BY supplier_type, box_type_raw
            "#,
            cycle_id,
        )
    }

    fn grouped(&self, sql: &str, cycle_id: &str) -> RepositoryResult<Vec<GroupedQuantity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let groups = stmt
            .query_map(params![cycle_id], |row| {
                Ok(GroupedQuantity {
                    label: row.get(0)?,
                    box_type_raw: row.get(1)?,
                    quantity: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }
}
