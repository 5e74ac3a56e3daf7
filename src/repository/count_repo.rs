// ==========================================
// Asset inventory - count repository
// ==========================================
// Tables: store_count, sector_count
// Upsert key: (cycle_id, store_name) / (cycle_id, sector_name)
// Every write is a single statement
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::inventory::{
    BoxCounts, RegionTally, SectorCount, StoreCount, TIMESTAMP_FORMAT,
};
use crate::domain::types::{BoxType, CountStatus, DEFAULT_SECTOR_LABEL, SYSTEM_USER};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::FINALIZED_SQL;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// "caixa_hb_623, caixa_hb_618, ..." in BoxType::ALL order
fn count_columns() -> String {
    BoxType::ALL
        .iter()
        .map(|t| t.column())
        .collect::<Vec<_>>()
        .join(", ")
}

/// "col = excluded.col, ..." for a full overwrite
fn overwrite_assignments() -> String {
    BoxType::ALL
        .iter()
        .map(|t| format!("{0} = excluded.{0}", t.column()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_counts(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<BoxCounts> {
    let mut counts = BoxCounts::zero();
    for (offset, box_type) in BoxType::ALL.iter().enumerate() {
        counts.set(*box_type, row.get(first + offset)?);
    }
    Ok(counts)
}

fn parse_count_status(table: &str, name: &str, value: &str) -> RepositoryResult<CountStatus> {
    CountStatus::parse(value).ok_or_else(|| RepositoryError::FieldValueError {
        field: format!("{}.status", table),
        message: format!("unknown status '{}' on {}", value, name),
    })
}

fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ==========================================
// CountRepository
// ==========================================
pub struct CountRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CountRepository {
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

    // ==========================================
    // Store counts
    // ==========================================

    /// Insert or fully overwrite a store row (created_at is kept on update)
    pub fn upsert_store_count(&self, row: &StoreCount) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            INSERT INTO store_count (
                cycle_id, store_name, region, sector_label, {cols},
                status, user_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(cycle_id, store_name) DO UPDATE SET
                region = excluded.region,
                sector_label = excluded.sector_label,
                {assign},
                status = excluded.status,
                user_name = excluded.user_name,
                updated_at = excluded.updated_at
            "#,
            cols = count_columns(),
            assign = overwrite_assignments(),
        );
        let c = &row.counts;
        conn.execute(
            &sql,
            params![
                row.cycle_id,
                row.store_name,
                row.region,
                row.sector_label,
                c.get(BoxType::Hb623),
                c.get(BoxType::Hb618),
                c.get(BoxType::HntG),
                c.get(BoxType::HntP),
                c.get(BoxType::Chocolate),
                c.get(BoxType::Bin),
                c.get(BoxType::PalletsPbr),
                row.status.as_str(),
                row.user_name,
                fmt_ts(row.created_at),
                fmt_ts(row.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Add `quantity` to one box type column, creating the row if needed
    ///
    /// A new row starts at zero, pending (or finalized when `finalize`),
    /// with the given region. An existing row keeps its region unless it was empty.
    #[allow(clippy::too_many_arguments)]
    pub fn add_store_quantity(
        &self,
        cycle_id: &str,
        store_name: &str,
        region: &str,
        box_type: BoxType,
        quantity: i64,
        finalize: bool,
        user_name: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let col = box_type.column();
        let initial_status = if finalize {
            CountStatus::Finalized
        } else {
            CountStatus::Pending
        };
        let sql = format!(
            r#"
            INSERT INTO store_count (
                cycle_id, store_name, region, sector_label, {col},
                status, user_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(cycle_id, store_name) DO UPDATE SET
                {col} = {col} + excluded.{col},
                region = CASE WHEN region = '' THEN excluded.region ELSE region END,
                status = CASE WHEN ?9 THEN excluded.status ELSE status END,
                updated_at = excluded.updated_at
            "#,
            col = col,
        );
        conn.execute(
            &sql,
            params![
                cycle_id,
                store_name,
                region,
                DEFAULT_SECTOR_LABEL,
                quantity,
                initial_status.as_str(),
                user_name,
                fmt_ts(now),
                finalize,
            ],
        )?;
        Ok(())
    }

    /// Zero pending row for a store; no-op when the row exists
    ///
    /// # Returns
    /// - true when a row was inserted
    pub fn insert_missing_store(
        &self,
        cycle_id: &str,
        store_name: &str,
        region: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO store_count (
                cycle_id, store_name, region, sector_label, status, user_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(cycle_id, store_name) DO NOTHING
            "#,
            params![
                cycle_id,
                store_name,
                region,
                DEFAULT_SECTOR_LABEL,
                CountStatus::Pending.as_str(),
                SYSTEM_USER,
                fmt_ts(now),
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn find_store_count(
        &self,
        cycle_id: &str,
        store_name: &str,
    ) -> RepositoryResult<Option<StoreCount>> {
        let mut rows = self.query_store_counts(
            "WHERE cycle_id = ?1 AND store_name = ?2",
            &[&cycle_id, &store_name],
        )?;
        Ok(rows.pop())
    }

    /// Every store row of a cycle, by name
    pub fn list_store_counts(&self, cycle_id: &str) -> RepositoryResult<Vec<StoreCount>> {
        self.query_store_counts("WHERE cycle_id = ?1 ORDER BY store_name", &[&cycle_id])
    }

    fn query_store_counts(
        &self,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<StoreCount>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT cycle_id, store_name, region, sector_label, {}, status, user_name, created_at, updated_at
             FROM store_count {}",
            count_columns(),
            filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    read_counts(row, 4)?,
                    row.get::<_, String>(11)?,
                    row.get::<_, String>(12)?,
                    row.get::<_, NaiveDateTime>(13)?,
                    row.get::<_, NaiveDateTime>(14)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(cycle_id, store_name, region, sector_label, counts, status, user_name, created_at, updated_at)| {
                    let status = parse_count_status("store_count", &store_name, &status)?;
                    Ok(StoreCount {
                        cycle_id,
                        store_name,
                        region,
                        sector_label,
                        counts,
                        status,
                        user_name,
                        created_at,
                        updated_at,
                    })
                },
            )
            .collect()
    }

    pub fn store_names(&self, cycle_id: &str) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT store_name FROM store_count WHERE cycle_id = ?1")?;
        let names = stmt
            .query_map(params![cycle_id], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(names)
    }

    /// Persisted store rows grouped by (raw) region
    pub fn stores_by_region(&self, cycle_id: &str) -> RepositoryResult<Vec<RegionTally>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT region,
                   COUNT(*),
                   COALESCE(SUM(CASE WHEN status IN {} THEN 1 ELSE 0 END), 0)
            FROM store_count
            WHERE cycle_id = ?1
            GROUP BY region
            ORDER BY region
            "#,
            FINALIZED_SQL
        ))?;
        let tallies = stmt
            .query_map(params![cycle_id], |row| {
                Ok(RegionTally {
                    region: row.get(0)?,
                    total: row.get(1)?,
                    finalized: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tallies)
    }

    /// Not-finalized store names per (raw) region, sorted
    pub fn pending_stores_by_region(
        &self,
        cycle_id: &str,
    ) -> RepositoryResult<BTreeMap<String, Vec<String>>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT region, store_name
            FROM store_count
            WHERE cycle_id = ?1 AND status NOT IN {}
            ORDER BY region, store_name
            "#,
            FINALIZED_SQL
        ))?;
        let rows = stmt
            .query_map(params![cycle_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut pending: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (region, store) in rows {
            pending.entry(region).or_default().push(store);
        }
        Ok(pending)
    }

    // ==========================================
    // Sector counts
    // ==========================================

    pub fn upsert_sector_count(&self, row: &SectorCount) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            INSERT INTO sector_count (
                cycle_id, sector_name, {cols}, status, user_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(cycle_id, sector_name) DO UPDATE SET
                {assign},
                status = excluded.status,
                user_name = excluded.user_name,
                updated_at = excluded.updated_at
            "#,
            cols = count_columns(),
            assign = overwrite_assignments(),
        );
        let c = &row.counts;
        conn.execute(
            &sql,
            params![
                row.cycle_id,
                row.sector_name,
                c.get(BoxType::Hb623),
                c.get(BoxType::Hb618),
                c.get(BoxType::HntG),
                c.get(BoxType::HntP),
                c.get(BoxType::Chocolate),
                c.get(BoxType::Bin),
                c.get(BoxType::PalletsPbr),
                row.status.as_str(),
                row.user_name,
                fmt_ts(row.created_at),
                fmt_ts(row.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Sector counterpart of `add_store_quantity`
    #[allow(clippy::too_many_arguments)]
    pub fn add_sector_quantity(
        &self,
        cycle_id: &str,
        sector_name: &str,
        box_type: BoxType,
        quantity: i64,
        finalize: bool,
        user_name: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let col = box_type.column();
        let initial_status = if finalize {
            CountStatus::Finalized
        } else {
            CountStatus::Pending
        };
        let sql = format!(
            r#"
            INSERT INTO sector_count (
                cycle_id, sector_name, {col}, status, user_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(cycle_id, sector_name) DO UPDATE SET
                {col} = {col} + excluded.{col},
                status = CASE WHEN ?7 THEN excluded.status ELSE status END,
                updated_at = excluded.updated_at
            "#,
            col = col,
        );
        conn.execute(
            &sql,
            params![
                cycle_id,
                sector_name,
                quantity,
                initial_status.as_str(),
                user_name,
                fmt_ts(now),
                finalize,
            ],
        )?;
        Ok(())
    }

    pub fn insert_missing_sector(
        &self,
        cycle_id: &str,
        sector_name: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO sector_count (
                cycle_id, sector_name, status, user_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(cycle_id, sector_name) DO NOTHING
            "#,
            params![
                cycle_id,
                sector_name,
                CountStatus::Pending.as_str(),
                SYSTEM_USER,
                fmt_ts(now),
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn find_sector_count(
        &self,
        cycle_id: &str,
        sector_name: &str,
    ) -> RepositoryResult<Option<SectorCount>> {
        let mut rows = self.query_sector_counts(
            "WHERE cycle_id = ?1 AND sector_name = ?2",
            &[&cycle_id, &sector_name],
        )?;
        Ok(rows.pop())
    }

    pub fn list_sector_counts(&self, cycle_id: &str) -> RepositoryResult<Vec<SectorCount>> {
        self.query_sector_counts("WHERE cycle_id = ?1 ORDER BY sector_name", &[&cycle_id])
    }

    fn query_sector_counts(
        &self,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<SectorCount>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT cycle_id, sector_name, {}, status, user_name, created_at, updated_at
             FROM sector_count {}",
            count_columns(),
            filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    read_counts(row, 2)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, String>(10)?,
                    row.get::<_, NaiveDateTime>(11)?,
                    row.get::<_, NaiveDateTime>(12)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(cycle_id, sector_name, counts, status, user_name, created_at, updated_at)| {
                    let status = parse_count_status("sector_count", &sector_name, &status)?;
                    Ok(SectorCount {
                        cycle_id,
                        sector_name,
                        counts,
                        status,
                        user_name,
                        created_at,
                        updated_at,
                    })
                },
            )
            .collect()
    }

    pub fn sector_names(&self, cycle_id: &str) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT sector_name FROM sector_count WHERE cycle_id = ?1")?;
        let names = stmt
            .query_map(params![cycle_id], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(names)
    }

    /// Rows in both count tables for a cycle
    pub fn row_count(&self, cycle_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let total: Option<i64> = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM store_count WHERE cycle_id = ?1)
                      + (SELECT COUNT(*) FROM sector_count WHERE cycle_id = ?1)",
                params![cycle_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(total.unwrap_or(0))
    }
}
