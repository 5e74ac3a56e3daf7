// ==========================================
// Asset inventory - cycle metadata repository
// ==========================================
// Table: inventory_meta
// No business rules here beyond the status guard on finalize
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::inventory::{CycleSummary, InventoryCycle, TIMESTAMP_FORMAT};
use crate::domain::types::CycleStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::FINALIZED_SQL;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

type CycleRow = (String, NaiveDateTime, Option<NaiveDateTime>, String, String);

const SELECT_CYCLE: &str =
    "SELECT cycle_id, started_at, ended_at, status, description FROM inventory_meta";

fn read_cycle_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CycleRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_cycle(raw: CycleRow) -> RepositoryResult<InventoryCycle> {
    let (cycle_id, started_at, ended_at, status, description) = raw;
    let status = CycleStatus::parse(&status).ok_or_else(|| RepositoryError::FieldValueError {
        field: "inventory_meta.status".to_string(),
        message: format!("unknown cycle status '{}' on {}", status, cycle_id),
    })?;
    Ok(InventoryCycle {
        cycle_id,
        started_at,
        ended_at,
        status,
        description,
    })
}

// ==========================================
// InventoryCycleRepository
// ==========================================
pub struct InventoryCycleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryCycleRepository {
    /// Open a repository on its own connection
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert a new cycle
    ///
    /// # Errors
    /// - UniqueConstraintViolation when the id already exists
    pub fn create(&self, cycle: &InventoryCycle) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO inventory_meta (cycle_id, started_at, ended_at, status, description)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                cycle.cycle_id,
                cycle.started_at.format(TIMESTAMP_FORMAT).to_string(),
                cycle
                    .ended_at
                    .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                cycle.status.as_str(),
                cycle.description,
            ],
        )?;
        Ok(())
    }

    pub fn exists(&self, cycle_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM inventory_meta WHERE cycle_id = ?1",
                params![cycle_id],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    pub fn find_by_id(&self, cycle_id: &str) -> RepositoryResult<Option<InventoryCycle>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                &format!("{} WHERE cycle_id = ?1", SELECT_CYCLE),
                params![cycle_id],
                read_cycle_row,
            )
            .optional()?;
        raw.map(into_cycle).transpose()
    }

    fn query_cycles(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<InventoryCycle>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, read_cycle_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(into_cycle).collect()
    }

    /// Every cycle, newest first
    pub fn list_all(&self) -> RepositoryResult<Vec<InventoryCycle>> {
        self.query_cycles(
            &format!("{} ORDER BY started_at DESC, cycle_id DESC", SELECT_CYCLE),
            &[],
        )
    }

    /// Cycles still in progress, newest first
    pub fn list_active(&self) -> RepositoryResult<Vec<InventoryCycle>> {
        self.query_cycles(
            &format!(
                "{} WHERE status IN ('in_progress', 'em_andamento') ORDER BY started_at DESC, cycle_id DESC",
                SELECT_CYCLE
            ),
            &[],
        )
    }

    /// Finalized cycles, most recently ended first
    pub fn list_finalized(&self, limit: usize) -> RepositoryResult<Vec<InventoryCycle>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query_cycles(
            &format!(
                "{} WHERE status IN {} ORDER BY ended_at DESC, cycle_id DESC LIMIT ?1",
                SELECT_CYCLE, FINALIZED_SQL
            ),
            &[&limit],
        )
    }

    /// in_progress -> finalized, stamping `ended_at`
    ///
    /// # Returns
    /// - Ok(true): the cycle moved to finalized
    /// - Ok(false): it was already finalized (nothing written)
    /// - Err(NotFound): unknown cycle
    pub fn finalize(&self, cycle_id: &str, ended_at: NaiveDateTime) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE inventory_meta
            SET status = ?1, ended_at = ?2
            WHERE cycle_id = ?3 AND status IN ('in_progress', 'em_andamento')
            "#,
            params![
                CycleStatus::Finalized.as_str(),
                ended_at.format(TIMESTAMP_FORMAT).to_string(),
                cycle_id
            ],
        )?;
        if changed > 0 {
            return Ok(true);
        }

        let found = conn
            .query_row(
                "SELECT 1 FROM inventory_meta WHERE cycle_id = ?1",
                params![cycle_id],
                |_row| Ok(true),
            )
            .optional()?;
        match found {
            Some(_) => Ok(false),
            None => Err(RepositoryError::NotFound {
                entity: "InventoryCycle".to_string(),
                id: cycle_id.to_string(),
            }),
        }
    }

    /// Row counts across the four fact tables
    pub fn cycle_summary(&self, cycle_id: &str) -> RepositoryResult<CycleSummary> {
        let conn = self.get_conn()?;
        let tally = |table: &str| -> rusqlite::Result<(i64, i64)> {
            conn.query_row(
                &format!(
                    "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status IN {} THEN 1 ELSE 0 END), 0)
                     FROM {} WHERE cycle_id = ?1",
                    FINALIZED_SQL, table
                ),
                params![cycle_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
        };
        let (store_rows, stores_finalized) = tally("store_count")?;
        let (sector_rows, sectors_finalized) = tally("sector_count")?;
        let transit_rows: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transit_record WHERE cycle_id = ?1",
            params![cycle_id],
            |row| row.get(0),
        )?;
        let supplier_rows: i64 = conn.query_row(
            "SELECT COUNT(*) FROM supplier_record WHERE cycle_id = ?1",
            params![cycle_id],
            |row| row.get(0),
        )?;

        Ok(CycleSummary {
            cycle_id: cycle_id.to_string(),
            store_rows,
            stores_finalized,
            sector_rows,
            sectors_finalized,
            transit_rows,
            supplier_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use chrono::NaiveDate;

    fn repo() -> InventoryCycleRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        InventoryCycleRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 4, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_create_and_find() {
        let repo = repo();
        let cycle = InventoryCycle::start(at(8, 0), "April");
        repo.create(&cycle).unwrap();

        assert!(repo.exists(&cycle.cycle_id).unwrap());
        assert_eq!(repo.find_by_id(&cycle.cycle_id).unwrap(), Some(cycle.clone()));
        assert!(repo.find_by_id("INV-missing").unwrap().is_none());

        let dup = repo.create(&cycle);
        assert!(matches!(dup, Err(RepositoryError::UniqueConstraintViolation(_))));
    }

    #[test]
    fn test_finalize_only_once() {
        let repo = repo();
        let cycle = InventoryCycle::start(at(8, 0), "");
        repo.create(&cycle).unwrap();

        assert!(repo.finalize(&cycle.cycle_id, at(18, 0)).unwrap());
        assert!(!repo.finalize(&cycle.cycle_id, at(19, 0)).unwrap());

        let stored = repo.find_by_id(&cycle.cycle_id).unwrap().unwrap();
        assert_eq!(stored.status, CycleStatus::Finalized);
        assert_eq!(stored.ended_at, Some(at(18, 0)));

        assert!(matches!(
            repo.finalize("INV-none", at(19, 0)),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_listing_order_and_filters() {
        let repo = repo();
        let first = InventoryCycle::start(at(8, 0), "first");
        let second = InventoryCycle::start(at(9, 0), "second");
        let third = InventoryCycle::start(at(10, 0), "third");
        for c in [&first, &second, &third] {
            repo.create(c).unwrap();
        }
        repo.finalize(&second.cycle_id, at(11, 0)).unwrap();
        repo.finalize(&first.cycle_id, at(12, 0)).unwrap();

        let all: Vec<String> = repo.list_all().unwrap().into_iter().map(|c| c.cycle_id).collect();
        assert_eq!(all, vec![third.cycle_id.clone(), second.cycle_id.clone(), first.cycle_id.clone()]);

        let active = repo.list_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].cycle_id, third.cycle_id);

        let finalized = repo.list_finalized(1).unwrap();
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0].cycle_id, first.cycle_id);
    }

    #[test]
    fn test_summary_counts_legacy_finalized_rows() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let repo = InventoryCycleRepository::from_connection(conn.clone());
        let cycle = InventoryCycle::start(at(8, 0), "legacy");
        repo.create(&cycle).unwrap();

        {
            let guard = conn.lock().unwrap();
            for (store, status) in [("Loja 1", "finalizado"), ("Loja 2", "finalized"), ("Loja 3", "pending")] {
                guard
                    .execute(
                        "INSERT INTO store_count (cycle_id, store_name, status, created_at, updated_at)
                         VALUES (?1, ?2, ?3, '2026-04-02 08:00:00', '2026-04-02 08:00:00')",
                        params![cycle.cycle_id, store, status],
                    )
                    .unwrap();
            }
            guard
                .execute(
                    "INSERT INTO sector_count (cycle_id, sector_name, status, created_at, updated_at)
                     VALUES (?1, 'Setor A', 'finalizado', '2026-04-02 08:00:00', '2026-04-02 08:00:00')",
                    params![cycle.cycle_id],
                )
                .unwrap();
        }

        let summary = repo.cycle_summary(&cycle.cycle_id).unwrap();
        assert_eq!(summary.store_rows, 3);
        assert_eq!(summary.stores_finalized, 2);
        assert_eq!(summary.sector_rows, 1);
        assert_eq!(summary.sectors_finalized, 1);
    }
}
