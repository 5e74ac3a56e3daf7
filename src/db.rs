// ==========================================
// Asset inventory - SQLite connection setup
// ==========================================
// Goals:
// - every Connection::open goes through the same PRAGMA setup
// - one busy_timeout for all writers (the poller and the session share the file)
// - one idempotent schema bootstrap
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// Default busy_timeout (ms)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version written by `ensure_schema`
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply the per-connection PRAGMAs
///
/// foreign_keys and busy_timeout are both per-connection settings.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a connection and apply the shared configuration
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Read schema_version (None when the table does not exist)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Create every table the crate uses (idempotent)
///
/// Count tables carry one column per canonical box type; the column names
/// match `BoxType::column()`.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS inventory_meta (
            cycle_id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            status TEXT NOT NULL DEFAULT 'in_progress',
            description TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS store_count (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cycle_id TEXT NOT NULL REFERENCES inventory_meta(cycle_id),
            store_name TEXT NOT NULL,
            region TEXT NOT NULL DEFAULT '',
            sector_label TEXT NOT NULL DEFAULT 'General',
            caixa_hb_623 INTEGER NOT NULL DEFAULT 0,
            caixa_hb_618 INTEGER NOT NULL DEFAULT 0,
            caixa_hnt_g INTEGER NOT NULL DEFAULT 0,
            caixa_hnt_p INTEGER NOT NULL DEFAULT 0,
            caixa_chocolate INTEGER NOT NULL DEFAULT 0,
            caixa_bin INTEGER NOT NULL DEFAULT 0,
            pallets_pbr INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'pending',
            user_name TEXT NOT NULL DEFAULT 'sistema',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(cycle_id, store_name)
        );

        CREATE TABLE IF NOT EXISTS sector_count (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cycle_id TEXT NOT NULL REFERENCES inventory_meta(cycle_id),
            sector_name TEXT NOT NULL,
            caixa_hb_623 INTEGER NOT NULL DEFAULT 0,
            caixa_hb_618 INTEGER NOT NULL DEFAULT 0,
            caixa_hnt_g INTEGER NOT NULL DEFAULT 0,
            caixa_hnt_p INTEGER NOT NULL DEFAULT 0,
            caixa_chocolate INTEGER NOT NULL DEFAULT 0,
            caixa_bin INTEGER NOT NULL DEFAULT 0,
            pallets_pbr INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'pending',
            user_name TEXT NOT NULL DEFAULT 'sistema',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(cycle_id, sector_name)
        );

        CREATE TABLE IF NOT EXISTS transit_record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cycle_id TEXT NOT NULL REFERENCES inventory_meta(cycle_id),
            origin TEXT NOT NULL,
            box_type_raw TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0,
            user_name TEXT NOT NULL DEFAULT 'sistema',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS supplier_record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cycle_id TEXT NOT NULL REFERENCES inventory_meta(cycle_id),
            supplier_type TEXT NOT NULL,
            box_type_raw TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            cycle_id TEXT NOT NULL REFERENCES inventory_meta(cycle_id),
            source TEXT NOT NULL,
            file_path TEXT NOT NULL,
            row_count INTEGER NOT NULL DEFAULT 0,
            imported_by TEXT NOT NULL,
            imported_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transit_cycle ON transit_record(cycle_id);
        CREATE INDEX IF NOT EXISTS idx_supplier_cycle ON supplier_record(cycle_id);
        CREATE INDEX IF NOT EXISTS idx_import_batch_cycle ON import_batch(cycle_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
