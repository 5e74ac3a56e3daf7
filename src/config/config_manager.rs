// ==========================================
// Asset inventory - configuration manager
// ==========================================
// Storage: config_kv table (key-value, scope 'global')
// Every getter has a default; a missing key is never an error.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::totals::TransitSplitPolicy;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Locations of the reference and count files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub reference_stores: PathBuf,
    pub reference_sectors: PathBuf,
    pub store_counts: PathBuf,
    pub sector_counts: PathBuf,
    pub transit: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::under("data")
    }
}

impl DataPaths {
    /// Default file names under one directory
    pub fn under(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            reference_stores: dir.join("lojas.csv"),
            reference_sectors: dir.join("setores.csv"),
            store_counts: dir.join("contagem_lojas.csv"),
            sector_counts: dir.join("contagem_cd.csv"),
            transit: dir.join("dados_transito.csv"),
        }
    }
}

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Shares an existing connection (pragmas re-applied, idempotent)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("lock failed: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// Raw value of a global key
    pub fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Upsert a global key
    pub fn set(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::debug!(config_key = key, "config updated");
        Ok(())
    }

    pub fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// All global keys as a JSON object string
    pub fn snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== Typed getters =====

    fn path_or_default(&self, key: &str, default: PathBuf) -> Result<PathBuf, Box<dyn Error>> {
        Ok(match self.get(key)? {
            Some(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
            _ => default,
        })
    }

    pub fn data_paths(&self) -> Result<DataPaths, Box<dyn Error>> {
        let defaults = DataPaths::default();
        Ok(DataPaths {
            reference_stores: self
                .path_or_default(config_keys::REFERENCE_STORES_PATH, defaults.reference_stores)?,
            reference_sectors: self
                .path_or_default(config_keys::REFERENCE_SECTORS_PATH, defaults.reference_sectors)?,
            store_counts: self.path_or_default(config_keys::STORE_COUNTS_PATH, defaults.store_counts)?,
            sector_counts: self.path_or_default(config_keys::SECTOR_COUNTS_PATH, defaults.sector_counts)?,
            transit: self.path_or_default(config_keys::TRANSIT_PATH, defaults.transit)?,
        })
    }

    pub fn set_data_paths(&self, paths: &DataPaths) -> Result<(), Box<dyn Error>> {
        let entries = [
            (config_keys::REFERENCE_STORES_PATH, &paths.reference_stores),
            (config_keys::REFERENCE_SECTORS_PATH, &paths.reference_sectors),
            (config_keys::STORE_COUNTS_PATH, &paths.store_counts),
            (config_keys::SECTOR_COUNTS_PATH, &paths.sector_counts),
            (config_keys::TRANSIT_PATH, &paths.transit),
        ];
        for (key, path) in entries {
            self.set(key, &path.to_string_lossy())?;
        }
        Ok(())
    }

    /// Cycle that was open when the application last ran
    pub fn last_inventory(&self) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self
            .get(config_keys::LAST_INVENTORY)?
            .filter(|v| !v.trim().is_empty()))
    }

    pub fn set_last_inventory(&self, cycle_id: &str) -> Result<(), Box<dyn Error>> {
        self.set(config_keys::LAST_INVENTORY, cycle_id)
    }

    pub fn default_export_path(&self) -> Result<PathBuf, Box<dyn Error>> {
        self.path_or_default(config_keys::DEFAULT_EXPORT_PATH, PathBuf::from("relatorios/"))
    }

    /// Weights for transit with no CD in its origin (JSON {"sp","es","rj"})
    pub fn transit_split_policy(&self) -> Result<TransitSplitPolicy, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::TRANSIT_SPLIT_WEIGHTS, "")?;
        if value.trim().is_empty() {
            return Ok(TransitSplitPolicy::default());
        }
        let policy = serde_json::from_str::<TransitSplitPolicy>(&value).unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::TRANSIT_SPLIT_WEIGHTS,
                raw_value = %value,
                "malformed transit split weights, using even split"
            );
            TransitSplitPolicy::default()
        });
        Ok(policy)
    }

    pub fn poll_interval(&self) -> Result<Duration, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::POLL_INTERVAL_SECS, "30")?;
        let secs = value.trim().parse::<u64>().ok().filter(|s| *s > 0).unwrap_or(30);
        Ok(Duration::from_secs(secs))
    }
}

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    // Reference data
    pub const REFERENCE_STORES_PATH: &str = "reference_stores_path";
    pub const REFERENCE_SECTORS_PATH: &str = "reference_sectors_path";

    // Count files
    pub const STORE_COUNTS_PATH: &str = "store_counts_path";
    pub const SECTOR_COUNTS_PATH: &str = "sector_counts_path";
    pub const TRANSIT_PATH: &str = "transit_path";

    // Session
    pub const LAST_INVENTORY: &str = "last_inventory";
    pub const DEFAULT_EXPORT_PATH: &str = "default_export_path";

    // Totals
    pub const TRANSIT_SPLIT_WEIGHTS: &str = "transit_split_weights"; // JSON

    // Auto import
    pub const POLL_INTERVAL_SECS: &str = "poll_interval_secs";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = manager();
        assert_eq!(config.data_paths().unwrap(), DataPaths::default());
        assert_eq!(config.last_inventory().unwrap(), None);
        assert_eq!(config.transit_split_policy().unwrap(), TransitSplitPolicy::default());
        assert_eq!(config.poll_interval().unwrap(), Duration::from_secs(30));
        assert_eq!(config.default_export_path().unwrap(), PathBuf::from("relatorios/"));
    }

    #[test]
    fn test_set_overwrites_and_snapshot_lists_keys() {
        let config = manager();
        config.set_last_inventory("INV-1").unwrap();
        config.set_last_inventory("INV-2").unwrap();
        config.set(config_keys::POLL_INTERVAL_SECS, "5").unwrap();

        assert_eq!(config.last_inventory().unwrap().as_deref(), Some("INV-2"));
        assert_eq!(config.poll_interval().unwrap(), Duration::from_secs(5));

        let snapshot: HashMap<String, String> =
            serde_json::from_str(&config.snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["last_inventory"], "INV-2");
    }

    #[test]
    fn test_split_weights_parse_and_fallback() {
        let config = manager();
        config
            .set(config_keys::TRANSIT_SPLIT_WEIGHTS, r#"{"sp":2,"es":1,"rj":1}"#)
            .unwrap();
        assert_eq!(config.transit_split_policy().unwrap().sp, 2.0);

        config.set(config_keys::TRANSIT_SPLIT_WEIGHTS, "half").unwrap();
        assert_eq!(config.transit_split_policy().unwrap(), TransitSplitPolicy::default());

        config.set(config_keys::POLL_INTERVAL_SECS, "0").unwrap();
        assert_eq!(config.poll_interval().unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_data_paths_round_trip_through_config() {
        let config = manager();
        let paths = DataPaths::under("/srv/inventario");
        config.set_data_paths(&paths).unwrap();
        assert_eq!(config.data_paths().unwrap(), paths);
    }
}
