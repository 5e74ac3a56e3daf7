// ==========================================
// Asset inventory - application state
// ==========================================
// Shared connection, APIs and the session's "current cycle".
// Session operations answer with CommandResponse; the current cycle only
// changes when the operation succeeds.
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{ApiError, ApiResult, ImportReport, InventoryApi, ReportApi};
use crate::app::commands::CommandResponse;
use crate::config::{config_keys, ConfigManager, DataPaths};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::report::DashboardBundle;
use crate::importer::{
    create_default_templates, CountImporter, FileReferenceSource, ReferenceDataSource,
};
use crate::repository::{
    CountRepository, ImportBatchRepository, InventoryCycleRepository, MovementRepository,
};

const DEFAULT_HISTORY_LIMIT: usize = 10;

pub struct AppState {
    pub db_path: String,

    pub config: Arc<ConfigManager>,

    pub inventory_api: Arc<InventoryApi>,

    pub report_api: Arc<ReportApi>,

    pub import_batch_repo: Arc<ImportBatchRepository>,

    /// Set when reference data comes from files (paths follow configuration)
    file_reference: Option<Arc<FileReferenceSource>>,

    current_cycle: Mutex<Option<String>>,
}

impl AppState {
    /// State over a database file, reference data read from the configured files
    pub fn new(db_path: String) -> Result<Self, String> {
        let conn = Self::open(&db_path)?;
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| format!("cannot create ConfigManager: {}", e))?;
        let paths = config
            .data_paths()
            .map_err(|e| format!("cannot read data paths: {}", e))?;

        let reference = Arc::new(FileReferenceSource::new(
            paths.reference_stores.clone(),
            paths.reference_sectors.clone(),
        ));
        Self::build(db_path, conn, Arc::new(config), reference.clone(), Some(reference))
    }

    /// State with a caller-provided reference source
    pub fn with_reference(
        db_path: String,
        reference: Arc<dyn ReferenceDataSource>,
    ) -> Result<Self, String> {
        let conn = Self::open(&db_path)?;
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| format!("cannot create ConfigManager: {}", e))?;
        Self::build(db_path, conn, Arc::new(config), reference, None)
    }

    fn open(db_path: &str) -> Result<Arc<Mutex<Connection>>, String> {
        tracing::info!(db_path, "opening inventory database");
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| format!("cannot open database: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("cannot initialize schema: {}", e))?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    fn build(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        config: Arc<ConfigManager>,
        reference: Arc<dyn ReferenceDataSource>,
        file_reference: Option<Arc<FileReferenceSource>>,
    ) -> Result<Self, String> {
        let cycle_repo = Arc::new(InventoryCycleRepository::from_connection(conn.clone()));
        let count_repo = Arc::new(CountRepository::from_connection(conn.clone()));
        let movement_repo = Arc::new(MovementRepository::from_connection(conn.clone()));
        let import_batch_repo = Arc::new(ImportBatchRepository::from_connection(conn));

        let importer = Arc::new(CountImporter::new(
            count_repo.clone(),
            movement_repo.clone(),
            import_batch_repo.clone(),
        ));

        let paths = config
            .data_paths()
            .map_err(|e| format!("cannot read data paths: {}", e))?;
        let split_policy = config
            .transit_split_policy()
            .map_err(|e| format!("cannot read transit split weights: {}", e))?;

        let inventory_api = Arc::new(InventoryApi::new(
            cycle_repo.clone(),
            count_repo.clone(),
            movement_repo.clone(),
            importer,
            reference.clone(),
            paths,
        ));
        let report_api = Arc::new(ReportApi::new(
            cycle_repo.clone(),
            count_repo,
            movement_repo,
            reference,
            split_policy,
        ));

        // reopen the cycle the previous session was working on
        let current = match config.last_inventory() {
            Ok(Some(cycle_id)) => match cycle_repo.exists(&cycle_id) {
                Ok(true) => {
                    tracing::info!(cycle_id = %cycle_id, "restored last inventory cycle");
                    Some(cycle_id)
                }
                _ => None,
            },
            _ => None,
        };

        Ok(Self {
            db_path,
            config,
            inventory_api,
            report_api,
            import_batch_repo,
            file_reference,
            current_cycle: Mutex::new(current),
        })
    }

    // ==========================================
    // Current cycle
    // ==========================================

    pub fn current_cycle(&self) -> Option<String> {
        match self.current_cycle.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn require_current(&self) -> ApiResult<String> {
        self.current_cycle().ok_or(ApiError::NoActiveCycle)
    }

    fn set_current(&self, cycle_id: &str) {
        match self.current_cycle.lock() {
            Ok(mut guard) => *guard = Some(cycle_id.to_string()),
            Err(poisoned) => *poisoned.into_inner() = Some(cycle_id.to_string()),
        }
        if let Err(e) = self.config.set_last_inventory(cycle_id) {
            tracing::warn!(cycle_id, error = %e, "could not persist last inventory");
        }
    }

    // ==========================================
    // Lifecycle commands
    // ==========================================

    pub fn start_new_inventory(&self, description: &str) -> CommandResponse {
        match self.inventory_api.start_new(description) {
            Ok(cycle) => {
                self.set_current(&cycle.cycle_id);
                CommandResponse::ok(format!("inventory {} started", cycle.cycle_id), &cycle)
            }
            Err(e) => CommandResponse::from_error(e),
        }
    }

    pub fn load_inventory(&self, cycle_id: &str) -> CommandResponse {
        match self.inventory_api.load_existing(cycle_id) {
            Ok(Some(cycle)) => {
                self.set_current(&cycle.cycle_id);
                CommandResponse::ok(format!("inventory {} loaded", cycle.cycle_id), &cycle)
            }
            Ok(None) => CommandResponse::from_error(ApiError::NotFound(format!(
                "InventoryCycle(id={})",
                cycle_id
            ))),
            Err(e) => CommandResponse::from_error(e),
        }
    }

    pub fn finalize_current(&self) -> CommandResponse {
        let result = self
            .require_current()
            .and_then(|cycle_id| self.inventory_api.finalize(&cycle_id));
        CommandResponse::from_result(result, |changed| {
            if *changed {
                "inventory finalized".to_string()
            } else {
                "inventory was already finalized".to_string()
            }
        })
    }

    /// Import the three count files into the current cycle
    ///
    /// `force` re-reads files even when unchanged.
    pub fn import_data(&self, user: &str, force: bool) -> CommandResponse {
        match self.run_import(user, force) {
            Ok(report) => CommandResponse {
                status: report.status,
                message: report.message.clone(),
                code: if report.status {
                    None
                } else {
                    Some("IMPORT_ERROR".to_string())
                },
                data: serde_json::to_value(&report).ok(),
            },
            Err(e) => CommandResponse::from_error(e),
        }
    }

    /// Silent import used by the poller
    pub fn run_import(&self, user: &str, force: bool) -> ApiResult<ImportReport> {
        let cycle_id = self.require_current()?;
        self.inventory_api.import_all(&cycle_id, user, force)
    }

    pub fn fill_missing(&self) -> CommandResponse {
        let result = self
            .require_current()
            .and_then(|cycle_id| self.inventory_api.fill_missing_from_reference(&cycle_id));
        CommandResponse::from_result(result, |r| {
            format!("{} stores and {} sectors created", r.stores_created, r.sectors_created)
        })
    }

    pub fn add_manual_count(
        &self,
        location: &str,
        box_type: &str,
        quantity: i64,
        finalize: bool,
        user: &str,
    ) -> CommandResponse {
        let result = self.require_current().and_then(|cycle_id| {
            self.inventory_api
                .add_manual_count(&cycle_id, location, box_type, quantity, finalize, user)
        });
        CommandResponse::from_result(result, |t| {
            format!("count of {} updated for {}", t.as_str(), location.trim())
        })
    }

    pub fn add_supplier_data(&self, supplier_type: &str, box_type: &str, quantity: &str) -> CommandResponse {
        let result = self.require_current().and_then(|cycle_id| {
            self.inventory_api
                .add_supplier_data(&cycle_id, supplier_type, box_type, quantity)
        });
        match result {
            Ok((record, box_type)) => CommandResponse::ok(
                format!("{} data added as {}", record.supplier_type, box_type.as_str()),
                &record,
            ),
            Err(e) => CommandResponse::from_error(e),
        }
    }

    pub fn add_transit_data(&self, origin: &str, box_type: &str, quantity: &str) -> CommandResponse {
        let result = self.require_current().and_then(|cycle_id| {
            self.inventory_api
                .add_transit_data(&cycle_id, origin, box_type, quantity)
        });
        match result {
            Ok((record, box_type)) => CommandResponse::ok(
                format!("{} data added as {}", record.origin, box_type.as_str()),
                &record,
            ),
            Err(e) => CommandResponse::from_error(e),
        }
    }

    // ==========================================
    // Query commands
    // ==========================================

    pub fn list_cycles(&self) -> CommandResponse {
        CommandResponse::from_result(self.inventory_api.list_cycles(), |c| {
            format!("{} cycles", c.len())
        })
    }

    pub fn list_active_cycles(&self) -> CommandResponse {
        CommandResponse::from_result(self.inventory_api.list_active_cycles(), |c| {
            format!("{} active cycles", c.len())
        })
    }

    pub fn current_summary(&self) -> CommandResponse {
        let result = self
            .require_current()
            .and_then(|cycle_id| self.inventory_api.cycle_summary(&cycle_id));
        CommandResponse::from_result(result, |s| format!("summary of {}", s.cycle_id))
    }

    pub fn reference_coverage(&self) -> CommandResponse {
        let result = self
            .require_current()
            .and_then(|cycle_id| self.inventory_api.reference_coverage(&cycle_id));
        CommandResponse::from_result(result, |c| {
            format!("{} stores and {} sectors missing", c.stores_missing, c.sectors_missing)
        })
    }

    pub fn import_batches(&self) -> CommandResponse {
        let result = self.require_current().and_then(|cycle_id| {
            self.import_batch_repo
                .list_by_cycle(&cycle_id)
                .map_err(ApiError::from)
        });
        CommandResponse::from_result(result, |b| format!("{} import runs", b.len()))
    }

    /// Dashboard of the current cycle; an empty bundle when none is selected
    pub fn dashboard(&self) -> DashboardBundle {
        match self.current_cycle() {
            Some(cycle_id) => self.report_api.dashboard_bundle(&cycle_id),
            None => DashboardBundle::empty(""),
        }
    }

    pub fn history(&self, limit: Option<usize>) -> CommandResponse {
        let history = self
            .report_api
            .history_summaries(limit.unwrap_or(DEFAULT_HISTORY_LIMIT));
        CommandResponse::ok(format!("{} finalized cycles", history.len()), &history)
    }

    pub fn compare(&self, current: &str, previous: &str) -> CommandResponse {
        let bundle = self.report_api.compare(current, previous);
        CommandResponse::ok(format!("{} vs {}", current, previous), &bundle)
    }

    // ==========================================
    // Configuration commands
    // ==========================================

    /// Store new file locations and point the readers at them
    pub fn configure_paths(&self, paths: DataPaths) -> CommandResponse {
        if let Err(e) = self.config.set_data_paths(&paths) {
            return CommandResponse::from_error(ApiError::DatabaseError(e.to_string()));
        }
        if let Some(reference) = &self.file_reference {
            reference.set_paths(
                Some(paths.reference_stores.clone()),
                Some(paths.reference_sectors.clone()),
            );
        }
        self.inventory_api.set_data_paths(paths);
        CommandResponse::ok_message("file paths configured")
    }

    /// Write templates for any missing reference/count file
    pub fn create_default_templates(&self) -> CommandResponse {
        let paths = self.inventory_api.data_paths();
        match create_default_templates(&paths) {
            Ok(created) => {
                let names: Vec<String> = created.iter().map(|p| p.display().to_string()).collect();
                CommandResponse::ok(format!("{} files created", names.len()), &names)
            }
            Err(e) => CommandResponse::from_error(e.into()),
        }
    }

    /// Update one configuration key; totals pick up new split weights at once
    pub fn update_config(&self, key: &str, value: &str) -> CommandResponse {
        if let Err(e) = self.config.set(key, value) {
            return CommandResponse::from_error(ApiError::DatabaseError(e.to_string()));
        }
        if key == config_keys::TRANSIT_SPLIT_WEIGHTS {
            match self.config.transit_split_policy() {
                Ok(policy) => self.report_api.set_split_policy(policy),
                Err(e) => return CommandResponse::from_error(ApiError::DatabaseError(e.to_string())),
            }
        }
        CommandResponse::ok_message(format!("{} updated", key))
    }
}

/// Database location
///
/// `ASSET_INVENTORY_DB_PATH` when set, else the user data directory,
/// else `./inventario.db`.
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("ASSET_INVENTORY_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./inventario.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("asset-inventory");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("inventario.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}
