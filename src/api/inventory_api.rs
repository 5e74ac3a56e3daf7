// ==========================================
// Asset inventory - inventory lifecycle API
// ==========================================
// State machine per cycle: (none) -> in_progress -> finalized
// Every operation takes the cycle id explicitly; the "current cycle"
// selection lives in the application state.
// Writes into a finalized cycle are rejected.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::DataPaths;
use crate::domain::inventory::{
    CycleSummary, InventoryCycle, SupplierRecord, TransitRecord,
};
use crate::domain::types::{BoxType, CycleStatus, SUPPLIER_TYPES, SYSTEM_USER};
use crate::engine::box_type_normalizer::normalize;
use crate::engine::reconciliation::{
    missing_sectors, missing_stores, region_map, resolve_location, LocationKind,
};
use crate::importer::count_importer::{CountImporter, ImportRequest, ImportSource};
use crate::importer::field_mapper::coerce_quantity;
use crate::importer::importer_trait::ReferenceDataSource;
use crate::repository::{CountRepository, InventoryCycleRepository, MovementRepository};
use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

// ==========================================
// Response types
// ==========================================

/// Result of one of the three file imports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: ImportSource,
    pub status: bool,
    pub modified: bool,
    pub count: usize,
    pub message: String,
}

/// Combined result of `import_all`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    /// False when any of the three imports failed
    pub status: bool,
    /// True when at least one successful import wrote data
    pub modified: bool,
    /// Rows written by the imports that changed something
    pub count: usize,
    pub message: String,
    #[serde(rename = "resultados")]
    pub sources: Vec<SourceReport>,
}

/// Rows inserted by `fill_missing_from_reference`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    #[serde(rename = "lojas_criadas")]
    pub stores_created: usize,
    #[serde(rename = "setores_criados")]
    pub sectors_created: usize,
}

/// How much of the reference population already has rows in a cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceCoverage {
    #[serde(rename = "lojas_total")]
    pub stores_total: usize,
    #[serde(rename = "lojas_preenchidas")]
    pub stores_filled: usize,
    #[serde(rename = "lojas_ausentes")]
    pub stores_missing: usize,
    #[serde(rename = "setores_total")]
    pub sectors_total: usize,
    #[serde(rename = "setores_preenchidos")]
    pub sectors_filled: usize,
    #[serde(rename = "setores_ausentes")]
    pub sectors_missing: usize,
}

// ==========================================
// InventoryApi
// ==========================================
pub struct InventoryApi {
    cycle_repo: Arc<InventoryCycleRepository>,
    count_repo: Arc<CountRepository>,
    movement_repo: Arc<MovementRepository>,
    importer: Arc<CountImporter>,
    reference: Arc<dyn ReferenceDataSource>,
    paths: RwLock<DataPaths>,
}

impl InventoryApi {
    pub fn new(
        cycle_repo: Arc<InventoryCycleRepository>,
        count_repo: Arc<CountRepository>,
        movement_repo: Arc<MovementRepository>,
        importer: Arc<CountImporter>,
        reference: Arc<dyn ReferenceDataSource>,
        paths: DataPaths,
    ) -> Self {
        Self {
            cycle_repo,
            count_repo,
            movement_repo,
            importer,
            reference,
            paths: RwLock::new(paths),
        }
    }

    pub fn data_paths(&self) -> DataPaths {
        match self.paths.read() {
            Ok(paths) => paths.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Point the count imports at new files; modification tracking restarts
    pub fn set_data_paths(&self, paths: DataPaths) {
        match self.paths.write() {
            Ok(mut guard) => *guard = paths,
            Err(poisoned) => *poisoned.into_inner() = paths,
        }
        self.importer.clear_tracking();
    }

    // ==========================================
    // Guards
    // ==========================================

    fn require_cycle(&self, cycle_id: &str) -> ApiResult<InventoryCycle> {
        if cycle_id.trim().is_empty() {
            return Err(ApiError::NoActiveCycle);
        }
        self.cycle_repo
            .find_by_id(cycle_id)?
            .ok_or_else(|| ApiError::NotFound(format!("InventoryCycle(id={})", cycle_id)))
    }

    fn require_open(&self, cycle_id: &str) -> ApiResult<InventoryCycle> {
        let cycle = self.require_cycle(cycle_id)?;
        if cycle.is_finalized() {
            return Err(ApiError::InvalidStateTransition {
                from: CycleStatus::Finalized.as_str().to_string(),
                to: CycleStatus::InProgress.as_str().to_string(),
            });
        }
        Ok(cycle)
    }

    fn parse_quantity(raw: &str) -> ApiResult<i64> {
        if raw.trim().is_empty() {
            return Err(ApiError::ValidationError("quantity is required".to_string()));
        }
        coerce_quantity(raw).ok_or_else(|| {
            ApiError::ValidationError(format!("'{}' is not an integer quantity", raw.trim()))
        })
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    // ==========================================
    // Cycle lifecycle
    // ==========================================

    /// New in-progress cycle stamped with the current local time
    pub fn start_new(&self, description: &str) -> ApiResult<InventoryCycle> {
        self.start_new_at(Self::now(), description)
    }

    /// New cycle started at `started_at`
    ///
    /// Ids are second-resolution; a clash moves the start forward one second
    /// until the id is free.
    pub fn start_new_at(&self, started_at: NaiveDateTime, description: &str) -> ApiResult<InventoryCycle> {
        let mut cycle = InventoryCycle::start(started_at, description.trim());
        while self.cycle_repo.exists(&cycle.cycle_id)? {
            let next = cycle.started_at + Duration::seconds(1);
            cycle = InventoryCycle::start(next, description.trim());
        }
        self.cycle_repo.create(&cycle)?;
        info!(cycle_id = %cycle.cycle_id, "inventory cycle started");
        Ok(cycle)
    }

    /// The cycle when it exists
    pub fn load_existing(&self, cycle_id: &str) -> ApiResult<Option<InventoryCycle>> {
        if cycle_id.trim().is_empty() {
            return Ok(None);
        }
        Ok(self.cycle_repo.find_by_id(cycle_id)?)
    }

    /// in_progress -> finalized; a finalized cycle is left as it is
    ///
    /// # Returns
    /// - true when this call finalized the cycle
    pub fn finalize(&self, cycle_id: &str) -> ApiResult<bool> {
        self.finalize_at(cycle_id, Self::now())
    }

    pub fn finalize_at(&self, cycle_id: &str, ended_at: NaiveDateTime) -> ApiResult<bool> {
        if cycle_id.trim().is_empty() {
            return Err(ApiError::NoActiveCycle);
        }
        let changed = self.cycle_repo.finalize(cycle_id, ended_at)?;
        if changed {
            info!(cycle_id = %cycle_id, "inventory cycle finalized");
        } else {
            warn!(cycle_id = %cycle_id, "cycle already finalized, nothing changed");
        }
        Ok(changed)
    }

    pub fn list_cycles(&self) -> ApiResult<Vec<InventoryCycle>> {
        Ok(self.cycle_repo.list_all()?)
    }

    pub fn list_active_cycles(&self) -> ApiResult<Vec<InventoryCycle>> {
        Ok(self.cycle_repo.list_active()?)
    }

    pub fn cycle_summary(&self, cycle_id: &str) -> ApiResult<CycleSummary> {
        self.require_cycle(cycle_id)?;
        Ok(self.cycle_repo.cycle_summary(cycle_id)?)
    }

    // ==========================================
    // Imports
    // ==========================================

    /// Store counts, sector counts and transit, each independently
    ///
    /// Unchanged files are skipped unless `force`.
    pub fn import_all(&self, cycle_id: &str, user: &str, force: bool) -> ApiResult<ImportReport> {
        self.require_open(cycle_id)?;
        let paths = self.data_paths();
        let regions = region_map(&self.reference.read_stores(force));
        let user = if user.trim().is_empty() { SYSTEM_USER } else { user };
        let now = Self::now();

        let sources: Vec<SourceReport> = ImportSource::ALL
            .into_iter()
            .map(|source| {
                let path: &PathBuf = match source {
                    ImportSource::StoreCounts => &paths.store_counts,
                    ImportSource::SectorCounts => &paths.sector_counts,
                    ImportSource::Transit => &paths.transit,
                };
                let request = ImportRequest {
                    source,
                    path,
                    cycle_id,
                    user,
                    regions: &regions,
                    force,
                    now,
                };
                match self.importer.import_file(&request) {
                    Ok(outcome) => SourceReport {
                        source,
                        status: true,
                        modified: outcome.modified,
                        count: outcome.rows,
                        message: if outcome.modified {
                            format!("{} records imported", outcome.rows)
                        } else {
                            "file unchanged since last import".to_string()
                        },
                    },
                    Err(e) => {
                        warn!(source = source.as_str(), cycle_id = %cycle_id, error = %e, "import failed");
                        SourceReport {
                            source,
                            status: false,
                            modified: false,
                            count: 0,
                            message: e.to_string(),
                        }
                    }
                }
            })
            .collect();

        let status = sources.iter().all(|s| s.status);
        let modified = sources.iter().any(|s| s.status && s.modified);
        let count = sources
            .iter()
            .filter(|s| s.status && s.modified)
            .map(|s| s.count)
            .sum();

        let message = if !status {
            let errors: Vec<String> = sources
                .iter()
                .filter(|s| !s.status)
                .map(|s| format!("{}: {}", s.source.as_str(), s.message))
                .collect();
            format!("import errors: {}", errors.join(", "))
        } else if modified {
            format!("{} records updated", count)
        } else {
            "no update needed".to_string()
        };

        Ok(ImportReport {
            status,
            modified,
            count,
            message,
            sources,
        })
    }

    // ==========================================
    // Reference reconciliation
    // ==========================================

    /// Zero pending rows for reference stores/sectors with no row yet
    pub fn fill_missing_from_reference(&self, cycle_id: &str) -> ApiResult<FillReport> {
        self.require_open(cycle_id)?;
        let reference_stores = self.reference.read_stores(true);
        let reference_sectors = self.reference.read_sectors(true);
        if reference_stores.is_empty() && reference_sectors.is_empty() {
            warn!(cycle_id = %cycle_id, "no reference data, nothing to fill");
        }

        let now = Self::now();
        let mut report = FillReport::default();

        let existing_stores = self.count_repo.store_names(cycle_id)?;
        for store in missing_stores(&reference_stores, &existing_stores) {
            if self
                .count_repo
                .insert_missing_store(cycle_id, &store.name, &store.region, now)?
            {
                report.stores_created += 1;
            }
        }

        let existing_sectors = self.count_repo.sector_names(cycle_id)?;
        for sector in missing_sectors(&reference_sectors, &existing_sectors) {
            if self
                .count_repo
                .insert_missing_sector(cycle_id, &sector.name, now)?
            {
                report.sectors_created += 1;
            }
        }

        info!(
            cycle_id = %cycle_id,
            stores_created = report.stores_created,
            sectors_created = report.sectors_created,
            "missing reference rows created"
        );
        Ok(report)
    }

    pub fn reference_coverage(&self, cycle_id: &str) -> ApiResult<ReferenceCoverage> {
        self.require_cycle(cycle_id)?;
        let reference_stores = self.reference.read_stores(true);
        let reference_sectors = self.reference.read_sectors(true);
        let existing_stores = self.count_repo.store_names(cycle_id)?;
        let existing_sectors = self.count_repo.sector_names(cycle_id)?;

        Ok(ReferenceCoverage {
            stores_total: reference_stores.len(),
            stores_filled: existing_stores.len(),
            stores_missing: missing_stores(&reference_stores, &existing_stores).len(),
            sectors_total: reference_sectors.len(),
            sectors_filled: existing_sectors.len(),
            sectors_missing: missing_sectors(&reference_sectors, &existing_sectors).len(),
        })
    }

    // ==========================================
    // Manual entry
    // ==========================================

    /// Add `quantity` to one box type of a store or CD sector
    ///
    /// A location containing "CD " is a CD sector; anything else is a store
    /// whose region comes from the reference list.
    pub fn add_manual_count(
        &self,
        cycle_id: &str,
        location: &str,
        box_type_label: &str,
        quantity: i64,
        finalize: bool,
        user: &str,
    ) -> ApiResult<BoxType> {
        self.require_open(cycle_id)?;
        let location = location.trim();
        if location.is_empty() {
            return Err(ApiError::InvalidInput("location is required".to_string()));
        }
        let box_type = normalize(box_type_label);
        let user = if user.trim().is_empty() { SYSTEM_USER } else { user };
        let now = Self::now();

        match resolve_location(location) {
            LocationKind::CdSector => {
                self.count_repo
                    .add_sector_quantity(cycle_id, location, box_type, quantity, finalize, user, now)?;
            }
            LocationKind::Store => {
                let region = self
                    .reference
                    .read_stores(false)
                    .into_iter()
                    .find(|s| s.name == location)
                    .map(|s| s.region)
                    .unwrap_or_default();
                self.count_repo.add_store_quantity(
                    cycle_id, location, &region, box_type, quantity, finalize, user, now,
                )?;
            }
        }

        info!(
            cycle_id = %cycle_id,
            location,
            box_type = box_type.as_str(),
            quantity,
            finalize,
            "manual count added"
        );
        Ok(box_type)
    }

    /// Append a supplier record; the label is kept as typed and normalized on read
    pub fn add_supplier_data(
        &self,
        cycle_id: &str,
        supplier_type: &str,
        box_type_label: &str,
        quantity: &str,
    ) -> ApiResult<(SupplierRecord, BoxType)> {
        self.require_open(cycle_id)?;
        let supplier_type = supplier_type.trim();
        if supplier_type.is_empty() {
            return Err(ApiError::InvalidInput("supplier type is required".to_string()));
        }
        let quantity = Self::parse_quantity(quantity)?;
        let box_type = normalize(box_type_label);

        let mut record = SupplierRecord {
            id: None,
            cycle_id: cycle_id.to_string(),
            supplier_type: supplier_type.to_string(),
            box_type_raw: box_type_label.trim().to_string(),
            quantity,
            created_at: Self::now(),
        };
        record.id = Some(self.movement_repo.append_supplier(&record)?);
        info!(cycle_id = %cycle_id, supplier_type, box_type = box_type.as_str(), quantity, "supplier data added");
        Ok((record, box_type))
    }

    /// Append a transit record; `origin` should name SP, ES or RJ
    pub fn add_transit_data(
        &self,
        cycle_id: &str,
        origin: &str,
        box_type_label: &str,
        quantity: &str,
    ) -> ApiResult<(TransitRecord, BoxType)> {
        self.require_open(cycle_id)?;
        let origin = origin.trim();
        if origin.is_empty() {
            return Err(ApiError::InvalidInput("transit origin is required".to_string()));
        }
        let quantity = Self::parse_quantity(quantity)?;
        let box_type = normalize(box_type_label);
        let now = Self::now();

        let mut record = TransitRecord {
            id: None,
            cycle_id: cycle_id.to_string(),
            origin: origin.to_string(),
            box_type_raw: box_type_label.trim().to_string(),
            quantity,
            user_name: SYSTEM_USER.to_string(),
            created_at: now,
            updated_at: now,
        };
        record.id = Some(self.movement_repo.append_transit(&record)?);
        info!(cycle_id = %cycle_id, origin, box_type = box_type.as_str(), quantity, "transit data added");
        Ok((record, box_type))
    }

    // ==========================================
    // Catalogues
    // ==========================================

    pub fn box_types(&self) -> Vec<&'static str> {
        BoxType::ALL.iter().map(|t| t.as_str()).collect()
    }

    pub fn supplier_types(&self) -> Vec<&'static str> {
        SUPPLIER_TYPES.to_vec()
    }
}
