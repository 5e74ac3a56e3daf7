// ==========================================
// Asset inventory - report API
// ==========================================
// Read-only rollups for dashboards and finalization reports.
// Never fails: a missing cycle or a storage error yields a zeroed bundle
// (logged), so a dashboard can always render.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::inventory::InventoryCycle;
use crate::domain::report::{
    ComparisonBundle, CycleMeta, DashboardBundle, DashboardDetails, HistorySummary, StatusBundle,
    TotalsBundle,
};
use crate::engine::comparison::ComparisonEngine;
use crate::engine::status::{StatusEngine, StatusInput, StoreUniverse};
use crate::engine::totals::{TotalsEngine, TotalsInput, TransitSplitPolicy};
use crate::importer::importer_trait::ReferenceDataSource;
use crate::repository::{CountRepository, InventoryCycleRepository, MovementRepository};
use chrono::NaiveDateTime;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

const META_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";
const HISTORY_DATE_FORMAT: &str = "%d/%m/%Y";

/// "<d> days, <h>h <m>m"
pub fn format_duration(started_at: NaiveDateTime, ended_at: NaiveDateTime) -> String {
    let elapsed = ended_at - started_at;
    let days = elapsed.num_days();
    let rest = elapsed.num_seconds() - days * 86_400;
    format!("{} days, {}h {}m", days, rest / 3600, (rest % 3600) / 60)
}

// ==========================================
// ReportApi
// ==========================================
pub struct ReportApi {
    cycle_repo: Arc<InventoryCycleRepository>,
    count_repo: Arc<CountRepository>,
    movement_repo: Arc<MovementRepository>,
    reference: Arc<dyn ReferenceDataSource>,
    totals_engine: RwLock<TotalsEngine>,
    status_engine: StatusEngine,
    comparison_engine: ComparisonEngine,
}

impl ReportApi {
    pub fn new(
        cycle_repo: Arc<InventoryCycleRepository>,
        count_repo: Arc<CountRepository>,
        movement_repo: Arc<MovementRepository>,
        reference: Arc<dyn ReferenceDataSource>,
        split_policy: TransitSplitPolicy,
    ) -> Self {
        Self {
            cycle_repo,
            count_repo,
            movement_repo,
            reference,
            totals_engine: RwLock::new(TotalsEngine::new(split_policy)),
            status_engine: StatusEngine::new(),
            comparison_engine: ComparisonEngine::new(),
        }
    }

    pub fn set_split_policy(&self, policy: TransitSplitPolicy) {
        match self.totals_engine.write() {
            Ok(mut engine) => *engine = TotalsEngine::new(policy),
            Err(poisoned) => *poisoned.into_inner() = TotalsEngine::new(policy),
        }
    }

    pub fn split_policy(&self) -> TransitSplitPolicy {
        match self.totals_engine.read() {
            Ok(engine) => engine.split_policy(),
            Err(poisoned) => poisoned.into_inner().split_policy(),
        }
    }

    // ==========================================
    // Totals
    // ==========================================

    /// 8 origin buckets x 7 box types for one cycle
    pub fn compute_totals(&self, cycle_id: &str) -> TotalsBundle {
        if cycle_id.trim().is_empty() {
            warn!("totals requested without a cycle id");
            return TotalsBundle::empty(cycle_id);
        }
        self.try_compute_totals(cycle_id).unwrap_or_else(|e| {
            warn!(cycle_id = %cycle_id, error = %e, "totals unavailable, returning zeroes");
            TotalsBundle::empty(cycle_id)
        })
    }

    fn try_compute_totals(&self, cycle_id: &str) -> ApiResult<TotalsBundle> {
        let store_rows = self.count_repo.list_store_counts(cycle_id)?;
        let sector_rows = self.count_repo.list_sector_counts(cycle_id)?;
        let transit = self.movement_repo.grouped_transit(cycle_id)?;
        let supplier = self.movement_repo.grouped_supplier(cycle_id)?;

        let input = TotalsInput {
            store_rows: &store_rows,
            sector_rows: &sector_rows,
            transit: &transit,
            supplier: &supplier,
        };
        let engine = self
            .totals_engine
            .read()
            .map_err(|e| ApiError::InternalError(format!("totals engine lock poisoned: {}", e)))?;
        Ok(engine.compute(cycle_id, &input))
    }

    // ==========================================
    // Status
    // ==========================================

    /// Completion per region and pending CD sectors
    pub fn compute_status(&self, cycle_id: &str) -> StatusBundle {
        if cycle_id.trim().is_empty() {
            warn!("status requested without a cycle id");
            return StatusBundle::empty(cycle_id);
        }
        self.try_compute_status(cycle_id).unwrap_or_else(|e| {
            warn!(cycle_id = %cycle_id, error = %e, "status unavailable, returning zeroes");
            StatusBundle::empty(cycle_id)
        })
    }

    fn try_compute_status(&self, cycle_id: &str) -> ApiResult<StatusBundle> {
        if !self.cycle_repo.exists(cycle_id)? {
            warn!(cycle_id = %cycle_id, "status requested for unknown cycle");
            return Ok(StatusBundle::empty(cycle_id));
        }
        let reference_stores = self.reference.read_stores(false);
        let reference_sectors = self.reference.read_sectors(false);
        let store_rows = self.count_repo.list_store_counts(cycle_id)?;
        let sector_rows = self.count_repo.list_sector_counts(cycle_id)?;

        if reference_sectors.is_empty() {
            warn!(cycle_id = %cycle_id, "reference sectors unavailable, using persisted rows");
        }

        let bundle = if reference_stores.is_empty() {
            warn!(cycle_id = %cycle_id, "reference stores unavailable, using persisted rows");
            let tallies = self.count_repo.stores_by_region(cycle_id)?;
            let pending = self.count_repo.pending_stores_by_region(cycle_id)?;
            self.status_engine.compute(
                cycle_id,
                &StatusInput {
                    stores: StoreUniverse::Persisted {
                        tallies: &tallies,
                        pending: &pending,
                    },
                    reference_sectors: &reference_sectors,
                    store_rows: &store_rows,
                    sector_rows: &sector_rows,
                },
            )
        } else {
            self.status_engine.compute(
                cycle_id,
                &StatusInput {
                    stores: StoreUniverse::Reference(&reference_stores),
                    reference_sectors: &reference_sectors,
                    store_rows: &store_rows,
                    sector_rows: &sector_rows,
                },
            )
        };
        Ok(bundle)
    }

    // ==========================================
    // Comparison / history
    // ==========================================

    /// `current - previous` for every type and bucket
    pub fn compare(&self, current: &str, previous: &str) -> ComparisonBundle {
        let current_totals = self.compute_totals(current);
        let previous_totals = self.compute_totals(previous);
        self.comparison_engine.compare(current_totals, previous_totals)
    }

    /// Finalized cycles, most recently ended first
    pub fn history_summaries(&self, limit: usize) -> Vec<HistorySummary> {
        let cycles = match self.cycle_repo.list_finalized(limit) {
            Ok(cycles) => cycles,
            Err(e) => {
                warn!(error = %e, "history unavailable");
                return Vec::new();
            }
        };

        cycles
            .into_iter()
            .map(|cycle| {
                let (total_stores, total_sectors) = match self.cycle_repo.cycle_summary(&cycle.cycle_id) {
                    Ok(summary) => (summary.store_rows, summary.sector_rows),
                    Err(e) => {
                        warn!(cycle_id = %cycle.cycle_id, error = %e, "cycle summary unavailable");
                        (0, 0)
                    }
                };
                HistorySummary {
                    grand_total: self.compute_totals(&cycle.cycle_id).grand_total(),
                    started_at: cycle.started_at.format(HISTORY_DATE_FORMAT).to_string(),
                    ended_at: cycle
                        .ended_at
                        .map(|t| t.format(HISTORY_DATE_FORMAT).to_string()),
                    cycle_id: cycle.cycle_id,
                    total_stores,
                    total_sectors,
                }
            })
            .collect()
    }

    // ==========================================
    // Dashboard
    // ==========================================

    /// Most recent finalized cycle that started before `current` (never itself)
    pub fn previous_finalized(&self, current: &InventoryCycle) -> ApiResult<Option<InventoryCycle>> {
        let previous = self
            .cycle_repo
            .list_finalized(usize::MAX)?
            .into_iter()
            .find(|c| c.cycle_id != current.cycle_id && c.started_at < current.started_at);
        Ok(previous)
    }

    /// Meta, totals, status, comparison with the previous finalized cycle, raw rows
    pub fn dashboard_bundle(&self, cycle_id: &str) -> DashboardBundle {
        if cycle_id.trim().is_empty() {
            warn!("dashboard requested without a cycle id");
            return DashboardBundle::empty(cycle_id);
        }
        self.try_dashboard_bundle(cycle_id).unwrap_or_else(|e| {
            warn!(cycle_id = %cycle_id, error = %e, "dashboard unavailable, returning empty bundle");
            DashboardBundle::empty(cycle_id)
        })
    }

    fn try_dashboard_bundle(&self, cycle_id: &str) -> ApiResult<DashboardBundle> {
        let cycle = self.cycle_repo.find_by_id(cycle_id)?;

        let (meta, comparison) = match &cycle {
            Some(cycle) => {
                let comparison = self
                    .previous_finalized(cycle)?
                    .map(|prev| {
                        debug!(cycle_id = %cycle_id, previous = %prev.cycle_id, "comparing with previous cycle");
                        self.compare(cycle_id, &prev.cycle_id)
                    });
                (self.meta(cycle), comparison)
            }
            None => {
                warn!(cycle_id = %cycle_id, "dashboard for unknown cycle");
                (
                    CycleMeta {
                        cycle_id: cycle_id.to_string(),
                        ..CycleMeta::default()
                    },
                    None,
                )
            }
        };

        let details = DashboardDetails {
            stores: self.count_repo.list_store_counts(cycle_id)?,
            sectors: self.count_repo.list_sector_counts(cycle_id)?,
            transit: self.movement_repo.grouped_transit(cycle_id)?,
            supplier: self.movement_repo.grouped_supplier(cycle_id)?,
        };

        Ok(DashboardBundle {
            meta,
            totals: self.compute_totals(cycle_id),
            status: self.compute_status(cycle_id),
            comparison,
            details,
        })
    }

    fn meta(&self, cycle: &InventoryCycle) -> CycleMeta {
        CycleMeta {
            cycle_id: cycle.cycle_id.clone(),
            started_at: cycle.started_at.format(META_DATE_FORMAT).to_string(),
            status: cycle.status.as_str().to_string(),
            description: cycle.description.clone(),
            duration: cycle
                .ended_at
                .map(|ended| format_duration(cycle.started_at, ended)),
            ended_at: cycle
                .ended_at
                .map(|ended| ended.format(META_DATE_FORMAT).to_string()),
        }
    }
}
