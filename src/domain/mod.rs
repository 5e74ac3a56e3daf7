// ==========================================
// Asset inventory - domain layer
// ==========================================
// Entities, closed type sets and report bundles. No I/O here.
// ==========================================

pub mod inventory;
pub mod report;
pub mod types;

pub use inventory::{
    BoxCounts, CycleSummary, GroupedQuantity, ImportBatch, InventoryCycle, ReferenceSector,
    ReferenceStore, RegionTally, SectorCount, StoreCount, SupplierRecord, TransitRecord,
};
pub use report::{
    BoxTally, ComparisonBundle, ComparisonDiff, CycleMeta, DashboardBundle, DashboardDetails,
    HistorySummary, PendingSector, RegionStatus, StatusBundle, TotalsBundle,
};
pub use types::{BoxType, CountStatus, CycleStatus, OriginBucket};
