// ==========================================
// Asset inventory - core library
// ==========================================
// Stack: Rust + SQLite
// Tracks inventory cycles of boxes and pallets across stores, CDs,
// transit and suppliers, and computes the rollups behind dashboards.
// ==========================================

// ==========================================
// Modules
// ==========================================

// Domain - entities and types
pub mod domain;

// Repositories - data access
pub mod repository;

// Engines - pure rollups
pub mod engine;

// Import - reference lists and count files
pub mod importer;

// Configuration
pub mod config;

// Database infrastructure (connection setup, schema)
pub mod db;

// Logging
pub mod logging;

// API - lifecycle and reports
pub mod api;

// Application - session state and poller
pub mod app;

// ==========================================
// Re-exports
// ==========================================

pub use domain::types::{BoxType, CountStatus, CycleStatus, OriginBucket};

pub use domain::{
    ComparisonBundle, DashboardBundle, InventoryCycle, SectorCount, StatusBundle, StoreCount,
    SupplierRecord, TotalsBundle, TransitRecord,
};

pub use engine::{normalize, ComparisonEngine, StatusEngine, TotalsEngine, TransitSplitPolicy};

pub use api::{ApiError, ApiResult, InventoryApi, ReportApi};

pub use app::{AppState, CommandResponse};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Asset Inventory";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
