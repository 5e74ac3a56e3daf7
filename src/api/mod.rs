// ==========================================
// Asset inventory - API layer
// ==========================================
// Orchestrates repositories, the reference source and the engines.
// ==========================================

pub mod error;
pub mod inventory_api;
pub mod report_api;

pub use error::{ApiError, ApiResult};
pub use inventory_api::{FillReport, ImportReport, InventoryApi, ReferenceCoverage, SourceReport};
pub use report_api::ReportApi;
