// ==========================================
// Asset inventory - engine layer
// ==========================================
// Pure computations over rows the API layer hands in.
// No SQL, no file access.
// ==========================================

pub mod box_type_normalizer;
pub mod comparison;
pub mod reconciliation;
pub mod status;
pub mod totals;

pub use box_type_normalizer::{normalize, normalize_detailed, Normalization};
pub use comparison::ComparisonEngine;
pub use reconciliation::{resolve_location, LocationKind};
pub use status::{StatusEngine, StatusInput, StoreUniverse};
pub use totals::{TotalsEngine, TotalsInput, TransitSplitPolicy};
