// ==========================================
// Asset inventory - importer traits
// ==========================================

use crate::domain::inventory::{ReferenceSector, ReferenceStore};
use crate::importer::error::ImportResult;
use std::collections::HashMap;
use std::path::Path;

/// Raw tabular file reader
///
/// Each record maps trimmed header -> trimmed cell value.
/// Fully blank rows are dropped.
pub trait FileParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<HashMap<String, String>>>;
}

/// Authoritative list of expected stores and CD sectors
///
/// An empty list means "unavailable"; callers fall back to persisted rows.
/// Implementations never fail: read problems are logged and yield an empty list.
pub trait ReferenceDataSource: Send + Sync {
    fn read_stores(&self, force_reload: bool) -> Vec<ReferenceStore>;

    fn read_sectors(&self, force_reload: bool) -> Vec<ReferenceSector>;
}
