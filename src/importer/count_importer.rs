// ==========================================
// Asset inventory - count file importer
// ==========================================
// Three sources: store counts, CD sector counts, transit.
// A file whose modification time matches the last import for the same
// (source, cycle, path) is skipped without touching the database.
// All rows are mapped before the first write, so a bad row leaves the
// cycle as it was.
// ==========================================

use crate::domain::inventory::ImportBatch;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{FieldMapper, MappingContext};
use crate::importer::file_parser::UniversalFileParser;
use crate::repository::{CountRepository, ImportBatchRepository, MovementRepository};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{debug, info};
use uuid::Uuid;

/// Count file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSource {
    StoreCounts,
    SectorCounts,
    Transit,
}

impl ImportSource {
    pub const ALL: [ImportSource; 3] = [
        ImportSource::StoreCounts,
        ImportSource::SectorCounts,
        ImportSource::Transit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImportSource::StoreCounts => "contagem_lojas",
            ImportSource::SectorCounts => "contagem_cd",
            ImportSource::Transit => "dados_transito",
        }
    }
}

/// Result of one file import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub source: ImportSource,
    /// False when the file was unchanged and nothing was written
    pub modified: bool,
    pub rows: usize,
    pub batch_id: Option<String>,
}

/// One import call
pub struct ImportRequest<'a> {
    pub source: ImportSource,
    pub path: &'a Path,
    pub cycle_id: &'a str,
    pub user: &'a str,
    /// store name -> region from reference data
    pub regions: &'a HashMap<String, String>,
    /// Bypass the modification-time check
    pub force: bool,
    pub now: NaiveDateTime,
}

type TrackingKey = (ImportSource, String, PathBuf);

// ==========================================
// CountImporter
// ==========================================
pub struct CountImporter {
    count_repo: Arc<CountRepository>,
    movement_repo: Arc<MovementRepository>,
    batch_repo: Arc<ImportBatchRepository>,
    parser: UniversalFileParser,
    mapper: FieldMapper,
    /// Modification time of the last imported version of each file.
    /// Held for the whole import so overlapping calls see each other's result.
    last_loaded: Mutex<HashMap<TrackingKey, SystemTime>>,
}

impl CountImporter {
    pub fn new(
        count_repo: Arc<CountRepository>,
        movement_repo: Arc<MovementRepository>,
        batch_repo: Arc<ImportBatchRepository>,
    ) -> Self {
        Self {
            count_repo,
            movement_repo,
            batch_repo,
            parser: UniversalFileParser,
            mapper: FieldMapper,
            last_loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Forget every recorded modification time
    pub fn clear_tracking(&self) {
        if let Ok(mut tracked) = self.last_loaded.lock() {
            tracked.clear();
        }
    }

    pub fn import_file(&self, request: &ImportRequest<'_>) -> ImportResult<ImportOutcome> {
        let path = request.path;
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let mtime = fs::metadata(path)?.modified()?;

        let mut tracked = self
            .last_loaded
            .lock()
            .map_err(|e| ImportError::InternalError(format!("import tracking lock poisoned: {}", e)))?;
        let key: TrackingKey = (
            request.source,
            request.cycle_id.to_string(),
            path.to_path_buf(),
        );

        if !request.force && tracked.get(&key) == Some(&mtime) {
            debug!(source = request.source.as_str(), path = %path.display(), "file unchanged since last import");
            return Ok(ImportOutcome {
                source: request.source,
                modified: false,
                rows: 0,
                batch_id: None,
            });
        }

        let records = self.parser.parse(path)?;
        let ctx = MappingContext {
            cycle_id: request.cycle_id,
            default_user: request.user,
            now: request.now,
            regions: request.regions,
        };

        // row numbers are 1-based data rows (header excluded)
        let rows = match request.source {
            ImportSource::StoreCounts => {
                let mapped = records
                    .iter()
                    .enumerate()
                    .map(|(i, row)| self.mapper.map_store_count(row, i + 1, &ctx))
                    .collect::<ImportResult<Vec<_>>>()?;
                for row in &mapped {
                    self.count_repo.upsert_store_count(row)?;
                }
                mapped.len()
            }
            ImportSource::SectorCounts => {
                let mapped = records
                    .iter()
                    .enumerate()
                    .map(|(i, row)| self.mapper.map_sector_count(row, i + 1, &ctx))
                    .collect::<ImportResult<Vec<_>>>()?;
                for row in &mapped {
                    self.count_repo.upsert_sector_count(row)?;
                }
                mapped.len()
            }
            ImportSource::Transit => {
                let mapped: Vec<_> = records
                    .iter()
                    .enumerate()
                    .map(|(i, row)| self.mapper.map_transit(row, i + 1, &ctx))
                    .collect::<ImportResult<Vec<_>>>()?
                    .into_iter()
                    .flatten()
                    .collect();
                self.movement_repo.append_transit_batch(&mapped)?
            }
        };

        let batch = ImportBatch {
            batch_id: Uuid::new_v4().to_string(),
            cycle_id: request.cycle_id.to_string(),
            source: request.source.as_str().to_string(),
            file_path: path.display().to_string(),
            row_count: rows as i64,
            imported_by: request.user.to_string(),
            imported_at: request.now,
        };
        self.batch_repo.insert(&batch)?;
        tracked.insert(key, mtime);

        info!(
            source = request.source.as_str(),
            cycle_id = %request.cycle_id,
            rows,
            batch_id = %batch.batch_id,
            "count file imported"
        );

        Ok(ImportOutcome {
            source: request.source,
            modified: true,
            rows,
            batch_id: Some(batch.batch_id),
        })
    }
}
