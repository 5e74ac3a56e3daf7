// ==========================================
// Asset inventory - reference data sources
// ==========================================
// Expected stores (loja, regional) and CD sectors (setor, descricao).
// The file source caches each list and re-reads it when the file's
// modification time changes or a reload is forced.
// ==========================================

use crate::domain::inventory::{ReferenceSector, ReferenceStore};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::ReferenceDataSource;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::SystemTime;
use tracing::{debug, warn};

struct CachedList<T> {
    mtime: SystemTime,
    items: Vec<T>,
}

struct ReferenceState {
    stores_path: PathBuf,
    sectors_path: PathBuf,
    stores: Option<CachedList<ReferenceStore>>,
    sectors: Option<CachedList<ReferenceSector>>,
}

// ==========================================
// FileReferenceSource
// ==========================================
pub struct FileReferenceSource {
    state: Mutex<ReferenceState>,
    parser: UniversalFileParser,
}

impl FileReferenceSource {
    pub fn new(stores_path: impl Into<PathBuf>, sectors_path: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(ReferenceState {
                stores_path: stores_path.into(),
                sectors_path: sectors_path.into(),
                stores: None,
                sectors: None,
            }),
            parser: UniversalFileParser,
        }
    }

    /// Point at new files; the matching cache is dropped
    pub fn set_paths(&self, stores_path: Option<PathBuf>, sectors_path: Option<PathBuf>) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(path) = stores_path {
            state.stores_path = path;
            state.stores = None;
        }
        if let Some(path) = sectors_path {
            state.sectors_path = path;
            state.sectors = None;
        }
    }

    fn modified_at(path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn parse_stores(&self, path: &Path) -> ImportResult<Vec<ReferenceStore>> {
        let records = self.parser.parse(path)?;
        Ok(records
            .into_iter()
            .filter_map(|row| {
                let name = row.get("loja").map(|v| v.trim()).unwrap_or("");
                if name.is_empty() {
                    return None;
                }
                let region = row.get("regional").map(|v| v.trim()).unwrap_or("");
                Some(ReferenceStore::new(name, region))
            })
            .collect())
    }

    fn parse_sectors(&self, path: &Path) -> ImportResult<Vec<ReferenceSector>> {
        let records = self.parser.parse(path)?;
        Ok(records
            .into_iter()
            .filter_map(|row| {
                let name = row.get("setor").map(|v| v.trim()).unwrap_or("");
                if name.is_empty() {
                    return None;
                }
                let description = row.get("descricao").map(|v| v.trim()).unwrap_or("");
                Some(ReferenceSector::new(name, description))
            })
            .collect())
    }

    /// Shared cache logic for both lists
    fn load<T: Clone>(
        &self,
        kind: &str,
        force_reload: bool,
        select: impl Fn(&mut ReferenceState) -> (&PathBuf, &mut Option<CachedList<T>>),
        parse: impl Fn(&Path) -> ImportResult<Vec<T>>,
    ) -> Vec<T> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (path, cache) = select(&mut *state);
        let path = path.clone();

        let Some(mtime) = Self::modified_at(&path) else {
            warn!(kind, path = %path.display(), "reference file unavailable");
            *cache = None;
            return Vec::new();
        };

        if let Some(cached) = cache.as_ref() {
            if !force_reload && cached.mtime == mtime {
                return cached.items.clone();
            }
        }

        match parse(&path) {
            Ok(items) => {
                debug!(kind, path = %path.display(), count = items.len(), "reference file loaded");
                *cache = Some(CachedList {
                    mtime,
                    items: items.clone(),
                });
                items
            }
            Err(e) => {
                warn!(kind, path = %path.display(), error = %e, "reference file unreadable");
                *cache = None;
                Vec::new()
            }
        }
    }
}

impl ReferenceDataSource for FileReferenceSource {
    fn read_stores(&self, force_reload: bool) -> Vec<ReferenceStore> {
        self.load(
            "stores",
            force_reload,
            |s| (&s.stores_path, &mut s.stores),
            |p| self.parse_stores(p),
        )
    }

    fn read_sectors(&self, force_reload: bool) -> Vec<ReferenceSector> {
        self.load(
            "sectors",
            force_reload,
            |s| (&s.sectors_path, &mut s.sectors),
            |p| self.parse_sectors(p),
        )
    }
}

// ==========================================
// StaticReferenceSource (in-memory)
// ==========================================
#[derive(Default)]
pub struct StaticReferenceSource {
    stores: RwLock<Vec<ReferenceStore>>,
    sectors: RwLock<Vec<ReferenceSector>>,
}

impl StaticReferenceSource {
    pub fn new(stores: Vec<ReferenceStore>, sectors: Vec<ReferenceSector>) -> Self {
        Self {
            stores: RwLock::new(stores),
            sectors: RwLock::new(sectors),
        }
    }

    pub fn set_stores(&self, stores: Vec<ReferenceStore>) {
        if let Ok(mut guard) = self.stores.write() {
            *guard = stores;
        }
    }

    pub fn set_sectors(&self, sectors: Vec<ReferenceSector>) {
        if let Ok(mut guard) = self.sectors.write() {
            *guard = sectors;
        }
    }
}

impl ReferenceDataSource for StaticReferenceSource {
    fn read_stores(&self, _force_reload: bool) -> Vec<ReferenceStore> {
        self.stores.read().map(|g| g.clone()).unwrap_or_default()
    }

    fn read_sectors(&self, _force_reload: bool) -> Vec<ReferenceSector> {
        self.sectors.read().map(|g| g.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(path: &Path, body: &str) {
        let mut file = fs::File::create(path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn test_reads_and_caches_reference_files() {
        let dir = TempDir::new().unwrap();
        let stores = dir.path().join("lojas.csv");
        let sectors = dir.path().join("setores.csv");
        write(&stores, "loja,regional\nLoja 001,Norte\n,Sul\nLoja 002,\n");
        write(&sectors, "setor,descricao\nSetor A,Recebimento\n");

        let source = FileReferenceSource::new(&stores, &sectors);
        let loaded = source.read_stores(false);
        assert_eq!(
            loaded,
            vec![
                ReferenceStore::new("Loja 001", "Norte"),
                ReferenceStore::new("Loja 002", "")
            ]
        );
        assert_eq!(source.read_sectors(false)[0].description, "Recebimento");

        // a forced reload sees new content even within the same mtime tick
        write(&stores, "loja,regional\nLoja 009,Centro\n");
        let reloaded = source.read_stores(true);
        assert_eq!(reloaded, vec![ReferenceStore::new("Loja 009", "Centro")]);
    }

    #[test]
    fn test_missing_file_means_unavailable() {
        let dir = TempDir::new().unwrap();
        let source = FileReferenceSource::new(dir.path().join("none.csv"), dir.path().join("none2.csv"));
        assert!(source.read_stores(false).is_empty());
        assert!(source.read_sectors(true).is_empty());
    }

    #[test]
    fn test_static_source() {
        let source = StaticReferenceSource::default();
        assert!(source.read_stores(false).is_empty());
        source.set_stores(vec![ReferenceStore::new("Loja 1", "Norte")]);
        assert_eq!(source.read_stores(false).len(), 1);
    }
}
