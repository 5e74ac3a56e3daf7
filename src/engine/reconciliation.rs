// ==========================================
// Asset inventory - reference reconciliation
// ==========================================
// Which expected stores/sectors have no row yet, and where a
// manually entered location belongs.
// ==========================================

use crate::domain::inventory::{ReferenceSector, ReferenceStore};
use std::collections::{HashMap, HashSet};

/// Target table of a manual count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    /// Contains "CD " -> sector_count
    CdSector,
    Store,
}

/// Route a location: any name containing "CD " is a CD sector
pub fn resolve_location(location: &str) -> LocationKind {
    if location.contains("CD ") {
        LocationKind::CdSector
    } else {
        LocationKind::Store
    }
}

/// Reference stores with a name, first occurrence of each name
pub fn unique_stores(reference: &[ReferenceStore]) -> Vec<&ReferenceStore> {
    let mut seen = HashSet::new();
    reference
        .iter()
        .filter(|s| !s.name.trim().is_empty() && seen.insert(s.name.as_str()))
        .collect()
}

/// Reference sectors with a name, first occurrence of each name
pub fn unique_sectors(reference: &[ReferenceSector]) -> Vec<&ReferenceSector> {
    let mut seen = HashSet::new();
    reference
        .iter()
        .filter(|s| !s.name.trim().is_empty() && seen.insert(s.name.as_str()))
        .collect()
}

/// Reference stores with no row in the cycle
pub fn missing_stores<'a>(
    reference: &'a [ReferenceStore],
    existing: &HashSet<String>,
) -> Vec<&'a ReferenceStore> {
    unique_stores(reference)
        .into_iter()
        .filter(|s| !existing.contains(&s.name))
        .collect()
}

/// Reference sectors with no row in the cycle
pub fn missing_sectors<'a>(
    reference: &'a [ReferenceSector],
    existing: &HashSet<String>,
) -> Vec<&'a ReferenceSector> {
    unique_sectors(reference)
        .into_iter()
        .filter(|s| !existing.contains(&s.name))
        .collect()
}

/// store name -> region; a repeated name keeps its first region
pub fn region_map(reference: &[ReferenceStore]) -> HashMap<String, String> {
    unique_stores(reference)
        .into_iter()
        .map(|s| (s.name.clone(), s.region.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_location() {
        assert_eq!(resolve_location("CD SP"), LocationKind::CdSector);
        assert_eq!(resolve_location("Setor CD RJ"), LocationKind::CdSector);
        assert_eq!(resolve_location("Loja 12"), LocationKind::Store);
        assert_eq!(resolve_location("CDSP"), LocationKind::Store);
    }

    #[test]
    fn test_missing_stores_skips_existing_and_duplicates() {
        let reference = vec![
            ReferenceStore::new("Loja 1", "Norte"),
            ReferenceStore::new("Loja 2", "Norte"),
            ReferenceStore::new("Loja 2", "Sul"),
            ReferenceStore::new(" ", "Sul"),
        ];
        let existing: HashSet<String> = ["Loja 1".to_string()].into_iter().collect();

        let missing = missing_stores(&reference, &existing);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "Loja 2");
        assert_eq!(missing[0].region, "Norte");
    }

    #[test]
    fn test_missing_sectors() {
        let reference = vec![
            ReferenceSector::new("Expedição", ""),
            ReferenceSector::new("Picking", ""),
        ];
        let existing: HashSet<String> = HashSet::new();
        assert_eq!(missing_sectors(&reference, &existing).len(), 2);
    }

    #[test]
    fn test_region_map_keeps_first_region() {
        let reference = vec![
            ReferenceStore::new("Loja 2", "Norte"),
            ReferenceStore::new("Loja 2", "Sul"),
        ];
        assert_eq!(region_map(&reference)["Loja 2"], "Norte");
    }
}
