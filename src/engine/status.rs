// ==========================================
// Asset inventory - regional status engine
// ==========================================
// Completion per region against the expected population.
// Reference lists are the denominator when present; persisted rows otherwise.
// ==========================================

use crate::domain::inventory::{
    ReferenceSector, ReferenceStore, RegionTally, SectorCount, StoreCount,
};
use crate::domain::report::{percentage, PendingSector, RegionStatus, StatusBundle};
use crate::domain::types::NO_REGION;
use crate::engine::reconciliation::{unique_sectors, unique_stores};
use std::collections::{BTreeMap, HashSet};

/// Where the expected store population comes from
pub enum StoreUniverse<'a> {
    /// Reference list (authoritative)
    Reference(&'a [ReferenceStore]),
    /// Persisted rows grouped by region, plus pending names per region
    Persisted {
        tallies: &'a [RegionTally],
        pending: &'a BTreeMap<String, Vec<String>>,
    },
}

pub struct StatusInput<'a> {
    pub stores: StoreUniverse<'a>,
    /// Empty means unavailable; sector rows are used instead
    pub reference_sectors: &'a [ReferenceSector],
    pub store_rows: &'a [StoreCount],
    pub sector_rows: &'a [SectorCount],
}

fn region_label(region: &str) -> String {
    if region.trim().is_empty() {
        NO_REGION.to_string()
    } else {
        region.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusEngine;

impl StatusEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, cycle_id: &str, input: &StatusInput<'_>) -> StatusBundle {
        let mut bundle = StatusBundle::empty(cycle_id);

        let mut regions = match &input.stores {
            StoreUniverse::Reference(reference) => {
                self.regions_from_reference(reference, input.store_rows)
            }
            StoreUniverse::Persisted { tallies, pending } => {
                bundle.used_persisted_fallback = true;
                self.regions_from_persisted(tallies, pending)
            }
        };
        regions.sort_by(|a, b| {
            b.percentage
                .total_cmp(&a.percentage)
                .then_with(|| a.region.cmp(&b.region))
        });

        bundle.total_stores = regions.iter().map(|r| r.total_stores).sum();
        bundle.finalized_stores = regions.iter().map(|r| r.finalized_stores).sum();
        bundle.pending_stores = bundle.total_stores - bundle.finalized_stores;
        bundle.store_percentage = percentage(bundle.finalized_stores, bundle.total_stores);
        bundle.regions = regions;

        let finalized_sectors: HashSet<&str> = input
            .sector_rows
            .iter()
            .filter(|row| row.is_finalized())
            .map(|row| row.sector_name.as_str())
            .collect();

        let reference_sectors = unique_sectors(input.reference_sectors);
        if reference_sectors.is_empty() {
            bundle.used_persisted_fallback = true;
            bundle.total_sectors = input.sector_rows.len() as i64;
            bundle.pending_sector_list = input
                .sector_rows
                .iter()
                .filter(|row| !row.is_finalized())
                .map(|row| PendingSector {
                    name: row.sector_name.clone(),
                    description: String::new(),
                })
                .collect();
        } else {
            bundle.total_sectors = reference_sectors.len() as i64;
            bundle.pending_sector_list = reference_sectors
                .iter()
                .filter(|s| !finalized_sectors.contains(s.name.as_str()))
                .map(|s| PendingSector {
                    name: s.name.clone(),
                    description: s.description.clone(),
                })
                .collect();
        }
        bundle.pending_sectors = bundle.pending_sector_list.len() as i64;
        bundle.finalized_sectors = bundle.total_sectors - bundle.pending_sectors;
        bundle.sector_percentage = percentage(bundle.finalized_sectors, bundle.total_sectors);

        bundle
    }

    fn regions_from_reference(
        &self,
        reference: &[ReferenceStore],
        store_rows: &[StoreCount],
    ) -> Vec<RegionStatus> {
        let finalized: HashSet<&str> = store_rows
            .iter()
            .filter(|row| row.is_finalized())
            .map(|row| row.store_name.as_str())
            .collect();

        let mut grouped: BTreeMap<String, Vec<&ReferenceStore>> = BTreeMap::new();
        for store in unique_stores(reference) {
            grouped.entry(region_label(&store.region)).or_default().push(store);
        }

        grouped
            .into_iter()
            .map(|(region, stores)| {
                let pending_stores: Vec<String> = stores
                    .iter()
                    .filter(|s| !finalized.contains(s.name.as_str()))
                    .map(|s| s.name.clone())
                    .collect();
                let total_stores = stores.len() as i64;
                let finalized_stores = total_stores - pending_stores.len() as i64;
                RegionStatus {
                    region,
                    total_stores,
                    finalized_stores,
                    percentage: percentage(finalized_stores, total_stores),
                    pending_stores,
                }
            })
            .collect()
    }

    fn regions_from_persisted(
        &self,
        tallies: &[RegionTally],
        pending: &BTreeMap<String, Vec<String>>,
    ) -> Vec<RegionStatus> {
        // "" and "  " are the same group
        let mut merged: BTreeMap<String, (i64, i64, Vec<String>)> = BTreeMap::new();
        for tally in tallies {
            let entry = merged.entry(region_label(&tally.region)).or_default();
            entry.0 += tally.total;
            entry.1 += tally.finalized;
        }
        for (region, names) in pending {
            let entry = merged.entry(region_label(region)).or_default();
            entry.2.extend(names.iter().cloned());
        }

        merged
            .into_iter()
            .filter(|(_, (total, _, _))| *total > 0)
            .map(|(region, (total, finalized, mut pending_stores))| {
                pending_stores.sort();
                RegionStatus {
                    region,
                    total_stores: total,
                    finalized_stores: finalized,
                    percentage: percentage(finalized, total),
                    pending_stores,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::BoxCounts;
    use crate::domain::types::{BoxType, CountStatus};
    use chrono::NaiveDateTime;

    fn ts() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-05-01 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn store_row(name: &str, region: &str, status: CountStatus) -> StoreCount {
        StoreCount {
            cycle_id: "C1".to_string(),
            store_name: name.to_string(),
            region: region.to_string(),
            sector_label: "General".to_string(),
            counts: BoxCounts::zero().with(BoxType::Hb623, 5),
            status,
            user_name: "test".to_string(),
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn sector_row(name: &str, status: CountStatus) -> SectorCount {
        SectorCount {
            cycle_id: "C1".to_string(),
            sector_name: name.to_string(),
            counts: BoxCounts::zero(),
            status,
            user_name: "test".to_string(),
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn test_pending_includes_counted_but_unfinalized_store() {
        let reference = vec![
            ReferenceStore::new("Loja 1", "Norte"),
            ReferenceStore::new("Loja 2", "Norte"),
        ];
        let rows = vec![store_row("Loja 1", "Norte", CountStatus::Pending)];

        let status = StatusEngine::new().compute(
            "C1",
            &StatusInput {
                stores: StoreUniverse::Reference(&reference),
                reference_sectors: &[],
                store_rows: &rows,
                sector_rows: &[],
            },
        );

        let norte = status.region("Norte").unwrap();
        assert_eq!(norte.total_stores, 2);
        assert_eq!(norte.finalized_stores, 0);
        assert_eq!(norte.percentage, 0.0);
        assert_eq!(norte.pending_stores, vec!["Loja 1", "Loja 2"]);
    }

    #[test]
    fn test_empty_inputs_do_not_divide_by_zero() {
        let tallies: Vec<RegionTally> = Vec::new();
        let pending = BTreeMap::new();
        let status = StatusEngine::new().compute(
            "C1",
            &StatusInput {
                stores: StoreUniverse::Persisted {
                    tallies: &tallies,
                    pending: &pending,
                },
                reference_sectors: &[],
                store_rows: &[],
                sector_rows: &[],
            },
        );

        assert_eq!(status.store_percentage, 0.0);
        assert_eq!(status.sector_percentage, 0.0);
        assert!(status.regions.is_empty());
        assert!(status.used_persisted_fallback);
    }

    #[test]
    fn test_regions_sorted_by_completion_then_name() {
        let reference = vec![
            ReferenceStore::new("A1", "Sul"),
            ReferenceStore::new("B1", "Norte"),
            ReferenceStore::new("B2", "Norte"),
            ReferenceStore::new("C1", ""),
            ReferenceStore::new("D1", "Leste"),
        ];
        let rows = vec![
            store_row("A1", "Sul", CountStatus::Finalized),
            store_row("B1", "Norte", CountStatus::Finalized),
        ];

        let status = StatusEngine::new().compute(
            "C1",
            &StatusInput {
                stores: StoreUniverse::Reference(&reference),
                reference_sectors: &[],
                store_rows: &rows,
                sector_rows: &[],
            },
        );

        let order: Vec<&str> = status.regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(order, vec!["Sul", "Norte", "Leste", NO_REGION]);
        assert_eq!(status.total_stores, 5);
        assert_eq!(status.finalized_stores, 2);
        assert_eq!(status.pending_stores, 3);
        assert!((status.store_percentage - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_pending_sectors_from_reference() {
        let sectors = vec![
            ReferenceSector::new("Expedição", "Saída"),
            ReferenceSector::new("Recebimento", "Entrada"),
        ];
        let rows = vec![
            sector_row("Expedição", CountStatus::Finalized),
            sector_row("Recebimento", CountStatus::Pending),
        ];

        let status = StatusEngine::new().compute(
            "C1",
            &StatusInput {
                stores: StoreUniverse::Reference(&[]),
                reference_sectors: &sectors,
                store_rows: &[],
                sector_rows: &rows,
            },
        );

        assert_eq!(status.total_sectors, 2);
        assert_eq!(status.finalized_sectors, 1);
        assert_eq!(status.sector_percentage, 50.0);
        assert_eq!(status.pending_sector_list.len(), 1);
        assert_eq!(status.pending_sector_list[0].name, "Recebimento");
        assert_eq!(status.pending_sector_list[0].description, "Entrada");
    }

    #[test]
    fn test_persisted_fallback_uses_tallies() {
        let tallies = vec![
            RegionTally {
                region: "".to_string(),
                total: 2,
                finalized: 1,
            },
            RegionTally {
                region: "Centro".to_string(),
                total: 1,
                finalized: 1,
            },
        ];
        let mut pending = BTreeMap::new();
        pending.insert("".to_string(), vec!["Loja X".to_string()]);

        let status = StatusEngine::new().compute(
            "C1",
            &StatusInput {
                stores: StoreUniverse::Persisted {
                    tallies: &tallies,
                    pending: &pending,
                },
                reference_sectors: &[],
                store_rows: &[],
                sector_rows: &[],
            },
        );

        assert_eq!(status.regions[0].region, "Centro");
        let none = status.region(NO_REGION).unwrap();
        assert_eq!(none.pending_stores, vec!["Loja X"]);
        assert_eq!(none.percentage, 50.0);
    }

    #[test]
    fn test_repeated_reference_store_counts_once() {
        let reference = vec![
            ReferenceStore::new("Loja 1", "Norte"),
            ReferenceStore::new("Loja 2", "Norte"),
            ReferenceStore::new("Loja 2", "Sul"),
        ];
        let rows = vec![
            store_row("Loja 1", "Norte", CountStatus::Pending),
            store_row("Loja 2", "Norte", CountStatus::Finalized),
        ];

        let status = StatusEngine::new().compute(
            "C1",
            &StatusInput {
                stores: StoreUniverse::Reference(&reference),
                reference_sectors: &[],
                store_rows: &rows,
                sector_rows: &[],
            },
        );

        assert_eq!(status.total_stores, 2);
        assert_eq!(status.finalized_stores, 1);
        assert_eq!(status.store_percentage, 50.0);
        assert!(status.region("Sul").is_none());
        assert_eq!(status.region("Norte").unwrap().pending_stores, vec!["Loja 1"]);
    }

    #[test]
    fn test_blank_regions_merge_into_one_group() {
        let tallies = vec![
            RegionTally {
                region: "".to_string(),
                total: 1,
                finalized: 0,
            },
            RegionTally {
                region: " ".to_string(),
                total: 1,
                finalized: 1,
            },
        ];
        let mut pending = BTreeMap::new();
        pending.insert("".to_string(), vec!["Loja X".to_string()]);

        let status = StatusEngine::new().compute(
            "C1",
            &StatusInput {
                stores: StoreUniverse::Persisted {
                    tallies: &tallies,
                    pending: &pending,
                },
                reference_sectors: &[],
                store_rows: &[],
                sector_rows: &[],
            },
        );

        assert_eq!(status.regions.len(), 1);
        let none = &status.regions[0];
        assert_eq!(none.region, NO_REGION);
        assert_eq!(none.total_stores, 2);
        assert_eq!(none.finalized_stores, 1);
        assert_eq!(none.pending_stores, vec!["Loja X"]);
    }
}
