// ==========================================
// Asset inventory - cross-cycle comparison
// ==========================================
// diff = totals(current) - totals(previous)
// ==========================================

use crate::domain::report::{ComparisonBundle, ComparisonDiff, TotalsBundle};
use crate::domain::types::{BoxType, OriginBucket};

#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonEngine;

impl ComparisonEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn diff(&self, current: &TotalsBundle, previous: &TotalsBundle) -> ComparisonDiff {
        let mut diff = ComparisonDiff::default();

        for box_type in BoxType::ALL {
            diff.by_type[box_type.index()] =
                current.total_for_type(box_type) - previous.total_for_type(box_type);
        }
        for bucket in OriginBucket::ALL {
            diff.by_bucket[bucket.index()] =
                current.total_for_bucket(bucket) - previous.total_for_bucket(bucket);
        }

        diff.stores = diff.for_bucket(OriginBucket::Lojas);
        diff.cd = OriginBucket::CD.iter().map(|b| diff.for_bucket(*b)).sum();
        diff.transit = OriginBucket::TRANSIT.iter().map(|b| diff.for_bucket(*b)).sum();
        diff.supplier = diff.for_bucket(OriginBucket::Fornecedor);
        diff.total = current.grand_total() - previous.grand_total();
        diff
    }

    pub fn compare(&self, current: TotalsBundle, previous: TotalsBundle) -> ComparisonBundle {
        let diffs = self.diff(&current, &previous);
        ComparisonBundle {
            current,
            previous,
            diffs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_a() -> TotalsBundle {
        let mut t = TotalsBundle::empty("A");
        t.add(OriginBucket::Lojas, BoxType::Hb623, 12.0);
        t.add(OriginBucket::CdSp, BoxType::Bin, 4.0);
        t.add(OriginBucket::TransitoEs, BoxType::HntG, 10.0 / 3.0);
        t.add(OriginBucket::Fornecedor, BoxType::PalletsPbr, 3.0);
        t
    }

    fn sample_b() -> TotalsBundle {
        let mut t = TotalsBundle::empty("B");
        t.add(OriginBucket::Lojas, BoxType::Hb623, 7.0);
        t.add(OriginBucket::CdRj, BoxType::Bin, 9.0);
        t.add(OriginBucket::TransitoSp, BoxType::HntG, 1.0);
        t
    }

    #[test]
    fn test_diff_breakdown() {
        let diff = ComparisonEngine::new().diff(&sample_a(), &sample_b());

        assert_eq!(diff.for_type(BoxType::Hb623), 5.0);
        assert_eq!(diff.for_type(BoxType::Bin), -5.0);
        assert_eq!(diff.stores, 5.0);
        assert_eq!(diff.cd, -5.0);
        assert!((diff.transit - (10.0 / 3.0 - 1.0)).abs() < 1e-9);
        assert_eq!(diff.supplier, 3.0);
        assert!((diff.total - (diff.stores + diff.cd + diff.transit + diff.supplier)).abs() < 1e-9);
    }

    #[test]
    fn test_diff_is_antisymmetric() {
        let engine = ComparisonEngine::new();
        let ab = engine.diff(&sample_a(), &sample_b());
        let ba = engine.diff(&sample_b(), &sample_a());

        assert!((ab.total + ba.total).abs() < 1e-9);
        for box_type in BoxType::ALL {
            assert!((ab.for_type(box_type) + ba.for_type(box_type)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_compare_against_empty_cycle() {
        let bundle = ComparisonEngine::new().compare(sample_a(), TotalsBundle::empty("missing"));
        assert!((bundle.diffs.total - bundle.current.grand_total()).abs() < 1e-9);

        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json["diferencas"]["diff_total"].is_number());
        assert_eq!(json["anterior"]["total_geral"], 0.0);
    }
}
