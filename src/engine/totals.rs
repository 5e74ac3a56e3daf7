// ==========================================
// Asset inventory - per-cycle totals engine
// ==========================================
// Input: the cycle's rows (already loaded by the API layer)
// Output: TotalsBundle, 8 origin buckets x 7 box types
// Engines do not touch the database.
// ==========================================

use crate::domain::inventory::{GroupedQuantity, SectorCount, StoreCount};
use crate::domain::report::TotalsBundle;
use crate::domain::types::{BoxType, OriginBucket};
use crate::engine::box_type_normalizer::normalize_detailed;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Store row names that are physical CD counts
pub const CD_SP_STORE_NAME: &str = "CD SP";
pub const CD_ES_STORE_NAME: &str = "CD ES";

/// Prefix marking a store row as a CD record
pub const CD_PREFIX: &str = "CD ";

// ==========================================
// TransitSplitPolicy
// ==========================================
/// Weights for transit whose origin names no CD
///
/// Shares are `weight / (sp + es + rj)`. Default is an even three-way split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitSplitPolicy {
    pub sp: f64,
    pub es: f64,
    pub rj: f64,
}

impl Default for TransitSplitPolicy {
    fn default() -> Self {
        Self {
            sp: 1.0,
            es: 1.0,
            rj: 1.0,
        }
    }
}

impl TransitSplitPolicy {
    fn is_usable(&self) -> bool {
        let weights = [self.sp, self.es, self.rj];
        weights.iter().all(|w| w.is_finite() && *w >= 0.0) && weights.iter().sum::<f64>() > 0.0
    }

    /// The policy itself, or the even split when the weights are unusable
    pub fn validated(self) -> Self {
        if self.is_usable() {
            self
        } else {
            warn!(policy = ?self, "invalid transit split weights, using even split");
            TransitSplitPolicy::default()
        }
    }

    /// (bucket, share of quantity) for each transit bucket
    pub fn split(&self, quantity: f64) -> [(OriginBucket, f64); 3] {
        let policy = if self.is_usable() {
            *self
        } else {
            TransitSplitPolicy::default()
        };
        let sum = policy.sp + policy.es + policy.rj;
        [
            (OriginBucket::TransitoSp, quantity * policy.sp / sum),
            (OriginBucket::TransitoEs, quantity * policy.es / sum),
            (OriginBucket::TransitoRj, quantity * policy.rj / sum),
        ]
    }
}

/// Transit bucket for an origin label: "SP", then "ES", then "RJ" (substring, case-sensitive)
pub fn resolve_transit_origin(origin: &str) -> Option<OriginBucket> {
    if origin.contains("SP") {
        Some(OriginBucket::TransitoSp)
    } else if origin.contains("ES") {
        Some(OriginBucket::TransitoEs)
    } else if origin.contains("RJ") {
        Some(OriginBucket::TransitoRj)
    } else {
        None
    }
}

/// Bucket for a store row: CD SP / CD ES / stores, None for other "CD " rows
pub fn resolve_store_bucket(store_name: &str) -> Option<OriginBucket> {
    match store_name {
        CD_SP_STORE_NAME => Some(OriginBucket::CdSp),
        CD_ES_STORE_NAME => Some(OriginBucket::CdEs),
        name if is_cd_store_name(name) => None,
        _ => Some(OriginBucket::Lojas),
    }
}

/// "CD " prefix, ASCII case-insensitive
pub fn is_cd_store_name(store_name: &str) -> bool {
    store_name
        .get(..CD_PREFIX.len())
        .map(|p| p.eq_ignore_ascii_case(CD_PREFIX))
        .unwrap_or(false)
}

// ==========================================
// TotalsEngine
// ==========================================

/// Rows of one cycle
pub struct TotalsInput<'a> {
    pub store_rows: &'a [StoreCount],
    pub sector_rows: &'a [SectorCount],
    /// Transit grouped by (origin, raw box type)
    pub transit: &'a [GroupedQuantity],
    /// Supplier records grouped by (supplier type, raw box type)
    pub supplier: &'a [GroupedQuantity],
}

#[derive(Debug, Clone, Default)]
pub struct TotalsEngine {
    split_policy: TransitSplitPolicy,
}

impl TotalsEngine {
    pub fn new(split_policy: TransitSplitPolicy) -> Self {
        Self {
            split_policy: split_policy.validated(),
        }
    }

    pub fn split_policy(&self) -> TransitSplitPolicy {
        self.split_policy
    }

    pub fn compute(&self, cycle_id: &str, input: &TotalsInput<'_>) -> TotalsBundle {
        let mut totals = TotalsBundle::empty(cycle_id);

        // Stores and CD SP / CD ES
        for row in input.store_rows {
            match resolve_store_bucket(&row.store_name) {
                Some(bucket) => {
                    for (box_type, quantity) in row.counts.iter() {
                        totals.add(bucket, box_type, quantity as f64);
                    }
                }
                None => debug!(store = %row.store_name, "CD store row outside CD SP / CD ES, not counted"),
            }
        }

        // CD RJ = every sector row
        for row in input.sector_rows {
            for (box_type, quantity) in row.counts.iter() {
                totals.add(OriginBucket::CdRj, box_type, quantity as f64);
            }
        }

        // Transit
        for group in input.transit {
            let box_type = self.normalize_into(&mut totals, &group.box_type_raw);
            let quantity = group.quantity as f64;
            match resolve_transit_origin(&group.label) {
                Some(bucket) => totals.add(bucket, box_type, quantity),
                None => {
                    debug!(origin = %group.label, quantity, "transit origin names no CD, splitting");
                    for (bucket, share) in self.split_policy.split(quantity) {
                        totals.add(bucket, box_type, share);
                    }
                }
            }
        }

        // Supplier
        for group in input.supplier {
            let box_type = self.normalize_into(&mut totals, &group.box_type_raw);
            totals.add(OriginBucket::Fornecedor, box_type, group.quantity as f64);
        }

        totals
    }

    fn normalize_into(&self, totals: &mut TotalsBundle, raw_label: &str) -> BoxType {
        let n = normalize_detailed(raw_label);
        if n.fell_back && !totals.coerced_labels.iter().any(|l| l == raw_label) {
            totals.coerced_labels.push(raw_label.to_string());
        }
        n.box_type
    }
}
