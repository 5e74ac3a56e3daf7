// ==========================================
// Asset inventory - report bundles
// ==========================================
// Output of the aggregation engines. Rust field names are English;
// serialized keys keep the labels the presentation layer reads
// (total_geral, porcentagem_lojas, diff_total, ...).
// ==========================================

use crate::domain::inventory::{GroupedQuantity, SectorCount, StoreCount};
use crate::domain::types::{BoxType, OriginBucket};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

// ==========================================
// BoxTally - one float per canonical box type
// ==========================================
// Floats because unattributed transit is split across buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxTally([f64; BoxType::COUNT]);

impl BoxTally {
    pub fn get(&self, box_type: BoxType) -> f64 {
        self.0[box_type.index()]
    }

    pub fn add(&mut self, box_type: BoxType, quantity: f64) {
        self.0[box_type.index()] += quantity;
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

// ==========================================
// TotalsBundle
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct TotalsBundle {
    pub cycle_id: String,
    cells: [BoxTally; OriginBucket::COUNT],
    /// Raw labels that were coerced to `bin`
    pub coerced_labels: Vec<String>,
}

impl TotalsBundle {
    /// All-zero bundle (every bucket x type present)
    pub fn empty(cycle_id: &str) -> Self {
        Self {
            cycle_id: cycle_id.to_string(),
            cells: [BoxTally::default(); OriginBucket::COUNT],
            coerced_labels: Vec::new(),
        }
    }

    pub fn add(&mut self, bucket: OriginBucket, box_type: BoxType, quantity: f64) {
        self.cells[bucket.index()].add(box_type, quantity);
    }

    pub fn value(&self, bucket: OriginBucket, box_type: BoxType) -> f64 {
        self.cells[bucket.index()].get(box_type)
    }

    pub fn bucket(&self, bucket: OriginBucket) -> &BoxTally {
        &self.cells[bucket.index()]
    }

    /// `total_<type>`
    pub fn total_for_type(&self, box_type: BoxType) -> f64 {
        self.cells.iter().map(|tally| tally.get(box_type)).sum()
    }

    /// `total_<bucket>`
    pub fn total_for_bucket(&self, bucket: OriginBucket) -> f64 {
        self.cells[bucket.index()].total()
    }

    /// `total_geral`
    pub fn grand_total(&self) -> f64 {
        self.cells.iter().map(BoxTally::total).sum()
    }

    pub fn cd_total(&self) -> f64 {
        OriginBucket::CD.iter().map(|b| self.total_for_bucket(*b)).sum()
    }

    pub fn transit_total(&self) -> f64 {
        OriginBucket::TRANSIT
            .iter()
            .map(|b| self.total_for_bucket(*b))
            .sum()
    }

    /// Flat view keyed the way the dashboard reads it
    ///
    /// `<bucket>_<type>`, `total_<type>`, `total_<bucket>`, `total_geral`
    pub fn to_flat_map(&self) -> BTreeMap<String, f64> {
        let mut flat = BTreeMap::new();
        for bucket in OriginBucket::ALL {
            for box_type in BoxType::ALL {
                flat.insert(
                    format!("{}_{}", bucket.as_str(), box_type.as_str()),
                    self.value(bucket, box_type),
                );
            }
            flat.insert(
                format!("total_{}", bucket.as_str()),
                self.total_for_bucket(bucket),
            );
        }
        for box_type in BoxType::ALL {
            flat.insert(
                format!("total_{}", box_type.as_str()),
                self.total_for_type(box_type),
            );
        }
        flat.insert("total_geral".to_string(), self.grand_total());
        flat
    }
}

impl Serialize for TotalsBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flat = self.to_flat_map();
        let mut map = serializer.serialize_map(Some(flat.len() + 2))?;
        map.serialize_entry("cod_inventario", &self.cycle_id)?;
        for (key, value) in &flat {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("coerced_labels", &self.coerced_labels)?;
        map.end()
    }
}

// ==========================================
// Regional status
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStatus {
    #[serde(rename = "regional")]
    pub region: String,
    #[serde(rename = "total_lojas")]
    pub total_stores: i64,
    #[serde(rename = "lojas_finalizadas")]
    pub finalized_stores: i64,
    #[serde(rename = "porcentagem")]
    pub percentage: f64,
    #[serde(rename = "lojas_pendentes")]
    pub pending_stores: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingSector {
    #[serde(rename = "setor")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBundle {
    #[serde(rename = "cod_inventario")]
    pub cycle_id: String,
    #[serde(rename = "total_lojas")]
    pub total_stores: i64,
    #[serde(rename = "lojas_finalizadas")]
    pub finalized_stores: i64,
    #[serde(rename = "lojas_pendentes")]
    pub pending_stores: i64,
    #[serde(rename = "porcentagem_lojas")]
    pub store_percentage: f64,
    #[serde(rename = "total_setores")]
    pub total_sectors: i64,
    #[serde(rename = "setores_finalizados")]
    pub finalized_sectors: i64,
    #[serde(rename = "setores_pendentes")]
    pub pending_sectors: i64,
    #[serde(rename = "porcentagem_setores")]
    pub sector_percentage: f64,
    #[serde(rename = "resumo_regional")]
    pub regions: Vec<RegionStatus>,
    #[serde(rename = "setores_pendentes_lista")]
    pub pending_sector_list: Vec<PendingSector>,
    /// True when persisted rows stood in for missing reference data
    #[serde(rename = "sem_referencia")]
    pub used_persisted_fallback: bool,
}

impl StatusBundle {
    pub fn empty(cycle_id: &str) -> Self {
        Self {
            cycle_id: cycle_id.to_string(),
            total_stores: 0,
            finalized_stores: 0,
            pending_stores: 0,
            store_percentage: 0.0,
            total_sectors: 0,
            finalized_sectors: 0,
            pending_sectors: 0,
            sector_percentage: 0.0,
            regions: Vec::new(),
            pending_sector_list: Vec::new(),
            used_persisted_fallback: false,
        }
    }

    pub fn region(&self, name: &str) -> Option<&RegionStatus> {
        self.regions.iter().find(|r| r.region == name)
    }
}

/// finalized / total * 100, 0 when total is 0
pub fn percentage(finalized: i64, total: i64) -> f64 {
    if total > 0 {
        finalized as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

// ==========================================
// Cross-cycle comparison
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonDiff {
    pub by_type: [f64; BoxType::COUNT],
    pub by_bucket: [f64; OriginBucket::COUNT],
    pub stores: f64,
    pub cd: f64,
    pub transit: f64,
    pub supplier: f64,
    pub total: f64,
}

impl ComparisonDiff {
    pub fn for_type(&self, box_type: BoxType) -> f64 {
        self.by_type[box_type.index()]
    }

    pub fn for_bucket(&self, bucket: OriginBucket) -> f64 {
        self.by_bucket[bucket.index()]
    }
}

impl Serialize for ComparisonDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for box_type in BoxType::ALL {
            map.serialize_entry(&format!("diff_{}", box_type.as_str()), &self.for_type(box_type))?;
        }
        for bucket in OriginBucket::CD.iter().chain(OriginBucket::TRANSIT.iter()) {
            map.serialize_entry(&format!("diff_{}", bucket.as_str()), &self.for_bucket(*bucket))?;
        }
        map.serialize_entry("diff_lojas", &self.stores)?;
        map.serialize_entry("diff_cd", &self.cd)?;
        map.serialize_entry("diff_transito", &self.transit)?;
        map.serialize_entry("diff_fornecedor", &self.supplier)?;
        map.serialize_entry("diff_total", &self.total)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonBundle {
    #[serde(rename = "atual")]
    pub current: TotalsBundle,
    #[serde(rename = "anterior")]
    pub previous: TotalsBundle,
    #[serde(rename = "diferencas")]
    pub diffs: ComparisonDiff,
}

// ==========================================
// History / dashboard
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    #[serde(rename = "cod_inventario")]
    pub cycle_id: String,
    #[serde(rename = "data_inicio")]
    pub started_at: String,
    #[serde(rename = "data_fim")]
    pub ended_at: Option<String>,
    #[serde(rename = "total_lojas")]
    pub total_stores: i64,
    #[serde(rename = "total_setores")]
    pub total_sectors: i64,
    #[serde(rename = "total_geral")]
    pub grand_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleMeta {
    #[serde(rename = "cod_inventario")]
    pub cycle_id: String,
    #[serde(rename = "data_inicio")]
    pub started_at: String,
    pub status: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "duracao")]
    pub duration: Option<String>,
    #[serde(rename = "data_fim")]
    pub ended_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardDetails {
    #[serde(rename = "lojas")]
    pub stores: Vec<StoreCount>,
    #[serde(rename = "cds")]
    pub sectors: Vec<SectorCount>,
    #[serde(rename = "transito")]
    pub transit: Vec<GroupedQuantity>,
    #[serde(rename = "fornecedor")]
    pub supplier: Vec<GroupedQuantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardBundle {
    pub meta: CycleMeta,
    #[serde(rename = "totais")]
    pub totals: TotalsBundle,
    pub status: StatusBundle,
    #[serde(rename = "comparacao")]
    pub comparison: Option<ComparisonBundle>,
    #[serde(rename = "detalhes")]
    pub details: DashboardDetails,
}

impl DashboardBundle {
    /// Renderable bundle with nothing in it
    pub fn empty(cycle_id: &str) -> Self {
        Self {
            meta: CycleMeta {
                cycle_id: cycle_id.to_string(),
                ..CycleMeta::default()
            },
            totals: TotalsBundle::empty(cycle_id),
            status: StatusBundle::empty(cycle_id),
            comparison: None,
            details: DashboardDetails::default(),
        }
    }
}
