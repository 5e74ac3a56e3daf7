// ==========================================
// Asset inventory - cycle and fact entities
// ==========================================
// One metadata record per cycle, four fact tables keyed by cycle id,
// plus the read-only reference lists
// ==========================================

use crate::domain::types::{BoxType, CountStatus, CycleStatus};
use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Storage format for every timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cycle id format (`INV-YYYYMMDD-HHMMSS`)
pub const CYCLE_ID_FORMAT: &str = "INV-%Y%m%d-%H%M%S";

// ==========================================
// BoxCounts - one integer per canonical box type
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxCounts([i64; BoxType::COUNT]);

impl BoxCounts {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, box_type: BoxType) -> i64 {
        self.0[box_type.index()]
    }

    pub fn set(&mut self, box_type: BoxType, quantity: i64) {
        self.0[box_type.index()] = quantity;
    }

    pub fn add(&mut self, box_type: BoxType, quantity: i64) {
        self.0[box_type.index()] += quantity;
    }

    pub fn with(mut self, box_type: BoxType, quantity: i64) -> Self {
        self.set(box_type, quantity);
        self
    }

    pub fn total(&self) -> i64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoxType, i64)> + '_ {
        BoxType::ALL.iter().map(move |t| (*t, self.get(*t)))
    }
}

// Serialized as {"caixa_hb_623": n, ...} so detail rows keep the column names
impl Serialize for BoxCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BoxType::COUNT))?;
        for (box_type, quantity) in self.iter() {
            map.serialize_entry(box_type.column(), &quantity)?;
        }
        map.end()
    }
}

// ==========================================
// InventoryCycle
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryCycle {
    pub cycle_id: String,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    pub status: CycleStatus,
    pub description: String,
}

impl InventoryCycle {
    /// New in-progress cycle whose id is derived from `started_at`
    pub fn start(started_at: NaiveDateTime, description: &str) -> Self {
        Self {
            cycle_id: started_at.format(CYCLE_ID_FORMAT).to_string(),
            started_at,
            ended_at: None,
            status: CycleStatus::InProgress,
            description: description.to_string(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.status == CycleStatus::Finalized
    }
}

// ==========================================
// StoreCount
// ==========================================
// Unique per (cycle_id, store_name). "CD SP" / "CD ES" live here too.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreCount {
    pub cycle_id: String,
    pub store_name: String,
    pub region: String,
    pub sector_label: String,
    pub counts: BoxCounts,
    pub status: CountStatus,
    pub user_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl StoreCount {
    pub fn is_finalized(&self) -> bool {
        self.status.is_finalized()
    }
}

// ==========================================
// SectorCount (CD internal sectors)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorCount {
    pub cycle_id: String,
    pub sector_name: String,
    pub counts: BoxCounts,
    pub status: CountStatus,
    pub user_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SectorCount {
    pub fn is_finalized(&self) -> bool {
        self.status.is_finalized()
    }
}

// ==========================================
// Append-only movements
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitRecord {
    pub id: Option<i64>,
    pub cycle_id: String,
    /// Free text, expected to contain "SP" / "ES" / "RJ"
    pub origin: String,
    /// Raw label as entered; normalized at query time
    pub box_type_raw: String,
    pub quantity: i64,
    pub user_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierRecord {
    pub id: Option<i64>,
    pub cycle_id: String,
    pub supplier_type: String,
    pub box_type_raw: String,
    pub quantity: i64,
    pub created_at: NaiveDateTime,
}

/// Movement quantity summed per (label, raw box type)
///
/// `label` is the transit origin or the supplier type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedQuantity {
    pub label: String,
    pub box_type_raw: String,
    pub quantity: i64,
}

// ==========================================
// Reference data (read-only, not persisted)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceStore {
    pub name: String,
    pub region: String,
}

impl ReferenceStore {
    pub fn new(name: &str, region: &str) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSector {
    pub name: String,
    pub description: String,
}

impl ReferenceSector {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

// ==========================================
// Persistence-side summaries
// ==========================================

/// Row counts for one cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleSummary {
    pub cycle_id: String,
    pub store_rows: i64,
    pub stores_finalized: i64,
    pub sector_rows: i64,
    pub sectors_finalized: i64,
    pub transit_rows: i64,
    pub supplier_rows: i64,
}

/// Persisted store rows grouped by region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTally {
    pub region: String,
    pub total: i64,
    pub finalized: i64,
}

/// One import run recorded for auditing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub cycle_id: String,
    pub source: String,
    pub file_path: String,
    pub row_count: i64,
    pub imported_by: String,
    pub imported_at: NaiveDateTime,
}
