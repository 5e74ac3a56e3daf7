// ==========================================
// Asset inventory - domain type definitions
// ==========================================
// Closed sets: canonical box types, origin buckets, statuses
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Canonical box type
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoxType {
    #[serde(rename = "hb_623")]
    Hb623,
    #[serde(rename = "hb_618")]
    Hb618,
    #[serde(rename = "hnt_g")]
    HntG,
    #[serde(rename = "hnt_p")]
    HntP,
    #[serde(rename = "chocolate")]
    Chocolate,
    #[serde(rename = "bin")]
    Bin,
    #[serde(rename = "pallets_pbr")]
    PalletsPbr,
}

impl BoxType {
    /// Fixed order used for every per-type array in the crate
    pub const ALL: [BoxType; 7] = [
        BoxType::Hb623,
        BoxType::Hb618,
        BoxType::HntG,
        BoxType::HntP,
        BoxType::Chocolate,
        BoxType::Bin,
        BoxType::PalletsPbr,
    ];

    pub const COUNT: usize = 7;

    /// Position in `ALL`
    pub fn index(self) -> usize {
        match self {
            BoxType::Hb623 => 0,
            BoxType::Hb618 => 1,
            BoxType::HntG => 2,
            BoxType::HntP => 3,
            BoxType::Chocolate => 4,
            BoxType::Bin => 5,
            BoxType::PalletsPbr => 6,
        }
    }

    /// Canonical label (`hb_623`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            BoxType::Hb623 => "hb_623",
            BoxType::Hb618 => "hb_618",
            BoxType::HntG => "hnt_g",
            BoxType::HntP => "hnt_p",
            BoxType::Chocolate => "chocolate",
            BoxType::Bin => "bin",
            BoxType::PalletsPbr => "pallets_pbr",
        }
    }

    /// Quantity column in store_count / sector_count (also the CSV header)
    pub fn column(self) -> &'static str {
        match self {
            BoxType::Hb623 => "caixa_hb_623",
            BoxType::Hb618 => "caixa_hb_618",
            BoxType::HntG => "caixa_hnt_g",
            BoxType::HntP => "caixa_hnt_p",
            BoxType::Chocolate => "caixa_chocolate",
            BoxType::Bin => "caixa_bin",
            BoxType::PalletsPbr => "pallets_pbr",
        }
    }

    /// Exact canonical label lookup (no normalization)
    pub fn from_canonical(label: &str) -> Option<BoxType> {
        BoxType::ALL.iter().copied().find(|t| t.as_str() == label)
    }
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Origin bucket
// ==========================================
// 3 physical CDs, stores, 3 transit streams, supplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginBucket {
    CdSp,
    CdEs,
    CdRj,
    Lojas,
    TransitoSp,
    TransitoEs,
    TransitoRj,
    Fornecedor,
}

impl OriginBucket {
    pub const ALL: [OriginBucket; 8] = [
        OriginBucket::CdSp,
        OriginBucket::CdEs,
        OriginBucket::CdRj,
        OriginBucket::Lojas,
        OriginBucket::TransitoSp,
        OriginBucket::TransitoEs,
        OriginBucket::TransitoRj,
        OriginBucket::Fornecedor,
    ];

    pub const COUNT: usize = 8;

    pub const CD: [OriginBucket; 3] = [OriginBucket::CdSp, OriginBucket::CdEs, OriginBucket::CdRj];

    pub const TRANSIT: [OriginBucket; 3] = [
        OriginBucket::TransitoSp,
        OriginBucket::TransitoEs,
        OriginBucket::TransitoRj,
    ];

    pub fn index(self) -> usize {
        match self {
            OriginBucket::CdSp => 0,
            OriginBucket::CdEs => 1,
            OriginBucket::CdRj => 2,
            OriginBucket::Lojas => 3,
            OriginBucket::TransitoSp => 4,
            OriginBucket::TransitoEs => 5,
            OriginBucket::TransitoRj => 6,
            OriginBucket::Fornecedor => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OriginBucket::CdSp => "cd_sp",
            OriginBucket::CdEs => "cd_es",
            OriginBucket::CdRj => "cd_rj",
            OriginBucket::Lojas => "lojas",
            OriginBucket::TransitoSp => "transito_sp",
            OriginBucket::TransitoEs => "transito_es",
            OriginBucket::TransitoRj => "transito_rj",
            OriginBucket::Fornecedor => "fornecedor",
        }
    }
}

impl fmt::Display for OriginBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Cycle status
// ==========================================
// in_progress -> finalized, never back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    InProgress,
    Finalized,
}

impl CycleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleStatus::InProgress => "in_progress",
            CycleStatus::Finalized => "finalized",
        }
    }

    /// Parse a stored value; legacy Portuguese values are accepted
    pub fn parse(value: &str) -> Option<CycleStatus> {
        match value.trim().to_lowercase().as_str() {
            "in_progress" | "em_andamento" => Some(CycleStatus::InProgress),
            "finalized" | "finalizado" => Some(CycleStatus::Finalized),
            _ => None,
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Count row status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStatus {
    Pending,
    Finalized,
}

impl CountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CountStatus::Pending => "pending",
            CountStatus::Finalized => "finalized",
        }
    }

    pub fn parse(value: &str) -> Option<CountStatus> {
        match value.trim().to_lowercase().as_str() {
            "pending" | "pendente" => Some(CountStatus::Pending),
            "finalized" | "finalizado" => Some(CountStatus::Finalized),
            _ => None,
        }
    }

    pub fn is_finalized(self) -> bool {
        self == CountStatus::Finalized
    }
}

impl fmt::Display for CountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supplier types offered for manual supplier entry; free text is also accepted
pub const SUPPLIER_TYPES: [&str; 4] = ["FORNECEDOR RJ", "FORNECEDOR SP", "FORNECEDOR ES", "Outro"];

/// Region label used when a store has none
pub const NO_REGION: &str = "No Region";

/// Default sector label on store rows
pub const DEFAULT_SECTOR_LABEL: &str = "General";

/// User recorded on rows created by the system itself
pub const SYSTEM_USER: &str = "sistema";
