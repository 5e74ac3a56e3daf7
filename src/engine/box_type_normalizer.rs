// ==========================================
// Asset inventory - box type normalizer
// ==========================================
// raw label -> canonical BoxType. Total: never fails.
// Unknown labels become `bin`; the original label is logged.
// ==========================================

use crate::domain::types::BoxType;
use tracing::warn;

/// Result of normalizing one label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalization {
    pub box_type: BoxType,
    /// True when nothing matched and `bin` was used
    pub fell_back: bool,
}

/// Compact-key aliases (after prefix strip and underscore/space removal)
const ALIASES: &[(&str, BoxType)] = &[
    ("hb623", BoxType::Hb623),
    ("hb618", BoxType::Hb618),
    ("hntg", BoxType::HntG),
    ("hntp", BoxType::HntP),
    ("bin", BoxType::Bin),
    ("chocolate", BoxType::Chocolate),
    ("pallets", BoxType::PalletsPbr),
    ("palletes", BoxType::PalletsPbr),
    ("palletspbr", BoxType::PalletsPbr),
    ("pbr", BoxType::PalletsPbr),
];

/// lower-case, strip `caixa_` / `caixa `, drop underscores and spaces
fn compact_key(raw_label: &str) -> String {
    let lowered = raw_label.trim().to_lowercase();
    let stripped = lowered
        .strip_prefix("caixa_")
        .or_else(|| lowered.strip_prefix("caixa "))
        .unwrap_or(&lowered);
    stripped.chars().filter(|c| *c != '_' && *c != ' ').collect()
}

fn lookup(key: &str) -> Option<BoxType> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, box_type)| *box_type)
        .or_else(|| {
            BoxType::ALL
                .iter()
                .copied()
                .find(|t| t.as_str().replace('_', "") == key)
        })
}

/// Normalize a label and report whether the `bin` fallback was used
pub fn normalize_detailed(raw_label: &str) -> Normalization {
    match lookup(&compact_key(raw_label)) {
        Some(box_type) => Normalization {
            box_type,
            fell_back: false,
        },
        None => {
            warn!(
                original_label = %raw_label,
                coerced_to = %BoxType::Bin,
                "unrecognized box type label, counted as bin"
            );
            Normalization {
                box_type: BoxType::Bin,
                fell_back: true,
            }
        }
    }
}

/// Normalize a label to its canonical box type
pub fn normalize(raw_label: &str) -> BoxType {
    normalize_detailed(raw_label).box_type
}
