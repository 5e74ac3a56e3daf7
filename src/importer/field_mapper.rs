// ==========================================
// Asset inventory - field mapper
// ==========================================
// Raw record (header -> value) -> typed fact rows
// Headers: loja, regional, setor, descricao, data, caixa_*, pallets_pbr,
//          status, usuario, tipo_caixa, quantidade
// ==========================================

use crate::domain::inventory::{BoxCounts, SectorCount, StoreCount, TransitRecord};
use crate::domain::types::{BoxType, CountStatus, DEFAULT_SECTOR_LABEL};
use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::warn;

/// Integer coercion for quantities
///
/// Empty -> 0; integers; decimals with no fractional part ("12.0").
/// Anything else -> None.
pub fn coerce_quantity(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        return Some(0);
    }
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

/// Values shared by every row of one import
pub struct MappingContext<'a> {
    pub cycle_id: &'a str,
    /// Used when the row has no `usuario`
    pub default_user: &'a str,
    pub now: NaiveDateTime,
    /// store name -> region, from reference data
    pub regions: &'a HashMap<String, String>,
}

pub struct FieldMapper;

impl FieldMapper {
    fn get_string(&self, row: &HashMap<String, String>, field: &str) -> String {
        row.get(field).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    fn parse_quantity(
        &self,
        row: &HashMap<String, String>,
        field: &str,
        row_number: usize,
    ) -> ImportResult<i64> {
        let raw = self.get_string(row, field);
        coerce_quantity(&raw).ok_or_else(|| ImportError::TypeConversionError {
            row: row_number,
            field: field.to_string(),
            message: format!("'{}' is not an integer quantity", raw),
        })
    }

    fn parse_counts(&self, row: &HashMap<String, String>, row_number: usize) -> ImportResult<BoxCounts> {
        let mut counts = BoxCounts::zero();
        for box_type in BoxType::ALL {
            counts.set(box_type, self.parse_quantity(row, box_type.column(), row_number)?);
        }
        Ok(counts)
    }

    /// Missing status means the count is done
    fn parse_status(&self, row: &HashMap<String, String>, row_number: usize) -> CountStatus {
        let raw = self.get_string(row, "status");
        if raw.is_empty() {
            return CountStatus::Finalized;
        }
        CountStatus::parse(&raw).unwrap_or_else(|| {
            warn!(row = row_number, status = %raw, "unknown count status, treated as finalized");
            CountStatus::Finalized
        })
    }

    fn user(&self, row: &HashMap<String, String>, ctx: &MappingContext<'_>) -> String {
        let user = self.get_string(row, "usuario");
        if user.is_empty() {
            ctx.default_user.to_string()
        } else {
            user
        }
    }

    /// `id` column when present, else the row number
    fn row_id(&self, row: &HashMap<String, String>, row_number: usize) -> String {
        let id = self.get_string(row, "id");
        if id.is_empty() {
            row_number.to_string()
        } else {
            id
        }
    }

    /// Store count row
    ///
    /// Name: `loja`, else `setor`, else `Loja ID:<id>`.
    /// Region: `regional`, else the reference region of the store.
    pub fn map_store_count(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
        ctx: &MappingContext<'_>,
    ) -> ImportResult<StoreCount> {
        let loja = self.get_string(row, "loja");
        let setor = self.get_string(row, "setor");
        // store files reuse `setor` for the store name; the label is always the default
        let store_name = if !loja.is_empty() {
            loja
        } else if !setor.is_empty() {
            setor
        } else {
            format!("Loja ID:{}", self.row_id(row, row_number))
        };
        let sector_label = DEFAULT_SECTOR_LABEL.to_string();

        let mut region = self.get_string(row, "regional");
        if region.is_empty() {
            region = ctx.regions.get(&store_name).cloned().unwrap_or_default();
        }

        Ok(StoreCount {
            cycle_id: ctx.cycle_id.to_string(),
            counts: self.parse_counts(row, row_number)?,
            status: self.parse_status(row, row_number),
            user_name: self.user(row, ctx),
            created_at: ctx.now,
            updated_at: ctx.now,
            store_name,
            region,
            sector_label,
        })
    }

    /// CD sector count row; name: `setor`, else `Setor ID:<id>`
    pub fn map_sector_count(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
        ctx: &MappingContext<'_>,
    ) -> ImportResult<SectorCount> {
        let mut sector_name = self.get_string(row, "setor");
        if sector_name.is_empty() {
            sector_name = format!("Setor ID:{}", self.row_id(row, row_number));
        }

        Ok(SectorCount {
            cycle_id: ctx.cycle_id.to_string(),
            sector_name,
            counts: self.parse_counts(row, row_number)?,
            status: self.parse_status(row, row_number),
            user_name: self.user(row, ctx),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    /// Transit row; None when `tipo_caixa` is empty
    pub fn map_transit(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
        ctx: &MappingContext<'_>,
    ) -> ImportResult<Option<TransitRecord>> {
        let box_type_raw = self.get_string(row, "tipo_caixa");
        if box_type_raw.is_empty() {
            return Ok(None);
        }

        Ok(Some(TransitRecord {
            id: None,
            cycle_id: ctx.cycle_id.to_string(),
            origin: self.get_string(row, "setor"),
            box_type_raw,
            quantity: self.parse_quantity(row, "quantidade", row_number)?,
            user_name: self.user(row, ctx),
            created_at: ctx.now,
            updated_at: ctx.now,
        }))
    }
}
