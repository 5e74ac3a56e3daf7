// ==========================================
// Asset inventory - default file templates
// ==========================================
// Writes any missing reference/count file: sample reference lists,
// header-only count files. Existing files are never touched.
// ==========================================

use crate::config::DataPaths;
use crate::importer::error::{ImportError, ImportResult};
use csv::Writer;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const COUNT_COLUMNS: [&str; 9] = [
    "data",
    "caixa_hb_623",
    "caixa_hb_618",
    "caixa_hnt_g",
    "caixa_hnt_p",
    "caixa_chocolate",
    "caixa_bin",
    "pallets_pbr",
    "status",
];

const SAMPLE_STORES: [(&str, &str); 5] = [
    ("Loja 001", "Norte"),
    ("Loja 002", "Sul"),
    ("Loja 003", "Leste"),
    ("Loja 004", "Oeste"),
    ("Loja 005", "Centro"),
];

const SAMPLE_SECTORS: [(&str, &str); 4] = [
    ("Setor A", "Recebimento"),
    ("Setor B", "Expedição"),
    ("Setor C", "Estoque"),
    ("Setor D", "Picking"),
];

fn write_rows(path: &Path, header: &[&str], rows: &[Vec<&str>]) -> ImportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ImportError::FileWriteError(e.to_string()))?;
    }
    let mut writer = Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .map_err(|e| ImportError::FileWriteError(e.to_string()))?;
    Ok(())
}

/// Create the missing files; returns the paths written
pub fn create_default_templates(paths: &DataPaths) -> ImportResult<Vec<PathBuf>> {
    let mut created = Vec::new();

    if !paths.reference_stores.exists() {
        let rows: Vec<Vec<&str>> = SAMPLE_STORES.iter().map(|(l, r)| vec![*l, *r]).collect();
        write_rows(&paths.reference_stores, &["loja", "regional"], &rows)?;
        created.push(paths.reference_stores.clone());
    }

    if !paths.reference_sectors.exists() {
        let rows: Vec<Vec<&str>> = SAMPLE_SECTORS.iter().map(|(s, d)| vec![*s, *d]).collect();
        write_rows(&paths.reference_sectors, &["setor", "descricao"], &rows)?;
        created.push(paths.reference_sectors.clone());
    }

    if !paths.store_counts.exists() {
        let mut header = vec!["loja", "regional", "setor"];
        header.extend(COUNT_COLUMNS);
        header.push("usuario");
        write_rows(&paths.store_counts, &header, &[])?;
        created.push(paths.store_counts.clone());
    }

    if !paths.sector_counts.exists() {
        let mut header = vec!["setor"];
        header.extend(COUNT_COLUMNS);
        header.push("usuario");
        write_rows(&paths.sector_counts, &header, &[])?;
        created.push(paths.sector_counts.clone());
    }

    if !paths.transit.exists() {
        write_rows(
            &paths.transit,
            &["setor", "data", "tipo_caixa", "quantidade", "usuario"],
            &[],
        )?;
        created.push(paths.transit.clone());
    }

    if !created.is_empty() {
        info!(files = created.len(), "default templates created");
    }
    Ok(created)
}
