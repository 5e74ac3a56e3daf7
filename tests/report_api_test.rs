// ==========================================
// ReportApi integration tests
// ==========================================
// Totals, status, comparison, history and dashboard over a real SQLite file
// ==========================================


use asset_inventory::domain::inventory::{ReferenceSector, ReferenceStore};
use asset_inventory::domain::types::{BoxType, OriginBucket};
use asset_inventory::engine::TransitSplitPolicy;
use asset_inventory::importer::StaticReferenceSource;
use test_helpers::{at, norte_reference, TestContext};

#[test]
fn test_unknown_transit_origin_is_split_evenly() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");

    ctx.inventory_api
        .add_transit_data(&cycle, "Unknown", "hb_623", "30")
        .unwrap();

    let totals = ctx.report_api.compute_totals(&cycle);
    assert_eq!(totals.value(OriginBucket::TransitoSp, BoxType::Hb623), 10.0);
    assert_eq!(totals.value(OriginBucket::TransitoEs, BoxType::Hb623), 10.0);
    assert_eq!(totals.value(OriginBucket::TransitoRj, BoxType::Hb623), 10.0);
    assert_eq!(totals.transit_total(), 30.0);
}

#[test]
fn test_configured_split_weights_apply() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    ctx.inventory_api
        .add_transit_data(&cycle, "Trânsito geral", "bin", "40")
        .unwrap();

    ctx.report_api.set_split_policy(TransitSplitPolicy {
        sp: 2.0,
        es: 1.0,
        rj: 1.0,
    });
    let totals = ctx.report_api.compute_totals(&cycle);
    assert_eq!(totals.value(OriginBucket::TransitoSp, BoxType::Bin), 20.0);
    assert_eq!(totals.value(OriginBucket::TransitoEs, BoxType::Bin), 10.0);
    assert_eq!(totals.value(OriginBucket::TransitoRj, BoxType::Bin), 10.0);
}

#[test]
fn test_supplier_label_is_normalized() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");

    ctx.inventory_api
        .add_supplier_data(&cycle, "FORNECEDOR RJ", "CAIXA HB_623", "10")
        .unwrap();

    let totals = ctx.report_api.compute_totals(&cycle);
    assert_eq!(totals.value(OriginBucket::Fornecedor, BoxType::Hb623), 10.0);
    assert_eq!(totals.total_for_bucket(OriginBucket::Fornecedor), 10.0);
    assert!(totals.coerced_labels.is_empty());
}

#[test]
fn test_manual_unknown_labels_are_kept_and_reported() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");

    let (supplier, box_type) = ctx
        .inventory_api
        .add_supplier_data(&cycle, "Outro", " mystery crate ", "4")
        .unwrap();
    assert_eq!(box_type, BoxType::Bin);
    assert_eq!(supplier.box_type_raw, "mystery crate");

    let (_, box_type) = ctx
        .inventory_api
        .add_transit_data(&cycle, "Trânsito RJ", "gaiola", "1")
        .unwrap();
    assert_eq!(box_type, BoxType::Bin);

    let stored = ctx.movement_repo.list_supplier(&cycle).unwrap();
    assert_eq!(stored[0].box_type_raw, "mystery crate");

    let totals = ctx.report_api.compute_totals(&cycle);
    assert_eq!(totals.value(OriginBucket::Fornecedor, BoxType::Bin), 4.0);
    assert_eq!(totals.value(OriginBucket::TransitoRj, BoxType::Bin), 1.0);
    assert!(totals.coerced_labels.contains(&"mystery crate".to_string()));
    assert!(totals.coerced_labels.contains(&"gaiola".to_string()));
}

#[test]
fn test_totals_identities_across_all_sources() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    let now = at("2026-05-01 09:00:00");

    // CD SP / CD ES live in store_count
    ctx.count_repo
        .add_store_quantity(&cycle, "CD SP", "", BoxType::Hb618, 7, true, "ana", now)
        .unwrap();
    ctx.count_repo
        .add_store_quantity(&cycle, "CD ES", "", BoxType::PalletsPbr, 3, true, "ana", now)
        .unwrap();
    ctx.inventory_api
        .add_manual_count(&cycle, "Loja 1", "hb_623", 5, false, "ana")
        .unwrap();
    // any "CD " location entered by hand is a CD sector
    ctx.inventory_api
        .add_manual_count(&cycle, "CD RJ Doca 1", "hnt_g", 4, true, "ana")
        .unwrap();
    ctx.inventory_api
        .add_transit_data(&cycle, "Trânsito SP", "HNT P", "6")
        .unwrap();
    ctx.inventory_api
        .add_supplier_data(&cycle, "Outro", "misterio", "2")
        .unwrap();

    let totals = ctx.report_api.compute_totals(&cycle);
    assert_eq!(totals.value(OriginBucket::CdSp, BoxType::Hb618), 7.0);
    assert_eq!(totals.value(OriginBucket::CdEs, BoxType::PalletsPbr), 3.0);
    assert_eq!(totals.value(OriginBucket::Lojas, BoxType::Hb623), 5.0);
    assert_eq!(totals.value(OriginBucket::CdRj, BoxType::HntG), 4.0);
    assert_eq!(totals.value(OriginBucket::TransitoSp, BoxType::HntP), 6.0);
    // unknown labels are counted as bin and reported
    assert_eq!(totals.value(OriginBucket::Fornecedor, BoxType::Bin), 2.0);
    assert_eq!(totals.coerced_labels, vec!["misterio".to_string()]);

    let by_bucket: f64 = OriginBucket::ALL
        .iter()
        .map(|b| totals.total_for_bucket(*b))
        .sum();
    let by_type: f64 = BoxType::ALL.iter().map(|t| totals.total_for_type(*t)).sum();
    assert_eq!(totals.grand_total(), 27.0);
    assert_eq!(by_bucket, totals.grand_total());
    assert_eq!(by_type, totals.grand_total());

    let flat = totals.to_flat_map();
    assert_eq!(flat["total_geral"], 27.0);
    assert_eq!(flat["cd_sp_hb_618"], 7.0);
    assert_eq!(flat.len(), 8 * 7 + 8 + 7 + 1);
}

#[test]
fn test_missing_or_unknown_cycle_gives_zero_bundles() {
    let ctx = TestContext::new(norte_reference());

    let empty = ctx.report_api.compute_totals("");
    assert_eq!(empty.grand_total(), 0.0);
    assert_eq!(empty.to_flat_map().len(), 72);

    let unknown = ctx.report_api.compute_totals("INV-19990101-000000");
    assert_eq!(unknown.grand_total(), 0.0);

    let status = ctx.report_api.compute_status("");
    assert_eq!(status.total_stores, 0);
    assert_eq!(status.store_percentage, 0.0);

    // reference lists do not leak into a cycle that was never started
    let status = ctx.report_api.compute_status("INV-19990101-000000");
    assert_eq!(status.total_stores, 0);
    assert_eq!(status.pending_stores, 0);
    assert_eq!(status.total_sectors, 0);
    assert!(status.regions.is_empty());
    assert!(status.pending_sector_list.is_empty());

    let dashboard = ctx.report_api.dashboard_bundle("");
    assert!(dashboard.comparison.is_none());
    assert!(dashboard.details.stores.is_empty());
}

#[test]
fn test_norte_region_status_counts_unfinished_rows_as_pending() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");

    ctx.inventory_api
        .add_manual_count(&cycle, "Loja 1", "hb_623", 5, false, "ana")
        .unwrap();

    let status = ctx.report_api.compute_status(&cycle);
    let norte = status.region("Norte").expect("Norte region");
    assert_eq!(norte.total_stores, 2);
    assert_eq!(norte.finalized_stores, 0);
    assert_eq!(norte.percentage, 0.0);
    assert_eq!(norte.pending_stores, vec!["Loja 1".to_string(), "Loja 2".to_string()]);
    assert!(!status.used_persisted_fallback);

    // the stored row picked its region up from the reference list
    let row = ctx.count_repo.find_store_count(&cycle, "Loja 1").unwrap().unwrap();
    assert_eq!(row.region, "Norte");
}

#[test]
fn test_status_sorting_and_sector_pending_list() {
    let reference = StaticReferenceSource::new(
        vec![
            ReferenceStore::new("Loja 1", "Norte"),
            ReferenceStore::new("Loja 2", "Norte"),
            ReferenceStore::new("Loja 3", "Sul"),
            ReferenceStore::new("Loja 4", ""),
        ],
        vec![
            ReferenceSector::new("Setor A", "Recebimento"),
            ReferenceSector::new("Setor B", "Expedição"),
        ],
    );
    let ctx = TestContext::new(reference);
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");

    ctx.inventory_api
        .add_manual_count(&cycle, "Loja 3", "bin", 1, true, "ana")
        .unwrap();
    ctx.inventory_api
        .add_manual_count(&cycle, "Loja 1", "bin", 1, true, "ana")
        .unwrap();
    ctx.inventory_api
        .add_manual_count(&cycle, "CD Setor A", "bin", 1, true, "ana")
        .unwrap();

    let status = ctx.report_api.compute_status(&cycle);
    let order: Vec<&str> = status.regions.iter().map(|r| r.region.as_str()).collect();
    assert_eq!(order, vec!["Sul", "Norte", "No Region"]);
    assert_eq!(status.total_stores, 4);
    assert_eq!(status.finalized_stores, 2);
    assert_eq!(status.store_percentage, 50.0);

    // "CD Setor A" is not a reference sector name, so both stay pending
    assert_eq!(status.total_sectors, 2);
    assert_eq!(status.pending_sectors, 2);
    assert_eq!(status.sector_percentage, 0.0);
}

#[test]
fn test_repeated_reference_store_is_one_store() {
    let reference = StaticReferenceSource::new(
        vec![
            ReferenceStore::new("Loja 1", "Norte"),
            ReferenceStore::new("Loja 2", "Norte"),
            ReferenceStore::new("Loja 2", "Sul"),
        ],
        vec![],
    );
    let ctx = TestContext::new(reference);
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");

    let filled = ctx.inventory_api.fill_missing_from_reference(&cycle).unwrap();
    assert_eq!(filled.stores_created, 2);
    ctx.inventory_api
        .add_manual_count(&cycle, "Loja 2", "bin", 1, true, "ana")
        .unwrap();

    let loja2 = ctx.count_repo.find_store_count(&cycle, "Loja 2").unwrap().unwrap();
    assert_eq!(loja2.region, "Norte");

    let status = ctx.report_api.compute_status(&cycle);
    assert_eq!(status.total_stores, 2);
    assert_eq!(status.finalized_stores, 1);
    assert_eq!(status.store_percentage, 50.0);
    assert!(status.region("Sul").is_none());
    assert_eq!(status.region("Norte").unwrap().pending_stores, vec!["Loja 1".to_string()]);
}

#[test]
fn test_blank_regions_share_one_group_without_reference() {
    let ctx = TestContext::new(StaticReferenceSource::default());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    let now = at("2026-05-01 09:00:00");

    ctx.count_repo
        .add_store_quantity(&cycle, "Loja 1", "", BoxType::Bin, 1, true, "ana", now)
        .unwrap();
    ctx.count_repo
        .add_store_quantity(&cycle, "Loja 2", " ", BoxType::Bin, 1, false, "ana", now)
        .unwrap();

    let status = ctx.report_api.compute_status(&cycle);
    assert_eq!(status.regions.len(), 1);
    let none = status.region("No Region").unwrap();
    assert_eq!(none.total_stores, 2);
    assert_eq!(none.finalized_stores, 1);
    assert_eq!(none.pending_stores, vec!["Loja 2".to_string()]);
}

#[test]
fn test_status_falls_back_to_persisted_rows_without_reference() {
    let ctx = TestContext::new(StaticReferenceSource::default());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    let now = at("2026-05-01 09:00:00");

    ctx.count_repo
        .add_store_quantity(&cycle, "Loja 1", "Norte", BoxType::Bin, 1, true, "ana", now)
        .unwrap();
    ctx.count_repo
        .add_store_quantity(&cycle, "Loja 2", "Norte", BoxType::Bin, 1, false, "ana", now)
        .unwrap();
    ctx.count_repo
        .add_sector_quantity(&cycle, "Setor A", BoxType::Bin, 1, false, "ana", now)
        .unwrap();

    let status = ctx.report_api.compute_status(&cycle);
    assert!(status.used_persisted_fallback);
    let norte = status.region("Norte").unwrap();
    assert_eq!(norte.total_stores, 2);
    assert_eq!(norte.finalized_stores, 1);
    assert_eq!(norte.percentage, 50.0);
    assert_eq!(norte.pending_stores, vec!["Loja 2".to_string()]);
    assert_eq!(status.total_sectors, 1);
    assert_eq!(status.pending_sector_list[0].name, "Setor A");
}

#[test]
fn test_compare_is_antisymmetric() {
    let ctx = TestContext::new(norte_reference());
    let first = ctx.start_cycle("2026-04-01 08:00:00");
    let second = ctx.start_cycle("2026-05-01 08:00:00");

    ctx.inventory_api
        .add_manual_count(&first, "Loja 1", "hb_623", 10, true, "ana")
        .unwrap();
    ctx.inventory_api
        .add_manual_count(&second, "Loja 1", "hb_623", 4, true, "ana")
        .unwrap();
    ctx.inventory_api
        .add_transit_data(&second, "Trânsito RJ", "bin", "6")
        .unwrap();

    let forward = ctx.report_api.compare(&second, &first);
    let backward = ctx.report_api.compare(&first, &second);

    assert_eq!(forward.diffs.for_type(BoxType::Hb623), -6.0);
    assert_eq!(forward.diffs.stores, -6.0);
    assert_eq!(forward.diffs.transit, 6.0);
    assert_eq!(forward.diffs.total, 0.0);
    for box_type in BoxType::ALL {
        assert_eq!(forward.diffs.for_type(box_type), -backward.diffs.for_type(box_type));
    }
    for bucket in OriginBucket::ALL {
        assert_eq!(forward.diffs.for_bucket(bucket), -backward.diffs.for_bucket(bucket));
    }
}

#[test]
fn test_history_lists_finalized_cycles_newest_first() {
    let ctx = TestContext::new(norte_reference());
    let first = ctx.start_cycle("2026-03-01 08:00:00");
    let second = ctx.start_cycle("2026-04-01 08:00:00");
    let _open = ctx.start_cycle("2026-05-01 08:00:00");

    ctx.inventory_api
        .add_manual_count(&first, "Loja 1", "bin", 3, true, "ana")
        .unwrap();
    ctx.inventory_api
        .finalize_at(&first, at("2026-03-05 18:00:00"))
        .unwrap();
    ctx.inventory_api
        .finalize_at(&second, at("2026-04-03 12:00:00"))
        .unwrap();

    let history = ctx.report_api.history_summaries(10);
    let ids: Vec<&str> = history.iter().map(|h| h.cycle_id.as_str()).collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    assert_eq!(history[1].total_stores, 1);
    assert_eq!(history[1].grand_total, 3.0);
    assert_eq!(history[1].started_at, "01/03/2026");
    assert_eq!(history[1].ended_at.as_deref(), Some("05/03/2026"));

    assert_eq!(ctx.report_api.history_summaries(1).len(), 1);
}

#[test]
fn test_dashboard_compares_with_previous_finalized_cycle() {
    let ctx = TestContext::new(norte_reference());
    let older = ctx.start_cycle("2026-03-01 08:00:00");
    let previous = ctx.start_cycle("2026-04-01 08:00:00");
    let current = ctx.start_cycle("2026-05-01 08:00:00");

    ctx.inventory_api
        .add_manual_count(&older, "Loja 1", "bin", 50, true, "ana")
        .unwrap();
    ctx.inventory_api
        .add_manual_count(&previous, "Loja 1", "bin", 8, true, "ana")
        .unwrap();
    ctx.inventory_api
        .add_manual_count(&current, "Loja 1", "bin", 10, true, "ana")
        .unwrap();
    ctx.inventory_api
        .finalize_at(&older, at("2026-03-02 08:00:00"))
        .unwrap();
    ctx.inventory_api
        .finalize_at(&previous, at("2026-04-03 10:30:00"))
        .unwrap();

    let dashboard = ctx.report_api.dashboard_bundle(&current);
    assert_eq!(dashboard.meta.cycle_id, current);
    assert_eq!(dashboard.meta.status, "in_progress");
    assert_eq!(dashboard.meta.started_at, "01/05/2026 08:00");
    assert!(dashboard.meta.duration.is_none());

    let comparison = dashboard.comparison.expect("comparison with previous cycle");
    assert_eq!(comparison.previous.cycle_id, previous);
    assert_eq!(comparison.diffs.total, 2.0);
    assert_eq!(dashboard.details.stores.len(), 1);
    assert_eq!(dashboard.totals.grand_total(), 10.0);

    // a finalized cycle is never compared with itself
    let previous_dashboard = ctx.report_api.dashboard_bundle(&previous);
    assert_eq!(previous_dashboard.meta.duration.as_deref(), Some("2 days, 2h 30m"));
    assert_eq!(
        previous_dashboard.comparison.map(|c| c.previous.cycle_id),
        Some(older.clone())
    );
    assert!(ctx.report_api.dashboard_bundle(&older).comparison.is_none());
}

#[test]
fn test_dashboard_serializes_with_presentation_keys() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    ctx.inventory_api
        .add_supplier_data(&cycle, "FORNECEDOR SP", "pallets", "4")
        .unwrap();

    let json = serde_json::to_value(ctx.report_api.dashboard_bundle(&cycle)).unwrap();
    assert_eq!(json["meta"]["cod_inventario"], cycle.as_str());
    assert_eq!(json["totais"]["fornecedor_pallets_pbr"], 4.0);
    assert_eq!(json["totais"]["total_geral"], 4.0);
    assert_eq!(json["status"]["resumo_regional"][0]["regional"], "Norte");
    assert!(json["comparacao"].is_null());
    assert_eq!(json["detalhes"]["fornecedor"][0]["quantity"], 4);
}
