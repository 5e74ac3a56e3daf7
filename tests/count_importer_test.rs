// ==========================================
// Count import integration tests
// ==========================================
// CSV count files -> store / sector / transit rows through import_all
// ==========================================


use asset_inventory::domain::types::{BoxType, CountStatus, OriginBucket};
use asset_inventory::importer::ImportSource;
use test_helpers::{norte_reference, write_csv, TestContext};

const STORE_HEADER: &str =
    "loja,regional,caixa_hb_623,caixa_hb_618,caixa_hnt_g,caixa_hnt_p,caixa_chocolate,caixa_bin,pallets_pbr,status,usuario";

fn write_all_sources(ctx: &TestContext) {
    write_csv(
        &ctx.paths.store_counts,
        &[
            STORE_HEADER,
            "Loja 1,,5,0,0,0,0,0,0,finalizado,ana",
            "Loja 2,,2,1,0,0,0,0,0,pendente,",
            "CD SP,,0,0,0,0,0,4,0,,",
        ],
    );
    write_csv(
        &ctx.paths.sector_counts,
        &[
            "setor,caixa_hb_623,caixa_bin,status",
            "Setor A,3,1,finalizado",
            "Setor B,0,2.0,pendente",
        ],
    );
    write_csv(
        &ctx.paths.transit,
        &[
            "setor,tipo_caixa,quantidade",
            "Trânsito SP,CAIXA HB_623,6",
            "Trânsito ES,hnt p,2",
            ",,",
        ],
    );
}

#[test]
fn test_import_all_loads_every_source() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    write_all_sources(&ctx);

    let report = ctx.inventory_api.import_all(&cycle, "importer", false).unwrap();
    assert!(report.status, "{}", report.message);
    assert!(report.modified);
    assert_eq!(report.count, 3 + 2 + 2);
    assert_eq!(report.message, "7 records updated");
    assert_eq!(report.sources.len(), 3);

    let loja1 = ctx.count_repo.find_store_count(&cycle, "Loja 1").unwrap().unwrap();
    assert_eq!(loja1.counts.get(BoxType::Hb623), 5);
    assert_eq!(loja1.status, CountStatus::Finalized);
    assert_eq!(loja1.user_name, "ana");
    // region filled from the reference list
    assert_eq!(loja1.region, "Norte");

    let loja2 = ctx.count_repo.find_store_count(&cycle, "Loja 2").unwrap().unwrap();
    assert_eq!(loja2.status, CountStatus::Pending);
    assert_eq!(loja2.user_name, "importer");

    let setor_b = ctx.count_repo.find_sector_count(&cycle, "Setor B").unwrap().unwrap();
    assert_eq!(setor_b.counts.get(BoxType::Bin), 2);

    let totals = ctx.report_api.compute_totals(&cycle);
    assert_eq!(totals.value(OriginBucket::CdSp, BoxType::Bin), 4.0);
    assert_eq!(totals.value(OriginBucket::Lojas, BoxType::Hb623), 7.0);
    assert_eq!(totals.value(OriginBucket::CdRj, BoxType::Hb623), 3.0);
    assert_eq!(totals.value(OriginBucket::TransitoSp, BoxType::Hb623), 6.0);
    assert_eq!(totals.value(OriginBucket::TransitoEs, BoxType::HntP), 2.0);

    let batches = ctx.batch_repo.list_by_cycle(&cycle).unwrap();
    assert_eq!(batches.len(), 3);
    assert!(batches.iter().any(|b| b.source == ImportSource::Transit.as_str() && b.row_count == 2));
}

#[test]
fn test_unchanged_files_are_skipped() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    write_all_sources(&ctx);

    ctx.inventory_api.import_all(&cycle, "importer", false).unwrap();
    let again = ctx.inventory_api.import_all(&cycle, "importer", false).unwrap();

    assert!(again.status);
    assert!(!again.modified);
    assert_eq!(again.count, 0);
    assert_eq!(again.message, "no update needed");
    assert_eq!(ctx.batch_repo.list_by_cycle(&cycle).unwrap().len(), 3);
    assert_eq!(ctx.movement_repo.list_transit(&cycle).unwrap().len(), 2);
}

#[test]
fn test_forced_import_overwrites_counts_and_appends_transit() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    write_all_sources(&ctx);

    ctx.inventory_api.import_all(&cycle, "importer", false).unwrap();
    let forced = ctx.inventory_api.import_all(&cycle, "importer", true).unwrap();
    assert!(forced.modified);

    // counts are replaced, not added
    let loja1 = ctx.count_repo.find_store_count(&cycle, "Loja 1").unwrap().unwrap();
    assert_eq!(loja1.counts.get(BoxType::Hb623), 5);
    // transit rows accumulate
    assert_eq!(ctx.movement_repo.list_transit(&cycle).unwrap().len(), 4);
    assert_eq!(ctx.batch_repo.list_by_cycle(&cycle).unwrap().len(), 6);
}

#[test]
fn test_same_file_imports_into_each_cycle() {
    let ctx = TestContext::new(norte_reference());
    let first = ctx.start_cycle("2026-05-01 08:00:00");
    let second = ctx.start_cycle("2026-05-02 08:00:00");
    write_all_sources(&ctx);

    assert!(ctx.inventory_api.import_all(&first, "importer", false).unwrap().modified);
    assert!(ctx.inventory_api.import_all(&second, "importer", false).unwrap().modified);
    assert!(ctx.count_repo.find_store_count(&second, "Loja 2").unwrap().is_some());
}

#[test]
fn test_bad_quantity_writes_nothing_for_that_file() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    write_all_sources(&ctx);
    write_csv(
        &ctx.paths.store_counts,
        &[
            STORE_HEADER,
            "Loja 1,,5,0,0,0,0,0,0,finalizado,ana",
            "Loja 2,,2.5,0,0,0,0,0,0,pendente,",
        ],
    );

    let report = ctx.inventory_api.import_all(&cycle, "importer", false).unwrap();
    assert!(!report.status);
    assert!(report.message.starts_with("import errors: contagem_lojas"));

    let stores = report
        .sources
        .iter()
        .find(|s| s.source == ImportSource::StoreCounts)
        .unwrap();
    assert!(!stores.status);
    assert!(ctx.count_repo.list_store_counts(&cycle).unwrap().is_empty());

    // the other sources still went through
    assert!(report.modified);
    assert_eq!(ctx.count_repo.list_sector_counts(&cycle).unwrap().len(), 2);
}

#[test]
fn test_missing_file_fails_only_its_source() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    write_csv(
        &ctx.paths.sector_counts,
        &["setor,caixa_bin", "Setor A,1"],
    );

    let report = ctx.inventory_api.import_all(&cycle, "importer", false).unwrap();
    assert!(!report.status);
    assert_eq!(report.count, 1);

    let failed: Vec<ImportSource> = report
        .sources
        .iter()
        .filter(|s| !s.status)
        .map(|s| s.source)
        .collect();
    assert_eq!(failed, vec![ImportSource::StoreCounts, ImportSource::Transit]);
}

#[test]
fn test_new_paths_reset_tracking() {
    let ctx = TestContext::new(norte_reference());
    let cycle = ctx.start_cycle("2026-05-01 08:00:00");
    write_all_sources(&ctx);
    ctx.inventory_api.import_all(&cycle, "importer", false).unwrap();

    ctx.inventory_api.set_data_paths(ctx.paths.clone());
    let report = ctx.inventory_api.import_all(&cycle, "importer", false).unwrap();
    assert!(report.modified);
}
