// ==========================================
// Asset inventory - command line entry
// ==========================================
// usage: asset-inventory <command> [args]
// ==========================================

use std::sync::Arc;

use asset_inventory::app::{get_default_db_path, poller, AppState, CommandResponse};
use asset_inventory::config::DataPaths;
use asset_inventory::domain::types::SYSTEM_USER;

const USAGE: &str = "\
usage: asset-inventory <command> [args]

commands:
  start [description]        start a new inventory cycle
  load <cycle_id>            select an existing cycle
  finalize                   finalize the current cycle
  import [--force]           import the count files into the current cycle
  fill                       create pending rows for reference stores/sectors
  count <location> <type> <quantity> [--finalize]
  supplier <type> <box_type> <quantity>
  transit <origin> <box_type> <quantity>
  cycles                     list cycles
  active                     list cycles still in progress
  summary                    row counts of the current cycle
  coverage                   reference stores/sectors without a row
  batches                    import runs recorded for the current cycle
  dashboard                  dashboard bundle of the current cycle
  history [limit]            finalized cycles
  compare <current> <previous>
  templates                  write missing reference/count files
  paths <dir>                read reference/count files from <dir>
  config <key> <value>       set a configuration value
  watch                      poll the count files and import changes";

fn print_response(response: &CommandResponse) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{}", json),
        Err(_) => println!("{}", response.message),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("serialization failed: {}", e),
    }
}

#[tokio::main]
async fn main() {
    if std::env::var_os("ASSET_INVENTORY_LOG_JSON").is_some() {
        asset_inventory::logging::init_json();
    } else {
        asset_inventory::logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{} {}", asset_inventory::APP_NAME, asset_inventory::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };
    let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or("");
    let has_flag = |flag: &str| args.iter().any(|a| a == flag);

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, "using database");
    let state = match AppState::new(db_path) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            eprintln!("cannot initialize: {}", e);
            std::process::exit(1);
        }
    };

    let response = match command {
        "start" => state.start_new_inventory(&args[1..].join(" ")),
        "load" => state.load_inventory(arg(1)),
        "finalize" => state.finalize_current(),
        "import" => state.import_data(SYSTEM_USER, has_flag("--force")),
        "fill" => state.fill_missing(),
        "count" => match arg(3).trim().parse::<i64>() {
            Ok(quantity) => {
                state.add_manual_count(arg(1), arg(2), quantity, has_flag("--finalize"), SYSTEM_USER)
            }
            Err(_) => {
                eprintln!("quantity must be an integer");
                std::process::exit(2);
            }
        },
        "supplier" => state.add_supplier_data(arg(1), arg(2), arg(3)),
        "transit" => state.add_transit_data(arg(1), arg(2), arg(3)),
        "cycles" => state.list_cycles(),
        "active" => state.list_active_cycles(),
        "summary" => state.current_summary(),
        "coverage" => state.reference_coverage(),
        "batches" => state.import_batches(),
        "history" => state.history(arg(1).parse().ok()),
        "compare" => state.compare(arg(1), arg(2)),
        "templates" => state.create_default_templates(),
        "paths" => state.configure_paths(DataPaths::under(arg(1))),
        "config" => state.update_config(arg(1), &args[2.min(args.len())..].join(" ")),
        "dashboard" => {
            print_json(&state.dashboard());
            return;
        }
        "watch" => {
            let interval = state
                .config
                .poll_interval()
                .unwrap_or(std::time::Duration::from_secs(30));
            let handle = poller::spawn(state.clone(), interval);
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for ctrl-c");
            }
            handle.stop().await;
            return;
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    print_response(&response);
    if !response.status {
        std::process::exit(1);
    }
}
