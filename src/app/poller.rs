// ==========================================
// Asset inventory - auto-import poller
// ==========================================
// Re-runs the silent import on the current cycle at a fixed interval.
// The import itself is blocking (SQLite + file I/O) and runs on the
// blocking pool. Unchanged files are skipped by the importer, so a tick
// that overlaps a manual import writes nothing twice.
// ==========================================

use crate::api::{ApiError, ImportReport};
use crate::app::state::AppState;
use crate::domain::types::SYSTEM_USER;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// One silent import of the current cycle
///
/// None when nothing was attempted (no current cycle, cycle finalized)
/// or the import failed; failures are logged.
pub async fn poll_once(state: Arc<AppState>) -> Option<ImportReport> {
    let result = tokio::task::spawn_blocking(move || state.run_import(SYSTEM_USER, false)).await;

    match result {
        Ok(Ok(report)) => {
            if report.modified {
                info!(count = report.count, "auto import updated data");
            } else {
                debug!("auto import: no changes");
            }
            if !report.status {
                warn!(message = %report.message, "auto import finished with errors");
            }
            Some(report)
        }
        Ok(Err(ApiError::NoActiveCycle)) => {
            debug!("auto import skipped: no active cycle");
            None
        }
        Ok(Err(ApiError::InvalidStateTransition { .. })) => {
            debug!("auto import skipped: cycle finalized");
            None
        }
        Ok(Err(e)) => {
            warn!(error = %e, "auto import failed");
            None
        }
        Err(e) => {
            warn!(error = %e, "auto import task panicked");
            None
        }
    }
}

/// Running poller; dropping it without `stop` leaves the task running
pub struct PollerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Ask the loop to exit and wait for it
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "poller task ended abnormally");
        }
    }
}

/// Start polling every `interval` (the first import runs immediately)
pub fn spawn(state: Arc<AppState>, interval: Duration) -> PollerHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = interval.as_secs(), "auto import poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    poll_once(state.clone()).await;
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("auto import poller stopped");
    });

    PollerHandle { stop_tx, task }
}
