//! Dataset loading and periodic reload

use std::time::Duration;

use chrono::Utc;
use ssa_common::config::DashboardConfig;
use ssa_common::events::DashboardEvent;
use ssa_common::{load_workbook, Error, LoadOptions, Result};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{AppState, Dataset};

/// Resolve the source workbook and load it (blocking)
pub fn load_dataset(config: &DashboardConfig) -> Result<Dataset> {
    let source = config.source_file()?;
    let options = LoadOptions {
        sheet: config.sheet.clone(),
        now: None,
    };
    let outcome = load_workbook(&source, &options)?;
    Ok(Dataset::from_outcome(outcome, Some(source)))
}

/// Load the newest workbook and put it in service
///
/// On failure the previous dataset stays in service and `ReloadFailed` is
/// emitted. Returns the number of records now served.
pub async fn reload(state: &AppState) -> Result<usize> {
    let config = state.config.clone();
    let loaded = tokio::task::spawn_blocking(move || load_dataset(&config))
        .await
        .map_err(|e| Error::Internal(format!("reload task failed: {}", e)))
        .and_then(|result| result);

    match loaded {
        Ok(dataset) => {
            let source = dataset
                .source
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let (rows_dropped, warnings) = dataset
                .report
                .as_ref()
                .map(|r| (r.rows_dropped, r.warnings.len()))
                .unwrap_or_default();
            let records = dataset.records.len();

            state.replace(dataset).await;
            info!("Dataset reloaded from {} ({} SSAs)", source, records);

            state.events.emit_lossy(DashboardEvent::DatasetReloaded {
                source,
                records,
                rows_dropped,
                warnings,
                timestamp: Utc::now(),
            });
            Ok(records)
        }
        Err(e) => {
            let current = state.snapshot().await;
            warn!(
                "Reload failed, keeping {} SSAs in service: {}",
                current.records.len(),
                e
            );
            state.events.emit_lossy(DashboardEvent::ReloadFailed {
                source: current.source.as_ref().map(|p| p.display().to_string()),
                error: e.to_string(),
                timestamp: Utc::now(),
            });
            Err(e)
        }
    }
}

/// Reload every `reload_interval_secs`; `None` when the interval is 0
pub fn spawn_periodic_reload(state: AppState) -> Option<JoinHandle<()>> {
    let secs = state.config.reload_interval_secs;
    if secs == 0 {
        info!("Periodic reload disabled");
        return None;
    }

    info!("Reloading data every {}s", secs);
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial load already ran
        interval.tick().await;

        loop {
            interval.tick().await;
            // Failures are logged and broadcast by reload()
            let _ = reload(&state).await;
        }
    }))
}
