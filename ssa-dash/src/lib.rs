//! ssa-dash library - SSA work-order dashboard
//!
//! Serves the embedded UI plus the JSON, export and SSE endpoints over one
//! in-memory dataset. Reloads swap the dataset atomically; handlers always
//! work on an immutable snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use ssa_common::config::DashboardConfig;
use ssa_common::events::EventBus;
use ssa_common::{LoadOutcome, LoadReport, SsaFilter, SsaRecord, SsaTable};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod pagination;
pub mod reload;

/// Event bus capacity; lagging SSE clients skip older events
pub const EVENT_CAPACITY: usize = 64;

/// One loaded workbook
#[derive(Debug)]
pub struct Dataset {
    /// Canonical positional table
    pub table: SsaTable,
    pub records: Vec<SsaRecord>,
    /// `None` until a workbook has been loaded successfully
    pub report: Option<LoadReport>,
    pub source: Option<PathBuf>,
    pub loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Placeholder used before the first successful load
    pub fn empty() -> Self {
        Self {
            table: SsaTable::new(),
            records: Vec::new(),
            report: None,
            source: None,
            loaded_at: Utc::now(),
        }
    }

    pub fn from_outcome(outcome: LoadOutcome, source: Option<PathBuf>) -> Self {
        Self {
            table: outcome.table,
            records: outcome.records,
            report: Some(outcome.report),
            source,
            loaded_at: Utc::now(),
        }
    }

    /// Records passing `filter`
    pub fn filtered(&self, filter: &SsaFilter) -> Vec<&SsaRecord> {
        filter.apply(&self.records)
    }

    /// Record with the given SSA number
    pub fn find(&self, numero: &str) -> Option<&SsaRecord> {
        let numero = numero.trim();
        self.records.iter().find(|r| r.numero == numero)
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Current dataset; replaced as a whole on reload
    pub dataset: Arc<RwLock<Arc<Dataset>>>,
    pub config: Arc<DashboardConfig>,
    /// Reload notifications for SSE clients
    pub events: EventBus,
}

impl AppState {
    pub fn new(dataset: Dataset, config: DashboardConfig) -> Self {
        Self {
            dataset: Arc::new(RwLock::new(Arc::new(dataset))),
            config: Arc::new(config),
            events: EventBus::new(EVENT_CAPACITY),
        }
    }

    /// The dataset in service right now
    pub async fn snapshot(&self) -> Arc<Dataset> {
        self.dataset.read().await.clone()
    }

    /// Put `dataset` in service
    pub async fn replace(&self, dataset: Dataset) {
        *self.dataset.write().await = Arc::new(dataset);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/options", get(api::get_options))
        .route("/api/summary", get(api::get_summary))
        .route("/api/charts/:name", get(api::get_chart))
        .route("/api/table", get(api::get_table))
        .route("/api/ssa/:numero", get(api::get_ssa))
        .route("/api/validation", get(api::get_validation))
        .route("/api/export/xlsx", get(api::export_xlsx))
        .route("/api/export/html", get(api::export_html))
        .route("/api/reload", post(api::post_reload))
        .route("/api/events", get(api::event_stream));

    let ui = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes());

    Router::new()
        .merge(api)
        .merge(ui)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
