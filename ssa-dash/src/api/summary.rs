//! Summary cards and headline metrics for the filtered view

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use ssa_common::kpi::{
    key_metrics_summary, overview, sector_performance, state_cards, weekly_trends,
    KeyMetricsSummary, Overview, SectorPerformance, StateCard, WeeklyTrend,
};
use ssa_common::SsaFilter;
use tracing::info;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// SSAs in the dataset before filtering
    pub total_ssas: usize,
    /// SSAs passing the filter
    pub filtered_ssas: usize,
    pub filter_active: bool,
    pub state_cards: Vec<StateCard>,
    pub overview: Overview,
    pub key_metrics: KeyMetricsSummary,
    pub sector_performance: Vec<SectorPerformance>,
    pub weekly_trends: Vec<WeeklyTrend>,
    /// When the dataset was loaded (RFC 3339)
    pub loaded_at: String,
    pub source: Option<String>,
}

/// GET /api/summary
pub async fn get_summary(
    State(state): State<AppState>,
    Query(filter): Query<SsaFilter>,
) -> Json<SummaryResponse> {
    let dataset = state.snapshot().await;
    let filter_active = !filter.is_empty();
    if filter_active {
        info!("Filters applied: {:?}", filter);
    }

    let view = dataset.filtered(&filter);
    Json(SummaryResponse {
        total_ssas: dataset.records.len(),
        filtered_ssas: view.len(),
        filter_active,
        state_cards: state_cards(&view),
        overview: overview(&view),
        key_metrics: key_metrics_summary(&view),
        sector_performance: sector_performance(&view),
        weekly_trends: weekly_trends(&view),
        loaded_at: dataset.loaded_at.to_rfc3339(),
        source: dataset.source.as_ref().map(|p| p.display().to_string()),
    })
}
