//! Filter dropdown values

use axum::{extract::State, Json};
use ssa_common::filter::FilterOptions;

use crate::AppState;

/// GET /api/options
///
/// Distinct values for every dropdown, taken from the unfiltered dataset.
pub async fn get_options(State(state): State<AppState>) -> Json<FilterOptions> {
    let dataset = state.snapshot().await;
    Json(FilterOptions::from_records(&dataset.records))
}
