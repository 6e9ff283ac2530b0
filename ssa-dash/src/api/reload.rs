//! Manual reload and the SSE event stream

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::Stream;
use serde::Serialize;
use ssa_common::sse::dashboard_event_stream;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    pub records: usize,
}

/// POST /api/reload
///
/// Loads the newest matching workbook. On failure the previous dataset
/// stays in service and the error is returned.
pub async fn post_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, ApiError> {
    let records = crate::reload::reload(&state).await?;
    Ok(Json(ReloadResponse {
        status: "reloaded",
        records,
    }))
}

/// GET /api/events
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    dashboard_event_stream(&state.events)
}
