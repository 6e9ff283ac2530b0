//! Excel and HTML downloads of the filtered view

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use ssa_common::{export, time, SsaFilter};
use tracing::info;

use super::ApiError;
use crate::AppState;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn attachment(extension: &str) -> String {
    format!(
        "attachment; filename=\"ssas_{}.{}\"",
        time::now().format("%Y%m%d_%H%M"),
        extension
    )
}

/// GET /api/export/xlsx
pub async fn export_xlsx(
    State(state): State<AppState>,
    Query(filter): Query<SsaFilter>,
) -> Result<Response, ApiError> {
    let dataset = state.snapshot().await;
    let view = dataset.filtered(&filter);
    let bytes = export::export_xlsx_buffer(&view)?;
    info!("Excel export of {} SSAs ({} bytes)", view.len(), bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, attachment("xlsx")),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/export/html
pub async fn export_html(
    State(state): State<AppState>,
    Query(filter): Query<SsaFilter>,
) -> Response {
    let dataset = state.snapshot().await;
    let view = dataset.filtered(&filter);
    let html = export::export_html(&view, "Relatório de SSAs Pendentes");
    info!("HTML export of {} SSAs", view.len());

    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, attachment("html")),
        ],
        html,
    )
        .into_response()
}
