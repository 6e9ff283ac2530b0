//! Load report and data diagnostics

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use ssa_common::validator::{diagnose_responsaveis, ResponsavelDiagnosis};
use ssa_common::LoadReport;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ValidationQuery {
    /// Limit the responsible breakdown to one issuing sector
    pub setor_emissor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub source: Option<String>,
    pub loaded_at: String,
    pub report: LoadReport,
    pub responsaveis: ResponsavelDiagnosis,
}

/// GET /api/validation
///
/// 404 until a workbook has been loaded.
pub async fn get_validation(
    State(state): State<AppState>,
    Query(query): Query<ValidationQuery>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let dataset = state.snapshot().await;
    let report = dataset.report.clone().ok_or(ApiError::NoDataset)?;
    let setor = query
        .setor_emissor
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    Ok(Json(ValidationResponse {
        source: dataset.source.as_ref().map(|p| p.display().to_string()),
        loaded_at: dataset.loaded_at.to_rfc3339(),
        report,
        responsaveis: diagnose_responsaveis(&dataset.records, setor),
    }))
}
