//! Detail view of one SSA

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use ssa_common::columns::{state_color, state_description};
use ssa_common::time;
use ssa_common::weeks::weeks_in_state;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SsaField {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SsaDetail {
    pub numero: String,
    pub link: String,
    pub estado: String,
    pub estado_descricao: String,
    pub cor: &'static str,
    pub semanas_no_estado: Option<i64>,
    pub fields: Vec<SsaField>,
}

/// GET /api/ssa/:numero
pub async fn get_ssa(
    State(state): State<AppState>,
    Path(numero): Path<String>,
) -> Result<Json<SsaDetail>, ApiError> {
    let dataset = state.snapshot().await;
    let record = dataset
        .find(&numero)
        .ok_or_else(|| ApiError::SsaNotFound(numero.clone()))?;

    Ok(Json(SsaDetail {
        numero: record.numero.clone(),
        link: state.config.ssa_link(&record.numero),
        estado: record.situacao.clone(),
        estado_descricao: state_description(&record.situacao).to_string(),
        cor: state_color(&record.situacao),
        semanas_no_estado: weeks_in_state(record, time::today()),
        fields: record
            .display_fields()
            .into_iter()
            .map(|(label, value)| SsaField { label, value })
            .collect(),
    }))
}
