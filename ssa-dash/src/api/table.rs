//! SSA table with filtering, sorting and pagination (100 rows/page)

use std::cmp::Ordering;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use ssa_common::{SsaFilter, SsaRecord};

use super::ApiError;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Sortable table columns, in display order
pub const TABLE_COLUMNS: [&str; 10] = [
    "numero",
    "estado",
    "setor_emissor",
    "setor_executor",
    "resp_prog",
    "resp_exec",
    "semana_prog",
    "prioridade",
    "data_emissao",
    "descricao",
];

/// Query parameters for table viewing
#[derive(Debug, Deserialize)]
pub struct TableQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Column to sort by (optional)
    pub sort: Option<String>,

    /// Sort order: "asc" or "desc"
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_page() -> usize {
    1
}

fn default_order() -> String {
    "asc".to_string()
}

#[derive(Debug, Serialize)]
pub struct TableRow {
    pub numero: String,
    /// Portal page for this SSA
    pub link: String,
    pub estado: String,
    pub setor_emissor: String,
    pub setor_executor: String,
    pub resp_prog: String,
    pub resp_exec: String,
    pub semana_prog: String,
    pub prioridade: String,
    /// `dd/mm/YYYY HH:MM`, empty when unknown
    pub data_emissao: String,
    pub descricao: String,
}

#[derive(Debug, Serialize)]
pub struct TableResponse {
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub columns: Vec<&'static str>,
    pub rows: Vec<TableRow>,
}

fn text_key<'a>(record: &'a SsaRecord, column: &str) -> &'a str {
    match column {
        "numero" => &record.numero,
        "estado" => &record.situacao,
        "setor_emissor" => &record.setor_emissor,
        "setor_executor" => &record.setor_executor,
        "resp_prog" => record.responsavel_programacao.as_deref().unwrap_or(""),
        "resp_exec" => record.responsavel_execucao.as_deref().unwrap_or(""),
        "semana_prog" => record.semana_programada.as_deref().unwrap_or(""),
        "prioridade" => &record.prioridade_emissao,
        _ => &record.descricao,
    }
}

fn compare(a: &SsaRecord, b: &SsaRecord, column: &str) -> Ordering {
    match column {
        // Undated SSAs sort first
        "data_emissao" => a.emitida_em.cmp(&b.emitida_em),
        // Numeric SSA numbers compare by value
        "numero" => match (a.numero.parse::<u64>(), b.numero.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.numero.cmp(&b.numero),
        },
        _ => text_key(a, column).cmp(text_key(b, column)),
    }
}

/// Sort `view` in place by a table column
pub fn sort_view(view: &mut [&SsaRecord], column: &str, descending: bool) -> Result<(), ApiError> {
    if !TABLE_COLUMNS.contains(&column) {
        return Err(ApiError::InvalidColumn(column.to_string()));
    }
    view.sort_by(|a, b| {
        let ordering = compare(a, b, column);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    Ok(())
}

/// GET /api/table
pub async fn get_table(
    State(state): State<AppState>,
    Query(filter): Query<SsaFilter>,
    Query(query): Query<TableQuery>,
) -> Result<Json<TableResponse>, ApiError> {
    let dataset = state.snapshot().await;
    let mut view = dataset.filtered(&filter);

    if let Some(column) = query.sort.as_deref().filter(|c| !c.is_empty()) {
        sort_view(&mut view, column, query.order.eq_ignore_ascii_case("desc"))?;
    }

    let pagination = calculate_pagination(view.len(), query.page);
    let rows = pagination
        .slice(&view)
        .iter()
        .map(|record| TableRow {
            numero: record.numero.clone(),
            link: state.config.ssa_link(&record.numero),
            estado: record.situacao.clone(),
            setor_emissor: record.setor_emissor.clone(),
            setor_executor: record.setor_executor.clone(),
            resp_prog: record.responsavel_programacao.clone().unwrap_or_default(),
            resp_exec: record.responsavel_execucao.clone().unwrap_or_default(),
            semana_prog: record.semana_programada.clone().unwrap_or_default(),
            prioridade: record.prioridade_emissao.clone(),
            data_emissao: record
                .emitida_em
                .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_default(),
            descricao: record.descricao.clone(),
        })
        .collect();

    Ok(Json(TableResponse {
        total_rows: view.len(),
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        columns: TABLE_COLUMNS.to_vec(),
        rows,
    }))
}
