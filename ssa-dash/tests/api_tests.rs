//! Integration tests for ssa-dash API endpoints
//!
//! The dashboard runs over a synthetic worksheet pushed through the real
//! loader, so routing, filtering and serialization are covered end to end
//! without a workbook on disk.

use std::path::PathBuf;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use ssa_common::config::DashboardConfig;
use ssa_common::events::DashboardEvent;
use ssa_common::loader::{load_sheet, RawCell, SheetData};
use ssa_common::{Cell, LoadOptions, SsaColumn};
use tower::util::ServiceExt; // for `oneshot` method
use ssa_dash::{build_router, AppState, Dataset};

const HEADER: [&str; 11] = [
    "Número da SSA",
    "Situação",
    "Setor Emissor",
    "Setor Executor",
    "Emitida Em",
    "Grau de Prioridade Emissão",
    "Semana de Cadastro",
    "Semana Programada",
    "Responsável na Programação",
    "Responsável na Execução",
    "Descrição da SSA",
];

fn text(s: &str) -> RawCell {
    if s.is_empty() {
        RawCell::Empty
    } else {
        RawCell::Text(s.to_string())
    }
}

#[allow(clippy::too_many_arguments)]
fn row(
    numero: &str,
    situacao: &str,
    emissor: &str,
    executor: &str,
    emitida: &str,
    prioridade: &str,
    cadastro: f64,
    programada: &str,
    resp_prog: &str,
    resp_exec: &str,
) -> Vec<RawCell> {
    vec![
        text(numero),
        text(situacao),
        text(emissor),
        text(executor),
        text(emitida),
        text(prioridade),
        RawCell::Number(cadastro),
        text(programada),
        text(resp_prog),
        text(resp_exec),
        text("Vazamento de óleo <bomba 2>"),
    ]
}

/// Test helper: synthetic worksheet with a header row and `rows`
fn sheet(rows: Vec<Vec<RawCell>>) -> SheetData {
    let mut all = vec![HEADER.iter().map(|h| text(h)).collect::<Vec<_>>()];
    all.extend(rows);
    SheetData {
        name: "Plan1".to_string(),
        first_row: 0,
        rows: all,
    }
}

fn sample_rows() -> Vec<Vec<RawCell>> {
    vec![
        row("202500001", "APL", "IEE3", "MEL4", "01/09/2025 08:00:00", "S3.7", 202535.0, "202537", "ana", "JOAO"),
        row("202500002", "APG", "IEE3", "IEE3", "15/08/2025 10:30:00", "S2", 202533.0, "", "ANA", ""),
        row("202500003", "APL", "MEL4", "MEL4", "10/07/2025 14:00:00", "S3.7", 202528.0, "", "", ""),
    ]
}

fn dataset(rows: Vec<Vec<RawCell>>) -> Dataset {
    let outcome = load_sheet(sheet(rows), &LoadOptions::default()).expect("synthetic sheet loads");
    Dataset::from_outcome(outcome, None)
}

fn test_config() -> DashboardConfig {
    DashboardConfig {
        data_file: Some(PathBuf::from("/nonexistent/ssa-dash/missing.xlsx")),
        ..Default::default()
    }
}

/// Test helper: app over the three sample SSAs
fn setup_app() -> axum::Router {
    build_router(AppState::new(dataset(sample_rows()), test_config()))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app.oneshot(test_request("GET", uri)).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

// =============================================================================
// Dataset
// =============================================================================

#[test]
fn test_dashboard_instantiates_from_synthetic_table() {
    let dataset = dataset(sample_rows());
    assert_eq!(dataset.records.len(), 3);
    assert_eq!(dataset.table.len(), 3);
    assert!(matches!(
        dataset.table.cell(0, SsaColumn::EmitidaEm),
        Some(Cell::DateTime(_))
    ));

    let report = dataset.report.as_ref().unwrap();
    assert_eq!(report.header_row, Some(1));
    assert!(report.mapping.missing_required().is_empty());
}

// =============================================================================
// Health and UI
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = get_json(setup_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ssa-dash");
    assert_eq!(body["records"], 3);
}

#[tokio::test]
async fn test_ui_is_served() {
    let response = setup_app().oneshot(test_request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = setup_app()
        .oneshot(test_request("GET", "/static/app.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("application/javascript"));
}

#[tokio::test]
async fn test_buildinfo() {
    let (status, body) = get_json(setup_app(), "/api/buildinfo").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["git_hash"].is_string());
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// Filters and summary
// =============================================================================

#[tokio::test]
async fn test_options_are_sorted_and_distinct() {
    let (status, body) = get_json(setup_app(), "/api/options").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["situacao"], serde_json::json!(["APG", "APL"]));
    assert_eq!(body["resp_prog"], serde_json::json!(["ANA"]));
    assert_eq!(body["setor_executor"], serde_json::json!(["IEE3", "MEL4"]));
}

#[tokio::test]
async fn test_summary_respects_filters() {
    let (status, body) = get_json(setup_app(), "/api/summary?situacao=apl&resp_prog=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_ssas"], 3);
    assert_eq!(body["filtered_ssas"], 2);
    assert_eq!(body["filter_active"], true);

    let cards = body["state_cards"].as_array().unwrap();
    assert_eq!(cards.len(), 12);
    assert_eq!(cards[0]["code"], "TOTAL");
    assert_eq!(cards[0]["count"], 2);
    assert_eq!(cards[1]["code"], "APL");
    assert_eq!(body["overview"]["criticas"], 2);
}

#[tokio::test]
async fn test_summary_date_range() {
    let (_, body) = get_json(
        setup_app(),
        "/api/summary?data_inicio=2025-08-01&data_fim=2025-08-31",
    )
    .await;
    assert_eq!(body["filtered_ssas"], 1);
}

// =============================================================================
// Charts
// =============================================================================

#[tokio::test]
async fn test_responsible_chart() {
    let (status, body) = get_json(setup_app(), "/api/charts/resp-prog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["empty"], false);
    let bars = body["bars"].as_array().unwrap();
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0]["label"], "ANA");
    assert_eq!(bars[0]["count"], 2);
    assert_eq!(bars[0]["ssas"], serde_json::json!(["202500001", "202500002"]));
}

#[tokio::test]
async fn test_week_chart_splits_by_priority() {
    let (_, body) = get_json(setup_app(), "/api/charts/registration-week").await;
    let bars = body["bars"].as_array().unwrap();
    assert_eq!(bars.len(), 3);
    assert_eq!(bars[0]["label"], "202528");
    assert_eq!(bars[0]["series"], "S3.7");
}

#[tokio::test]
async fn test_empty_view_gives_placeholder() {
    let (status, body) = get_json(setup_app(), "/api/charts/state?setor_executor=XYZ9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["empty"], true);
    assert_eq!(
        body["message"],
        "Nenhum dado disponível para os filtros selecionados"
    );
}

#[tokio::test]
async fn test_sector_workload_matrix() {
    let (_, body) = get_json(setup_app(), "/api/charts/sector-workload").await;
    assert_eq!(body["matrix"]["sectors"], serde_json::json!(["MEL4", "IEE3"]));
    assert_eq!(body["matrix"]["priorities"], serde_json::json!(["S2", "S3.7"]));

    let bars = body["bars"].as_array().unwrap();
    assert_eq!(bars[0]["label"], "MEL4");
    assert_eq!(bars[0]["count"], 2);
    assert_eq!(bars[0]["ssas"], serde_json::json!(["202500001", "202500003"]));
    assert_eq!(bars[1]["ssas"], serde_json::json!(["202500002"]));
}

#[tokio::test]
async fn test_unknown_chart_is_bad_request() {
    let (status, body) = get_json(setup_app(), "/api/charts/pizza").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("pizza"));
}

// =============================================================================
// Table and detail
// =============================================================================

#[tokio::test]
async fn test_table_sorting_and_links() {
    let (status, body) = get_json(setup_app(), "/api/table?sort=numero&order=desc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_rows"], 3);
    assert_eq!(body["page_size"], 100);

    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows[0]["numero"], "202500003");
    assert!(rows[0]["link"].as_str().unwrap().contains("202500003"));
    assert_eq!(rows[2]["data_emissao"], "01/09/2025 08:00");
}

#[tokio::test]
async fn test_table_invalid_sort_column() {
    let (status, body) = get_json(setup_app(), "/api/table?sort=senha").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_table_pagination() {
    let rows = (0..150)
        .map(|i| {
            let numero = format!("{}", 202500100 + i);
            row(&numero, "APL", "IEE3", "MEL4", "01/09/2025 08:00:00", "S2", 202535.0, "", "", "")
        })
        .collect();
    let app = build_router(AppState::new(dataset(rows), test_config()));

    let (_, body) = get_json(app, "/api/table?page=2").await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["rows"].as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn test_ssa_detail() {
    let (status, body) = get_json(setup_app(), "/api/ssa/202500001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["estado_descricao"], "APL - AGUARDANDO PLANEJAMENTO");
    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 22);
    assert_eq!(fields[0]["value"], "202500001");

    let (status, body) = get_json(setup_app(), "/api/ssa/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

// =============================================================================
// Validation, export and reload
// =============================================================================

#[tokio::test]
async fn test_validation_report() {
    let (status, body) = get_json(setup_app(), "/api/validation?setor_emissor=IEE3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["header_row"], 1);
    assert_eq!(body["report"]["records_built"], 3);
    assert_eq!(body["responsaveis"]["total_filtrado"], 2);
}

#[tokio::test]
async fn test_validation_without_dataset() {
    let app = build_router(AppState::new(Dataset::empty(), test_config()));
    let (status, _) = get_json(app, "/api/validation").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_exports() {
    let response = setup_app()
        .oneshot(test_request("GET", "/api/export/xlsx?setor_executor=MEL4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .ends_with(".xlsx\""));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..2], b"PK");

    let response = setup_app()
        .oneshot(test_request("GET", "/api/export/html"))
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("202500002"));
    assert!(html.contains("&lt;bomba 2&gt;"));
}

#[tokio::test]
async fn test_failed_reload_keeps_dataset() {
    let state = AppState::new(dataset(sample_rows()), test_config());
    let mut events = state.events.subscribe();
    let app = build_router(state.clone());

    let response = app
        .oneshot(test_request("POST", "/api/reload"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(state.snapshot().await.records.len(), 3);
    match events.try_recv().unwrap() {
        DashboardEvent::ReloadFailed { error, .. } => assert!(error.contains("missing.xlsx")),
        other => panic!("unexpected event {:?}", other),
    }
}
