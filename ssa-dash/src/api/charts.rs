//! Chart series for the filtered view
//!
//! Every bar carries the SSA numbers behind it so the UI can list them in
//! the detail modal. An empty view yields a placeholder, never an error.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use ssa_common::columns::state_color;
use ssa_common::kpi::{grouped_numbers, sector_workload, SectorWorkload};
use ssa_common::validator::check_chart_consistency;
use ssa_common::weeks::{analyze_weeks, weeks_in_state_histogram};
use ssa_common::{time, SsaFilter, SsaRecord};

use super::ApiError;
use crate::AppState;

/// Placeholder text for charts with nothing to show
pub const EMPTY_MESSAGE: &str = "Nenhum dado disponível para os filtros selecionados";

/// Charts served under `/api/charts/:name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    RespProg,
    RespExec,
    State,
    Priority,
    SectorWorkload,
    ProgrammedWeek,
    RegistrationWeek,
    WeeksInState,
}

impl ChartKind {
    pub const ALL: [ChartKind; 8] = [
        ChartKind::RespProg,
        ChartKind::RespExec,
        ChartKind::State,
        ChartKind::Priority,
        ChartKind::SectorWorkload,
        ChartKind::ProgrammedWeek,
        ChartKind::RegistrationWeek,
        ChartKind::WeeksInState,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChartKind::RespProg => "resp-prog",
            ChartKind::RespExec => "resp-exec",
            ChartKind::State => "state",
            ChartKind::Priority => "priority",
            ChartKind::SectorWorkload => "sector-workload",
            ChartKind::ProgrammedWeek => "programmed-week",
            ChartKind::RegistrationWeek => "registration-week",
            ChartKind::WeeksInState => "weeks-in-state",
        }
    }

    /// (title, x axis, y axis)
    fn labels(self) -> (&'static str, &'static str, &'static str) {
        match self {
            ChartKind::RespProg => ("SSAs por Responsável na Programação", "Responsável", "Quantidade"),
            ChartKind::RespExec => ("SSAs por Responsável na Execução", "Responsável", "Quantidade"),
            ChartKind::State => ("SSAs Pendentes por Estado", "Estado", "Quantidade"),
            ChartKind::Priority => ("SSAs por Prioridade", "Prioridade", "Quantidade"),
            ChartKind::SectorWorkload => ("Carga de Trabalho por Setor", "Prioridade", "Setor"),
            ChartKind::ProgrammedWeek => ("SSAs Programadas por Semana", "Semana", "Quantidade"),
            ChartKind::RegistrationWeek => ("SSAs Cadastradas por Semana", "Semana", "Quantidade"),
            ChartKind::WeeksInState => ("Tempo no Estado Atual", "Semanas", "Quantidade"),
        }
    }
}

impl FromStr for ChartKind {
    type Err = ApiError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ApiError::UnknownChart(name.to_string()))
    }
}

/// One bar; `series` splits stacked week charts by priority
#[derive(Debug, Clone, Serialize)]
pub struct ChartBar {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    pub ssas: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub name: &'static str,
    pub title: &'static str,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub bars: Vec<ChartBar>,
    /// Sector × priority grid for `sector-workload`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<SectorWorkload>,
}

fn counted_bars<F>(view: &[&SsaRecord], key: F, colored: bool) -> Vec<ChartBar>
where
    F: Fn(&SsaRecord) -> Option<String>,
{
    grouped_numbers(view, key)
        .into_iter()
        .map(|g| ChartBar {
            color: colored.then(|| state_color(&g.value)),
            label: g.value,
            series: None,
            count: g.count,
            ssas: g.ssas,
        })
        .collect()
}

fn week_bars(view: &[&SsaRecord], use_programmed: bool) -> Vec<ChartBar> {
    analyze_weeks(view, use_programmed)
        .into_iter()
        .map(|bucket| ChartBar {
            count: bucket.count(),
            label: bucket.year_week,
            series: Some(bucket.prioridade),
            color: None,
            ssas: bucket.ssas,
        })
        .collect()
}

/// Build one chart over an already filtered view
pub fn build_chart(kind: ChartKind, view: &[&SsaRecord]) -> ChartResponse {
    let (title, x_title, y_title) = kind.labels();
    let mut matrix = None;

    let bars = match kind {
        ChartKind::RespProg => counted_bars(view, |r| r.responsavel_programacao.clone(), false),
        ChartKind::RespExec => {
            let bars = counted_bars(view, |r| r.responsavel_execucao.clone(), false);
            let counts: Vec<(String, usize)> =
                bars.iter().map(|b| (b.label.clone(), b.count)).collect();
            // Discrepancies are logged by the check
            check_chart_consistency(view, &counts);
            bars
        }
        ChartKind::State => counted_bars(view, |r| Some(r.situacao.clone()), true),
        ChartKind::Priority => counted_bars(view, |r| Some(r.prioridade_emissao.clone()), false),
        ChartKind::SectorWorkload => {
            let workload = sector_workload(view);
            let bars = workload
                .sectors
                .iter()
                .zip(&workload.counts)
                .map(|(sector, row)| ChartBar {
                    label: sector.clone(),
                    series: None,
                    count: row.iter().sum(),
                    color: None,
                    ssas: view
                        .iter()
                        .filter(|r| r.setor_executor == *sector)
                        .map(|r| r.numero.clone())
                        .collect(),
                })
                .collect();
            matrix = Some(workload);
            bars
        }
        ChartKind::ProgrammedWeek => week_bars(view, true),
        ChartKind::RegistrationWeek => week_bars(view, false),
        ChartKind::WeeksInState => weeks_in_state_histogram(view, time::today())
            .into_iter()
            .map(|bucket| ChartBar {
                count: bucket.ssas.len(),
                label: bucket.label,
                series: None,
                color: None,
                ssas: bucket.ssas,
            })
            .collect(),
    };

    let empty = bars.is_empty();
    ChartResponse {
        name: kind.name(),
        title,
        x_title,
        y_title,
        empty,
        message: empty.then_some(EMPTY_MESSAGE),
        bars,
        matrix: if empty { None } else { matrix },
    }
}

/// GET /api/charts/:name
pub async fn get_chart(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(filter): Query<SsaFilter>,
) -> Result<Json<ChartResponse>, ApiError> {
    let kind: ChartKind = name.parse()?;
    let dataset = state.snapshot().await;
    let view = dataset.filtered(&filter);
    Ok(Json(build_chart(kind, &view)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_names_round_trip() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.name().parse::<ChartKind>().unwrap(), kind);
        }
        assert!("pizza".parse::<ChartKind>().is_err());
    }

    #[test]
    fn test_empty_view_is_a_placeholder() {
        for kind in ChartKind::ALL {
            let chart = build_chart(kind, &[]);
            assert!(chart.empty);
            assert_eq!(chart.message, Some(EMPTY_MESSAGE));
            assert!(chart.matrix.is_none());
        }
    }
}
