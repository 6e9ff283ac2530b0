//! KPI and aggregation helpers
//!
//! All functions work on a filtered view (`&[&SsaRecord]`) and are cheap
//! enough to recompute on every filter change.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::columns::CRITICAL_PRIORITY;
use crate::record::SsaRecord;
use crate::time::format_date_br;
use crate::weeks::WeekCode;

/// Value of the "Execução Simples" column meaning yes
const SIMPLE_EXECUTION_YES: &str = "Sim";

/// One distinct value and its frequency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// One distinct value and the SSAs carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedNumbers {
    pub value: String,
    pub count: usize,
    pub ssas: Vec<String>,
}

/// SSA numbers grouped by `key`, most frequent first, ties by value
///
/// Records for which `key` yields `None` are left out.
pub fn grouped_numbers<F>(records: &[&SsaRecord], key: F) -> Vec<GroupedNumbers>
where
    F: Fn(&SsaRecord) -> Option<String>,
{
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for record in records {
        if let Some(value) = key(record).filter(|v| !v.is_empty()) {
            groups.entry(value).or_default().push(record.numero.clone());
        }
    }

    let mut grouped: Vec<GroupedNumbers> = groups
        .into_iter()
        .map(|(value, ssas)| GroupedNumbers {
            value,
            count: ssas.len(),
            ssas,
        })
        .collect();
    grouped.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    grouped
}

/// Frequency of each value of `key`, most frequent first
pub fn value_counts<F>(records: &[&SsaRecord], key: F) -> Vec<ValueCount>
where
    F: Fn(&SsaRecord) -> Option<String>,
{
    grouped_numbers(records, key)
        .into_iter()
        .map(|g| ValueCount {
            value: g.value,
            count: g.count,
        })
        .collect()
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EfficiencyMetrics {
    /// Fraction of SSAs with a programmed week
    pub taxa_programacao: f64,
    /// Fraction of SSAs marked for simple execution
    pub taxa_execucao_simples: f64,
    /// Priority code to fraction of SSAs
    pub distribuicao_prioridade: BTreeMap<String, f64>,
}

pub fn efficiency_metrics(records: &[&SsaRecord]) -> EfficiencyMetrics {
    let total = records.len();
    if total == 0 {
        return EfficiencyMetrics::default();
    }

    let programmed = records.iter().filter(|r| r.is_programmed()).count();
    let simple = records
        .iter()
        .filter(|r| r.execucao_simples == SIMPLE_EXECUTION_YES)
        .count();
    let distribuicao_prioridade = value_counts(records, |r| Some(r.prioridade_emissao.clone()))
        .into_iter()
        .map(|vc| (vc.value, ratio(vc.count, total)))
        .collect();

    EfficiencyMetrics {
        taxa_programacao: ratio(programmed, total),
        taxa_execucao_simples: ratio(simple, total),
        distribuicao_prioridade,
    }
}

/// Overall score in percent, two decimals
pub fn health_score(records: &[&SsaRecord]) -> f64 {
    let metrics = efficiency_metrics(records);
    round2((metrics.taxa_programacao * 0.5 + metrics.taxa_execucao_simples * 0.5) * 100.0)
}

/// Mean weeks from registration to programming, per priority
///
/// `None` for priorities without any SSA carrying both weeks.
pub fn response_times(records: &[&SsaRecord]) -> BTreeMap<String, Option<f64>> {
    let mut spans: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for record in records {
        let entry = spans.entry(record.prioridade_emissao.clone()).or_default();
        let registered = WeekCode::parse(&record.semana_cadastro);
        let programmed = record.semana_programada.as_deref().and_then(WeekCode::parse);
        if let (Some(from), Some(to)) = (registered, programmed) {
            if let Some(weeks) = from.weeks_until(&to) {
                entry.push(weeks);
            }
        }
    }

    spans
        .into_iter()
        .map(|(priority, weeks)| {
            let mean = (!weeks.is_empty())
                .then(|| weeks.iter().sum::<i64>() as f64 / weeks.len() as f64);
            (priority, mean)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorPerformance {
    pub setor: String,
    pub total_ssas: usize,
    pub taxa_programacao: f64,
    pub ssas_criticas: usize,
    pub percentual_criticas: f64,
}

/// Programming rate and critical share per executing sector, largest first
pub fn sector_performance(records: &[&SsaRecord]) -> Vec<SectorPerformance> {
    let mut by_sector: BTreeMap<&str, Vec<&SsaRecord>> = BTreeMap::new();
    for record in records {
        by_sector
            .entry(record.setor_executor.as_str())
            .or_default()
            .push(record);
    }

    let mut rows: Vec<SectorPerformance> = by_sector
        .into_iter()
        .map(|(sector, items)| {
            let total = items.len();
            let programmed = items.iter().filter(|r| r.is_programmed()).count();
            let critical = items.iter().filter(|r| r.is_critical()).count();
            SectorPerformance {
                setor: sector.to_string(),
                total_ssas: total,
                taxa_programacao: ratio(programmed, total),
                ssas_criticas: critical,
                percentual_criticas: ratio(critical, total) * 100.0,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total_ssas.cmp(&a.total_ssas).then_with(|| a.setor.cmp(&b.setor)));
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTrend {
    pub semana: String,
    pub total_ssas: usize,
    pub programadas: usize,
    pub criticas: usize,
    pub taxa_programacao: f64,
}

/// Registrations per week, in week order
pub fn weekly_trends(records: &[&SsaRecord]) -> Vec<WeeklyTrend> {
    let mut by_week: BTreeMap<&str, Vec<&SsaRecord>> = BTreeMap::new();
    for record in records {
        by_week
            .entry(record.semana_cadastro.as_str())
            .or_default()
            .push(record);
    }

    by_week
        .into_iter()
        .map(|(week, items)| {
            let total = items.len();
            let programadas = items.iter().filter(|r| r.is_programmed()).count();
            WeeklyTrend {
                semana: week.to_string(),
                total_ssas: total,
                programadas,
                criticas: items.iter().filter(|r| r.is_critical()).count(),
                taxa_programacao: ratio(programadas, total),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetricsSummary {
    pub total_ssas: usize,
    pub health_score: f64,
    /// Percent
    pub taxa_programacao: f64,
    /// Percent
    pub taxa_execucao_simples: f64,
    /// Mean weeks to programming for critical SSAs
    pub tempo_resposta_criticas: Option<f64>,
    pub distribuicao_prioridade: BTreeMap<String, f64>,
}

pub fn key_metrics_summary(records: &[&SsaRecord]) -> KeyMetricsSummary {
    let metrics = efficiency_metrics(records);
    let tempo_resposta_criticas = response_times(records)
        .into_iter()
        .find(|(priority, _)| priority.eq_ignore_ascii_case(CRITICAL_PRIORITY))
        .and_then(|(_, mean)| mean);

    KeyMetricsSummary {
        total_ssas: records.len(),
        health_score: health_score(records),
        taxa_programacao: metrics.taxa_programacao * 100.0,
        taxa_execucao_simples: metrics.taxa_execucao_simples * 100.0,
        tempo_resposta_criticas,
        distribuicao_prioridade: metrics.distribuicao_prioridade,
    }
}

/// Emission date range, `N/A` when no dates are known
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub inicio: String,
    pub fim: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponsibleCounts {
    pub programacao: usize,
    pub execucao: usize,
}

/// Headline statistics of a view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total: usize,
    pub criticas: usize,
    pub taxa_criticidade: f64,
    pub por_prioridade: Vec<ValueCount>,
    pub por_setor: Vec<ValueCount>,
    pub por_estado: Vec<ValueCount>,
    pub periodo: Period,
    pub responsaveis: ResponsibleCounts,
}

pub fn overview(records: &[&SsaRecord]) -> Overview {
    let total = records.len();
    let criticas = records.iter().filter(|r| r.is_critical()).count();

    let dates = records.iter().filter_map(|r| r.emitida_em);
    let periodo = match (dates.clone().min(), dates.max()) {
        (Some(first), Some(last)) => Period {
            inicio: format_date_br(&first),
            fim: format_date_br(&last),
        },
        _ => Period {
            inicio: "N/A".to_string(),
            fim: "N/A".to_string(),
        },
    };

    let distinct = |f: fn(&SsaRecord) -> Option<&str>| {
        records
            .iter()
            .filter_map(|r| f(r))
            .collect::<BTreeSet<_>>()
            .len()
    };

    Overview {
        total,
        criticas,
        taxa_criticidade: ratio(criticas, total) * 100.0,
        por_prioridade: value_counts(records, |r| Some(r.prioridade_emissao.clone())),
        por_setor: value_counts(records, |r| Some(r.setor_executor.clone())),
        por_estado: value_counts(records, |r| Some(r.situacao.clone())),
        periodo,
        responsaveis: ResponsibleCounts {
            programacao: distinct(|r| r.responsavel_programacao.as_deref()),
            execucao: distinct(|r| r.responsavel_execucao.as_deref()),
        },
    }
}

/// Card order and styling on the dashboard ribbon
const STATE_CARDS: [(&str, &str, &str); 12] = [
    ("TOTAL", "TOTAL DE SSAs", "primary"),
    ("APL", "AGUARDANDO PLANEJAMENTO", "secondary"),
    ("APG", "AGUARDANDO PROGRAMAÇÃO", "info"),
    ("AAD", "AGUARDANDO ATUALIZAÇÃO DESENHOS", "secondary"),
    ("ADM", "AGUARDANDO DEPTO. MANUTENÇÃO", "info"),
    ("AAT", "AGUARDANDO ATEND. TERCEIROS", "secondary"),
    ("APV", "AGUARDANDO PROVISIONAMENTO", "info"),
    ("AIM", "AGUARDANDO ENG. MANUTENÇÃO", "secondary"),
    ("SCD", "SSA CANCELADA AG. APROV. DIV.", "info"),
    ("SEE", "SERVIÇO EM EXECUÇÃO", "success"),
    ("SAD", "SERVIÇO A DISPOSIÇÃO", "success"),
    ("ADI", "AGUARDANDO APROV. DIVISÃO", "danger"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCard {
    pub code: &'static str,
    pub label: &'static str,
    pub variant: &'static str,
    pub count: usize,
    pub percentage: f64,
}

/// Fixed ribbon of state cards, `TOTAL` first
pub fn state_cards(records: &[&SsaRecord]) -> Vec<StateCard> {
    let total = records.len();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.situacao.as_str()).or_default() += 1;
    }

    STATE_CARDS
        .iter()
        .map(|&(code, label, variant)| {
            let count = if code == "TOTAL" {
                total
            } else {
                counts.get(code).copied().unwrap_or(0)
            };
            StateCard {
                code,
                label,
                variant,
                count,
                percentage: round2(ratio(count, total) * 100.0),
            }
        })
        .collect()
}

/// SSA counts per executing sector and priority
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectorWorkload {
    /// Sectors, busiest first
    pub sectors: Vec<String>,
    pub priorities: Vec<String>,
    /// `counts[s][p]` for `sectors[s]` and `priorities[p]`
    pub counts: Vec<Vec<usize>>,
}

pub fn sector_workload(records: &[&SsaRecord]) -> SectorWorkload {
    let sectors: Vec<String> = value_counts(records, |r| Some(r.setor_executor.clone()))
        .into_iter()
        .map(|vc| vc.value)
        .collect();
    let priorities: Vec<String> = records
        .iter()
        .map(|r| r.prioridade_emissao.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut counts = vec![vec![0; priorities.len()]; sectors.len()];
    for record in records {
        let s = sectors.iter().position(|s| *s == record.setor_executor);
        let p = priorities.iter().position(|p| *p == record.prioridade_emissao);
        if let (Some(s), Some(p)) = (s, p) {
            counts[s][p] += 1;
        }
    }

    SectorWorkload {
        sectors,
        priorities,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_record;

    fn fixture() -> Vec<SsaRecord> {
        let mut a = sample_record("1");
        a.semana_cadastro = "202410".into();
        a.semana_programada = Some("202412".into());
        a.execucao_simples = "Sim".into();
        a.responsavel_programacao = Some("ANA".into());

        let mut b = sample_record("2");
        b.prioridade_emissao = "S2".into();
        b.situacao = "APG".into();
        b.setor_executor = "IEE3".into();

        let mut c = sample_record("3");
        c.semana_cadastro = "202350".into();
        c.semana_programada = Some("202402".into());
        c.responsavel_execucao = Some("JOAO".into());
        c.emitida_em = None;

        let d = sample_record("4");
        vec![a, b, c, d]
    }

    #[test]
    fn test_value_counts_order() {
        let records = fixture();
        let view: Vec<&SsaRecord> = records.iter().collect();
        let counts = value_counts(&view, |r| Some(r.situacao.clone()));
        assert_eq!(counts[0], ValueCount { value: "APL".into(), count: 3 });
        assert_eq!(counts[1], ValueCount { value: "APG".into(), count: 1 });

        let grouped = grouped_numbers(&view, |r| r.responsavel_execucao.clone());
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].ssas, vec!["3".to_string()]);
    }

    #[test]
    fn test_efficiency_and_health() {
        let records = fixture();
        let view: Vec<&SsaRecord> = records.iter().collect();
        let metrics = efficiency_metrics(&view);
        assert_eq!(metrics.taxa_programacao, 0.5);
        assert_eq!(metrics.taxa_execucao_simples, 0.25);
        assert_eq!(metrics.distribuicao_prioridade["S3.7"], 0.75);
        assert_eq!(health_score(&view), 37.5);
    }

    #[test]
    fn test_empty_view_yields_zeros() {
        let view: Vec<&SsaRecord> = Vec::new();
        assert_eq!(efficiency_metrics(&view), EfficiencyMetrics::default());
        assert_eq!(health_score(&view), 0.0);
        let summary = overview(&view);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.taxa_criticidade, 0.0);
        assert_eq!(summary.periodo.inicio, "N/A");
        assert!(state_cards(&view).iter().all(|c| c.count == 0 && c.percentage == 0.0));
    }

    #[test]
    fn test_response_times_cross_year() {
        let records = fixture();
        let view: Vec<&SsaRecord> = records.iter().collect();
        let times = response_times(&view);
        // 202410 -> 202412 is 2 weeks, 202350 -> 202402 is 4 weeks
        assert_eq!(times["S3.7"], Some(3.0));
        assert_eq!(times["S2"], None);
        assert_eq!(key_metrics_summary(&view).tempo_resposta_criticas, Some(3.0));
    }

    #[test]
    fn test_sector_performance_and_trends() {
        let records = fixture();
        let view: Vec<&SsaRecord> = records.iter().collect();
        let sectors = sector_performance(&view);
        assert_eq!(sectors[0].setor, "MEL4");
        assert_eq!(sectors[0].total_ssas, 3);
        assert_eq!(sectors[0].ssas_criticas, 3);
        assert_eq!(sectors[0].percentual_criticas, 100.0);

        let trends = weekly_trends(&view);
        assert_eq!(trends[0].semana, "202350");
        assert_eq!(trends.last().unwrap().semana, "202410");
        assert_eq!(trends.last().unwrap().total_ssas, 3);
    }

    #[test]
    fn test_overview_and_cards() {
        let records = fixture();
        let view: Vec<&SsaRecord> = records.iter().collect();
        let summary = overview(&view);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.criticas, 3);
        assert_eq!(summary.taxa_criticidade, 75.0);
        assert_eq!(summary.periodo.inicio, "04/03/2024");
        assert_eq!(summary.responsaveis, ResponsibleCounts { programacao: 1, execucao: 1 });

        let cards = state_cards(&view);
        assert_eq!(cards.len(), 12);
        assert_eq!(cards[0].code, "TOTAL");
        assert_eq!(cards[0].count, 4);
        assert_eq!(cards[1].code, "APL");
        assert_eq!(cards[1].percentage, 75.0);
        assert_eq!(cards[11].code, "ADI");
    }

    #[test]
    fn test_sector_workload_matrix() {
        let records = fixture();
        let view: Vec<&SsaRecord> = records.iter().collect();
        let workload = sector_workload(&view);
        assert_eq!(workload.sectors, vec!["MEL4".to_string(), "IEE3".to_string()]);
        assert_eq!(workload.priorities, vec!["S2".to_string(), "S3.7".to_string()]);
        assert_eq!(workload.counts, vec![vec![0, 3], vec![1, 0]]);
    }
}
