//! Data validation and integrity checks
//!
//! Everything here reports; nothing here rejects. Issues surface as
//! warnings in the load report and the validation endpoint.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::columns::SsaColumn;
use crate::record::SsaRecord;
use crate::table::{SsaRow, SsaTable};
use crate::time;

/// SSA numbers listed per quality issue
const QUALITY_EXAMPLES: usize = 10;

/// Aggregate statistics gathered during validation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationStatistics {
    pub total_ssas: usize,
    pub resp_counts: BTreeMap<String, usize>,
    pub ssas_com_responsavel: usize,
    pub ssas_sem_responsavel: usize,
    pub setores_executores: usize,
}

/// Result of [`validate_consistency`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub statistics: ValidationStatistics,
    pub timestamp: NaiveDateTime,
}

/// Cross-field consistency of the loaded records
pub fn validate_consistency(records: &[SsaRecord]) -> ValidationResult {
    let mut issues = Vec::new();
    let mut statistics = ValidationStatistics {
        total_ssas: records.len(),
        ..Default::default()
    };
    let mut sectors = BTreeSet::new();

    for record in records {
        match &record.responsavel_execucao {
            Some(resp) => {
                *statistics.resp_counts.entry(resp.clone()).or_default() += 1;
                statistics.ssas_com_responsavel += 1;
                if record.setor_executor.is_empty() {
                    issues.push(format!(
                        "SSA {} tem responsável mas não tem setor executor",
                        record.numero
                    ));
                }
            }
            None => statistics.ssas_sem_responsavel += 1,
        }
        if !record.setor_executor.is_empty() {
            sectors.insert(record.setor_executor.as_str());
        }
    }
    statistics.setores_executores = sectors.len();

    for issue in &issues {
        warn!("{}", issue);
    }

    ValidationResult {
        is_valid: issues.is_empty(),
        issues,
        statistics,
        timestamp: time::now(),
    }
}

/// Counters from [`verify_integrity`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityChecks {
    pub duplicates_found: usize,
    pub future_dates_found: usize,
    pub missing_required_found: usize,
    pub total_warnings: usize,
}

/// Result of [`verify_integrity`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub timestamp: NaiveDateTime,
    pub total_records: usize,
    pub checks: IntegrityChecks,
    pub warnings: Vec<String>,
}

/// Missing identity fields, future emission dates and duplicate numbers
///
/// Runs over the canonical table so rows that never became records are
/// still counted.
pub fn verify_integrity(table: &SsaTable, now: NaiveDateTime) -> IntegrityReport {
    let mut warnings = Vec::new();
    let numero = |row: &SsaRow| row[SsaColumn::NumeroSsa.index()].display();

    let missing_required: Vec<String> = table
        .rows()
        .iter()
        .filter(|row| {
            [
                SsaColumn::NumeroSsa,
                SsaColumn::Situacao,
                SsaColumn::GrauPrioridadeEmissao,
            ]
            .iter()
            .any(|column| row[column.index()].is_empty())
        })
        .map(numero)
        .collect();
    if !missing_required.is_empty() {
        warnings.push(format!(
            "SSAs com dados obrigatórios faltando: {}",
            missing_required.join(", ")
        ));
    }

    let future_dates: Vec<String> = table
        .rows()
        .iter()
        .filter(|row| {
            row[SsaColumn::EmitidaEm.index()]
                .as_datetime()
                .is_some_and(|dt| dt > now)
        })
        .map(numero)
        .collect();
    if !future_dates.is_empty() {
        warnings.push(format!("SSAs com datas futuras: {}", future_dates.join(", ")));
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    for row in table.rows() {
        *seen.entry(numero(row)).or_default() += 1;
    }
    let duplicates: BTreeSet<String> = seen
        .into_iter()
        .filter(|(numero, count)| *count > 1 && !numero.is_empty())
        .map(|(numero, _)| numero)
        .collect();
    if !duplicates.is_empty() {
        warnings.push(format!(
            "SSAs duplicadas encontradas: {}",
            duplicates.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }

    for w in &warnings {
        warn!("Integrity: {}", w);
    }

    IntegrityReport {
        timestamp: now,
        total_records: table.len(),
        checks: IntegrityChecks {
            duplicates_found: duplicates.len(),
            future_dates_found: future_dates.len(),
            missing_required_found: missing_required.len(),
            total_warnings: warnings.len(),
        },
        warnings,
    }
}

/// SSAs attributed to one responsible
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponsavelEntry {
    pub total: usize,
    pub ssas: Vec<String>,
}

/// Result of [`diagnose_responsaveis`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponsavelDiagnosis {
    pub total_ssas: usize,
    /// Set when a sector filter was applied
    pub total_filtrado: Option<usize>,
    pub por_responsavel_exec: BTreeMap<String, ResponsavelEntry>,
    pub por_responsavel_prog: BTreeMap<String, ResponsavelEntry>,
}

/// Per-responsible totals, optionally limited to one issuing sector
pub fn diagnose_responsaveis(
    records: &[SsaRecord],
    setor_emissor: Option<&str>,
) -> ResponsavelDiagnosis {
    let mut diagnosis = ResponsavelDiagnosis {
        total_ssas: records.len(),
        ..Default::default()
    };

    let wanted = setor_emissor
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase);
    let filtered: Vec<&SsaRecord> = records
        .iter()
        .filter(|r| {
            wanted
                .as_ref()
                .map_or(true, |w| r.setor_emissor.to_uppercase() == *w)
        })
        .collect();
    if wanted.is_some() {
        diagnosis.total_filtrado = Some(filtered.len());
    }

    for record in filtered {
        if let Some(resp) = &record.responsavel_execucao {
            let entry = diagnosis
                .por_responsavel_exec
                .entry(resp.trim().to_uppercase())
                .or_default();
            entry.total += 1;
            entry.ssas.push(record.numero.clone());
        }
        if let Some(resp) = &record.responsavel_programacao {
            let entry = diagnosis
                .por_responsavel_prog
                .entry(resp.trim().to_uppercase())
                .or_default();
            entry.total += 1;
            entry.ssas.push(record.numero.clone());
        }
    }

    debug!(
        "Responsible diagnosis: {} execution, {} programming",
        diagnosis.por_responsavel_exec.len(),
        diagnosis.por_responsavel_prog.len()
    );
    diagnosis
}

/// A chart bar that disagrees with the records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDiscrepancy {
    pub responsavel: String,
    pub chart_count: usize,
    pub actual_count: usize,
}

/// Compare per-responsible chart counts with the execution responsibles in `records`
pub fn check_chart_consistency(
    records: &[&SsaRecord],
    chart_counts: &[(String, usize)],
) -> Vec<ChartDiscrepancy> {
    let mut actual: HashMap<&str, usize> = HashMap::new();
    for record in records {
        if let Some(resp) = &record.responsavel_execucao {
            *actual.entry(resp.as_str()).or_default() += 1;
        }
    }

    chart_counts
        .iter()
        .filter_map(|(resp, count)| {
            let actual_count = actual.get(resp.as_str()).copied().unwrap_or(0);
            (actual_count != *count).then(|| {
                warn!(
                    "Inconsistência para {}: gráfico={}, dados={}",
                    resp, count, actual_count
                );
                ChartDiscrepancy {
                    responsavel: resp.clone(),
                    chart_count: *count,
                    actual_count,
                }
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssueKind {
    InvalidDate,
    EmptyRequired,
}

/// A data-quality problem affecting one column of the table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityIssue {
    pub column: SsaColumn,
    pub kind: QualityIssueKind,
    pub count: usize,
    /// First few SSA numbers affected
    pub examples: Vec<String>,
}

/// Missing emission dates and empty required fields in the canonical table
pub fn data_quality_issues(table: &SsaTable) -> Vec<QualityIssue> {
    let mut issues = Vec::new();

    for column in SsaColumn::ALL.iter().filter(|c| c.is_required()) {
        let affected: Vec<String> = table
            .rows()
            .iter()
            .filter(|row| row[column.index()].is_empty())
            .map(|row| row[SsaColumn::NumeroSsa.index()].display())
            .collect();
        if affected.is_empty() {
            continue;
        }
        let kind = if *column == SsaColumn::EmitidaEm {
            QualityIssueKind::InvalidDate
        } else {
            QualityIssueKind::EmptyRequired
        };
        issues.push(QualityIssue {
            column: *column,
            kind,
            count: affected.len(),
            examples: affected.into_iter().take(QUALITY_EXAMPLES).collect(),
        });
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample_record;
    use crate::table::{empty_row, Cell};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_consistency_flags_responsible_without_sector() {
        let mut a = sample_record("1");
        a.responsavel_execucao = Some("JOAO".into());
        let mut b = sample_record("2");
        b.responsavel_execucao = Some("JOAO".into());
        b.setor_executor = String::new();
        let c = sample_record("3");

        let result = validate_consistency(&[a, b, c]);
        assert!(!result.is_valid);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].contains("SSA 2"));
        assert_eq!(result.statistics.resp_counts.get("JOAO"), Some(&2));
        assert_eq!(result.statistics.ssas_com_responsavel, 2);
        assert_eq!(result.statistics.ssas_sem_responsavel, 1);
        assert_eq!(result.statistics.setores_executores, 1);
    }

    fn integrity_row(numero: &str, situacao: &str, prioridade: &str) -> SsaRow {
        let mut row = empty_row();
        row[SsaColumn::NumeroSsa.index()] = Cell::Text(numero.into());
        row[SsaColumn::Situacao.index()] = Cell::Text(situacao.into());
        row[SsaColumn::GrauPrioridadeEmissao.index()] = Cell::Text(prioridade.into());
        row[SsaColumn::EmitidaEm.index()] = Cell::DateTime(now() - chrono::Duration::days(3));
        row
    }

    #[test]
    fn test_integrity_warnings() {
        let a = integrity_row("1", "APL", "S3.7");
        let b = integrity_row("1", "APL", "S3.7");
        let mut c = integrity_row("2", "APL", "S3.7");
        c[SsaColumn::EmitidaEm.index()] = Cell::DateTime(
            NaiveDate::from_ymd_opt(2024, 12, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );

        let report = verify_integrity(&SsaTable::from_rows(vec![a, b, c]), now());
        assert_eq!(report.total_records, 3);
        assert_eq!(report.checks.duplicates_found, 1);
        assert_eq!(report.checks.future_dates_found, 1);
        assert_eq!(report.checks.missing_required_found, 0);
        assert_eq!(report.checks.total_warnings, 2);
    }

    #[test]
    fn test_integrity_counts_rows_missing_required_fields() {
        let table = SsaTable::from_rows(vec![
            integrity_row("1", "APL", "S3.7"),
            integrity_row("2", "", "S3.7"),
            integrity_row("3", "APG", ""),
        ]);

        let report = verify_integrity(&table, now());
        assert_eq!(report.checks.missing_required_found, 2);
        assert_eq!(report.checks.total_warnings, 1);
        assert!(report.warnings[0].contains("2, 3"));
    }

    #[test]
    fn test_integrity_clean_data() {
        let table = SsaTable::from_rows(vec![
            integrity_row("1", "APL", "S3.7"),
            integrity_row("2", "APG", "S2"),
        ]);
        let report = verify_integrity(&table, now());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_diagnose_responsaveis_with_sector() {
        let mut a = sample_record("1");
        a.responsavel_execucao = Some("joao ".into());
        a.responsavel_programacao = Some("MARIA".into());
        let mut b = sample_record("2");
        b.setor_emissor = "OUTRO".into();
        b.responsavel_execucao = Some("JOAO".into());

        let records = vec![a, b];
        let all = diagnose_responsaveis(&records, None);
        assert_eq!(all.por_responsavel_exec["JOAO"].total, 2);
        assert_eq!(all.total_filtrado, None);

        let iee = diagnose_responsaveis(&records, Some("iee3"));
        assert_eq!(iee.total_filtrado, Some(1));
        assert_eq!(iee.por_responsavel_exec["JOAO"].ssas, vec!["1".to_string()]);
        assert_eq!(iee.por_responsavel_prog["MARIA"].total, 1);
    }

    #[test]
    fn test_chart_consistency() {
        let mut a = sample_record("1");
        a.responsavel_execucao = Some("JOAO".into());
        let records = vec![&a];
        let chart = vec![("JOAO".to_string(), 1), ("MARIA".to_string(), 2)];
        let discrepancies = check_chart_consistency(&records, &chart);
        assert_eq!(
            discrepancies,
            vec![ChartDiscrepancy {
                responsavel: "MARIA".into(),
                chart_count: 2,
                actual_count: 0
            }]
        );
    }

    #[test]
    fn test_quality_issues() {
        let mut row = empty_row();
        row[SsaColumn::NumeroSsa.index()] = Cell::Text("9".into());
        row[SsaColumn::Situacao.index()] = Cell::Text("APL".into());
        let table = SsaTable::from_rows(vec![row]);

        let issues = data_quality_issues(&table);
        let date = issues
            .iter()
            .find(|i| i.column == SsaColumn::EmitidaEm)
            .unwrap();
        assert_eq!(date.kind, QualityIssueKind::InvalidDate);
        assert_eq!(date.examples, vec!["9".to_string()]);
        assert!(issues.iter().all(|i| i.column != SsaColumn::Situacao));
        assert_eq!(issues.len(), 3);
    }
}
