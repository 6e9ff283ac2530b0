//! Column reconciliation
//!
//! Maps source columns onto the registry in four passes: exact display
//! name, listed synonym, near-synonym (Jaro-Winkler) and, for required
//! columns still missing, inference from the data itself. Each registry
//! column and each source column is used at most once.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strsim::jaro_winkler;
use tracing::{debug, info};

use super::RawCell;
use crate::columns::{lookup_header, normalize_header, SsaColumn};
use crate::time::parse_datetime;

/// Minimum Jaro-Winkler similarity for a near-synonym
const FUZZY_THRESHOLD: f64 = 0.93;

/// Minimum fraction of sampled values matching a column signature
const INFERENCE_THRESHOLD: f64 = 0.8;

/// Non-empty values sampled per source column during inference
const INFERENCE_SAMPLES: usize = 50;

static NUMERO_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(SSA-?)?\d+$").expect("valid regex"));
static STATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid regex"));
static PRIORITY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^S\d+(\.\d+)?$").expect("valid regex"));
static SECTOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,}[A-Z0-9.\-]*$").expect("valid regex"));

/// How a source column was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Synonym,
    Fuzzy,
    Inferred,
}

/// One registry column bound to a source column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMatch {
    pub column: SsaColumn,
    pub source_index: usize,
    pub source_header: Option<String>,
    pub kind: MatchKind,
    /// Similarity for fuzzy matches, sample match rate for inferred ones, 1.0 otherwise
    pub score: f64,
}

/// Source-to-registry column assignment
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnMapping {
    pub matches: Vec<ColumnMatch>,
    pub unmapped: Vec<SsaColumn>,
    pub ignored_headers: Vec<String>,
}

impl ColumnMapping {
    /// Source column index bound to `column`
    pub fn source_for(&self, column: SsaColumn) -> Option<usize> {
        self.match_for(column).map(|m| m.source_index)
    }

    pub fn match_for(&self, column: SsaColumn) -> Option<&ColumnMatch> {
        self.matches.iter().find(|m| m.column == column)
    }

    /// Required registry columns left without a source
    pub fn missing_required(&self) -> Vec<SsaColumn> {
        self.unmapped
            .iter()
            .copied()
            .filter(|c| c.is_required())
            .collect()
    }
}

struct Assignment {
    matches: Vec<ColumnMatch>,
    used_columns: HashSet<SsaColumn>,
    used_sources: HashSet<usize>,
}

impl Assignment {
    fn bind(&mut self, m: ColumnMatch) -> bool {
        if self.used_columns.contains(&m.column) || self.used_sources.contains(&m.source_index) {
            return false;
        }
        self.used_columns.insert(m.column);
        self.used_sources.insert(m.source_index);
        self.matches.push(m);
        true
    }
}

/// Reconcile source headers (possibly empty) and data rows against the registry
pub fn reconcile(headers: &[String], data: &[Vec<RawCell>]) -> ColumnMapping {
    let width = data
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    let mut assignment = Assignment {
        matches: Vec::new(),
        used_columns: HashSet::new(),
        used_sources: HashSet::new(),
    };

    // Exact before synonym, so a synonym never steals an exact header's column
    for want_exact in [true, false] {
        for (index, norm) in normalized.iter().enumerate() {
            if let Some((column, exact)) = lookup_header(norm) {
                if exact == want_exact {
                    assignment.bind(ColumnMatch {
                        column,
                        source_index: index,
                        source_header: Some(headers[index].trim().to_string()),
                        kind: if exact {
                            MatchKind::Exact
                        } else {
                            MatchKind::Synonym
                        },
                        score: 1.0,
                    });
                }
            }
        }
    }

    fuzzy_pass(headers, &normalized, &mut assignment);
    inference_pass(data, width, &mut assignment);

    let mut matches = assignment.matches;
    matches.sort_by_key(|m| m.column);

    let unmapped: Vec<SsaColumn> = SsaColumn::ALL
        .iter()
        .copied()
        .filter(|c| !assignment.used_columns.contains(c))
        .collect();

    let ignored_headers: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| !assignment.used_sources.contains(i) && !h.trim().is_empty())
        .map(|(_, h)| h.trim().to_string())
        .collect();

    info!(
        "Column mapping: {} matched, {} unmapped, {} ignored",
        matches.len(),
        unmapped.len(),
        ignored_headers.len()
    );

    ColumnMapping {
        matches,
        unmapped,
        ignored_headers,
    }
}

fn fuzzy_pass(headers: &[String], normalized: &[String], assignment: &mut Assignment) {
    let mut candidates: Vec<(f64, SsaColumn, usize)> = Vec::new();

    for (index, norm) in normalized.iter().enumerate() {
        if norm.is_empty() || assignment.used_sources.contains(&index) {
            continue;
        }
        for column in SsaColumn::ALL {
            if assignment.used_columns.contains(&column) {
                continue;
            }
            let best = std::iter::once(normalize_header(column.display_name()))
                .chain(column.synonyms().iter().map(|s| s.to_string()))
                .map(|name| jaro_winkler(norm, &name))
                .fold(0.0_f64, f64::max);
            if best >= FUZZY_THRESHOLD {
                candidates.push((best, column, index));
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    for (score, column, index) in candidates {
        if assignment.bind(ColumnMatch {
            column,
            source_index: index,
            source_header: Some(headers[index].trim().to_string()),
            kind: MatchKind::Fuzzy,
            score,
        }) {
            debug!(
                "Fuzzy match '{}' -> {} ({:.3})",
                headers[index].trim(),
                column.display_name(),
                score
            );
        }
    }
}

/// Does a sampled value look like it belongs to `column`?
fn matches_signature(column: SsaColumn, cell: &RawCell) -> bool {
    let text = cell.to_text();
    match column {
        SsaColumn::NumeroSsa => NUMERO_PATTERN.is_match(&text),
        SsaColumn::Situacao => STATE_PATTERN.is_match(&text),
        SsaColumn::GrauPrioridadeEmissao => PRIORITY_PATTERN.is_match(&text),
        SsaColumn::EmitidaEm => match cell {
            RawCell::DateTime(_) => true,
            RawCell::Text(s) | RawCell::Iso(s) => parse_datetime(s).is_some(),
            _ => false,
        },
        SsaColumn::SetorExecutor => {
            SECTOR_PATTERN.is_match(&text) && !NUMERO_PATTERN.is_match(&text)
        }
        _ => false,
    }
}

fn inference_pass(data: &[Vec<RawCell>], width: usize, assignment: &mut Assignment) {
    let targets: Vec<SsaColumn> = SsaColumn::ALL
        .iter()
        .copied()
        .filter(|c| c.is_required() && !assignment.used_columns.contains(c))
        .collect();
    if targets.is_empty() {
        return;
    }

    let mut candidates: Vec<(f64, SsaColumn, usize)> = Vec::new();
    for index in (0..width).filter(|i| !assignment.used_sources.contains(i)) {
        let samples: Vec<&RawCell> = data
            .iter()
            .filter_map(|row| row.get(index))
            .filter(|cell| !cell.is_empty())
            .take(INFERENCE_SAMPLES)
            .collect();
        if samples.is_empty() {
            continue;
        }
        for column in &targets {
            let hits = samples
                .iter()
                .filter(|cell| matches_signature(*column, cell))
                .count();
            let score = hits as f64 / samples.len() as f64;
            if score >= INFERENCE_THRESHOLD {
                candidates.push((score, *column, index));
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    for (score, column, index) in candidates {
        if assignment.bind(ColumnMatch {
            column,
            source_index: index,
            source_header: None,
            kind: MatchKind::Inferred,
            score,
        }) {
            info!(
                "Inferred {} from source column {} ({:.0}% of samples)",
                column.display_name(),
                index + 1,
                score * 100.0
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    #[test]
    fn test_exact_and_synonym_matches() {
        let mapping = reconcile(&headers(&["Número da SSA", "Status", "Foo"]), &[]);
        let numero = mapping.match_for(SsaColumn::NumeroSsa).unwrap();
        assert_eq!(numero.kind, MatchKind::Exact);
        assert_eq!(numero.source_index, 0);
        let state = mapping.match_for(SsaColumn::Situacao).unwrap();
        assert_eq!(state.kind, MatchKind::Synonym);
        assert_eq!(mapping.ignored_headers, vec!["Foo".to_string()]);
    }

    #[test]
    fn test_exact_beats_earlier_synonym() {
        // "Estado" is a synonym for Situação, but the exact header comes later
        let mapping = reconcile(&headers(&["Estado", "Situação"]), &[]);
        assert_eq!(mapping.source_for(SsaColumn::Situacao), Some(1));
        assert_eq!(mapping.match_for(SsaColumn::Situacao).unwrap().kind, MatchKind::Exact);
    }

    #[test]
    fn test_fuzzy_match_tolerates_typos() {
        let mapping = reconcile(&headers(&["Setor Executorr", "Equipamentto"]), &[]);
        let sector = mapping.match_for(SsaColumn::SetorExecutor).unwrap();
        assert_eq!(sector.kind, MatchKind::Fuzzy);
        assert!(sector.score >= FUZZY_THRESHOLD);
        assert_eq!(mapping.source_for(SsaColumn::Equipamento), Some(1));
    }

    #[test]
    fn test_inference_for_headerless_data() {
        let rows: Vec<Vec<RawCell>> = (0..10)
            .map(|i| {
                vec![
                    text(&format!("{}", 2024000 + i)),
                    text("APL"),
                    text("Bomba de recalque"),
                    RawCell::DateTime(45000.0 + i as f64),
                    text("MEL4"),
                    text("S3.7"),
                ]
            })
            .collect();
        let mapping = reconcile(&[], &rows);

        assert_eq!(mapping.source_for(SsaColumn::NumeroSsa), Some(0));
        assert_eq!(mapping.source_for(SsaColumn::Situacao), Some(1));
        assert_eq!(mapping.source_for(SsaColumn::EmitidaEm), Some(3));
        assert_eq!(mapping.source_for(SsaColumn::SetorExecutor), Some(4));
        assert_eq!(mapping.source_for(SsaColumn::GrauPrioridadeEmissao), Some(5));
        assert!(mapping
            .matches
            .iter()
            .all(|m| m.kind == MatchKind::Inferred));
        // Optional columns are never inferred
        assert_eq!(mapping.source_for(SsaColumn::Equipamento), None);
        assert!(mapping.missing_required().is_empty());
    }

    #[test]
    fn test_inference_needs_most_samples_to_match() {
        let rows: Vec<Vec<RawCell>> = (0..10)
            .map(|i| {
                let value = if i < 7 { "S3.7" } else { "alta" };
                vec![text(value)]
            })
            .collect();
        let mapping = reconcile(&[], &rows);
        assert_eq!(mapping.source_for(SsaColumn::GrauPrioridadeEmissao), None);
        assert!(mapping
            .missing_required()
            .contains(&SsaColumn::GrauPrioridadeEmissao));
    }

    #[test]
    fn test_inference_skips_assigned_sources() {
        let rows = vec![vec![text("1"), text("APL")]];
        let mapping = reconcile(&headers(&["Número da SSA", ""]), &rows);
        assert_eq!(mapping.source_for(SsaColumn::NumeroSsa), Some(0));
        assert_eq!(mapping.source_for(SsaColumn::Situacao), Some(1));
        assert_eq!(
            mapping.match_for(SsaColumn::Situacao).unwrap().kind,
            MatchKind::Inferred
        );
    }
}
