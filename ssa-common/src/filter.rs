//! Dashboard filters

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::record::SsaRecord;
use crate::time::parse_datetime;

/// Filter selection from the dashboard dropdowns
///
/// Every field is optional and blank values mean "no restriction". Text
/// comparisons ignore case and surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaFilter {
    pub resp_prog: Option<String>,
    pub resp_exec: Option<String>,
    pub setor_emissor: Option<String>,
    pub setor_executor: Option<String>,
    pub prioridade: Option<String>,
    pub situacao: Option<String>,
    #[serde(deserialize_with = "blank_date")]
    pub data_inicio: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_date")]
    pub data_fim: Option<NaiveDate>,
}

/// Accepts `YYYY-MM-DD`, `dd/mm/YYYY` or an empty string
fn blank_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_datetime(s)
            .map(|dt| Some(dt.date()))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", s))),
    }
}

fn wanted(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
}

fn same(actual: Option<&str>, wanted: &Option<String>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual.is_some_and(|a| a.trim().to_uppercase() == *w),
    }
}

impl SsaFilter {
    /// True when no field restricts the view
    pub fn is_empty(&self) -> bool {
        wanted(&self.resp_prog).is_none()
            && wanted(&self.resp_exec).is_none()
            && wanted(&self.setor_emissor).is_none()
            && wanted(&self.setor_executor).is_none()
            && wanted(&self.prioridade).is_none()
            && wanted(&self.situacao).is_none()
            && self.data_inicio.is_none()
            && self.data_fim.is_none()
    }

    pub fn matches(&self, record: &SsaRecord) -> bool {
        if !same(record.responsavel_programacao.as_deref(), &wanted(&self.resp_prog))
            || !same(record.responsavel_execucao.as_deref(), &wanted(&self.resp_exec))
            || !same(Some(record.setor_emissor.as_str()), &wanted(&self.setor_emissor))
            || !same(Some(record.setor_executor.as_str()), &wanted(&self.setor_executor))
            || !same(Some(record.prioridade_emissao.as_str()), &wanted(&self.prioridade))
            || !same(Some(record.situacao.as_str()), &wanted(&self.situacao))
        {
            return false;
        }

        if self.data_inicio.is_some() || self.data_fim.is_some() {
            let Some(date) = record.emitida_em.map(|dt| dt.date()) else {
                return false;
            };
            if self.data_inicio.is_some_and(|start| date < start)
                || self.data_fim.is_some_and(|end| date > end)
            {
                return false;
            }
        }

        true
    }

    /// Records passing the filter, in their original order
    pub fn apply<'a>(&self, records: &'a [SsaRecord]) -> Vec<&'a SsaRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Distinct values offered by each dropdown, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub resp_prog: Vec<String>,
    pub resp_exec: Vec<String>,
    pub setor_emissor: Vec<String>,
    pub setor_executor: Vec<String>,
    pub prioridade: Vec<String>,
    pub situacao: Vec<String>,
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

impl FilterOptions {
    pub fn from_records(records: &[SsaRecord]) -> Self {
        FilterOptions {
            resp_prog: distinct(records.iter().map(|r| r.responsavel_programacao.as_deref())),
            resp_exec: distinct(records.iter().map(|r| r.responsavel_execucao.as_deref())),
            setor_emissor: distinct(records.iter().map(|r| Some(r.setor_emissor.as_str()))),
            setor_executor: distinct(records.iter().map(|r| Some(r.setor_executor.as_str()))),
            prioridade: distinct(records.iter().map(|r| Some(r.prioridade_emissao.as_str()))),
            situacao: distinct(records.iter().map(|r| Some(r.situacao.as_str()))),
        }
    }
}
