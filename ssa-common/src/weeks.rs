//! Week-code handling
//!
//! Registration and programming weeks arrive as `YYYYWW` codes. Codes are
//! interpreted as ISO weeks so differences stay correct across year
//! boundaries.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::record::SsaRecord;

/// Bin width used once the weeks-in-state histogram gets too wide
const HISTOGRAM_BIN_WEEKS: i64 = 10;

/// Histograms switch to bins when the oldest SSA exceeds this many weeks
const HISTOGRAM_BIN_THRESHOLD: i64 = 50;

/// A validated `YYYYWW` week code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WeekCode {
    pub year: i32,
    pub week: u32,
}

impl WeekCode {
    /// Parse a six-digit code; year must be within 2000..=2100 and week within 1..=53
    pub fn parse(raw: &str) -> Option<WeekCode> {
        let s = raw.trim();
        let s = s.strip_suffix(".0").unwrap_or(s);
        if s.len() != 6 || !s.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let year: i32 = s[..4].parse().ok()?;
        let week: u32 = s[4..].parse().ok()?;
        if !(2000..=2100).contains(&year) || !(1..=53).contains(&week) {
            return None;
        }
        Some(WeekCode { year, week })
    }

    /// Week containing `date`
    pub fn from_date(date: NaiveDate) -> WeekCode {
        let iso = date.iso_week();
        WeekCode {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// Monday of this ISO week, clamped to the last week for 52-week years
    pub fn monday(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon).or_else(|| {
            NaiveDate::from_isoywd_opt(self.year, self.week.saturating_sub(1), Weekday::Mon)
        })
    }

    /// Whole weeks from `self` to `later` (negative when `later` is earlier)
    pub fn weeks_until(&self, later: &WeekCode) -> Option<i64> {
        let start = self.monday()?;
        let end = later.monday()?;
        Some((end - start).num_days() / 7)
    }
}

impl fmt::Display for WeekCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.week)
    }
}

/// SSAs sharing one week and priority
#[derive(Debug, Clone, Serialize)]
pub struct WeekBucket {
    pub year_week: String,
    pub year: i32,
    pub week: u32,
    pub prioridade: String,
    pub ssas: Vec<String>,
}

impl WeekBucket {
    pub fn count(&self) -> usize {
        self.ssas.len()
    }
}

/// Group SSAs by (week, priority), in chronological order
///
/// Uses the programmed week when `use_programmed` is set, the registration
/// week otherwise. Records without a valid code are skipped.
pub fn analyze_weeks(records: &[&SsaRecord], use_programmed: bool) -> Vec<WeekBucket> {
    let mut groups: BTreeMap<(WeekCode, String), Vec<String>> = BTreeMap::new();

    for record in records {
        let raw = if use_programmed {
            record.semana_programada.as_deref()
        } else {
            Some(record.semana_cadastro.as_str())
        };
        let Some(code) = raw.and_then(WeekCode::parse) else {
            continue;
        };
        groups
            .entry((code, record.prioridade_emissao.clone()))
            .or_default()
            .push(record.numero.clone());
    }

    groups
        .into_iter()
        .map(|((code, prioridade), ssas)| WeekBucket {
            year_week: code.to_string(),
            year: code.year,
            week: code.week,
            prioridade,
            ssas,
        })
        .collect()
}

/// Non-negative number of weeks an SSA has spent since registration
pub fn weeks_in_state(record: &SsaRecord, today: NaiveDate) -> Option<i64> {
    let registered = WeekCode::parse(&record.semana_cadastro)?;
    let current = WeekCode::from_date(today);
    registered.weeks_until(&current).map(|w| w.max(0))
}

/// One histogram bar
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBucket {
    pub label: String,
    pub ssas: Vec<String>,
}

/// Distribution of SSAs by time in their current state
///
/// One bar per week count (`"N semanas"`); when the oldest SSA exceeds
/// fifty weeks, ten-week bins (`"0-9 semanas"`) are used instead.
pub fn weeks_in_state_histogram(records: &[&SsaRecord], today: NaiveDate) -> Vec<HistogramBucket> {
    let aged: Vec<(i64, &str)> = records
        .iter()
        .filter_map(|r| weeks_in_state(r, today).map(|w| (w, r.numero.as_str())))
        .collect();

    let Some(max_weeks) = aged.iter().map(|(w, _)| *w).max() else {
        return Vec::new();
    };

    let mut buckets: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    let binned = max_weeks > HISTOGRAM_BIN_THRESHOLD;
    for (weeks, numero) in aged {
        let key = if binned {
            weeks / HISTOGRAM_BIN_WEEKS
        } else {
            weeks
        };
        buckets.entry(key).or_default().push(numero.to_string());
    }

    buckets
        .into_iter()
        .map(|(key, ssas)| {
            let label = if binned {
                let start = key * HISTOGRAM_BIN_WEEKS;
                format!("{}-{} semanas", start, start + HISTOGRAM_BIN_WEEKS - 1)
            } else {
                format!("{} semanas", key)
            };
            HistogramBucket { label, ssas }
        })
        .collect()
}
