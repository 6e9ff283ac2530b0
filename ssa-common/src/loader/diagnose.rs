//! Emission date diagnosis

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::warn;

use super::coerce::{coerce_datetime, coerce_text};
use super::RawCell;

/// Dates older than this many years are considered out of range
const MAX_AGE_YEARS: i64 = 30;

/// Dates further in the future than this are considered out of range
const MAX_FUTURE_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateProblemKind {
    Null,
    InvalidFormat,
    WrongType,
    OutOfRange,
}

/// One problematic date cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateProblem {
    /// 1-based sheet row
    pub row: usize,
    pub kind: DateProblemKind,
    pub value: String,
}

/// Summary of date quality in the emission column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateDiagnosis {
    pub total_rows: usize,
    pub null_values: usize,
    pub invalid_format: usize,
    pub wrong_type: usize,
    pub out_of_range: usize,
    pub problematic_rows: Vec<DateProblem>,
    /// Percentage of rows with any problem, two decimals
    pub error_rate: f64,
}

/// Classify every date cell, given as `(sheet_row, cell)` pairs
pub fn diagnose_dates<'a, I>(cells: I, now: NaiveDateTime) -> DateDiagnosis
where
    I: IntoIterator<Item = (usize, &'a RawCell)>,
{
    let oldest = now - Duration::days(MAX_AGE_YEARS * 365);
    let newest = now + Duration::days(MAX_FUTURE_DAYS);
    let mut diagnosis = DateDiagnosis::default();

    for (row, cell) in cells {
        diagnosis.total_rows += 1;

        let kind = match cell {
            RawCell::Bool(_) | RawCell::Error(_) => Some(DateProblemKind::WrongType),
            _ if coerce_text(cell).is_empty() => Some(DateProblemKind::Null),
            _ => match coerce_datetime(cell) {
                None => Some(DateProblemKind::InvalidFormat),
                Some(dt) if dt < oldest || dt > newest => Some(DateProblemKind::OutOfRange),
                Some(_) => None,
            },
        };

        if let Some(kind) = kind {
            match kind {
                DateProblemKind::Null => diagnosis.null_values += 1,
                DateProblemKind::InvalidFormat => diagnosis.invalid_format += 1,
                DateProblemKind::WrongType => diagnosis.wrong_type += 1,
                DateProblemKind::OutOfRange => diagnosis.out_of_range += 1,
            }
            diagnosis.problematic_rows.push(DateProblem {
                row,
                kind,
                value: cell.to_text(),
            });
        }
    }

    if diagnosis.total_rows > 0 {
        let rate = diagnosis.problematic_rows.len() as f64 / diagnosis.total_rows as f64 * 100.0;
        diagnosis.error_rate = (rate * 100.0).round() / 100.0;
    }

    if !diagnosis.problematic_rows.is_empty() {
        warn!(
            "Date diagnosis: {} of {} rows with problems ({:.2}%)",
            diagnosis.problematic_rows.len(),
            diagnosis.total_rows,
            diagnosis.error_rate
        );
    }

    diagnosis
}
