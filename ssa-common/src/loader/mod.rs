//! Spreadsheet loader
//!
//! Reads an SSA export, locates its header row, reconciles source columns
//! against the registry and coerces every cell into the canonical table.
//! Problems with individual rows, dates or columns are logged and recorded
//! in the [`LoadReport`]; only unreadable workbooks fail the load.

mod coerce;
mod diagnose;
mod header;
mod reconcile;

pub use coerce::{coerce_cell, coerce_datetime, coerce_text, coerce_week};
pub use diagnose::{diagnose_dates, DateDiagnosis, DateProblem, DateProblemKind};
pub use header::{detect_header, header_score, HeaderGuess, HEADER_SCAN_ROWS, MIN_HEADER_SCORE};
pub use reconcile::{reconcile, ColumnMapping, ColumnMatch, MatchKind};

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::columns::{ColumnKind, SsaColumn};
use crate::error::{Error, Result};
use crate::record::SsaRecord;
use crate::table::{empty_row, Cell, SsaRow, SsaTable};
use crate::time::{self, excel_serial_to_datetime};
use crate::validator::{
    data_quality_issues, validate_consistency, verify_integrity, IntegrityReport, QualityIssue,
    ValidationResult,
};

/// A worksheet cell as read, before coercion
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date
    DateTime(f64),
    /// ISO 8601 date string stored by ODS workbooks
    Iso(String),
    Error(String),
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Textual rendering used for headers, text columns and pattern matching
    pub fn to_text(&self) -> String {
        match self {
            RawCell::Empty | RawCell::Error(_) => String::new(),
            RawCell::Text(s) | RawCell::Iso(s) => s.trim().to_string(),
            RawCell::Number(n) => format_number(*n),
            RawCell::Bool(b) => b.to_string(),
            RawCell::DateTime(serial) => excel_serial_to_datetime(*serial)
                .map(|dt| dt.format("%d/%m/%Y %H:%M:%S").to_string())
                .unwrap_or_else(|| format_number(*serial)),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&Data> for RawCell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => RawCell::Empty,
            Data::String(s) => RawCell::Text(s.clone()),
            Data::Int(n) => RawCell::Number(*n as f64),
            Data::Float(f) => RawCell::Number(*f),
            Data::Bool(b) => RawCell::Bool(*b),
            Data::DateTime(dt) => RawCell::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) => RawCell::Iso(s.clone()),
            Data::DurationIso(s) => RawCell::Text(s.clone()),
            Data::Error(e) => RawCell::Error(format!("{:?}", e)),
        }
    }
}

/// A worksheet read into memory
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,
    /// Zero-based sheet row of `rows[0]`
    pub first_row: usize,
    pub rows: Vec<Vec<RawCell>>,
}

/// Loader settings
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Worksheet to read; the first one when unset
    pub sheet: Option<String>,
    /// Reference time for date diagnosis and integrity checks; wall clock when unset
    pub now: Option<NaiveDateTime>,
}

/// Everything learned while loading a workbook
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub sheet: String,
    /// 1-based sheet row of the detected header
    pub header_row: Option<usize>,
    pub mapping: ColumnMapping,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub invalid_dates: usize,
    pub records_built: usize,
    pub record_errors: Vec<String>,
    pub date_diagnosis: Option<DateDiagnosis>,
    pub validation: ValidationResult,
    pub integrity: IntegrityReport,
    pub quality_issues: Vec<QualityIssue>,
    pub warnings: Vec<String>,
}

/// Result of a successful load
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub table: SsaTable,
    pub records: Vec<SsaRecord>,
    pub report: LoadReport,
}

/// Read one worksheet of a workbook into memory
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<SheetData> {
    if !path.exists() {
        return Err(Error::NotFound(format!("{}", path.display())));
    }

    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("worksheet '{}'", wanted)))?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| Error::Spreadsheet("workbook has no worksheets".to_string()))?,
    };

    let range = workbook.worksheet_range(&name)?;
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let first_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let rows = range
        .rows()
        .map(|row| {
            let mut cells = vec![RawCell::Empty; first_col];
            cells.extend(row.iter().map(RawCell::from));
            cells
        })
        .collect();

    Ok(SheetData {
        name,
        first_row,
        rows,
    })
}

/// Load an SSA workbook from disk
pub fn load_workbook(path: &Path, options: &LoadOptions) -> Result<LoadOutcome> {
    info!("Loading SSA workbook: {}", path.display());
    let sheet = read_sheet(path, options.sheet.as_deref())?;
    load_sheet(sheet, options)
}

/// Turn an in-memory worksheet into the canonical table and records
pub fn load_sheet(sheet: SheetData, options: &LoadOptions) -> Result<LoadOutcome> {
    let now = options.now.unwrap_or_else(time::now);
    let SheetData {
        name,
        first_row,
        rows,
    } = sheet;

    if rows.iter().all(|row| row.iter().all(RawCell::is_empty)) {
        return Err(Error::InvalidInput(format!("worksheet '{}' is empty", name)));
    }

    let mut warnings = Vec::new();

    let guess = detect_header(&rows);
    let (headers, data_start, header_row) = match guess {
        HeaderGuess::Found { row, score } => {
            debug!("Header found at sheet row {} (score {})", first_row + row + 1, score);
            let headers: Vec<String> = rows[row].iter().map(RawCell::to_text).collect();
            (headers, row + 1, Some(first_row + row + 1))
        }
        HeaderGuess::Absent => {
            warn!("No header row found in '{}'; inferring columns from data", name);
            warnings.push("no header row found; columns inferred from data".to_string());
            (Vec::new(), 0, None)
        }
    };
    let data = &rows[data_start..];

    let mapping = reconcile(&headers, data);
    for column in mapping.missing_required() {
        let message = format!("required column '{}' not found", column.display_name());
        warn!("{}", message);
        warnings.push(message);
    }

    let date_diagnosis = mapping.source_for(SsaColumn::EmitidaEm).map(|source| {
        let cells = data.iter().enumerate().map(|(i, row)| {
            (
                first_row + data_start + i + 1,
                row.get(source).unwrap_or(&RawCell::Empty),
            )
        });
        diagnose_dates(cells, now)
    });

    let mut table = SsaTable::new();
    let mut invalid_dates = 0;
    for (i, raw) in data.iter().enumerate() {
        let sheet_row = first_row + data_start + i + 1;
        let (row, bad_date) = coerce_row(raw, &mapping);
        if let Some(value) = bad_date {
            invalid_dates += 1;
            warn!("Row {}: invalid date '{}'", sheet_row, value);
        }
        table.push(row);
    }

    let rows_read = table.len();
    let rows_dropped = table.retain(|row| !row[SsaColumn::NumeroSsa.index()].is_empty());
    if rows_dropped > 0 {
        info!("Dropped {} rows without an SSA number", rows_dropped);
    }

    let mut records = Vec::with_capacity(table.len());
    let mut record_errors = Vec::new();
    for row in table.rows() {
        match SsaRecord::from_row(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                let numero = row[SsaColumn::NumeroSsa.index()].display();
                debug!("SSA {} skipped: {}", numero, e);
                record_errors.push(format!("SSA {}: {}", numero, e));
            }
        }
    }
    if !record_errors.is_empty() {
        warn!("{} rows could not become records", record_errors.len());
    }

    let validation = validate_consistency(&records);
    let integrity = verify_integrity(&table, now);
    warnings.extend(integrity.warnings.iter().cloned());
    let quality_issues = data_quality_issues(&table);

    info!(
        "Loaded {} SSAs from '{}' ({} rows read, {} dropped, {} invalid dates)",
        records.len(),
        name,
        rows_read,
        rows_dropped,
        invalid_dates
    );

    let report = LoadReport {
        sheet: name,
        header_row,
        mapping,
        rows_read,
        rows_dropped,
        invalid_dates,
        records_built: records.len(),
        record_errors,
        date_diagnosis,
        validation,
        integrity,
        quality_issues,
        warnings,
    };

    Ok(LoadOutcome {
        table,
        records,
        report,
    })
}

/// Coerce one source row into registry order
///
/// Returns the row and the raw text of an unparseable emission date, if any.
fn coerce_row(raw: &[RawCell], mapping: &ColumnMapping) -> (SsaRow, Option<String>) {
    let mut row = empty_row();
    let mut bad_date = None;

    for column in SsaColumn::ALL {
        let source = mapping
            .source_for(column)
            .and_then(|index| raw.get(index))
            .unwrap_or(&RawCell::Empty);
        let cell = coerce_cell(source, column.kind());
        if column.kind() == ColumnKind::DateTime
            && cell == Cell::Empty
            && !coerce_text(source).is_empty()
        {
            bad_date = Some(source.to_text());
        }
        row[column.index()] = cell;
    }

    (row, bad_date)
}
