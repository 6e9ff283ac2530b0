//! Per-cell type coercion

use chrono::NaiveDateTime;

use super::RawCell;
use crate::columns::ColumnKind;
use crate::table::Cell;
use crate::time::{excel_serial_to_datetime, parse_datetime};

/// Placeholder for an unknown week
const UNKNOWN_WEEK: &str = "000000";

/// Spellings of a missing value left behind by earlier tooling
const NULL_MARKERS: [&str; 4] = ["nan", "none", "nat", "null"];

/// Trimmed text, with null markers mapped to the empty string
pub fn coerce_text(cell: &RawCell) -> String {
    let text = cell.to_text();
    if NULL_MARKERS.iter().any(|m| text.eq_ignore_ascii_case(m)) {
        String::new()
    } else {
        text
    }
}

/// Six-digit `YYYYWW` code, `000000` when the value is not numeric
pub fn coerce_week(cell: &RawCell) -> String {
    let number = match cell {
        RawCell::Number(n) => Some(*n),
        RawCell::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() && n >= 0.0 && n < 1_000_000.0 => {
            format!("{:06}", n.trunc() as u32)
        }
        _ => UNKNOWN_WEEK.to_string(),
    }
}

/// Date and time from a serial, ISO string or formatted text
pub fn coerce_datetime(cell: &RawCell) -> Option<NaiveDateTime> {
    match cell {
        RawCell::DateTime(serial) | RawCell::Number(serial) => excel_serial_to_datetime(*serial),
        RawCell::Text(s) | RawCell::Iso(s) => parse_datetime(s),
        _ => None,
    }
}

/// Coerce a raw cell into the canonical cell for a column kind
pub fn coerce_cell(cell: &RawCell, kind: ColumnKind) -> Cell {
    let text_cell = |s: String| {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    };

    match kind {
        ColumnKind::Text | ColumnKind::OptionalText => text_cell(coerce_text(cell)),
        ColumnKind::UpperText | ColumnKind::OptionalUpperText => {
            text_cell(coerce_text(cell).to_uppercase())
        }
        ColumnKind::WeekCode => Cell::Text(coerce_week(cell)),
        ColumnKind::OptionalWeekCode => {
            let week = coerce_week(cell);
            if week == UNKNOWN_WEEK {
                Cell::Empty
            } else {
                Cell::Text(week)
            }
        }
        ColumnKind::DateTime => coerce_datetime(cell)
            .map(Cell::DateTime)
            .unwrap_or(Cell::Empty),
    }
}
