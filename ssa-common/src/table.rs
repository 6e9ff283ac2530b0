//! Canonical positional SSA table
//!
//! Every row holds exactly [`COLUMN_COUNT`] cells in registry order,
//! whatever the layout of the source spreadsheet was.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::columns::{SsaColumn, COLUMN_COUNT};

/// A coerced table cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Text content, `None` for empty and date cells
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Date content, `None` for anything else
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            Cell::DateTime(_) => false,
        }
    }

    /// Text rendering used for tables and exports
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::DateTime(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::DateTime(dt) => {
                serializer.serialize_str(&dt.format("%Y-%m-%d %H:%M:%S").to_string())
            }
        }
    }
}

/// One canonical row
pub type SsaRow = [Cell; COLUMN_COUNT];

/// In-memory SSA table in canonical column order
#[derive(Debug, Clone, Default, Serialize)]
pub struct SsaTable {
    rows: Vec<SsaRow>,
}

impl SsaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<SsaRow>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: SsaRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[SsaRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns (always the registry size)
    pub fn width(&self) -> usize {
        COLUMN_COUNT
    }

    /// Cell at `(row, column)`
    pub fn cell(&self, row: usize, column: SsaColumn) -> Option<&Cell> {
        self.rows.get(row).map(|r| &r[column.index()])
    }

    /// Iterate over one column
    pub fn column(&self, column: SsaColumn) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |r| &r[column.index()])
    }

    /// Keep only rows for which `keep` returns true, returning how many were removed
    pub fn retain<F: FnMut(&SsaRow) -> bool>(&mut self, keep: F) -> usize {
        let before = self.rows.len();
        self.rows.retain(keep);
        before - self.rows.len()
    }
}

/// An all-empty row
pub fn empty_row() -> SsaRow {
    std::array::from_fn(|_| Cell::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_row_has_registry_width() {
        let row = empty_row();
        assert_eq!(row.len(), COLUMN_COUNT);
        assert!(row.iter().all(Cell::is_empty));
    }

    #[test]
    fn test_column_access_by_registry() {
        let mut row = empty_row();
        row[SsaColumn::NumeroSsa.index()] = Cell::Text("SSA-1".into());
        let mut table = SsaTable::new();
        table.push(row);

        assert_eq!(table.width(), COLUMN_COUNT);
        assert_eq!(
            table.cell(0, SsaColumn::NumeroSsa).and_then(Cell::as_text),
            Some("SSA-1")
        );
        assert_eq!(table.column(SsaColumn::Situacao).count(), 1);
        assert!(table.cell(1, SsaColumn::NumeroSsa).is_none());
    }

    #[test]
    fn test_cell_display_formats_dates() {
        let dt = NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(Cell::DateTime(dt).display(), "01/09/2025 08:30");
        assert_eq!(Cell::Empty.display(), "");
        assert!(Cell::Text(String::new()).is_empty());
    }

    #[test]
    fn test_retain_counts_removed_rows() {
        let mut table = SsaTable::from_rows(vec![empty_row(), empty_row()]);
        let removed = table.retain(|r| !r[0].is_empty());
        assert_eq!(removed, 2);
        assert!(table.is_empty());
    }
}
