//! Header row detection

use std::collections::HashSet;

use super::RawCell;
use crate::columns::{lookup_header, normalize_header};

/// Rows inspected when looking for the header
pub const HEADER_SCAN_ROWS: usize = 30;

/// Fewest recognised columns a header row must contain
pub const MIN_HEADER_SCORE: usize = 2;

/// Outcome of header detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderGuess {
    /// Zero-based index into the scanned rows
    Found { row: usize, score: usize },
    Absent,
}

/// Number of distinct registry columns named in a row
pub fn header_score(row: &[RawCell]) -> usize {
    row.iter()
        .filter_map(|cell| match cell {
            RawCell::Text(s) => lookup_header(&normalize_header(s)).map(|(column, _)| column),
            _ => None,
        })
        .collect::<HashSet<_>>()
        .len()
}

/// Find the header among the first [`HEADER_SCAN_ROWS`] rows
///
/// The highest-scoring row wins; ties go to the earliest row.
pub fn detect_header(rows: &[Vec<RawCell>]) -> HeaderGuess {
    let mut best: Option<(usize, usize)> = None;

    for (index, row) in rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let score = header_score(row);
        if score < MIN_HEADER_SCORE {
            continue;
        }
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }

    match best {
        Some((row, score)) => HeaderGuess::Found { row, score },
        None => HeaderGuess::Absent,
    }
}
