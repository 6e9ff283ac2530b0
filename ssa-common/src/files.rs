//! Source file discovery
//!
//! The maintenance portal names its exports with an embedded 12-hour
//! timestamp, e.g. `SSAs Pendentes Geral - 01-09-2025_0830AM.xlsx`. The
//! newest export is picked from that timestamp, not from file metadata.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Key of the pending-SSA export pattern
pub const SSA_PENDENTES: &str = "ssa_pendentes";

/// Key of the programmed-SSA export pattern
pub const SSA_PROGRAMADAS: &str = "ssa_programadas";

const PENDENTES_PATTERN: &str =
    r"^SSAs Pendentes Geral - (\d{2})-(\d{2})-(\d{4})_(\d{4})(AM|PM)\.xlsx$";
const PROGRAMADAS_PATTERN: &str =
    r"^SSAs Programadas - (\d{2})-(\d{2})-(\d{4})_(\d{4})(AM|PM)\.xlsx$";

/// Named file-name patterns
///
/// Patterns with the five capture groups day, month, year, `HHMM` and
/// `AM|PM` are ordered by embedded timestamp; other patterns fall back to
/// modification time.
#[derive(Debug, Clone)]
pub struct FilePatterns {
    patterns: BTreeMap<String, Regex>,
}

impl FilePatterns {
    /// Built-in patterns for the two portal exports
    pub fn new() -> Result<Self> {
        let mut patterns = FilePatterns {
            patterns: BTreeMap::new(),
        };
        patterns.register(SSA_PENDENTES, PENDENTES_PATTERN)?;
        patterns.register(SSA_PROGRAMADAS, PROGRAMADAS_PATTERN)?;
        Ok(patterns)
    }

    /// Add or replace a pattern
    pub fn register(&mut self, key: &str, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern)?;
        self.patterns.insert(key.to_string(), regex);
        debug!("Registered file pattern '{}'", key);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Regex> {
        self.patterns.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    /// Newest file in `dir` whose name matches the pattern under `key`
    pub fn latest_file(&self, dir: &Path, key: &str) -> Result<PathBuf> {
        let pattern = self
            .get(key)
            .ok_or_else(|| Error::InvalidInput(format!("unknown file pattern '{}'", key)))?;
        if !dir.is_dir() {
            return Err(Error::NotFound(format!("directory '{}'", dir.display())));
        }

        let mut latest: Option<(NaiveDateTime, PathBuf)> = None;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(captures) = pattern.captures(name) else {
                continue;
            };
            let stamp = match timestamp_from_captures(&captures) {
                Some(stamp) => stamp,
                None => match modified_time(&path) {
                    Some(stamp) => stamp,
                    None => {
                        warn!("Skipping '{}': no usable timestamp", name);
                        continue;
                    }
                },
            };
            if latest.as_ref().map_or(true, |(best, _)| stamp > *best) {
                latest = Some((stamp, path));
            }
        }

        match latest {
            Some((stamp, path)) => {
                info!(
                    "Latest file: {} ({})",
                    path.display(),
                    stamp.format("%d/%m/%Y %H:%M")
                );
                Ok(path)
            }
            None => Err(Error::NotFound(format!(
                "no file matching '{}' in '{}'",
                key,
                dir.display()
            ))),
        }
    }
}

/// Timestamp embedded in a portal export name, 12-hour clock converted
pub fn timestamp_from_captures(captures: &Captures<'_>) -> Option<NaiveDateTime> {
    if captures.len() < 6 {
        return None;
    }
    let day: u32 = captures.get(1)?.as_str().parse().ok()?;
    let month: u32 = captures.get(2)?.as_str().parse().ok()?;
    let year: i32 = captures.get(3)?.as_str().parse().ok()?;
    let clock = captures.get(4)?.as_str();
    let period = captures.get(5)?.as_str();
    if clock.len() != 4 || !clock.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut hour: u32 = clock.get(..2)?.parse().ok()?;
    let minute: u32 = clock.get(2..)?.parse().ok()?;

    match period {
        "PM" if hour != 12 => hour += 12,
        "AM" if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}

/// True when `path` is an existing, readable regular file
pub fn validate_file(path: &Path) -> bool {
    if !path.exists() {
        warn!("File not found: {}", path.display());
        return false;
    }
    if !path.is_file() {
        warn!("Not a file: {}", path.display());
        return false;
    }
    if let Err(e) = fs::File::open(path) {
        warn!("File not readable: {}: {}", path.display(), e);
        return false;
    }
    true
}

/// Metadata of a source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub is_valid: bool,
}

pub fn file_info(path: &Path) -> Result<FileInfo> {
    if !path.exists() {
        return Err(Error::NotFound(format!("{}", path.display())));
    }
    let metadata = fs::metadata(path)?;
    let to_local = |t: std::time::SystemTime| DateTime::<Local>::from(t).naive_local();

    Ok(FileInfo {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        size: metadata.len(),
        created: metadata.created().ok().map(to_local),
        modified: metadata.modified().ok().map(to_local),
        is_valid: validate_file(path),
    })
}
