//! # SSA Common Library
//!
//! Shared code for the SSA dashboard including:
//! - Column registry for the work-order spreadsheet layout
//! - Spreadsheet loading, header detection and column reconciliation
//! - Typed record model and consistency validation
//! - KPI and week aggregation helpers
//! - Dashboard filters, source file discovery and exports
//! - Configuration loading and dashboard events

pub mod columns;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod files;
pub mod filter;
pub mod kpi;
pub mod loader;
pub mod record;
pub mod sse;
pub mod table;
pub mod time;
pub mod validator;
pub mod weeks;

pub use columns::SsaColumn;
pub use error::{Error, Result};
pub use filter::SsaFilter;
pub use loader::{load_workbook, LoadOptions, LoadOutcome, LoadReport};
pub use record::SsaRecord;
pub use table::{Cell, SsaTable};
