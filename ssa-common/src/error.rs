//! Common error types for the SSA dashboard

use thiserror::Error;

/// Common result type for SSA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the SSA crates
#[derive(Error, Debug)]
pub enum Error {
    /// Workbook could not be opened or a worksheet could not be read
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Excel export failed (wraps rust_xlsxwriter::XlsxError)
    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<calamine::Error> for Error {
    fn from(e: calamine::Error) -> Self {
        Error::Spreadsheet(e.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::InvalidInput(format!("invalid file pattern: {}", e))
    }
}
