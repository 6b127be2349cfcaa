//! Error types for the biffwriter library

use thiserror::Error;

/// Result type alias for biffwriter operations
pub type Result<T> = std::result::Result<T, XlsError>;

/// Main error type for all workbook operations
///
/// Only [`XlsError::Io`] can occur with the default options. The remaining variants are
/// reported when strict validation is enabled, see
/// [`WriterOptions::strict`](crate::writer::WriterOptions::strict).
#[derive(Error, Debug)]
pub enum XlsError {
    /// The output file could not be opened, written or moved into place
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A cell or column refers to a style that was never registered
    #[error("Style {style} used at row {row}, column {col} is not registered")]
    InvalidStyle { row: u16, col: u16, style: u16 },

    /// A cell style refers to a font that was never registered
    #[error("Style {style} refers to unknown font {font}")]
    InvalidFont { style: u16, font: u16 },

    /// A column width override refers to a style that was never registered
    #[error("Style {style} used for columns {first_col}..={last_col} is not registered")]
    InvalidColumnStyle {
        first_col: u16,
        last_col: u16,
        style: u16,
    },

    /// Column index beyond the 256 columns a BIFF8 sheet can hold
    #[error("Column {col} exceeds the BIFF8 limit of 255")]
    ColumnOutOfRange { col: u16 },

    /// A range whose first row/column lies after its last one
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Two merge regions share at least one cell
    #[error("Merge region {first} overlaps merge region {second}")]
    OverlappingMerge { first: String, second: String },
}

impl From<tempfile::PersistError> for XlsError {
    fn from(err: tempfile::PersistError) -> Self {
        XlsError::Io(err.error)
    }
}
