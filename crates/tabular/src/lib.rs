//! Typed tables parsed from delimited text
//!
//! Reads a header row plus data rows, infers one type per column
//! (integer, float, text) and exposes the column statistics the upload
//! service needs: mean, value counts and a row-oriented preview.

mod cell;
mod column;
mod reader;
mod table;

pub use cell::{is_missing_token, Cell};
pub use column::{Column, ColumnKind};
pub use reader::{CsvReader, TableReader};
pub use table::{Record, Table};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("Empty input: no header row")]
    Empty,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row} has {found} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Column {0:?} is not numeric")]
    NotNumeric(String),
}

pub type Result<T> = std::result::Result<T, TabularError>;
