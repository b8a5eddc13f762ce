//! Selection error model.
//! Every failure of selection resolution is a `SelectionError`; the variants carry the
//! offending fragment so that the message identifies what was rejected. Routine execution
//! failures live in `MaterializeError`.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `plural_form(1, "column")` -> "1 column", `plural_form(5, "column")` -> "5 columns"
pub fn plural_form<N: Borrow<usize>>(n: N, singular: &str) -> String {
    let n = *n.borrow();
    if n == 1 { format!("{} {}", n, singular) } else { format!("{} {}s", n, singular) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("table has {}; column number {index} is invalid", plural_form(.ncols, "column"))]
    IndexOutOfRange { ncols: usize, index: i64 },
    #[error("column {0:?} not found in the table")]
    ColumnNotFound(String),
    #[error("{0} is not integer-valued")]
    NonInteger(String),
    #[error("slice {0} must both start and end with a column name")]
    MixedNameSlice(String),
    #[error("name slices cannot use a stride: {0}")]
    NameSliceStride(String),
    #[error("invalid zero-step slice {slice}: {reason}")]
    ZeroStep { slice: String, reason: String },
    #[error("unknown selection argument: {0}")]
    UnknownArgument(String),
    #[error("cannot expand a selection of {0} columns")]
    TooManyColumns(usize),
}

impl SelectionError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            SelectionError::IndexOutOfRange { .. } => "index_out_of_range",
            SelectionError::ColumnNotFound(_) => "column_not_found",
            SelectionError::NonInteger(_) => "non_integer_slice",
            SelectionError::MixedNameSlice(_) => "mixed_name_slice",
            SelectionError::NameSliceStride(_) => "name_slice_stride",
            SelectionError::ZeroStep { .. } => "zero_step_slice",
            SelectionError::UnknownArgument(_) => "unknown_argument",
            SelectionError::TooManyColumns(_) => "too_many_columns",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport { code: self.code().to_string(), message: self.to_string() }
    }
}

pub type SelectResult<T> = Result<T, SelectionError>;

/// Failure of a view routine. The partially built buffer is never returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterializeError {
    #[error("could not allocate {0} view column descriptors")]
    Alloc(usize),
    #[error("source column {index} is out of bounds for a table with {}", plural_form(.ncols, "column"))]
    SourceOutOfBounds { index: i64, ncols: usize },
    #[error("column {0} of the source array is itself a view")]
    NestedView(usize),
    #[error("column {0} of a view table does not reference a source column")]
    MissingSource(usize),
}

impl MaterializeError {
    pub fn code(&self) -> &'static str {
        match self {
            MaterializeError::Alloc(_) => "alloc_failed",
            MaterializeError::SourceOutOfBounds { .. } => "source_out_of_bounds",
            MaterializeError::NestedView(_) => "nested_view",
            MaterializeError::MissingSource(_) => "missing_source",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport { code: self.code().to_string(), message: self.to_string() }
    }
}

/// Serializable `{code, message}` pair used by JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
}
