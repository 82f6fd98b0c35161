use thiserror::Error;

/// Errors returned by the algorithms in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation, including the offending value.
        message: String,
    },

    /// Two vectors have different dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// A row of a dataset does not have the dimensionality of the first row.
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        /// Index of the offending row.
        row: usize,
        /// Dimensionality of the first row.
        expected: usize,
        /// Dimensionality of the offending row.
        found: usize,
    },

    /// Decision tree induction cannot make progress toward label purity: every
    /// candidate threshold leaves one side of the split empty.
    #[error("non-separable data: {rows} rows with mixed labels have identical features")]
    NonSeparableData {
        /// Number of rows in the partition that could not be split.
        rows: usize,
    },

    /// An iterative algorithm exceeded its iteration cap.
    #[error("did not converge within {iterations} iterations")]
    NotConverged {
        /// Number of iterations performed.
        iterations: usize,
    },
}

impl Error {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
