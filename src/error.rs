use core::fmt;

/// Result alias for `clusterlab`.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Callers that only need to decide between "fix the request" and "fix the
/// data" match on this instead of individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A precondition on k, a range, a dataset shape or a linkage was violated.
    InvalidParameter,
    /// Input values cannot be used numerically (NaN or infinite).
    NumericDegenerate,
}

/// Errors returned by the clustering engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Matrix dimension mismatch.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Distance metric name not recognised.
    UnknownMetric(String),

    /// Linkage method name not recognised.
    UnknownLinkage(String),

    /// Feature name not present in the dataset.
    UnknownFeature(String),

    /// Linkage structure cannot be cut as requested.
    MalformedLinkage {
        /// What is wrong with it.
        reason: String,
    },

    /// A dataset value is NaN or infinite.
    NonFinite {
        /// Row of the offending value.
        row: usize,
        /// Column of the offending value.
        col: usize,
    },
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NonFinite { .. } => ErrorKind::NumericDegenerate,
            _ => ErrorKind::InvalidParameter,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::UnknownMetric(name) => write!(f, "unknown distance metric '{name}'"),
            Error::UnknownLinkage(name) => write!(f, "unknown linkage method '{name}'"),
            Error::UnknownFeature(name) => write!(f, "unknown feature '{name}'"),
            Error::MalformedLinkage { reason } => write!(f, "malformed linkage: {reason}"),
            Error::NonFinite { row, col } => {
                write!(f, "non-finite value at row {row}, column {col}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
