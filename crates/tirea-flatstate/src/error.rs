//! Error types for tirea-flatstate operations.
//!
//! Only strict (write-style) operations produce these errors. Read-style
//! operations (`get`, `size`, `pop`) answer with a neutral result instead.

use crate::{Path, Value};
use thiserror::Error;

/// Result type alias for tirea-flatstate operations.
pub type FlatResult<T> = Result<T, FlatError>;

/// Errors that can occur while resolving or mutating a state tree.
#[derive(Debug, Error)]
pub enum FlatError {
    /// The path is empty where a non-empty path is required, or a dotted
    /// path string is malformed.
    #[error("invalid path: {message}")]
    InvalidPath {
        /// Description of what is wrong with the path.
        message: String,
    },

    /// A sequence index is outside the range the operation accepts.
    ///
    /// `index` is the index as supplied by the caller, before negative
    /// normalization.
    #[error("index {index} out of bounds (len: {len}) at path {path}")]
    IndexOutOfBounds {
        /// The path up to and including the offending index.
        path: Path,
        /// The index that was supplied.
        index: i64,
        /// The length of the sequence at the time of the access.
        len: usize,
    },

    /// The value found at a path is not of the kind the operation needs.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path where the mismatch occurred.
        path: Path,
        /// The expected kind.
        expected: &'static str,
        /// The kind actually found (`"missing"` when nothing is stored).
        found: &'static str,
    },

    /// A state tree was constructed from something that is not a container.
    #[error("invalid root: expected mapping or sequence, found {found}")]
    InvalidRoot {
        /// The kind that was supplied.
        found: &'static str,
    },

    /// A substate was requested on a path that does not hold a container.
    #[error("invalid substate target at {path}: expected mapping or sequence, found {found}")]
    InvalidTarget {
        /// The requested substate path.
        path: Path,
        /// The kind found there (`"missing"` when nothing is stored).
        found: &'static str,
    },

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlatError {
    /// Create an invalid path error.
    #[inline]
    pub fn invalid_path(message: impl Into<String>) -> Self {
        FlatError::InvalidPath {
            message: message.into(),
        }
    }

    /// Create the error returned by write entry points given an empty path.
    #[inline]
    pub fn empty_path(op: &str) -> Self {
        FlatError::invalid_path(format!("{op} requires a non-empty path"))
    }

    /// Create an index out of bounds error.
    #[inline]
    pub fn index_out_of_bounds(path: Path, index: i64, len: usize) -> Self {
        FlatError::IndexOutOfBounds { path, index, len }
    }

    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        FlatError::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    /// Create an invalid root error.
    #[inline]
    pub fn invalid_root(found: &'static str) -> Self {
        FlatError::InvalidRoot { found }
    }

    /// Create an invalid substate target error.
    #[inline]
    pub fn invalid_target(path: Path, found: &'static str) -> Self {
        FlatError::InvalidTarget { path, found }
    }

    /// The path this error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            FlatError::IndexOutOfBounds { path, .. }
            | FlatError::TypeMismatch { path, .. }
            | FlatError::InvalidTarget { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Add a path prefix to this error.
    ///
    /// Substates report errors relative to their own root; a caller holding
    /// the parent can rebase them with the substate's path.
    pub fn with_prefix(self, prefix: &Path) -> Self {
        match self {
            FlatError::IndexOutOfBounds { path, index, len } => FlatError::IndexOutOfBounds {
                path: prefix.join(&path),
                index,
                len,
            },
            FlatError::TypeMismatch {
                path,
                expected,
                found,
            } => FlatError::TypeMismatch {
                path: prefix.join(&path),
                expected,
                found,
            },
            FlatError::InvalidTarget { path, found } => FlatError::InvalidTarget {
                path: prefix.join(&path),
                found,
            },
            other => other,
        }
    }
}

/// Get the kind name of a value.
#[inline]
pub fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Mapping(_) => "mapping",
        Value::Sequence(_) => "sequence",
    }
}

/// Kind name for an optional value; absent values report `"missing"`.
#[inline]
pub(crate) fn found_name(v: Option<&Value>) -> &'static str {
    v.map_or("missing", value_type_name)
}
