//! Error types for the Tamis library.
//!
//! All failures are represented by the [`SearchError`] enum. The taxonomy
//! follows the query lifecycle: configuration errors are raised before any
//! store call, compilation errors before execution, execution errors carry
//! whether partial results were available, and aggregation errors are
//! reserved for internal facet invariant breaks (a facet requested on a
//! non-facetable field degrades to a warning instead).
//!
//! # Examples
//!
//! ```
//! use tamis::error::{Result, SearchError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SearchError::config("age", "field is not filterable"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Tamis operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Configuration errors: unknown or incapable field, operator/type
    /// mismatch, invalid pagination, reversed range. Never retried.
    #[error("config error on field '{field}': {reason}")]
    Config {
        /// The field the configuration problem refers to.
        field: String,
        /// Why the request was rejected.
        reason: String,
    },

    /// Filter compilation errors (malformed regex, nesting too deep,
    /// inconsistent nested group). Raised before execution.
    #[error("compilation error: {0}")]
    Compilation(String),

    /// Store execution errors (unreachable backend, timeout). `partial`
    /// reports whether partial results were available; the engine still
    /// returns no partial `SearchResult`.
    #[error("execution error: {message} (partial results: {partial})")]
    Execution {
        /// Human-readable failure description.
        message: String,
        /// Whether the store produced partial results before failing.
        partial: bool,
    },

    /// Facet aggregation invariant breaks.
    #[error("aggregation error: {0}")]
    Aggregation(String),

    /// The named index is not registered.
    #[error("unknown index: {0}")]
    UnknownIndex(String),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Create a new configuration error for a field.
    pub fn config<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        SearchError::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new compilation error.
    pub fn compilation<S: Into<String>>(msg: S) -> Self {
        SearchError::Compilation(msg.into())
    }

    /// Create a new execution error without partial results.
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        SearchError::Execution {
            message: msg.into(),
            partial: false,
        }
    }

    /// Create a new execution error that had partial results available.
    pub fn execution_partial<S: Into<String>>(msg: S) -> Self {
        SearchError::Execution {
            message: msg.into(),
            partial: true,
        }
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        SearchError::Execution {
            message: format!("timeout: {}", msg.into()),
            partial: false,
        }
    }

    /// Create a new aggregation error.
    pub fn aggregation<S: Into<String>>(msg: S) -> Self {
        SearchError::Aggregation(msg.into())
    }

    /// Create a new unknown-index error.
    pub fn unknown_index<S: Into<String>>(name: S) -> Self {
        SearchError::UnknownIndex(name.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SearchError::Other(msg.into())
    }

    /// Whether this error was produced before any store call.
    pub fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            SearchError::Config { .. } | SearchError::Compilation(_) | SearchError::UnknownIndex(_)
        )
    }
}
