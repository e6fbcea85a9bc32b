//! Error and rejection types.
//!
//! Only [`IssuanceError`] is ever surfaced to callers as a warning; every other
//! condition degrades to "less metadata" inside the coordinator.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Why a page was passed through without extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The base URL does not match any enabled vendor pattern.
    NotProductPage { vendor: String },
    /// The URL matched but its embedded identifiers disagree.
    InconsistentIdentifiers { vendor: String, groups: Vec<String> },
    /// The declared content type is not an HTML document.
    NotHtml { content_type: String },
    /// The document tree could not be walked.
    MalformedTree { vendor: String, reason: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotProductPage { vendor } => {
                write!(f, "not a product page for vendor {}", vendor)
            }
            RejectReason::InconsistentIdentifiers { vendor, groups } => {
                write!(f, "inconsistent identifiers for vendor {}: {:?}", vendor, groups)
            }
            RejectReason::NotHtml { content_type } => {
                write!(f, "content type {} is not html", content_type)
            }
            RejectReason::MalformedTree { vendor, reason } => {
                write!(f, "malformed document tree for vendor {}: {}", vendor, reason)
            }
        }
    }
}

/// Failures while walking a document tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeWalkError {
    #[error("document nesting exceeds {max_depth} levels")]
    TooDeep { max_depth: usize },
}

/// Failures while minting a product id.
#[derive(Debug, Error)]
pub enum IssuanceError {
    /// The backing store rejected or could not run the insert.
    #[error("backing store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The store round-trip did not finish in time.
    #[error("store round-trip timed out after {0:?}")]
    Timeout(Duration),

    /// The insert succeeded but no key came back.
    #[error("store returned no generated key")]
    NoGeneratedKey,

    /// The store handed back a key outside the positive range.
    #[error("store returned invalid key {0}")]
    InvalidKey(i64),

    /// The configured table name is not a plain SQL identifier.
    #[error("invalid id table name: {0:?}")]
    InvalidTableName(String),

    /// The blocking task running the insert died.
    #[error("issuance task failed: {0}")]
    Task(String),

    /// Every attempt failed with a transient error.
    #[error("issuance gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<IssuanceError>,
    },
}

impl IssuanceError {
    /// Whether retrying the same atomic insert may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            IssuanceError::Timeout(_) => true,
            IssuanceError::Store(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Failures while running a provisioning script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("statement ending on line {line} failed: {source}")]
    Statement {
        line: usize,
        #[source]
        source: rusqlite::Error,
    },
}
