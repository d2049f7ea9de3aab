use connectors::error::{ConnectorError, DbError, StoreError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One field-level validation failure, reportable at the boundary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input configuration; carries per-field detail.
    #[error("Invalid configuration: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Source or target store unreachable, or authentication failed.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectorError),

    /// A read against the relational source failed outside of batch
    /// migration (introspection, counting, sampling).
    #[error("Source error: {0}")]
    Source(#[from] DbError),

    /// A target-store operation failed outside of batch migration.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Introspection produced an inconsistent schema graph.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A batch fetch or write failed mid-table; the table's migration is
    /// aborted, never skipped.
    #[error("Migration failed on table `{table}` at offset {offset}: {reason}")]
    Migration {
        table: String,
        offset: u64,
        reason: String,
    },

    /// A transformation is already in flight; concurrent starts are
    /// rejected, never silently overwritten.
    #[error("A transformation is already running")]
    Conflict,

    #[error("Migration cancelled")]
    Cancelled,
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
