//! Error types for the reconciliation engine.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, ReconError>;

/// Errors that abort a reconciliation run.
///
/// Groups that fail to reconcile are not errors; they are reported as
/// [`GroupOutcome`](crate::model::GroupOutcome) values instead.
#[derive(Error, Debug)]
pub enum ReconError {
    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from an input table
    #[error("Missing column '{column}' in {table} table")]
    MissingColumn { table: String, column: String },

    /// A candidate row carries a source tag other than bank/finance
    #[error("Invalid source tag '{value}' at candidate row {row}; expected 'bank' or 'finance'")]
    InvalidSourceTag { row: usize, value: String },

    /// The same ledger identifier appears twice in the ledger pool
    #[error("Duplicate ledger identifier '{id}' at ledger row {row}")]
    DuplicateLedgerId { id: String, row: usize },

    /// Bad command-line invocation
    #[error("{0}")]
    Usage(String),
}
