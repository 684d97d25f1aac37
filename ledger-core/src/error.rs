//! Error types for the accountability ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Entry-level sign-invariant violation, rejected at construction
    #[error("Validation failed for {field}: {reason}")]
    Validation {
        /// Offending entry field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Structural or numeric violation in a persisted entity record
    #[error("Schema violation: {0}")]
    Schema(String),

    /// Lifetime seal mismatch: the cached lifetime block was edited out of band
    #[error("Lifetime tampering detected: stored seal {stored}, computed {computed}")]
    Integrity {
        /// Seal stored in the record
        stored: String,
        /// Seal recomputed from the current lifetime block
        computed: String,
    },

    /// No lifetime seal present at all
    #[error("Missing lifetime seal")]
    MissingSeal,

    /// Entity record not found in the store
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
