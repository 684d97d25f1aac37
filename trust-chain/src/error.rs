//! Error types for trust-chain operations

use thiserror::Error;

/// Trust-chain result type
pub type Result<T> = std::result::Result<T, Error>;

/// Trust-chain errors
#[derive(Error, Debug)]
pub enum Error {
    /// A signature failed verification; the bundle is non-canonical
    #[error("Signature verification failed: {0}")]
    Signature(String),

    /// Key material could not be parsed or did not match
    #[error("Invalid key material: {0}")]
    KeyFormat(String),

    /// Carrier exists but is not eligible to sign
    #[error("Carrier {0} is not an active signer")]
    InactiveCarrier(String),

    /// Carrier not present in the registry
    #[error("Unknown carrier: {0}")]
    UnknownCarrier(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
