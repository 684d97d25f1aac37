//! Canonical JSON serialization
//!
//! Signatures are computed over these exact bytes, so the encoding must be
//! byte-stable: object keys in sorted order, compact separators, no
//! insignificant whitespace. Round-tripping through `serde_json::Value`
//! gives both (its object representation keeps keys sorted).

use crate::Result;
use serde::Serialize;

/// Serialize a value to canonical JSON bytes.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&value)?)
}
