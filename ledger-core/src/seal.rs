//! Integrity seal over the cached lifetime block
//!
//! The lifetime summary persisted with an entity record is a cache of the
//! calculation engine's output. The seal binds that cache: a canonical
//! fixed-field-order serialization of the block, hashed with SHA-256 and
//! stored hex-encoded as `lifetime_signature`.
//!
//! `seal` is called only at the moment a maintainer intentionally commits a
//! new lifetime snapshot; `verify` is mandatory on every load path that
//! trusts the cache. The seal protects the cache, not the entry log itself;
//! log-level tampering is caught by [`audit_against_entries`], which
//! recomputes the view and compares it to the sealed snapshot.

use crate::types::{EntityRecord, LifetimeSummary};
use crate::{engine, Error, Result};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Canonical byte serializer: length-prefixed fields in a fixed order.
///
/// Signatures and seals are computed over these exact bytes, so the field
/// order and encoding here are load-bearing and must never change silently.
struct CanonicalSerializer {
    buffer: Vec<u8>,
}

impl CanonicalSerializer {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    fn write_string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        self.buffer.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.buffer.extend_from_slice(bytes);
    }

    /// Exact decimal text, trailing zeros normalized away so that
    /// arithmetically equal values hash equal
    fn write_decimal(&mut self, d: &Decimal) {
        self.write_string(&d.normalize().to_string());
    }

    fn hash(self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.buffer);
        hasher.finalize().into()
    }
}

/// Hex SHA-256 digest of a lifetime block's canonical serialization.
pub fn lifetime_digest(lifetime: &LifetimeSummary) -> String {
    let mut ser = CanonicalSerializer::new();
    ser.write_decimal(&lifetime.harm_ly);
    ser.write_decimal(&lifetime.harm_ecy);
    ser.write_decimal(&lifetime.surplus_ly);
    ser.write_decimal(&lifetime.surplus_ecy);
    ser.write_decimal(&lifetime.outstanding_ly);
    ser.write_decimal(&lifetime.outstanding_ecy);
    ser.write_string(&lifetime.status.to_string());
    hex::encode(ser.hash())
}

/// Seal the record's current lifetime block.
///
/// Call only when intentionally committing a new lifetime snapshot.
pub fn seal(record: &mut EntityRecord) {
    record.lifetime_signature = Some(lifetime_digest(&record.lifetime));
}

/// Verify the stored seal against the current lifetime block.
///
/// Mandatory on every load. A missing seal and a mismatched seal are distinct
/// failures; neither record may be trusted, and neither is auto-resealed.
pub fn verify(record: &EntityRecord) -> Result<()> {
    let stored = record
        .lifetime_signature
        .as_deref()
        .ok_or(Error::MissingSeal)?;
    let computed = lifetime_digest(&record.lifetime);
    if stored != computed {
        tracing::error!(
            entity_id = %record.entity_id,
            "lifetime seal mismatch, treating record as untrusted"
        );
        return Err(Error::Integrity {
            stored: stored.to_string(),
            computed,
        });
    }
    Ok(())
}

/// Recompute the lifetime view from the entry log and compare it to the
/// sealed snapshot.
///
/// The seal itself cannot see entry-level tampering; this is the recompute
/// path that can. Expects `verify` to have already passed.
pub fn audit_against_entries(record: &EntityRecord) -> Result<()> {
    let recomputed = engine::lifetime_view(&record.entries).into_summary();
    if recomputed != record.lifetime {
        return Err(Error::Integrity {
            stored: lifetime_digest(&record.lifetime),
            computed: lifetime_digest(&recomputed),
        });
    }
    Ok(())
}
