//! First Candle Trust Chain
//!
//! Carrier key management and the multi-signature genesis mechanism that
//! anchors the ledger to its founding set of signers.
//!
//! # Architecture
//!
//! - **Carrier registry**: named trust participants; status and tier decide
//!   who counts toward the genesis quorum
//! - **Key material**: one Ed25519 keypair per carrier, PEM interchange;
//!   private halves live outside the public ledger store
//! - **Canonical JSON**: sorted keys, compact separators; signatures are
//!   computed over these exact bytes
//! - **Genesis bundle**: the founding record plus one signature per founding
//!   carrier; canonical only when every listed signature verifies
//!
//! The trust chain operates independently of entity aggregation: nothing
//! here reads or writes entity records.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod canonical;
pub mod carrier;
pub mod error;
pub mod genesis;
pub mod keys;

// Re-exports
pub use canonical::canonical_json;
pub use carrier::{Carrier, CarrierRegistry, CarrierStatus, CarrierTier};
pub use error::{Error, Result};
pub use genesis::{GenesisBundle, GenesisEntry, GenesisSignature};
pub use keys::{public_key_from_pem, CarrierKeyPair, KeyStore};
