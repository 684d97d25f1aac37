//! Genesis record and multi-signature bundle
//!
//! The genesis record is the single founding ledger entry, signed by every
//! founding carrier. It establishes the ledger's starting rules and is never
//! superseded, only extended. Signatures are computed over the canonical
//! JSON serialization of the entry, so verification re-serializes and checks
//! each listed signature against those exact bytes.

use crate::canonical::canonical_json;
use crate::carrier::Carrier;
use crate::keys::{public_key_from_pem, CarrierKeyPair};
use crate::{Error, Result};
use ed25519_dalek::{Signature, Verifier};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The founding ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisEntry {
    /// Entry identifier, e.g. `GENESIS_2025-12-21`
    pub entry_id: String,
    /// Date the record was logged
    pub date_logged: String,
    /// Entry category
    pub category: String,
    /// Entry kind
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Declared intent
    pub intent: String,
    /// What this record establishes
    pub description: String,
    /// Harm at genesis, always zero
    pub harm_cost_ly: Decimal,
    /// Surplus at genesis, always zero
    pub surplus_ly: Decimal,
    /// Originating project
    pub source: String,
    /// Validator status at signing time
    pub validator_status: String,
    /// Net balance at genesis, always zero
    pub net_balance: Decimal,
    /// Mutability marker, `Immutable` once signed
    pub patch_status: String,
    /// Free-text notes
    pub notes: String,
    /// Unix timestamp of the signing ceremony
    pub timestamp: i64,
}

impl GenesisEntry {
    /// Founding record with the ceremonial zero balances filled in.
    pub fn founding(
        entry_id: impl Into<String>,
        date_logged: impl Into<String>,
        description: impl Into<String>,
        notes: impl Into<String>,
        source: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            date_logged: date_logged.into(),
            category: "System".into(),
            entry_type: "Genesis".into(),
            intent: "Initialization".into(),
            description: description.into(),
            harm_cost_ly: Decimal::ZERO,
            surplus_ly: Decimal::ZERO,
            source: source.into(),
            validator_status: "Verified".into(),
            net_balance: Decimal::ZERO,
            patch_status: "Immutable".into(),
            notes: notes.into(),
            timestamp,
        }
    }
}

/// One carrier's attestation over the genesis entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisSignature {
    /// Signing carrier's name
    pub carrier: String,
    /// Signing carrier's public key, SPKI PEM
    pub pubkey: String,
    /// Hex-encoded Ed25519 signature over the canonical entry bytes
    pub signature: String,
}

/// The genesis entry together with every founding carrier's signature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisBundle {
    /// The founding record
    pub genesis_entry: GenesisEntry,
    /// Attestations, one per founding carrier
    pub signatures: Vec<GenesisSignature>,
}

impl GenesisBundle {
    /// Unsigned bundle for a founding entry
    pub fn new(genesis_entry: GenesisEntry) -> Self {
        Self {
            genesis_entry,
            signatures: Vec::new(),
        }
    }

    /// Add a founding carrier's signature.
    ///
    /// The carrier must be an eligible signer and the keypair must match its
    /// registered public key; signing with a stranger's key is refused.
    pub fn add_signature(&mut self, carrier: &Carrier, keys: &CarrierKeyPair) -> Result<()> {
        if !carrier.is_signer() {
            return Err(Error::InactiveCarrier(carrier.name.clone()));
        }
        let pubkey_pem = keys.public_key_pem()?;
        if pubkey_pem.trim_end() != carrier.pubkey_pem.trim_end() {
            return Err(Error::KeyFormat(format!(
                "keypair does not match registered public key for {}",
                carrier.name
            )));
        }

        let payload = canonical_json(&self.genesis_entry)?;
        let signature = keys.sign(&payload);
        self.signatures.push(GenesisSignature {
            carrier: carrier.name.clone(),
            pubkey: carrier.pubkey_pem.clone(),
            signature: hex::encode(signature.to_bytes()),
        });
        tracing::info!(carrier = %carrier.name, "genesis entry signed");
        Ok(())
    }

    /// Verify every listed signature against the canonical re-serialization
    /// of the genesis entry.
    ///
    /// The bundle is CANONICAL only if all signatures verify; a single
    /// invalid signature invalidates the whole bundle. There is no partial
    /// quorum acceptance in the base design -- a threshold quorum is a
    /// documented extension point, not current behavior.
    pub fn verify(&self) -> Result<()> {
        let payload = canonical_json(&self.genesis_entry)?;

        for entry in &self.signatures {
            let key = public_key_from_pem(&entry.pubkey)?;
            let raw = hex::decode(&entry.signature).map_err(|_| {
                Error::Signature(format!("malformed signature hex from {}", entry.carrier))
            })?;
            let signature = Signature::from_slice(&raw).map_err(|_| {
                Error::Signature(format!("malformed signature from {}", entry.carrier))
            })?;
            key.verify(&payload, &signature).map_err(|_| {
                Error::Signature(format!("invalid signature from {}", entry.carrier))
            })?;
            tracing::debug!(carrier = %entry.carrier, "genesis signature verified");
        }

        tracing::info!(
            signatures = self.signatures.len(),
            "genesis bundle canonical"
        );
        Ok(())
    }

    /// Load a bundle from its JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist the bundle to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
