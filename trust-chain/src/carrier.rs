//! Carrier registry
//!
//! A carrier is a named trust participant holding a signing keypair. Status
//! and tier decide whether its signature counts toward the genesis quorum:
//! only Active carriers of Full tier sign. Revocation is external policy;
//! here it is just the Active <-> Revoked state flip.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Carrier lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarrierStatus {
    /// Eligible to sign
    Active,
    /// Signing rights withdrawn
    Revoked,
}

/// Carrier trust tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarrierTier {
    /// Full signing rights
    Full,
    /// May hold keys but does not count toward quorum
    Observer,
}

/// A named trust participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    /// Carrier name
    pub name: String,
    /// Public half of the carrier's keypair, SPKI PEM
    pub pubkey_pem: String,
    /// Date the carrier joined
    pub date_joined: NaiveDate,
    /// Lifecycle state
    pub status: CarrierStatus,
    /// Trust tier
    pub tier: CarrierTier,
}

impl Carrier {
    /// Whether this carrier's signature counts toward genesis quorum
    pub fn is_signer(&self) -> bool {
        self.status == CarrierStatus::Active && self.tier == CarrierTier::Full
    }
}

/// The set of registered carriers, keyed by public key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarrierRegistry {
    carriers: Vec<Carrier>,
}

impl CarrierRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a carrier. Idempotent by public key: re-registering an
    /// already-known key is a no-op and returns `false`.
    pub fn register(&mut self, carrier: Carrier) -> bool {
        if self
            .carriers
            .iter()
            .any(|c| c.pubkey_pem == carrier.pubkey_pem)
        {
            return false;
        }
        tracing::info!(carrier = %carrier.name, "registered carrier");
        self.carriers.push(carrier);
        true
    }

    /// Look up a carrier by name
    pub fn get(&self, name: &str) -> Option<&Carrier> {
        self.carriers.iter().find(|c| c.name == name)
    }

    /// All registered carriers
    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    /// Carriers whose signatures count toward quorum
    pub fn signers(&self) -> Vec<&Carrier> {
        self.carriers.iter().filter(|c| c.is_signer()).collect()
    }

    /// Withdraw a carrier's signing rights
    pub fn revoke(&mut self, name: &str) -> Result<()> {
        let carrier = self.get_mut(name)?;
        carrier.status = CarrierStatus::Revoked;
        tracing::warn!(carrier = name, "revoked carrier");
        Ok(())
    }

    /// Restore a revoked carrier
    pub fn reinstate(&mut self, name: &str) -> Result<()> {
        let carrier = self.get_mut(name)?;
        carrier.status = CarrierStatus::Active;
        tracing::info!(carrier = name, "reinstated carrier");
        Ok(())
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Carrier> {
        self.carriers
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::UnknownCarrier(name.to_string()))
    }

    /// Load the registry from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist the registry to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
