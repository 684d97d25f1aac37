//! Core types for the accountability ledger
//!
//! All types are designed for:
//! - Append-only semantics (entries are never mutated, only appended)
//! - Exact arithmetic (Decimal for harm/repair magnitudes)
//! - JSON-stable persistence (serde, one document per entity)

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Entity identifier (the institution a claim is recorded against)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create new entity ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregate repair status, derived from outstanding balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Harm still accruing with no repair recorded
    Accruing,
    /// Partial repair recorded, debt still outstanding
    Stabilized,
    /// Outstanding balance fully offset in both units
    Repaired,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Accruing => "ACCRUING",
            Status::Stabilized => "STABILIZED",
            Status::Repaired => "REPAIRED",
        };
        write!(f, "{}", s)
    }
}

/// Evidence confidence grade (informational, does not affect arithmetic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    /// Single or contested source
    Low,
    /// Corroborated
    #[default]
    Medium,
    /// Documented and independently verified
    High,
}

/// Culpability classification, each bound to an intent multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarmType {
    /// Failure of care (1x)
    Negligence,
    /// Known risk ignored (2x)
    Recklessness,
    /// Intentional harm (5x)
    Deliberate,
    /// Harm embedded in institutional process (8x)
    Systemic,
    /// Concealment of known harm (10x)
    CoverUp,
}

impl HarmType {
    /// All recognized harm types, in ascending multiplier order
    pub const ALL: [HarmType; 5] = [
        HarmType::Negligence,
        HarmType::Recklessness,
        HarmType::Deliberate,
        HarmType::Systemic,
        HarmType::CoverUp,
    ];

    /// Intent multiplier applied to raw harm magnitudes
    pub fn multiplier(&self) -> Decimal {
        match self {
            HarmType::Negligence => Decimal::from(1),
            HarmType::Recklessness => Decimal::from(2),
            HarmType::Deliberate => Decimal::from(5),
            HarmType::Systemic => Decimal::from(8),
            HarmType::CoverUp => Decimal::from(10),
        }
    }

    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            HarmType::Negligence => "NEGLIGENCE",
            HarmType::Recklessness => "RECKLESSNESS",
            HarmType::Deliberate => "DELIBERATE",
            HarmType::Systemic => "SYSTEMIC",
            HarmType::CoverUp => "COVER_UP",
        }
    }

    /// Parse from wire tag. Callers that require strict membership should
    /// check this before constructing an entry; `LedgerEntry::intent_multiplier`
    /// deliberately falls back to 1x on a miss.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEGLIGENCE" => Some(HarmType::Negligence),
            "RECKLESSNESS" => Some(HarmType::Recklessness),
            "DELIBERATE" => Some(HarmType::Deliberate),
            "SYSTEMIC" => Some(HarmType::Systemic),
            "COVER_UP" => Some(HarmType::CoverUp),
            _ => None,
        }
    }
}

impl fmt::Display for HarmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable claim of harm or repair against an entity
///
/// Entries are append-only and legally binding once written. Corrections are
/// made by appending a new entry, optionally linked via `response_to_entry_id`,
/// never by editing in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Globally unique entry ID
    pub entry_id: String,

    /// Subject institution
    pub entity_id: EntityId,

    /// Occurrence year; negative for pre-epoch historical claims
    pub year: i32,

    /// Record timestamp (distinct from the occurrence year)
    pub date_logged: DateTime<Utc>,

    /// Harm in life-years, always <= 0
    #[serde(default)]
    pub harm_ly: Decimal,

    /// Harm in ecosystem-capacity-years, always <= 0
    #[serde(default)]
    pub harm_ecy: Decimal,

    /// Repair in life-years, always >= 0
    #[serde(default)]
    pub surplus_ly: Decimal,

    /// Repair in ecosystem-capacity-years, always >= 0
    #[serde(default)]
    pub surplus_ecy: Decimal,

    /// Free-text account of the claim
    #[serde(default)]
    pub description: String,

    /// Culpability tag. Kept open on the wire so forward-incompatible data
    /// still aggregates; see `intent_multiplier`.
    pub harm_type: String,

    /// Causation category (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,

    /// Evidence confidence grade
    #[serde(default)]
    pub confidence: Confidence,

    /// Digest(s) of supporting evidence, comma-joined when multiple
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,

    /// Back-reference to an earlier entry this one responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_to_entry_id: Option<String>,
}

impl LedgerEntry {
    /// Check the sign invariants: harm <= 0, surplus >= 0.
    ///
    /// Must pass before an entry is trusted, whether it was constructed
    /// locally or deserialized from a persisted record.
    pub fn validate(&self) -> Result<()> {
        if self.harm_ly > Decimal::ZERO {
            return Err(Error::Validation {
                field: "harm_ly",
                reason: format!("harm must be <= 0, got {}", self.harm_ly),
            });
        }
        if self.harm_ecy > Decimal::ZERO {
            return Err(Error::Validation {
                field: "harm_ecy",
                reason: format!("harm must be <= 0, got {}", self.harm_ecy),
            });
        }
        if self.surplus_ly < Decimal::ZERO {
            return Err(Error::Validation {
                field: "surplus_ly",
                reason: format!("surplus must be >= 0, got {}", self.surplus_ly),
            });
        }
        if self.surplus_ecy < Decimal::ZERO {
            return Err(Error::Validation {
                field: "surplus_ecy",
                reason: format!("surplus must be >= 0, got {}", self.surplus_ecy),
            });
        }
        Ok(())
    }

    /// Intent multiplier for this entry's culpability tag.
    ///
    /// Unrecognized tags fall back to 1x (negligence-equivalent). The fallback
    /// keeps aggregation total over forward-incompatible data; it is a bounded
    /// leniency, not general error suppression.
    pub fn intent_multiplier(&self) -> Decimal {
        HarmType::parse(&self.harm_type)
            .map(|t| t.multiplier())
            .unwrap_or(Decimal::ONE)
    }

    /// Harm magnitudes scaled by the intent multiplier, `(ly, ecy)`.
    ///
    /// Always <= 0 for a valid entry.
    pub fn amplified_harm(&self) -> (Decimal, Decimal) {
        let mult = self.intent_multiplier();
        (self.harm_ly * mult, self.harm_ecy * mult)
    }
}

/// New-entry field set supplied by the submission layer
///
/// The web/CLI layer collects these fields; `into_entry` stamps identity and
/// timestamp and enforces the sign invariants before anything is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySubmission {
    /// Subject institution
    pub entity_id: EntityId,
    /// Occurrence year
    pub year: i32,
    /// Free-text account of the claim
    pub description: String,
    /// Harm in life-years
    #[serde(default)]
    pub harm_ly: Decimal,
    /// Harm in ecosystem-capacity-years
    #[serde(default)]
    pub harm_ecy: Decimal,
    /// Repair in life-years
    #[serde(default)]
    pub surplus_ly: Decimal,
    /// Repair in ecosystem-capacity-years
    #[serde(default)]
    pub surplus_ecy: Decimal,
    /// Culpability tag
    #[serde(default = "default_harm_type")]
    pub harm_type: String,
    /// Causation category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,
    /// Evidence confidence grade
    #[serde(default)]
    pub confidence: Confidence,
    /// Digests of supporting evidence files
    #[serde(default)]
    pub source_hashes: Vec<String>,
    /// Entry this one responds to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_to_entry_id: Option<String>,
}

fn default_harm_type() -> String {
    HarmType::Negligence.as_str().to_string()
}

impl EntrySubmission {
    /// Build a validated ledger entry from this submission.
    ///
    /// Entry IDs are `{entity}_entry_{uuidv7}` so they sort by creation time.
    pub fn into_entry(self) -> Result<LedgerEntry> {
        let entry = LedgerEntry {
            entry_id: format!("{}_entry_{}", self.entity_id, Uuid::now_v7()),
            entity_id: self.entity_id,
            year: self.year,
            date_logged: Utc::now(),
            harm_ly: self.harm_ly,
            harm_ecy: self.harm_ecy,
            surplus_ly: self.surplus_ly,
            surplus_ecy: self.surplus_ecy,
            description: self.description,
            harm_type: self.harm_type,
            incident_type: self.incident_type,
            confidence: self.confidence,
            source_hash: if self.source_hashes.is_empty() {
                None
            } else {
                Some(self.source_hashes.join(","))
            },
            response_to_entry_id: self.response_to_entry_id,
        };
        entry.validate()?;
        Ok(entry)
    }
}

/// Computed single-year aggregate (a view, never a source of truth)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualView {
    /// The year aggregated
    pub year: i32,
    /// Summed amplified harm, life-years
    pub harm_ly: Decimal,
    /// Summed amplified harm, ecosystem-capacity-years
    pub harm_ecy: Decimal,
    /// Summed raw surplus, life-years
    pub surplus_ly: Decimal,
    /// Summed raw surplus, ecosystem-capacity-years
    pub surplus_ecy: Decimal,
    /// harm + surplus, life-years
    pub outstanding_ly: Decimal,
    /// harm + surplus, ecosystem-capacity-years
    pub outstanding_ecy: Decimal,
    /// Derived repair status
    pub status: Status,
}

/// Computed whole-log aggregate (a view, never a source of truth)
///
/// The persisted counterpart is [`LifetimeSummary`]; whichever snapshot is
/// sealed alongside an entity record stays authoritative until resealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeView {
    /// Summed amplified harm, life-years
    pub harm_ly: Decimal,
    /// Summed amplified harm, ecosystem-capacity-years
    pub harm_ecy: Decimal,
    /// Summed raw surplus, life-years
    pub surplus_ly: Decimal,
    /// Summed raw surplus, ecosystem-capacity-years
    pub surplus_ecy: Decimal,
    /// harm + surplus, life-years
    pub outstanding_ly: Decimal,
    /// harm + surplus, ecosystem-capacity-years
    pub outstanding_ecy: Decimal,
    /// Derived repair status
    pub status: Status,
    /// Projected years until the LY debt clears at the recent repair rate;
    /// absent when no projection is currently possible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_to_repair: Option<Decimal>,
}

/// Persisted lifetime summary block
///
/// A cache of `engine::lifetime_view` output. Consumers may read it without
/// recomputation, which is exactly why it is sealed; see the `seal` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeSummary {
    /// Summed amplified harm, life-years
    pub harm_ly: Decimal,
    /// Summed amplified harm, ecosystem-capacity-years
    pub harm_ecy: Decimal,
    /// Summed raw surplus, life-years
    pub surplus_ly: Decimal,
    /// Summed raw surplus, ecosystem-capacity-years
    pub surplus_ecy: Decimal,
    /// harm + surplus; negative means net unrepaired debt
    pub outstanding_ly: Decimal,
    /// harm + surplus; negative means net unrepaired debt
    pub outstanding_ecy: Decimal,
    /// Derived repair status
    pub status: Status,
}

/// Persisted current-year summary block, required for ACTIVE entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentYearSummary {
    /// The year summarized
    pub year: i32,
    /// Summed amplified harm, life-years
    pub harm_ly: Decimal,
    /// Summed amplified harm, ecosystem-capacity-years
    pub harm_ecy: Decimal,
    /// Summed raw surplus, life-years
    pub surplus_ly: Decimal,
    /// Summed raw surplus, ecosystem-capacity-years
    pub surplus_ecy: Decimal,
    /// Derived repair status
    pub status: Status,
}

/// The unit of persistence: one record per institution
///
/// The record exclusively owns its ordered entry log; entries reference the
/// entity only through their `entity_id` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity identifier
    pub entity_id: EntityId,

    /// Lifecycle state: `ACTIVE`, `PENDING_VALIDATION`, `HISTORICAL`, ...
    /// Kept open on the wire; only `ACTIVE` carries semantics here.
    pub entity_state: String,

    /// Cached lifetime summary (sealed)
    pub lifetime: LifetimeSummary,

    /// Hex SHA-256 seal over the lifetime block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_signature: Option<String>,

    /// Cached current-year summary, present iff the entity is ACTIVE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_year: Option<CurrentYearSummary>,

    /// Append-only entry log, in append order
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
}

impl EntityRecord {
    /// Empty record for a brand-new entity, not yet sealed
    pub fn new(entity_id: EntityId, entity_state: impl Into<String>) -> Self {
        Self {
            entity_id,
            entity_state: entity_state.into(),
            lifetime: LifetimeSummary {
                harm_ly: Decimal::ZERO,
                harm_ecy: Decimal::ZERO,
                surplus_ly: Decimal::ZERO,
                surplus_ecy: Decimal::ZERO,
                outstanding_ly: Decimal::ZERO,
                outstanding_ecy: Decimal::ZERO,
                status: Status::Repaired,
            },
            lifetime_signature: None,
            current_year: None,
            entries: Vec::new(),
        }
    }

    /// Whether this entity carries current-year accountability
    pub fn is_active(&self) -> bool {
        self.entity_state == crate::STATE_ACTIVE
    }
}
