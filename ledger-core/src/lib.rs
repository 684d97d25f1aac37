//! First Candle Ledger Core
//!
//! Append-only accountability ledger recording claims of institutional harm
//! and repair, with deterministic aggregation and a sealed lifetime cache.
//!
//! # Architecture
//!
//! - **Entry model**: immutable entries validated at construction, never
//!   edited; corrections are appended as response entries
//! - **Calculation engine**: pure functions deriving annual and lifetime
//!   views from the entry log
//! - **Schema gate + seal**: a persisted record passes the structural gate
//!   and seal verification before anything downstream trusts it
//! - **Single writer per entity**: appends serialize on a per-entity lock;
//!   the persisted form is a whole-entity snapshot
//!
//! # Invariants
//!
//! - Harm magnitudes <= 0, surplus magnitudes >= 0, enforced at construction
//! - Lifetime aggregates equal the sum of annual aggregates across years
//! - Exact decimal arithmetic; rounding is presentation-only
//! - The sealed lifetime cache is never trusted without verification

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod schema;
pub mod seal;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-exports
pub use config::Config;
pub use engine::{annual_view, harm_breakdown, lifetime_view, response_chain, HarmBucket};
pub use error::{Error, Result};
pub use store::EntityStore;
pub use types::{
    AnnualView, Confidence, EntityId, EntityRecord, EntrySubmission, HarmType, LedgerEntry,
    LifetimeSummary, LifetimeView, Status,
};

/// Entity state carrying current-year accountability
pub const STATE_ACTIVE: &str = "ACTIVE";

/// Number of most-recent entries (by occurrence year) considered when
/// projecting repair time
pub const REPAIR_WINDOW_ENTRIES: usize = 100;
