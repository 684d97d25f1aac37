//! Schema gate for persisted entity records
//!
//! A hard precondition check run against the raw JSON document before any
//! typed read is trusted. The persisted lifetime block is a cache that
//! downstream consumers may read without recomputation, so it must never be
//! trusted blind: a record that fails here is rejected whole, never repaired
//! and never partially loaded.

use crate::{Error, Result, STATE_ACTIVE};
use serde_json::Value;

/// Fields every lifetime block must carry
pub const REQUIRED_LIFETIME_FIELDS: [&str; 7] = [
    "harm_ly",
    "harm_ecy",
    "surplus_ly",
    "surplus_ecy",
    "outstanding_ly",
    "outstanding_ecy",
    "status",
];

/// Fields every current-year block must carry
pub const REQUIRED_CURRENT_YEAR_FIELDS: [&str; 6] = [
    "year",
    "harm_ly",
    "harm_ecy",
    "surplus_ly",
    "surplus_ecy",
    "status",
];

/// Validate the structural and numeric invariants of a raw entity record.
pub fn validate_record(record: &Value) -> Result<()> {
    let obj = record
        .as_object()
        .ok_or_else(|| Error::Schema("entity record must be an object".into()))?;

    if !obj.contains_key("entity_id") {
        return Err(Error::Schema("missing entity_id".into()));
    }
    let state = obj
        .get("entity_state")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Schema("missing entity_state".into()))?;

    let lifetime = obj
        .get("lifetime")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::Schema("missing lifetime block".into()))?;
    for field in REQUIRED_LIFETIME_FIELDS {
        if !lifetime.contains_key(field) {
            return Err(Error::Schema(format!("lifetime missing field: {}", field)));
        }
    }

    // Active entities must carry a complete current-year block
    if state == STATE_ACTIVE {
        let cy = obj
            .get("current_year")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Schema("ACTIVE entity missing current_year".into()))?;
        for field in REQUIRED_CURRENT_YEAR_FIELDS {
            if !cy.contains_key(field) {
                return Err(Error::Schema(format!(
                    "current_year missing field: {}",
                    field
                )));
            }
        }
    }

    // Entries must exist, even if empty
    if !obj.get("entries").map(Value::is_array).unwrap_or(false) {
        return Err(Error::Schema("entries must be an array".into()));
    }

    // Hard numeric sanity checks on the cached lifetime block
    if number(lifetime, "harm_ly")? > 0.0 || number(lifetime, "harm_ecy")? > 0.0 {
        return Err(Error::Schema("lifetime harm must be <= 0".into()));
    }
    if number(lifetime, "surplus_ly")? < 0.0 || number(lifetime, "surplus_ecy")? < 0.0 {
        return Err(Error::Schema("lifetime surplus must be >= 0".into()));
    }

    Ok(())
}

fn number(block: &serde_json::Map<String, Value>, field: &str) -> Result<f64> {
    block
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::Schema(format!("lifetime {} must be a number", field)))
}
