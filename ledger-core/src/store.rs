//! Entity persistence
//!
//! One JSON document per entity under the configured data directory. The
//! persisted form is a whole-entity snapshot, so appends to the same entity
//! must be serialized: each entity has a writer lock and an append is a
//! load-modify-write under that lock. Different entities need no
//! coordination.
//!
//! Every load runs the full gate sequence before the record is trusted:
//! raw schema validation, seal verification, typed parse, then per-entry
//! sign validation. A record failing any step is rejected whole.

use crate::types::{EntityId, EntityRecord, EntrySubmission};
use crate::{engine, schema, seal, Config, Error, Result, STATE_ACTIVE};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File-backed entity store with per-entity writer locks
pub struct EntityStore {
    data_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EntityStore {
    /// Open the store, creating the data directory if needed.
    pub fn open(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        tracing::info!(data_dir = %config.data_dir.display(), "opened entity store");
        Ok(Self {
            data_dir: config.data_dir.clone(),
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn entity_path(&self, entity_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", entity_id))
    }

    fn entity_lock(&self, entity_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(entity_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load an entity record, running every trust gate.
    pub fn load(&self, entity_id: &str) -> Result<EntityRecord> {
        let path = self.entity_path(entity_id);
        if !path.exists() {
            return Err(Error::EntityNotFound(entity_id.to_string()));
        }
        let raw = std::fs::read_to_string(&path)?;
        let value: Value = serde_json::from_str(&raw)?;

        // Hard gates, no silent repairs
        schema::validate_record(&value)?;
        let record: EntityRecord = serde_json::from_value(value)?;
        seal::verify(&record)?;
        for entry in &record.entries {
            entry.validate()?;
        }

        tracing::debug!(entity_id, entries = record.entries.len(), "loaded entity");
        Ok(record)
    }

    /// Append a new entry to an entity, creating the entity if absent.
    ///
    /// Serialized per entity: the record is reloaded, the entry appended,
    /// the lifetime and current-year caches recomputed, the lifetime block
    /// resealed, and the whole snapshot written atomically. Returns the new
    /// entry's ID.
    pub fn append(&self, submission: EntrySubmission) -> Result<String> {
        let entity_id = submission.entity_id.as_str().to_string();
        let lock = self.entity_lock(&entity_id);
        let _guard = lock.lock();

        let mut record = match self.load(&entity_id) {
            Ok(record) => record,
            Err(Error::EntityNotFound(_)) => {
                tracing::info!(entity_id, "creating new entity record");
                EntityRecord::new(EntityId::new(entity_id.clone()), STATE_ACTIVE)
            }
            Err(e) => return Err(e),
        };

        let entry = submission.into_entry()?;
        let entry_id = entry.entry_id.clone();
        record.entries.push(entry);
        refresh_views(&mut record);
        seal::seal(&mut record);

        self.write_atomic(&record)?;
        tracing::info!(entity_id, entry_id, "appended ledger entry");
        Ok(entry_id)
    }

    /// Persist a record a maintainer has resealed by hand.
    ///
    /// Refuses to write anything whose seal does not verify; the store never
    /// puts an untrusted snapshot on disk.
    pub fn save(&self, record: &EntityRecord) -> Result<()> {
        seal::verify(record)?;
        let lock = self.entity_lock(record.entity_id.as_str());
        let _guard = lock.lock();
        self.write_atomic(record)
    }

    /// All entity IDs present in the store, sorted.
    pub fn list_entities(&self) -> Result<Vec<EntityId>> {
        let mut ids = Vec::new();
        for dir_entry in std::fs::read_dir(&self.data_dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(EntityId::new(stem));
                }
            }
        }
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }

    fn write_atomic(&self, record: &EntityRecord) -> Result<()> {
        let path = self.entity_path(record.entity_id.as_str());
        let tmp = tmp_path(&path);
        let json = serde_json::to_vec_pretty(record)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Recompute the cached views from the entry log.
///
/// The current-year block is pinned to the latest occurrence year present
/// and only carried for ACTIVE entities.
fn refresh_views(record: &mut EntityRecord) {
    record.lifetime = engine::lifetime_view(&record.entries).into_summary();
    record.current_year = if record.is_active() {
        let latest = record.entries.iter().map(|e| e.year).max();
        latest.map(|year| engine::annual_view(&record.entries, year).into_current_year())
    } else {
        None
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Confidence;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn test_store() -> (tempfile::TempDir, EntityStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = dir.path().to_path_buf();
        let store = EntityStore::open(&config).unwrap();
        (dir, store)
    }

    fn submission(entity_id: &str, harm_ly: Decimal, surplus_ly: Decimal) -> EntrySubmission {
        EntrySubmission {
            entity_id: EntityId::new(entity_id),
            year: 2024,
            description: "test".into(),
            harm_ly,
            harm_ecy: Decimal::ZERO,
            surplus_ly,
            surplus_ecy: Decimal::ZERO,
            harm_type: "DELIBERATE".into(),
            incident_type: None,
            confidence: Confidence::Medium,
            source_hashes: vec![],
            response_to_entry_id: None,
        }
    }

    #[test]
    fn test_append_then_load_round_trip() {
        let (_dir, store) = test_store();
        let entry_id = store.append(submission("acme", dec!(-53), dec!(0))).unwrap();

        let record = store.load("acme").unwrap();
        assert_eq!(record.entries.len(), 1);
        assert_eq!(record.entries[0].entry_id, entry_id);
        // DELIBERATE amplifies 5x
        assert_eq!(record.lifetime.harm_ly, dec!(-265));
        assert_eq!(record.lifetime.outstanding_ly, dec!(-265));
        assert!(record.lifetime_signature.is_some());
        // Fresh entities default to ACTIVE and carry a current-year block
        let cy = record.current_year.as_ref().unwrap();
        assert_eq!(cy.year, 2024);
        assert_eq!(cy.harm_ly, dec!(-265));
    }

    #[test]
    fn test_appends_accumulate() {
        let (_dir, store) = test_store();
        store.append(submission("acme", dec!(-53), dec!(0))).unwrap();
        store.append(submission("acme", dec!(0), dec!(5))).unwrap();

        let record = store.load("acme").unwrap();
        assert_eq!(record.entries.len(), 2);
        assert_eq!(record.lifetime.surplus_ly, dec!(5));
        assert_eq!(record.lifetime.outstanding_ly, dec!(-260));
    }

    #[test]
    fn test_load_missing_entity() {
        let (_dir, store) = test_store();
        assert!(matches!(
            store.load("nobody"),
            Err(Error::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_tampered_lifetime_rejected_on_load() {
        let (dir, store) = test_store();
        store.append(submission("acme", dec!(-53), dec!(0))).unwrap();

        // Out-of-band edit of the cached lifetime block
        let path = dir.path().join("acme.json");
        let mut value: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["lifetime"]["harm_ly"] = serde_json::json!(0.0);
        value["lifetime"]["outstanding_ly"] = serde_json::json!(0.0);
        std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(store.load("acme"), Err(Error::Integrity { .. })));
    }

    #[test]
    fn test_stripped_seal_rejected_on_load() {
        let (dir, store) = test_store();
        store.append(submission("acme", dec!(-53), dec!(0))).unwrap();

        let path = dir.path().join("acme.json");
        let mut value: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("lifetime_signature");
        std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(store.load("acme"), Err(Error::MissingSeal)));
    }

    #[test]
    fn test_schema_broken_record_rejected_whole() {
        let (dir, store) = test_store();
        store.append(submission("acme", dec!(-53), dec!(0))).unwrap();

        let path = dir.path().join("acme.json");
        let mut value: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("lifetime");
        std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(store.load("acme"), Err(Error::Schema(_))));
    }

    #[test]
    fn test_list_entities_sorted() {
        let (_dir, store) = test_store();
        store.append(submission("zeta", dec!(-1), dec!(0))).unwrap();
        store.append(submission("acme", dec!(-1), dec!(0))).unwrap();
        let ids = store.list_entities().unwrap();
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["acme", "zeta"]);
    }

    #[test]
    fn test_save_refuses_unsealed_record() {
        let (_dir, store) = test_store();
        let record = EntityRecord::new(EntityId::new("acme"), "HISTORICAL");
        assert!(matches!(store.save(&record), Err(Error::MissingSeal)));
    }

    #[test]
    fn test_save_historical_record_has_no_current_year() {
        let (_dir, store) = test_store();
        let mut record = EntityRecord::new(EntityId::new("old_guild"), "HISTORICAL");
        seal::seal(&mut record);
        store.save(&record).unwrap();

        let loaded = store.load("old_guild").unwrap();
        assert!(loaded.current_year.is_none());
        assert!(!loaded.is_active());
    }

    #[test]
    fn test_concurrent_appends_serialize_per_entity() {
        let (_dir, store) = test_store();
        let store = Arc::new(store);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                store.append(submission("acme", dec!(-1), dec!(0))).unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let record = store.load("acme").unwrap();
        assert_eq!(record.entries.len(), 8);
        assert_eq!(record.lifetime.harm_ly, dec!(-40)); // 8 * -1 * 5x
    }
}
