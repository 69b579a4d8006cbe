//! Persisted report collections, one ordered sequence per parameter.
//!
//! The whole mapping is a single JSON document under a fixed key: read in
//! full at startup, written in full after every mutation. Mutations are
//! read-modify-write behind a mutex so concurrent uploads cannot drop one
//! another's entries.

use super::kv::{KvStore, StoreError};
use crate::types::{Fingerprint, Parameter, Report};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// Fixed document key in the key-value substrate.
pub const STORE_KEY: &str = "predictive_reports";

type ReportMap = BTreeMap<Parameter, Vec<Report>>;

/// Outcome of [`ReportStore::add`].
#[derive(Debug, Clone)]
pub enum AddOutcome {
    Added(Report),
    /// Fingerprint collision within the category: the existing entry wins
    /// and nothing is written.
    Duplicate(Report),
}

impl AddOutcome {
    pub fn report(&self) -> &Report {
        match self {
            AddOutcome::Added(r) | AddOutcome::Duplicate(r) => r,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, AddOutcome::Duplicate(_))
    }
}

/// The persisted collection of named reports keyed by parameter category.
///
/// Constructed once per process and injected by reference — no ambient
/// singleton — so tests can substitute an in-memory substrate.
pub struct ReportStore {
    kv: Arc<dyn KvStore>,
    state: Mutex<ReportMap>,
}

impl ReportStore {
    /// Read the persisted mapping and run the one-time legacy cleanup.
    ///
    /// A missing document initializes all four categories to empty
    /// sequences. A corrupt document is logged and treated as no prior
    /// data — startup never fails on persistence reads. The cleanup pass
    /// drops duplicate-fingerprint entries (first-seen wins) and persists
    /// the result back before any further writes.
    pub fn load(kv: Arc<dyn KvStore>) -> Self {
        let (mut map, existed) = match kv.get(STORE_KEY) {
            Ok(Some(payload)) => (parse_document(&payload), true),
            Ok(None) => (empty_map(), false),
            Err(e) => {
                tracing::warn!(error = %e, backend = kv.backend_name(), "report store read failed; starting empty");
                (empty_map(), false)
            }
        };

        let removed = dedup_in_place(&mut map);
        if removed > 0 {
            tracing::info!(removed, "legacy duplicate reports cleaned up");
        }

        let store = Self {
            kv,
            state: Mutex::new(map),
        };

        if removed > 0 || !existed {
            if let Err(e) = store.persist() {
                tracing::warn!(error = %e, "could not persist cleaned report store");
            }
        }

        store
    }

    /// Append a report to its category unless its fingerprint already
    /// exists there. Duplicates are a silent no-op, not an error.
    pub fn add(&self, report: Report) -> Result<AddOutcome, StoreError> {
        let outcome = {
            let mut state = self.lock();
            let entries = state.entry(report.parameter).or_default();
            let fingerprint = report.fingerprint();

            if let Some(existing) = entries.iter().find(|r| r.fingerprint() == fingerprint) {
                tracing::debug!(
                    parameter = %report.parameter,
                    file = %report.file_name,
                    "duplicate upload skipped"
                );
                return Ok(AddOutcome::Duplicate(existing.clone()));
            }

            entries.push(report.clone());
            AddOutcome::Added(report)
        };

        self.persist()?;
        Ok(outcome)
    }

    /// Remove the report with the given id from a category.
    ///
    /// Returns whether anything was removed; an unknown id leaves the
    /// store unchanged and is not an error.
    pub fn remove(&self, parameter: Parameter, id: u64) -> Result<bool, StoreError> {
        let removed = {
            let mut state = self.lock();
            let entries = state.entry(parameter).or_default();
            let before = entries.len();
            entries.retain(|r| r.id != id);
            entries.len() != before
        };

        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Reports for one category, in upload order.
    pub fn list(&self, parameter: Parameter) -> Vec<Report> {
        self.lock().get(&parameter).cloned().unwrap_or_default()
    }

    /// Most recently uploaded report for a category.
    pub fn latest(&self, parameter: Parameter) -> Option<Report> {
        self.lock().get(&parameter).and_then(|v| v.last().cloned())
    }

    /// Serialize the full mapping as it would be persisted.
    pub fn serialize(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&*self.lock())?)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let payload = self.serialize()?;
        self.kv.set(STORE_KEY, &payload)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReportMap> {
        // A poisoned mutex means another thread panicked mid-mutation;
        // the map itself is still structurally sound, so keep serving.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn empty_map() -> ReportMap {
    Parameter::ALL.iter().map(|p| (*p, Vec::new())).collect()
}

/// Parse a persisted document leniently: a malformed report entry is
/// skipped with a warning instead of discarding every category.
fn parse_document(payload: &str) -> ReportMap {
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "report store document is corrupt; starting empty");
            return empty_map();
        }
    };

    let mut map = empty_map();
    for parameter in Parameter::ALL {
        let Some(entries) = value.get(parameter.as_str()).and_then(|v| v.as_array()) else {
            continue;
        };
        let reports = map.entry(parameter).or_default();
        for entry in entries {
            match serde_json::from_value::<Report>(entry.clone()) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::warn!(parameter = %parameter, error = %e, "skipping unreadable report entry");
                }
            }
        }
    }
    map
}

/// Drop duplicate-fingerprint entries per category, keeping the first
/// seen. Returns the number of entries removed. Idempotent.
fn dedup_in_place(map: &mut ReportMap) -> usize {
    let mut removed = 0;
    for entries in map.values_mut() {
        let mut seen: HashSet<Fingerprint> = HashSet::with_capacity(entries.len());
        let before = entries.len();
        entries.retain(|r| seen.insert(r.fingerprint()));
        removed += before - entries.len();
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::MemoryKv;
    use crate::types::Series;

    fn series(values: &[f64]) -> Series {
        Series {
            timestamps: (0..values.len()).map(|i| format!("00:0{}", i)).collect(),
            values: values.to_vec(),
            threshold: 31.7,
        }
    }

    fn report(file: &str, values: &[f64]) -> Report {
        Report::new(Parameter::Temperature, file, None, &series(values))
    }

    fn store() -> (Arc<MemoryKv>, ReportStore) {
        let kv = Arc::new(MemoryKv::new());
        let store = ReportStore::load(kv.clone());
        (kv, store)
    }

    #[test]
    fn load_initializes_all_categories() {
        let (_, store) = store();
        for p in Parameter::ALL {
            assert!(store.list(p).is_empty());
        }
    }

    #[test]
    fn add_then_list_preserves_upload_order() {
        let (_, store) = store();
        store.add(report("a.csv", &[1.0])).unwrap();
        store.add(report("b.csv", &[2.0])).unwrap();
        let listed = store.list(Parameter::Temperature);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].file_name, "a.csv");
        assert_eq!(listed[1].file_name, "b.csv");
    }

    #[test]
    fn duplicate_upload_is_a_silent_no_op() {
        let (_, store) = store();
        let first = store.add(report("same.csv", &[40.0, 38.0, 36.0])).unwrap();
        let second = store.add(report("same.csv", &[40.0, 38.0, 36.0])).unwrap();

        assert!(!first.is_duplicate());
        assert!(second.is_duplicate());
        assert_eq!(second.report().id, first.report().id);
        assert_eq!(store.list(Parameter::Temperature).len(), 1);
    }

    #[test]
    fn same_fingerprint_in_another_category_is_allowed() {
        let (_, store) = store();
        store.add(report("same.csv", &[40.0])).unwrap();
        let pressure = Report::new(Parameter::Pressure, "same.csv", None, &series(&[40.0]));
        assert!(!store.add(pressure).unwrap().is_duplicate());
    }

    #[test]
    fn remove_unknown_id_is_a_no_op() {
        let (_, store) = store();
        store.add(report("a.csv", &[1.0])).unwrap();
        assert!(!store.remove(Parameter::Temperature, 424_242).unwrap());
        assert_eq!(store.list(Parameter::Temperature).len(), 1);
    }

    #[test]
    fn remove_by_id_persists() {
        let (kv, store) = store();
        let added = store.add(report("a.csv", &[1.0])).unwrap();
        assert!(store.remove(Parameter::Temperature, added.report().id).unwrap());
        assert!(store.list(Parameter::Temperature).is_empty());

        let reloaded = ReportStore::load(kv);
        assert!(reloaded.list(Parameter::Temperature).is_empty());
    }

    #[test]
    fn round_trips_through_the_substrate() {
        let (kv, store) = store();
        store.add(report("a.csv", &[40.0, 38.0])).unwrap();
        store.add(report("b.csv", &[9.0])).unwrap();

        let reloaded = ReportStore::load(kv);
        let listed = reloaded.list(Parameter::Temperature);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].values, vec![40.0, 38.0]);
        assert_eq!(listed[0].times.len(), 2);
    }

    #[test]
    fn legacy_duplicates_are_cleaned_on_load() {
        let kv = Arc::new(MemoryKv::new());
        // Two identical entries written by the legacy surface, different ids.
        let payload = serde_json::json!({
            "Temperature": [
                {
                    "id": 1, "name": "one", "parameter": "Temperature",
                    "fileName": "dup.csv", "uploadDate": "2025-06-04T00:00:00Z",
                    "dataPoints": 2, "times": ["00:00", "00:01"],
                    "values": [40.0, 38.0], "threshold": 31.7
                },
                {
                    "id": 2, "name": "two", "parameter": "Temperature",
                    "fileName": "dup.csv", "uploadDate": "2025-06-04T00:05:00Z",
                    "dataPoints": 2, "times": ["00:00", "00:01"],
                    "values": [40.0, 38.0], "threshold": 31.7
                }
            ],
            "Pressure": [], "Humidity": [], "Vibration": []
        });
        kv.set(STORE_KEY, &payload.to_string()).unwrap();

        let store = ReportStore::load(kv.clone());
        let listed = store.list(Parameter::Temperature);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 1, "first-seen entry wins");

        // Idempotent: a second load pass changes nothing further.
        let again = ReportStore::load(kv);
        assert_eq!(again.list(Parameter::Temperature).len(), 1);
    }

    #[test]
    fn corrupt_document_degrades_to_empty() {
        let kv = Arc::new(MemoryKv::new());
        kv.set(STORE_KEY, "{not json").unwrap();
        let store = ReportStore::load(kv);
        for p in Parameter::ALL {
            assert!(store.list(p).is_empty());
        }
    }

    #[test]
    fn unreadable_entry_does_not_discard_the_rest() {
        let kv = Arc::new(MemoryKv::new());
        let payload = serde_json::json!({
            "Temperature": [
                {"id": "not-a-number"},
                {
                    "id": 7, "name": "ok", "parameter": "Temperature",
                    "fileName": "ok.csv", "uploadDate": "2025-06-04T00:00:00Z",
                    "values": [1.0], "times": ["00:00"]
                }
            ]
        });
        kv.set(STORE_KEY, &payload.to_string()).unwrap();

        let store = ReportStore::load(kv);
        let listed = store.list(Parameter::Temperature);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 7);
    }
}
