//! In-memory datastore and record.
//!
//! `MemoryStore` keeps JSON rows by key and supports nested transactions by
//! snapshotting the row table on `begin`. Rolling back restores the
//! snapshot, committing drops it.

use super::error::TransactionError;
use super::validation::ValidationErrors;
use super::Record;
use crate::callbacks::CallbackError;
use crate::core::StateValue;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

type Rows = BTreeMap<String, Value>;

#[derive(Debug, Default)]
struct StoreState {
    rows: Rows,
    snapshots: Vec<Rows>,
}

/// Shared table of JSON rows with snapshot transactions.
///
/// # Example
///
/// ```rust
/// use statebound::persistence::MemoryStore;
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// store.begin();
/// store.put("vehicles/1", json!({"state": "idling"}));
/// store.rollback().unwrap();
///
/// assert!(store.get("vehicles/1").is_none());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn put(&self, key: impl Into<String>, row: Value) {
        self.state.lock().rows.insert(key.into(), row);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().rows.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().rows.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().rows.is_empty()
    }

    /// Number of open (nested) transactions.
    pub fn depth(&self) -> usize {
        self.state.lock().snapshots.len()
    }

    pub fn begin(&self) {
        let mut state = self.state.lock();
        let snapshot = state.rows.clone();
        state.snapshots.push(snapshot);
    }

    pub fn commit(&self) -> Result<(), TransactionError> {
        self.state
            .lock()
            .snapshots
            .pop()
            .map(|_| ())
            .ok_or(TransactionError::NotOpen)
    }

    pub fn rollback(&self) -> Result<(), TransactionError> {
        let mut state = self.state.lock();
        let snapshot = state.snapshots.pop().ok_or(TransactionError::NotOpen)?;
        state.rows = snapshot;
        Ok(())
    }
}

/// A record whose attributes live in memory and whose saves write a JSON
/// row into a [`MemoryStore`].
///
/// Saving clears previous errors, runs presence validations, and on success
/// writes the row and clears dirty tracking.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    key: String,
    attributes: BTreeMap<String, Value>,
    changed: BTreeSet<String>,
    // Flags added by `attribute_will_change` since the last save.
    pending: BTreeSet<String>,
    required: Vec<String>,
    errors: ValidationErrors,
    store: Arc<MemoryStore>,
    saves: usize,
}

impl MemoryRecord {
    pub fn new(key: impl Into<String>, store: Arc<MemoryStore>) -> Self {
        Self {
            key: key.into(),
            attributes: BTreeMap::new(),
            changed: BTreeSet::new(),
            pending: BTreeSet::new(),
            required: Vec::new(),
            errors: ValidationErrors::new(),
            store,
            saves: 0,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Require a non-null, non-empty value on save.
    pub fn validates_presence_of(mut self, attribute: impl Into<String>) -> Self {
        self.required.push(attribute.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Assign an attribute, marking it changed when the value differs.
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.attributes.get(attribute) != Some(&value) {
            self.changed.insert(attribute.to_string());
        }
        self.attributes.insert(attribute.to_string(), value);
    }

    pub fn is_changed(&self, attribute: &str) -> bool {
        self.changed.contains(attribute)
    }

    pub fn changed(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// The row last saved for this record, if any.
    pub fn persisted(&self) -> Option<Value> {
        self.store.get(&self.key)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    fn run_validations(&mut self) {
        for attribute in &self.required {
            let blank = match self.attributes.get(attribute) {
                None | Some(Value::Null) => true,
                Some(Value::String(text)) => text.trim().is_empty(),
                Some(_) => false,
            };
            if blank {
                self.errors.add(attribute.clone(), "can't be blank");
            }
        }
    }
}

impl Record for MemoryRecord {
    fn read_attribute(&self, attribute: &str) -> StateValue {
        self.attributes.get(attribute).cloned().unwrap_or(Value::Null)
    }

    fn write_attribute(&mut self, attribute: &str, value: StateValue) {
        self.attributes.insert(attribute.to_string(), value);
    }

    fn attribute_will_change(&mut self, attribute: &str) {
        if self.changed.insert(attribute.to_string()) {
            self.pending.insert(attribute.to_string());
        }
    }

    fn attribute_restored(&mut self, attribute: &str) {
        if self.pending.remove(attribute) {
            self.changed.remove(attribute);
        }
    }

    fn save(&mut self) -> Result<bool, CallbackError> {
        self.errors.clear();
        self.run_validations();
        if !self.errors.is_empty() {
            return Ok(false);
        }

        self.store.put(self.key.clone(), self.to_json());
        self.changed.clear();
        self.pending.clear();
        self.saves += 1;
        Ok(true)
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }

    fn begin_transaction(&mut self) -> Result<(), TransactionError> {
        self.store.begin();
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), TransactionError> {
        self.store.commit()
    }

    fn rollback_transaction(&mut self) -> Result<(), TransactionError> {
        self.store.rollback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_transactions_roll_back_independently() {
        let store = MemoryStore::new();
        store.put("a", json!(1));

        store.begin();
        store.put("b", json!(2));
        store.begin();
        store.put("c", json!(3));
        store.rollback().unwrap();

        assert_eq!(store.depth(), 1);
        assert!(store.get("c").is_none());
        assert_eq!(store.get("b"), Some(json!(2)));

        store.commit().unwrap();
        assert_eq!(store.depth(), 0);
        assert_eq!(store.keys(), vec!["a", "b"]);
    }

    #[test]
    fn outer_rollback_discards_committed_inner_work() {
        let store = MemoryStore::new();
        store.begin();
        store.begin();
        store.put("inner", json!(true));
        store.commit().unwrap();
        store.rollback().unwrap();

        assert!(store.is_empty());
    }

    #[test]
    fn closing_without_a_transaction_fails() {
        let store = MemoryStore::new();
        assert_eq!(store.commit(), Err(TransactionError::NotOpen));
        assert_eq!(store.rollback(), Err(TransactionError::NotOpen));
    }

    #[test]
    fn save_writes_row_and_clears_dirty_tracking() {
        let store = MemoryStore::shared();
        let mut record = MemoryRecord::new("vehicles/1", store.clone());
        record.set("state", "parked");
        assert!(record.is_changed("state"));

        assert!(record.save().unwrap());
        assert_eq!(record.save_count(), 1);
        assert!(record.changed().next().is_none());
        assert_eq!(store.get("vehicles/1"), Some(json!({"state": "parked"})));
        assert_eq!(record.persisted(), Some(json!({"state": "parked"})));
    }

    #[test]
    fn setting_the_same_value_is_not_a_change() {
        let mut record =
            MemoryRecord::new("vehicles/1", MemoryStore::shared()).with_attribute("state", "parked");
        record.set("state", "parked");
        assert!(!record.is_changed("state"));
    }

    #[test]
    fn raw_writes_do_not_track_changes() {
        let mut record = MemoryRecord::new("vehicles/1", MemoryStore::shared());
        record.write_attribute("state", json!("idling"));
        assert!(!record.is_changed("state"));

        record.attribute_will_change("state");
        assert!(record.is_changed("state"));
        assert_eq!(record.read_attribute("state"), json!("idling"));
        assert_eq!(record.read_attribute("missing"), Value::Null);
    }

    #[test]
    fn restoring_drops_only_the_flag_it_added() {
        let mut record = MemoryRecord::new("vehicles/1", MemoryStore::shared());
        record.attribute_will_change("state");
        record.attribute_restored("state");
        assert!(!record.is_changed("state"));

        record.set("name", "Herbie");
        record.attribute_will_change("name");
        record.attribute_restored("name");
        assert!(record.is_changed("name"));
    }

    #[test]
    fn presence_validation_blocks_save() {
        let store = MemoryStore::shared();
        let mut record = MemoryRecord::new("vehicles/1", store.clone())
            .validates_presence_of("name")
            .with_attribute("name", "  ");

        assert!(!record.save().unwrap());
        assert_eq!(record.errors().on("name"), vec!["can't be blank"]);
        assert!(store.is_empty());

        record.set("name", "Herbie");
        assert!(record.save().unwrap());
        assert!(record.errors().is_empty());
    }

    #[test]
    fn record_transactions_use_the_store() {
        let store = MemoryStore::shared();
        let mut record = MemoryRecord::new("vehicles/1", store.clone());

        record.begin_transaction().unwrap();
        record.save().unwrap();
        assert_eq!(store.len(), 1);
        record.rollback_transaction().unwrap();

        assert!(store.is_empty());
        assert!(record.commit_transaction().is_err());
    }
}
