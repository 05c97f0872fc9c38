//! Seams to the host persistence layer.
//!
//! A machine never talks to storage directly. It reads and writes the
//! subject's state attribute, asks it to save, and opens transactions on
//! it, all through the [`Record`] trait. [`MemoryRecord`] is a complete
//! in-memory implementation backed by a shared [`MemoryStore`].

mod error;
mod memory;
mod scope;
mod validation;

pub use error::TransactionError;
pub use memory::{MemoryRecord, MemoryStore};
pub use scope::StateFilter;
pub use validation::{ValidationError, ValidationErrors};

use crate::callbacks::CallbackError;
use crate::core::StateValue;
use std::collections::{BTreeMap, HashMap};

/// A persisted subject whose attribute is governed by a machine.
///
/// Transaction hooks default to no-ops, which gives no atomicity: rollback
/// is then limited to the machine restoring the attribute it wrote.
pub trait Record {
    /// Current stored value; `Null` when unset.
    fn read_attribute(&self, attribute: &str) -> StateValue;

    /// Raw write; dirty tracking goes through
    /// [`attribute_will_change`](Record::attribute_will_change).
    fn write_attribute(&mut self, attribute: &str, value: StateValue);

    /// Flag the attribute as changed for dirty tracking.
    fn attribute_will_change(&mut self, _attribute: &str) {}

    /// The attribute was put back to the value it had before
    /// [`attribute_will_change`](Record::attribute_will_change); drop the
    /// change flag that call added.
    fn attribute_restored(&mut self, _attribute: &str) {}

    /// The persistence action. `Ok(false)` is a failed save (for example a
    /// failed validation); `Err` aborts the transition.
    fn save(&mut self) -> Result<bool, CallbackError>;

    fn errors(&self) -> &ValidationErrors;

    fn errors_mut(&mut self) -> &mut ValidationErrors;

    fn begin_transaction(&mut self) -> Result<(), TransactionError> {
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), TransactionError> {
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<(), TransactionError> {
        Ok(())
    }
}

/// Read-only schema lookup of column defaults, used while a machine is
/// defined.
pub trait ColumnDefaults {
    fn column_default(&self, attribute: &str) -> Option<StateValue>;
}

impl ColumnDefaults for BTreeMap<String, StateValue> {
    fn column_default(&self, attribute: &str) -> Option<StateValue> {
        self.get(attribute).cloned()
    }
}

impl ColumnDefaults for HashMap<String, StateValue> {
    fn column_default(&self, attribute: &str) -> Option<StateValue> {
        self.get(attribute).cloned()
    }
}

impl ColumnDefaults for serde_json::Map<String, StateValue> {
    fn column_default(&self, attribute: &str) -> Option<StateValue> {
        self.get(attribute).filter(|v| !v.is_null()).cloned()
    }
}
