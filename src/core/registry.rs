//! Registry of the states and events known to one machine.
//!
//! Built once while the machine is defined and read-only afterwards, so a
//! finished registry can be shared across threads without locking.

use super::event::EventDef;
use super::state::{display_name, StateDef, StateValue};
use std::fmt;
use thiserror::Error;

/// Errors raised by registry lookups.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("State '{name}' is not defined")]
    StateNotFound { name: String },

    #[error("No state is stored as {value}")]
    ValueNotFound { value: StateValue },

    #[error("Event '{name}' is not defined")]
    EventNotFound { name: String },
}

/// The states and events of one (subject type, attribute) pair.
///
/// # Example
///
/// ```rust
/// use statebound::core::{Registry, StateDef};
/// use serde_json::json;
///
/// let mut registry: Registry<()> = Registry::new();
/// registry.define_state(StateDef::new("parked"));
/// registry.define_state(StateDef::new("idling"));
/// registry.define_event("ignite").add_transition("parked", "idling", None);
///
/// assert!(registry.state_by_value(&json!("idling")).is_ok());
/// assert!(registry.state_by_value(&json!("flying")).is_err());
/// assert_eq!(registry.event("ignite").unwrap().rules().len(), 1);
/// ```
pub struct Registry<T> {
    states: Vec<StateDef>,
    events: Vec<EventDef<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Define a state. Redefining an existing name replaces it in place.
    pub fn define_state(&mut self, state: StateDef) -> &StateDef {
        let index = match self.states.iter().position(|s| s.name() == state.name()) {
            Some(index) => {
                self.states[index] = state;
                index
            }
            None => {
                self.states.push(state);
                self.states.len() - 1
            }
        };
        &self.states[index]
    }

    /// Get or create the event with this name so rules can be appended.
    pub fn define_event(&mut self, name: &str) -> &mut EventDef<T> {
        let index = match self.events.iter().position(|e| e.name() == name) {
            Some(index) => index,
            None => {
                self.events.push(EventDef::new(name));
                self.events.len() - 1
            }
        };
        &mut self.events[index]
    }

    /// Insert a fully built event. Rules of an existing event with the same
    /// name are kept and the new rules appended after them.
    pub fn insert_event(&mut self, event: EventDef<T>) {
        match self.events.iter_mut().find(|e| e.name() == event.name()) {
            Some(existing) => {
                for rule in event.rules().iter().cloned() {
                    existing.push_rule(rule);
                }
            }
            None => self.events.push(event),
        }
    }

    pub fn states(&self) -> &[StateDef] {
        &self.states
    }

    pub fn events(&self) -> &[EventDef<T>] {
        &self.events
    }

    pub fn has_state(&self, name: Option<&str>) -> bool {
        self.states.iter().any(|s| s.name() == name)
    }

    pub fn state_by_name(&self, name: Option<&str>) -> Result<&StateDef, RegistryError> {
        self.states
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| RegistryError::StateNotFound {
                name: display_name(name).to_string(),
            })
    }

    /// Find the state a persisted value represents.
    ///
    /// Fails with `ValueNotFound` for values that match no state; callers
    /// surface that as a validation error rather than a crash.
    pub fn state_by_value(&self, value: &StateValue) -> Result<&StateDef, RegistryError> {
        self.states
            .iter()
            .find(|s| s.matches(value))
            .ok_or_else(|| RegistryError::ValueNotFound {
                value: value.clone(),
            })
    }

    pub fn event(&self, name: &str) -> Result<&EventDef<T>, RegistryError> {
        self.events
            .iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| RegistryError::EventNotFound {
                name: name.to_string(),
            })
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("states", &self.states)
            .field("events", &self.events)
            .finish()
    }
}
