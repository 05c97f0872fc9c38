//! State definitions held by a machine's registry.
//!
//! A state pairs a name with the value stored in the subject's attribute.
//! The stored value defaults to the state's name; the nil state (no name)
//! stores JSON `null` and represents an unset attribute.

use crate::i18n::humanize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value persisted in a subject's state attribute.
pub type StateValue = Value;

/// A named state and the value that represents it in storage.
///
/// # Example
///
/// ```rust
/// use statebound::core::StateDef;
/// use serde_json::json;
///
/// let parked = StateDef::new("parked");
/// assert_eq!(parked.value(), &json!("parked"));
/// assert_eq!(parked.human_name(), "parked");
///
/// let first_gear = StateDef::new("first_gear").with_value(1);
/// assert!(first_gear.matches(&json!(1)));
/// assert_eq!(first_gear.human_name(), "first gear");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateDef {
    name: Option<String>,
    value: StateValue,
    human_name: Option<String>,
}

impl StateDef {
    /// Define a named state stored as its own name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            value: Value::String(name.clone()),
            name: Some(name),
            human_name: None,
        }
    }

    /// The nil state: no name, stored as `null`.
    pub fn nil() -> Self {
        Self {
            name: None,
            value: Value::Null,
            human_name: None,
        }
    }

    /// Override the value written to storage for this state.
    pub fn with_value(mut self, value: impl Into<StateValue>) -> Self {
        self.value = value.into();
        self
    }

    /// Override the human-readable label.
    pub fn with_human_name(mut self, human_name: impl Into<String>) -> Self {
        self.human_name = Some(human_name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> &StateValue {
        &self.value
    }

    pub fn is_nil(&self) -> bool {
        self.name.is_none()
    }

    /// Explicit label, if one was configured.
    pub fn human_name_override(&self) -> Option<&str> {
        self.human_name.as_deref()
    }

    /// Label for display: the override if present, else the humanized name.
    pub fn human_name(&self) -> String {
        match &self.human_name {
            Some(label) => label.clone(),
            None => humanize(self.name()),
        }
    }

    /// Check whether a persisted value represents this state.
    pub fn matches(&self, value: &StateValue) -> bool {
        &self.value == value
    }
}

/// Name used in logs and messages for a possibly-nil state.
pub(crate) fn display_name(name: Option<&str>) -> &str {
    name.unwrap_or("nil")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_defaults_to_name() {
        let state = StateDef::new("idling");
        assert_eq!(state.name(), Some("idling"));
        assert_eq!(state.value(), &json!("idling"));
        assert!(!state.is_nil());
    }

    #[test]
    fn nil_state_is_stored_as_null() {
        let state = StateDef::nil();
        assert!(state.is_nil());
        assert!(state.matches(&Value::Null));
        assert_eq!(state.human_name(), "nil");
    }

    #[test]
    fn custom_value_replaces_name_for_matching() {
        let state = StateDef::new("first_gear").with_value(1);
        assert!(state.matches(&json!(1)));
        assert!(!state.matches(&json!("first_gear")));
    }

    #[test]
    fn human_name_prefers_override() {
        let state = StateDef::new("first_gear");
        assert_eq!(state.human_name(), "first gear");

        let state = state.with_human_name("1st gear");
        assert_eq!(state.human_name(), "1st gear");
        assert_eq!(state.human_name_override(), Some("1st gear"));
    }

    #[test]
    fn state_serializes_correctly() {
        let state = StateDef::new("parked").with_value(0);
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: StateDef = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }

    #[test]
    fn display_name_renders_nil() {
        assert_eq!(display_name(None), "nil");
        assert_eq!(display_name(Some("parked")), "parked");
    }
}
