//! Validation errors recorded on a subject.

use crate::i18n::titleize;
use serde::{Deserialize, Serialize};

/// One attribute-scoped validation message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub attribute: String,
    pub message: String,
}

impl ValidationError {
    /// Message prefixed with the attribute's display name, e.g.
    /// `State cannot transition via "ignite"`.
    pub fn full_message(&self) -> String {
        format!("{} {}", titleize(&self.attribute), self.message)
    }
}

/// Ordered collection of validation errors.
///
/// Adding a message already recorded for the same attribute is a no-op, so
/// repeating a rejected operation leaves a single entry.
///
/// # Example
///
/// ```rust
/// use statebound::persistence::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.add("state", "cannot transition via \"ignite\"");
///
/// assert_eq!(errors.on("state"), vec!["cannot transition via \"ignite\""]);
/// assert_eq!(
///     errors.full_messages(),
///     vec!["State cannot transition via \"ignite\"".to_string()]
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    entries: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message. Returns `false` if it was already present.
    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) -> bool {
        let error = ValidationError {
            attribute: attribute.into(),
            message: message.into(),
        };
        if self.entries.contains(&error) {
            return false;
        }
        self.entries.push(error);
        true
    }

    /// Messages recorded for one attribute.
    pub fn on(&self, attribute: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.attribute == attribute)
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.entries.iter().map(ValidationError::full_message).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_recorded_once() {
        let mut errors = ValidationErrors::new();
        assert!(errors.add("state", "is invalid"));
        assert!(!errors.add("state", "is invalid"));
        assert!(errors.add("alarm_state", "is invalid"));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.on("state"), vec!["is invalid"]);
    }

    #[test]
    fn full_messages_titleize_attributes() {
        let mut errors = ValidationErrors::new();
        errors.add("alarm_state", "is invalid");
        errors.add("name", "can't be blank");

        assert_eq!(
            errors.full_messages(),
            vec!["Alarm state is invalid", "Name can't be blank"]
        );
    }

    #[test]
    fn clear_empties_the_collection() {
        let mut errors = ValidationErrors::new();
        errors.add("state", "is invalid");
        errors.clear();

        assert!(errors.is_empty());
        assert!(errors.on("state").is_empty());
    }

    #[test]
    fn errors_serialize_as_entries() {
        let mut errors = ValidationErrors::new();
        errors.add("state", "is invalid");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"entries": [{"attribute": "state", "message": "is invalid"}]})
        );
    }
}
