//! Message resolution for human-readable names and validation errors.
//!
//! Lookups go through a [`MessageResolver`] with an ordered list of
//! candidate keys, most specific first:
//!
//! 1. per machine: `state_machines.{model}.{attribute}.…`
//! 2. per model: `state_machines.{model}.…`
//! 3. global: `state_machines.…`
//!
//! When nothing resolves, names fall back to their humanized form.

use serde_json::Value;
use std::collections::HashMap;

/// Default text for `invalid` (value matches no state).
pub const INVALID: &str = "is invalid";
/// Default text for `invalid_event`.
pub const INVALID_EVENT: &str = "cannot transition when %{state}";
/// Default text for `invalid_transition`.
pub const INVALID_TRANSITION: &str = "cannot transition via \"%{event}\"";

/// Source of translated messages.
pub trait MessageResolver: Send + Sync {
    fn resolve(&self, key: &str) -> Option<String>;
}

/// In-memory translation table keyed by dotted paths.
///
/// # Example
///
/// ```rust
/// use statebound::i18n::{MessageResolver, Translations};
///
/// let translations = Translations::from_json_str(
///     r#"{"state_machines": {"vehicle": {"states": {"parked": "Parked"}}}}"#,
/// )
/// .unwrap();
///
/// assert_eq!(
///     translations.resolve("state_machines.vehicle.states.parked"),
///     Some("Parked".to_string())
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct Translations {
    messages: HashMap<String, String>,
}

impl Translations {
    /// Empty table: every lookup falls through to defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the built-in error messages.
    pub fn with_defaults() -> Self {
        Self::new()
            .insert("state_machines.errors.invalid", INVALID)
            .insert("state_machines.errors.invalid_event", INVALID_EVENT)
            .insert("state_machines.errors.invalid_transition", INVALID_TRANSITION)
    }

    pub fn insert(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(key.into(), message.into());
        self
    }

    /// Merge nested JSON objects, flattening paths with dots.
    pub fn merge_json(mut self, json: &Value) -> Self {
        flatten(json, String::new(), &mut self.messages);
        self
    }

    /// Built-in defaults overlaid with the given nested JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::with_defaults().merge_json(&value))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl MessageResolver for Translations {
    fn resolve(&self, key: &str) -> Option<String> {
        self.messages.get(key).cloned()
    }
}

fn flatten(value: &Value, prefix: String, into: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(nested, path, into);
            }
        }
        Value::String(text) => {
            into.insert(prefix, text.clone());
        }
        Value::Null => {}
        other => {
            into.insert(prefix, other.to_string());
        }
    }
}

/// Candidate key builder for one machine.
#[derive(Clone, Debug)]
pub struct KeyScope<'a> {
    pub model: &'a str,
    pub attribute: &'a str,
}

impl KeyScope<'_> {
    /// Candidates for a state (`plural = "states"`) or event
    /// (`plural = "events"`) name.
    pub fn name_keys(&self, plural: &str, name: &str) -> Vec<String> {
        let Self { model, attribute } = self;
        vec![
            format!("state_machines.{model}.{attribute}.{plural}.{name}"),
            format!("state_machines.{model}.{plural}.{name}"),
            format!("state_machines.{attribute}.{plural}.{name}"),
            format!("state_machines.{plural}.{name}"),
        ]
    }

    pub fn error_keys(&self, code: &str) -> Vec<String> {
        let Self { model, attribute } = self;
        vec![
            format!("state_machines.{model}.{attribute}.errors.{code}"),
            format!("state_machines.{model}.errors.{code}"),
            format!("state_machines.errors.{code}"),
        ]
    }
}

/// First candidate the resolver knows.
pub fn lookup(resolver: &dyn MessageResolver, candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|key| resolver.resolve(key))
}

/// Replace `%{name}` placeholders.
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("%{{{name}}}"), value)
    })
}

/// Readable form of an identifier: `first_gear` becomes `first gear`, the
/// nil state becomes `nil`.
pub fn humanize(name: Option<&str>) -> String {
    match name {
        Some(name) => name.replace('_', " "),
        None => "nil".to_string(),
    }
}

/// Humanize and capitalize the first letter (`state` becomes `State`).
pub fn titleize(name: &str) -> String {
    let human = humanize(Some(name));
    let mut chars = human.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => human,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> KeyScope<'static> {
        KeyScope {
            model: "vehicle",
            attribute: "state",
        }
    }

    #[test]
    fn defaults_cover_error_codes() {
        let translations = Translations::with_defaults();
        assert_eq!(
            lookup(&translations, &scope().error_keys("invalid_transition")),
            Some(INVALID_TRANSITION.to_string())
        );
        assert_eq!(
            lookup(&translations, &scope().error_keys("invalid")),
            Some(INVALID.to_string())
        );
    }

    #[test]
    fn most_specific_key_wins() {
        let translations = Translations::new()
            .insert("state_machines.states.parked", "global")
            .insert("state_machines.vehicle.states.parked", "model")
            .insert("state_machines.vehicle.state.states.parked", "machine");

        assert_eq!(
            lookup(&translations, &scope().name_keys("states", "parked")),
            Some("machine".to_string())
        );

        let translations = Translations::new()
            .insert("state_machines.states.parked", "global")
            .insert("state_machines.state.states.parked", "attribute");
        assert_eq!(
            lookup(&translations, &scope().name_keys("states", "parked")),
            Some("attribute".to_string())
        );
    }

    #[test]
    fn missing_keys_resolve_to_none() {
        let translations = Translations::new();
        assert!(translations.is_empty());
        assert_eq!(
            lookup(&translations, &scope().name_keys("events", "ignite")),
            None
        );
    }

    #[test]
    fn json_documents_are_flattened() {
        let translations = Translations::new().merge_json(&json!({
            "state_machines": {
                "vehicle": {
                    "events": { "ignite": "Start engine" },
                    "errors": { "invalid_transition": "nope: %{event}" }
                },
                "count": 3,
                "skipped": null
            }
        }));

        assert_eq!(translations.len(), 3);
        assert_eq!(
            translations.resolve("state_machines.vehicle.events.ignite"),
            Some("Start engine".to_string())
        );
        assert_eq!(
            translations.resolve("state_machines.count"),
            Some("3".to_string())
        );
    }

    #[test]
    fn json_strings_layer_over_defaults() {
        let translations = Translations::from_json_str(
            r#"{"state_machines": {"errors": {"invalid": "is not a known state"}}}"#,
        )
        .unwrap();

        assert_eq!(
            translations.resolve("state_machines.errors.invalid"),
            Some("is not a known state".to_string())
        );
        assert_eq!(
            translations.resolve("state_machines.errors.invalid_event"),
            Some(INVALID_EVENT.to_string())
        );
        assert!(Translations::from_json_str("not json").is_err());
    }

    #[test]
    fn interpolation_replaces_placeholders() {
        assert_eq!(
            interpolate(INVALID_TRANSITION, &[("event", "ignite")]),
            "cannot transition via \"ignite\""
        );
        assert_eq!(
            interpolate("%{a} and %{b}", &[("a", "x"), ("b", "y")]),
            "x and y"
        );
        assert_eq!(interpolate("no args", &[]), "no args");
    }

    #[test]
    fn humanize_and_titleize() {
        assert_eq!(humanize(Some("first_gear")), "first gear");
        assert_eq!(humanize(None), "nil");
        assert_eq!(titleize("state"), "State");
        assert_eq!(titleize("alarm_state"), "Alarm state");
        assert_eq!(titleize(""), "");
    }
}
