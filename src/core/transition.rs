//! Transition descriptors.
//!
//! A `Transition` describes one proposed state change. It is built when an
//! event is fired, handed to every callback, and dropped once the pipeline
//! and persistence action complete. The subject is never stored inside the
//! descriptor; callbacks receive it alongside as `&mut T`.

use super::state::{display_name, StateDef, StateValue};
use chrono::{DateTime, Utc};
use std::cell::Cell;
use uuid::Uuid;

/// One proposed state change on a subject's attribute.
///
/// Equality is by identity: two descriptors with the same endpoints are
/// still distinct operations.
///
/// # Example
///
/// ```rust
/// use statebound::core::{StateDef, Transition};
///
/// let parked = StateDef::new("parked");
/// let idling = StateDef::new("idling");
///
/// let ignite = Transition::new("state", "ignite", &parked, &idling);
/// assert_eq!(ignite.from(), Some("parked"));
/// assert_eq!(ignite.to(), Some("idling"));
/// assert!(!ignite.is_loopback());
///
/// let again = Transition::new("state", "ignite", &parked, &idling);
/// assert_ne!(ignite, again);
/// ```
#[derive(Debug)]
pub struct Transition {
    id: Uuid,
    attribute: String,
    event: String,
    from: Option<String>,
    from_value: StateValue,
    to: Option<String>,
    to_value: StateValue,
    created_at: DateTime<Utc>,
    result: Cell<Option<bool>>,
}

impl Transition {
    pub fn new(
        attribute: impl Into<String>,
        event: impl Into<String>,
        from: &StateDef,
        to: &StateDef,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            attribute: attribute.into(),
            event: event.into(),
            from: from.name().map(str::to_string),
            from_value: from.value().clone(),
            to: to.name().map(str::to_string),
            to_value: to.value().clone(),
            created_at: Utc::now(),
            result: Cell::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Source state name (`None` for the nil state).
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn from_value(&self) -> &StateValue {
        &self.from_value
    }

    /// Destination state name (`None` for the nil state).
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn to_value(&self) -> &StateValue {
        &self.to_value
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True when the source and destination are the same state.
    pub fn is_loopback(&self) -> bool {
        self.from == self.to
    }

    /// Outcome of the core action; unset until the action has run.
    pub fn result(&self) -> Option<bool> {
        self.result.get()
    }

    pub(crate) fn set_result(&self, succeeded: bool) {
        self.result.set(Some(succeeded));
    }

    /// Short `event: from -> to` label for logs.
    pub fn describe(&self) -> String {
        format!(
            "{}: {} -> {}",
            self.event,
            display_name(self.from()),
            display_name(self.to())
        )
    }
}

impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Transition {}
