//! The state machine bound to one attribute of a persisted subject.
//!
//! A [`Machine`] is built once (see [`MachineBuilder`](crate::builder::MachineBuilder))
//! and is read-only afterwards. It can be shared across threads and used on
//! any number of subjects; each call borrows only the subject it acts on.

mod error;
mod executor;
mod in_flight;
mod options;
mod transaction;

pub use error::MachineError;
pub use options::MachineOptions;

use crate::callbacks::CallbackChain;
use crate::core::{display_name, EventDef, Registry, StateDef, StateValue, Transition};
use crate::i18n::{lookup, KeyScope, MessageResolver};
use crate::naming::{Method, NamingTable};
use crate::persistence::{Record, StateFilter};
use in_flight::InFlight;
use std::fmt;
use std::sync::Arc;

/// What a dispatched method returned.
#[derive(Debug, PartialEq, Eq)]
pub enum MethodResult {
    Bool(bool),
    Transition(Option<Transition>),
}

impl MethodResult {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Transition(_) => None,
        }
    }
}

/// A state machine over attribute `options.attribute` of subjects `T`.
pub struct Machine<T> {
    pub(crate) options: MachineOptions,
    pub(crate) registry: Registry<T>,
    pub(crate) callbacks: CallbackChain<T>,
    pub(crate) initial: Option<StateDef>,
    pub(crate) naming: NamingTable,
    pub(crate) messages: Arc<dyn MessageResolver>,
    pub(crate) in_flight: InFlight,
}

impl<T: Record> Machine<T> {
    pub fn attribute(&self) -> &str {
        &self.options.attribute
    }

    pub fn options(&self) -> &MachineOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    pub fn states(&self) -> &[StateDef] {
        self.registry.states()
    }

    pub fn events(&self) -> &[EventDef<T>] {
        self.registry.events()
    }

    pub fn callbacks(&self) -> &CallbackChain<T> {
        &self.callbacks
    }

    pub fn naming(&self) -> &NamingTable {
        &self.naming
    }

    pub fn initial_state(&self) -> Option<&StateDef> {
        self.initial.as_ref()
    }

    /// Write the initial state's value if the attribute is unset.
    /// Returns whether anything was written.
    pub fn initialize_state(&self, subject: &mut T) -> bool {
        let Some(initial) = &self.initial else {
            return false;
        };
        if !subject.read_attribute(self.attribute()).is_null() {
            return false;
        }
        subject.write_attribute(self.attribute(), initial.value().clone());
        true
    }

    /// The state the subject is in, or `None` if its stored value matches
    /// no state.
    pub fn state_of(&self, subject: &T) -> Option<&StateDef> {
        let value = subject.read_attribute(self.attribute());
        self.registry.state_by_value(&value).ok()
    }

    /// Name of the subject's state (`None` for the nil state).
    pub fn state_name(&self, subject: &T) -> Result<Option<&str>, MachineError> {
        self.current(subject).map(StateDef::name)
    }

    pub fn is_state<'a>(
        &self,
        subject: &T,
        name: impl Into<Option<&'a str>>,
    ) -> Result<bool, MachineError> {
        let state = self.state_def(name.into())?;
        Ok(state.matches(&subject.read_attribute(self.attribute())))
    }

    pub fn human_state_name(&self, subject: &T) -> Result<String, MachineError> {
        self.current(subject).map(|state| self.translate_state(state))
    }

    /// Translated label of a state, falling back to its humanized name.
    pub fn state_human_name<'a>(
        &self,
        name: impl Into<Option<&'a str>>,
    ) -> Result<String, MachineError> {
        self.state_def(name.into()).map(|state| self.translate_state(state))
    }

    pub fn event_human_name(&self, event: &str) -> Result<String, MachineError> {
        self.event_def(event).map(|event| self.translate_event(event))
    }

    pub fn can_fire(&self, subject: &T, event: &str) -> Result<bool, MachineError> {
        self.transition_for(subject, event).map(|t| t.is_some())
    }

    /// The transition `event` would perform, without running it.
    pub fn transition_for(
        &self,
        subject: &T,
        event: &str,
    ) -> Result<Option<Transition>, MachineError> {
        let event_def = self.event_def(event)?;
        let Some(from) = self.state_of(subject) else {
            return Ok(None);
        };
        let Some(to_name) = event_def.destination(from.name(), subject) else {
            return Ok(None);
        };
        let to = self.state_def(to_name)?;
        Ok(Some(Transition::new(self.attribute(), event, from, to)))
    }

    /// Events with a valid transition from the subject's current state.
    pub fn events_for(&self, subject: &T) -> Vec<&str> {
        let Some(from) = self.state_of(subject) else {
            return Vec::new();
        };
        self.registry
            .events()
            .iter()
            .filter(|event| event.destination(from.name(), subject).is_some())
            .map(EventDef::name)
            .collect()
    }

    /// Filter selecting subjects in any of the named states.
    pub fn with_states<'a, I, S>(&self, names: I) -> Result<StateFilter, MachineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<&'a str>>,
    {
        Ok(StateFilter::including(self.attribute(), self.values_of(names)?))
    }

    /// Filter selecting subjects in none of the named states.
    pub fn without_states<'a, I, S>(&self, names: I) -> Result<StateFilter, MachineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<&'a str>>,
    {
        Ok(StateFilter::excluding(self.attribute(), self.values_of(names)?))
    }

    /// Dispatch a generated method by its resolved name.
    ///
    /// ```rust
    /// use statebound::builder::MachineBuilder;
    /// use statebound::machine::MethodResult;
    /// use statebound::persistence::{MemoryRecord, MemoryStore};
    ///
    /// let machine = MachineBuilder::<MemoryRecord>::new("state")
    ///     .initial("parked")
    ///     .states(["parked", "idling"])
    ///     .event("ignite", |e| e.transition("parked", "idling"))
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut vehicle = MemoryRecord::new("vehicles/1", MemoryStore::shared());
    /// machine.initialize_state(&mut vehicle);
    ///
    /// assert_eq!(machine.call(&mut vehicle, "can_ignite?").unwrap(), MethodResult::Bool(true));
    /// assert_eq!(machine.call(&mut vehicle, "ignite").unwrap(), MethodResult::Bool(true));
    /// assert_eq!(machine.call(&mut vehicle, "idling?").unwrap(), MethodResult::Bool(true));
    /// assert!(machine.call(&mut vehicle, "fly").is_err());
    /// ```
    pub fn call(&self, subject: &mut T, method: &str) -> Result<MethodResult, MachineError> {
        let resolved = self
            .naming
            .resolve(method)
            .ok_or_else(|| MachineError::UnknownMethod {
                method: method.to_string(),
            })?;

        match resolved {
            Method::IsState(state) => self.is_state(subject, state.as_str()).map(MethodResult::Bool),
            Method::Fire(event) => self.fire(subject, event).map(MethodResult::Bool),
            Method::FireStrict(event) => self
                .fire_strict(subject, event)
                .map(|()| MethodResult::Bool(true)),
            Method::CanFire(event) => self.can_fire(subject, event).map(MethodResult::Bool),
            Method::TransitionFor(event) => self
                .transition_for(subject, event)
                .map(MethodResult::Transition),
        }
    }

    fn current(&self, subject: &T) -> Result<&StateDef, MachineError> {
        let value = subject.read_attribute(self.attribute());
        self.registry
            .state_by_value(&value)
            .map_err(|_| MachineError::UnknownState {
                attribute: self.attribute().to_string(),
                state: value.to_string(),
            })
    }

    fn state_def(&self, name: Option<&str>) -> Result<&StateDef, MachineError> {
        self.registry
            .state_by_name(name)
            .map_err(|_| MachineError::UnknownState {
                attribute: self.attribute().to_string(),
                state: display_name(name).to_string(),
            })
    }

    pub(crate) fn event_def(&self, name: &str) -> Result<&EventDef<T>, MachineError> {
        self.registry
            .event(name)
            .map_err(|_| MachineError::UnknownEvent {
                attribute: self.attribute().to_string(),
                event: name.to_string(),
            })
    }

    fn values_of<'a, I, S>(&self, names: I) -> Result<Vec<StateValue>, MachineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<&'a str>>,
    {
        names
            .into_iter()
            .map(|name| self.state_def(name.into()).map(|s| s.value().clone()))
            .collect()
    }

    pub(crate) fn keys(&self) -> KeyScope<'_> {
        KeyScope {
            model: &self.options.model,
            attribute: self.attribute(),
        }
    }

    pub(crate) fn translate_state(&self, state: &StateDef) -> String {
        if let Some(label) = state.human_name_override() {
            return label.to_string();
        }
        let name = display_name(state.name());
        lookup(self.messages.as_ref(), &self.keys().name_keys("states", name))
            .unwrap_or_else(|| state.human_name())
    }

    pub(crate) fn translate_event(&self, event: &EventDef<T>) -> String {
        if let Some(label) = event.human_name_override() {
            return label.to_string();
        }
        lookup(self.messages.as_ref(), &self.keys().name_keys("events", event.name()))
            .unwrap_or_else(|| event.human_name())
    }
}

impl<T> fmt::Debug for Machine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("callbacks", &self.callbacks)
            .field("initial", &self.initial)
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}
