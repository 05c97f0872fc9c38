//! Builder for constructing machines.

use crate::builder::error::{BuildError, DefinitionError};
use crate::builder::event::EventBuilder;
use crate::callbacks::{Around, CallbackChain, CallbackFilter, IntoCallback};
use crate::core::{display_name, Registry, StateDef, StateValue};
use crate::i18n::{MessageResolver, Translations};
use crate::machine::{Machine, MachineOptions};
use crate::naming::NamingTable;
use crate::persistence::{ColumnDefaults, Record};
use std::collections::BTreeSet;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<DefinitionError>>;

/// Builder for constructing machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use statebound::builder::MachineBuilder;
/// use statebound::callbacks::CallbackFilter;
/// use statebound::persistence::{MemoryRecord, MemoryStore};
///
/// let machine = MachineBuilder::<MemoryRecord>::new("state")
///     .model("vehicle")
///     .initial("parked")
///     .states(["parked", "idling"])
///     .event("ignite", |e| e.transition("parked", "idling"))
///     .after(CallbackFilter::any().on("ignite"), |v: &mut MemoryRecord| {
///         v.set("ignitions", 1)
///     })
///     .build()
///     .unwrap();
///
/// let mut vehicle = MemoryRecord::new("vehicles/1", MemoryStore::shared());
/// machine.initialize_state(&mut vehicle);
///
/// assert!(machine.fire(&mut vehicle, "ignite").unwrap());
/// assert_eq!(machine.state_name(&vehicle).unwrap(), Some("idling"));
/// ```
pub struct MachineBuilder<T> {
    options: MachineOptions,
    registry: Registry<T>,
    callbacks: CallbackChain<T>,
    messages: Option<Arc<dyn MessageResolver>>,
    column_default: Option<StateValue>,
    reserved: BTreeSet<String>,
    empty_event_name: bool,
}

impl<T: Record + 'static> MachineBuilder<T> {
    /// Create a builder for the machine on `attribute`.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self::with_options(MachineOptions {
            attribute: attribute.into(),
            ..MachineOptions::default()
        })
    }

    /// Create a builder from loaded options.
    pub fn with_options(options: MachineOptions) -> Self {
        Self {
            options,
            registry: Registry::new(),
            callbacks: CallbackChain::new(),
            messages: None,
            column_default: None,
            reserved: BTreeSet::new(),
            empty_event_name: false,
        }
    }

    /// Set the model name used in translation keys.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = model.into();
        self
    }

    /// Set the namespace folded into generated method names.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.options.namespace = Some(namespace.into());
        self
    }

    /// Set the initial state written by `initialize_state`.
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.options.initial = Some(state.into());
        self
    }

    /// Wrap each transition in a transaction on the subject (default on).
    pub fn use_transactions(mut self, enabled: bool) -> Self {
        self.options.use_transactions = enabled;
        self
    }

    /// Save the subject as part of each transition (default on).
    pub fn run_action(mut self, enabled: bool) -> Self {
        self.options.run_action = enabled;
        self
    }

    /// Define a state stored as its own name.
    pub fn state(self, name: impl Into<String>) -> Self {
        self.state_def(StateDef::new(name))
    }

    /// Define several states stored as their own names.
    pub fn states<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |builder, name| builder.state(name))
    }

    /// Define (or redefine) a state with a custom value or label.
    pub fn state_def(mut self, state: StateDef) -> Self {
        self.registry.define_state(state);
        self
    }

    /// Define an event. Calling this again for the same name appends rules.
    pub fn event<F>(mut self, name: &str, define: F) -> Self
    where
        F: FnOnce(EventBuilder<T>) -> EventBuilder<T>,
    {
        if name.is_empty() {
            self.empty_event_name = true;
            return self;
        }
        self.registry
            .insert_event(define(EventBuilder::new(name)).finish());
        self
    }

    /// Add a callback run before the action; an explicit `false` halts.
    pub fn before<A>(mut self, filter: CallbackFilter, callback: impl IntoCallback<T, A>) -> Self {
        self.callbacks.register_before(filter, callback);
        self
    }

    /// Add a callback run after a successful action.
    pub fn after<A>(mut self, filter: CallbackFilter, callback: impl IntoCallback<T, A>) -> Self {
        self.callbacks.register_after(filter, callback);
        self
    }

    /// Add a callback wrapping the action and every later around callback.
    pub fn around<C>(mut self, filter: CallbackFilter, callback: C) -> Self
    where
        C: Around<T> + 'static,
    {
        self.callbacks.register_around(filter, callback);
        self
    }

    /// Add a callback run when the transition fails.
    pub fn failure<A>(mut self, filter: CallbackFilter, callback: impl IntoCallback<T, A>) -> Self {
        self.callbacks.register_failure(filter, callback);
        self
    }

    /// Resolver for human names and error messages. Defaults to
    /// [`Translations::with_defaults`].
    pub fn messages(mut self, resolver: impl MessageResolver + 'static) -> Self {
        self.messages = Some(Arc::new(resolver));
        self
    }

    /// Read the attribute's column default from the schema.
    pub fn column_defaults(mut self, columns: &dyn ColumnDefaults) -> Self {
        self.column_default = columns.column_default(&self.options.attribute);
        self
    }

    /// Identifiers already taken on the subject, such as methods an ORM
    /// enum generates for the same column.
    pub fn reserve<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    /// Build the machine.
    ///
    /// Every definition problem is reported at once in
    /// [`BuildError::Invalid`].
    pub fn build(mut self) -> Result<Machine<T>, BuildError> {
        if self.options.attribute.is_empty() {
            return Err(BuildError::EmptyAttribute);
        }
        if self.empty_event_name {
            return Err(BuildError::EmptyEventName);
        }

        self.define_nil_if_referenced();

        let mut checks = self.check_definition();
        let naming = match NamingTable::build(
            &self.options.attribute,
            self.options.namespace.as_deref(),
            self.registry.states(),
            self.registry.events().iter().map(|e| e.name()),
            &self.reserved,
        ) {
            Ok(table) => table,
            Err(conflicts) => {
                checks.extend(
                    conflicts
                        .into_iter()
                        .map(|name| Validation::fail(DefinitionError::MethodConflict { name })),
                );
                NamingTable::default()
            }
        };

        if let Validation::Failure(problems) = Validation::all_vec(checks).map(|_| ()) {
            return Err(BuildError::Invalid(problems.iter().cloned().collect()));
        }

        let initial = self.resolve_initial();
        tracing::debug!(
            attribute = %self.options.attribute,
            states = self.registry.states().len(),
            events = self.registry.events().len(),
            initial = ?initial.as_ref().map(|s| display_name(s.name())),
            "machine defined"
        );

        let messages: Arc<dyn MessageResolver> = match self.messages.take() {
            Some(messages) => messages,
            None => Arc::new(Translations::with_defaults()),
        };

        Ok(Machine {
            initial,
            naming,
            messages,
            options: self.options,
            registry: self.registry,
            callbacks: self.callbacks,
            in_flight: Default::default(),
        })
    }

    /// Rules may name the nil state without defining it.
    fn define_nil_if_referenced(&mut self) {
        let referenced = self
            .registry
            .events()
            .iter()
            .any(|event| event.referenced_states().contains(&None));
        if referenced && !self.registry.has_state(None) {
            self.registry.define_state(StateDef::nil());
        }
    }

    /// Pure check of the definition, accumulating every problem.
    fn check_definition(&self) -> Vec<Check> {
        let mut checks: Vec<Check> = Vec::new();

        for event in self.registry.events() {
            for state in event.referenced_states() {
                checks.push(self.known_state(state, |state| {
                    DefinitionError::UndefinedStateInRule {
                        event: event.name().to_string(),
                        state,
                    }
                }));
            }
        }

        if let Some(initial) = &self.options.initial {
            checks.push(self.known_state(Some(initial.as_str()), |state| {
                DefinitionError::UndefinedInitialState { state }
            }));
        }

        for filter in self.callbacks.filters() {
            for state in filter.sources().referenced().chain(filter.destinations().referenced()) {
                checks.push(self.known_state(state, |state| {
                    DefinitionError::UndefinedStateInFilter { state }
                }));
            }
            for event in filter.events().referenced().flatten() {
                let check = if self.registry.event(event).is_ok() {
                    Validation::success(())
                } else {
                    Validation::fail(DefinitionError::UndefinedEventInFilter {
                        event: event.to_string(),
                    })
                };
                checks.push(check);
            }
        }

        let states = self.registry.states();
        for (index, first) in states.iter().enumerate() {
            if let Some(second) = states[index + 1..].iter().find(|s| s.value() == first.value()) {
                checks.push(Validation::fail(DefinitionError::DuplicateValue {
                    first: display_name(first.name()).to_string(),
                    second: display_name(second.name()).to_string(),
                    value: first.value().clone(),
                }));
            }
        }

        checks
    }

    fn known_state(
        &self,
        name: Option<&str>,
        problem: impl FnOnce(String) -> DefinitionError,
    ) -> Check {
        if self.registry.has_state(name) {
            Validation::success(())
        } else {
            Validation::fail(problem(display_name(name).to_string()))
        }
    }

    /// An explicit initial state wins over a column default; a column
    /// default naming a defined state is used otherwise.
    fn resolve_initial(&self) -> Option<StateDef> {
        let explicit = self
            .options
            .initial
            .as_deref()
            .and_then(|name| self.registry.state_by_name(Some(name)).ok())
            .cloned();

        match (explicit, &self.column_default) {
            (Some(initial), Some(default)) => {
                if initial.value() != default {
                    tracing::warn!(
                        attribute = %self.options.attribute,
                        initial = display_name(initial.name()),
                        column_default = %default,
                        "initial state differs from the column default; using the initial state"
                    );
                }
                Some(initial)
            }
            (Some(initial), None) => Some(initial),
            (None, Some(default)) => match self.registry.state_by_value(default) {
                Ok(state) => Some(state.clone()),
                Err(_) => {
                    tracing::warn!(
                        attribute = %self.options.attribute,
                        column_default = %default,
                        "column default matches no state; no initial state"
                    );
                    None
                }
            },
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Matcher, Target};
    use crate::persistence::{MemoryRecord, MemoryStore};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn vehicle() -> MachineBuilder<MemoryRecord> {
        MachineBuilder::new("state")
            .states(["parked", "idling"])
            .event("ignite", |e| e.transition("parked", "idling"))
    }

    fn columns(default: serde_json::Value) -> BTreeMap<String, StateValue> {
        BTreeMap::from([("state".to_string(), default)])
    }

    #[test]
    fn builder_validates_attribute() {
        let result = MachineBuilder::<MemoryRecord>::new("").build();
        assert!(matches!(result, Err(BuildError::EmptyAttribute)));
    }

    #[test]
    fn builder_rejects_empty_event_names() {
        let result = vehicle().event("", |e| e).build();
        assert!(matches!(result, Err(BuildError::EmptyEventName)));
    }

    #[test]
    fn builder_accumulates_all_problems() {
        let result = vehicle()
            .initial("flying")
            .event("crash", |e| e.transition(Matcher::all_except(["wrecked"]), "stalled"))
            .before(CallbackFilter::any().on("refuel"), || {})
            .build();

        let Err(BuildError::Invalid(problems)) = result else {
            panic!("expected an invalid definition");
        };
        assert_eq!(problems.len(), 4);
        assert!(problems.contains(&DefinitionError::UndefinedInitialState {
            state: "flying".into()
        }));
        assert!(problems.contains(&DefinitionError::UndefinedStateInRule {
            event: "crash".into(),
            state: "wrecked".into()
        }));
        assert!(problems.contains(&DefinitionError::UndefinedStateInRule {
            event: "crash".into(),
            state: "stalled".into()
        }));
        assert!(problems.contains(&DefinitionError::UndefinedEventInFilter {
            event: "refuel".into()
        }));
    }

    #[test]
    fn filters_must_name_defined_states() {
        let result = vehicle()
            .after(CallbackFilter::any().to("stalled"), || {})
            .build();

        let error = result.unwrap_err();
        assert_eq!(
            error.problems(),
            &[DefinitionError::UndefinedStateInFilter {
                state: "stalled".into()
            }]
        );
    }

    #[test]
    fn duplicate_values_are_rejected() {
        let result = vehicle()
            .state_def(StateDef::new("idling").with_value("parked"))
            .build();

        assert!(matches!(
            result.unwrap_err().problems(),
            [DefinitionError::DuplicateValue { .. }]
        ));
    }

    #[test]
    fn method_conflicts_are_rejected() {
        let result = vehicle()
            .reserve(["parked?", "state_parked?"])
            .build();

        assert_eq!(
            result.unwrap_err().problems(),
            &[DefinitionError::MethodConflict {
                name: "state_parked?".into()
            }]
        );
    }

    #[test]
    fn nil_state_is_defined_when_referenced() {
        let machine = vehicle()
            .event("reset", |e| e.transition(Matcher::all(), Target::nil()))
            .build()
            .unwrap();

        assert!(machine.registry().has_state(None));
        let mut record =
            MemoryRecord::new("1", MemoryStore::shared()).with_attribute("state", "idling");
        assert!(machine.perform(&mut record, "reset", false).unwrap());
        assert_eq!(record.get("state"), Some(&json!(null)));
    }

    #[test]
    fn explicit_initial_beats_column_default() {
        let machine = vehicle()
            .initial("parked")
            .column_defaults(&columns(json!("idling")))
            .build()
            .unwrap();

        assert_eq!(machine.initial_state().and_then(|s| s.name()), Some("parked"));
    }

    #[test]
    fn column_default_supplies_initial_state() {
        let machine = vehicle()
            .column_defaults(&columns(json!("idling")))
            .build()
            .unwrap();
        assert_eq!(machine.initial_state().and_then(|s| s.name()), Some("idling"));

        let machine = vehicle()
            .column_defaults(&columns(json!("flying")))
            .build()
            .unwrap();
        assert!(machine.initial_state().is_none());
    }

    #[test]
    fn options_carry_through() {
        let options = MachineOptions::from_json(
            r#"{"attribute": "alarm_state", "namespace": "alarm", "run_action": false}"#,
        )
        .unwrap();
        let machine = MachineBuilder::<MemoryRecord>::with_options(options)
            .states(["active", "off"])
            .event("disable", |e| e.transition("active", "off"))
            .build()
            .unwrap();

        assert_eq!(machine.attribute(), "alarm_state");
        assert!(!machine.options().run_action);
        assert!(machine.naming().resolve("disable_alarm").is_some());
    }
}
