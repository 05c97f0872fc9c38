//! Naming strategy for the methods a machine exposes.
//!
//! Every state gets a predicate (`parked?`) and every event four entry
//! points (`ignite`, `ignite!`, `can_ignite?`, `ignite_transition`). A
//! namespace is folded in (`alarm_active?`, `enable_alarm`). Names that
//! collide with reserved identifiers, such as those an ORM enum already
//! generates for the same column, are prefixed with the attribute
//! (`state_parked?`).
//!
//! The table is resolved once when the machine is built; dispatch is a
//! plain lookup.

use crate::core::StateDef;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What a generated method does.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// `parked?`
    IsState(String),
    /// `ignite`
    Fire(String),
    /// `ignite!`
    FireStrict(String),
    /// `can_ignite?`
    CanFire(String),
    /// `ignite_transition`
    TransitionFor(String),
}

impl Method {
    fn default_name(&self, namespace: Option<&str>) -> String {
        match (self, namespace) {
            (Self::IsState(state), None) => format!("{state}?"),
            (Self::IsState(state), Some(ns)) => format!("{ns}_{state}?"),
            (Self::Fire(event), ns) => suffixed(event, ns),
            (Self::FireStrict(event), ns) => format!("{}!", suffixed(event, ns)),
            (Self::CanFire(event), ns) => format!("can_{}?", suffixed(event, ns)),
            (Self::TransitionFor(event), ns) => format!("{}_transition", suffixed(event, ns)),
        }
    }
}

fn suffixed(event: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("{event}_{ns}"),
        None => event.to_string(),
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IsState(state) => write!(f, "state predicate for {state}"),
            Self::Fire(event) => write!(f, "fire {event}"),
            Self::FireStrict(event) => write!(f, "fire {event} (strict)"),
            Self::CanFire(event) => write!(f, "can fire {event}"),
            Self::TransitionFor(event) => write!(f, "transition for {event}"),
        }
    }
}

/// Resolved identifiers for one machine.
///
/// # Example
///
/// ```rust
/// use statebound::core::StateDef;
/// use statebound::naming::{Method, NamingTable};
/// use std::collections::BTreeSet;
///
/// let reserved: BTreeSet<String> = ["parked?".to_string()].into();
/// let table = NamingTable::build(
///     "state",
///     None,
///     &[StateDef::new("parked")],
///     ["ignite"],
///     &reserved,
/// )
/// .unwrap();
///
/// assert_eq!(table.resolve("state_parked?"), Some(&Method::IsState("parked".into())));
/// assert_eq!(table.resolve("can_ignite?"), Some(&Method::CanFire("ignite".into())));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamingTable {
    by_name: BTreeMap<String, Method>,
    by_method: BTreeMap<Method, String>,
}

impl NamingTable {
    /// Resolve every method name. Fails with the identifiers that could not
    /// be made unique.
    pub fn build<'a>(
        attribute: &str,
        namespace: Option<&str>,
        states: &[StateDef],
        events: impl IntoIterator<Item = &'a str>,
        reserved: &BTreeSet<String>,
    ) -> Result<Self, Vec<String>> {
        let state_methods = states
            .iter()
            .filter_map(StateDef::name)
            .map(|s| Method::IsState(s.to_string()));
        let event_methods = events.into_iter().flat_map(|e| {
            [
                Method::Fire(e.to_string()),
                Method::FireStrict(e.to_string()),
                Method::CanFire(e.to_string()),
                Method::TransitionFor(e.to_string()),
            ]
        });

        let mut table = Self::default();
        let mut conflicts = Vec::new();

        for method in state_methods.chain(event_methods) {
            let mut name = method.default_name(namespace);
            if reserved.contains(&name) {
                let prefixed = format!("{attribute}_{name}");
                tracing::warn!(
                    attribute,
                    reserved = %name,
                    resolved = %prefixed,
                    "generated method collides with a reserved name; prefixing"
                );
                name = prefixed;
            }

            if reserved.contains(&name) || table.by_name.contains_key(&name) {
                conflicts.push(name);
                continue;
            }
            table.by_method.insert(method.clone(), name.clone());
            table.by_name.insert(name, method);
        }

        if conflicts.is_empty() {
            Ok(table)
        } else {
            Err(conflicts)
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&Method> {
        self.by_name.get(name)
    }

    pub fn name_for(&self, method: &Method) -> Option<&str> {
        self.by_method.get(method).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
