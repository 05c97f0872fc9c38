//! Events and the transition rules they carry.
//!
//! An event owns an ordered list of rules. Each rule maps a set of source
//! states to one destination, optionally conditioned on a guard. When an
//! event fires, the first rule that matches the current state wins.

use super::guard::Guard;
use super::matcher::Matcher;
use crate::i18n::humanize;
use std::fmt;

/// Destination of a transition rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A specific state (`None` is the nil state).
    State(Option<String>),
    /// Stay in the source state (loopback).
    Same,
}

impl Target {
    pub fn nil() -> Self {
        Self::State(None)
    }

    /// Resolve the destination name given the source state's name.
    pub fn resolve<'a>(&'a self, from: Option<&'a str>) -> Option<&'a str> {
        match self {
            Self::State(name) => name.as_deref(),
            Self::Same => from,
        }
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::State(Some(name.to_string()))
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Self::State(Some(name))
    }
}

/// One `sources => destination` mapping within an event.
pub struct TransitionRule<T> {
    from: Matcher,
    to: Target,
    guard: Option<Guard<T>>,
}

impl<T> TransitionRule<T> {
    pub fn new(from: impl Into<Matcher>, to: impl Into<Target>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            guard: None,
        }
    }

    pub fn with_guard(mut self, guard: Guard<T>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn from(&self) -> &Matcher {
        &self.from
    }

    pub fn to(&self) -> &Target {
        &self.to
    }

    pub fn guard(&self) -> Option<&Guard<T>> {
        self.guard.as_ref()
    }

    /// Check if this rule applies to a subject in the given state (pure).
    pub fn applies(&self, from: Option<&str>, subject: &T) -> bool {
        if !self.from.matches(from) {
            return false;
        }

        self.guard.as_ref().is_none_or(|g| g.check(subject))
    }
}

impl<T> Clone for TransitionRule<T> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.clone(),
            to: self.to.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<T> fmt::Debug for TransitionRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRule")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("guard", &self.guard)
            .finish()
    }
}

/// A named event and its ordered transition rules.
///
/// # Example
///
/// ```rust
/// use statebound::core::{EventDef, Matcher, Target};
///
/// let mut ignite: EventDef<()> = EventDef::new("ignite");
/// ignite
///     .add_transition("parked", "idling", None)
///     .add_transition("idling", Target::Same, None);
///
/// assert_eq!(ignite.destination(Some("parked"), &()), Some(Some("idling")));
/// assert_eq!(ignite.destination(Some("idling"), &()), Some(Some("idling")));
/// assert_eq!(ignite.destination(Some("stalled"), &()), None);
/// ```
pub struct EventDef<T> {
    name: String,
    human_name: Option<String>,
    rules: Vec<TransitionRule<T>>,
}

impl<T> EventDef<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            human_name: None,
            rules: Vec::new(),
        }
    }

    pub fn with_human_name(mut self, human_name: impl Into<String>) -> Self {
        self.human_name = Some(human_name.into());
        self
    }

    /// Append a rule mapping `from` to `to`, optionally guarded.
    pub fn add_transition(
        &mut self,
        from: impl Into<Matcher>,
        to: impl Into<Target>,
        guard: Option<Guard<T>>,
    ) -> &mut Self {
        let mut rule = TransitionRule::new(from, to);
        rule.guard = guard;
        self.rules.push(rule);
        self
    }

    pub(crate) fn push_rule(&mut self, rule: TransitionRule<T>) {
        self.rules.push(rule);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn human_name_override(&self) -> Option<&str> {
        self.human_name.as_deref()
    }

    pub fn human_name(&self) -> String {
        match &self.human_name {
            Some(label) => label.clone(),
            None => humanize(Some(&self.name)),
        }
    }

    pub fn rules(&self) -> &[TransitionRule<T>] {
        &self.rules
    }

    /// First rule that applies from the given state, if any.
    pub fn rule_for(&self, from: Option<&str>, subject: &T) -> Option<&TransitionRule<T>> {
        self.rules.iter().find(|rule| rule.applies(from, subject))
    }

    /// Destination reachable from `from`: `None` when no rule applies,
    /// `Some(None)` when the destination is the nil state.
    pub fn destination<'a>(&'a self, from: Option<&'a str>, subject: &T) -> Option<Option<&'a str>> {
        self.rule_for(from, subject).map(|rule| rule.to.resolve(from))
    }

    /// Every state name mentioned by this event's rules.
    pub fn referenced_states(&self) -> Vec<Option<&str>> {
        let mut names = Vec::new();
        for rule in &self.rules {
            names.extend(rule.from.referenced());
            if let Target::State(name) = &rule.to {
                names.push(name.as_deref());
            }
        }
        names
    }
}

impl<T> Clone for EventDef<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            human_name: self.human_name.clone(),
            rules: self.rules.clone(),
        }
    }
}

impl<T> fmt::Debug for EventDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDef")
            .field("name", &self.name)
            .field("human_name", &self.human_name)
            .field("rules", &self.rules)
            .finish()
    }
}
