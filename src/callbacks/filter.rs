//! Filters that scope a callback to particular transitions.

use crate::core::{Matcher, Transition};

/// Selects the transitions a callback runs for.
///
/// A filter matches when the event, source and destination predicates all
/// hold. Predicates left unset match everything.
///
/// # Example
///
/// ```rust
/// use statebound::callbacks::CallbackFilter;
/// use statebound::core::{Matcher, StateDef, Transition};
///
/// let filter = CallbackFilter::any()
///     .on("ignite")
///     .from(Matcher::all_except(["idling"]));
///
/// let ignite = Transition::new(
///     "state",
///     "ignite",
///     &StateDef::new("parked"),
///     &StateDef::new("idling"),
/// );
/// assert!(filter.matches(&ignite));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackFilter {
    events: Matcher,
    from: Matcher,
    to: Matcher,
}

impl CallbackFilter {
    /// Filter matching every transition.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn on(mut self, events: impl Into<Matcher>) -> Self {
        self.events = events.into();
        self
    }

    pub fn from(mut self, states: impl Into<Matcher>) -> Self {
        self.from = states.into();
        self
    }

    pub fn to(mut self, states: impl Into<Matcher>) -> Self {
        self.to = states.into();
        self
    }

    pub fn events(&self) -> &Matcher {
        &self.events
    }

    pub fn sources(&self) -> &Matcher {
        &self.from
    }

    pub fn destinations(&self) -> &Matcher {
        &self.to
    }

    pub fn matches(&self, transition: &Transition) -> bool {
        self.events.matches(Some(transition.event()))
            && self.from.matches(transition.from())
            && self.to.matches(transition.to())
    }
}
