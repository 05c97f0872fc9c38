//! Builder for one event's transition rules.

use crate::core::{EventDef, Guard, Matcher, Target};

/// Fluent definition of an event, handed to the closure passed to
/// [`MachineBuilder::event`](super::MachineBuilder::event).
///
/// Rules are tried in the order they are added; the first whose source
/// matches and whose guard passes wins.
pub struct EventBuilder<T> {
    event: EventDef<T>,
}

impl<T> EventBuilder<T> {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            event: EventDef::new(name),
        }
    }

    /// Add an unconditional rule.
    pub fn transition(mut self, from: impl Into<Matcher>, to: impl Into<Target>) -> Self {
        self.event.add_transition(from, to, None);
        self
    }

    /// Add a rule that applies only while `predicate` holds for the subject.
    pub fn transition_if<F>(
        self,
        from: impl Into<Matcher>,
        to: impl Into<Target>,
        predicate: F,
    ) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.guarded(from, to, Guard::new(predicate))
    }

    pub fn guarded(
        mut self,
        from: impl Into<Matcher>,
        to: impl Into<Target>,
        guard: Guard<T>,
    ) -> Self {
        self.event.add_transition(from, to, Some(guard));
        self
    }

    /// Stay in the current state when coming from `from`.
    pub fn loopback(self, from: impl Into<Matcher>) -> Self {
        self.transition(from, Target::Same)
    }

    pub fn human_name(mut self, label: impl Into<String>) -> Self {
        self.event = self.event.with_human_name(label);
        self
    }

    pub(crate) fn finish(self) -> EventDef<T> {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Vehicle {
        seatbelt_on: bool,
    }

    #[test]
    fn rules_keep_their_order() {
        let event = EventBuilder::<Vehicle>::new("ignite")
            .transition_if("parked", "idling", |v: &Vehicle| v.seatbelt_on)
            .transition("parked", "stalled")
            .loopback("idling")
            .human_name("Start engine")
            .finish();

        let buckled = Vehicle { seatbelt_on: true };
        let unbuckled = Vehicle { seatbelt_on: false };

        assert_eq!(event.rules().len(), 3);
        assert_eq!(event.destination(Some("parked"), &buckled), Some(Some("idling")));
        assert_eq!(event.destination(Some("parked"), &unbuckled), Some(Some("stalled")));
        assert_eq!(event.destination(Some("idling"), &unbuckled), Some(Some("idling")));
        assert_eq!(event.human_name(), "Start engine");
    }

    #[test]
    fn named_guards_are_kept() {
        let event = EventBuilder::<Vehicle>::new("ignite")
            .guarded(
                Matcher::all(),
                "idling",
                Guard::named("seatbelt on", |v: &Vehicle| v.seatbelt_on),
            )
            .finish();

        let guard = event.rules()[0].guard().unwrap();
        assert_eq!(guard.description(), Some("seatbelt on"));
    }
}
