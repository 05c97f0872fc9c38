//! Ordered callback pipeline.
//!
//! Phases run in a fixed order for each transition:
//!
//! 1. before callbacks, in registration order; an explicit `false` halts
//! 2. around callbacks, nested so the first registered is outermost, with
//!    the core action innermost
//! 3. after callbacks when the action succeeded, failure callbacks otherwise
//!
//! Only callbacks whose filter matches the transition take part.

use super::around::{Around, Wrap};
use super::filter::CallbackFilter;
use super::flow::{CallbackError, CallbackFn, Flow, IntoCallback};
use crate::core::Transition;
use std::fmt;

/// How a pass through the pipeline ended.
#[derive(Debug)]
pub enum Outcome {
    /// The core action ran and reported success.
    Succeeded,
    /// A before or around callback halted with an explicit falsy result.
    Halted,
    /// The core action reported failure.
    ActionFailed,
    /// A callback or the action raised.
    Aborted(CallbackError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Halted => "halted",
            Self::ActionFailed => "action failed",
            Self::Aborted(CallbackError::Rollback) => "rolled back",
            Self::Aborted(CallbackError::Raised(_)) => "raised",
        }
    }
}

struct Registration<C> {
    filter: CallbackFilter,
    callback: C,
}

/// Callbacks registered on one machine, grouped by phase.
pub struct CallbackChain<T> {
    before: Vec<Registration<CallbackFn<T>>>,
    around: Vec<Registration<Box<dyn Wrap<T>>>>,
    after: Vec<Registration<CallbackFn<T>>>,
    failure: Vec<Registration<CallbackFn<T>>>,
}

impl<T> Default for CallbackChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CallbackChain<T> {
    pub fn new() -> Self {
        Self {
            before: Vec::new(),
            around: Vec::new(),
            after: Vec::new(),
            failure: Vec::new(),
        }
    }

    pub fn register_before<A>(&mut self, filter: CallbackFilter, callback: impl IntoCallback<T, A>) {
        self.before.push(Registration {
            filter,
            callback: callback.into_callback(),
        });
    }

    pub fn register_after<A>(&mut self, filter: CallbackFilter, callback: impl IntoCallback<T, A>) {
        self.after.push(Registration {
            filter,
            callback: callback.into_callback(),
        });
    }

    pub fn register_failure<A>(
        &mut self,
        filter: CallbackFilter,
        callback: impl IntoCallback<T, A>,
    ) {
        self.failure.push(Registration {
            filter,
            callback: callback.into_callback(),
        });
    }

    pub fn register_around<C>(&mut self, filter: CallbackFilter, callback: C)
    where
        C: Around<T> + 'static,
    {
        self.around.push(Registration {
            filter,
            callback: Box::new(callback),
        });
    }

    /// Every filter registered, across all phases.
    pub fn filters(&self) -> impl Iterator<Item = &CallbackFilter> {
        self.before
            .iter()
            .map(|r| &r.filter)
            .chain(self.around.iter().map(|r| &r.filter))
            .chain(self.after.iter().map(|r| &r.filter))
            .chain(self.failure.iter().map(|r| &r.filter))
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty()
            && self.around.is_empty()
            && self.after.is_empty()
            && self.failure.is_empty()
    }

    /// Run the whole pipeline for `transition`, with `action` innermost.
    pub fn run(
        &self,
        subject: &mut T,
        transition: &Transition,
        action: &mut dyn FnMut(&mut T) -> Outcome,
    ) -> Outcome {
        let outcome = match self.run_before(subject, transition) {
            Some(stopped) => stopped,
            None => {
                let arounds: Vec<&dyn Wrap<T>> = self
                    .around
                    .iter()
                    .filter(|r| r.filter.matches(transition))
                    .map(|r| r.callback.as_ref())
                    .collect();
                nest(&arounds, subject, transition, action)
            }
        };

        tracing::debug!(
            transition = %transition.describe(),
            outcome = outcome.label(),
            "callback pipeline finished"
        );

        if outcome.is_success() {
            self.run_after(subject, transition)
        } else {
            self.run_failure(subject, transition);
            outcome
        }
    }

    fn run_before(&self, subject: &mut T, transition: &Transition) -> Option<Outcome> {
        for registration in self.before.iter().filter(|r| r.filter.matches(transition)) {
            match (registration.callback)(subject, transition) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt) => return Some(Outcome::Halted),
                Err(error) => return Some(Outcome::Aborted(error)),
            }
        }
        None
    }

    fn run_after(&self, subject: &mut T, transition: &Transition) -> Outcome {
        for registration in self.after.iter().filter(|r| r.filter.matches(transition)) {
            // Return values are ignored here; only a raised error aborts.
            if let Err(error) = (registration.callback)(subject, transition) {
                return Outcome::Aborted(error);
            }
        }
        Outcome::Succeeded
    }

    fn run_failure(&self, subject: &mut T, transition: &Transition) {
        for registration in self.failure.iter().filter(|r| r.filter.matches(transition)) {
            if let Err(error) = (registration.callback)(subject, transition) {
                tracing::warn!(
                    transition = %transition.describe(),
                    %error,
                    "failure callback raised; ignoring"
                );
            }
        }
    }
}

/// Compose around callbacks right-to-left around `action`: the first
/// callback's `exit` is the last thing to run.
fn nest<T>(
    arounds: &[&dyn Wrap<T>],
    subject: &mut T,
    transition: &Transition,
    action: &mut dyn FnMut(&mut T) -> Outcome,
) -> Outcome {
    match arounds.split_first() {
        None => action(subject),
        Some((outer, rest)) => outer.wrap(subject, transition, &mut |inner: &mut T| {
            nest(rest, inner, transition, &mut *action)
        }),
    }
}

impl<T> fmt::Debug for CallbackChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackChain")
            .field("before", &self.before.len())
            .field("around", &self.around.len())
            .field("after", &self.after.len())
            .field("failure", &self.failure.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::around_fn;
    use crate::core::StateDef;

    #[derive(Default)]
    struct Log {
        entries: Vec<String>,
    }

    impl Log {
        fn push(&mut self, entry: &str) {
            self.entries.push(entry.to_string());
        }
    }

    fn ignite() -> Transition {
        Transition::new(
            "state",
            "ignite",
            &StateDef::new("parked"),
            &StateDef::new("idling"),
        )
    }

    fn succeed(log: &mut Log) -> Outcome {
        log.push("action");
        Outcome::Succeeded
    }

    fn fail(log: &mut Log) -> Outcome {
        log.push("action");
        Outcome::ActionFailed
    }

    #[test]
    fn phases_run_in_order() {
        let mut chain: CallbackChain<Log> = CallbackChain::new();
        chain.register_before(CallbackFilter::any(), |log: &mut Log| log.push("before"));
        chain.register_around(
            CallbackFilter::any(),
            around_fn(
                |log: &mut Log, _: &Transition| log.push("around:enter"),
                |log: &mut Log, _: &Transition, _: bool| log.push("around:exit"),
            ),
        );
        chain.register_after(CallbackFilter::any(), |log: &mut Log| log.push("after"));
        chain.register_failure(CallbackFilter::any(), |log: &mut Log| log.push("failure"));

        let mut log = Log::default();
        let transition = ignite();
        let outcome = chain.run(&mut log, &transition, &mut succeed);

        assert!(outcome.is_success());
        assert_eq!(
            log.entries,
            vec!["before", "around:enter", "action", "around:exit", "after"]
        );
    }

    #[test]
    fn halting_before_callback_stops_the_phase() {
        let mut chain: CallbackChain<Log> = CallbackChain::new();
        chain.register_before(CallbackFilter::any(), |log: &mut Log| log.push("first"));
        chain.register_before(CallbackFilter::any(), |log: &mut Log| {
            log.push("second");
            false
        });
        chain.register_before(CallbackFilter::any(), |log: &mut Log| log.push("third"));
        chain.register_around(
            CallbackFilter::any(),
            around_fn(
                |log: &mut Log, _: &Transition| log.push("around"),
                |_: &mut Log, _: &Transition, _: bool| {},
            ),
        );
        chain.register_after(CallbackFilter::any(), |log: &mut Log| log.push("after"));
        chain.register_failure(CallbackFilter::any(), |log: &mut Log| log.push("failure"));

        let mut log = Log::default();
        let transition = ignite();
        let outcome = chain.run(&mut log, &transition, &mut succeed);

        assert!(matches!(outcome, Outcome::Halted));
        assert_eq!(transition.result(), None);
        assert_eq!(log.entries, vec!["first", "second", "failure"]);
    }

    #[test]
    fn around_callbacks_nest_outermost_first() {
        let mut chain: CallbackChain<Log> = CallbackChain::new();
        for name in ["outer", "inner"] {
            chain.register_around(
                CallbackFilter::any(),
                around_fn(
                    move |log: &mut Log, _: &Transition| log.push(&format!("{name}:enter")),
                    move |log: &mut Log, _: &Transition, ok: bool| {
                        log.push(&format!("{name}:exit:{ok}"))
                    },
                ),
            );
        }

        let mut log = Log::default();
        let outcome = chain.run(&mut log, &ignite(), &mut fail);

        assert!(matches!(outcome, Outcome::ActionFailed));
        assert_eq!(
            log.entries,
            vec![
                "outer:enter",
                "inner:enter",
                "action",
                "inner:exit:false",
                "outer:exit:false"
            ]
        );
    }

    #[test]
    fn halting_inner_around_unwinds_outer() {
        let mut chain: CallbackChain<Log> = CallbackChain::new();
        chain.register_around(
            CallbackFilter::any(),
            around_fn(
                |log: &mut Log, _: &Transition| log.push("outer:enter"),
                |log: &mut Log, _: &Transition, ok: bool| log.push(&format!("outer:exit:{ok}")),
            ),
        );
        chain.register_around(
            CallbackFilter::any(),
            around_fn(
                |_: &mut Log, _: &Transition| false,
                |log: &mut Log, _: &Transition, _: bool| log.push("inner:exit"),
            ),
        );
        chain.register_failure(CallbackFilter::any(), |log: &mut Log| log.push("failure"));

        let mut log = Log::default();
        let outcome = chain.run(&mut log, &ignite(), &mut succeed);

        assert!(matches!(outcome, Outcome::Halted));
        assert_eq!(log.entries, vec!["outer:enter", "outer:exit:false", "failure"]);
    }

    #[test]
    fn after_return_values_do_not_matter() {
        let mut chain: CallbackChain<Log> = CallbackChain::new();
        chain.register_after(CallbackFilter::any(), || false);
        chain.register_after(CallbackFilter::any(), |log: &mut Log| log.push("after"));

        let mut log = Log::default();
        let outcome = chain.run(&mut log, &ignite(), &mut succeed);

        assert!(outcome.is_success());
        assert_eq!(log.entries, vec!["action", "after"]);
    }

    #[test]
    fn failure_callbacks_run_when_action_fails() {
        let mut chain: CallbackChain<Log> = CallbackChain::new();
        chain.register_after(CallbackFilter::any(), |log: &mut Log| log.push("after"));
        chain.register_failure(CallbackFilter::any(), |log: &mut Log, t: &Transition| {
            log.push(&format!("failure:{}", t.event()))
        });

        let mut log = Log::default();
        let outcome = chain.run(&mut log, &ignite(), &mut fail);

        assert!(matches!(outcome, Outcome::ActionFailed));
        assert_eq!(log.entries, vec!["action", "failure:ignite"]);
    }

    #[test]
    fn raised_before_callback_aborts() {
        let mut chain: CallbackChain<Log> = CallbackChain::new();
        chain.register_before(CallbackFilter::any(), || -> Result<(), CallbackError> {
            Err(CallbackError::raised("no key"))
        });

        let mut log = Log::default();
        let outcome = chain.run(&mut log, &ignite(), &mut succeed);

        assert!(matches!(outcome, Outcome::Aborted(CallbackError::Raised(_))));
        assert!(log.entries.is_empty());
    }

    #[test]
    fn raised_after_callback_aborts() {
        let mut chain: CallbackChain<Log> = CallbackChain::new();
        chain.register_after(CallbackFilter::any(), || -> Result<(), CallbackError> {
            Err(CallbackError::Rollback)
        });
        chain.register_failure(CallbackFilter::any(), |log: &mut Log| log.push("failure"));

        let mut log = Log::default();
        let outcome = chain.run(&mut log, &ignite(), &mut succeed);

        assert!(matches!(outcome, Outcome::Aborted(CallbackError::Rollback)));
        assert_eq!(log.entries, vec!["action"]);
    }

    #[test]
    fn filters_limit_participation() {
        let mut chain: CallbackChain<Log> = CallbackChain::new();
        chain.register_before(CallbackFilter::any().on("park"), |log: &mut Log| {
            log.push("park only")
        });
        chain.register_before(CallbackFilter::any().from("parked"), |log: &mut Log| {
            log.push("from parked")
        });

        let mut log = Log::default();
        chain.run(&mut log, &ignite(), &mut succeed);

        assert_eq!(log.entries, vec!["from parked", "action"]);
        assert_eq!(chain.filters().count(), 2);
        assert!(!chain.is_empty());
    }
}
