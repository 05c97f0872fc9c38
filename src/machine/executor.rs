//! Transition execution.
//!
//! `perform` walks one event through:
//!
//! 1. lookup of the subject's current state and a rule for the event; with
//!    no match the subject is invalidated and `false` returned
//! 2. a transactional boundary (unless disabled) around the callback
//!    pipeline, whose innermost step writes the destination value and saves
//! 3. commit on success; on failure, rollback and restore of the source
//!    value

use super::error::MachineError;
use super::transaction::with_transaction;
use super::Machine;
use crate::callbacks::{CallbackError, Outcome};
use crate::core::{display_name, Transition};
use crate::i18n::{interpolate, lookup, INVALID, INVALID_EVENT, INVALID_TRANSITION};
use crate::persistence::Record;

/// Result of one attempt that did not fail fast.
#[derive(Debug)]
pub(crate) enum Attempt {
    /// No valid transition; the subject was invalidated.
    Invalid,
    /// The pipeline ran to this outcome.
    Finished(Outcome),
}

impl<T: Record> Machine<T> {
    /// Fire `event` on `subject`.
    ///
    /// Returns `Ok(false)` for every normal failure: no transition from the
    /// current state, a halting callback, a failed or raising action, or a
    /// rollback. `Err` is reserved for undefined events, reentrant calls and
    /// transaction provider failures.
    ///
    /// On failure the attribute is restored to the source state. The one
    /// exception is an after callback failing with transactions disabled:
    /// the action has already run and nothing can undo it, so the subject
    /// keeps the destination state while `false` is still returned.
    pub fn perform(
        &self,
        subject: &mut T,
        event: &str,
        run_action: bool,
    ) -> Result<bool, MachineError> {
        match self.attempt(subject, event, run_action)? {
            Attempt::Finished(Outcome::Succeeded) => Ok(true),
            Attempt::Finished(Outcome::Aborted(CallbackError::Raised(error))) => {
                tracing::warn!(
                    attribute = %self.attribute(),
                    event,
                    %error,
                    "transition raised; reporting failure"
                );
                Ok(false)
            }
            Attempt::Finished(_) | Attempt::Invalid => Ok(false),
        }
    }

    /// [`perform`](Self::perform) using the machine's `run_action` option.
    pub fn fire(&self, subject: &mut T, event: &str) -> Result<bool, MachineError> {
        self.perform(subject, event, self.options.run_action)
    }

    /// Like [`fire`](Self::fire), but any failure becomes
    /// [`MachineError::TransitionFailed`] carrying the subject's validation
    /// errors and the raised cause, if any.
    pub fn fire_strict(&self, subject: &mut T, event: &str) -> Result<(), MachineError> {
        let from = self.describe_current(subject);
        let cause = match self.attempt(subject, event, self.options.run_action)? {
            Attempt::Finished(Outcome::Succeeded) => return Ok(()),
            Attempt::Finished(Outcome::Aborted(CallbackError::Raised(error))) => Some(error),
            Attempt::Finished(_) | Attempt::Invalid => None,
        };

        Err(MachineError::TransitionFailed {
            attribute: self.attribute().to_string(),
            event: event.to_string(),
            from,
            reasons: self.reasons(subject),
            cause,
        })
    }

    pub(crate) fn attempt(
        &self,
        subject: &mut T,
        event_name: &str,
        run_action: bool,
    ) -> Result<Attempt, MachineError> {
        let attribute = self.attribute();
        let event = self.event_def(event_name)?;
        let _flight = self.in_flight.enter(&*subject).ok_or_else(|| {
            MachineError::TransitionInProgress {
                attribute: attribute.to_string(),
            }
        })?;

        let span = tracing::debug_span!("perform", attribute, event = event_name);
        let _entered = span.enter();

        let value = subject.read_attribute(attribute);
        let Ok(from) = self.registry.state_by_value(&value) else {
            tracing::debug!(%value, "stored value matches no state");
            self.invalidate(subject, "invalid", &[]);
            return Ok(Attempt::Invalid);
        };

        let Some(to_name) = event.destination(from.name(), subject) else {
            tracing::debug!(from = display_name(from.name()), "no transition from current state");
            let event_label = self.translate_event(event);
            self.invalidate(subject, "invalid_transition", &[("event", &event_label)]);
            return Ok(Attempt::Invalid);
        };

        let to = self
            .registry
            .state_by_name(to_name)
            .map_err(|_| MachineError::UnknownState {
                attribute: attribute.to_string(),
                state: display_name(to_name).to_string(),
            })?;

        let transition = Transition::new(attribute, event_name, from, to);
        tracing::debug!(transition = %transition.describe(), "running transition");

        let result = with_transaction(subject, self.options.use_transactions, |subject| {
            self.callbacks.run(subject, &transition, &mut |subject: &mut T| {
                self.apply(subject, &transition, run_action)
            })
        });

        match result {
            Ok(outcome) if outcome.is_success() => {
                tracing::info!(
                    transition = %transition.describe(),
                    id = %transition.id(),
                    "transition committed"
                );
                Ok(Attempt::Finished(outcome))
            }
            Ok(outcome) => {
                if !self.options.use_transactions && transition.result() == Some(true) {
                    tracing::warn!(
                        transition = %transition.describe(),
                        outcome = outcome.label(),
                        "action ran without a transaction; keeping the destination state"
                    );
                } else {
                    self.restore(subject, &transition);
                    tracing::debug!(outcome = outcome.label(), "transition failed");
                }
                Ok(Attempt::Finished(outcome))
            }
            Err(error) => {
                self.restore(subject, &transition);
                Err(error.into())
            }
        }
    }

    fn restore(&self, subject: &mut T, transition: &Transition) {
        let attribute = self.attribute();
        subject.write_attribute(attribute, transition.from_value().clone());
        subject.attribute_restored(attribute);
    }

    /// The core action: write the destination value, then save.
    fn apply(&self, subject: &mut T, transition: &Transition, run_action: bool) -> Outcome {
        let attribute = self.attribute();
        if !transition.is_loopback() {
            subject.attribute_will_change(attribute);
        }
        subject.write_attribute(attribute, transition.to_value().clone());

        let outcome = match run_action.then(|| subject.save()) {
            None | Some(Ok(true)) => Outcome::Succeeded,
            Some(Ok(false)) => Outcome::ActionFailed,
            Some(Err(error)) => Outcome::Aborted(error),
        };
        transition.set_result(outcome.is_success());
        outcome
    }

    /// Record a validation error on the subject's attribute.
    ///
    /// `code` is one of `invalid`, `invalid_event` or `invalid_transition`
    /// (or a custom code the resolver knows); `args` fill `%{name}`
    /// placeholders.
    pub fn invalidate(&self, subject: &mut T, code: &str, args: &[(&str, &str)]) {
        let template = lookup(self.messages.as_ref(), &self.keys().error_keys(code))
            .unwrap_or_else(|| default_message(code).to_string());
        let message = interpolate(&template, args);
        tracing::debug!(attribute = %self.attribute(), code, %message, "invalidating subject");
        subject.errors_mut().add(self.attribute(), message);
    }

    /// The subject's validation errors as one message, or
    /// `"Transition halted"` when none are recorded.
    pub fn errors_for(&self, subject: &T) -> String {
        self.reasons(subject).join(", ")
    }

    fn reasons(&self, subject: &T) -> Vec<String> {
        let errors = subject.errors();
        if errors.is_empty() {
            vec!["Transition halted".to_string()]
        } else {
            errors.full_messages()
        }
    }

    /// Check that the stored value matches a state, invalidating the
    /// subject with `invalid` if it does not.
    pub fn validate(&self, subject: &mut T) -> bool {
        let value = subject.read_attribute(self.attribute());
        if self.registry.state_by_value(&value).is_ok() {
            return true;
        }
        self.invalidate(subject, "invalid", &[]);
        false
    }

    /// Check that a pending `event` can fire from the current state,
    /// invalidating the subject with `invalid_event` if it cannot.
    pub fn validate_event(&self, subject: &mut T, event: &str) -> Result<bool, MachineError> {
        if self.can_fire(subject, event)? {
            return Ok(true);
        }
        let state = self.describe_current_human(subject);
        self.invalidate(subject, "invalid_event", &[("state", &state)]);
        Ok(false)
    }

    fn describe_current(&self, subject: &T) -> String {
        let value = subject.read_attribute(self.attribute());
        match self.registry.state_by_value(&value) {
            Ok(state) => display_name(state.name()).to_string(),
            Err(_) => value.to_string(),
        }
    }

    fn describe_current_human(&self, subject: &T) -> String {
        let value = subject.read_attribute(self.attribute());
        match self.registry.state_by_value(&value) {
            Ok(state) => self.translate_state(state),
            Err(_) => value.to_string(),
        }
    }
}

fn default_message(code: &str) -> &str {
    match code {
        "invalid" => INVALID,
        "invalid_event" => INVALID_EVENT,
        "invalid_transition" => INVALID_TRANSITION,
        other => other,
    }
}
