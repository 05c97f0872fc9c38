//! Around callbacks as explicit two-phase hooks.
//!
//! An around callback has an `enter` half that runs before everything it
//! wraps and an `exit` half that runs afterwards. `enter` hands a token to
//! `exit`, which always runs once `enter` proceeded, whether or not the
//! wrapped work succeeded.

use super::chain::Outcome;
use super::flow::{CallbackError, Flow, IntoFlow};
use crate::core::Transition;

/// Result of an around callback's `enter` half.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry<K> {
    /// Continue into the wrapped work; `K` is passed back to `exit`.
    Proceed(K),
    /// Stop: nothing inside this callback runs.
    Halt,
}

/// A callback wrapping the rest of the pipeline and the core action.
///
/// # Example
///
/// ```rust
/// use statebound::callbacks::{Around, CallbackError, Entry};
/// use statebound::core::Transition;
/// use std::time::Instant;
///
/// struct Timed;
///
/// impl<T> Around<T> for Timed {
///     type Token = Instant;
///
///     fn enter(&self, _: &mut T, _: &Transition) -> Result<Entry<Instant>, CallbackError> {
///         Ok(Entry::Proceed(Instant::now()))
///     }
///
///     fn exit(&self, _: &mut T, transition: &Transition, started: Instant, succeeded: bool) {
///         println!("{} took {:?} (ok: {succeeded})", transition.event(), started.elapsed());
///     }
/// }
/// ```
pub trait Around<T>: Send + Sync {
    type Token;

    fn enter(
        &self,
        subject: &mut T,
        transition: &Transition,
    ) -> Result<Entry<Self::Token>, CallbackError>;

    fn exit(&self, subject: &mut T, transition: &Transition, token: Self::Token, succeeded: bool);
}

/// Around callback built from a pair of closures.
pub struct AroundFn<E, X> {
    enter: E,
    exit: X,
}

/// Build an around callback from an `enter` closure (any `IntoFlow` result)
/// and an `exit` closure receiving whether the wrapped work succeeded.
pub fn around_fn<T, E, X, R>(enter: E, exit: X) -> AroundFn<E, X>
where
    E: Fn(&mut T, &Transition) -> R + Send + Sync,
    X: Fn(&mut T, &Transition, bool) + Send + Sync,
    R: IntoFlow,
{
    AroundFn { enter, exit }
}

impl<T, E, X, R> Around<T> for AroundFn<E, X>
where
    E: Fn(&mut T, &Transition) -> R + Send + Sync,
    X: Fn(&mut T, &Transition, bool) + Send + Sync,
    R: IntoFlow,
{
    type Token = ();

    fn enter(&self, subject: &mut T, transition: &Transition) -> Result<Entry<()>, CallbackError> {
        match (self.enter)(subject, transition).into_flow()? {
            Flow::Continue => Ok(Entry::Proceed(())),
            Flow::Halt => Ok(Entry::Halt),
        }
    }

    fn exit(&self, subject: &mut T, transition: &Transition, _token: (), succeeded: bool) {
        (self.exit)(subject, transition, succeeded)
    }
}

/// Object-safe view of an around callback: run `inner` between the halves.
pub(crate) trait Wrap<T>: Send + Sync {
    fn wrap(
        &self,
        subject: &mut T,
        transition: &Transition,
        inner: &mut dyn FnMut(&mut T) -> Outcome,
    ) -> Outcome;
}

impl<T, A: Around<T>> Wrap<T> for A {
    fn wrap(
        &self,
        subject: &mut T,
        transition: &Transition,
        inner: &mut dyn FnMut(&mut T) -> Outcome,
    ) -> Outcome {
        let token = match self.enter(subject, transition) {
            Ok(Entry::Proceed(token)) => token,
            Ok(Entry::Halt) => return Outcome::Halted,
            Err(error) => return Outcome::Aborted(error),
        };

        let outcome = inner(subject);
        self.exit(subject, transition, token, outcome.is_success());
        outcome
    }
}
