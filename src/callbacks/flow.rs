//! Callback results, the rollback signal and arity adapters.
//!
//! Every callback is stored in one canonical shape,
//! `Fn(&mut T, &Transition) -> Result<Flow, CallbackError>`. User functions
//! taking zero, one or two arguments and returning `()`, `bool`, `Flow` or a
//! `Result` of those are wrapped into that shape when registered.

use crate::core::Transition;
use std::error::Error as StdError;
use thiserror::Error;

/// Whether the pipeline keeps going after a callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// Raised by a callback or the persistence action to abort a transition.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// Explicit request to abort and roll back the surrounding transaction.
    #[error("Transaction rollback requested")]
    Rollback,

    /// Any other failure; rolls back and is re-raised by the strict fire
    /// variant.
    #[error("Callback raised: {0}")]
    Raised(#[source] Box<dyn StdError + Send + Sync>),
}

impl CallbackError {
    pub fn raised<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Raised(error.into())
    }

    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::Rollback)
    }
}

/// Canonical callback shape the pipeline invokes.
pub type CallbackFn<T> =
    Box<dyn Fn(&mut T, &Transition) -> Result<Flow, CallbackError> + Send + Sync>;

/// Conversion of a callback's return value into a pipeline decision.
///
/// Only an explicit `false` (or `Flow::Halt`) halts; `()` continues.
pub trait IntoFlow {
    fn into_flow(self) -> Result<Flow, CallbackError>;
}

impl IntoFlow for () {
    fn into_flow(self) -> Result<Flow, CallbackError> {
        Ok(Flow::Continue)
    }
}

impl IntoFlow for bool {
    fn into_flow(self) -> Result<Flow, CallbackError> {
        Ok(if self { Flow::Continue } else { Flow::Halt })
    }
}

impl IntoFlow for Flow {
    fn into_flow(self) -> Result<Flow, CallbackError> {
        Ok(self)
    }
}

impl<R: IntoFlow> IntoFlow for Result<R, CallbackError> {
    fn into_flow(self) -> Result<Flow, CallbackError> {
        self.and_then(IntoFlow::into_flow)
    }
}

/// Adapter from a user function to the canonical callback shape.
///
/// `Args` is a marker (`fn() -> R`, `fn(&mut T) -> R` or
/// `fn(&mut T, &Transition) -> R`) that lets one registration method accept
/// all three calling conventions.
pub trait IntoCallback<T, Args> {
    fn into_callback(self) -> CallbackFn<T>;
}

impl<T, F, R> IntoCallback<T, fn() -> R> for F
where
    T: 'static,
    F: Fn() -> R + Send + Sync + 'static,
    R: IntoFlow + 'static,
{
    fn into_callback(self) -> CallbackFn<T> {
        Box::new(move |_subject: &mut T, _transition: &Transition| self().into_flow())
    }
}

impl<T, F, R> IntoCallback<T, fn(&mut T) -> R> for F
where
    T: 'static,
    F: Fn(&mut T) -> R + Send + Sync + 'static,
    R: IntoFlow + 'static,
{
    fn into_callback(self) -> CallbackFn<T> {
        Box::new(move |subject: &mut T, _transition: &Transition| self(subject).into_flow())
    }
}

impl<T, F, R> IntoCallback<T, fn(&mut T, &Transition) -> R> for F
where
    T: 'static,
    F: Fn(&mut T, &Transition) -> R + Send + Sync + 'static,
    R: IntoFlow + 'static,
{
    fn into_callback(self) -> CallbackFn<T> {
        Box::new(move |subject: &mut T, transition: &Transition| {
            self(subject, transition).into_flow()
        })
    }
}
