//! Transition callbacks.
//!
//! Callbacks hook into a transition at four points: before the action,
//! around it, after it succeeds, and after it fails. Each registration
//! carries a [`CallbackFilter`] restricting which transitions it sees.
//!
//! # Halting
//!
//! A before or around callback halts the transition by returning `false`
//! (or [`Flow::Halt`]). Returning `()` never halts. Returning
//! `Err(CallbackError::Rollback)` aborts and rolls back the surrounding
//! transaction; any other `CallbackError` does the same and is reported to
//! strict callers.

mod around;
mod chain;
mod filter;
mod flow;

pub use around::{around_fn, Around, AroundFn, Entry};
pub use chain::{CallbackChain, Outcome};
pub use filter::CallbackFilter;
pub use flow::{CallbackError, CallbackFn, Flow, IntoCallback, IntoFlow};
