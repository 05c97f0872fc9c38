//! Core state machine definitions.
//!
//! This module contains the pure, read-only part of a machine:
//! - State definitions and their stored values
//! - Events with ordered, optionally guarded transition rules
//! - The registry that owns both and answers lookups
//! - Transition descriptors handed to callbacks
//!
//! Nothing here touches a subject's attribute or a datastore.

mod event;
mod guard;
mod matcher;
mod registry;
mod state;
mod transition;

pub use event::{EventDef, Target, TransitionRule};
pub use guard::Guard;
pub use matcher::Matcher;
pub use registry::{Registry, RegistryError};
pub use state::{StateDef, StateValue};
pub use transition::Transition;

pub(crate) use state::display_name;
