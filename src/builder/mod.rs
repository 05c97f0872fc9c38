//! Builder API for defining machines.
//!
//! [`MachineBuilder`] collects states, events, callbacks and options, then
//! checks the whole definition at once. Problems such as rules naming
//! undefined states, filters naming undefined events, duplicate stored
//! values or clashing method names are accumulated rather than reported one
//! at a time.

pub mod error;
pub mod event;
pub mod machine;

pub use error::{BuildError, DefinitionError};
pub use event::EventBuilder;
pub use machine::MachineBuilder;
