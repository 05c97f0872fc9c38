//! Statebound: state machines bound to persisted attributes
//!
//! A machine governs one attribute of a persisted subject. Firing an event
//! looks up a rule from the subject's current state, runs ordered callbacks
//! around the write, saves the subject, and commits or rolls back the
//! surrounding transaction as one unit.
//!
//! # Core Concepts
//!
//! - **Registry**: named states (with stored values) and events with rules
//! - **Transition**: descriptor of one proposed change, handed to callbacks
//! - **Callbacks**: before / around / after / failure hooks with halt and
//!   rollback semantics
//! - **Record**: the subject seam (attribute access, save, transactions,
//!   validation errors)
//!
//! # Example
//!
//! ```rust
//! use statebound::builder::MachineBuilder;
//! use statebound::callbacks::CallbackFilter;
//! use statebound::persistence::{MemoryRecord, MemoryStore};
//!
//! let machine = MachineBuilder::<MemoryRecord>::new("state")
//!     .model("vehicle")
//!     .initial("parked")
//!     .states(["parked", "idling"])
//!     .event("ignite", |e| e.transition("parked", "idling"))
//!     .before(CallbackFilter::any().on("ignite"), |v: &mut MemoryRecord| {
//!         v.get("fuel").is_some()
//!     })
//!     .build()
//!     .unwrap();
//!
//! let store = MemoryStore::shared();
//! let mut vehicle = MemoryRecord::new("vehicles/1", store.clone());
//! machine.initialize_state(&mut vehicle);
//!
//! // Halted by the before callback: nothing changes.
//! assert!(!machine.fire(&mut vehicle, "ignite").unwrap());
//! assert_eq!(machine.state_name(&vehicle).unwrap(), Some("parked"));
//! assert_eq!(machine.errors_for(&vehicle), "Transition halted");
//!
//! vehicle.set("fuel", 40);
//! assert!(machine.fire(&mut vehicle, "ignite").unwrap());
//! assert_eq!(store.get("vehicles/1").unwrap()["state"], "idling");
//! ```

pub mod builder;
pub mod callbacks;
pub mod core;
pub mod i18n;
pub mod machine;
pub mod naming;
pub mod persistence;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder};
pub use callbacks::{CallbackError, CallbackFilter, Flow};
pub use core::{Guard, Matcher, StateDef, Target, Transition};
pub use machine::{Machine, MachineError, MachineOptions};
pub use persistence::Record;
