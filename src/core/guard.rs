//! Guard predicates for conditional transition rules.
//!
//! Guards are pure boolean functions over the subject. A rule whose guard
//! rejects the subject is skipped as if it did not exist.

use std::fmt;
use std::sync::Arc;

/// Pure predicate that decides whether a transition rule applies.
///
/// Guards are evaluated while looking up a transition, before any callback
/// runs, so they must not mutate the subject.
///
/// # Example
///
/// ```rust
/// use statebound::core::Guard;
///
/// struct Vehicle {
///     seatbelt_on: bool,
/// }
///
/// let buckled = Guard::named("seatbelt on", |v: &Vehicle| v.seatbelt_on);
///
/// assert!(buckled.check(&Vehicle { seatbelt_on: true }));
/// assert!(!buckled.check(&Vehicle { seatbelt_on: false }));
/// assert_eq!(buckled.description(), Some("seatbelt on"));
/// ```
pub struct Guard<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
    description: Option<String>,
}

impl<T> Guard<T> {
    /// Create a guard from a pure predicate function.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
            description: None,
        }
    }

    /// Create a guard with a description used in logs.
    pub fn named<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
            description: Some(description.into()),
        }
    }

    /// Check if the guard allows the rule for this subject.
    pub fn check(&self, subject: &T) -> bool {
        (self.predicate)(subject)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl<T> Clone for Guard<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            description: self.description.clone(),
        }
    }
}

impl<T> fmt::Debug for Guard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
