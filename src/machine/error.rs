//! Errors that cross a machine's public operations.

use crate::persistence::TransactionError;
use std::error::Error as StdError;
use thiserror::Error;

/// Errors returned by machine operations.
///
/// An event with no transition from the current state is not an error: it
/// is recorded on the subject and reported as `false`. Only the strict
/// variant turns it into [`MachineError::TransitionFailed`].
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Event '{event}' is not defined for {attribute}")]
    UnknownEvent { attribute: String, event: String },

    #[error("State {state} is not defined for {attribute}")]
    UnknownState { attribute: String, state: String },

    #[error("Undefined method '{method}'")]
    UnknownMethod { method: String },

    #[error("A transition on {attribute} is already in progress for this subject")]
    TransitionInProgress { attribute: String },

    #[error(
        "Cannot transition {attribute} via :{event} from :{from} (Reason(s): {})",
        .reasons.join(", ")
    )]
    TransitionFailed {
        attribute: String,
        event: String,
        from: String,
        reasons: Vec<String>,
        #[source]
        cause: Option<Box<dyn StdError + Send + Sync>>,
    },

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_failed_lists_reasons() {
        let error = MachineError::TransitionFailed {
            attribute: "state".into(),
            event: "ignite".into(),
            from: "idling".into(),
            reasons: vec!["State cannot transition via \"ignite\"".into()],
            cause: None,
        };

        assert_eq!(
            error.to_string(),
            "Cannot transition state via :ignite from :idling (Reason(s): State cannot transition via \"ignite\")"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn transition_failed_exposes_cause() {
        let error = MachineError::TransitionFailed {
            attribute: "state".into(),
            event: "ignite".into(),
            from: "parked".into(),
            reasons: vec!["Transition halted".into()],
            cause: Some("battery dead".into()),
        };

        assert_eq!(error.source().map(|e| e.to_string()).as_deref(), Some("battery dead"));
    }

    #[test]
    fn transaction_errors_convert() {
        let error: MachineError = TransactionError::NotOpen.into();
        assert_eq!(error.to_string(), "No transaction is open");
    }
}
