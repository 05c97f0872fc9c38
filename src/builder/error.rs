//! Build errors for machine definitions.

use crate::core::StateValue;
use thiserror::Error;

/// Errors that stop a machine from being built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("State attribute not specified. Pass a non-empty name to MachineBuilder::new")]
    EmptyAttribute,

    #[error("Event name is empty. Every call to .event(name, ..) needs a name")]
    EmptyEventName,

    #[error("Invalid machine definition: {}", describe(.0))]
    Invalid(Vec<DefinitionError>),
}

impl BuildError {
    /// Definition problems, empty for the fail-fast variants.
    pub fn problems(&self) -> &[DefinitionError] {
        match self {
            Self::Invalid(problems) => problems,
            _ => &[],
        }
    }
}

fn describe(problems: &[DefinitionError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One inconsistency in a machine definition. All of them are collected
/// before the build fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    #[error("Event '{event}' references undefined state {state}")]
    UndefinedStateInRule { event: String, state: String },

    #[error("Initial state {state} is not defined")]
    UndefinedInitialState { state: String },

    #[error("Callback filter references undefined state {state}")]
    UndefinedStateInFilter { state: String },

    #[error("Callback filter references undefined event '{event}'")]
    UndefinedEventInFilter { event: String },

    #[error("States {first} and {second} are both stored as {value}")]
    DuplicateValue {
        first: String,
        second: String,
        value: StateValue,
    },

    #[error("Generated method '{name}' conflicts with another method")]
    MethodConflict { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invalid_lists_every_problem() {
        let error = BuildError::Invalid(vec![
            DefinitionError::UndefinedInitialState {
                state: "parked".into(),
            },
            DefinitionError::DuplicateValue {
                first: "parked".into(),
                second: "idling".into(),
                value: json!(0),
            },
        ]);

        assert_eq!(
            error.to_string(),
            "Invalid machine definition: Initial state parked is not defined; \
             States parked and idling are both stored as 0"
        );
        assert_eq!(error.problems().len(), 2);
        assert!(BuildError::EmptyAttribute.problems().is_empty());
    }
}
