//! Machine configuration.

use serde::{Deserialize, Serialize};

/// Options for one machine. Missing fields take their defaults when
/// deserialized.
///
/// # Example
///
/// ```rust
/// use statebound::machine::MachineOptions;
///
/// let options = MachineOptions::from_json(
///     r#"{"model": "vehicle", "initial": "parked", "use_transactions": false}"#,
/// )
/// .unwrap();
///
/// assert_eq!(options.attribute, "state");
/// assert_eq!(options.initial.as_deref(), Some("parked"));
/// assert!(!options.use_transactions);
/// assert!(options.run_action);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineOptions {
    /// Attribute holding the state value.
    pub attribute: String,
    /// Model name used in translation keys.
    pub model: String,
    pub namespace: Option<String>,
    /// Name of the initial state.
    pub initial: Option<String>,
    /// Wrap each transition in a transaction on the subject.
    pub use_transactions: bool,
    /// Save the subject as the transition's action.
    pub run_action: bool,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            attribute: "state".to_string(),
            model: "record".to_string(),
            namespace: None,
            initial: None,
            use_transactions: true,
            run_action: true,
        }
    }
}

impl MachineOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
