//! Error types for the drill engine.

use thiserror::Error;

/// Malformed scenario data, detected at load time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("Scenario has an empty id")]
    EmptyId,

    #[error("Scenario '{0}' has no decision points")]
    NoDecisionPoints(String),

    #[error("Scenario '{scenario}' decision point {index} has no choices")]
    NoChoices { scenario: String, index: usize },

    #[error("Scenario '{scenario}' decision point {index} has no correct choice")]
    NoCorrectChoice { scenario: String, index: usize },

    #[error("Scenario '{0}' has a zero time budget")]
    ZeroTimeBudget(String),

    #[error("Scenario '{scenario}' decision point {index} has a zero time limit")]
    ZeroTimeLimit { scenario: String, index: usize },

    #[error("Duplicate scenario id '{0}'")]
    DuplicateId(String),

    #[error("Failed to parse scenario catalog: {0}")]
    Parse(String),

    #[error("Failed to read scenario catalog: {0}")]
    Io(String),
}

/// Rejected run transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    /// Choices are not accepted during a lockout
    #[error("Run is locked for another {0}s")]
    Locked(u32),

    /// The run already has a result
    #[error("Run is already completed")]
    Completed,

    /// The index does not name a choice of the current decision point
    #[error("Choice {index} out of range (decision point has {available} choices)")]
    ChoiceOutOfRange { index: usize, available: usize },

    /// A result was requested before the run completed
    #[error("Run is not completed")]
    NotCompleted,
}

/// Errors from reference lookups and bedside calculators.
#[derive(Debug, Error, PartialEq)]
pub enum ReferenceError {
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown drug: {0}")]
    UnknownDrug(String),
}

impl ReferenceError {
    pub(crate) fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange { field, value, min, max }
    }
}

/// Trainer configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
