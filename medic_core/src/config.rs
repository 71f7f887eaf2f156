//! Trainer configuration.
//!
//! Every constant of the drill rules lives here so that a training
//! coordinator can tune them from a JSON file without touching the engine.

use crate::error::ConfigError;
use crate::vitals::{Consequence, Vital};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rules applied by the [`crate::trainer::Trainer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Decision clock for points without an override (default: 60)
    pub default_time_limit_secs: u32,

    /// Lockout after a deliberate wrong choice (default: 5)
    pub wrong_choice_lockout_secs: u32,

    /// Lockout after the decision clock runs out (default: 15)
    pub timeout_lockout_secs: u32,

    /// Seconds added to the penalty total per wrong choice (default: 5)
    pub wrong_choice_penalty_secs: u32,

    /// Vitals penalty applied on timeout, since no choice was selected
    pub timeout_vital_penalty: Consequence,

    /// Highest error count that can still pass (default: 2)
    pub pass_max_errors: u32,

    /// Seconds allowed over the scenario budget (default: 60)
    pub pass_time_grace_secs: u32,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            default_time_limit_secs: 60,
            wrong_choice_lockout_secs: 5,
            timeout_lockout_secs: 15,
            wrong_choice_penalty_secs: 5,
            timeout_vital_penalty: Consequence::from([(Vital::SpO2, -2)]),
            pass_max_errors: 2,
            pass_time_grace_secs: 60,
        }
    }
}

impl TrainerConfig {
    /// Reads a config from a JSON file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TrainerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would stall a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_time_limit_secs == 0 {
            return Err(ConfigError::Invalid("default_time_limit_secs must be > 0".into()));
        }
        if self.wrong_choice_lockout_secs == 0 || self.timeout_lockout_secs == 0 {
            return Err(ConfigError::Invalid("lockout durations must be > 0".into()));
        }
        Ok(())
    }
}
