//! Validation Module - Load-Time Checks for Scenario Catalogs
//! ==========================================================
//!
//! Malformed content must fail fast when the catalog is loaded, never as a
//! run that can not be finished. Checked per scenario:
//! - non-empty id
//! - at least one decision point
//! - every decision point has choices, and at least one correct choice
//! - non-zero time budget and time-limit overrides
//!
//! Usage:
//! ```ignore
//! use medic_core::validation::ScenarioCatalog;
//!
//! let catalog = ScenarioCatalog::from_path("scenarios.json")?;
//! let scenario = catalog.get("chest_pain").unwrap();
//! ```

use crate::error::ScenarioError;
use crate::model::{CertificationLevel, Scenario};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// SINGLE SCENARIO
// =============================================================================

/// Checks one scenario for structural problems.
pub fn validate_scenario(scenario: &Scenario) -> Result<(), ScenarioError> {
    if scenario.id.trim().is_empty() {
        return Err(ScenarioError::EmptyId);
    }

    if scenario.decision_points.is_empty() {
        return Err(ScenarioError::NoDecisionPoints(scenario.id.clone()));
    }

    if scenario.time_budget_secs == 0 {
        return Err(ScenarioError::ZeroTimeBudget(scenario.id.clone()));
    }

    for (index, point) in scenario.decision_points.iter().enumerate() {
        if point.choices.is_empty() {
            return Err(ScenarioError::NoChoices {
                scenario: scenario.id.clone(),
                index,
            });
        }

        if point.correct_index().is_none() {
            return Err(ScenarioError::NoCorrectChoice {
                scenario: scenario.id.clone(),
                index,
            });
        }

        if point.time_limit_secs == Some(0) {
            return Err(ScenarioError::ZeroTimeLimit {
                scenario: scenario.id.clone(),
                index,
            });
        }
    }

    Ok(())
}

// =============================================================================
// CATALOG
// =============================================================================

/// A validated, immutable set of scenarios.
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: Vec<Arc<Scenario>>,
}

impl ScenarioCatalog {
    /// Validates and wraps a list of scenarios.
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, ScenarioError> {
        let mut seen = HashSet::new();
        for scenario in &scenarios {
            validate_scenario(scenario)?;
            if !seen.insert(scenario.id.clone()) {
                return Err(ScenarioError::DuplicateId(scenario.id.clone()));
            }
        }

        Ok(Self {
            scenarios: scenarios.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parses a JSON array of scenarios.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenarios: Vec<Scenario> =
            serde_json::from_str(json).map_err(|e| ScenarioError::Parse(e.to_string()))?;
        Self::new(scenarios)
    }

    /// Reads and parses a JSON catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ScenarioError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&json)
    }

    /// Looks up a scenario by id.
    pub fn get(&self, id: &str) -> Option<Arc<Scenario>> {
        self.scenarios.iter().find(|s| s.id == id).cloned()
    }

    /// Returns scenarios written for `level` or below.
    pub fn for_level(&self, level: CertificationLevel) -> Vec<Arc<Scenario>> {
        self.scenarios
            .iter()
            .filter(|s| s.level <= level)
            .cloned()
            .collect()
    }

    /// Iterates over all scenarios.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scenario>> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
