//! Scenario Definition - the declarative schema for training cases.
//!
//! A [`Scenario`] is authored once (built-in catalog or JSON file), validated
//! at load time by [`crate::validation`], and never mutated afterwards. The
//! trainer only ever reads it through an `Arc`.

use crate::vitals::{Consequence, Vital};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Certification level of the trainee, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationLevel {
    /// EMT / Basic Life Support
    Basic,
    /// Advanced EMT
    Advanced,
    /// Paramedic / Advanced Life Support
    Paramedic,
}

impl CertificationLevel {
    /// Returns all levels, lowest first.
    pub fn all() -> [CertificationLevel; 3] {
        [
            CertificationLevel::Basic,
            CertificationLevel::Advanced,
            CertificationLevel::Paramedic,
        ]
    }

    /// Returns the short display name.
    pub fn name(&self) -> &'static str {
        match self {
            CertificationLevel::Basic => "basic",
            CertificationLevel::Advanced => "advanced",
            CertificationLevel::Paramedic => "paramedic",
        }
    }
}

impl std::fmt::Display for CertificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for CertificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" | "emt" | "bls" => Ok(CertificationLevel::Basic),
            "advanced" | "aemt" => Ok(CertificationLevel::Advanced),
            "paramedic" | "medic" | "als" => Ok(CertificationLevel::Paramedic),
            _ => Err(format!("Unknown certification level: {}", s)),
        }
    }
}

/// Difficulty tier, display and filtering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// One selectable option within a decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Button label
    pub label: String,

    /// Whether selecting this choice advances the run
    pub correct: bool,

    /// Text shown after the choice is selected
    pub feedback: String,

    /// Effect on simulated vitals when selected
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub consequence: Consequence,
}

impl Choice {
    /// Creates a correct choice with no consequence.
    pub fn correct(label: &str, feedback: &str) -> Self {
        Self {
            label: label.to_string(),
            correct: true,
            feedback: feedback.to_string(),
            consequence: Consequence::new(),
        }
    }

    /// Creates an incorrect choice with no consequence.
    pub fn wrong(label: &str, feedback: &str) -> Self {
        Self {
            label: label.to_string(),
            correct: false,
            feedback: feedback.to_string(),
            consequence: Consequence::new(),
        }
    }

    /// Adds a vital-sign delta to this choice's consequence.
    pub fn with_effect(mut self, vital: Vital, delta: i32) -> Self {
        *self.consequence.entry(vital).or_insert(0) += delta;
        self
    }
}

/// One step of a scenario requiring the trainee to pick an action.
///
/// Choice order is fixed: the answer key is positional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPoint {
    /// The required action's prompt
    pub prompt: String,

    /// Per-point time limit; falls back to the trainer default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u32>,

    /// Ordered options
    pub choices: Vec<Choice>,

    /// Levels for which this action is outside scope of practice
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub out_of_scope_for: Vec<CertificationLevel>,
}

impl DecisionPoint {
    /// Creates a decision point with the default time limit.
    pub fn new(prompt: &str, choices: Vec<Choice>) -> Self {
        Self {
            prompt: prompt.to_string(),
            time_limit_secs: None,
            choices,
            out_of_scope_for: Vec::new(),
        }
    }

    /// Overrides the time limit.
    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    /// Marks this point as outside scope of practice for a level.
    pub fn out_of_scope(mut self, level: CertificationLevel) -> Self {
        if !self.out_of_scope_for.contains(&level) {
            self.out_of_scope_for.push(level);
        }
        self
    }

    /// Returns the effective time limit in seconds.
    pub fn time_limit(&self, default_secs: u32) -> u32 {
        self.time_limit_secs.unwrap_or(default_secs)
    }

    /// Returns true if the point is within scope of practice for `level`.
    ///
    /// Display-only: out-of-scope points are still played.
    pub fn in_scope_for(&self, level: CertificationLevel) -> bool {
        !self.out_of_scope_for.contains(&level)
    }

    /// Returns the index of the first correct choice, if any.
    pub fn correct_index(&self) -> Option<usize> {
        self.choices.iter().position(|c| c.correct)
    }
}

/// A training case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Catalog key (snake_case slug)
    pub id: String,

    pub title: String,

    /// Level the case is written for
    pub level: CertificationLevel,

    pub difficulty: Difficulty,

    /// Dispatch / chief complaint text
    pub chief_complaint: String,

    /// Vitals on arrival
    pub initial_vitals: BTreeMap<Vital, i32>,

    /// Overall time budget in seconds
    pub time_budget_secs: u32,

    /// Ordered decision points
    pub decision_points: Vec<DecisionPoint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub learning_points: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pitfalls: Vec<String>,
}

impl Scenario {
    /// Returns the number of decision points.
    pub fn len(&self) -> usize {
        self.decision_points.len()
    }

    /// Returns true if the scenario has no decision points.
    pub fn is_empty(&self) -> bool {
        self.decision_points.is_empty()
    }

    /// Returns the decision point at `index`.
    pub fn point(&self, index: usize) -> Option<&DecisionPoint> {
        self.decision_points.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_limit_falls_back_to_default() {
        let point = DecisionPoint::new("Check scene safety", vec![Choice::correct("Yes", "")]);
        assert_eq!(point.time_limit(60), 60);
        assert_eq!(point.with_time_limit(20).time_limit(60), 20);
    }

    #[test]
    fn test_scope_flags() {
        let point = DecisionPoint::new("Intubate", vec![Choice::correct("Proceed", "")])
            .out_of_scope(CertificationLevel::Basic)
            .out_of_scope(CertificationLevel::Basic);

        assert_eq!(point.out_of_scope_for.len(), 1);
        assert!(!point.in_scope_for(CertificationLevel::Basic));
        assert!(point.in_scope_for(CertificationLevel::Paramedic));
    }

    #[test]
    fn test_choice_effects_accumulate() {
        let choice = Choice::wrong("Delay", "")
            .with_effect(Vital::SpO2, -2)
            .with_effect(Vital::SpO2, -3)
            .with_effect(Vital::HeartRate, 10);

        assert_eq!(choice.consequence[&Vital::SpO2], -5);
        assert_eq!(choice.consequence[&Vital::HeartRate], 10);
    }

    #[test]
    fn test_level_parsing_and_order() {
        assert_eq!("EMT".parse::<CertificationLevel>().unwrap(), CertificationLevel::Basic);
        assert_eq!("als".parse::<CertificationLevel>().unwrap(), CertificationLevel::Paramedic);
        assert!("surgeon".parse::<CertificationLevel>().is_err());
        assert!(CertificationLevel::Basic < CertificationLevel::Paramedic);
    }

    #[test]
    fn test_scenario_json_shape() {
        let json = r#"{
            "id": "demo",
            "title": "Demo",
            "level": "basic",
            "difficulty": "beginner",
            "chief_complaint": "Fall",
            "initial_vitals": { "spo2": 94, "heart_rate": 100 },
            "time_budget_secs": 120,
            "decision_points": [
                { "prompt": "First?", "choices": [
                    { "label": "Scene safety", "correct": true, "feedback": "Good" },
                    { "label": "Run in", "correct": false, "feedback": "Unsafe",
                      "consequence": { "spo2": -1 } }
                ] }
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.len(), 1);
        assert_eq!(scenario.initial_vitals[&Vital::SpO2], 94);
        assert_eq!(scenario.decision_points[0].choices[1].consequence[&Vital::SpO2], -1);
        assert_eq!(scenario.decision_points[0].correct_index(), Some(0));
    }
}
