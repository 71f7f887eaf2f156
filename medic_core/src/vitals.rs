//! Patient Condition Tracker
//!
//! A small key→value state updated by fixed deltas. Every write is clamped to
//! a plausible physiological range, so no sequence of consequences can push
//! the simulated patient outside of what a monitor would display.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A simulated vital sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Vital {
    #[serde(rename = "heart_rate")]
    HeartRate,
    #[serde(rename = "spo2")]
    SpO2,
    #[serde(rename = "respiratory_rate")]
    RespiratoryRate,
    #[serde(rename = "systolic_bp")]
    SystolicBp,
    #[serde(rename = "diastolic_bp")]
    DiastolicBp,
    #[serde(rename = "gcs")]
    Gcs,
    #[serde(rename = "blood_glucose")]
    BloodGlucose,
}

impl Vital {
    /// Returns the inclusive clamp range for this vital.
    pub fn range(&self) -> (i32, i32) {
        match self {
            Vital::HeartRate => (20, 220),
            Vital::SpO2 => (70, 100),
            Vital::RespiratoryRate => (0, 60),
            Vital::SystolicBp => (50, 250),
            Vital::DiastolicBp => (30, 150),
            Vital::Gcs => (3, 15),
            Vital::BloodGlucose => (20, 600),
        }
    }

    /// Clamps a raw value into this vital's range.
    pub fn clamp(&self, value: i32) -> i32 {
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }

    /// Returns the monitor label.
    pub fn label(&self) -> &'static str {
        match self {
            Vital::HeartRate => "HR",
            Vital::SpO2 => "SpO2",
            Vital::RespiratoryRate => "RR",
            Vital::SystolicBp => "SBP",
            Vital::DiastolicBp => "DBP",
            Vital::Gcs => "GCS",
            Vital::BloodGlucose => "BGL",
        }
    }
}

/// Vital-sign deltas applied when a choice is selected.
pub type Consequence = BTreeMap<Vital, i32>;

/// The evolving vitals of the simulated patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientCondition {
    values: BTreeMap<Vital, i32>,
}

impl PatientCondition {
    /// Creates a condition from an initial snapshot, clamping each value.
    pub fn from_snapshot(snapshot: &BTreeMap<Vital, i32>) -> Self {
        let values = snapshot
            .iter()
            .map(|(vital, value)| (*vital, vital.clamp(*value)))
            .collect();
        Self { values }
    }

    /// Returns the current value of a vital, if tracked.
    pub fn get(&self, vital: Vital) -> Option<i32> {
        self.values.get(&vital).copied()
    }

    /// Applies a consequence.
    ///
    /// Vitals not present in the snapshot are not tracked and are ignored.
    pub fn apply(&mut self, consequence: &Consequence) {
        for (vital, delta) in consequence {
            if let Some(value) = self.values.get_mut(vital) {
                *value = vital.clamp(value.saturating_add(*delta));
            }
        }
    }

    /// Iterates over tracked vitals in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (Vital, i32)> + '_ {
        self.values.iter().map(|(v, x)| (*v, *x))
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &BTreeMap<Vital, i32> {
        &self.values
    }
}

impl std::fmt::Display for PatientCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (vital, value) in self.iter() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{} {}", vital.label(), value)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> BTreeMap<Vital, i32> {
        BTreeMap::from([(Vital::SpO2, 90), (Vital::HeartRate, 110)])
    }

    #[test]
    fn test_apply_clamps_spo2() {
        let mut condition = PatientCondition::from_snapshot(&snapshot());

        condition.apply(&Consequence::from([(Vital::SpO2, 25)]));
        assert_eq!(condition.get(Vital::SpO2), Some(100));

        condition.apply(&Consequence::from([(Vital::SpO2, -500)]));
        assert_eq!(condition.get(Vital::SpO2), Some(70));
    }

    #[test]
    fn test_untracked_vitals_ignored() {
        let mut condition = PatientCondition::from_snapshot(&snapshot());
        condition.apply(&Consequence::from([(Vital::Gcs, -4)]));
        assert_eq!(condition.get(Vital::Gcs), None);
        assert_eq!(condition.get(Vital::HeartRate), Some(110));
    }

    #[test]
    fn test_snapshot_is_clamped() {
        let condition = PatientCondition::from_snapshot(&BTreeMap::from([(Vital::SpO2, 40)]));
        assert_eq!(condition.get(Vital::SpO2), Some(70));
    }

    #[test]
    fn test_display() {
        let condition = PatientCondition::from_snapshot(&snapshot());
        assert_eq!(condition.to_string(), "HR 110 | SpO2 90");
    }
}
