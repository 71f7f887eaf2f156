//! JSON exporter for drill replays.
//!
//! Exports per-second frames so a run can be replayed or charted offline.

use crate::trainee::TraineeKind;
use medic_core::{RunEvent, RunResult, Vital};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;

/// A single second of a drill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillFrame {
    /// Virtual time in seconds
    pub time_sec: u64,

    /// Active decision point
    pub point: usize,

    pub decision_remaining_secs: u32,

    pub lockout_remaining_secs: u32,

    pub errors: u32,

    /// Patient condition at the end of this second
    pub vitals: BTreeMap<Vital, i32>,

    /// Transitions during this second
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<RunEvent>,
}

/// Complete drill export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillExport {
    /// Scenario id
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    pub trainee: TraineeKind,

    /// Duration in seconds
    pub duration_sec: u64,

    /// All frames
    pub frames: Vec<DrillFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RunResult>,
}

impl DrillExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, trainee: TraineeKind) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            trainee,
            duration_sec: 0,
            frames: Vec::new(),
            passed: false,
            result: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: DrillFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, result: Option<RunResult>) {
        self.passed = result.as_ref().map_or(false, |r| r.passed);
        self.result = result;
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
