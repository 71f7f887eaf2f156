//! Scoring Engine
//! ==============
//!
//! Terminal computation run exactly once, at the completion transition:
//!
//! ```text
//! total_time  = budget - final_decision_clock + penalty_secs
//! base_score  = 100 * completed / total
//! final_score = clamp(base_score - penalty_secs, 0, 100)
//! passed      = errors <= max_errors AND total_time <= budget + grace
//! ```
//!
//! Completion is only reachable by answering every point correctly, so
//! `base_score` is always 100 at the call site and the time penalty is the
//! only differentiator. That is kept as observed behavior.
//!
//! `total_time` reads only the clock left on the last decision point. Every
//! point restarts the clock, so time spent on earlier points does not
//! count; with default rules the time clause can only fail once penalty
//! seconds exceed the grace. This is also kept as observed behavior.

use crate::config::TrainerConfig;
use crate::trainer::Run;
use serde::{Deserialize, Serialize};

/// Row of the feedback decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Passed with zero errors
    Commendation,
    /// Passed with at most one error
    MinorErrors,
    /// Passed otherwise
    Acceptable,
    /// Failed with more than three errors
    Retrain,
    /// Failed otherwise
    BelowStandard,
}

impl Verdict {
    /// Selects the row for `(passed, errors)`.
    pub fn classify(passed: bool, errors: u32) -> Self {
        match (passed, errors) {
            (true, 0) => Verdict::Commendation,
            (true, 1) => Verdict::MinorErrors,
            (true, _) => Verdict::Acceptable,
            (false, e) if e > 3 => Verdict::Retrain,
            (false, _) => Verdict::BelowStandard,
        }
    }

    /// Returns the feedback text shown on the result screen.
    pub fn feedback(&self) -> &'static str {
        match self {
            Verdict::Commendation => {
                "Excellent work. All critical actions completed without error."
            }
            Verdict::MinorErrors => "Good performance with minor errors. Review the feedback.",
            Verdict::Acceptable => "Acceptable performance. Focus on reducing errors.",
            Verdict::Retrain => {
                "Multiple critical errors. Review the protocol and retrain before the next attempt."
            }
            Verdict::BelowStandard => "Below standard. Practice this scenario again.",
        }
    }
}

/// Terminal snapshot of a completed run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Final score in [0, 100]
    pub score: u32,

    /// Decision points completed
    pub completed: usize,

    /// Decision points in the scenario
    pub total: usize,

    /// Wrong choices plus timeouts
    pub errors: u32,

    /// Budget minus the final decision clock, plus penalty seconds
    pub total_time_secs: u32,

    /// Penalty seconds accumulated from wrong choices
    pub penalty_secs: u32,

    pub passed: bool,

    pub verdict: Verdict,

    pub feedback: String,
}

/// Computes the result for a run that has just answered its last point.
///
/// Only the completion transition in the trainer calls this; everybody
/// else reads the stored result through `Trainer::result`.
pub(crate) fn score(run: &Run, completed: usize, config: &TrainerConfig) -> RunResult {
    let total = run.scenario().len();
    let penalty_secs = run.penalty_secs();
    let errors = run.errors();

    let budget = run.scenario().time_budget_secs;
    let total_time_secs = budget
        .saturating_sub(run.decision_remaining_secs())
        .saturating_add(penalty_secs);

    let base_score = if total > 0 {
        (100 * completed / total) as i64
    } else {
        0
    };
    let score = (base_score - penalty_secs as i64).clamp(0, 100) as u32;

    let time_allowed = budget.saturating_add(config.pass_time_grace_secs);
    let passed = errors <= config.pass_max_errors && total_time_secs <= time_allowed;

    let verdict = Verdict::classify(passed, errors);

    RunResult {
        score,
        completed,
        total,
        errors,
        total_time_secs,
        penalty_secs,
        passed,
        verdict,
        feedback: verdict.feedback().to_string(),
    }
}
