//! Trainer - the scenario runner state machine.
//!
//! A [`Run`] is an immutable value. Every transition (`start`, `choose`,
//! `tick`) takes the current run by reference and returns a new one, so the
//! host owns the only mutable binding and simply replaces it:
//!
//! ```text
//!              choose(correct, last)
//!   ┌────────────┐ ───────────────────────────► ┌───────────┐
//!   │ InProgress │                              │ Completed │
//!   └────────────┘ ◄──┐                         └───────────┘
//!      │   ▲  │       │ choose(correct)
//!      │   │  └───────┘ (next point, fresh clock)
//!      │   │
//!      │   │ lockout reaches 0
//!      ▼   │
//!   ┌────────────┐
//!   │   Locked   │  entered on a wrong choice (5s)
//!   └────────────┘  or on decision-clock expiry (15s)
//! ```
//!
//! The decision clock only counts down while `InProgress`; a lockout
//! suspends it.

use crate::config::TrainerConfig;
use crate::error::{ConfigError, RunError, ScenarioError};
use crate::model::{DecisionPoint, Scenario};
use crate::scoring::{self, RunResult};
use crate::validation::validate_scenario;
use crate::vitals::PatientCondition;
use medic_env::RunId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Why a run is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockoutCause {
    /// A deliberate wrong choice; the decision clock resumes afterwards
    WrongChoice,
    /// The decision clock ran out; a fresh clock starts afterwards
    Timeout,
}

/// Exactly one of these holds for a run at any instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    InProgress,
    Locked { remaining_secs: u32, cause: LockoutCause },
    Completed(RunResult),
}

/// The last thing that happened to a run, for display and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunEvent {
    Started,
    Advanced { from: usize },
    WrongChoice { point: usize, choice: usize },
    TimedOut { point: usize },
    LockoutEnded { point: usize },
    Completed { score: u32, passed: bool },
}

/// The mutable state of one attempt at a scenario, as a value.
#[derive(Debug, Clone)]
pub struct Run {
    id: RunId,
    scenario: Arc<Scenario>,
    index: usize,
    decision_remaining_secs: u32,
    phase: RunPhase,
    errors: u32,
    penalty_secs: u32,
    elapsed_secs: u32,
    condition: PatientCondition,
    last_feedback: Option<String>,
    last_event: RunEvent,
}

impl Run {
    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    /// Index of the active decision point. Equals the point count once
    /// completed.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the active decision point, or None once completed.
    pub fn current_point(&self) -> Option<&DecisionPoint> {
        match self.phase {
            RunPhase::Completed(_) => None,
            _ => self.scenario.point(self.index),
        }
    }

    /// Seconds left on the decision clock.
    pub fn decision_remaining_secs(&self) -> u32 {
        self.decision_remaining_secs
    }

    /// Seconds left in the lockout, 0 when not locked.
    pub fn lockout_remaining_secs(&self) -> u32 {
        match self.phase {
            RunPhase::Locked { remaining_secs, .. } => remaining_secs,
            _ => 0,
        }
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.phase, RunPhase::InProgress)
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.phase, RunPhase::Locked { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.phase, RunPhase::Completed(_))
    }

    /// True when the next tick will consume decision-clock time.
    pub fn decision_clock_running(&self) -> bool {
        self.is_in_progress()
    }

    /// Wrong choices plus timeouts.
    pub fn errors(&self) -> u32 {
        self.errors
    }

    pub fn penalty_secs(&self) -> u32 {
        self.penalty_secs
    }

    /// Decision-clock seconds consumed so far (lockouts excluded).
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn condition(&self) -> &PatientCondition {
        &self.condition
    }

    /// Feedback text of the most recently selected choice.
    pub fn last_feedback(&self) -> Option<&str> {
        self.last_feedback.as_deref()
    }

    pub fn last_event(&self) -> &RunEvent {
        &self.last_event
    }
}

/// Applies the drill rules to runs.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// Creates a trainer with the given rules, rejecting rules that would
    /// stall a run.
    pub fn new(config: TrainerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Starts a run with a fresh random id.
    ///
    /// Any prior run of the same scenario is simply replaced by the caller.
    /// Scenarios that could never complete are rejected.
    pub fn start(&self, scenario: Arc<Scenario>) -> Result<Run, ScenarioError> {
        self.start_with_id(scenario, RunId::new())
    }

    /// Starts a run with a caller-chosen id (deterministic harnesses).
    pub fn start_with_id(&self, scenario: Arc<Scenario>, id: RunId) -> Result<Run, ScenarioError> {
        validate_scenario(&scenario)?;

        let condition = PatientCondition::from_snapshot(&scenario.initial_vitals);
        let decision_remaining_secs = self.clock_for(&scenario, 0);

        debug!(
            "run {} started: '{}' ({} points, clock {}s)",
            id,
            scenario.id,
            scenario.len(),
            decision_remaining_secs
        );

        Ok(Run {
            id,
            scenario,
            index: 0,
            decision_remaining_secs,
            phase: RunPhase::InProgress,
            errors: 0,
            penalty_secs: 0,
            elapsed_secs: 0,
            condition,
            last_feedback: None,
            last_event: RunEvent::Started,
        })
    }

    /// Selects a choice of the active decision point.
    ///
    /// Rejects the call, leaving the caller's run untouched, when the run is
    /// locked or completed or when `choice_index` does not exist.
    pub fn choose(&self, run: &Run, choice_index: usize) -> Result<Run, RunError> {
        match &run.phase {
            RunPhase::Completed(_) => return Err(RunError::Completed),
            RunPhase::Locked { remaining_secs, .. } => return Err(RunError::Locked(*remaining_secs)),
            RunPhase::InProgress => {}
        }

        let point = run
            .scenario
            .point(run.index)
            .ok_or(RunError::Completed)?;
        let choice = point.choices.get(choice_index).ok_or(RunError::ChoiceOutOfRange {
            index: choice_index,
            available: point.choices.len(),
        })?;

        let mut next = run.clone();
        next.condition.apply(&choice.consequence);
        next.last_feedback = Some(choice.feedback.clone());

        if choice.correct {
            let from = run.index;
            let completed = from + 1;

            if completed == run.scenario.len() {
                next.index = completed;
                let result = scoring::score(&next, completed, &self.config);
                debug!(
                    "run {} completed: score={} errors={} passed={}",
                    run.id, result.score, result.errors, result.passed
                );
                next.last_event = RunEvent::Completed {
                    score: result.score,
                    passed: result.passed,
                };
                next.phase = RunPhase::Completed(result);
            } else {
                next.index = completed;
                next.decision_remaining_secs = self.clock_for(&run.scenario, completed);
                next.last_event = RunEvent::Advanced { from };
                debug!(
                    "run {} advanced {} -> {} (clock {}s)",
                    run.id, from, completed, next.decision_remaining_secs
                );
            }
        } else {
            next.errors += 1;
            next.penalty_secs = next.penalty_secs.saturating_add(self.config.wrong_choice_penalty_secs);
            next.phase = RunPhase::Locked {
                remaining_secs: self.config.wrong_choice_lockout_secs,
                cause: LockoutCause::WrongChoice,
            };
            next.last_event = RunEvent::WrongChoice {
                point: run.index,
                choice: choice_index,
            };
            debug!(
                "run {} wrong choice {} at point {}: errors={} locked {}s",
                run.id,
                choice_index,
                run.index,
                next.errors,
                self.config.wrong_choice_lockout_secs
            );
        }

        Ok(next)
    }

    /// Advances the run by one second.
    pub fn tick(&self, run: &Run) -> Run {
        let mut next = run.clone();

        match run.phase {
            RunPhase::Completed(_) => {}
            RunPhase::Locked { remaining_secs, cause } => {
                let remaining_secs = remaining_secs.saturating_sub(1);
                if remaining_secs == 0 {
                    next.phase = RunPhase::InProgress;
                    if cause == LockoutCause::Timeout {
                        next.decision_remaining_secs = self.clock_for(&run.scenario, run.index);
                    }
                    next.last_event = RunEvent::LockoutEnded { point: run.index };
                    debug!("run {} lockout ended at point {}", run.id, run.index);
                } else {
                    next.phase = RunPhase::Locked { remaining_secs, cause };
                }
            }
            RunPhase::InProgress => {
                next.decision_remaining_secs = run.decision_remaining_secs.saturating_sub(1);
                next.elapsed_secs = run.elapsed_secs.saturating_add(1);

                if next.decision_remaining_secs == 0 {
                    next.errors += 1;
                    next.condition.apply(&self.config.timeout_vital_penalty);
                    next.phase = RunPhase::Locked {
                        remaining_secs: self.config.timeout_lockout_secs,
                        cause: LockoutCause::Timeout,
                    };
                    next.last_event = RunEvent::TimedOut { point: run.index };
                    debug!(
                        "run {} timed out at point {}: errors={} locked {}s",
                        run.id, run.index, next.errors, self.config.timeout_lockout_secs
                    );
                }
            }
        }

        next
    }

    /// Advances the run by `secs` one-second ticks.
    pub fn advance(&self, run: &Run, secs: u32) -> Run {
        let mut next = run.clone();
        for _ in 0..secs {
            if next.is_completed() {
                break;
            }
            next = self.tick(&next);
        }
        next
    }

    /// Returns the result stored at completion.
    ///
    /// Repeated calls return the identical result; calling before
    /// completion is rejected.
    pub fn result<'a>(&self, run: &'a Run) -> Result<&'a RunResult, RunError> {
        match &run.phase {
            RunPhase::Completed(result) => Ok(result),
            _ => Err(RunError::NotCompleted),
        }
    }

    /// Decision clock for `index`.
    ///
    /// The first point falls back to the whole scenario budget, later
    /// points fall back to the configured default.
    fn clock_for(&self, scenario: &Scenario, index: usize) -> u32 {
        let fallback = if index == 0 {
            scenario.time_budget_secs
        } else {
            self.config.default_time_limit_secs
        };

        scenario
            .point(index)
            .map(|p| p.time_limit(fallback))
            .unwrap_or(fallback)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CertificationLevel, Choice, Difficulty};
    use crate::scoring::Verdict;
    use crate::vitals::Vital;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    /// Three points, 300 s budget, correct answer at index 1 everywhere.
    fn three_point_scenario() -> Arc<Scenario> {
        let point = |prompt: &str| {
            DecisionPoint::new(
                prompt,
                vec![
                    Choice::wrong("Wait and see", "Delay worsens hypoxia").with_effect(Vital::SpO2, -3),
                    Choice::correct("Act", "Correct").with_effect(Vital::SpO2, 2),
                    Choice::wrong("Transport immediately", "Treat first"),
                ],
            )
            .with_time_limit(120)
        };

        Arc::new(Scenario {
            id: "three_point".to_string(),
            title: "Three point drill".to_string(),
            level: CertificationLevel::Basic,
            difficulty: Difficulty::Beginner,
            chief_complaint: "Shortness of breath".to_string(),
            initial_vitals: BTreeMap::from([(Vital::SpO2, 88), (Vital::HeartRate, 118)]),
            time_budget_secs: 300,
            decision_points: vec![point("Airway"), point("Breathing"), point("Circulation")],
            learning_points: vec![],
            pitfalls: vec![],
        })
    }

    fn trainer() -> Trainer {
        Trainer::new(TrainerConfig::default()).unwrap()
    }

    #[test]
    fn test_start_initial_state() {
        let run = trainer().start(three_point_scenario()).unwrap();

        assert_eq!(run.index(), 0);
        assert!(run.is_in_progress());
        assert_eq!(run.decision_remaining_secs(), 120);
        assert_eq!(run.lockout_remaining_secs(), 0);
        assert_eq!(run.condition().get(Vital::SpO2), Some(88));
        assert_eq!(run.last_event(), &RunEvent::Started);
    }

    #[test]
    fn test_first_point_without_override_uses_budget() {
        let mut scenario = (*three_point_scenario()).clone();
        scenario.decision_points[0].time_limit_secs = None;
        scenario.decision_points[1].time_limit_secs = None;
        let trainer = trainer();

        let run = trainer.start(Arc::new(scenario)).unwrap();
        assert_eq!(run.decision_remaining_secs(), 300);

        let run = trainer.choose(&run, 1).unwrap();
        assert_eq!(run.decision_remaining_secs(), 60);
    }

    #[test]
    fn test_all_correct_250_seconds() {
        let trainer = trainer();
        let mut run = trainer.start(three_point_scenario()).unwrap();

        for secs in [100, 100, 50] {
            run = trainer.advance(&run, secs);
            run = trainer.choose(&run, 1).unwrap();
        }

        let result = trainer.result(&run).unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(result.errors, 0);
        // Budget minus the clock left on the last point
        assert_eq!(result.total_time_secs, 230);
        assert!(result.passed);
        assert_eq!(result.verdict, Verdict::Commendation);
        assert_eq!(run.index(), 3);
    }

    #[test]
    fn test_time_used_reads_final_clock() {
        let mut scenario = (*three_point_scenario()).clone();
        scenario.time_budget_secs = 100;
        for point in &mut scenario.decision_points {
            point.time_limit_secs = None;
        }
        let trainer = trainer();
        let mut run = trainer.start(Arc::new(scenario)).unwrap();

        // 100s clock on the first point, 60s default afterwards
        for secs in [99, 59, 59] {
            run = trainer.advance(&run, secs);
            run = trainer.choose(&run, 1).unwrap();
        }

        let result = trainer.result(&run).unwrap();
        assert_eq!(run.elapsed_secs(), 217);
        assert_eq!(result.total_time_secs, 99);
        assert_eq!(result.errors, 0);
        assert!(result.passed);
        assert_eq!(result.verdict, Verdict::Commendation);
    }

    #[test]
    fn test_over_time_fails_within_error_limit() {
        let config = TrainerConfig {
            wrong_choice_penalty_secs: 40,
            ..TrainerConfig::default()
        };
        let trainer = Trainer::new(config).unwrap();
        let mut run = trainer.start(three_point_scenario()).unwrap();

        for _ in 0..2 {
            run = trainer.choose(&run, 0).unwrap();
            run = trainer.advance(&run, 5);
        }
        run = trainer.choose(&run, 1).unwrap();
        run = trainer.choose(&run, 1).unwrap();
        run = trainer.advance(&run, 110);
        run = trainer.choose(&run, 1).unwrap();

        // 300 - 10 + 80 = 370 > 300 + 60
        let result = trainer.result(&run).unwrap();
        assert_eq!(result.errors, 2);
        assert_eq!(result.total_time_secs, 370);
        assert_eq!(result.score, 20);
        assert!(!result.passed);
        assert_eq!(result.verdict, Verdict::BelowStandard);
    }

    #[test]
    fn test_start_rejects_unplayable_scenario() {
        let mut scenario = (*three_point_scenario()).clone();
        scenario.decision_points.clear();

        assert!(matches!(
            trainer().start(Arc::new(scenario)),
            Err(ScenarioError::NoDecisionPoints(_))
        ));
    }

    #[test]
    fn test_new_rejects_zero_lockout() {
        let config = TrainerConfig {
            wrong_choice_lockout_secs: 0,
            ..TrainerConfig::default()
        };
        assert!(matches!(Trainer::new(config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_one_wrong_choice_scores_95() {
        let trainer = trainer();
        let mut run = trainer.start(three_point_scenario()).unwrap();

        run = trainer.choose(&run, 1).unwrap();
        run = trainer.choose(&run, 0).unwrap();
        assert!(run.is_locked());
        run = trainer.advance(&run, 5);
        run = trainer.choose(&run, 1).unwrap();
        run = trainer.choose(&run, 1).unwrap();

        let result = trainer.result(&run).unwrap();
        assert_eq!(result.errors, 1);
        assert_eq!(result.penalty_secs, 5);
        assert_eq!(result.score, 95);
        assert!(result.passed);
        assert_eq!(result.verdict, Verdict::MinorErrors);
    }

    #[test]
    fn test_four_timeouts_fail() {
        let trainer = trainer();
        let mut scenario = (*three_point_scenario()).clone();
        for point in &mut scenario.decision_points {
            point.time_limit_secs = Some(10);
        }
        let mut run = trainer.start(Arc::new(scenario)).unwrap();

        // Point 0: three timeouts, each followed by a 15s lockout
        for _ in 0..3 {
            run = trainer.advance(&run, 10);
            assert!(matches!(run.last_event(), RunEvent::TimedOut { point: 0 }));
            run = trainer.advance(&run, 15);
        }
        run = trainer.choose(&run, 1).unwrap();

        // Point 1: one more timeout
        run = trainer.advance(&run, 25);
        run = trainer.choose(&run, 1).unwrap();
        run = trainer.choose(&run, 1).unwrap();

        let result = trainer.result(&run).unwrap();
        assert_eq!(result.errors, 4);
        assert!(!result.passed);
        assert_eq!(result.verdict, Verdict::Retrain);
    }

    #[test]
    fn test_wrong_choice_locks_for_five_seconds() {
        let trainer = trainer();
        let run = trainer.start(three_point_scenario()).unwrap();
        let run = trainer.advance(&run, 7);

        let locked = trainer.choose(&run, 2).unwrap();
        assert_eq!(locked.errors(), 1);
        assert_eq!(locked.penalty_secs(), 5);
        assert_eq!(locked.lockout_remaining_secs(), 5);
        assert_eq!(locked.index(), 0);
        assert_eq!(locked.last_feedback(), Some("Treat first"));

        // Decision clock suspended, then resumes where it was
        let after = trainer.advance(&locked, 4);
        assert!(after.is_locked());
        assert_eq!(after.decision_remaining_secs(), 113);
        let after = trainer.tick(&after);
        assert!(after.is_in_progress());
        assert_eq!(after.decision_remaining_secs(), 113);
        assert_eq!(after.elapsed_secs(), 7);
    }

    #[test]
    fn test_timeout_locks_for_fifteen_and_refreshes_clock() {
        let trainer = trainer();
        let run = trainer.start(three_point_scenario()).unwrap();

        let timed_out = trainer.advance(&run, 120);
        assert_eq!(timed_out.errors(), 1);
        assert_eq!(timed_out.lockout_remaining_secs(), 15);
        assert_eq!(timed_out.penalty_secs(), 0);
        // SpO2 88 -> 86 from the fixed timeout penalty
        assert_eq!(timed_out.condition().get(Vital::SpO2), Some(86));

        let resumed = trainer.advance(&timed_out, 15);
        assert!(resumed.is_in_progress());
        assert_eq!(resumed.decision_remaining_secs(), 120);
    }

    #[test]
    fn test_choose_rejected_while_locked() {
        let trainer = trainer();
        let run = trainer.start(three_point_scenario()).unwrap();
        let locked = trainer.choose(&run, 0).unwrap();

        assert_eq!(trainer.choose(&locked, 1).unwrap_err(), RunError::Locked(5));
    }

    #[test]
    fn test_choose_rejected_out_of_range() {
        let trainer = trainer();
        let run = trainer.start(three_point_scenario()).unwrap();

        assert_eq!(
            trainer.choose(&run, 3).unwrap_err(),
            RunError::ChoiceOutOfRange { index: 3, available: 3 }
        );
    }

    #[test]
    fn test_completed_run_is_terminal() {
        let trainer = trainer();
        let mut run = trainer.start(three_point_scenario()).unwrap();
        for _ in 0..3 {
            run = trainer.choose(&run, 1).unwrap();
        }

        assert_eq!(trainer.choose(&run, 1).unwrap_err(), RunError::Completed);

        let ticked = trainer.advance(&run, 30);
        assert_eq!(trainer.result(&ticked).unwrap(), trainer.result(&run).unwrap());
        assert!(ticked.current_point().is_none());
    }

    #[test]
    fn test_result_before_completion_rejected() {
        let trainer = trainer();
        let run = trainer.start(three_point_scenario()).unwrap();
        assert_eq!(trainer.result(&run).unwrap_err(), RunError::NotCompleted);
    }

    #[test]
    fn test_score_floored_at_zero() {
        let trainer = trainer();
        let mut run = trainer.start(three_point_scenario()).unwrap();
        for _ in 0..25 {
            run = trainer.choose(&run, 0).unwrap();
            run = trainer.advance(&run, 5);
        }
        for _ in 0..3 {
            run = trainer.choose(&run, 1).unwrap();
        }

        let result = trainer.result(&run).unwrap();
        assert_eq!(result.penalty_secs, 125);
        assert_eq!(result.score, 0);
        assert!(!result.passed);
    }

    #[test]
    fn test_original_run_untouched_by_transition() {
        let trainer = trainer();
        let run = trainer.start(three_point_scenario()).unwrap();
        let _next = trainer.choose(&run, 0).unwrap();

        assert!(run.is_in_progress());
        assert_eq!(run.errors(), 0);
    }

    /// A host action: Some(choice) selects, None ticks.
    fn actions() -> impl Strategy<Value = Vec<Option<usize>>> {
        prop::collection::vec(prop::option::weighted(0.4, 0usize..4), 0..400)
    }

    proptest! {
        #[test]
        fn prop_run_invariants_hold(actions in actions()) {
            let trainer = trainer();
            let mut run = trainer.start(three_point_scenario()).unwrap();
            let total = run.scenario().len();

            for action in actions {
                let before = run.clone();
                run = match action {
                    Some(choice) => trainer.choose(&run, choice).unwrap_or(run),
                    None => trainer.tick(&run),
                };

                prop_assert!(run.index() >= before.index());
                prop_assert!(run.index() <= total);
                prop_assert!(!(run.is_locked() && run.decision_clock_running()));

                let spo2 = run.condition().get(Vital::SpO2).unwrap();
                prop_assert!((70..=100).contains(&spo2));

                if run.errors() > before.errors() {
                    prop_assert_eq!(run.errors(), before.errors() + 1);
                    match run.last_event() {
                        RunEvent::WrongChoice { .. } => {
                            prop_assert_eq!(run.lockout_remaining_secs(), 5);
                        }
                        RunEvent::TimedOut { .. } => {
                            prop_assert_eq!(run.lockout_remaining_secs(), 15);
                        }
                        other => {
                            prop_assert!(false, "unexpected event {:?}", other);
                        }
                    }
                }

                if let Ok(result) = trainer.result(&run) {
                    prop_assert!(result.score <= 100);
                }
            }
        }

        #[test]
        fn prop_perfect_play_passes(waits in prop::collection::vec(0u32..60, 3)) {
            let trainer = trainer();
            let mut run = trainer.start(three_point_scenario()).unwrap();

            for wait in waits {
                run = trainer.advance(&run, wait);
                run = trainer.choose(&run, 1).unwrap();
            }

            let result = trainer.result(&run).unwrap();
            prop_assert_eq!(result.errors, 0);
            prop_assert!(result.passed);
            prop_assert_eq!(result.score, 100);
        }
    }
}
