//! Drill runner - plays scenarios with scripted trainees in virtual time.

use crate::context::SimClock;
use crate::exporter::{DrillExport, DrillFrame};
use crate::trainee::{Trainee, TraineeKind};

use medic_core::{ConfigError, Run, RunEvent, RunResult, Scenario, ScenarioError, Trainer, TrainerConfig};
use medic_env::{DrillClock, RunId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reasons a drill cannot start.
#[derive(Debug, Error)]
pub enum DrillError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// Results from running a drill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrillReport {
    /// Scenario that was run
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Scripted trainee behavior
    pub trainee: TraineeKind,

    /// Whether the run completed and passed
    pub passed: bool,

    /// Terminal result, None if the run hit the time cap
    pub result: Option<RunResult>,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: DrillMetrics,
}

/// Metrics collected during drill execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrillMetrics {
    /// Choices accepted by the trainer
    pub choices: u64,

    /// Wrong choices
    pub wrong_choices: u64,

    /// Decision clock expiries
    pub timeouts: u64,

    /// Seconds spent locked out
    pub lockout_secs: u64,

    /// Choices rejected (locked run or bad index)
    pub rejected: u64,
}

/// Runs drills deterministically.
pub struct DrillRunner {
    /// Configuration seed
    seed: u64,

    /// Drill rules
    config: TrainerConfig,

    /// Hard cap on virtual seconds before the run is abandoned
    max_secs: u64,

    /// Think time for scripted trainees
    think_secs: u32,

    /// Error rate for erratic trainees
    error_rate: f64,
}

impl DrillRunner {
    /// Creates a new drill runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: TrainerConfig::default(),
            max_secs: 1800,
            think_secs: 3,
            error_rate: 0.3,
        }
    }

    /// Sets the drill rules.
    pub fn with_config(mut self, config: TrainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the virtual time cap.
    pub fn with_max_secs(mut self, secs: u64) -> Self {
        self.max_secs = secs;
        self
    }

    /// Sets the scripted trainee think time.
    pub fn with_think_secs(mut self, secs: u32) -> Self {
        self.think_secs = secs;
        self
    }

    /// Sets the erratic trainee error rate.
    pub fn with_error_rate(mut self, rate: f64) -> Self {
        self.error_rate = rate;
        self
    }

    /// Runs a drill and returns the report.
    pub fn run(&self, scenario: &Arc<Scenario>, kind: TraineeKind) -> Result<DrillReport, DrillError> {
        Ok(self.run_recorded(scenario, kind)?.0)
    }

    /// Runs a drill, also returning the frame-by-frame export.
    pub fn run_recorded(
        &self,
        scenario: &Arc<Scenario>,
        kind: TraineeKind,
    ) -> Result<(DrillReport, DrillExport), DrillError> {
        info!("Starting drill: {} with {} trainee (seed={})", scenario.id, kind, self.seed);

        // Separate streams so the trainee's dice don't depend on run ids
        let trainee_seed = self.seed.wrapping_mul(0x9e3779b97f4a7c15);

        let clock = SimClock::new(self.seed);
        let trainer = Trainer::new(self.config.clone())?;
        let mut trainee = Trainee::new(kind, trainee_seed)
            .with_think_secs(self.think_secs)
            .with_error_rate(self.error_rate);

        let mut run = trainer.start_with_id(Arc::clone(scenario), RunId::from_seed(self.seed))?;
        let mut export = DrillExport::new(&scenario.id, self.seed, kind);
        let mut metrics = DrillMetrics::default();
        let mut ticks = 0u64;

        while !run.is_completed() && ticks < self.max_secs {
            let mut events = Vec::new();

            if let Some(choice) = trainee.act(&run) {
                match trainer.choose(&run, choice) {
                    Ok(next) => {
                        metrics.choices += 1;
                        if matches!(next.last_event(), RunEvent::WrongChoice { .. }) {
                            metrics.wrong_choices += 1;
                        }
                        events.push(next.last_event().clone());
                        run = next;
                    }
                    Err(e) => {
                        metrics.rejected += 1;
                        warn!("  choice {} rejected: {}", choice, e);
                    }
                }
            }

            if run.is_completed() {
                export.add_frame(frame(&clock, &run, events));
                break;
            }

            if run.is_locked() {
                metrics.lockout_secs += 1;
            }

            let next = trainer.tick(&run);
            if next.last_event() != run.last_event() {
                if matches!(next.last_event(), RunEvent::TimedOut { .. }) {
                    metrics.timeouts += 1;
                }
                events.push(next.last_event().clone());
            }
            run = next;

            clock.advance(Duration::from_secs(1));
            ticks += 1;

            export.add_frame(frame(&clock, &run, events));

            if ticks % 30 == 0 {
                debug!(
                    "  t={}s | point={}/{} | errors={} | {}",
                    clock.secs(),
                    run.index(),
                    scenario.len(),
                    run.errors(),
                    run.condition()
                );
            }
        }

        let result = trainer.result(&run).ok().cloned();
        export.finalize(result.clone());

        let (passed, failure_reason) = match &result {
            Some(r) if r.passed => (true, None),
            Some(r) => (
                false,
                Some(format!(
                    "score {} with {} errors in {}s: {}",
                    r.score, r.errors, r.total_time_secs, r.feedback
                )),
            ),
            None => (
                false,
                Some(format!(
                    "abandoned after {}s at decision point {}/{}",
                    ticks,
                    run.index() + 1,
                    scenario.len()
                )),
            ),
        };

        if passed {
            info!("✓ {} complete in {}s", scenario.id, ticks);
        } else {
            info!("✗ {} not passed after {}s", scenario.id, ticks);
        }

        let report = DrillReport {
            scenario: scenario.id.clone(),
            seed: self.seed,
            trainee: kind,
            passed,
            result,
            total_ticks: ticks,
            failure_reason,
            metrics,
        };

        Ok((report, export))
    }
}

fn frame(clock: &SimClock, run: &Run, events: Vec<RunEvent>) -> DrillFrame {
    DrillFrame {
        time_sec: clock.now().as_secs(),
        point: run.index(),
        decision_remaining_secs: run.decision_remaining_secs(),
        lockout_remaining_secs: run.lockout_remaining_secs(),
        errors: run.errors(),
        vitals: run.condition().as_map().clone(),
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ScenarioId;
    use medic_core::{CertificationLevel, Choice, DecisionPoint, Difficulty, Verdict, Vital};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn scenario(id: ScenarioId) -> Arc<Scenario> {
        Arc::new(id.build())
    }

    #[test]
    fn test_perfect_trainee_passes_every_builtin() {
        let runner = DrillRunner::new(42);

        for id in ScenarioId::all() {
            let report = runner.run(&scenario(id), TraineeKind::Perfect).unwrap();
            let result = report.result.as_ref().unwrap();

            assert!(report.passed, "{} failed: {:?}", id, report.failure_reason);
            assert_eq!(result.errors, 0);
            assert_eq!(result.score, 100);
            assert_eq!(result.verdict, Verdict::Commendation);
        }
    }

    #[test]
    fn test_sequential_trainee_penalized() {
        let runner = DrillRunner::new(42).with_think_secs(0);
        let report = runner.run(&scenario(ScenarioId::Stroke), TraineeKind::Sequential).unwrap();

        // Stroke answer key: 1, 0, 1 -> two wrong picks
        let result = report.result.unwrap();
        assert_eq!(result.errors, 2);
        assert_eq!(result.penalty_secs, 10);
        assert_eq!(result.score, 90);
        assert!(result.passed);
        assert_eq!(report.metrics.wrong_choices, 2);
        assert_eq!(report.metrics.lockout_secs, 10);
    }

    #[test]
    fn test_idle_trainee_hits_cap() {
        let runner = DrillRunner::new(7).with_max_secs(120);
        let report = runner.run(&scenario(ScenarioId::CardiacArrest), TraineeKind::Idle).unwrap();

        assert!(!report.passed);
        assert!(report.result.is_none());
        assert_eq!(report.total_ticks, 120);
        // 15s clock + 15s lockout per cycle
        assert_eq!(report.metrics.timeouts, 4);
        assert!(report.failure_reason.unwrap().contains("abandoned"));
    }

    #[test]
    fn test_drill_deterministic() {
        let runner1 = DrillRunner::new(1234);
        let runner2 = DrillRunner::new(1234);

        let a = runner1.run_recorded(&scenario(ScenarioId::Asthma), TraineeKind::Erratic).unwrap();
        let b = runner2.run_recorded(&scenario(ScenarioId::Asthma), TraineeKind::Erratic).unwrap();

        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }

    #[test]
    fn test_export_frames_cover_run() {
        let runner = DrillRunner::new(5);
        let (report, export) = runner.run_recorded(&scenario(ScenarioId::Anaphylaxis), TraineeKind::Perfect).unwrap();

        assert_eq!(export.frames.len() as u64, report.total_ticks + 1);
        assert!(export.passed);
        let completed = export.frames.last().unwrap();
        assert!(matches!(completed.events.last(), Some(RunEvent::Completed { passed: true, .. })));
    }

    #[test]
    fn test_timeout_penalty_reaches_vitals() {
        let point = DecisionPoint::new("Wait?", vec![Choice::correct("Go", "")]).with_time_limit(5);
        let scenario = Arc::new(Scenario {
            id: "slow".to_string(),
            title: "Slow".to_string(),
            level: CertificationLevel::Basic,
            difficulty: Difficulty::Beginner,
            chief_complaint: "Test".to_string(),
            initial_vitals: BTreeMap::from([(Vital::SpO2, 72)]),
            time_budget_secs: 60,
            decision_points: vec![point],
            learning_points: vec![],
            pitfalls: vec![],
        });

        let runner = DrillRunner::new(1).with_max_secs(60);
        let (_, export) = runner.run_recorded(&scenario, TraineeKind::Idle).unwrap();

        let floor = export.frames.iter().map(|f| f.vitals[&Vital::SpO2]).min().unwrap();
        assert_eq!(floor, 70);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let config = TrainerConfig {
            timeout_lockout_secs: 0,
            ..TrainerConfig::default()
        };
        let runner = DrillRunner::new(1).with_config(config);

        assert!(matches!(
            runner.run(&scenario(ScenarioId::Stroke), TraineeKind::Perfect),
            Err(DrillError::Config(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_erratic_runs_stay_bounded(seed in any::<u64>(), rate in 0.0f64..1.0) {
            let runner = DrillRunner::new(seed).with_error_rate(rate).with_max_secs(900);

            for id in ScenarioId::all() {
                let report = runner.run(&scenario(id), TraineeKind::Erratic).unwrap();
                if let Some(result) = &report.result {
                    prop_assert!(result.score <= 100);
                    prop_assert_eq!(result.completed, result.total);
                    prop_assert_eq!(result.errors as u64, report.metrics.wrong_choices + report.metrics.timeouts);
                    if result.errors > 2 {
                        prop_assert!(!result.passed);
                    }
                }
            }
        }
    }
}
