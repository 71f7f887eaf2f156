//! Simulation clock implementing DrillClock for deterministic drills.

use async_trait::async_trait;
use medic_env::DrillClock;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Virtual clock advanced manually by the harness.
///
/// Clones share the same virtual time.
pub struct SimClock {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,
}

impl SimClock {
    /// Creates a new SimClock with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an Arc-wrapped clock for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self.virtual_time_ns.lock().unwrap_or_else(|e| e.into_inner());
        *time += duration.as_nanos() as u64;
    }

    /// Returns the current virtual time in whole seconds.
    pub fn secs(&self) -> u64 {
        self.now().as_secs()
    }
}

impl Clone for SimClock {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
        }
    }
}

#[async_trait]
impl DrillClock for SimClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(*self.virtual_time_ns.lock().unwrap_or_else(|e| e.into_inner()))
    }

    async fn sleep(&self, duration: Duration) {
        // Sleeping advances virtual time and yields once
        self.advance(duration);
        tokio::task::yield_now().await;
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medic_core::{
        CertificationLevel, Choice, DecisionPoint, Difficulty, DrillSession, RunEvent, Scenario, SessionOutcome,
        Trainer, Vital,
    };
    use medic_env::{EnvError, InputEvent, InputSource, TraineeId};
    use std::collections::{BTreeMap, VecDeque};

    #[test]
    fn test_sim_clock_time() {
        let clock = SimClock::new(42);
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(1));

        clock.advance(Duration::from_millis(500));
        assert_eq!(clock.now(), Duration::from_millis(1500));
        assert_eq!(clock.secs(), 1);
    }

    #[test]
    fn test_sim_clock_clone_shares_time() {
        let clock1 = SimClock::new(42);
        let clock2 = clock1.clone();

        clock1.advance(Duration::from_secs(5));

        assert_eq!(clock1.now(), clock2.now());
        assert_eq!(clock2.seed(), 42);
    }

    #[tokio::test]
    async fn test_sim_clock_sleep_advances() {
        let clock = SimClock::new(1);
        clock.sleep(Duration::from_secs(3)).await;
        assert_eq!(clock.secs(), 3);
    }

    /// Releases each event once virtual time reaches its second.
    struct TimedInput {
        clock: SimClock,
        script: Mutex<VecDeque<(u64, InputEvent)>>,
    }

    #[async_trait]
    impl InputSource for TimedInput {
        async fn next_event(&self) -> Result<Option<InputEvent>, EnvError> {
            loop {
                {
                    let mut script = self.script.lock().unwrap();
                    match script.front() {
                        None => return Ok(None),
                        Some((at, _)) if self.clock.secs() >= *at => {
                            return Ok(script.pop_front().map(|(_, event)| event));
                        }
                        Some(_) => {}
                    }
                }
                tokio::task::yield_now().await;
            }
        }

        fn trainee(&self) -> TraineeId {
            TraineeId::from_seed(7)
        }
    }

    #[tokio::test]
    async fn test_session_ticks_on_virtual_clock() {
        let first = DecisionPoint::new("Airway?", vec![Choice::correct("Open", ""), Choice::wrong("Wait", "")])
            .with_time_limit(5);
        let second = DecisionPoint::new("Transport?", vec![Choice::correct("Go", ""), Choice::wrong("Stay", "")]);
        let scenario = Arc::new(Scenario {
            id: "virtual".to_string(),
            title: "Virtual".to_string(),
            level: CertificationLevel::Basic,
            difficulty: Difficulty::Beginner,
            chief_complaint: "Test".to_string(),
            initial_vitals: BTreeMap::from([(Vital::SpO2, 94)]),
            time_budget_secs: 60,
            decision_points: vec![first, second],
            learning_points: vec![],
            pitfalls: vec![],
        });

        let clock = SimClock::new(3);
        // Clock expires at 5s, lockout ends at 20s, fresh 5s clock until 25s
        let input = Arc::new(TimedInput {
            clock: clock.clone(),
            script: Mutex::new(VecDeque::from([(22, InputEvent::Choose(0)), (23, InputEvent::Choose(0))])),
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let session = DrillSession::new(Arc::new(clock.clone()), input, Trainer::default(), scenario)
            .unwrap()
            .with_observer(move |run| {
                let mut log = log.lock().unwrap();
                if log.last().map(|(event, _, _)| event) != Some(run.last_event()) {
                    log.push((run.last_event().clone(), run.decision_remaining_secs(), run.condition().get(Vital::SpO2)));
                }
            });

        let outcome = session.run_to_end().await;

        let result = match outcome {
            SessionOutcome::Completed(result) => result,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(result.errors, 1);
        assert!(result.passed);
        assert!((22..=24).contains(&clock.secs()));

        let seen = seen.lock().unwrap();
        let events: Vec<&RunEvent> = seen.iter().map(|(event, _, _)| event).collect();
        assert_eq!(
            events,
            vec![
                &RunEvent::Started,
                &RunEvent::TimedOut { point: 0 },
                &RunEvent::LockoutEnded { point: 0 },
                &RunEvent::Advanced { from: 0 },
                &RunEvent::Completed { score: 100, passed: true },
            ]
        );
        // Timeout applied the vitals penalty, lockout end restarted the clock
        assert_eq!(seen[1].2, Some(92));
        assert_eq!(seen[2].1, 5);
    }
}
