//! Drill Session - drives a run from the host's clock and input.
//!
//! This module is the thin integration layer between the pure trainer and
//! the environment abstraction (`DrillClock`, `InputSource`).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      DrillSession                           │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │              Clock: DrillClock                       │   │
//! │  │  • sleep(1s) → Trainer::tick                         │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │              Input: InputSource                      │   │
//! │  │  • Choose(i) → Trainer::choose                       │   │
//! │  │  • Abandon   → discard the run                       │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                              │                               │
//! │                     ┌────────▼────────┐                      │
//! │                     │   Run (owned)   │                      │
//! │                     └─────────────────┘                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use medic_core::session::DrillSession;
//! use medic_env::{TokioClock, StdinInput};
//!
//! let session = DrillSession::new(TokioClock::shared(), Arc::new(StdinInput::new()), trainer, scenario)?;
//! let outcome = session.run_to_end().await;
//! ```

use crate::error::ScenarioError;
use crate::model::Scenario;
use crate::scoring::RunResult;
use crate::trainer::{Run, Trainer};
use medic_env::{DrillClock, InputEvent, InputSource};

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Tick interval of the host driver.
pub const TICK: Duration = Duration::from_secs(1);

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The last decision point was answered
    Completed(RunResult),
    /// The trainee returned to the list
    Abandoned { index: usize, errors: u32 },
    /// The input source closed before completion
    InputClosed { index: usize, errors: u32 },
    /// Reading input failed before completion
    InputFailed { index: usize, errors: u32, reason: String },
}

/// Called with the run after every transition, for re-rendering.
pub type Observer = Box<dyn FnMut(&Run) + Send>;

/// Owns the only mutable run binding for one attempt.
///
/// Generic over the clock and input implementations, so the same loop
/// runs against a terminal or a scripted harness.
pub struct DrillSession<Clk, In>
where
    Clk: DrillClock,
    In: InputSource,
{
    clock: Arc<Clk>,
    input: Arc<In>,
    trainer: Trainer,
    run: Run,
    observer: Option<Observer>,
    rejected: u64,
}

impl<Clk, In> DrillSession<Clk, In>
where
    Clk: DrillClock,
    In: InputSource,
{
    /// Creates a session and starts a run of `scenario`.
    pub fn new(
        clock: Arc<Clk>,
        input: Arc<In>,
        trainer: Trainer,
        scenario: Arc<Scenario>,
    ) -> Result<Self, ScenarioError> {
        let run = trainer.start(scenario)?;
        info!("trainee {} started run {} of '{}'", input.trainee(), run.id(), run.scenario().id);
        Ok(Self {
            clock,
            input,
            trainer,
            run,
            observer: None,
            rejected: 0,
        })
    }

    /// Registers a render callback.
    pub fn with_observer(mut self, observer: impl FnMut(&Run) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    /// Number of choices rejected because the run was locked or the
    /// index was invalid.
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    fn replace(&mut self, run: Run) {
        self.run = run;
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.run);
        }
    }

    /// Applies one trainee action. Returns an outcome if the session ended.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<SessionOutcome> {
        match event {
            InputEvent::Abandon => {
                info!(
                    "trainee {} abandoned run {} at point {}",
                    self.input.trainee(),
                    self.run.id(),
                    self.run.index()
                );
                Some(SessionOutcome::Abandoned {
                    index: self.run.index(),
                    errors: self.run.errors(),
                })
            }
            InputEvent::Choose(index) => {
                match self.trainer.choose(&self.run, index) {
                    Ok(next) => self.replace(next),
                    Err(e) => {
                        self.rejected += 1;
                        warn!("choice {} ignored: {}", index + 1, e);
                    }
                }
                self.completed()
            }
        }
    }

    /// Applies one clock tick.
    pub fn handle_tick(&mut self) {
        let next = self.trainer.tick(&self.run);
        self.replace(next);
    }

    fn completed(&self) -> Option<SessionOutcome> {
        let result = self.trainer.result(&self.run).ok()?;
        info!(
            "trainee {} completed run {}: score={} passed={}",
            self.input.trainee(),
            self.run.id(),
            result.score,
            result.passed
        );
        Some(SessionOutcome::Completed(result.clone()))
    }

    /// Runs until completion, abandonment, or input close.
    pub async fn run_to_end(mut self) -> SessionOutcome {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.run);
        }

        let clock = Arc::clone(&self.clock);
        let input = Arc::clone(&self.input);
        let mut next_tick = clock.sleep(TICK);

        loop {
            tokio::select! {
                biased;

                event = input.next_event() => {
                    let event = match event {
                        Ok(Some(event)) => event,
                        Ok(None) => {
                            return SessionOutcome::InputClosed {
                                index: self.run.index(),
                                errors: self.run.errors(),
                            };
                        }
                        Err(e) => {
                            error!("run {} input failed: {}", self.run.id(), e);
                            return SessionOutcome::InputFailed {
                                index: self.run.index(),
                                errors: self.run.errors(),
                                reason: e.to_string(),
                            };
                        }
                    };
                    if let Some(outcome) = self.handle_event(event) {
                        return outcome;
                    }
                }
                _ = &mut next_tick => {
                    self.handle_tick();
                    next_tick = clock.sleep(TICK);
                }
            }
        }
    }
}
