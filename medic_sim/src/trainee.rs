//! Scripted trainees for deterministic drills.
//!
//! A trainee looks at the run once per virtual second and may pick a
//! choice. All randomness comes from a seeded ChaCha8 stream, so a given
//! (seed, trainee, scenario) triple always plays out the same way.

use medic_core::Run;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Behavior of a scripted trainee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraineeKind {
    /// Always picks a correct choice
    Perfect,
    /// Works down the choice list in order until one is accepted
    Sequential,
    /// Picks a wrong choice with probability `error_rate`
    Erratic,
    /// Never answers; every decision point times out
    Idle,
}

impl TraineeKind {
    pub fn all() -> Vec<TraineeKind> {
        vec![
            TraineeKind::Perfect,
            TraineeKind::Sequential,
            TraineeKind::Erratic,
            TraineeKind::Idle,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TraineeKind::Perfect => "perfect",
            TraineeKind::Sequential => "sequential",
            TraineeKind::Erratic => "erratic",
            TraineeKind::Idle => "idle",
        }
    }
}

impl std::fmt::Display for TraineeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TraineeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "perfect" => Ok(TraineeKind::Perfect),
            "sequential" | "first" => Ok(TraineeKind::Sequential),
            "erratic" | "random" => Ok(TraineeKind::Erratic),
            "idle" => Ok(TraineeKind::Idle),
            _ => Err(format!("Unknown trainee: {}", s)),
        }
    }
}

/// A scripted trainee with its own RNG stream.
pub struct Trainee {
    kind: TraineeKind,

    /// Seconds spent reading each prompt before acting
    think_secs: u32,

    /// Probability of a wrong pick (Erratic only)
    error_rate: f64,

    rng: ChaCha8Rng,

    /// Seconds waited on the current prompt
    waited: u32,

    /// Decision point the next sequential attempt refers to
    point: usize,

    /// Next choice a sequential trainee will try
    attempt: usize,
}

impl Trainee {
    /// Creates a trainee with a 3 s think time and 30% error rate.
    pub fn new(kind: TraineeKind, seed: u64) -> Self {
        Self {
            kind,
            think_secs: 3,
            error_rate: 0.3,
            rng: ChaCha8Rng::seed_from_u64(seed),
            waited: 0,
            point: 0,
            attempt: 0,
        }
    }

    pub fn with_think_secs(mut self, secs: u32) -> Self {
        self.think_secs = secs;
        self
    }

    pub fn with_error_rate(mut self, rate: f64) -> Self {
        self.error_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn kind(&self) -> TraineeKind {
        self.kind
    }

    /// Looks at the run for one second; returns a choice index to submit.
    pub fn act(&mut self, run: &Run) -> Option<usize> {
        if !run.is_in_progress() {
            self.waited = 0;
            return None;
        }
        let point = run.current_point()?;

        if run.index() != self.point {
            self.point = run.index();
            self.attempt = 0;
        }

        if self.waited < self.think_secs {
            self.waited += 1;
            return None;
        }
        self.waited = 0;

        match self.kind {
            TraineeKind::Perfect => point.correct_index(),
            TraineeKind::Sequential => {
                let pick = self.attempt % point.choices.len();
                self.attempt += 1;
                Some(pick)
            }
            TraineeKind::Erratic => {
                let wrong: Vec<usize> = point
                    .choices
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| !c.correct)
                    .map(|(i, _)| i)
                    .collect();

                if !wrong.is_empty() && self.rng.gen_bool(self.error_rate) {
                    wrong.choose(&mut self.rng).copied()
                } else {
                    point.correct_index()
                }
            }
            TraineeKind::Idle => None,
        }
    }
}
