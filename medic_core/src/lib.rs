//! Medic Drill Core - EMS Training Scenario Engine
//!
//! This library runs interactive training drills for EMS personnel:
//! 1. **Scenario Definition**: declarative, validated-at-load case data
//! 2. **Trainer**: the start/choose/tick state machine with decision clock,
//!    lockouts, and a patient condition tracker
//! 3. **Scoring Engine**: terminal score, pass/fail verdict, and feedback
//!
//! Alongside the engine sit the read-only reference catalogs (formulary,
//! flashcards) and bedside calculators the drills refer to.

pub mod model;
pub mod vitals;
pub mod validation;
pub mod config;
pub mod trainer;
pub mod scoring;
pub mod session;
pub mod reference;
pub mod calculators;
pub mod error;

// Re-export key types for convenience
pub use model::{CertificationLevel, Choice, DecisionPoint, Difficulty, Scenario};
pub use vitals::{Consequence, PatientCondition, Vital};
pub use validation::{validate_scenario, ScenarioCatalog};
pub use config::TrainerConfig;
pub use trainer::{LockoutCause, Run, RunEvent, RunPhase, Trainer};
pub use scoring::{RunResult, Verdict};
pub use session::{DrillSession, SessionOutcome};
pub use reference::{Dose, DoseRule, Drug, Flashcard, FlashcardDeck, Formulary};
pub use error::{ConfigError, ReferenceError, RunError, ScenarioError};
