//! Medic Drill Harness
//!
//! This crate runs the training engine end to end without a human at the
//! keyboard: scripted trainees answer built-in scenarios against a virtual
//! clock, so a whole drill plays out in microseconds and the same seed
//! always produces the same report.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: `SimClock` advances only when the runner says so
//! - **Input**: choices come from a `Trainee`, not stdin
//! - **Randomness**: trainee dice derive from a single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        DrillRunner                          │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │ SimClock (virtual seconds)                           │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │       │ 1s                                                  │
//! │  ┌────▼────┐   choose(i)   ┌──────────┐                     │
//! │  │ Trainee │──────────────►│ Trainer  │──► Run ──► frame    │
//! │  └─────────┘               └──────────┘           │         │
//! │                                                   ▼         │
//! │                                   DrillReport / DrillExport │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use medic_sim::{DrillRunner, TraineeKind};
//! use medic_sim::scenarios::ScenarioId;
//!
//! let runner = DrillRunner::new(42);
//! let report = runner.run(&Arc::new(ScenarioId::Stroke.build()), TraineeKind::Perfect)?;
//! assert!(report.passed);
//! ```

mod context;
mod exporter;
mod runner;
mod trainee;
pub mod scenarios;

pub use context::SimClock;
pub use exporter::{DrillExport, DrillFrame};
pub use runner::{DrillError, DrillMetrics, DrillReport, DrillRunner};
pub use trainee::{Trainee, TraineeKind};
