//! Medic Drill Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" seam that lets the drill engine run
//! against a **Production** host (tokio clock, stdin trainee) or a
//! **Simulation** host (virtual clock, scripted trainee).
//!
//! # Core Concept: The Reactor Pattern
//!
//! The trainer itself never sleeps and never reads input. Everything that
//! happens "outside" a run is intercepted here:
//! - Time (`now()`, `sleep()`) drives the once-per-second tick
//! - Input (`next_event()`) delivers choice selections and abandonment
//!
//! # Example
//!
//! ```ignore
//! use medic_env::{DrillClock, InputSource, InputEvent};
//!
//! async fn drill_loop<Clk: DrillClock, In: InputSource>(clock: &Clk, input: &In) {
//!     loop {
//!         tokio::select! {
//!             event = input.next_event() => handle(event),
//!             _ = clock.sleep(Duration::from_secs(1)) => tick(),
//!         }
//!     }
//! }
//! ```

mod clock;
mod input;
mod types;
mod error;
mod tokio_impl;

pub use clock::DrillClock;
pub use input::{InputSource, InputEvent, parse_line};
pub use types::{TraineeId, RunId};
pub use error::EnvError;
pub use tokio_impl::{TokioClock, StdinInput};
