//! Trainee input abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::EnvError;
use crate::types::TraineeId;

/// A single action delivered by the presentation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Select the choice at this 0-based index of the current decision point
    Choose(usize),

    /// Leave the run and return to the scenario list
    Abandon,
}

/// Source of trainee actions.
///
/// # Implementations
///
/// - **Production**: `StdinInput` - numbered answers typed at a terminal
/// - **Simulation**: scripted trainees in `medic_sim`
///
/// # Event Flow
///
/// ```text
/// Trainee                 InputSource               DrillSession
///   |                         |                          |
///   |-- types "2" ----------->|                          |
///   |                         |-- Choose(1) ------------>|
///   |                         |                          |-- Trainer::choose
/// ```
#[async_trait]
pub trait InputSource: Send + Sync + 'static {
    /// Waits for the next trainee action.
    ///
    /// # Returns
    /// * `Ok(Some(event))` - The trainee acted
    /// * `Ok(None)` - Input was closed (end of stream, window closed)
    /// * `Err(_)` - Reading input failed
    async fn next_event(&self) -> Result<Option<InputEvent>, EnvError>;

    /// Returns the trainee this input belongs to, for run logs.
    fn trainee(&self) -> TraineeId;
}

/// Parses one line of terminal input.
///
/// Choices are shown 1-based, so `"1"` maps to `Choose(0)`.
pub fn parse_line(line: &str) -> Result<InputEvent, EnvError> {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "q" | "quit" | "exit" => return Ok(InputEvent::Abandon),
        _ => {}
    }

    let number: usize = trimmed
        .parse()
        .map_err(|_| EnvError::parse(format!("expected a choice number, got {:?}", trimmed)))?;

    if number == 0 {
        return Err(EnvError::parse("choices are numbered from 1"));
    }

    Ok(InputEvent::Choose(number - 1))
}
