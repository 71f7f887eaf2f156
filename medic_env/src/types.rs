//! Common identifier types for the drill environment.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn seeded_uuid(seed: u64) -> Uuid {
    let mut bytes = [0u8; 16];
    bytes[0..8].copy_from_slice(&seed.to_le_bytes());
    bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
    Uuid::from_bytes(bytes)
}

/// Identifies the person (or scripted trainee) taking a drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraineeId(pub Uuid);

impl TraineeId {
    /// Creates a new random TraineeId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic TraineeId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        Self(seeded_uuid(seed))
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TraineeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraineeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Identifies a single attempt at a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Creates a new random RunId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic RunId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        Self(seeded_uuid(seed))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_ids_are_deterministic() {
        assert_eq!(TraineeId::from_seed(7), TraineeId::from_seed(7));
        assert_ne!(TraineeId::from_seed(7), TraineeId::from_seed(8));
        assert_eq!(RunId::from_seed(7).0, TraineeId::from_seed(7).0);
    }

    #[test]
    fn test_display_is_short() {
        assert_eq!(RunId::new().to_string().len(), 8);
    }
}
