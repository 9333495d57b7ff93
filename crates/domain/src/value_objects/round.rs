//! Encounter position snapshots

use serde::{Deserialize, Serialize};

use crate::ids::TokenId;

/// Where the encounter stood at one moment: round, turn, and whose turn it was.
///
/// All fields are `None` before the encounter starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub round: Option<u32>,
    pub turn: Option<usize>,
    pub token_id: Option<TokenId>,
}

impl Round {
    pub fn new(round: Option<u32>, turn: Option<usize>, token_id: Option<TokenId>) -> Self {
        Self {
            round,
            turn,
            token_id,
        }
    }
}

/// Two-slot record of the current and previous positions.
///
/// Only one step back is ever compared, so this is not a history log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundHistory {
    current: Round,
    previous: Round,
}

impl RoundHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Round {
        &self.current
    }

    pub fn previous(&self) -> &Round {
        &self.previous
    }

    /// Shift `current` into `previous` and store `next` as current.
    pub fn record(&mut self, next: Round) {
        self.previous = std::mem::replace(&mut self.current, next);
    }

    /// Whether the active combatant changed in the last recorded step.
    pub fn active_changed(&self) -> bool {
        self.current.token_id != self.previous.token_id
    }
}
