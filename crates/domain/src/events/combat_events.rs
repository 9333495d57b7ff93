//! Combat-related domain events
//!
//! These types communicate what happened when the combat aggregate was
//! mutated, allowing callers to log, persist, and notify appropriately.

use serde::{Deserialize, Serialize};

use crate::ids::{CombatantId, TokenId};
use crate::value_objects::Round;

/// Which operation moved the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CombatTransition {
    Started,
    NextTurn,
    PreviousTurn,
    NextRound,
    PreviousRound,
    InitiativeReset,
    InitiativeUpdated,
    RosterChanged,
    Ended,
}

/// Position before and after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnChange {
    pub transition: CombatTransition,
    pub previous: Round,
    pub current: Round,
}

impl TurnChange {
    /// A different combatant now holds the turn.
    pub fn is_significant(&self) -> bool {
        self.current.token_id != self.previous.token_id
    }

    pub fn round_changed(&self) -> bool {
        self.current.round != self.previous.round
    }

    pub fn active_token(&self) -> Option<&TokenId> {
        self.current.token_id.as_ref()
    }
}

/// Result of adding, updating, or removing combatants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterUpdate {
    /// Combatants created, updated, or deleted
    pub ids: Vec<CombatantId>,
    /// Position change, recorded only once the encounter has started
    pub change: Option<TurnChange>,
}
