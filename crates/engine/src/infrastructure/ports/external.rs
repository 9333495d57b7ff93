//! External service ports: dice, chat, prompts, and turn sounds.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use turnwright_domain::{CombatId, Combatant, CombatantId, TokenId};

use super::{EvaluationError, NotifyError, PromptError};

// =============================================================================
// Dice
// =============================================================================

/// An evaluated initiative roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeRoll {
    pub total: f64,
    /// Human readable rendering, e.g. `1d20[14] + 2 = 16`
    pub breakdown: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiceEvaluator: Send + Sync {
    /// Roll `formula` on behalf of `combatant`.
    async fn evaluate(
        &self,
        formula: &str,
        combatant: &Combatant,
    ) -> Result<InitiativeRoll, EvaluationError>;
}

// =============================================================================
// Chat
// =============================================================================

/// Who may see a rolled message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollMode {
    /// Everyone
    #[default]
    Public,
    /// GMs only
    Gm,
    /// GMs only, and the roller does not see the result
    Blind,
    /// Only the roller
    SelfOnly,
}

impl RollMode {
    /// Hidden combatants never roll publicly.
    pub fn for_hidden(self, hidden: bool) -> Self {
        match self {
            Self::Public if hidden => Self::Gm,
            other => other,
        }
    }
}

impl fmt::Display for RollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Public => "public",
            Self::Gm => "gm",
            Self::Blind => "blind",
            Self::SelfOnly => "self",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RollMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" | "roll" => Ok(Self::Public),
            "gm" | "gmroll" => Ok(Self::Gm),
            "blind" | "blindroll" => Ok(Self::Blind),
            "self" | "selfroll" => Ok(Self::SelfOnly),
            other => Err(format!("unknown roll mode '{}'", other)),
        }
    }
}

/// Options applied to every chat message of one roll batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageOptions {
    /// Falls back to the configured default when absent
    #[serde(default)]
    pub roll_mode: Option<RollMode>,
    /// Replaces the default "rolls for Initiative!" line
    #[serde(default)]
    pub flavor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub combatant_id: CombatantId,
    pub token_id: TokenId,
    pub speaker: String,
    pub flavor: String,
    pub breakdown: String,
    pub total: f64,
    pub roll_mode: RollMode,
    /// Only the first message of a batch plays the dice sound
    pub play_sound: bool,
    pub timestamp: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatLog: Send + Sync {
    async fn post(&self, message: ChatMessage) -> Result<(), NotifyError>;
}

// =============================================================================
// Prompts and Notifications
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Ask the acting user to confirm. `Ok(false)` means declined.
    async fn confirm(&self, title: &str, body: &str) -> Result<bool, PromptError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TurnNotifier: Send + Sync {
    /// Play the "your turn" cue for the newly active token.
    async fn announce_turn(&self, combat_id: CombatId, token_id: &TokenId)
        -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_public_rolls_become_gm_rolls() {
        assert_eq!(RollMode::Public.for_hidden(true), RollMode::Gm);
        assert_eq!(RollMode::Public.for_hidden(false), RollMode::Public);
        assert_eq!(RollMode::Blind.for_hidden(true), RollMode::Blind);
    }

    #[test]
    fn roll_mode_parses_short_and_long_names() {
        assert_eq!("gm".parse::<RollMode>(), Ok(RollMode::Gm));
        assert_eq!("blindroll".parse::<RollMode>(), Ok(RollMode::Blind));
        assert_eq!(" Self ".parse::<RollMode>(), Ok(RollMode::SelfOnly));
        assert!("loud".parse::<RollMode>().is_err());
    }
}
