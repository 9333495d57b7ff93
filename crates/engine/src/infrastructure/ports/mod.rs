//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Combat storage (could swap the in-memory map for a database)
//! - Scene and user context supplied by the host
//! - Dice evaluation, chat, prompts, and turn sounds
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Errors
// =============================================================================
pub use error::{EvaluationError, NotifyError, PromptError, RepoError};

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{CombatRepo, SceneProvider, UserDirectory};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ChatLog, ChatMessage, ConfirmationPrompt, DiceEvaluator, InitiativeRoll, MessageOptions,
    RollMode, TurnNotifier,
};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockCombatRepo, MockSceneProvider, MockUserDirectory};

#[cfg(test)]
pub use external::{
    MockChatLog, MockConfirmationPrompt, MockDiceEvaluator, MockTurnNotifier,
};

#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};
