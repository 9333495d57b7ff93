//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.
//! Use cases orchestrate across entity modules to fulfill user stories.

pub mod combat;

pub use combat::{
    CombatError, CombatLifecycle, CombatLocks, CombatUseCases, CombatantOps, EndCombatResult,
    RollInitiative, RollInitiativeResult, RollOptions, TurnAnnouncer,
};
