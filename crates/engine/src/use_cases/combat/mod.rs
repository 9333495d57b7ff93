//! Combat use cases.
//!
//! Handles the encounter lifecycle:
//! - Creating and activating encounters on a scene
//! - Starting, advancing, rewinding, and ending combat
//! - Adding, updating, and removing combatants
//! - Rolling and setting initiative
//!
//! Every mutation on one combat runs under that combat's lock, persists the
//! result, then plays the turn cue if the active combatant changed.

mod combatants;
mod initiative;
mod lifecycle;
mod locks;
mod notify;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use turnwright_domain::{Combat, CombatId, DomainError, EncounterContext, ErrorKind, Round};

use crate::entities::{EncounterInputs, Encounters};
use crate::infrastructure::ports::{PromptError, RepoError};

pub use combatants::CombatantOps;
pub use initiative::{
    RollFailure, RollInitiative, RollInitiativeResult, RollOptions, RolledInitiative,
};
pub use lifecycle::{CombatLifecycle, EndCombatResult};
pub use locks::CombatLocks;
pub use notify::TurnAnnouncer;

/// Container for combat use cases.
pub struct CombatUseCases {
    pub lifecycle: Arc<CombatLifecycle>,
    pub combatants: Arc<CombatantOps>,
    pub initiative: Arc<RollInitiative>,
}

impl CombatUseCases {
    pub fn new(
        lifecycle: Arc<CombatLifecycle>,
        combatants: Arc<CombatantOps>,
        initiative: Arc<RollInitiative>,
    ) -> Self {
        Self {
            lifecycle,
            combatants,
            initiative,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    #[error("Combat not found: {0}")]
    CombatNotFound(CombatId),
    #[error("Initiative roll cancelled")]
    Cancelled,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

impl CombatError {
    /// Taxonomy kind for domain-level failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::CombatNotFound(_) => Some(ErrorKind::NotFound),
            Self::Domain(e) => Some(e.kind()),
            Self::Repo(e) if e.is_not_found() => Some(ErrorKind::NotFound),
            _ => None,
        }
    }
}

// =============================================================================
// Locked load / save
// =============================================================================

/// A combat loaded under its lock, with the context to mutate it.
pub(crate) struct CombatSession {
    pub combat: Combat,
    pub inputs: EncounterInputs,
    before: (Round, Round),
    _guard: OwnedMutexGuard<()>,
}

impl CombatSession {
    /// Whether a position snapshot was recorded since the session opened.
    fn recorded(&self) -> bool {
        self.before.0 != *self.combat.current() || self.before.1 != *self.combat.previous()
    }
}

/// Shared load, lock, save, and announce plumbing for the combat use cases.
pub(crate) struct CombatWriter {
    encounters: Arc<Encounters>,
    locks: Arc<CombatLocks>,
    announcer: Arc<TurnAnnouncer>,
}

impl CombatWriter {
    pub fn new(
        encounters: Arc<Encounters>,
        locks: Arc<CombatLocks>,
        announcer: Arc<TurnAnnouncer>,
    ) -> Self {
        Self {
            encounters,
            locks,
            announcer,
        }
    }

    pub fn encounters(&self) -> &Arc<Encounters> {
        &self.encounters
    }

    pub fn locks(&self) -> &Arc<CombatLocks> {
        &self.locks
    }

    /// Lock and load a combat with its scene context.
    pub async fn open(&self, combat_id: CombatId) -> Result<CombatSession, CombatError> {
        let guard = self.locks.acquire(combat_id).await;
        let combat = self
            .encounters
            .get(combat_id)
            .await?
            .ok_or(CombatError::CombatNotFound(combat_id))?;
        let inputs = self.encounters.inputs(combat.scene_id()).await?;
        Ok(CombatSession {
            before: (combat.current().clone(), combat.previous().clone()),
            combat,
            inputs,
            _guard: guard,
        })
    }

    /// Persist the session, then announce the turn if the active combatant changed.
    pub async fn commit(&self, mut session: CombatSession) -> Result<Combat, CombatError> {
        self.encounters.save(&session.combat).await?;
        if session.recorded() {
            self.announcer.on_combat_updated(&mut session.combat).await;
        }
        Ok(session.combat)
    }

    /// Open, apply `f`, and commit.
    pub async fn mutate<T, F>(
        &self,
        combat_id: CombatId,
        f: F,
    ) -> Result<(Combat, T), CombatError>
    where
        F: FnOnce(&mut Combat, &EncounterContext<'_>) -> Result<T, DomainError>,
    {
        let mut session = self.open(combat_id).await?;
        let outcome = f(&mut session.combat, &session.inputs.ctx())?;
        let combat = self.commit(session).await?;
        Ok((combat, outcome))
    }
}
