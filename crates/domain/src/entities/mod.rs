//! Combat entities and the host snapshots they are prepared against

mod combatant;
mod encounter;

pub use combatant::{
    Combatant, CombatantSource, CombatantUpdate, NewCombatant, DEFAULT_TOKEN_IMG,
    UNKNOWN_COMBATANT_NAME,
};
pub use encounter::{
    ActorSnapshot, EncounterContext, PermissionLevel, SceneView, TokenSnapshot, User,
};
