//! Turn-order domain for tabletop combat encounters
//!
//! Pure types and rules: no I/O, no async, no clocks. Randomness is passed in
//! as a closure wherever dice are rolled.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod initiative;
pub mod turn_order;
pub mod value_objects;

pub use aggregates::Combat;

pub use entities::{
    ActorSnapshot, Combatant, CombatantSource, CombatantUpdate, EncounterContext, NewCombatant,
    PermissionLevel, SceneView, TokenSnapshot, User, DEFAULT_TOKEN_IMG, UNKNOWN_COMBATANT_NAME,
};

pub use error::{DomainError, ErrorKind};
pub use events::{CombatTransition, RosterUpdate, TurnChange};

pub use ids::{ActorId, CombatId, CombatantId, SceneId, TokenId, UserId};

pub use initiative::{InitiativeFormula, SystemDefaultFormula, DEFAULT_INITIATIVE_FORMULA};
pub use turn_order::{compare_names, CombatantComparator, InitiativeOrder, TurnOrderBuilder};

pub use value_objects::{
    CombatSettings, DiceFormula, DiceParseError, DiceRollResult, Round, RoundHistory,
};
