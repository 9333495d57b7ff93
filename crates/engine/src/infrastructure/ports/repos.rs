//! Repository and context provider ports.

use async_trait::async_trait;
use turnwright_domain::{Combat, CombatId, SceneId, SceneView, User};

use super::RepoError;

// =============================================================================
// Combat Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CombatRepo: Send + Sync {
    async fn get(&self, id: CombatId) -> Result<Option<Combat>, RepoError>;
    async fn save(&self, combat: &Combat) -> Result<(), RepoError>;
    async fn delete(&self, id: CombatId) -> Result<(), RepoError>;
    async fn list_in_scene(&self, scene_id: SceneId) -> Result<Vec<Combat>, RepoError>;
}

// =============================================================================
// Encounter Context
// =============================================================================

/// Tokens and actors placed on a scene.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SceneProvider: Send + Sync {
    async fn scene(&self, scene_id: SceneId) -> Result<SceneView, RepoError>;
}

/// Who is playing and who is looking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every user connected to the game, GMs included.
    async fn players(&self) -> Result<Vec<User>, RepoError>;
    /// The user the turn order is prepared for.
    async fn viewer(&self) -> Result<User, RepoError>;
}
