//! Combat entity module.
//!
//! Loads and stores encounters, and gathers the scene and user context every
//! turn-order rebuild needs.

use std::sync::Arc;

use turnwright_domain::{Combat, CombatId, CombatSettings, EncounterContext, SceneId, SceneView, User};

use crate::infrastructure::ports::{CombatRepo, RepoError, SceneProvider, UserDirectory};

/// Owned inputs for an [`EncounterContext`].
#[derive(Debug, Clone)]
pub struct EncounterInputs {
    pub scene: SceneView,
    pub players: Vec<User>,
    pub viewer: User,
    pub settings: CombatSettings,
}

impl EncounterInputs {
    pub fn ctx(&self) -> EncounterContext<'_> {
        EncounterContext::new(&self.scene, &self.players, &self.viewer, &self.settings)
    }
}

/// Encounter entity - storage and context lookup for combats.
pub struct Encounters {
    repo: Arc<dyn CombatRepo>,
    scenes: Arc<dyn SceneProvider>,
    users: Arc<dyn UserDirectory>,
    settings: CombatSettings,
}

impl Encounters {
    pub fn new(
        repo: Arc<dyn CombatRepo>,
        scenes: Arc<dyn SceneProvider>,
        users: Arc<dyn UserDirectory>,
        settings: CombatSettings,
    ) -> Self {
        Self {
            repo,
            scenes,
            users,
            settings,
        }
    }

    pub fn settings(&self) -> &CombatSettings {
        &self.settings
    }

    pub async fn get(&self, id: CombatId) -> Result<Option<Combat>, RepoError> {
        self.repo.get(id).await
    }

    pub async fn save(&self, combat: &Combat) -> Result<(), RepoError> {
        self.repo.save(combat).await
    }

    pub async fn delete(&self, id: CombatId) -> Result<(), RepoError> {
        self.repo.delete(id).await
    }

    pub async fn list_in_scene(&self, scene_id: SceneId) -> Result<Vec<Combat>, RepoError> {
        self.repo.list_in_scene(scene_id).await
    }

    /// Fetch the scene, users, and settings for one scene.
    pub async fn inputs(&self, scene_id: SceneId) -> Result<EncounterInputs, RepoError> {
        let scene = self.scenes.scene(scene_id).await?;
        let players = self.users.players().await?;
        let viewer = self.users.viewer().await?;
        Ok(EncounterInputs {
            scene,
            players,
            viewer,
            settings: self.settings.clone(),
        })
    }
}
