//! In-process adapters for running the engine without a host.
//!
//! Every adapter here is a complete implementation of its port; the demo
//! binary composes the whole application from them.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use turnwright_domain::{Combat, CombatId, SceneId, SceneView, TokenId, User};

use crate::infrastructure::ports::{
    ChatLog, ChatMessage, CombatRepo, ConfirmationPrompt, NotifyError, PromptError, RepoError,
    SceneProvider, TurnNotifier, UserDirectory,
};

// =============================================================================
// Combat Storage
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryCombatRepo {
    combats: RwLock<HashMap<CombatId, Combat>>,
}

impl InMemoryCombatRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CombatRepo for InMemoryCombatRepo {
    async fn get(&self, id: CombatId) -> Result<Option<Combat>, RepoError> {
        Ok(self.combats.read().await.get(&id).cloned())
    }

    async fn save(&self, combat: &Combat) -> Result<(), RepoError> {
        self.combats
            .write()
            .await
            .insert(combat.id(), combat.clone());
        Ok(())
    }

    async fn delete(&self, id: CombatId) -> Result<(), RepoError> {
        self.combats
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepoError::not_found("Combat", id))
    }

    async fn list_in_scene(&self, scene_id: SceneId) -> Result<Vec<Combat>, RepoError> {
        Ok(self
            .combats
            .read()
            .await
            .values()
            .filter(|c| c.scene_id() == scene_id)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Encounter Context
// =============================================================================

#[derive(Debug, Default)]
pub struct StaticSceneProvider {
    scenes: RwLock<HashMap<SceneId, SceneView>>,
}

impl StaticSceneProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a scene.
    pub async fn put(&self, scene: SceneView) {
        self.scenes.write().await.insert(scene.id, scene);
    }
}

#[async_trait]
impl SceneProvider for StaticSceneProvider {
    async fn scene(&self, scene_id: SceneId) -> Result<SceneView, RepoError> {
        self.scenes
            .read()
            .await
            .get(&scene_id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("Scene", scene_id))
    }
}

#[derive(Debug, Clone)]
pub struct StaticUserDirectory {
    players: Vec<User>,
    viewer: User,
}

impl StaticUserDirectory {
    pub fn new(players: Vec<User>, viewer: User) -> Self {
        Self { players, viewer }
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn players(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.players.clone())
    }

    async fn viewer(&self) -> Result<User, RepoError> {
        Ok(self.viewer.clone())
    }
}

// =============================================================================
// Prompts, Chat, Notifications
// =============================================================================

/// Answers every prompt with the same response.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl ConfirmationPrompt for AutoConfirm {
    async fn confirm(&self, title: &str, _body: &str) -> Result<bool, PromptError> {
        tracing::debug!(title, answer = self.0, "Auto-answered confirmation prompt");
        Ok(self.0)
    }
}

/// Writes chat messages to the log and keeps them for inspection.
#[derive(Debug, Default)]
pub struct TracingChatLog {
    messages: RwLock<Vec<ChatMessage>>,
}

impl TracingChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl ChatLog for TracingChatLog {
    async fn post(&self, message: ChatMessage) -> Result<(), NotifyError> {
        tracing::info!(
            speaker = %message.speaker,
            roll_mode = %message.roll_mode,
            sound = message.play_sound,
            "{} {}",
            message.flavor,
            message.breakdown
        );
        self.messages.write().await.push(message);
        Ok(())
    }
}

/// Logs the turn cue instead of playing a sound.
#[derive(Debug, Default)]
pub struct TracingTurnNotifier;

#[async_trait]
impl TurnNotifier for TracingTurnNotifier {
    async fn announce_turn(
        &self,
        combat_id: CombatId,
        token_id: &TokenId,
    ) -> Result<(), NotifyError> {
        tracing::info!(combat_id = %combat_id, token_id = %token_id, "Turn cue");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn combat_repo_lists_by_scene() {
        let repo = InMemoryCombatRepo::new();
        let scene = SceneId::new();
        let here = Combat::new(scene);
        let elsewhere = Combat::new(SceneId::new());
        repo.save(&here).await.unwrap();
        repo.save(&elsewhere).await.unwrap();

        let listed = repo.list_in_scene(scene).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), here.id());
    }

    #[tokio::test]
    async fn deleting_missing_combat_is_not_found() {
        let repo = InMemoryCombatRepo::new();
        let err = repo.delete(CombatId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unknown_scene_is_not_found() {
        let provider = StaticSceneProvider::new();
        assert!(provider.scene(SceneId::new()).await.unwrap_err().is_not_found());
    }
}
