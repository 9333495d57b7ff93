//! Shared fixtures for combat use case tests.

use std::sync::Arc;

use turnwright_domain::{
    Combat, CombatSettings, NewCombatant, SceneId, SceneView, TokenSnapshot, User,
};

use super::{CombatLocks, CombatWriter, TurnAnnouncer};
use crate::entities::{EncounterInputs, Encounters};
use crate::infrastructure::memory::{
    InMemoryCombatRepo, StaticSceneProvider, StaticUserDirectory, TracingTurnNotifier,
};
use crate::infrastructure::ports::{CombatRepo, TurnNotifier};

/// A scene whose token names equal their ids, viewed by a GM.
pub struct Table {
    pub inputs: EncounterInputs,
}

impl Table {
    pub fn new(tokens: &[&str]) -> Self {
        let scene = tokens.iter().fold(SceneView::new(SceneId::new()), |scene, t| {
            scene.with_token(TokenSnapshot::new(*t, *t))
        });
        Self::with_scene(scene)
    }

    pub fn with_scene(scene: SceneView) -> Self {
        let gm = User::gm("gm", "Game Master");
        Self {
            inputs: EncounterInputs {
                scene,
                players: vec![gm.clone()],
                viewer: gm,
                settings: CombatSettings::default(),
            },
        }
    }

    pub fn scene_id(&self) -> SceneId {
        self.inputs.scene.id
    }

    /// A combat on this scene holding `combatants`.
    pub fn combat(&self, combatants: Vec<NewCombatant>) -> Combat {
        let mut combat = Combat::new(self.scene_id());
        combat
            .create_combatants(combatants, &self.inputs.ctx())
            .expect("fixture combatants are valid");
        combat
    }

    async fn encounters(&self, repo: Arc<dyn CombatRepo>) -> Arc<Encounters> {
        let scenes = StaticSceneProvider::new();
        scenes.put(self.inputs.scene.clone()).await;
        let users = StaticUserDirectory::new(self.inputs.players.clone(), self.inputs.viewer.clone());
        Arc::new(Encounters::new(
            repo,
            Arc::new(scenes),
            Arc::new(users),
            self.inputs.settings.clone(),
        ))
    }

    /// Writer over `repo` with a silent notifier.
    pub async fn writer(&self, repo: Arc<dyn CombatRepo>) -> Arc<CombatWriter> {
        self.writer_with_notifier(repo, Arc::new(TracingTurnNotifier)).await
    }

    pub async fn writer_with_notifier(
        &self,
        repo: Arc<dyn CombatRepo>,
        notifier: Arc<dyn TurnNotifier>,
    ) -> Arc<CombatWriter> {
        Arc::new(CombatWriter::new(
            self.encounters(repo).await,
            Arc::new(CombatLocks::new()),
            Arc::new(TurnAnnouncer::new(notifier)),
        ))
    }

    /// In-memory repo seeded with `combat`.
    pub async fn repo_with(&self, combat: &Combat) -> Arc<InMemoryCombatRepo> {
        let repo = Arc::new(InMemoryCombatRepo::new());
        repo.save(combat).await.expect("in-memory save");
        repo
    }
}
