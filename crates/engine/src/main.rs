//! Turnwright Engine - runs a scripted encounter against in-memory adapters.

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turnwright_domain::{ActorSnapshot, NewCombatant, SceneId, SceneView, TokenSnapshot, User};
use turnwright_engine::infrastructure::config::EngineConfig;
use turnwright_engine::infrastructure::memory::{
    StaticSceneProvider, StaticUserDirectory, TracingChatLog,
};
use turnwright_engine::use_cases::{EndCombatResult, RollOptions};
use turnwright_engine::{App, AppPorts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnwright_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Turnwright Engine");

    let config = EngineConfig::from_env()?;
    tracing::info!(
        formula = config.initiative_formula.as_str(),
        resource = ?config.settings.resource,
        skip_defeated = config.settings.skip_defeated,
        roll_mode = %config.roll_mode,
        "Loaded configuration"
    );

    let scene = demo_scene();
    let scene_id = scene.id;
    let scenes = Arc::new(StaticSceneProvider::new());
    scenes.put(scene).await;

    let gm = User::gm("gm", "Game Master");
    let players = vec![gm.clone(), User::player("alice", "Alice")];
    let users = Arc::new(StaticUserDirectory::new(players, gm));
    let chat = Arc::new(TracingChatLog::new());

    let app = App::new(&config, AppPorts::in_memory(scenes, users, chat));
    let combat = &app.use_cases.combat;

    let encounter = combat.lifecycle.create_encounter(scene_id).await?;
    let combat_id = encounter.id();

    combat
        .combatants
        .create(
            combat_id,
            vec![
                NewCombatant::for_token("tok-fighter"),
                NewCombatant::for_token("tok-goblin-1"),
                NewCombatant::for_token("tok-goblin-2").hidden(),
            ],
        )
        .await?;

    let rolled = combat
        .initiative
        .roll_all(combat_id, RollOptions::default(), CancellationToken::new())
        .await?;
    if let Some(error) = rolled.evaluation_error() {
        tracing::warn!(error = %error, "Some initiative rolls failed");
    }
    for combatant in rolled.combat.turns() {
        tracing::info!(
            name = %combatant.name,
            initiative = ?combatant.initiative,
            "Turn order"
        );
    }

    combat.lifecycle.start_combat(combat_id).await?;
    let turns = rolled.combat.turns().len().max(1);
    for _ in 0..turns {
        combat.lifecycle.next_turn(combat_id).await?;
    }

    match combat.lifecycle.end_combat(combat_id).await? {
        EndCombatResult::Ended(_) => tracing::info!("Encounter finished"),
        EndCombatResult::Declined => tracing::info!("Encounter left running"),
    }

    Ok(())
}

fn demo_scene() -> SceneView {
    SceneView::new(SceneId::new())
        .with_actor(
            ActorSnapshot::new("fighter", "Brienne")
                .with_owner("alice")
                .with_data(json!({"attributes": {"hp": {"value": 24}}})),
        )
        .with_actor(
            ActorSnapshot::new("goblin", "Goblin")
                .with_data(json!({"attributes": {"hp": {"value": 7}}})),
        )
        .with_token(TokenSnapshot::new("tok-fighter", "Brienne").with_actor("fighter"))
        .with_token(TokenSnapshot::new("tok-goblin-1", "Goblin Scout").with_actor("goblin"))
        .with_token(TokenSnapshot::new("tok-goblin-2", "Goblin Archer").with_actor("goblin"))
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
