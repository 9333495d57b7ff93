//! Snapshots of host state consumed while preparing combatants.
//!
//! The host owns scenes, tokens, actors, users and their permissions. The
//! domain only sees read-only snapshots of them, bundled with the combat
//! settings into an [`EncounterContext`] that is passed to every operation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, SceneId, TokenId, UserId};
use crate::value_objects::CombatSettings;

/// Permission level a user holds on an actor, lowest to highest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PermissionLevel {
    #[default]
    None,
    Limited,
    Observer,
    Owner,
}

/// A user connected to the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub is_gm: bool,
}

impl User {
    pub fn player(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_gm: false,
        }
    }

    pub fn gm(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_gm: true,
        }
    }
}

/// Read-only view of an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub name: String,
    #[serde(default)]
    pub img: Option<String>,
    /// Explicit per-user levels; users not listed get `default_permission`
    #[serde(default)]
    pub permissions: HashMap<UserId, PermissionLevel>,
    #[serde(default)]
    pub default_permission: PermissionLevel,
    /// System data (hit points, attributes, ...)
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ActorSnapshot {
    pub fn new(id: impl Into<ActorId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            img: None,
            permissions: HashMap::new(),
            default_permission: PermissionLevel::None,
            data: serde_json::Value::Null,
        }
    }

    pub fn with_owner(mut self, user_id: impl Into<UserId>) -> Self {
        self.permissions.insert(user_id.into(), PermissionLevel::Owner);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// GMs implicitly own every actor.
    pub fn permission_for(&self, user: &User) -> PermissionLevel {
        if user.is_gm {
            return PermissionLevel::Owner;
        }
        self.permissions
            .get(&user.id)
            .copied()
            .unwrap_or(self.default_permission)
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        self.permission_for(user) == PermissionLevel::Owner
    }
}

/// Read-only view of a token placed in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub id: TokenId,
    pub name: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub actor_id: Option<ActorId>,
    /// Per-token overrides of actor data (unlinked tokens)
    #[serde(default)]
    pub actor_data: Option<serde_json::Value>,
}

impl TokenSnapshot {
    pub fn new(id: impl Into<TokenId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            img: None,
            actor_id: None,
            actor_data: None,
        }
    }

    pub fn with_actor(mut self, actor_id: impl Into<ActorId>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }
}

/// The scene an encounter takes place in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneView {
    pub id: SceneId,
    #[serde(default)]
    pub tokens: HashMap<TokenId, TokenSnapshot>,
    #[serde(default)]
    pub actors: HashMap<ActorId, ActorSnapshot>,
}

impl SceneView {
    pub fn new(id: SceneId) -> Self {
        Self {
            id,
            tokens: HashMap::new(),
            actors: HashMap::new(),
        }
    }

    pub fn with_token(mut self, token: TokenSnapshot) -> Self {
        self.tokens.insert(token.id.clone(), token);
        self
    }

    pub fn with_actor(mut self, actor: ActorSnapshot) -> Self {
        self.actors.insert(actor.id.clone(), actor);
        self
    }

    pub fn token(&self, id: &TokenId) -> Option<&TokenSnapshot> {
        self.tokens.get(id)
    }

    /// The actor a token represents, if it has one.
    pub fn actor_for(&self, token: &TokenSnapshot) -> Option<&ActorSnapshot> {
        token.actor_id.as_ref().and_then(|id| self.actors.get(id))
    }
}

/// Everything an operation needs to know about the world outside the combat.
#[derive(Debug, Clone, Copy)]
pub struct EncounterContext<'a> {
    pub scene: &'a SceneView,
    /// Users eligible to own combatants (GMs are ignored)
    pub players: &'a [User],
    /// The user on whose behalf the turn order is prepared
    pub viewer: &'a User,
    pub settings: &'a CombatSettings,
}

impl<'a> EncounterContext<'a> {
    pub fn new(
        scene: &'a SceneView,
        players: &'a [User],
        viewer: &'a User,
        settings: &'a CombatSettings,
    ) -> Self {
        Self {
            scene,
            players,
            viewer,
            settings,
        }
    }
}
