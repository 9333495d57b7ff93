//! Combatant records
//!
//! A [`CombatantSource`] is what the combat stores. A [`Combatant`] is the
//! prepared form shown in the turn order: token and actor references resolved,
//! ownership and visibility computed for the viewing user, and the tracked
//! resource surfaced.

use serde::{Deserialize, Serialize};

use crate::entities::encounter::{EncounterContext, PermissionLevel};
use crate::ids::{ActorId, CombatantId, TokenId, UserId};
use crate::value_objects::CombatSettings;

/// Fallback name when neither combatant, token, nor actor supply one.
pub const UNKNOWN_COMBATANT_NAME: &str = "Unknown Combatant";

/// Fallback thumbnail.
pub const DEFAULT_TOKEN_IMG: &str = "icons/svg/mystery-man.svg";

/// Stored combatant data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantSource {
    pub id: CombatantId,
    pub token_id: TokenId,
    #[serde(default)]
    pub actor_id: Option<ActorId>,
    /// Name override; the token or actor name is used when absent
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
    /// `None` until initiative is rolled or set
    #[serde(default)]
    pub initiative: Option<f64>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub defeated: bool,
}

impl CombatantSource {
    pub fn new(token_id: impl Into<TokenId>) -> Self {
        Self {
            id: CombatantId::new(),
            token_id: token_id.into(),
            actor_id: None,
            name: None,
            img: None,
            initiative: None,
            hidden: false,
            defeated: false,
        }
    }

    pub fn has_rolled(&self) -> bool {
        self.initiative.is_some()
    }
}

/// Payload for creating a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCombatant {
    pub token_id: TokenId,
    #[serde(default)]
    pub actor_id: Option<ActorId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub initiative: Option<f64>,
    #[serde(default)]
    pub hidden: bool,
}

impl NewCombatant {
    pub fn for_token(token_id: impl Into<TokenId>) -> Self {
        Self {
            token_id: token_id.into(),
            actor_id: None,
            name: None,
            img: None,
            initiative: None,
            hidden: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_initiative(mut self, initiative: f64) -> Self {
        self.initiative = Some(initiative);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub(crate) fn into_source(self) -> CombatantSource {
        CombatantSource {
            id: CombatantId::new(),
            token_id: self.token_id,
            actor_id: self.actor_id,
            name: self.name,
            img: self.img,
            initiative: self.initiative,
            hidden: self.hidden,
            defeated: false,
        }
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
    /// `Some(None)` clears a rolled initiative
    #[serde(default)]
    pub initiative: Option<Option<f64>>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub defeated: Option<bool>,
}

impl CombatantUpdate {
    pub fn touches_initiative(&self) -> bool {
        self.initiative.is_some()
    }

    pub(crate) fn apply_to(self, source: &mut CombatantSource) {
        if let Some(name) = self.name {
            source.name = Some(name);
        }
        if let Some(img) = self.img {
            source.img = Some(img);
        }
        if let Some(initiative) = self.initiative {
            source.initiative = initiative;
        }
        if let Some(hidden) = self.hidden {
            source.hidden = hidden;
        }
        if let Some(defeated) = self.defeated {
            source.defeated = defeated;
        }
    }
}

/// A combatant prepared for display in the turn order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub id: CombatantId,
    pub token_id: TokenId,
    pub actor_id: Option<ActorId>,
    pub name: String,
    pub img: String,
    pub initiative: Option<f64>,
    pub hidden: bool,
    pub defeated: bool,
    /// Viewer's permission on the actor
    pub permission: PermissionLevel,
    /// Non-GM users owning the actor
    pub players: Vec<UserId>,
    /// Viewer is a GM or owns the actor
    pub owner: bool,
    pub visible: bool,
    /// Tracked resource value, when configured and present
    pub resource: Option<f64>,
}

impl Combatant {
    /// Prepare a stored record for the turn order.
    ///
    /// Returns `None` when the combatant's token is not in the scene.
    pub fn prepare(source: &CombatantSource, ctx: &EncounterContext<'_>) -> Option<Self> {
        let token = ctx.scene.token(&source.token_id)?;
        let actor = source
            .actor_id
            .as_ref()
            .and_then(|id| ctx.scene.actors.get(id))
            .or_else(|| ctx.scene.actor_for(token));

        let name = source
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| Some(token.name.clone()).filter(|n| !n.is_empty()))
            .or_else(|| actor.map(|a| a.name.clone()).filter(|n| !n.is_empty()))
            .unwrap_or_else(|| UNKNOWN_COMBATANT_NAME.to_string());

        let img = source
            .img
            .clone()
            .or_else(|| token.img.clone())
            .or_else(|| actor.and_then(|a| a.img.clone()))
            .unwrap_or_else(|| DEFAULT_TOKEN_IMG.to_string());

        let permission = actor
            .map(|a| a.permission_for(ctx.viewer))
            .unwrap_or_default();

        let players = actor
            .map(|a| {
                ctx.players
                    .iter()
                    .filter(|u| !u.is_gm && a.is_owned_by(u))
                    .map(|u| u.id.clone())
                    .collect()
            })
            .unwrap_or_default();

        let owner = ctx.viewer.is_gm || actor.is_some_and(|a| a.is_owned_by(ctx.viewer));

        let resource = actor.and_then(|a| {
            token
                .actor_data
                .as_ref()
                .and_then(|data| lookup_resource(data, ctx.settings))
                .or_else(|| lookup_resource(&a.data, ctx.settings))
        });

        Some(Self {
            id: source.id,
            token_id: source.token_id.clone(),
            actor_id: actor.map(|a| a.id.clone()),
            name,
            img,
            initiative: source.initiative.filter(|v| v.is_finite()),
            hidden: source.hidden,
            defeated: source.defeated,
            permission,
            players,
            owner,
            visible: owner || !source.hidden,
            resource,
        })
    }

    pub fn has_rolled(&self) -> bool {
        self.initiative.is_some()
    }

    /// No human player owns this combatant.
    pub fn is_npc(&self) -> bool {
        self.players.is_empty()
    }

    /// Defeated by flag, or by a tracked resource at or below zero.
    pub fn is_defeated(&self) -> bool {
        self.defeated || self.resource.is_some_and(|value| value <= 0.0)
    }
}

fn lookup_resource(data: &serde_json::Value, settings: &CombatSettings) -> Option<f64> {
    let mut node = data;
    for segment in settings.resource_path()? {
        node = node.get(segment)?;
    }
    match node {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
