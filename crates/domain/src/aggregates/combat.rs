//! Combat aggregate - one encounter and its turn order
//!
//! # State machine
//!
//! - **Unstarted**: `round` and `turn` are `None`.
//! - **Active**: `round >= 1`, `turn` indexes into `turns` (or is 0 while `turns` is empty).
//! - Ending the encounter deletes every combatant and returns to Unstarted.
//!
//! The aggregate exclusively owns `turns` and the current/previous position
//! snapshots. Every mutation that can change the order rebuilds `turns` once
//! through its [`TurnOrderBuilder`] and then records a [`TurnChange`].
//!
//! # Example
//!
//! ```
//! use turnwright_domain::{
//!     Combat, CombatSettings, EncounterContext, NewCombatant, SceneId, SceneView,
//!     TokenSnapshot, User,
//! };
//!
//! let scene = SceneView::new(SceneId::new())
//!     .with_token(TokenSnapshot::new("t1", "Fighter"))
//!     .with_token(TokenSnapshot::new("t2", "Wizard"));
//! let gm = User::gm("gm", "Game Master");
//! let settings = CombatSettings::default();
//! let ctx = EncounterContext::new(&scene, &[], &gm, &settings);
//!
//! let mut combat = Combat::new(scene.id);
//! combat
//!     .create_combatants(
//!         vec![
//!             NewCombatant::for_token("t1").with_initiative(12.0),
//!             NewCombatant::for_token("t2").with_initiative(17.0),
//!         ],
//!         &ctx,
//!     )
//!     .unwrap();
//! combat.start_combat(&ctx).unwrap();
//!
//! assert_eq!(combat.combatant().unwrap().name, "Wizard");
//! ```

use std::collections::HashSet;

use crate::entities::{Combatant, CombatantSource, CombatantUpdate, EncounterContext, NewCombatant};
use crate::error::DomainError;
use crate::events::{CombatTransition, RosterUpdate, TurnChange};
use crate::ids::{CombatId, CombatantId, SceneId, TokenId};
use crate::turn_order::TurnOrderBuilder;
use crate::value_objects::{Round, RoundHistory};

/// A combat encounter
///
/// # Invariants
///
/// - Token ids are unique among the combat's combatants
/// - `started()` iff `round >= 1`
/// - While started, `turn < turns.len()` unless `turns` is empty
#[derive(Debug, Clone)]
pub struct Combat {
    // Identity
    id: CombatId,
    scene_id: SceneId,

    /// Whether this is the scene's active encounter
    active: bool,

    // Stored combatants, in creation order
    combatants: Vec<CombatantSource>,

    // Position
    round: Option<u32>,
    turn: Option<usize>,

    // Derived turn order
    turns: Vec<Combatant>,
    history: RoundHistory,

    /// Set while a turn notification is in flight
    sound_playing: bool,

    builder: TurnOrderBuilder,
}

impl Combat {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(scene_id: SceneId) -> Self {
        Self {
            id: CombatId::new(),
            scene_id,
            active: false,
            combatants: Vec::new(),
            round: None,
            turn: None,
            turns: Vec::new(),
            history: RoundHistory::new(),
            sound_playing: false,
            builder: TurnOrderBuilder::default(),
        }
    }

    pub fn with_id(mut self, id: CombatId) -> Self {
        self.id = id;
        self
    }

    /// Install a different ordering policy.
    pub fn with_turn_order(mut self, builder: TurnOrderBuilder) -> Self {
        self.builder = builder;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> CombatId {
        self.id
    }

    #[inline]
    pub fn scene_id(&self) -> SceneId {
        self.scene_id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn round(&self) -> Option<u32> {
        self.round
    }

    #[inline]
    pub fn turn(&self) -> Option<usize> {
        self.turn
    }

    /// The sorted turn order as of the last rebuild.
    #[inline]
    pub fn turns(&self) -> &[Combatant] {
        &self.turns
    }

    /// Stored combatants in creation order.
    #[inline]
    pub fn combatants(&self) -> &[CombatantSource] {
        &self.combatants
    }

    pub fn current(&self) -> &Round {
        self.history.current()
    }

    pub fn previous(&self) -> &Round {
        self.history.previous()
    }

    pub fn started(&self) -> bool {
        self.round.is_some_and(|round| round >= 1)
    }

    /// The combatant whose turn it is.
    pub fn combatant(&self) -> Option<&Combatant> {
        self.turn.and_then(|turn| self.turns.get(turn))
    }

    pub fn get_combatant(&self, id: CombatantId) -> Option<&CombatantSource> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn get_combatant_by_token(&self, token_id: &TokenId) -> Option<&CombatantSource> {
        self.combatants.iter().find(|c| &c.token_id == token_id)
    }

    // =========================================================================
    // Scene activation
    // =========================================================================

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    // =========================================================================
    // Turn order
    // =========================================================================

    /// Rebuild `turns` from the stored combatants.
    ///
    /// Keeps `turn` in range but leaves the recorded position snapshots alone.
    pub fn setup_turns(&mut self, ctx: &EncounterContext<'_>) -> &[Combatant] {
        self.turns = self.builder.build(&self.combatants, ctx);
        self.clamp_turn();
        &self.turns
    }

    fn clamp_turn(&mut self) {
        if let Some(turn) = self.turn {
            self.turn = Some(turn.min(self.turns.len().saturating_sub(1)));
        }
    }

    fn active_token(&self) -> Option<TokenId> {
        self.combatant().map(|c| c.token_id.clone())
    }

    /// Rebuild, then move `turn` to wherever `token` ended up.
    ///
    /// If `token` is gone the numeric slot is kept, so the next combatant in
    /// line takes over.
    fn rebuild_keeping(&mut self, token: Option<TokenId>, ctx: &EncounterContext<'_>) {
        self.setup_turns(ctx);
        if !self.started() {
            return;
        }
        if let Some(token) = token {
            if let Some(index) = self.turns.iter().position(|c| c.token_id == token) {
                self.turn = Some(index);
            }
        }
    }

    fn snapshot(&self) -> Round {
        Round::new(self.round, self.turn, self.active_token())
    }

    fn record(&mut self, transition: CombatTransition) -> TurnChange {
        self.history.record(self.snapshot());
        TurnChange {
            transition,
            previous: self.history.previous().clone(),
            current: self.history.current().clone(),
        }
    }

    fn require_started(&self, action: &str) -> Result<(u32, usize), DomainError> {
        match (self.round, self.turn) {
            (Some(round), Some(turn)) if round >= 1 => Ok((round, turn)),
            _ => Err(DomainError::invalid_state(format!(
                "cannot {} before the combat has started",
                action
            ))),
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Begin the encounter at round 1, turn 0.
    ///
    /// Returns `Ok(None)` without changing anything if already started.
    pub fn start_combat(
        &mut self,
        ctx: &EncounterContext<'_>,
    ) -> Result<Option<TurnChange>, DomainError> {
        ctx.settings.validate()?;
        if self.started() {
            return Ok(None);
        }
        self.setup_turns(ctx);
        self.round = Some(1);
        self.turn = Some(0);
        Ok(Some(self.record(CombatTransition::Started)))
    }

    /// Advance to the next turn, wrapping into the next round.
    ///
    /// With `skip_defeated`, defeated combatants are passed over; if everyone
    /// is defeated this advances exactly one step.
    pub fn next_turn(&mut self, ctx: &EncounterContext<'_>) -> Result<TurnChange, DomainError> {
        ctx.settings.validate()?;
        self.require_started("advance the turn")?;
        self.rebuild_keeping(self.active_token(), ctx);
        let (round, turn) = self.require_started("advance the turn")?;

        let len = self.turns.len();
        let mut next = step_forward(round, turn, len);

        if ctx.settings.skip_defeated && len > 0 {
            let mut candidate = next;
            for _ in 0..len {
                if !self.turns[candidate.1].is_defeated() {
                    next = candidate;
                    break;
                }
                candidate = step_forward(candidate.0, candidate.1, len);
            }
        }

        self.round = Some(next.0);
        self.turn = Some(next.1);
        Ok(self.record(CombatTransition::NextTurn))
    }

    /// Rewind one turn, wrapping into the previous round.
    ///
    /// Returns `Ok(None)` at round 1, turn 0.
    pub fn previous_turn(
        &mut self,
        ctx: &EncounterContext<'_>,
    ) -> Result<Option<TurnChange>, DomainError> {
        self.require_started("rewind the turn")?;
        self.rebuild_keeping(self.active_token(), ctx);
        let (round, turn) = self.require_started("rewind the turn")?;

        let (round, turn) = if turn > 0 {
            (round, turn - 1)
        } else if round > 1 {
            (round - 1, self.turns.len().saturating_sub(1))
        } else {
            return Ok(None);
        };

        self.round = Some(round);
        self.turn = Some(turn);
        Ok(Some(self.record(CombatTransition::PreviousTurn)))
    }

    /// Advance to turn 0 of the next round.
    pub fn next_round(&mut self, ctx: &EncounterContext<'_>) -> Result<TurnChange, DomainError> {
        let (round, _) = self.require_started("advance the round")?;
        self.setup_turns(ctx);
        self.round = Some(round + 1);
        self.turn = Some(0);
        Ok(self.record(CombatTransition::NextRound))
    }

    /// Rewind to turn 0 of the previous round, never below round 1.
    ///
    /// Returns `Ok(None)` when already at round 1, turn 0.
    pub fn previous_round(
        &mut self,
        ctx: &EncounterContext<'_>,
    ) -> Result<Option<TurnChange>, DomainError> {
        let (round, turn) = self.require_started("rewind the round")?;
        if round <= 1 && turn == 0 {
            return Ok(None);
        }
        self.setup_turns(ctx);
        self.round = Some(round.saturating_sub(1).max(1));
        self.turn = Some(0);
        Ok(Some(self.record(CombatTransition::PreviousRound)))
    }

    /// Clear every initiative score and return to the top of the order.
    ///
    /// The round is left unchanged. Before the combat starts there is no turn
    /// to reset, so only the scores are cleared.
    pub fn reset_all(&mut self, ctx: &EncounterContext<'_>) -> TurnChange {
        for combatant in &mut self.combatants {
            combatant.initiative = None;
        }
        if self.started() {
            self.turn = Some(0);
        }
        self.setup_turns(ctx);
        self.record(CombatTransition::InitiativeReset)
    }

    /// Delete every combatant and return to Unstarted.
    ///
    /// Confirmation is the caller's responsibility.
    pub fn end_combat(&mut self) -> TurnChange {
        self.combatants.clear();
        self.turns.clear();
        self.round = None;
        self.turn = None;
        self.sound_playing = false;
        self.record(CombatTransition::Ended)
    }

    // =========================================================================
    // Turn notification latch
    // =========================================================================

    /// Claim the one-shot notification for the last transition.
    ///
    /// Returns the newly active token when the active combatant changed and no
    /// notification is already in flight.
    pub fn claim_turn_notification(&mut self) -> Option<TokenId> {
        if self.sound_playing || !self.history.active_changed() {
            return None;
        }
        let token = self.history.current().token_id.clone()?;
        self.sound_playing = true;
        Some(token)
    }

    pub fn release_turn_notification(&mut self) {
        self.sound_playing = false;
    }

    pub fn is_notifying(&self) -> bool {
        self.sound_playing
    }

    // =========================================================================
    // Combatants
    // =========================================================================

    /// Add combatants and re-sort.
    ///
    /// Fails with a validation error, adding nothing, if a token is already in
    /// the combat or repeated within the batch, or an initiative is not finite.
    pub fn create_combatants(
        &mut self,
        new: Vec<NewCombatant>,
        ctx: &EncounterContext<'_>,
    ) -> Result<RosterUpdate, DomainError> {
        let mut seen: HashSet<&TokenId> = self.combatants.iter().map(|c| &c.token_id).collect();
        for combatant in &new {
            if !seen.insert(&combatant.token_id) {
                return Err(DomainError::validation(format!(
                    "token {} already has a combatant",
                    combatant.token_id
                )));
            }
            if let Some(value) = combatant.initiative {
                ensure_finite(value)?;
            }
        }

        let active = self.active_token();
        let sources: Vec<CombatantSource> = new.into_iter().map(NewCombatant::into_source).collect();
        let ids = sources.iter().map(|c| c.id).collect();
        self.combatants.extend(sources);
        self.rebuild_keeping(active, ctx);

        Ok(RosterUpdate {
            ids,
            change: self.record_if_started(CombatTransition::RosterChanged),
        })
    }

    /// Apply partial updates and re-sort, keeping the active combatant on the turn.
    pub fn update_combatants(
        &mut self,
        updates: Vec<(CombatantId, CombatantUpdate)>,
        ctx: &EncounterContext<'_>,
    ) -> Result<RosterUpdate, DomainError> {
        let ids: Vec<CombatantId> = updates.iter().map(|(id, _)| *id).collect();
        self.validate_combatant_ids(&ids)?;
        for (_, update) in &updates {
            if let Some(Some(value)) = update.initiative {
                ensure_finite(value)?;
            }
        }

        let active = self.active_token();
        for (id, update) in updates {
            if let Some(source) = self.combatants.iter_mut().find(|c| c.id == id) {
                update.apply_to(source);
            }
        }
        self.rebuild_keeping(active, ctx);

        Ok(RosterUpdate {
            ids,
            change: self.record_if_started(CombatTransition::RosterChanged),
        })
    }

    /// Remove combatants and re-sort.
    ///
    /// If the active combatant is removed, whoever slides into its slot takes the turn.
    pub fn delete_combatants(
        &mut self,
        ids: &[CombatantId],
        ctx: &EncounterContext<'_>,
    ) -> Result<RosterUpdate, DomainError> {
        self.validate_combatant_ids(ids)?;

        let active = self.active_token();
        self.combatants.retain(|c| !ids.contains(&c.id));
        self.rebuild_keeping(active, ctx);

        Ok(RosterUpdate {
            ids: ids.to_vec(),
            change: self.record_if_started(CombatTransition::RosterChanged),
        })
    }

    fn record_if_started(&mut self, transition: CombatTransition) -> Option<TurnChange> {
        self.started().then(|| self.record(transition))
    }

    // =========================================================================
    // Initiative
    // =========================================================================

    /// Fail with one not-found error naming every unknown id.
    pub fn validate_combatant_ids(&self, ids: &[CombatantId]) -> Result<(), DomainError> {
        let missing: Vec<&CombatantId> = ids
            .iter()
            .filter(|id| self.get_combatant(**id).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::not_found_many("Combatant", missing))
        }
    }

    /// Write initiative values and re-sort once.
    ///
    /// Nothing is written unless every id exists and every value is finite.
    /// With `update_turn`, the combatant who held the turn keeps it even if
    /// its slot moved.
    pub fn apply_initiative(
        &mut self,
        values: &[(CombatantId, f64)],
        update_turn: bool,
        ctx: &EncounterContext<'_>,
    ) -> Result<Option<TurnChange>, DomainError> {
        let ids: Vec<CombatantId> = values.iter().map(|(id, _)| *id).collect();
        self.validate_combatant_ids(&ids)?;
        for (_, value) in values {
            ensure_finite(*value)?;
        }

        let active = if update_turn { self.active_token() } else { None };
        for (id, value) in values {
            if let Some(source) = self.combatants.iter_mut().find(|c| c.id == *id) {
                source.initiative = Some(*value);
            }
        }
        self.rebuild_keeping(active, ctx);

        Ok(self.record_if_started(CombatTransition::InitiativeUpdated))
    }

    /// Set one combatant's initiative directly, keeping the active combatant.
    pub fn set_initiative(
        &mut self,
        id: CombatantId,
        value: f64,
        ctx: &EncounterContext<'_>,
    ) -> Result<Option<TurnChange>, DomainError> {
        self.apply_initiative(&[(id, value)], true, ctx)
    }

    /// Combatants that have not rolled yet.
    pub fn ids_awaiting_roll(&self) -> Vec<CombatantId> {
        self.combatants
            .iter()
            .filter(|c| !c.has_rolled())
            .map(|c| c.id)
            .collect()
    }

    /// Combatants no player owns that have not rolled yet.
    pub fn npc_ids_awaiting_roll(&self, ctx: &EncounterContext<'_>) -> Vec<CombatantId> {
        self.combatants
            .iter()
            .filter(|c| !c.has_rolled())
            .filter_map(|c| Combatant::prepare(c, ctx))
            .filter(Combatant::is_npc)
            .map(|c| c.id)
            .collect()
    }

    /// Prepared form of one combatant, for formula selection and chat speakers.
    pub fn prepare_combatant(
        &self,
        id: CombatantId,
        ctx: &EncounterContext<'_>,
    ) -> Result<Combatant, DomainError> {
        let source = self
            .get_combatant(id)
            .ok_or_else(|| DomainError::not_found("Combatant", id))?;
        Combatant::prepare(source, ctx)
            .ok_or_else(|| DomainError::not_found("Token", &source.token_id))
    }
}

fn step_forward(round: u32, turn: usize, len: usize) -> (u32, usize) {
    if turn + 1 >= len {
        (round + 1, 0)
    } else {
        (round, turn + 1)
    }
}

fn ensure_finite(value: f64) -> Result<(), DomainError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "initiative must be a finite number, got {}",
            value
        )))
    }
}
