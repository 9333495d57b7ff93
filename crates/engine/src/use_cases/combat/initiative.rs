//! Rolling and setting initiative.
//!
//! A roll batch evaluates every requested combatant concurrently, waits for
//! all of them, then writes the successful totals and re-sorts once. The batch
//! can be cancelled up to that join; a cancelled batch writes nothing.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use turnwright_domain::{
    Combat, CombatId, Combatant, CombatantId, DomainError, InitiativeFormula, TurnChange,
};

use super::{CombatError, CombatSession, CombatWriter};
use crate::infrastructure::ports::{
    ChatLog, ChatMessage, ClockPort, DiceEvaluator, InitiativeRoll, MessageOptions, RollMode,
};

/// Options for one roll batch.
#[derive(Debug, Clone)]
pub struct RollOptions {
    /// Overrides the per-combatant formula for every id
    pub formula: Option<String>,
    /// Keep the combatant whose turn it is on the turn after re-sorting
    pub update_turn: bool,
    pub message_options: MessageOptions,
}

impl Default for RollOptions {
    fn default() -> Self {
        Self {
            formula: None,
            update_turn: true,
            message_options: MessageOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RolledInitiative {
    pub combatant_id: CombatantId,
    pub total: f64,
    pub breakdown: String,
}

/// A combatant whose roll could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollFailure {
    pub combatant_id: CombatantId,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RollInitiativeResult {
    /// The combat after the batch was applied
    pub combat: Combat,
    pub rolled: Vec<RolledInitiative>,
    pub failures: Vec<RollFailure>,
    /// Position change, when the combat is running and something was written
    pub change: Option<TurnChange>,
}

impl RollInitiativeResult {
    /// The failures as one evaluation error naming every failed id.
    pub fn evaluation_error(&self) -> Option<DomainError> {
        if self.failures.is_empty() {
            return None;
        }
        let message = self
            .failures
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Some(DomainError::Evaluation {
            ids: self
                .failures
                .iter()
                .map(|f| f.combatant_id.to_string())
                .collect(),
            message,
        })
    }
}

/// Use case for initiative rolls and direct initiative edits.
pub struct RollInitiative {
    writer: Arc<CombatWriter>,
    dice: Arc<dyn DiceEvaluator>,
    chat: Arc<dyn ChatLog>,
    formula: Arc<dyn InitiativeFormula>,
    clock: Arc<dyn ClockPort>,
    default_roll_mode: RollMode,
}

impl RollInitiative {
    pub(crate) fn new(
        writer: Arc<CombatWriter>,
        dice: Arc<dyn DiceEvaluator>,
        chat: Arc<dyn ChatLog>,
        formula: Arc<dyn InitiativeFormula>,
        clock: Arc<dyn ClockPort>,
        default_roll_mode: RollMode,
    ) -> Self {
        Self {
            writer,
            dice,
            chat,
            formula,
            clock,
            default_roll_mode,
        }
    }

    /// Roll initiative for `ids`.
    ///
    /// Unknown ids fail the whole batch before anything is rolled. Evaluation
    /// failures are reported per id in the result and do not stop the other
    /// combatants from being written. Cancelling `cancel` before every roll
    /// has completed returns [`CombatError::Cancelled`] and writes nothing.
    pub async fn execute(
        &self,
        combat_id: CombatId,
        ids: Vec<CombatantId>,
        options: RollOptions,
        cancel: CancellationToken,
    ) -> Result<RollInitiativeResult, CombatError> {
        let session = self.writer.open(combat_id).await?;
        session.combat.validate_combatant_ids(&ids)?;
        self.roll(session, ids, options, cancel).await
    }

    /// Roll for every combatant no player owns that has not rolled yet.
    pub async fn roll_npc(
        &self,
        combat_id: CombatId,
        options: RollOptions,
        cancel: CancellationToken,
    ) -> Result<RollInitiativeResult, CombatError> {
        let session = self.writer.open(combat_id).await?;
        let ids = session.combat.npc_ids_awaiting_roll(&session.inputs.ctx());
        self.roll(session, ids, options, cancel).await
    }

    /// Roll for every combatant that has not rolled yet.
    pub async fn roll_all(
        &self,
        combat_id: CombatId,
        options: RollOptions,
        cancel: CancellationToken,
    ) -> Result<RollInitiativeResult, CombatError> {
        let session = self.writer.open(combat_id).await?;
        let ids = session.combat.ids_awaiting_roll();
        self.roll(session, ids, options, cancel).await
    }

    /// Set one combatant's initiative without rolling.
    pub async fn set_initiative(
        &self,
        combat_id: CombatId,
        combatant_id: CombatantId,
        value: f64,
    ) -> Result<Option<TurnChange>, CombatError> {
        let (_, change) = self
            .writer
            .mutate(combat_id, |combat, ctx| {
                combat.set_initiative(combatant_id, value, ctx)
            })
            .await?;
        tracing::debug!(combat_id = %combat_id, combatant_id = %combatant_id, value, "Set initiative");
        Ok(change)
    }

    /// Roll `ids` within an open session. The combat stays locked until the
    /// batch is written or abandoned.
    async fn roll(
        &self,
        mut session: CombatSession,
        ids: Vec<CombatantId>,
        options: RollOptions,
        cancel: CancellationToken,
    ) -> Result<RollInitiativeResult, CombatError> {
        let combat_id = session.combat.id();
        let mut seen = HashSet::with_capacity(ids.len());
        let ids: Vec<CombatantId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

        let ctx = session.inputs.ctx();
        let mut failures = Vec::new();
        let mut pending: Vec<(Combatant, String)> = Vec::with_capacity(ids.len());
        for id in &ids {
            match session.combat.prepare_combatant(*id, &ctx) {
                Ok(combatant) => {
                    let formula = options
                        .formula
                        .clone()
                        .unwrap_or_else(|| self.formula.formula_for(&combatant));
                    pending.push((combatant, formula));
                }
                Err(e) => failures.push(RollFailure {
                    combatant_id: *id,
                    message: e.to_string(),
                }),
            }
        }

        let rolls = join_all(
            pending
                .iter()
                .map(|(combatant, formula)| self.dice.evaluate(formula, combatant)),
        );
        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(combat_id = %combat_id, requested = ids.len(), "Initiative roll cancelled");
                return Err(CombatError::Cancelled);
            }
            results = rolls => results,
        };

        let mut rolled: Vec<(Combatant, InitiativeRoll)> = Vec::with_capacity(pending.len());
        for ((combatant, formula), result) in pending.into_iter().zip(results) {
            match result {
                Ok(roll) if roll.total.is_finite() => rolled.push((combatant, roll)),
                Ok(roll) => failures.push(RollFailure {
                    combatant_id: combatant.id,
                    message: format!("'{}' produced a non-finite total {}", formula, roll.total),
                }),
                Err(e) => failures.push(RollFailure {
                    combatant_id: combatant.id,
                    message: e.to_string(),
                }),
            }
        }
        for failure in &failures {
            tracing::warn!(
                combat_id = %combat_id,
                combatant_id = %failure.combatant_id,
                error = %failure.message,
                "Initiative roll failed"
            );
        }

        if rolled.is_empty() {
            return Ok(RollInitiativeResult {
                combat: session.combat,
                rolled: Vec::new(),
                failures,
                change: None,
            });
        }

        let values: Vec<(CombatantId, f64)> =
            rolled.iter().map(|(c, roll)| (c.id, roll.total)).collect();
        let change = session
            .combat
            .apply_initiative(&values, options.update_turn, &ctx)?;
        let combat = self.writer.commit(session).await?;
        tracing::debug!(combat_id = %combat_id, rolled = values.len(), "Initiative written");

        self.post_messages(&rolled, &options.message_options).await;

        Ok(RollInitiativeResult {
            combat,
            rolled: rolled
                .into_iter()
                .map(|(c, roll)| RolledInitiative {
                    combatant_id: c.id,
                    total: roll.total,
                    breakdown: roll.breakdown,
                })
                .collect(),
            failures,
            change,
        })
    }

    async fn post_messages(&self, rolled: &[(Combatant, InitiativeRoll)], options: &MessageOptions) {
        let mode = options.roll_mode.unwrap_or(self.default_roll_mode);
        for (index, (combatant, roll)) in rolled.iter().enumerate() {
            let message = ChatMessage {
                combatant_id: combatant.id,
                token_id: combatant.token_id.clone(),
                speaker: combatant.name.clone(),
                flavor: options
                    .flavor
                    .clone()
                    .unwrap_or_else(|| format!("{} rolls for Initiative!", combatant.name)),
                breakdown: roll.breakdown.clone(),
                total: roll.total,
                roll_mode: mode.for_hidden(combatant.hidden),
                play_sound: index == 0,
                timestamp: self.clock.now(),
            };
            if let Err(e) = self.chat.post(message).await {
                tracing::warn!(combatant_id = %combatant.id, error = %e, "Failed to post initiative roll");
            }
        }
    }
}
