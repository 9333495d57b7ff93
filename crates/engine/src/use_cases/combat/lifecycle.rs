//! Encounter lifecycle: create, activate, start, advance, rewind, reset, end.

use std::sync::Arc;

use turnwright_domain::{Combat, CombatId, SceneId, TurnChange};

use super::{CombatError, CombatWriter};
use crate::infrastructure::ports::ConfirmationPrompt;

const END_COMBAT_TITLE: &str = "End Combat Encounter";
const END_COMBAT_BODY: &str =
    "End this combat encounter and empty the turn tracker? Every combatant will be removed.";

/// Result of asking to end combat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndCombatResult {
    /// The user declined; nothing changed
    Declined,
    /// Combatants removed and the encounter returned to unstarted
    Ended(TurnChange),
}

/// Use case for moving an encounter through its states.
pub struct CombatLifecycle {
    writer: Arc<CombatWriter>,
    prompt: Arc<dyn ConfirmationPrompt>,
}

impl CombatLifecycle {
    pub(crate) fn new(writer: Arc<CombatWriter>, prompt: Arc<dyn ConfirmationPrompt>) -> Self {
        Self { writer, prompt }
    }

    // =========================================================================
    // Encounters
    // =========================================================================

    /// Create an empty encounter and make it the scene's active one.
    pub async fn create_encounter(&self, scene_id: SceneId) -> Result<Combat, CombatError> {
        let combat = Combat::new(scene_id);
        self.writer.encounters().save(&combat).await?;
        tracing::info!(combat_id = %combat.id(), scene_id = %scene_id, "Created encounter");
        self.activate(combat.id()).await
    }

    /// Make `combat_id` the active encounter of its scene.
    pub async fn activate(&self, combat_id: CombatId) -> Result<Combat, CombatError> {
        let (combat, ()) = self
            .writer
            .mutate(combat_id, |combat, _| {
                combat.activate();
                Ok(())
            })
            .await?;

        let encounters = self.writer.encounters();
        for other in encounters.list_in_scene(combat.scene_id()).await? {
            if other.id() == combat_id || !other.is_active() {
                continue;
            }
            self.writer
                .mutate(other.id(), |other, _| {
                    other.deactivate();
                    Ok(())
                })
                .await?;
        }

        tracing::debug!(combat_id = %combat_id, "Activated encounter");
        Ok(combat)
    }

    /// Remove an encounter entirely.
    pub async fn delete_encounter(&self, combat_id: CombatId) -> Result<(), CombatError> {
        let guard = self.writer.locks().acquire(combat_id).await;
        self.writer.encounters().delete(combat_id).await?;
        drop(guard);
        self.writer.locks().forget(combat_id);
        tracing::info!(combat_id = %combat_id, "Deleted encounter");
        Ok(())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Begin at round 1, turn 0. Starting an already started combat is a no-op.
    pub async fn start_combat(
        &self,
        combat_id: CombatId,
    ) -> Result<Option<TurnChange>, CombatError> {
        let (combat, change) = self
            .writer
            .mutate(combat_id, |combat, ctx| combat.start_combat(ctx))
            .await?;
        match &change {
            Some(change) => tracing::info!(
                combat_id = %combat_id,
                combatants = combat.turns().len(),
                token_id = ?change.active_token(),
                "Combat started"
            ),
            None => tracing::debug!(combat_id = %combat_id, "Combat already started"),
        }
        Ok(change)
    }

    pub async fn next_turn(&self, combat_id: CombatId) -> Result<TurnChange, CombatError> {
        let (_, change) = self
            .writer
            .mutate(combat_id, |combat, ctx| combat.next_turn(ctx))
            .await?;
        log_change(combat_id, &change);
        Ok(change)
    }

    /// Returns `None` at round 1, turn 0.
    pub async fn previous_turn(
        &self,
        combat_id: CombatId,
    ) -> Result<Option<TurnChange>, CombatError> {
        let (_, change) = self
            .writer
            .mutate(combat_id, |combat, ctx| combat.previous_turn(ctx))
            .await?;
        if let Some(change) = &change {
            log_change(combat_id, change);
        }
        Ok(change)
    }

    pub async fn next_round(&self, combat_id: CombatId) -> Result<TurnChange, CombatError> {
        let (_, change) = self
            .writer
            .mutate(combat_id, |combat, ctx| combat.next_round(ctx))
            .await?;
        log_change(combat_id, &change);
        Ok(change)
    }

    /// Returns `None` at round 1, turn 0.
    pub async fn previous_round(
        &self,
        combat_id: CombatId,
    ) -> Result<Option<TurnChange>, CombatError> {
        let (_, change) = self
            .writer
            .mutate(combat_id, |combat, ctx| combat.previous_round(ctx))
            .await?;
        if let Some(change) = &change {
            log_change(combat_id, change);
        }
        Ok(change)
    }

    /// Clear every initiative score.
    pub async fn reset_all(&self, combat_id: CombatId) -> Result<TurnChange, CombatError> {
        let (_, change) = self
            .writer
            .mutate(combat_id, |combat, ctx| Ok(combat.reset_all(ctx)))
            .await?;
        tracing::info!(combat_id = %combat_id, "Reset all initiative");
        Ok(change)
    }

    /// Ask for confirmation, then remove every combatant.
    ///
    /// The combat is only locked once the answer is in, so other mutations
    /// proceed while the prompt is open.
    pub async fn end_combat(&self, combat_id: CombatId) -> Result<EndCombatResult, CombatError> {
        if self.writer.encounters().get(combat_id).await?.is_none() {
            return Err(CombatError::CombatNotFound(combat_id));
        }
        if !self.prompt.confirm(END_COMBAT_TITLE, END_COMBAT_BODY).await? {
            tracing::debug!(combat_id = %combat_id, "End combat declined");
            return Ok(EndCombatResult::Declined);
        }

        let mut session = self.writer.open(combat_id).await?;
        let change = session.combat.end_combat();
        self.writer.commit(session).await?;
        tracing::info!(combat_id = %combat_id, "Combat ended");
        Ok(EndCombatResult::Ended(change))
    }
}

fn log_change(combat_id: CombatId, change: &TurnChange) {
    if change.round_changed() {
        tracing::info!(
            combat_id = %combat_id,
            round = ?change.current.round,
            turn = ?change.current.turn,
            token_id = ?change.active_token(),
            "Round changed"
        );
    } else {
        tracing::debug!(
            combat_id = %combat_id,
            round = ?change.current.round,
            turn = ?change.current.turn,
            token_id = ?change.active_token(),
            "Turn changed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use mockall::predicate::eq;
    use tokio::sync::Notify;
    use turnwright_domain::{ErrorKind, NewCombatant, TokenId};

    use super::*;
    use crate::infrastructure::memory::{AutoConfirm, InMemoryCombatRepo};
    use crate::infrastructure::ports::{
        CombatRepo, MockCombatRepo, MockConfirmationPrompt, MockTurnNotifier, PromptError,
    };
    use crate::use_cases::combat::test_support::Table;

    fn abc(table: &Table) -> Combat {
        table.combat(vec![
            NewCombatant::for_token("A").with_initiative(10.0),
            NewCombatant::for_token("B").with_initiative(15.0),
            NewCombatant::for_token("C").with_initiative(10.0),
        ])
    }

    async fn lifecycle(table: &Table, repo: Arc<dyn CombatRepo>) -> CombatLifecycle {
        CombatLifecycle::new(table.writer(repo).await, Arc::new(AutoConfirm(true)))
    }

    #[tokio::test]
    async fn when_round_completes_then_turn_wraps_to_first_combatant() {
        let table = Table::new(&["A", "B", "C"]);
        let combat = abc(&table);
        let repo = table.repo_with(&combat).await;
        let lifecycle = lifecycle(&table, repo.clone()).await;

        let start = lifecycle.start_combat(combat.id()).await.unwrap().unwrap();
        assert_eq!(start.active_token(), Some(&TokenId::from("B")));

        for _ in 0..3 {
            lifecycle.next_turn(combat.id()).await.unwrap();
        }

        let stored = repo.get(combat.id()).await.unwrap().unwrap();
        assert_eq!(stored.round(), Some(2));
        assert_eq!(stored.turn(), Some(0));
        assert_eq!(stored.combatant().unwrap().token_id.as_str(), "B");
    }

    #[tokio::test]
    async fn when_already_started_then_start_is_a_no_op() {
        let table = Table::new(&["A", "B", "C"]);
        let combat = abc(&table);
        let repo = table.repo_with(&combat).await;
        let lifecycle = lifecycle(&table, repo.clone()).await;

        lifecycle.start_combat(combat.id()).await.unwrap();
        lifecycle.next_turn(combat.id()).await.unwrap();
        assert!(lifecycle.start_combat(combat.id()).await.unwrap().is_none());

        let stored = repo.get(combat.id()).await.unwrap().unwrap();
        assert_eq!(stored.turn(), Some(1));
    }

    #[tokio::test]
    async fn when_not_started_then_next_turn_is_invalid_state_and_nothing_saved() {
        let table = Table::new(&["A"]);
        let combat = table.combat(vec![NewCombatant::for_token("A")]);

        let mut repo = MockCombatRepo::new();
        let stored = combat.clone();
        repo.expect_get()
            .with(eq(combat.id()))
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_save().times(0);
        let lifecycle = lifecycle(&table, Arc::new(repo)).await;

        let err = lifecycle.next_turn(combat.id()).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidState));
    }

    #[tokio::test]
    async fn when_combat_missing_then_not_found() {
        let table = Table::new(&[]);
        let mut repo = MockCombatRepo::new();
        repo.expect_get().returning(|_| Ok(None));
        let lifecycle = lifecycle(&table, Arc::new(repo)).await;

        let err = lifecycle.start_combat(CombatId::new()).await.unwrap_err();
        assert!(matches!(err, CombatError::CombatNotFound(_)));
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn when_end_declined_then_nothing_changes() {
        let table = Table::new(&["A", "B", "C"]);
        let combat = abc(&table);

        let mut repo = MockCombatRepo::new();
        let stored = combat.clone();
        repo.expect_get().returning(move |_| Ok(Some(stored.clone())));
        repo.expect_save().times(0);

        let mut prompt = MockConfirmationPrompt::new();
        prompt.expect_confirm().times(1).returning(|_, _| Ok(false));

        let lifecycle = CombatLifecycle::new(table.writer(Arc::new(repo)).await, Arc::new(prompt));
        let result = lifecycle.end_combat(combat.id()).await.unwrap();
        assert_eq!(result, EndCombatResult::Declined);
    }

    #[tokio::test]
    async fn when_end_confirmed_then_combatants_removed_and_unstarted() {
        let table = Table::new(&["A", "B", "C"]);
        let combat = abc(&table);
        let repo = table.repo_with(&combat).await;
        let lifecycle = lifecycle(&table, repo.clone()).await;
        lifecycle.start_combat(combat.id()).await.unwrap();

        let result = lifecycle.end_combat(combat.id()).await.unwrap();
        assert!(matches!(result, EndCombatResult::Ended(_)));

        let stored = repo.get(combat.id()).await.unwrap().unwrap();
        assert!(!stored.started());
        assert!(stored.combatants().is_empty());
    }

    /// Holds every confirmation until `answer` is notified, then confirms.
    #[derive(Default)]
    struct HeldPrompt {
        answer: Notify,
    }

    #[async_trait]
    impl ConfirmationPrompt for HeldPrompt {
        async fn confirm(&self, _title: &str, _body: &str) -> Result<bool, PromptError> {
            self.answer.notified().await;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn when_end_prompt_pending_then_turns_still_advance() {
        let table = Table::new(&["A", "B", "C"]);
        let combat = abc(&table);
        let repo = table.repo_with(&combat).await;
        let prompt = Arc::new(HeldPrompt::default());
        let lifecycle = CombatLifecycle::new(table.writer(repo.clone()).await, prompt.clone());
        lifecycle.start_combat(combat.id()).await.unwrap();

        let (ended, advanced) = tokio::join!(lifecycle.end_combat(combat.id()), async {
            let advanced =
                tokio::time::timeout(Duration::from_secs(1), lifecycle.next_turn(combat.id()))
                    .await;
            prompt.answer.notify_one();
            advanced
        });

        let change = advanced.expect("next_turn blocked by the open prompt").unwrap();
        assert_eq!(change.active_token(), Some(&TokenId::from("A")));
        assert!(matches!(ended.unwrap(), EndCombatResult::Ended(_)));
        let stored = repo.get(combat.id()).await.unwrap().unwrap();
        assert!(stored.combatants().is_empty());
    }

    #[tokio::test]
    async fn when_ending_missing_combat_then_not_found_without_prompt() {
        let table = Table::new(&[]);
        let mut repo = MockCombatRepo::new();
        repo.expect_get().returning(|_| Ok(None));
        let mut prompt = MockConfirmationPrompt::new();
        prompt.expect_confirm().times(0);

        let lifecycle = CombatLifecycle::new(table.writer(Arc::new(repo)).await, Arc::new(prompt));
        let err = lifecycle.end_combat(CombatId::new()).await.unwrap_err();
        assert!(matches!(err, CombatError::CombatNotFound(_)));
    }

    #[tokio::test]
    async fn when_turn_advances_then_cue_plays_for_new_combatant() {
        let table = Table::new(&["A", "B", "C"]);
        let combat = abc(&table);
        let repo = table.repo_with(&combat).await;

        let mut notifier = MockTurnNotifier::new();
        let mut seq = mockall::Sequence::new();
        notifier
            .expect_announce_turn()
            .with(eq(combat.id()), eq(TokenId::from("B")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        notifier
            .expect_announce_turn()
            .with(eq(combat.id()), eq(TokenId::from("A")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        notifier
            .expect_announce_turn()
            .with(eq(combat.id()), eq(TokenId::from("B")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let writer = table
            .writer_with_notifier(repo, Arc::new(notifier))
            .await;
        let lifecycle = CombatLifecycle::new(writer, Arc::new(AutoConfirm(true)));

        lifecycle.start_combat(combat.id()).await.unwrap();
        lifecycle.next_turn(combat.id()).await.unwrap();
        lifecycle.previous_round(combat.id()).await.unwrap();
        // Already at round one, turn zero: no transition, no cue.
        assert!(lifecycle.previous_round(combat.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn when_reset_then_scores_cleared_and_round_kept() {
        let table = Table::new(&["A", "B", "C"]);
        let combat = abc(&table);
        let repo = table.repo_with(&combat).await;
        let lifecycle = lifecycle(&table, repo.clone()).await;
        lifecycle.start_combat(combat.id()).await.unwrap();
        lifecycle.next_round(combat.id()).await.unwrap();
        lifecycle.next_turn(combat.id()).await.unwrap();

        lifecycle.reset_all(combat.id()).await.unwrap();

        let stored = repo.get(combat.id()).await.unwrap().unwrap();
        assert_eq!(stored.round(), Some(2));
        assert_eq!(stored.turn(), Some(0));
        assert!(stored.combatants().iter().all(|c| c.initiative.is_none()));
    }

    #[tokio::test]
    async fn when_new_encounter_created_then_it_replaces_active_one() {
        let table = Table::new(&[]);
        let repo = Arc::new(InMemoryCombatRepo::new());
        let lifecycle = lifecycle(&table, repo.clone()).await;

        let first = lifecycle.create_encounter(table.scene_id()).await.unwrap();
        assert!(first.is_active());
        let second = lifecycle.create_encounter(table.scene_id()).await.unwrap();
        assert!(second.is_active());

        let first = repo.get(first.id()).await.unwrap().unwrap();
        assert!(!first.is_active());
    }

    #[tokio::test]
    async fn when_encounter_deleted_then_it_is_gone() {
        let table = Table::new(&[]);
        let repo = Arc::new(InMemoryCombatRepo::new());
        let lifecycle = lifecycle(&table, repo.clone()).await;
        let combat = lifecycle.create_encounter(table.scene_id()).await.unwrap();

        lifecycle.delete_encounter(combat.id()).await.unwrap();
        assert!(repo.get(combat.id()).await.unwrap().is_none());
    }
}
