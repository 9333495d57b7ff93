//! Adding, updating, and removing combatants.

use std::sync::Arc;

use turnwright_domain::{CombatId, CombatantId, CombatantUpdate, NewCombatant, RosterUpdate};

use super::{CombatError, CombatWriter};

/// Use case for combatant create/update/delete. Every change re-sorts the turn order.
pub struct CombatantOps {
    writer: Arc<CombatWriter>,
}

impl CombatantOps {
    pub(crate) fn new(writer: Arc<CombatWriter>) -> Self {
        Self { writer }
    }

    pub async fn create(
        &self,
        combat_id: CombatId,
        combatants: Vec<NewCombatant>,
    ) -> Result<RosterUpdate, CombatError> {
        let (_, update) = self
            .writer
            .mutate(combat_id, |combat, ctx| combat.create_combatants(combatants, ctx))
            .await?;
        tracing::debug!(combat_id = %combat_id, added = update.ids.len(), "Added combatants");
        Ok(update)
    }

    pub async fn update(
        &self,
        combat_id: CombatId,
        updates: Vec<(CombatantId, CombatantUpdate)>,
    ) -> Result<RosterUpdate, CombatError> {
        let (_, update) = self
            .writer
            .mutate(combat_id, |combat, ctx| combat.update_combatants(updates, ctx))
            .await?;
        tracing::debug!(combat_id = %combat_id, updated = update.ids.len(), "Updated combatants");
        Ok(update)
    }

    pub async fn delete(
        &self,
        combat_id: CombatId,
        ids: Vec<CombatantId>,
    ) -> Result<RosterUpdate, CombatError> {
        let (_, update) = self
            .writer
            .mutate(combat_id, |combat, ctx| combat.delete_combatants(&ids, ctx))
            .await?;
        tracing::debug!(combat_id = %combat_id, removed = update.ids.len(), "Removed combatants");
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use turnwright_domain::{ErrorKind, TokenId};

    use super::*;
    use crate::infrastructure::ports::CombatRepo;
    use crate::use_cases::combat::test_support::Table;

    #[tokio::test]
    async fn when_combatant_added_then_turn_order_resorted() {
        let table = Table::new(&["a", "b", "late"]);
        let combat = table.combat(vec![
            NewCombatant::for_token("a").with_initiative(10.0),
            NewCombatant::for_token("b").with_initiative(5.0),
        ]);
        let repo = table.repo_with(&combat).await;
        let ops = CombatantOps::new(table.writer(repo.clone()).await);

        ops.create(
            combat.id(),
            vec![NewCombatant::for_token("late").with_initiative(7.0)],
        )
        .await
        .unwrap();

        let stored = repo.get(combat.id()).await.unwrap().unwrap();
        let order: Vec<&str> = stored.turns().iter().map(|c| c.token_id.as_str()).collect();
        assert_eq!(order, vec!["a", "late", "b"]);
    }

    #[tokio::test]
    async fn when_update_names_unknown_id_then_nothing_written() {
        let table = Table::new(&["a"]);
        let combat = table.combat(vec![NewCombatant::for_token("a")]);
        let repo = table.repo_with(&combat).await;
        let ops = CombatantOps::new(table.writer(repo.clone()).await);
        let known = combat.get_combatant_by_token(&TokenId::from("a")).unwrap().id;

        let err = ops
            .update(
                combat.id(),
                vec![
                    (
                        known,
                        CombatantUpdate {
                            initiative: Some(Some(4.0)),
                            ..Default::default()
                        },
                    ),
                    (CombatantId::new(), CombatantUpdate::default()),
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));

        let stored = repo.get(combat.id()).await.unwrap().unwrap();
        assert!(stored.get_combatant(known).unwrap().initiative.is_none());
    }

    #[tokio::test]
    async fn when_active_combatant_deleted_then_next_takes_turn() {
        let table = Table::new(&["a", "b", "c"]);
        let mut combat = table.combat(vec![
            NewCombatant::for_token("a").with_initiative(3.0),
            NewCombatant::for_token("b").with_initiative(2.0),
            NewCombatant::for_token("c").with_initiative(1.0),
        ]);
        combat.start_combat(&table.inputs.ctx()).unwrap();
        let a = combat.get_combatant_by_token(&TokenId::from("a")).unwrap().id;
        let repo = table.repo_with(&combat).await;
        let ops = CombatantOps::new(table.writer(repo.clone()).await);

        let update = ops.delete(combat.id(), vec![a]).await.unwrap();
        assert_eq!(update.change.unwrap().active_token(), Some(&TokenId::from("b")));
    }

    #[tokio::test]
    async fn when_token_already_in_combat_then_validation_error() {
        let table = Table::new(&["a"]);
        let combat = table.combat(vec![NewCombatant::for_token("a")]);
        let repo = table.repo_with(&combat).await;
        let ops = CombatantOps::new(table.writer(repo).await);

        let err = ops
            .create(combat.id(), vec![NewCombatant::for_token("a")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }
}
