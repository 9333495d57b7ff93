//! Turn notification.

use std::sync::Arc;

use turnwright_domain::{Combat, TokenId};

use crate::infrastructure::ports::TurnNotifier;

/// Plays the turn cue once per change of active combatant.
pub struct TurnAnnouncer {
    notifier: Arc<dyn TurnNotifier>,
}

impl TurnAnnouncer {
    pub fn new(notifier: Arc<dyn TurnNotifier>) -> Self {
        Self { notifier }
    }

    /// Call after a transition was recorded on `combat`.
    ///
    /// Returns the announced token, or `None` when the active combatant did not
    /// change or a cue is already in flight.
    pub async fn on_combat_updated(&self, combat: &mut Combat) -> Option<TokenId> {
        let token = combat.claim_turn_notification()?;
        if let Err(e) = self.notifier.announce_turn(combat.id(), &token).await {
            tracing::warn!(
                combat_id = %combat.id(),
                token_id = %token,
                error = %e,
                "Failed to play turn cue"
            );
        }
        combat.release_turn_notification();
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use turnwright_domain::NewCombatant;

    use super::*;
    use crate::infrastructure::ports::{MockTurnNotifier, NotifyError};
    use crate::use_cases::combat::test_support::Table;

    #[tokio::test]
    async fn when_active_combatant_changes_then_cue_plays_once() {
        let table = Table::new(&["a", "b"]);
        let mut combat = table.combat(vec![
            NewCombatant::for_token("a").with_initiative(9.0),
            NewCombatant::for_token("b").with_initiative(3.0),
        ]);
        combat.start_combat(&table.inputs.ctx()).unwrap();

        let mut notifier = MockTurnNotifier::new();
        notifier
            .expect_announce_turn()
            .with(eq(combat.id()), eq(TokenId::from("a")))
            .times(1)
            .returning(|_, _| Ok(()));
        let announcer = TurnAnnouncer::new(Arc::new(notifier));

        assert_eq!(
            announcer.on_combat_updated(&mut combat).await,
            Some(TokenId::from("a"))
        );
        assert!(!combat.is_notifying());
    }

    #[tokio::test]
    async fn when_latch_is_held_then_no_second_cue() {
        let table = Table::new(&["a"]);
        let mut combat = table.combat(vec![NewCombatant::for_token("a")]);
        combat.start_combat(&table.inputs.ctx()).unwrap();
        assert!(combat.claim_turn_notification().is_some());

        let mut notifier = MockTurnNotifier::new();
        notifier.expect_announce_turn().times(0);
        let announcer = TurnAnnouncer::new(Arc::new(notifier));

        assert_eq!(announcer.on_combat_updated(&mut combat).await, None);
    }

    #[tokio::test]
    async fn when_notifier_fails_then_latch_is_released() {
        let table = Table::new(&["a"]);
        let mut combat = table.combat(vec![NewCombatant::for_token("a")]);
        combat.start_combat(&table.inputs.ctx()).unwrap();

        let mut notifier = MockTurnNotifier::new();
        notifier
            .expect_announce_turn()
            .returning(|_, _| Err(NotifyError::DeliveryFailed("muted".into())));
        let announcer = TurnAnnouncer::new(Arc::new(notifier));

        assert!(announcer.on_combat_updated(&mut combat).await.is_some());
        assert!(!combat.is_notifying());
    }
}
