//! Dice evaluation backed by the domain formula parser.

use std::sync::Arc;

use async_trait::async_trait;
use turnwright_domain::{Combatant, DiceFormula};

use crate::infrastructure::ports::{DiceEvaluator, EvaluationError, InitiativeRoll, RandomPort};

/// Evaluates `XdY+Z` formulas with an injected random source.
pub struct FormulaDiceEvaluator {
    random: Arc<dyn RandomPort>,
}

impl FormulaDiceEvaluator {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }
}

#[async_trait]
impl DiceEvaluator for FormulaDiceEvaluator {
    async fn evaluate(
        &self,
        formula: &str,
        combatant: &Combatant,
    ) -> Result<InitiativeRoll, EvaluationError> {
        let parsed = DiceFormula::parse(formula).map_err(|e| EvaluationError::InvalidFormula {
            formula: formula.to_string(),
            reason: e.to_string(),
        })?;

        let result = parsed.roll_with(|min, max| self.random.gen_range(min, max));
        tracing::debug!(
            combatant_id = %combatant.id,
            formula = %parsed,
            total = result.total,
            "Rolled initiative"
        );

        Ok(InitiativeRoll {
            total: f64::from(result.total),
            breakdown: result.breakdown(),
        })
    }
}

#[cfg(test)]
mod tests {
    use turnwright_domain::{
        CombatSettings, CombatantSource, EncounterContext, SceneId, SceneView, TokenSnapshot,
        User,
    };

    use super::*;
    use crate::infrastructure::clock::FixedRandom;

    fn combatant() -> Combatant {
        let scene = SceneView::new(SceneId::new()).with_token(TokenSnapshot::new("t1", "Orc"));
        let gm = User::gm("gm", "GM");
        let settings = CombatSettings::default();
        let ctx = EncounterContext::new(&scene, &[], &gm, &settings);
        Combatant::prepare(&CombatantSource::new("t1"), &ctx).expect("token is on the scene")
    }

    #[tokio::test]
    async fn evaluates_formula_with_injected_random() {
        let evaluator = FormulaDiceEvaluator::new(Arc::new(FixedRandom(7)));
        let roll = evaluator.evaluate("1d20+3", &combatant()).await.unwrap();
        assert_eq!(roll.total, 10.0);
        assert!(roll.breakdown.ends_with("= 10"));
    }

    #[tokio::test]
    async fn malformed_formula_is_an_evaluation_error() {
        let evaluator = FormulaDiceEvaluator::new(Arc::new(FixedRandom(7)));
        let err = evaluator.evaluate("1d", &combatant()).await.unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidFormula { .. }));
    }

    #[tokio::test]
    async fn overflowing_modifier_is_an_evaluation_error() {
        let evaluator = FormulaDiceEvaluator::new(Arc::new(FixedRandom(20)));
        let err = evaluator
            .evaluate("1d20+2147483647", &combatant())
            .await
            .unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidFormula { .. }));
    }
}
