//! Initiative formula selection

use crate::entities::Combatant;
use crate::value_objects::{DiceFormula, DiceParseError};

/// Default formula used when nothing else is configured.
pub const DEFAULT_INITIATIVE_FORMULA: &str = "1d20";

/// Chooses the formula to roll initiative with for a combatant.
pub trait InitiativeFormula: Send + Sync {
    fn formula_for(&self, combatant: &Combatant) -> String;
}

/// The same formula for every combatant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemDefaultFormula {
    formula: String,
}

impl SystemDefaultFormula {
    /// Fails if `formula` does not parse.
    pub fn new(formula: impl Into<String>) -> Result<Self, DiceParseError> {
        let formula = formula.into();
        DiceFormula::parse(&formula)?;
        Ok(Self { formula })
    }

    pub fn as_str(&self) -> &str {
        &self.formula
    }
}

impl Default for SystemDefaultFormula {
    fn default() -> Self {
        Self {
            formula: DEFAULT_INITIATIVE_FORMULA.to_string(),
        }
    }
}

impl InitiativeFormula for SystemDefaultFormula {
    fn formula_for(&self, _combatant: &Combatant) -> String {
        self.formula.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_default() {
        assert!(SystemDefaultFormula::new("1d").is_err());
        assert_eq!(SystemDefaultFormula::new("1d20+2").unwrap().as_str(), "1d20+2");
    }

    #[test]
    fn test_default_is_d20() {
        assert_eq!(SystemDefaultFormula::default().as_str(), "1d20");
    }
}
