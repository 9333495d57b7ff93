//! Value objects for the combat domain

mod dice;
mod round;
mod settings;

pub use dice::{DiceFormula, DiceParseError, DiceRollResult};
pub use round::{Round, RoundHistory};
pub use settings::CombatSettings;
