//! Dice formula parsing and rolling
//!
//! Supports initiative formulas like "1d20+2", "2d6-1", "d20" and flat values
//! like "12". Randomness is injected so the domain stays deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected XdY, XdY+Z or Z
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Dice count must be at least 1
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
    /// Modifier overflow
    #[error("Modifier value overflow")]
    ModifierOverflow,
}

/// A parsed dice formula like "2d6+3"
///
/// A flat value ("12") is a formula with no dice and the value as modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    /// Number of dice to roll (X in XdY)
    pub dice_count: u8,
    /// Size of each die (Y in XdY)
    pub die_size: u8,
    /// Modifier to add/subtract after rolling (+Z or -Z)
    pub modifier: i32,
}

impl DiceFormula {
    /// Create a new dice formula
    pub fn new(dice_count: u8, die_size: u8, modifier: i32) -> Result<Self, DiceParseError> {
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }
        Self {
            dice_count,
            die_size,
            modifier,
        }
        .checked()
    }

    /// A formula that always yields `value`.
    pub fn flat(value: i32) -> Self {
        Self {
            dice_count: 0,
            die_size: 0,
            modifier: value,
        }
    }

    /// Parse a dice formula string
    ///
    /// Supported formats (whitespace is ignored):
    /// - "XdY" - Roll X dice of size Y
    /// - "XdY+Z" / "XdY-Z" - Roll X dice of size Y, add or subtract Z
    /// - "dY" - Roll 1 die of size Y (shorthand)
    /// - "Z" / "-Z" - A flat value
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let Some(d_pos) = input.find('d') else {
            let value: i32 = input.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", input))
            })?;
            return Ok(Self::flat(value));
        };

        let dice_count_str = &input[..d_pos];
        let dice_count: u8 = if dice_count_str.is_empty() {
            1 // "d20" means "1d20"
        } else {
            dice_count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", dice_count_str))
            })?
        };

        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }

        let after_d = &input[d_pos + 1..];

        let (die_size_str, modifier) = if let Some(plus_pos) = after_d.find('+') {
            let mod_str = &after_d[plus_pos + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '+{}'", mod_str))
            })?;
            (&after_d[..plus_pos], modifier)
        } else if let Some(minus_pos) = after_d.find('-') {
            if minus_pos == 0 {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid die size: '{}'",
                    after_d
                )));
            }
            let mod_str = &after_d[minus_pos + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '-{}'", mod_str))
            })?;
            let modifier = modifier
                .checked_neg()
                .ok_or(DiceParseError::ModifierOverflow)?;
            (&after_d[..minus_pos], modifier)
        } else {
            (after_d, 0)
        };

        let die_size: u8 = die_size_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", die_size_str))
        })?;

        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }

        Self {
            dice_count,
            die_size,
            modifier,
        }
        .checked()
    }

    /// Both ends of the roll range must fit in an `i32`.
    fn checked(self) -> Result<Self, DiceParseError> {
        let dice = i32::from(self.dice_count);
        dice.checked_mul(i32::from(self.die_size))
            .and_then(|max| max.checked_add(self.modifier))
            .and_then(|_| dice.checked_add(self.modifier))
            .ok_or(DiceParseError::ModifierOverflow)?;
        Ok(self)
    }

    /// Roll the dice using `rng(min, max)`, which must return a value in `min..=max`.
    pub fn roll_with(&self, mut rng: impl FnMut(i32, i32) -> i32) -> DiceRollResult {
        let individual_rolls: Vec<i32> = (0..self.dice_count)
            .map(|_| rng(1, self.die_size as i32))
            .collect();

        let dice_total: i32 = individual_rolls.iter().sum();

        DiceRollResult {
            formula: self.clone(),
            individual_rolls,
            dice_total,
            total: dice_total.saturating_add(self.modifier),
        }
    }

    /// Get the minimum possible roll
    pub fn min_roll(&self) -> i32 {
        i32::from(self.dice_count).saturating_add(self.modifier)
    }

    /// Get the maximum possible roll
    pub fn max_roll(&self) -> i32 {
        (i32::from(self.dice_count) * i32::from(self.die_size)).saturating_add(self.modifier)
    }

    pub fn is_flat(&self) -> bool {
        self.dice_count == 0
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_flat() {
            return write!(f, "{}", self.modifier);
        }
        match self.modifier {
            0 => write!(f, "{}d{}", self.dice_count, self.die_size),
            m if m > 0 => write!(f, "{}d{}+{}", self.dice_count, self.die_size, m),
            m => write!(f, "{}d{}{}", self.dice_count, self.die_size, m),
        }
    }
}

/// Result of rolling dice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollResult {
    /// The formula that was rolled
    pub formula: DiceFormula,
    /// Individual die results
    pub individual_rolls: Vec<i32>,
    /// Sum of dice before modifier
    pub dice_total: i32,
    /// Final total (dice_total + modifier)
    pub total: i32,
}

impl DiceRollResult {
    /// Format as a breakdown string (e.g., "1d20[14] + 5 = 19")
    pub fn breakdown(&self) -> String {
        if self.formula.is_flat() {
            return format!("{} = {}", self.formula, self.total);
        }
        let rolls: Vec<String> = self
            .individual_rolls
            .iter()
            .map(|r| r.to_string())
            .collect();
        let dice = format!(
            "{}d{}[{}]",
            self.formula.dice_count,
            self.formula.die_size,
            rolls.join(", ")
        );
        match self.formula.modifier {
            0 => format!("{} = {}", dice, self.total),
            m if m > 0 => format!("{} + {} = {}", dice, m, self.total),
            m => format!("{} - {} = {}", dice, -m, self.total),
        }
    }
}
