//! Engine configuration from environment variables.

use turnwright_domain::{CombatSettings, DiceParseError, SystemDefaultFormula};

use crate::infrastructure::ports::RollMode;

pub const ENV_INITIATIVE_FORMULA: &str = "TURNWRIGHT_INITIATIVE_FORMULA";
pub const ENV_TRACKED_RESOURCE: &str = "TURNWRIGHT_TRACKED_RESOURCE";
pub const ENV_SKIP_DEFEATED: &str = "TURNWRIGHT_SKIP_DEFEATED";
pub const ENV_ROLL_MODE: &str = "TURNWRIGHT_ROLL_MODE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TURNWRIGHT_INITIATIVE_FORMULA is not a valid dice formula: {0}")]
    InitiativeFormula(#[from] DiceParseError),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub initiative_formula: SystemDefaultFormula,
    pub settings: CombatSettings,
    pub roll_mode: RollMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initiative_formula: SystemDefaultFormula::default(),
            settings: CombatSettings::default(),
            roll_mode: RollMode::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup.
    ///
    /// A malformed formula is an error. Other bad values log a warning and keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(formula) = lookup(ENV_INITIATIVE_FORMULA).filter(|v| !v.trim().is_empty()) {
            config.initiative_formula = SystemDefaultFormula::new(formula.trim())?;
        }

        if let Some(path) = lookup(ENV_TRACKED_RESOURCE).filter(|v| !v.trim().is_empty()) {
            let settings = config.settings.clone().with_resource(path.trim());
            match settings.validate() {
                Ok(()) => config.settings = settings,
                Err(e) => tracing::warn!(error = %e, "Ignoring {}", ENV_TRACKED_RESOURCE),
            }
        }

        if let Some(raw) = lookup(ENV_SKIP_DEFEATED) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.settings.skip_defeated = true,
                "0" | "false" | "no" | "off" | "" => config.settings.skip_defeated = false,
                other => tracing::warn!(value = other, "Ignoring {}", ENV_SKIP_DEFEATED),
            }
        }

        if let Some(raw) = lookup(ENV_ROLL_MODE).filter(|v| !v.trim().is_empty()) {
            match raw.parse::<RollMode>() {
                Ok(mode) => config.roll_mode = mode,
                Err(e) => tracing::warn!(error = %e, "Ignoring {}", ENV_ROLL_MODE),
            }
        }

        Ok(config)
    }
}
