//! Combat tracker settings value object
//!
//! Settings are an explicit value handed to every combat operation that needs
//! them; nothing in the domain reads a global config store.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Settings which modify the combat tracker behavior
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatSettings {
    /// Dotted path into actor data for the tracked resource (e.g. "attributes.hp.value")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Skip combatants that are defeated when advancing turns
    #[serde(default)]
    pub skip_defeated: bool,
}

impl CombatSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, path: impl Into<String>) -> Self {
        self.resource = Some(path.into());
        self
    }

    pub fn with_skip_defeated(mut self, skip: bool) -> Self {
        self.skip_defeated = skip;
        self
    }

    /// Reject malformed resource paths.
    pub fn validate(&self) -> Result<(), DomainError> {
        let Some(path) = &self.resource else {
            return Ok(());
        };
        if path.trim().is_empty() {
            return Err(DomainError::validation(
                "tracked resource path cannot be empty",
            ));
        }
        if path.split('.').any(|segment| segment.trim().is_empty()) {
            return Err(DomainError::validation(format!(
                "tracked resource path '{}' has an empty segment",
                path
            )));
        }
        Ok(())
    }

    /// Path segments of the tracked resource, if one is configured.
    pub fn resource_path(&self) -> Option<impl Iterator<Item = &str>> {
        self.resource.as_deref().map(|path| path.split('.'))
    }
}
