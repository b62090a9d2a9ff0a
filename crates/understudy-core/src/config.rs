//! Registry configuration.

use crate::errors::DoubleError;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Registry`](crate::registry::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Name used in log output to tell registries apart.
    pub label: String,
    /// When set, `install` layers over an existing double instead of failing.
    pub allow_override: bool,
    /// When set, deferred results yield to the executor once before settling.
    pub yield_before_settle: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            label: "default".to_string(),
            allow_override: false,
            yield_before_settle: true,
        }
    }
}

impl RegistryConfig {
    /// Creates a default configuration with the given label.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, DoubleError> {
        let config: RegistryConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), DoubleError> {
        if self.label.trim().is_empty() {
            return Err(DoubleError::ConfigError(
                "registry label must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
