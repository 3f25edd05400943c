// Copyright 2025 Cowboy AI, LLC.

//! Classifier configuration

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{ClassifyError, ClassifyResult};

/// Configuration shared by a catalogue and every catalogue derived from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Deepest nesting one classification call may enter
    pub max_depth: usize,
    /// Allow may-have dispatch nodes when no single key discriminates
    pub may_have_dispatch: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            may_have_dispatch: true,
        }
    }
}

impl ClassifierConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults
    ///
    /// # Errors
    ///
    /// `InvalidConfig` on malformed JSON or out-of-range values
    pub fn from_json(json: &str) -> ClassifyResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable may-have dispatch
    pub fn with_may_have_dispatch(mut self, enabled: bool) -> Self {
        self.may_have_dispatch = enabled;
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `max_depth` is zero
    pub fn validate(&self) -> ClassifyResult<()> {
        if self.max_depth == 0 {
            return Err(ClassifyError::InvalidConfig(
                "max_depth must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
