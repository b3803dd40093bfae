//! Compiler Configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, TemplateError};

/// Options controlling how templates are normalized and compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Unknown keys are configuration errors. When off they are logged and ignored.
    pub strict: bool,
    /// Parse rich-text fragments into detached nodes at compile time when a
    /// renderer is available, instead of on every instantiation.
    pub eager_html: bool,
    /// Log the shape of every compiled unit.
    pub debug: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            strict: true,
            eager_html: true,
            debug: false,
        }
    }
}

impl CompilerConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TemplateError::invalid_value("config", e.to_string()))
    }
}
