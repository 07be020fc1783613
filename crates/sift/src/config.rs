//! Compiler configuration.
//!
//! Both switches default to on. Configuration can be loaded from YAML or
//! JSON; missing keys take their defaults and unknown keys are rejected.
//!
//! ```yaml
//! wildcard_equality: true
//! null_literal: false
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};

/// Switches for the filter-language argument rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Rewrite `field==a*` on string fields to `field LIKE a%` (and `!=`
    /// to `NOT LIKE`).
    pub wildcard_equality: bool,
    /// Treat `field==null` as `IS NULL` (and `!=null` as `IS NOT NULL`).
    pub null_literal: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            wildcard_equality: true,
            null_literal: true,
        }
    }
}

impl CompilerConfig {
    /// Loads configuration from a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yaml::from_str(source).map_err(|e| SiftError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Loads configuration from a JSON document.
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| SiftError::InvalidConfig {
            message: e.to_string(),
        })
    }
}
