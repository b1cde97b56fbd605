//! Branch configuration
//!
//! The data part of [`BranchOptions`] loaded from TOML. Actions, selectors,
//! utils and extension reducers are code and are added to the resulting
//! options afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::branch::BranchOptions;
use crate::error::Result;

/// Branch configuration, e.g.
///
/// ```toml
/// name = "todos"
///
/// [constants]
/// TOGGLE = "todos/TOGGLE"
///
/// [default_item]
/// text = ""
/// isDone = false
///
/// [default_state]
/// loading = false
///
/// [default_state.items."1"]
/// text = "First"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchConfig {
    pub name: String,

    /// Extra constants, keyed by constant name
    #[serde(default)]
    pub constants: BTreeMap<String, String>,

    #[serde(default)]
    pub default_item: Option<Value>,

    #[serde(default)]
    pub default_state: Option<Value>,
}

impl BranchConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!(
            "Loaded branch config '{}' from {}",
            config.name,
            path.display()
        );
        Ok(config)
    }

    pub fn into_options(self) -> BranchOptions {
        self.into()
    }
}

impl From<BranchConfig> for BranchOptions {
    fn from(config: BranchConfig) -> Self {
        let mut options = BranchOptions::new(config.name).constants(config.constants);
        if let Some(default_item) = config.default_item {
            options = options.default_item(default_item);
        }
        if let Some(default_state) = config.default_state {
            options = options.default_state(default_state);
        }
        options
    }
}
