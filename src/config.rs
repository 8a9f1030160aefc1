//! Run configuration: KDF parameters from an optional JSON file, with
//! per-value command-line overrides applied on top.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub kdf: KdfParams,
}

/// Individual values given on the command line; `None` keeps the file/default value.
#[derive(Debug, Clone, Copy, Default)]
pub struct KdfOverrides {
    pub m_cost: Option<u32>,
    pub t_cost: Option<u32>,
    pub p_cost: Option<u32>,
}

impl Config {
    /// Load from `path`, or use defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn apply(mut self, overrides: KdfOverrides) -> Self {
        if let Some(m) = overrides.m_cost {
            self.kdf.m_cost = m;
        }
        if let Some(t) = overrides.t_cost {
            self.kdf.t_cost = t;
        }
        if let Some(p) = overrides.p_cost {
            self.kdf.p_cost = p;
        }
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.kdf.validate().context("Invalid KDF parameters")
    }
}
