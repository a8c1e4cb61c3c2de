// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator-tunable configuration stored in the ledger as string pairs.

use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const IDLE_TIMEOUT: &str = "idle_timeout";
pub const DEFAULT_REGION: &str = "default_region";
pub const AUTO_COMMIT: &str = "auto_commit";
pub const MODEL_REASONING: &str = "model_reasoning";
pub const MODEL_VISION: &str = "model_vision";
pub const AUTO_SHUTDOWN_ON_COMPLETE: &str = "auto_shutdown_on_complete";

pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 3600;
pub const MIN_IDLE_TIMEOUT_SECS: u64 = 60;
pub const MAX_IDLE_TIMEOUT_SECS: u64 = 86_400;

/// Typed view over the raw config map, falling back to defaults for absent
/// or unparsable values.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorConfig {
    pub idle_timeout_secs: u64,
    pub default_region: Region,
    pub auto_commit: bool,
    pub model_reasoning: Option<String>,
    pub model_vision: Option<String>,
    pub auto_shutdown_on_complete: bool,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            default_region: Region::default(),
            auto_commit: true,
            model_reasoning: None,
            model_vision: None,
            auto_shutdown_on_complete: true,
        }
    }
}

impl OperatorConfig {
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        Self {
            idle_timeout_secs: map
                .get(IDLE_TIMEOUT)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.idle_timeout_secs),
            default_region: map
                .get(DEFAULT_REGION)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_region),
            auto_commit: map.get(AUTO_COMMIT).map(|v| v != "false").unwrap_or(defaults.auto_commit),
            model_reasoning: map.get(MODEL_REASONING).cloned(),
            model_vision: map.get(MODEL_VISION).cloned(),
            // Only an explicit "false" disables the cascade
            auto_shutdown_on_complete: map
                .get(AUTO_SHUTDOWN_ON_COMPLETE)
                .map(|v| v != "false")
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSelection {
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub vision: Option<String>,
}

/// Partial config update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(default)]
    pub idle_timeout: Option<u64>,
    #[serde(default)]
    pub default_region: Option<Region>,
    #[serde(default)]
    pub auto_commit: Option<bool>,
    #[serde(default)]
    pub models: Option<ModelSelection>,
    #[serde(default)]
    pub auto_shutdown_on_complete: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("idle timeout must be between 60 and 86400 seconds, got {0}")]
    IdleTimeoutOutOfRange(u64),
}

impl ConfigUpdate {
    /// Validate and flatten into the key/value pairs to write.
    pub fn into_pairs(self) -> Result<Vec<(&'static str, String)>, ConfigError> {
        let mut pairs = Vec::new();
        if let Some(secs) = self.idle_timeout {
            if !(MIN_IDLE_TIMEOUT_SECS..=MAX_IDLE_TIMEOUT_SECS).contains(&secs) {
                return Err(ConfigError::IdleTimeoutOutOfRange(secs));
            }
            pairs.push((IDLE_TIMEOUT, secs.to_string()));
        }
        if let Some(region) = self.default_region {
            pairs.push((DEFAULT_REGION, region.to_string()));
        }
        if let Some(auto_commit) = self.auto_commit {
            pairs.push((AUTO_COMMIT, auto_commit.to_string()));
        }
        if let Some(models) = self.models {
            if let Some(reasoning) = models.reasoning {
                pairs.push((MODEL_REASONING, reasoning));
            }
            if let Some(vision) = models.vision {
                pairs.push((MODEL_VISION, vision));
            }
        }
        if let Some(enabled) = self.auto_shutdown_on_complete {
            pairs.push((AUTO_SHUTDOWN_ON_COMPLETE, enabled.to_string()));
        }
        Ok(pairs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
