//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::agents::AgentId;

/// Errors while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// How disagreements between agents are settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Highest-ranked agent wins
    #[default]
    Priority,

    /// Most common severity wins
    Consensus,

    /// Not implemented; conflicts are left pending
    Weighted,
}

/// Which agents run and how their conflicts are resolved.
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub enable_content_completion: bool,
    pub enable_anomaly_detection: bool,
    pub enable_context_alignment: bool,
    pub conflict_resolution: ConflictStrategy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enable_content_completion: true,
            enable_anomaly_detection: true,
            enable_context_alignment: true,
            conflict_resolution: ConflictStrategy::Priority,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Whether an agent with this id should run. Custom agents always run.
    pub fn is_enabled(&self, id: &AgentId) -> bool {
        match id {
            AgentId::ContentCompletion => self.enable_content_completion,
            AgentId::AnomalyDetection => self.enable_anomaly_detection,
            AgentId::ContextAlignment => self.enable_context_alignment,
            AgentId::Custom(_) => true,
        }
    }

    /// Config with every standard agent switched off.
    pub fn none_enabled() -> Self {
        Self {
            enable_content_completion: false,
            enable_anomaly_detection: false,
            enable_context_alignment: false,
            ..Self::default()
        }
    }
}
