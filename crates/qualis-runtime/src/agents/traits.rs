//! Agent trait and common types.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use qualis_core::{Actor, AgentResult, Record, RecordKind};

use crate::history::HistoryError;

/// Errors from agents.
///
/// The orchestrator converts any of these into a zero-confidence result, so
/// an agent error never fails a validation.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("History lookup failed: {0}")]
    Lookup(#[from] HistoryError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Identity of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgentId {
    ContentCompletion,
    AnomalyDetection,
    ContextAlignment,

    /// Agent supplied by the embedding application
    Custom(String),
}

impl AgentId {
    pub fn as_str(&self) -> &str {
        match self {
            AgentId::ContentCompletion => "content-completion",
            AgentId::AnomalyDetection => "anomaly-detection",
            AgentId::ContextAlignment => "context-alignment",
            AgentId::Custom(name) => name.as_str(),
        }
    }

    /// Rank under the priority strategy; higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            AgentId::ContextAlignment => 3,
            AgentId::AnomalyDetection => 2,
            AgentId::ContentCompletion => 1,
            AgentId::Custom(_) => 0,
        }
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        match id {
            "content-completion" => AgentId::ContentCompletion,
            "anomaly-detection" => AgentId::AnomalyDetection,
            "context-alignment" => AgentId::ContextAlignment,
            other => AgentId::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An independent analyzer of submitted records.
///
/// # Isolation Contract
/// - No shared mutable state between agents
/// - No access to other agents' results during analysis
/// - Only read-only calls to injected collaborators
#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> AgentId;

    /// Analyze one record.
    ///
    /// `kind` is the kind the caller submitted the record as; NCA-only
    /// checks run when it and the record agree.
    async fn analyze(
        &self,
        record: &Record,
        actor: &Actor,
        kind: RecordKind,
    ) -> Result<AgentResult, AgentError>;
}
