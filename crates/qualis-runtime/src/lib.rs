//! # qualis-runtime
//!
//! Concurrent multi-agent validation for Qualis records.
//!
//! Three independent agents inspect a submitted record: content completion,
//! anomaly detection and context alignment. The orchestrator fans out to the
//! enabled agents, isolates failures, and synthesizes a single verdict in
//! declared agent order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use qualis_core::{RecordKind, StandardRules};
//! use qualis_runtime::{NoHistory, Orchestrator, OrchestratorConfig};
//!
//! let orchestrator = Orchestrator::new(
//!     OrchestratorConfig::default(),
//!     Arc::new(StandardRules::new()),
//!     Arc::new(NoHistory),
//! );
//!
//! let result = orchestrator
//!     .validate_submission(&record, &actor, RecordKind::NonConformance)
//!     .await;
//! println!("Score: {}", result.quality_assessment.score);
//! ```

pub mod agents;
pub mod config;
pub mod history;
pub mod orchestrator;
pub mod synthesizer;

pub use agents::{
    Agent, AgentError, AgentId, AnomalyDetectionAgent, ContentCompletionAgent,
    ContextAlignmentAgent,
};
pub use config::{ConfigError, ConflictStrategy, OrchestratorConfig};
pub use history::{HistoryEntry, HistoryError, HistoryLookup, InMemoryHistory, NoHistory};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, RuntimeError, ValidationReport};
pub use synthesizer::{detect_conflicts, Synthesis, Synthesizer};
