//! Validation agents.
//!
//! Each agent inspects a submitted record independently and reports
//! findings with a confidence. The orchestrator runs them concurrently and
//! never branches on the concrete agent type.

mod anomaly_detection;
mod content_completion;
mod context_alignment;
mod traits;

pub use anomaly_detection::AnomalyDetectionAgent;
pub use content_completion::ContentCompletionAgent;
pub use context_alignment::ContextAlignmentAgent;
pub use traits::{Agent, AgentError, AgentId};

use qualis_core::{NonConformance, Record, RecordKind};

/// The non-conformance payload, when both the record and the submitted kind
/// say non-conformance.
pub(crate) fn non_conformance(record: &Record, kind: RecordKind) -> Option<&NonConformance> {
    if kind == RecordKind::NonConformance {
        record.as_non_conformance()
    } else {
        None
    }
}
