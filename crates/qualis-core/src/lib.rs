//! # qualis-core
//!
//! Deterministic building blocks for compliance-record validation.
//!
//! This crate answers, without any I/O or async:
//! - Is this record structurally valid?
//! - Is this free text complete enough for an auditor?
//! - How good is this text, on a 0-100 scale?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same text always produces the same score
//! 2. **No network calls**: All scoring and rules are pattern-based
//! 3. **Bounded**: Every score is within 0-100 and its breakdown sums to it
//!
//! ## Example
//!
//! ```rust,ignore
//! use qualis_core::{QualityScorer, Record, RecordKind};
//!
//! let record = Record::from_file("nca-017.yaml")?;
//! let scorer = QualityScorer::default();
//! let quality = scorer.calculate_field_quality(
//!     "Quarantine batch B-2045 under red hold. Verify within 5 days.",
//!     RecordKind::NonConformance,
//! );
//! println!("{} ({})", quality.score, quality.threshold_met);
//! ```

pub mod patterns;
pub mod record;
pub mod rules;
pub mod scorer;
pub mod types;

// Re-export main types at crate root
pub use record::{
    Actor, ActorRole, MachineStatus, MaintenanceCategory, MaintenanceJob, NonConformance,
    NonConformanceType, Record, RecordError, Urgency,
};
pub use rules::{CompletenessRules, IssueSeverity, RuleIssue, RuleReport, StandardRules};
pub use scorer::{QualityScorer, DEFAULT_THRESHOLD};
pub use types::{
    AgentResult, Conflict, ConflictResolution, ConflictingFinding, Finding, KeywordsDetected,
    QualityBreakdown, QualityScore, RecordKind, Severity, Suggestion, SuggestionSections,
    ValidationResult,
};
