//! Core types for findings, agent results and validation verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two record kinds a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Non-conformance advice (NCA)
    #[serde(rename = "nca")]
    NonConformance,

    /// Maintenance job card (MJC)
    #[serde(rename = "mjc")]
    MaintenanceJob,
}

impl RecordKind {
    /// Short identifier used in logs and reasoning strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::NonConformance => "nca",
            RecordKind::MaintenanceJob => "mjc",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nca" | "a" | "non-conformance" => Ok(RecordKind::NonConformance),
            "mjc" | "b" | "maintenance-job" => Ok(RecordKind::MaintenanceJob),
            other => Err(format!("unknown record kind '{}'", other)),
        }
    }
}

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Soft, non-blocking: information the record should carry
    Requirement,

    /// Hard, blocking
    Error,

    /// Advisory only
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Requirement => "requirement",
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observation about one record field.
///
/// The severity is carried by the list the finding sits in
/// (`requirements`, `errors` or `warnings`). For warnings, `example_fix`
/// holds the suggestion shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Record field name (e.g. "nc_description")
    pub field: String,

    /// Human-readable message
    pub message: String,

    /// Procedure or standard reference (e.g. "BRCGS 5.7.2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Example of a fix, or a suggestion for warnings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_fix: Option<String>,
}

impl Finding {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            reference: None,
            example_fix: None,
        }
    }

    /// Attach a procedure reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Attach an example fix or suggestion.
    pub fn with_example_fix(mut self, example_fix: impl Into<String>) -> Self {
        self.example_fix = Some(example_fix.into());
        self
    }
}

/// Output of one agent for one validation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Identifier of the producing agent (e.g. "context-alignment")
    pub agent_id: String,

    pub requirements: Vec<Finding>,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Why the agent reached these findings
    pub reasoning: String,
}

impl AgentResult {
    /// Empty result for an agent.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            requirements: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            confidence: 0.0,
            reasoning: String::new(),
        }
    }

    /// Zero-confidence, empty result standing in for an agent that failed.
    pub fn failed(agent_id: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            reasoning: format!("Agent execution failed: {}", reason),
            ..Self::new(agent_id)
        }
    }

    /// Total number of findings across all severities.
    pub fn finding_count(&self) -> usize {
        self.requirements.len() + self.errors.len() + self.warnings.len()
    }
}

/// Whether a detected conflict has been settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    Pending,
    Resolved,
}

/// One agent's contribution to a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingFinding {
    pub agent_id: String,
    pub severity: Severity,
    pub message: String,
}

/// Two or more agents disagreeing about the severity of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub field: String,
    pub conflicting_agent_ids: Vec<String>,
    pub conflicting_findings: Vec<ConflictingFinding>,
    pub resolution: ConflictResolution,
}

/// Per-category quality points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    /// 0-30
    pub completeness: u32,
    /// 0-25
    pub accuracy: u32,
    /// 0-20
    pub clarity: u32,
    /// 0-15
    pub hazard_identification: u32,
    /// 0-10
    pub evidence: u32,
}

impl QualityBreakdown {
    pub const MAX_COMPLETENESS: u32 = 30;
    pub const MAX_ACCURACY: u32 = 25;
    pub const MAX_CLARITY: u32 = 20;
    pub const MAX_HAZARD_IDENTIFICATION: u32 = 15;
    pub const MAX_EVIDENCE: u32 = 10;

    /// Build a breakdown, clamping every category to its ceiling.
    pub fn capped(
        completeness: u32,
        accuracy: u32,
        clarity: u32,
        hazard_identification: u32,
        evidence: u32,
    ) -> Self {
        Self {
            completeness: completeness.min(Self::MAX_COMPLETENESS),
            accuracy: accuracy.min(Self::MAX_ACCURACY),
            clarity: clarity.min(Self::MAX_CLARITY),
            hazard_identification: hazard_identification.min(Self::MAX_HAZARD_IDENTIFICATION),
            evidence: evidence.min(Self::MAX_EVIDENCE),
        }
    }

    /// Split a 0-100 score across the categories in 30/25/20/15/10 proportion.
    ///
    /// Evidence takes the remainder so the parts always sum to `score`.
    pub fn proportional(score: u32) -> Self {
        let score = score.min(100);
        let part = |weight: f64| (score as f64 * weight).round() as u32;

        let completeness = part(0.30);
        let accuracy = part(0.25);
        let clarity = part(0.20);
        let hazard_identification = part(0.15);
        let evidence = score.saturating_sub(completeness + accuracy + clarity + hazard_identification);

        Self {
            completeness,
            accuracy,
            clarity,
            hazard_identification,
            evidence,
        }
    }

    /// Sum of all categories.
    pub fn total(&self) -> u32 {
        self.completeness + self.accuracy + self.clarity + self.hazard_identification + self.evidence
    }

    /// True when every category respects its ceiling.
    pub fn within_caps(&self) -> bool {
        self.completeness <= Self::MAX_COMPLETENESS
            && self.accuracy <= Self::MAX_ACCURACY
            && self.clarity <= Self::MAX_CLARITY
            && self.hazard_identification <= Self::MAX_HAZARD_IDENTIFICATION
            && self.evidence <= Self::MAX_EVIDENCE
    }
}

/// A 0-100 quality score with its breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScore {
    pub score: u32,
    pub breakdown: QualityBreakdown,
    pub threshold_met: bool,
}

impl QualityScore {
    /// Score derived from a breakdown against a threshold.
    pub fn from_breakdown(breakdown: QualityBreakdown, threshold: u32) -> Self {
        let score = breakdown.total();
        debug_assert!(score <= 100, "quality score {} exceeds 100", score);
        Self {
            score,
            breakdown,
            threshold_met: score >= threshold,
        }
    }
}

/// Final verdict for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub ready_for_submission: bool,
    pub requirements: Vec<Finding>,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub quality_assessment: QualityScore,
}

impl ValidationResult {
    /// Neutral verdict used when no agent is enabled.
    pub fn neutral() -> Self {
        Self {
            valid: true,
            ready_for_submission: true,
            requirements: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            quality_assessment: QualityScore {
                score: 75,
                breakdown: QualityBreakdown::proportional(75),
                threshold_met: true,
            },
        }
    }
}

/// Structured sections of a drafted suggestion.
///
/// NCA drafts use the correction/root-cause/corrective-action sections,
/// MJC drafts the maintenance ones. Both carry `verification`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionSections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immediate_correction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrective_action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_considerations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contamination_prevention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hygiene_clearance: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<String>,
}

/// Keywords a drafting service detected in the source record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordsDetected {
    pub category: String,
    pub keywords: Vec<String>,
}

/// A drafted suggestion to be scored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(default)]
    pub sections: SuggestionSections,
    #[serde(default)]
    pub procedure_references: Vec<String>,
    #[serde(default)]
    pub keywords_detected: KeywordsDetected,
}
