//! Completeness rule-sets.
//!
//! A rule-set inspects one free-text field and reports issues plus the
//! labels of required elements the text is missing. The content-completion
//! agent consumes these reports; `StandardRules` is the production rule-set.

mod standard;

use serde::{Deserialize, Serialize};

use crate::record::NonConformanceType;

pub use standard::StandardRules;

/// Severity of a rule issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// One problem found by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleIssue {
    pub field: String,
    pub message: String,
    pub severity: IssueSeverity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_fix: Option<String>,
}

impl RuleIssue {
    pub fn error(field: &str, message: impl Into<String>) -> Self {
        Self::new(field, message, IssueSeverity::Error)
    }

    pub fn warning(field: &str, message: impl Into<String>) -> Self {
        Self::new(field, message, IssueSeverity::Warning)
    }

    fn new(field: &str, message: impl Into<String>, severity: IssueSeverity) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            severity,
            reference: None,
            example_fix: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_example_fix(mut self, example_fix: impl Into<String>) -> Self {
        self.example_fix = Some(example_fix.into());
        self
    }
}

/// Outcome of one rule function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReport {
    /// False if any issue is an error
    pub valid: bool,
    pub issues: Vec<RuleIssue>,
    /// Labels of required elements the text lacks ("batch/carton numbers")
    pub missing_requirements: Vec<String>,
}

impl RuleReport {
    /// Report for text with nothing to say about it.
    pub fn clean() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    pub(crate) fn from_parts(issues: Vec<RuleIssue>, missing_requirements: Vec<String>) -> Self {
        let valid = !issues.iter().any(|i| i.severity == IssueSeverity::Error);
        Self {
            valid,
            issues,
            missing_requirements,
        }
    }
}

/// Field-level completeness rules for non-conformance text.
///
/// Implementations must be pure: the same text always yields the same report.
pub trait CompletenessRules: Send + Sync {
    fn validate_description_completeness(
        &self,
        description: &str,
        category: NonConformanceType,
    ) -> RuleReport;

    fn validate_root_cause_depth(&self, analysis: &str) -> RuleReport;

    fn validate_corrective_action_specificity(&self, action: &str) -> RuleReport;
}
