//! Missing-content checks driven by a completeness rule-set.

use async_trait::async_trait;
use std::sync::Arc;

use qualis_core::record::fields;
use qualis_core::{
    Actor, AgentResult, CompletenessRules, Finding, IssueSeverity, Record, RecordKind,
    RuleIssue, RuleReport,
};

use super::{non_conformance, Agent, AgentError, AgentId};

const MISSING_REFERENCE: &str = "BRCGS 5.7.2";

/// Flags information a record should carry but does not.
///
/// Rule errors become blocking errors; rule warnings and missing elements
/// become requirements. This agent never emits warnings.
pub struct ContentCompletionAgent {
    rules: Arc<dyn CompletenessRules>,
}

impl ContentCompletionAgent {
    pub fn new(rules: Arc<dyn CompletenessRules>) -> Self {
        Self { rules }
    }
}

fn to_finding(issue: &RuleIssue) -> Finding {
    Finding {
        field: issue.field.clone(),
        message: issue.message.clone(),
        reference: issue.reference.clone(),
        example_fix: issue.example_fix.clone(),
    }
}

/// Fold one rule report into the result.
fn absorb(result: &mut AgentResult, report: &RuleReport, field: &str) {
    for issue in &report.issues {
        match issue.severity {
            IssueSeverity::Error => result.errors.push(to_finding(issue)),
            IssueSeverity::Warning => result.requirements.push(to_finding(issue)),
        }
    }

    result.requirements.extend(report.missing_requirements.iter().map(|label| {
        Finding::new(field, format!("Missing: {}", label)).with_reference(MISSING_REFERENCE)
    }));
}

#[async_trait]
impl Agent for ContentCompletionAgent {
    fn id(&self) -> AgentId {
        AgentId::ContentCompletion
    }

    async fn analyze(
        &self,
        record: &Record,
        actor: &Actor,
        kind: RecordKind,
    ) -> Result<AgentResult, AgentError> {
        let mut result = AgentResult::new(self.id().as_str());

        if let Some(nca) = non_conformance(record, kind) {
            if let Some(description) = nca.description() {
                let report = self.rules.validate_description_completeness(description, nca.nc_type);
                absorb(&mut result, &report, fields::NC_DESCRIPTION);
            }

            if let Some(root_cause) = nca.root_cause() {
                let report = self.rules.validate_root_cause_depth(root_cause);
                absorb(&mut result, &report, fields::ROOT_CAUSE_ANALYSIS);
            }

            if let Some(action) = nca.corrective_action() {
                let report = self.rules.validate_corrective_action_specificity(action);
                absorb(&mut result, &report, fields::CORRECTIVE_ACTION);
            }
        }

        result.confidence = if !result.errors.is_empty() {
            0.9
        } else if result.requirements.is_empty() {
            0.7
        } else {
            0.8
        };

        result.reasoning = format!(
            "Content Completion Agent analyzed {} submission. Found {} errors, {} missing requirements. Used rule-based validation against policy schemas.",
            kind,
            result.errors.len(),
            result.requirements.len()
        );

        tracing::debug!(
            agent = %self.id(),
            actor = %actor.id,
            errors = result.errors.len(),
            requirements = result.requirements.len(),
            "Content completion finished"
        );

        Ok(result)
    }
}
