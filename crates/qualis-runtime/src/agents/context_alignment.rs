//! Logical consistency between the free-text fields of a record.
//!
//! Checks that the root cause explains the description, that the corrective
//! action addresses the root cause, and that the category fits the
//! description. Alignment is judged by shared key terms, not semantics.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use qualis_core::record::fields;
use qualis_core::{Actor, AgentResult, Finding, NonConformanceType, Record, RecordKind};

use super::{non_conformance, Agent, AgentError, AgentId};

const ALIGNMENT_REFERENCE: &str = "BRCGS 5.7.2";

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

lazy_static! {
    /// Statement pairs that contradict each other across two texts.
    static ref OPPOSING_PAIRS: Vec<(Regex, Regex)> = vec![
        (Regex::new(r"(?i)not\s+working").unwrap(), Regex::new(r"(?i)working\s+properly").unwrap()),
        (Regex::new(r"(?i)high").unwrap(), Regex::new(r"(?i)low").unwrap()),
        (Regex::new(r"(?i)increased").unwrap(), Regex::new(r"(?i)decreased").unwrap()),
    ];
}

/// Keywords expected in a description of each category, in suggestion order.
const CATEGORY_KEYWORDS: &[(NonConformanceType, &[&str])] = &[
    (NonConformanceType::RawMaterial, &["raw", "material", "ingredient", "supplier", "delivery"]),
    (NonConformanceType::FinishedGoods, &["finished", "product", "packaging", "label", "batch"]),
    (NonConformanceType::Wip, &["work in progress", "wip", "production", "line", "process"]),
    (NonConformanceType::Incident, &["incident", "accident", "injury", "safety", "emergency"]),
];

/// Distinct meaningful words of a text, in first-seen order.
fn key_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split_whitespace()
        .map(|word| {
            word.to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|word| word.len() > 3 && !STOP_WORDS.contains(&word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// True when `source` has terms and none of them appear in `target`.
fn shares_no_terms(source: &str, target: &str) -> bool {
    let source_terms = key_terms(source);
    let target_terms: HashSet<String> = key_terms(target).into_iter().collect();
    !source_terms.is_empty() && !source_terms.iter().any(|t| target_terms.contains(t))
}

fn contradicts(first: &str, second: &str) -> bool {
    OPPOSING_PAIRS.iter().any(|(a, b)| {
        (a.is_match(first) && b.is_match(second)) || (b.is_match(first) && a.is_match(second))
    })
}

fn keywords_for(category: NonConformanceType) -> Option<&'static [&'static str]> {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, keywords)| *keywords)
}

/// Ensures the record's fields tell one consistent story.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAlignmentAgent;

impl ContextAlignmentAgent {
    pub fn new() -> Self {
        Self
    }

    fn check_root_cause(description: &str, root_cause: &str) -> Option<Finding> {
        let message = if shares_no_terms(description, root_cause) {
            "Root cause analysis does not appear to explain the issue described. The root cause should logically connect to what happened in the description.".to_string()
        } else if contradicts(description, root_cause) {
            "Potential contradiction detected: Contradictory statements detected. Please ensure the root cause aligns with the description.".to_string()
        } else {
            return None;
        };

        Some(Finding::new(fields::ROOT_CAUSE_ANALYSIS, message).with_reference(ALIGNMENT_REFERENCE))
    }

    fn check_corrective_action(root_cause: &str, action: &str) -> Option<Finding> {
        if !shares_no_terms(root_cause, action) {
            return None;
        }

        Some(
            Finding::new(
                fields::CORRECTIVE_ACTION,
                "Corrective action does not appear to address the root cause identified. The action should directly respond to the root cause.",
            )
            .with_reference(ALIGNMENT_REFERENCE)
            .with_example_fix("Ensure your corrective action directly addresses the root cause identified above."),
        )
    }

    fn check_category(category: NonConformanceType, description: &str) -> Option<Finding> {
        let expected = keywords_for(category)?;
        let lower = description.to_lowercase();
        if expected.iter().any(|k| lower.contains(k)) {
            return None;
        }

        let suggested = CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(c, _)| *c)
            .unwrap_or(NonConformanceType::Other);

        Some(
            Finding::new(
                fields::NC_TYPE,
                format!(
                    "The description does not contain keywords typically associated with \"{}\" type.",
                    category
                ),
            )
            .with_example_fix(format!(
                "Consider changing NC type to \"{}\" if this better describes the issue.",
                suggested
            )),
        )
    }
}

#[async_trait]
impl Agent for ContextAlignmentAgent {
    fn id(&self) -> AgentId {
        AgentId::ContextAlignment
    }

    async fn analyze(
        &self,
        record: &Record,
        actor: &Actor,
        kind: RecordKind,
    ) -> Result<AgentResult, AgentError> {
        let mut result = AgentResult::new(self.id().as_str());
        result.confidence = 0.75;

        if let Some(nca) = non_conformance(record, kind) {
            let description = nca.description();
            let root_cause = nca.root_cause();

            if let (Some(description), Some(root_cause)) = (description, root_cause) {
                if let Some(error) = Self::check_root_cause(description, root_cause) {
                    result.errors.push(error);
                    result.confidence = 0.9;
                }
            }

            if let (Some(root_cause), Some(action)) = (root_cause, nca.corrective_action()) {
                if let Some(requirement) = Self::check_corrective_action(root_cause, action) {
                    result.requirements.push(requirement);
                    result.confidence = 0.85;
                }
            }

            if let Some(description) = description {
                if let Some(warning) = Self::check_category(nca.nc_type, description) {
                    result.warnings.push(warning);
                    result.confidence = 0.7;
                }
            }
        }

        result.reasoning = format!(
            "Context Alignment Agent analyzed {} submission for logical consistency. Checked alignment between description, root cause, and corrective action. Found {} alignment errors, {} alignment requirements.",
            kind,
            result.errors.len(),
            result.requirements.len()
        );

        tracing::debug!(
            agent = %self.id(),
            actor = %actor.id,
            errors = result.errors.len(),
            requirements = result.requirements.len(),
            warnings = result.warnings.len(),
            "Context alignment finished"
        );

        Ok(result)
    }
}
