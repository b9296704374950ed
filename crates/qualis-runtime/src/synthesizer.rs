//! Synthesizer: aggregates agent results into one verdict.
//!
//! Aggregation is order-sensitive and always runs in declared agent order:
//! 1. Findings are concatenated agent by agent
//! 2. Score is the rounded mean confidence, split 30/25/20/15/10
//! 3. `valid` requires no errors and a score at or above the threshold
//! 4. Fields on which agents disagree about severity become conflicts,
//!    resolved per the configured strategy

use std::cmp::Reverse;
use std::collections::BTreeMap;

use qualis_core::{
    AgentResult, Conflict, ConflictResolution, ConflictingFinding, Finding, QualityBreakdown,
    QualityScore, Severity, ValidationResult, DEFAULT_THRESHOLD,
};

use crate::agents::AgentId;
use crate::config::ConflictStrategy;

/// Outcome of synthesis: the verdict and the conflicts behind it.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub result: ValidationResult,
    pub conflicts: Vec<Conflict>,
}

/// Findings re-emitted by conflict resolution.
#[derive(Debug, Default)]
struct Resolved {
    requirements: Vec<Finding>,
    errors: Vec<Finding>,
}

impl Resolved {
    fn push(&mut self, severity: Severity, finding: Finding) {
        match severity {
            Severity::Error => self.errors.push(finding),
            _ => self.requirements.push(finding),
        }
    }
}

/// The Synthesizer aggregates agent results into a `ValidationResult`.
pub struct Synthesizer {
    strategy: ConflictStrategy,
    threshold: u32,
}

impl Synthesizer {
    pub fn new(strategy: ConflictStrategy) -> Self {
        Self {
            strategy,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Synthesize results given in declared agent order.
    pub fn synthesize(&self, results: &[AgentResult]) -> Synthesis {
        let mut requirements = Vec::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for result in results {
            requirements.extend(result.requirements.iter().cloned());
            errors.extend(result.errors.iter().cloned());
            warnings.extend(result.warnings.iter().cloned());
        }

        let quality_assessment = self.assess(results);

        // Verdict is taken before resolved findings are appended
        let valid = errors.is_empty() && quality_assessment.threshold_met;

        let mut conflicts = detect_conflicts(results);
        let resolved = self.resolve(&mut conflicts);
        requirements.extend(resolved.requirements);
        errors.extend(resolved.errors);

        tracing::info!(
            valid,
            score = quality_assessment.score,
            errors = errors.len(),
            requirements = requirements.len(),
            warnings = warnings.len(),
            conflicts = conflicts.len(),
            "Validation synthesized"
        );

        Synthesis {
            result: ValidationResult {
                valid,
                ready_for_submission: valid,
                requirements,
                errors,
                warnings,
                quality_assessment,
            },
            conflicts,
        }
    }

    /// Score from the mean agent confidence.
    fn assess(&self, results: &[AgentResult]) -> QualityScore {
        let score = mean_confidence_score(results);
        QualityScore {
            score,
            breakdown: QualityBreakdown::proportional(score),
            threshold_met: score >= self.threshold,
        }
    }

    fn resolve(&self, conflicts: &mut [Conflict]) -> Resolved {
        let mut resolved = Resolved::default();

        match self.strategy {
            ConflictStrategy::Priority => {
                for conflict in conflicts.iter_mut() {
                    if let Some((severity, finding)) = resolve_by_priority(conflict) {
                        resolved.push(severity, finding);
                        conflict.resolution = ConflictResolution::Resolved;
                    }
                }
            }
            ConflictStrategy::Consensus => {
                for conflict in conflicts.iter_mut() {
                    if let Some((severity, finding)) = resolve_by_consensus(conflict) {
                        resolved.push(severity, finding);
                        conflict.resolution = ConflictResolution::Resolved;
                    }
                }
            }
            ConflictStrategy::Weighted => {
                if !conflicts.is_empty() {
                    tracing::warn!(
                        conflicts = conflicts.len(),
                        "Weighted conflict resolution is not implemented, conflicts left pending"
                    );
                }
            }
        }

        resolved
    }
}

/// `round(100 * mean confidence)`, clamped to 0-100. Zero results score 0.
fn mean_confidence_score(results: &[AgentResult]) -> u32 {
    if results.is_empty() {
        return 0;
    }
    let mean = results.iter().map(|r| r.confidence).sum::<f64>() / results.len() as f64;
    (mean * 100.0).round().clamp(0.0, 100.0) as u32
}

/// Group requirements and errors by field; a field raised by two or more
/// agents with differing severities is a conflict. Warnings never conflict.
pub fn detect_conflicts(results: &[AgentResult]) -> Vec<Conflict> {
    let mut by_field: BTreeMap<&str, Vec<ConflictingFinding>> = BTreeMap::new();

    for result in results {
        let tagged = result
            .requirements
            .iter()
            .map(|f| (Severity::Requirement, f))
            .chain(result.errors.iter().map(|f| (Severity::Error, f)));

        for (severity, finding) in tagged {
            by_field
                .entry(finding.field.as_str())
                .or_default()
                .push(ConflictingFinding {
                    agent_id: result.agent_id.clone(),
                    severity,
                    message: finding.message.clone(),
                });
        }
    }

    let conflicts: Vec<Conflict> = by_field
        .into_iter()
        .filter_map(|(field, findings)| {
            let mut agent_ids: Vec<String> = Vec::new();
            let mut severities: Vec<Severity> = Vec::new();
            for f in &findings {
                if !agent_ids.contains(&f.agent_id) {
                    agent_ids.push(f.agent_id.clone());
                }
                if !severities.contains(&f.severity) {
                    severities.push(f.severity);
                }
            }

            (agent_ids.len() >= 2 && severities.len() > 1).then(|| Conflict {
                field: field.to_string(),
                conflicting_agent_ids: agent_ids,
                conflicting_findings: findings,
                resolution: ConflictResolution::Pending,
            })
        })
        .collect();

    for conflict in &conflicts {
        tracing::debug!(
            field = %conflict.field,
            agents = ?conflict.conflicting_agent_ids,
            "Conflict detected"
        );
    }

    conflicts
}

/// The highest-ranked agent's first finding on the field, stripped to
/// field and message.
fn resolve_by_priority(conflict: &Conflict) -> Option<(Severity, Finding)> {
    // min_by_key keeps the first of equally ranked agents
    let winner = conflict
        .conflicting_agent_ids
        .iter()
        .min_by_key(|id| Reverse(AgentId::from(id.as_str()).priority()))?;

    conflict
        .conflicting_findings
        .iter()
        .find(|f| &f.agent_id == winner)
        .map(|f| (f.severity, Finding::new(conflict.field.clone(), f.message.clone())))
}

/// The most common severity (ties go to the first seen) and its first finding.
fn resolve_by_consensus(conflict: &Conflict) -> Option<(Severity, Finding)> {
    let mut tally: Vec<(Severity, usize)> = Vec::new();
    for f in &conflict.conflicting_findings {
        match tally.iter_mut().find(|(s, _)| *s == f.severity) {
            Some((_, count)) => *count += 1,
            None => tally.push((f.severity, 1)),
        }
    }

    let (majority, _) = tally
        .iter()
        .copied()
        .min_by_key(|(_, count)| Reverse(*count))?;

    conflict
        .conflicting_findings
        .iter()
        .find(|f| f.severity == majority)
        .map(|f| (majority, Finding::new(conflict.field.clone(), f.message.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn result(agent: &str, confidence: f64) -> AgentResult {
        AgentResult {
            confidence,
            ..AgentResult::new(agent)
        }
    }

    fn with_requirement(mut r: AgentResult, field: &str, message: &str) -> AgentResult {
        r.requirements.push(Finding::new(field, message).with_reference("BRCGS 5.7.2"));
        r
    }

    fn with_error(mut r: AgentResult, field: &str, message: &str) -> AgentResult {
        r.errors.push(Finding::new(field, message).with_example_fix("fix it"));
        r
    }

    #[test]
    fn test_mean_confidence_score() {
        let results = vec![
            result("content-completion", 0.9),
            result("anomaly-detection", 0.6),
            result("context-alignment", 0.3),
        ];
        let synthesis = Synthesizer::new(ConflictStrategy::Priority).synthesize(&results);
        assert_eq!(synthesis.result.quality_assessment.score, 60);
        assert!(!synthesis.result.valid);
    }

    #[test]
    fn test_failed_agent_drags_score_down() {
        let results = vec![
            result("content-completion", 0.8),
            AgentResult::failed("anomaly-detection", "boom"),
            result("context-alignment", 0.8),
        ];
        let synthesis = Synthesizer::new(ConflictStrategy::Priority).synthesize(&results);
        assert_eq!(synthesis.result.quality_assessment.score, 53);
    }

    #[test]
    fn test_valid_needs_threshold_and_no_errors() {
        let clean = vec![result("content-completion", 0.8), result("context-alignment", 0.7)];
        let synthesis = Synthesizer::new(ConflictStrategy::Priority).synthesize(&clean);
        assert_eq!(synthesis.result.quality_assessment.score, 75);
        assert!(synthesis.result.valid);
        assert!(synthesis.result.ready_for_submission);

        let with_errors = vec![
            with_error(result("content-completion", 0.9), "nc_description", "Too short"),
            result("context-alignment", 0.9),
        ];
        let synthesis = Synthesizer::new(ConflictStrategy::Priority).synthesize(&with_errors);
        assert!(synthesis.result.quality_assessment.threshold_met);
        assert!(!synthesis.result.valid);
    }

    #[test]
    fn test_findings_concatenated_in_given_order() {
        let results = vec![
            with_requirement(result("content-completion", 0.8), "nc_description", "first"),
            with_requirement(result("context-alignment", 0.8), "nc_type", "second"),
        ];
        let synthesis = Synthesizer::new(ConflictStrategy::Priority).synthesize(&results);
        let messages: Vec<&str> = synthesis.result.requirements.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_conflict_detected_between_two_agents() {
        let results = vec![
            with_requirement(result("content-completion", 0.8), "root_cause_analysis", "Needs more depth"),
            with_error(result("context-alignment", 0.9), "root_cause_analysis", "Does not explain"),
        ];
        let conflicts = detect_conflicts(&results);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].field, "root_cause_analysis");
        assert_eq!(
            conflicts[0].conflicting_agent_ids,
            vec!["content-completion".to_string(), "context-alignment".to_string()]
        );
        assert_eq!(conflicts[0].resolution, ConflictResolution::Pending);
    }

    #[test]
    fn test_same_severity_or_single_agent_is_not_a_conflict() {
        let agreeing = vec![
            with_error(result("content-completion", 0.9), "nc_description", "a"),
            with_error(result("context-alignment", 0.9), "nc_description", "b"),
        ];
        assert!(detect_conflicts(&agreeing).is_empty());

        let single = vec![with_error(
            with_requirement(result("content-completion", 0.9), "nc_description", "a"),
            "nc_description",
            "b",
        )];
        assert!(detect_conflicts(&single).is_empty());
    }

    #[test]
    fn test_warnings_never_conflict() {
        let mut anomaly = result("anomaly-detection", 0.7);
        anomaly.warnings.push(Finding::new("nc_description", "Odd quantity"));
        let results = vec![
            with_error(result("content-completion", 0.9), "nc_description", "Too short"),
            anomaly,
        ];
        assert!(detect_conflicts(&results).is_empty());
    }

    #[test]
    fn test_conflicts_ordered_by_field() {
        let results = vec![
            with_requirement(
                with_requirement(result("content-completion", 0.8), "root_cause_analysis", "r"),
                "corrective_action",
                "c",
            ),
            with_error(
                with_error(result("context-alignment", 0.9), "root_cause_analysis", "r2"),
                "corrective_action",
                "c2",
            ),
        ];
        let fields: Vec<String> = detect_conflicts(&results).into_iter().map(|c| c.field).collect();
        assert_eq!(fields, vec!["corrective_action", "root_cause_analysis"]);
    }

    #[test]
    fn test_priority_resolution_prefers_context_alignment() {
        let results = vec![
            with_requirement(result("content-completion", 0.8), "root_cause_analysis", "Needs more depth"),
            with_error(result("context-alignment", 0.9), "root_cause_analysis", "Does not explain"),
        ];
        let synthesis = Synthesizer::new(ConflictStrategy::Priority).synthesize(&results);

        assert_eq!(synthesis.conflicts[0].resolution, ConflictResolution::Resolved);
        let errors = &synthesis.result.errors;
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1], Finding::new("root_cause_analysis", "Does not explain"));
        assert_eq!(synthesis.result.requirements.len(), 1);
    }

    #[test]
    fn test_priority_winner_is_highest_ranked_not_first_listed() {
        let results = vec![
            with_error(result("content-completion", 0.8), "corrective_action", "Too vague"),
            with_requirement(result("anomaly-detection", 0.8), "corrective_action", "Unusual"),
        ];
        let synthesis = Synthesizer::new(ConflictStrategy::Priority).synthesize(&results);

        assert_eq!(synthesis.result.requirements.last(), Some(&Finding::new("corrective_action", "Unusual")));
        assert_eq!(synthesis.result.errors.len(), 1);
    }

    #[test]
    fn test_resolved_findings_do_not_change_verdict() {
        let results = vec![
            with_requirement(result("content-completion", 0.8), "nc_type", "Check category"),
            with_requirement(result("anomaly-detection", 0.8), "nc_type", "Frequent"),
            with_error(result("context-alignment", 0.8), "nc_type", "Mismatch"),
        ];
        let synthesis = Synthesizer::new(ConflictStrategy::Consensus).synthesize(&results);

        // The aggregated error already blocks; consensus adds a requirement
        assert!(!synthesis.result.valid);
        assert_eq!(synthesis.result.requirements.len(), 3);
        assert_eq!(
            synthesis.result.requirements[2],
            Finding::new("nc_type", "Check category")
        );
    }

    #[test]
    fn test_consensus_tie_goes_to_first_seen() {
        let results = vec![
            with_error(result("content-completion", 0.8), "nc_description", "Too short"),
            with_requirement(result("context-alignment", 0.8), "nc_description", "Add batch"),
        ];
        let synthesis = Synthesizer::new(ConflictStrategy::Consensus).synthesize(&results);

        assert_eq!(synthesis.result.errors.len(), 2);
        assert_eq!(synthesis.result.errors[1], Finding::new("nc_description", "Too short"));
    }

    #[test]
    fn test_weighted_is_a_no_op() {
        let results = vec![
            with_requirement(result("content-completion", 0.8), "root_cause_analysis", "Needs more depth"),
            with_error(result("context-alignment", 0.9), "root_cause_analysis", "Does not explain"),
        ];
        let synthesis = Synthesizer::new(ConflictStrategy::Weighted).synthesize(&results);

        assert_eq!(synthesis.conflicts.len(), 1);
        assert_eq!(synthesis.conflicts[0].resolution, ConflictResolution::Pending);
        assert_eq!(synthesis.result.errors.len(), 1);
        assert_eq!(synthesis.result.requirements.len(), 1);
        // Original metadata is untouched
        assert!(synthesis.result.requirements[0].reference.is_some());
    }

    #[test]
    fn test_empty_results_score_zero() {
        let synthesis = Synthesizer::new(ConflictStrategy::Priority).synthesize(&[]);
        assert_eq!(synthesis.result.quality_assessment.score, 0);
        assert!(!synthesis.result.valid);
    }

    proptest! {
        #[test]
        fn prop_score_bounds_and_breakdown(confidences in proptest::collection::vec(0.0f64..=1.0, 1..6)) {
            let results: Vec<AgentResult> = confidences
                .iter()
                .enumerate()
                .map(|(i, c)| result(&format!("agent-{}", i), *c))
                .collect();
            let synthesis = Synthesizer::new(ConflictStrategy::Priority).synthesize(&results);
            let quality = synthesis.result.quality_assessment;

            prop_assert!(quality.score <= 100);
            prop_assert_eq!(quality.breakdown.total(), quality.score);
            prop_assert!(quality.breakdown.within_caps());
            prop_assert_eq!(quality.threshold_met, quality.score >= 75);
            prop_assert_eq!(synthesis.result.valid, quality.score >= 75);
        }
    }
}
