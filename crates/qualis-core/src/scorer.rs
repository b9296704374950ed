//! Deterministic quality scoring.
//!
//! Scores free text (or a structured suggestion) from 0 to 100 across five
//! weighted categories: completeness 30, accuracy 25, clarity 20, hazard
//! identification 15, evidence 10. Each category awards fixed increments for
//! keyword groups and structural markers and is capped at its ceiling, so the
//! same text always yields the same score.
//!
//! Non-conformance (NCA) and maintenance job (MJC) text use different
//! profiles. For MJC text the hazard and evidence categories measure safety
//! and post-maintenance verification.

use crate::patterns::{
    char_len, contains_action_verb, contains_keyword, contains_placeholder,
    contains_procedure_reference, count_action_items, count_checklist_items,
    count_numbered_lines, count_procedure_references, count_section_headings, word_count,
};
use crate::types::{QualityBreakdown, QualityScore, RecordKind, Suggestion};

/// Default readiness threshold.
pub const DEFAULT_THRESHOLD: u32 = 75;

/// Stateless quality scorer.
#[derive(Debug, Clone, Copy)]
pub struct QualityScorer {
    threshold: u32,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl QualityScorer {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Score a single field's free text.
    pub fn calculate_field_quality(&self, text: &str, kind: RecordKind) -> QualityScore {
        let breakdown = match kind {
            RecordKind::NonConformance => nca_breakdown(text),
            RecordKind::MaintenanceJob => mjc_breakdown(text),
        };
        QualityScore::from_breakdown(breakdown, self.threshold)
    }

    /// Score a drafted suggestion, using its sections as well as its text.
    pub fn calculate_suggestion_quality(&self, suggestion: &Suggestion, kind: RecordKind) -> QualityScore {
        let breakdown = match kind {
            RecordKind::NonConformance => nca_suggestion_breakdown(suggestion),
            RecordKind::MaintenanceJob => mjc_suggestion_breakdown(suggestion),
        };
        QualityScore::from_breakdown(breakdown, self.threshold)
    }
}

/// Points for `count` occurrences at `each`, capped.
fn per_item(count: usize, each: u32, cap: u32) -> u32 {
    (count as u32).saturating_mul(each).min(cap)
}

fn award(condition: bool, points: u32) -> u32 {
    if condition {
        points
    } else {
        0
    }
}

fn present(section: &Option<String>) -> bool {
    section.as_deref().is_some_and(|s| !s.is_empty())
}

// ============================================================================
// NCA profile
// ============================================================================

fn nca_breakdown(text: &str) -> QualityBreakdown {
    QualityBreakdown::capped(
        nca_completeness(text),
        nca_accuracy(text),
        nca_clarity(text),
        nca_hazard(text),
        nca_evidence(text),
    )
}

fn nca_completeness(text: &str) -> u32 {
    // Immediate correction
    let mut score = award(contains_keyword(text, &["quarantine", "quarantined"]), 3)
        + award(contains_keyword(text, &["red hold", "hold sticker", "hold label"]), 3)
        + award(contains_keyword(text, &["back tracking", "backtracking", "traceability"]), 2)
        + award(contains_keyword(text, &["segregate", "segregation", "isolated"]), 2);

    // Root cause
    score += award(contains_keyword(text, &["root cause", "investigation"]), 5);
    score += award(char_len(text) > 200, 3);
    score += award(contains_procedure_reference(text), 2);

    // Preventive action
    score += award(contains_keyword(text, &["procedure", "training", "review", "monitor"]), 5);
    score += award(count_action_items(text) >= 2, 5);

    score.min(QualityBreakdown::MAX_COMPLETENESS)
}

fn nca_accuracy(text: &str) -> u32 {
    let mut score = per_item(count_procedure_references(text), 5, 10);
    score += award(
        contains_keyword(text, &["non-conformance", "disposition", "corrective action"]),
        5,
    );
    score += award(contains_keyword(text, &["5.7", "3.11", "3.9", "5.8"]), 5);
    score += award(!contains_placeholder(text), 5);
    score.min(QualityBreakdown::MAX_ACCURACY)
}

fn nca_clarity(text: &str) -> u32 {
    let words = word_count(text);
    let score = per_item(count_section_headings(text), 2, 10)
        + award(contains_action_verb(text), 5)
        + award((150..=500).contains(&words), 5);
    score.min(QualityBreakdown::MAX_CLARITY)
}

fn nca_hazard(text: &str) -> u32 {
    let score = award(
        contains_keyword(text, &["food safety", "product safety", "contamination", "hazard"]),
        10,
    ) + award(
        contains_keyword(
            text,
            &["foreign body", "allergen", "microbiological", "chemical", "physical"],
        ),
        5,
    );
    score.min(QualityBreakdown::MAX_HAZARD_IDENTIFICATION)
}

fn nca_evidence(text: &str) -> u32 {
    let score = award(contains_keyword(text, &["verify", "verification", "monitor", "check"]), 5)
        + award(contains_keyword(text, &["days", "weeks", "months", "next", "within"]), 5);
    score.min(QualityBreakdown::MAX_EVIDENCE)
}

fn nca_suggestion_breakdown(suggestion: &Suggestion) -> QualityBreakdown {
    let sections = &suggestion.sections;

    let completeness = award(present(&sections.immediate_correction), 10)
        + award(present(&sections.root_cause), 10)
        + award(present(&sections.corrective_action), 10);

    let accuracy = per_item(suggestion.procedure_references.len(), 5, 15)
        + award(suggestion.keywords_detected.keywords.len() >= 3, 10);

    let text_len = char_len(&suggestion.text);
    let clarity = award((150..=1000).contains(&text_len), 10) + award(present(&sections.verification), 10);

    QualityBreakdown::capped(
        completeness,
        accuracy,
        clarity,
        nca_hazard(&suggestion.text),
        nca_evidence(&suggestion.text),
    )
}

// ============================================================================
// MJC profile
// ============================================================================

fn mjc_breakdown(text: &str) -> QualityBreakdown {
    QualityBreakdown::capped(
        mjc_completeness(text),
        mjc_accuracy(text),
        mjc_clarity(text),
        mjc_safety(text),
        mjc_verification(text),
    )
}

fn mjc_completeness(text: &str) -> u32 {
    let score = award(
        contains_keyword(text, &["part", "component", "removed", "installed", "replaced"]),
        5,
    ) + award(
        contains_keyword(text, &["torque", "specification", "alignment", "calibration"]),
        5,
    ) + award(
        contains_keyword(text, &["loto", "lock out", "tag out", "ppe", "isolation"]),
        10,
    ) + award(
        contains_keyword(text, &["clean as you go", "shadow board", "tool control", "swarf"]),
        10,
    );
    score.min(QualityBreakdown::MAX_COMPLETENESS)
}

/// Checklist items are worth 1.5 points each, rounded down.
fn mjc_accuracy(text: &str) -> u32 {
    let checklist = ((count_checklist_items(text) as u32).saturating_mul(3) / 2).min(15);
    let score = checklist + per_item(count_procedure_references(text), 5, 10);
    score.min(QualityBreakdown::MAX_ACCURACY)
}

fn mjc_clarity(text: &str) -> u32 {
    let words = word_count(text);
    let score = per_item(count_numbered_lines(text), 2, 10)
        + award(contains_keyword(text, &["bearing", "motor", "seal", "gasket", "valve"]), 5)
        + award((100..=400).contains(&words), 5);
    score.min(QualityBreakdown::MAX_CLARITY)
}

fn mjc_safety(text: &str) -> u32 {
    let score = award(contains_keyword(text, &["safety", "hazard", "risk", "danger"]), 5)
        + award(contains_keyword(text, &["guard", "interlock", "e-stop", "emergency"]), 5)
        + award(contains_keyword(text, &["contamination", "hygiene", "food contact"]), 5);
    score.min(QualityBreakdown::MAX_HAZARD_IDENTIFICATION)
}

fn mjc_verification(text: &str) -> u32 {
    let score = award(
        contains_keyword(text, &["functional test", "test run", "verification"]),
        5,
    ) + award(
        contains_keyword(text, &["test samples", "quality check", "qa approval"]),
        5,
    );
    score.min(QualityBreakdown::MAX_EVIDENCE)
}

fn mjc_suggestion_breakdown(suggestion: &Suggestion) -> QualityBreakdown {
    let sections = &suggestion.sections;

    let completeness = award(present(&sections.maintenance_scope), 8)
        + award(present(&sections.safety_considerations), 8)
        + award(present(&sections.contamination_prevention), 7)
        + award(present(&sections.hygiene_clearance), 7);

    // 2.5 points per checklist item, rounded down
    let checklist = sections
        .hygiene_clearance
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| ((count_checklist_items(s) as u32).saturating_mul(5) / 2).min(15))
        .unwrap_or(0);
    let accuracy = checklist + per_item(suggestion.procedure_references.len(), 5, 10);

    let text_len = char_len(&suggestion.text);
    let clarity = award((100..=800).contains(&text_len), 10) + award(present(&sections.verification), 10);

    QualityBreakdown::capped(
        completeness,
        accuracy,
        clarity,
        mjc_safety(&suggestion.text),
        mjc_verification(&suggestion.text),
    )
}
