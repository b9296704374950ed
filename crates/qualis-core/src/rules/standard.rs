//! Production completeness rules for non-conformance text.

use lazy_static::lazy_static;
use regex::Regex;

use super::{CompletenessRules, RuleIssue, RuleReport};
use crate::patterns::char_len;
use crate::record::{fields, NonConformanceType};

const DESCRIPTION_REFERENCE: &str = "BRCGS 5.7.2";

lazy_static! {
    // Required description elements
    static ref WHAT: Regex = Regex::new(
        r"(?i)\b(what|found|discovered|observed|detected|identified)\b"
    ).unwrap();
    static ref WHEN: Regex = Regex::new(
        r"(?i)\b(\d{1,2}:\d{2}|\d{1,2}/\d{1,2}/\d{4}|today|yesterday|at \d+|on \w+day)\b"
    ).unwrap();
    static ref WHERE: Regex = Regex::new(
        r"(?i)\b(area|line|machine|station|location|section|zone)\b"
    ).unwrap();
    static ref QUANTITY: Regex = Regex::new(
        r"(?i)\b(\d+|approximately|about|around|several|many|few)\b"
    ).unwrap();
    static ref BATCH: Regex = Regex::new(
        r"(?i)\b(batch|carton|reel|box|lot|B-|C-|R-)\b"
    ).unwrap();

    // Vague language, only flagged in short descriptions
    static ref VAGUE_DESCRIPTORS: Regex = Regex::new(
        r"(?i)\b(bad|broken|wrong|issue|problem)\b"
    ).unwrap();
    static ref UNSPECIFIC_QUANTITIES: Regex = Regex::new(
        r"(?i)\b(some|few|many|several)\b"
    ).unwrap();
    static ref NON_SPECIFIC_TERMS: Regex = Regex::new(
        r"(?i)\b(thing|stuff|something|anything)\b"
    ).unwrap();

    static ref CAUSAL_MARKER: Regex = Regex::new(
        r"(?i)\b(why|because|due to|caused by|result of|reason)\b"
    ).unwrap();
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]+").unwrap();
    static ref GENERIC_CAUSES: [Regex; 3] = [
        Regex::new(r"(?i)\b(operator error|human error|mistake|fault|blame)\b").unwrap(),
        Regex::new(r"(?i)\b(machine (issue|problem|broken|failure))\b").unwrap(),
        Regex::new(r"(?i)\b(bad|wrong|incorrect|defective)\b").unwrap(),
    ];

    static ref ACTION_VERB: Regex = Regex::new(
        r"(?i)\b(will|must|shall|implement|add|update|verify|check|train|calibrate|replace|install|modify|create|establish|conduct|perform|review)\b"
    ).unwrap();
    static ref PROCEDURE_MENTION: Regex = Regex::new(
        r"(?i)\b(SOP|BRCGS|procedure|section|5\.\d+|3\.\d+|2\.\d+)\b"
    ).unwrap();
    static ref VERIFICATION_METHOD: Regex = Regex::new(
        r"(?i)\b(verify|check|confirm|validate|monitor|review|audit|inspect|test)\b"
    ).unwrap();
    static ref TIMELINE: Regex = Regex::new(
        r"(?i)\b(within|by|due|deadline|target|schedule|next|weekly|monthly|daily|immediately)\b"
    ).unwrap();
}

/// Minimum description length for a category.
fn minimum_description_length(category: NonConformanceType) -> usize {
    match category {
        NonConformanceType::RawMaterial => 120,
        NonConformanceType::FinishedGoods => 150,
        NonConformanceType::Wip => 130,
        NonConformanceType::Incident => 200,
        NonConformanceType::Other => 100,
    }
}

/// Rule-set enforcing the site's BRCGS completeness expectations.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    pub fn new() -> Self {
        Self
    }
}

impl CompletenessRules for StandardRules {
    fn validate_description_completeness(
        &self,
        description: &str,
        category: NonConformanceType,
    ) -> RuleReport {
        let mut issues = Vec::new();
        let mut missing = Vec::new();

        let min = minimum_description_length(category);
        let length = char_len(description);
        if length < min {
            issues.push(
                RuleIssue::error(
                    fields::NC_DESCRIPTION,
                    format!(
                        "Description must be at least {} characters for {} non-conformances.",
                        min,
                        category.label()
                    ),
                )
                .with_reference(DESCRIPTION_REFERENCE)
                .with_example_fix(
                    "Example: \"Laminate delamination found on batch B-2045 during inspection at 14:30 in Finishing Area 2. Approximately 150 units affected. No product release yet.\"",
                ),
            );
        }

        let has_time = WHEN.is_match(description);
        let elements: [(bool, &str); 5] = [
            (WHAT.is_match(description), "what happened"),
            (has_time, "when it occurred (time/date)"),
            (WHERE.is_match(description), "where it occurred (location/area)"),
            (QUANTITY.is_match(description), "quantity affected"),
            (BATCH.is_match(description), "batch/carton numbers"),
        ];
        missing.extend(
            elements
                .iter()
                .filter(|(found, _)| !found)
                .map(|(_, label)| label.to_string()),
        );

        if !missing.is_empty() {
            issues.push(
                RuleIssue::warning(
                    fields::NC_DESCRIPTION,
                    format!("Description incomplete. Please add: {}.", missing.join(", ")),
                )
                .with_reference(DESCRIPTION_REFERENCE),
            );
        }

        if length < 100 {
            let vague: Vec<&str> = [
                (&*VAGUE_DESCRIPTORS, "vague descriptors"),
                (&*UNSPECIFIC_QUANTITIES, "unspecific quantities"),
                (&*NON_SPECIFIC_TERMS, "non-specific terms"),
            ]
            .iter()
            .filter(|(pattern, _)| pattern.is_match(description))
            .map(|(_, phrase)| *phrase)
            .collect();

            if !vague.is_empty() {
                issues.push(
                    RuleIssue::warning(
                        fields::NC_DESCRIPTION,
                        format!(
                            "Description contains vague language ({}). Please be more specific with details, measurements, and quantities.",
                            vague.join(", ")
                        ),
                    )
                    .with_example_fix(
                        "Instead of \"bad product\", describe what was wrong: \"Seal integrity failure - side seal temperature 5°C below specification\"",
                    ),
                );
            }
        }

        if category == NonConformanceType::Incident && !has_time {
            issues.push(
                RuleIssue::error(
                    fields::NC_DESCRIPTION,
                    "Incident descriptions must include the time of occurrence (e.g., \"at 14:30\" or \"on 10-Oct at 15:00\").",
                )
                .with_reference("BRCGS 5.7 Section 2.1"),
            );
        }

        RuleReport::from_parts(issues, missing)
    }

    fn validate_root_cause_depth(&self, analysis: &str) -> RuleReport {
        let trimmed = analysis.trim();
        if trimmed.is_empty() {
            return RuleReport::clean();
        }

        let markers = CAUSAL_MARKER.find_iter(trimmed).count();
        let sentences = SENTENCE_BREAK
            .split(trimmed)
            .filter(|s| !s.trim().is_empty())
            .count();

        let shallow = sentences <= 1 && markers < 2;
        let generic = markers < 3 && GENERIC_CAUSES.iter().any(|p| p.is_match(trimmed));

        let mut issues = Vec::new();
        let mut missing = Vec::new();

        if shallow {
            issues.push(
                RuleIssue::error(
                    fields::ROOT_CAUSE_ANALYSIS,
                    "Root cause analysis is too shallow. Use the 5-Why method: Why did this happen? → [cause]. Why? → [deeper cause]. Why? → [root cause].",
                )
                .with_reference("BRCGS 5.7 Section 4")
                .with_example_fix(
                    "Example: \"Why did delamination occur? → Adhesive temperature too low. Why? → Heater malfunction. Why? → Sensor drift. Why? → Calibration overdue by 3 weeks.\"",
                ),
            );
            missing.push("multiple layers of \"why\" analysis".to_string());
        } else if generic {
            issues.push(
                RuleIssue::error(
                    fields::ROOT_CAUSE_ANALYSIS,
                    "Root cause analysis is too generic. Please be more specific. Instead of \"operator error\", explain: Why did the operator make the error? Was training adequate? Was the procedure clear?",
                )
                .with_example_fix(
                    "Instead of \"operator error\", use: \"Operator did not follow first-off checklist → Checklist not visibly posted at machine → Housekeeping procedure does not include checklist positioning verification\"",
                ),
            );
            missing.push("specific root cause identification".to_string());
        } else if markers < 3 && char_len(trimmed) > 50 {
            issues.push(RuleIssue::warning(
                fields::ROOT_CAUSE_ANALYSIS,
                "Root cause analysis needs more depth. Please add at least one more \"why\" layer to identify the underlying cause.",
            ));
            missing.push("additional \"why\" layers".to_string());
        }

        RuleReport::from_parts(issues, missing)
    }

    fn validate_corrective_action_specificity(&self, action: &str) -> RuleReport {
        let trimmed = action.trim();
        if trimmed.is_empty() {
            return RuleReport::clean();
        }

        let mut issues = Vec::new();
        let mut missing = Vec::new();

        if ACTION_VERB.find_iter(trimmed).count() < 2 {
            issues.push(
                RuleIssue::warning(
                    fields::CORRECTIVE_ACTION,
                    "Include at least 2 specific actions (e.g., \"1) Calibrate all sensors immediately. 2) Update maintenance schedule.\")",
                )
                .with_example_fix(
                    "Example: \"1) Calibrate all adhesive temperature sensors immediately. 2) Implement weekly sensor checks per BRCGS 5.6.\"",
                ),
            );
            missing.push("multiple specific actions".to_string());
        }

        if !PROCEDURE_MENTION.is_match(trimmed) {
            issues.push(
                RuleIssue::warning(
                    fields::CORRECTIVE_ACTION,
                    "Reference relevant procedures (e.g., \"as per SOP 5.7\" or \"BRCGS Section 5.3\")",
                )
                .with_reference("BRCGS 5.7 Section 5")
                .with_example_fix("Example: \"Update maintenance schedule per BRCGS 5.6 Calibration Procedure\""),
            );
            missing.push("procedure reference".to_string());
        }

        if !VERIFICATION_METHOD.is_match(trimmed) {
            issues.push(
                RuleIssue::warning(
                    fields::CORRECTIVE_ACTION,
                    "Include a verification method (e.g., \"QA will verify on next batch\" or \"Maintenance will check weekly\")",
                )
                .with_example_fix("Example: \"QA will verify effectiveness on next batch (due 10-Oct)\""),
            );
            missing.push("verification method".to_string());
        }

        if !TIMELINE.is_match(trimmed) {
            issues.push(
                RuleIssue::warning(
                    fields::CORRECTIVE_ACTION,
                    "Include a timeline for verification (e.g., \"due 10-Oct\" or \"within 5 days\")",
                )
                .with_example_fix("Example: \"QA will verify on next batch (due 10-Oct)\""),
            );
            missing.push("verification timeline".to_string());
        }

        RuleReport::from_parts(issues, missing)
    }
}
