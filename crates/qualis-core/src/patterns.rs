//! Shared text patterns for the scorer and the rule-set.
//!
//! Keyword checks are case-insensitive substring matches; placeholder checks
//! are case-sensitive.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    /// Procedure reference such as `5.7` or `3.11.2`
    pub static ref PROCEDURE_REFERENCE: Regex = Regex::new(
        r"\b\d+\.\d+(?:\.\d+)?\b"
    ).unwrap();

    /// Markdown-style section heading at line start
    pub static ref SECTION_HEADING: Regex = Regex::new(r"(?m)^##").unwrap();

    /// Numbered line (`1.`, `12.`)
    pub static ref NUMBERED_LINE: Regex = Regex::new(r"(?m)^\d+\.").unwrap();

    /// Bulleted line (`-` or `*`)
    pub static ref BULLET_LINE: Regex = Regex::new(r"(?m)^[-*]").unwrap();

    /// Checklist glyphs
    pub static ref CHECKBOX_GLYPH: Regex = Regex::new(r"[☐✓✔]").unwrap();

    /// Bracket checkboxes: `[ ]`, `[x]`, `[✓]`
    pub static ref CHECKBOX_BRACKET: Regex = Regex::new(r"\[\s*[xX✓✔]?\s*\]").unwrap();
}

/// Template placeholders left in unfinished text.
pub const PLACEHOLDERS: &[&str] = &["[TODO]", "[INSERT]", "[ADD]", "[SPECIFY]", "XXX", "TBD", "[...]"];

/// Verbs that make a correction actionable.
pub const ACTION_VERBS: &[&str] = &[
    "quarantine",
    "segregate",
    "isolate",
    "verify",
    "review",
    "monitor",
    "investigate",
    "document",
    "implement",
    "complete",
    "ensure",
];

/// True if the text contains any of the keywords, ignoring case.
pub fn contains_keyword(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

pub fn contains_procedure_reference(text: &str) -> bool {
    PROCEDURE_REFERENCE.is_match(text)
}

/// Number of distinct procedure references.
pub fn count_procedure_references(text: &str) -> usize {
    PROCEDURE_REFERENCE
        .find_iter(text)
        .map(|m| m.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn contains_placeholder(text: &str) -> bool {
    PLACEHOLDERS.iter().any(|p| text.contains(p))
}

pub fn contains_action_verb(text: &str) -> bool {
    contains_keyword(text, ACTION_VERBS)
}

pub fn count_section_headings(text: &str) -> usize {
    SECTION_HEADING.find_iter(text).count()
}

pub fn count_numbered_lines(text: &str) -> usize {
    NUMBERED_LINE.find_iter(text).count()
}

/// Numbered plus bulleted lines.
pub fn count_action_items(text: &str) -> usize {
    count_numbered_lines(text) + BULLET_LINE.find_iter(text).count()
}

/// Checklist items, taking whichever notation the text uses most.
pub fn count_checklist_items(text: &str) -> usize {
    let glyphs = CHECKBOX_GLYPH.find_iter(text).count();
    let brackets = CHECKBOX_BRACKET.find_iter(text).count();
    let numbered = count_numbered_lines(text);
    glyphs.max(brackets).max(numbered)
}

/// Whitespace-separated word count; empty text has zero words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Length in characters.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
