use once_cell::sync::Lazy;
use regex::Regex;

/// Headings that start the part of a document worth matching.
pub const SECTION_HEADINGS: &[&str] = &["skills", "technical skills", "experience", "projects"];

static HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    SECTION_HEADINGS
        .iter()
        .map(|h| Regex::new(&format!("(?i){}", regex::escape(h))).expect("static section regex"))
        .collect()
});

/// Returns `text` from the first case-insensitive occurrence of the
/// highest-priority heading present, or all of `text` if none occurs.
///
/// Headings are tried in `SECTION_HEADINGS` order: a later heading is only
/// used when every earlier one is absent.
pub fn extract_relevant_section(text: &str) -> &str {
    HEADING_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map_or(text, |m| &text[m.start()..])
}
