//! Skill Matcher — finds which vocabulary skills are present in free text.
//!
//! Algorithm, per compiled skill:
//! 1. Test the skill's pattern against the normalized text (word boundaries,
//!    relaxed `/`, `+`, `.` runs, case-insensitive).
//! 2. If that fails, look for any of the skill's known variations as a
//!    literal substring.
//!
//! A skill with no variations simply skips step 2.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::matching::normalizer::{normalize_for_matching, NormalizedText};
use crate::matching::vocabulary::{CompiledSkill, SkillVocabulary};

/// Set of skill strings. Sorted iteration keeps output deterministic.
pub type SkillSet = BTreeSet<String>;

#[derive(Debug, Clone)]
pub struct SkillMatcher {
    vocabulary: Arc<SkillVocabulary>,
}

impl SkillMatcher {
    pub fn new(vocabulary: Arc<SkillVocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    /// Returns every vocabulary skill present in `text`.
    pub fn extract_skills(&self, text: &str) -> SkillSet {
        let normalized = normalize_for_matching(text);
        let found: SkillSet = self
            .vocabulary
            .iter()
            .filter(|skill| matches_skill(skill, &normalized))
            .map(|skill| skill.canonical().to_string())
            .collect();

        debug!(
            "Matched {} of {} vocabulary skills in {} chars",
            found.len(),
            self.vocabulary.len(),
            text.len()
        );
        found
    }

    /// True if `skill` is in the vocabulary and present in `text`.
    pub fn contains_skill(&self, text: &str, skill: &str) -> bool {
        let wanted = normalize_for_matching(skill);
        let normalized = normalize_for_matching(text);
        self.vocabulary
            .iter()
            .find(|s| s.canonical() == wanted.as_str())
            .map(|s| matches_skill(s, &normalized))
            .unwrap_or(false)
    }
}

fn matches_skill(skill: &CompiledSkill, text: &NormalizedText) -> bool {
    if skill.pattern().is_match(text.as_str()) {
        return true;
    }
    skill
        .variations()
        .iter()
        .any(|variation| text.as_str().contains(variation.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::vocabulary::DEFAULT_SKILLS;

    fn matcher() -> SkillMatcher {
        SkillMatcher::new(Arc::new(SkillVocabulary::builtin().unwrap()))
    }

    #[test]
    fn test_every_skill_matches_itself() {
        let matcher = matcher();
        for skill in DEFAULT_SKILLS {
            let text = format!("... {skill} ...");
            let found = matcher.extract_skills(&text);
            assert!(found.contains(*skill), "{skill} did not match itself: {found:?}");
        }
    }

    #[test]
    fn test_every_skill_matches_uppercased() {
        let matcher = matcher();
        for skill in DEFAULT_SKILLS {
            let text = format!("Proficient in {}.", skill.to_uppercase());
            assert!(matcher.extract_skills(&text).contains(*skill), "{skill}");
        }
    }

    #[test]
    fn test_ci_cd_spaced() {
        assert!(matcher().extract_skills("I used ci cd daily").contains("ci/cd"));
    }

    #[test]
    fn test_ci_cd_variants() {
        let matcher = matcher();
        let cases = [
            "I have experience with CI/CD pipelines",
            "Worked on ci cd implementation",
            "CI CD Jenkins pipeline",
            "ci/cd tools like jenkins",
            "continuous integration continuous deployment",
            "Knowledge of continuous integration and deployment",
            "cicd",
            "CI / CD",
        ];
        for case in cases {
            assert!(matcher.extract_skills(case).contains("ci/cd"), "{case}");
        }
    }

    #[test]
    fn test_node_js_spaced() {
        let matcher = matcher();
        assert!(matcher.extract_skills("built with node js").contains("node.js"));
        assert!(matcher.extract_skills("built with NodeJS").contains("node.js"));
        assert!(matcher.extract_skills("built with Node.js").contains("node.js"));
    }

    #[test]
    fn test_c_plus_plus_variants() {
        let matcher = matcher();
        assert!(matcher.extract_skills("wrote c plus plus code").contains("c++"));
        assert!(matcher.extract_skills("modern C++17").contains("c++"));
        assert!(matcher.extract_skills("c+ + developer").contains("c++"));
        assert!(matcher.extract_skills("cpp").contains("c++"));
    }

    #[test]
    fn test_c_plus_plus_spaced_out() {
        let matcher = matcher();
        assert!(matcher.extract_skills("C ++ and Rust").contains("c++"));
        assert!(matcher.extract_skills("c + +").contains("c++"));
        assert!(!matcher.extract_skills("c and c#").contains("c++"));
    }

    #[test]
    fn test_bare_c_is_not_c_plus_plus() {
        let found = matcher().extract_skills("programming in c and assembly");
        assert!(!found.contains("c++"), "{found:?}");
    }

    #[test]
    fn test_javascript_does_not_yield_java() {
        let found = matcher().extract_skills("javascript");
        assert!(found.contains("javascript"));
        assert!(!found.contains("java"));
    }

    #[test]
    fn test_substring_of_word_is_not_a_match() {
        let found = matcher().extract_skills("gitlab, awsome, reactive, csset");
        assert!(!found.contains("git"));
        assert!(!found.contains("aws"));
        assert!(!found.contains("react"));
        assert!(!found.contains("css"));
    }

    #[test]
    fn test_multi_word_skills() {
        let matcher = matcher();
        let found = matcher.extract_skills("Dashboards in Power  BI, RESTful API design");
        assert!(found.contains("power bi"));
        assert!(found.contains("rest api"));
        assert!(matcher.extract_skills("PowerBI reports").contains("power bi"));
    }

    #[test]
    fn test_output_is_deduplicated() {
        let found = matcher().extract_skills("python python PYTHON sql sql");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_empty_text_matches_nothing() {
        assert!(matcher().extract_skills("").is_empty());
    }

    #[test]
    fn test_contains_skill() {
        let matcher = matcher();
        assert!(matcher.contains_skill("Deployed on AWS", "aws"));
        assert!(!matcher.contains_skill("Deployed on AWS", "docker"));
        assert!(!matcher.contains_skill("Rust services", "rust"));
    }

    #[test]
    fn test_substitute_vocabulary() {
        let vocab = SkillVocabulary::from_parts(&["rust", "go"], &[("go", &["golang"])]).unwrap();
        let matcher = SkillMatcher::new(Arc::new(vocab));
        let found = matcher.extract_skills("Rust and Golang, plus python");
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["go", "rust"]);
    }
}
