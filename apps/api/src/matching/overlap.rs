//! Skill overlap between a resume and a job description.

use serde::Serialize;

use crate::matching::skill_matcher::SkillSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkillOverlap {
    /// Percentage of JD skills present in the resume, 0 – 100.
    pub score: f64,
    pub matched: SkillSet,
    pub missing: SkillSet,
}

/// `score = 100 * |resume ∩ jd| / |jd|`. An empty JD set scores 0 with empty
/// matched and missing sets.
pub fn compute_skill_overlap(resume_skills: &SkillSet, jd_skills: &SkillSet) -> SkillOverlap {
    if jd_skills.is_empty() {
        return SkillOverlap::default();
    }

    let matched: SkillSet = jd_skills.intersection(resume_skills).cloned().collect();
    let missing: SkillSet = jd_skills.difference(resume_skills).cloned().collect();
    let score = matched.len() as f64 / jd_skills.len() as f64 * 100.0;

    SkillOverlap {
        score,
        matched,
        missing,
    }
}
