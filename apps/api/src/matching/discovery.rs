//! Skill Discoverer — vocabulary skills plus heuristic candidates from a JD.
//!
//! Confirmed skills come from the `SkillMatcher`. Candidates come from the
//! shallow parser's noun phrases and entities and are kept apart so callers
//! can decide how much to trust them. A failing parser never fails discovery.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::matching::chunker::{EntityTag, ParseOutput, ShallowParser, MAX_PHRASE_TOKENS};
use crate::matching::normalizer::{is_stopword, normalize_for_matching};
use crate::matching::skill_matcher::{SkillMatcher, SkillSet};
use crate::matching::vocabulary::SkillVocabulary;

/// Entity tags worth proposing as skills.
pub const DISCOVERY_TAGS: &[EntityTag] = &[
    EntityTag::Organization,
    EntityTag::Product,
    EntityTag::WorkOfArt,
    EntityTag::Language,
    EntityTag::NationalityOrGroup,
];

const MIN_CANDIDATE_CHARS: usize = 2;

/// Skills found in a job description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobSkills {
    /// Vocabulary skills (or candidates confirmed by a master vocabulary).
    pub confirmed: SkillSet,
    /// Heuristic phrases outside the vocabulary.
    pub candidates: SkillSet,
}

impl JobSkills {
    pub fn all(&self) -> SkillSet {
        self.confirmed.union(&self.candidates).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.candidates.is_empty()
    }
}

#[derive(Clone)]
pub struct SkillDiscoverer {
    matcher: SkillMatcher,
    parser: Arc<dyn ShallowParser>,
}

impl SkillDiscoverer {
    pub fn new(matcher: SkillMatcher, parser: Arc<dyn ShallowParser>) -> Self {
        Self { matcher, parser }
    }

    /// Discovers skills in `job_text`.
    ///
    /// With a `master` vocabulary every skill, confirmed or candidate, must
    /// normalize to a master entry; surviving candidates become confirmed.
    pub fn discover(&self, job_text: &str, master: Option<&SkillVocabulary>) -> JobSkills {
        let confirmed = self.matcher.extract_skills(job_text);

        let candidates = match self.parser.parse(job_text) {
            Ok(parsed) => filter_candidates(parsed, &confirmed),
            Err(e) => {
                warn!("Shallow parse failed, using vocabulary skills only: {e}");
                SkillSet::new()
            }
        };

        debug!(
            "Discovery: {} confirmed, {} candidates",
            confirmed.len(),
            candidates.len()
        );

        let skills = JobSkills {
            confirmed,
            candidates,
        };
        match master {
            Some(master) => restrict_to_master(skills, master),
            None => skills,
        }
    }
}

fn filter_candidates(parsed: ParseOutput, known: &SkillSet) -> SkillSet {
    let phrases = parsed
        .noun_phrases
        .into_iter()
        .filter(|p| p.split_whitespace().count() <= MAX_PHRASE_TOKENS);
    let entities = parsed
        .entities
        .into_iter()
        .filter(|e| DISCOVERY_TAGS.contains(&e.tag))
        .map(|e| e.text);

    phrases
        .chain(entities)
        .map(|candidate| normalize_for_matching(&candidate).into_string())
        .filter(|c| c.chars().count() >= MIN_CANDIDATE_CHARS)
        .filter(|c| !is_stopword(c))
        .filter(|c| !known.contains(c))
        .collect()
}

fn restrict_to_master(skills: JobSkills, master: &SkillVocabulary) -> JobSkills {
    let confirmed = skills
        .confirmed
        .into_iter()
        .chain(skills.candidates)
        .filter(|s| master.contains(s))
        .map(|s| normalize_for_matching(&s).into_string())
        .collect();
    JobSkills {
        confirmed,
        candidates: SkillSet::new(),
    }
}
