//! Skill vocabulary — the controlled list of canonical technical skills.
//!
//! Each skill is described declaratively by a [`SkillDescriptor`] and compiled
//! once into a case-insensitive pattern when the vocabulary is built. The
//! vocabulary is immutable afterwards and shared behind an `Arc`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use thiserror::Error;

use crate::matching::normalizer::normalize_for_matching;

// ────────────────────────────────────────────────────────────────────────────
// Built-in vocabulary
// ────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_SKILLS: &[&str] = &[
    "python", "sql", "excel", "power bi", "tableau", "pandas", "numpy",
    "javascript", "react", "node.js", "docker", "aws", "mysql", "mongodb",
    "html", "css", "tensorflow", "keras", "git", "ci/cd", "rest api", "linux",
    "c++", "java", "php", "laravel", "angular", "vue.js", "typescript", "next.js",
    "redux", "graphql", "webpack", "jest", "mocha",
];

pub const DEFAULT_VARIATIONS: &[(&str, &[&str])] = &[
    (
        "ci/cd",
        &["ci cd", "ci  cd", "continuous integration", "continuous deployment"],
    ),
    ("rest api", &["restapi", "restful api"]),
    ("node.js", &["node js", "nodejs"]),
    ("c++", &["c plus plus", "cpp"]),
    ("power bi", &["powerbi"]),
];

/// Characters that real-world text tends to space out or drop.
const RELAXED_CHARS: &[char] = &['/', '+', '.'];

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("vocabulary contains an empty skill name")]
    EmptySkill,

    #[error("vocabulary contains no skills")]
    Empty,

    #[error("could not compile pattern for skill '{skill}': {source}")]
    InvalidPattern {
        skill: String,
        #[source]
        source: regex::Error,
    },

    #[error("could not read vocabulary file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid vocabulary file: {0}")]
    Parse(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Descriptors
// ────────────────────────────────────────────────────────────────────────────

/// A character of the canonical name that may appear as any of `alternates`,
/// or not at all. A space in `alternates` stands for any whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSubstitution {
    pub target: char,
    pub alternates: Vec<char>,
}

/// Declarative matching policy for one skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDescriptor {
    pub canonical: String,
    pub requires_word_boundary: bool,
    pub substitutions: Vec<CharSubstitution>,
    pub known_variations: Vec<String>,
}

impl SkillDescriptor {
    /// Builds the default descriptor: word boundaries on, and every `/`, `+`
    /// or `.` in the name relaxed to "itself or whitespace".
    pub fn new(name: &str) -> Self {
        let canonical = normalize_for_matching(name).into_string();
        let mut substitutions: Vec<CharSubstitution> = Vec::new();
        for c in canonical.chars() {
            if RELAXED_CHARS.contains(&c) && !substitutions.iter().any(|s| s.target == c) {
                substitutions.push(CharSubstitution {
                    target: c,
                    alternates: vec![c, ' '],
                });
            }
        }

        Self {
            canonical,
            requires_word_boundary: true,
            substitutions,
            known_variations: Vec::new(),
        }
    }

    pub fn with_variations<I, S>(mut self, variations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for variation in variations {
            let normalized = normalize_for_matching(variation.as_ref()).into_string();
            if !normalized.is_empty() && !self.known_variations.contains(&normalized) {
                self.known_variations.push(normalized);
            }
        }
        self
    }

    pub fn with_word_boundary(mut self, required: bool) -> Self {
        self.requires_word_boundary = required;
        self
    }

    fn substitution_for(&self, c: char) -> Option<&CharSubstitution> {
        self.substitutions.iter().find(|s| s.target == c)
    }

    /// Renders the descriptor as a regex source string.
    ///
    /// A run of substitutable characters inside the name may be dropped
    /// entirely (`nodejs`). A run at either end keeps its first character so
    /// that `c++` never degenerates into the bare word `c`; a trailing run may
    /// still be set apart by whitespace (`c ++`).
    pub fn pattern(&self) -> String {
        let chars: Vec<char> = self.canonical.chars().collect();
        let mut pattern = String::new();

        if self.requires_word_boundary {
            match chars.first() {
                Some(c) if is_word_char(*c) => pattern.push_str(r"\b"),
                Some(_) => pattern.push_str(r"(?:^|\W)"),
                None => {}
            }
        }

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if self.substitution_for(c).is_some() {
                let start = i;
                while i < chars.len() && self.substitution_for(chars[i]).is_some() {
                    i += 1;
                }
                let class = self.char_class(&chars[start..i]);
                let interior = start > 0 && i < chars.len();
                if !interior {
                    if start > 0 {
                        pattern.push_str(r"\s*");
                    }
                    pattern.push_str(&regex::escape(&c.to_string()));
                }
                pattern.push_str(&class);
                pattern.push('*');
            } else if c.is_whitespace() {
                pattern.push_str(r"\s+");
                i += 1;
            } else {
                pattern.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }

        if self.requires_word_boundary {
            match chars.last() {
                Some(c) if is_word_char(*c) => pattern.push_str(r"\b"),
                Some(_) => pattern.push_str(r"(?:\W|$)"),
                None => {}
            }
        }

        pattern
    }

    fn char_class(&self, run: &[char]) -> String {
        let mut members: Vec<char> = Vec::new();
        for c in run {
            if let Some(sub) = self.substitution_for(*c) {
                for alt in std::iter::once(c).chain(sub.alternates.iter()) {
                    if !members.contains(alt) {
                        members.push(*alt);
                    }
                }
            }
        }

        let mut class = String::from("[");
        for member in members {
            if member == ' ' {
                class.push_str(r"\s");
            } else {
                class.push_str(&regex::escape(&member.to_string()));
            }
        }
        class.push(']');
        class
    }

    fn compile(self) -> Result<CompiledSkill, VocabularyError> {
        let pattern = RegexBuilder::new(&self.pattern())
            .case_insensitive(true)
            .build()
            .map_err(|source| VocabularyError::InvalidPattern {
                skill: self.canonical.clone(),
                source,
            })?;
        Ok(CompiledSkill {
            descriptor: self,
            pattern,
        })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A descriptor together with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledSkill {
    descriptor: SkillDescriptor,
    pattern: Regex,
}

impl CompiledSkill {
    pub fn canonical(&self) -> &str {
        &self.descriptor.canonical
    }

    pub fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn variations(&self) -> &[String] {
        &self.descriptor.known_variations
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vocabulary
// ────────────────────────────────────────────────────────────────────────────

/// Ordered, deduplicated set of compiled skills.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    skills: Vec<CompiledSkill>,
    canonical_index: HashSet<String>,
}

impl SkillVocabulary {
    /// Compiles the descriptors. Later duplicates of a canonical name are dropped.
    pub fn new(descriptors: Vec<SkillDescriptor>) -> Result<Self, VocabularyError> {
        let mut skills = Vec::with_capacity(descriptors.len());
        let mut canonical_index = HashSet::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if descriptor.canonical.is_empty() {
                return Err(VocabularyError::EmptySkill);
            }
            if !canonical_index.insert(descriptor.canonical.clone()) {
                continue;
            }
            skills.push(descriptor.compile()?);
        }

        if skills.is_empty() {
            return Err(VocabularyError::Empty);
        }

        Ok(Self {
            skills,
            canonical_index,
        })
    }

    /// Builds a vocabulary from plain names plus a variation table.
    /// Variation rows for skills not in `names` are ignored.
    pub fn from_parts(
        names: &[&str],
        variations: &[(&str, &[&str])],
    ) -> Result<Self, VocabularyError> {
        let descriptors = names
            .iter()
            .map(|name| {
                let descriptor = SkillDescriptor::new(name);
                let row = variations
                    .iter()
                    .find(|(skill, _)| normalize_for_matching(skill).as_str() == descriptor.canonical)
                    .map(|(_, alts)| *alts)
                    .unwrap_or(&[]);
                descriptor.with_variations(row.iter())
            })
            .collect();
        Self::new(descriptors)
    }

    /// The built-in technical skill list.
    pub fn builtin() -> Result<Self, VocabularyError> {
        Self::from_parts(DEFAULT_SKILLS, DEFAULT_VARIATIONS)
    }

    /// Loads a vocabulary from a JSON file (see [`VocabularyFile`]).
    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let raw = std::fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, VocabularyError> {
        let file: VocabularyFile = serde_json::from_str(raw)?;
        Self::new(file.into_descriptors())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledSkill> {
        self.skills.iter()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// True if `skill`, once normalized, is a canonical entry.
    pub fn contains(&self, skill: &str) -> bool {
        self.canonical_index
            .contains(normalize_for_matching(skill).as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.canonical()).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// JSON vocabulary file
// ────────────────────────────────────────────────────────────────────────────

/// On-disk vocabulary format:
///
/// ```json
/// {
///   "skills": ["python", {"name": "c#", "word_boundary": false, "variations": ["csharp"]}],
///   "variations": {"python": ["py3"]}
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct VocabularyFile {
    pub skills: Vec<SkillEntry>,
    #[serde(default)]
    pub variations: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SkillEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default = "default_word_boundary")]
        word_boundary: bool,
        #[serde(default)]
        variations: Vec<String>,
    },
}

fn default_word_boundary() -> bool {
    true
}

impl VocabularyFile {
    fn into_descriptors(self) -> Vec<SkillDescriptor> {
        let table: BTreeMap<String, Vec<String>> = self
            .variations
            .into_iter()
            .map(|(skill, alts)| (normalize_for_matching(&skill).into_string(), alts))
            .collect();

        self.skills
            .into_iter()
            .map(|entry| {
                let descriptor = match entry {
                    SkillEntry::Name(name) => SkillDescriptor::new(&name),
                    SkillEntry::Detailed {
                        name,
                        word_boundary,
                        variations,
                    } => SkillDescriptor::new(&name)
                        .with_word_boundary(word_boundary)
                        .with_variations(variations),
                };
                let extra = table
                    .get(&descriptor.canonical)
                    .cloned()
                    .unwrap_or_default();
                descriptor.with_variations(extra)
            })
            .collect()
    }
}
