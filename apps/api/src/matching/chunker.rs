//! Shallow parsing for skill discovery.
//!
//! `ShallowParser` is the seam for any syntactic parser. `HeuristicParser` is
//! the built-in implementation: noun phrases are runs of content words
//! between punctuation and stopword/filler boundaries, and entities are runs
//! of capitalized tokens tagged by their shape. It is approximate by nature.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::matching::normalizer::is_stopword;

/// Longest noun phrase (in tokens) a parser should report.
pub const MAX_PHRASE_TOKENS: usize = 3;

/// Longest input the heuristic parser accepts.
pub const MAX_PARSE_CHARS: usize = 1_000_000;

const MAX_ENTITY_TOKENS: usize = 4;

/// Job-posting vocabulary that never forms part of a skill phrase.
const FILLER_WORDS: &[&str] = &[
    "ability", "able", "applicants", "candidate", "candidates", "degree",
    "desired", "develop", "developing", "e.g", "etc", "excellent", "experience",
    "experienced", "familiar", "familiarity", "good", "great", "hands-on", "i.e",
    "including", "knowledge", "like", "looking", "must", "nice", "plus",
    "preferred", "proficiency", "proficient", "required", "requirements",
    "responsibilities", "role", "skills", "solid", "strong", "understanding",
    "using", "want", "work", "working", "year", "years",
];

const LANGUAGE_NAMES: &[&str] = &[
    "arabic", "bengali", "cantonese", "dutch", "english", "french", "german",
    "hindi", "italian", "japanese", "korean", "mandarin", "polish", "portuguese",
    "russian", "spanish", "swedish", "turkish", "urdu", "vietnamese",
];

static CLAUSE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[,;:()\[\]{}!?|•\r\n]+|\.(?:\s+|$)|\s[-–—]\s").expect("static clause regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTag {
    Organization,
    Product,
    WorkOfArt,
    Language,
    NationalityOrGroup,
    Person,
    Location,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub tag: EntityTag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutput {
    pub noun_phrases: Vec<String>,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("text of {len} chars exceeds parser limit of {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("parser unavailable: {0}")]
    Unavailable(String),
}

pub trait ShallowParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<ParseOutput, ParseError>;
}

/// Rule-based parser with no model dependencies.
#[derive(Debug, Clone)]
pub struct HeuristicParser {
    max_chars: usize,
}

impl Default for HeuristicParser {
    fn default() -> Self {
        Self {
            max_chars: MAX_PARSE_CHARS,
        }
    }
}

impl HeuristicParser {
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl ShallowParser for HeuristicParser {
    fn parse(&self, text: &str) -> Result<ParseOutput, ParseError> {
        let len = text.chars().count();
        if len > self.max_chars {
            return Err(ParseError::TextTooLong {
                len,
                max: self.max_chars,
            });
        }

        let mut output = ParseOutput::default();
        for clause in CLAUSE_BREAK.split(text) {
            let tokens: Vec<&str> = clause
                .split_whitespace()
                .map(trim_token)
                .filter(|t| !t.is_empty())
                .collect();
            if tokens.is_empty() {
                continue;
            }
            collect_noun_phrases(&tokens, &mut output.noun_phrases);
            collect_entities(&tokens, &mut output.entities);
        }
        Ok(output)
    }
}

fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
}

fn is_boundary(token: &str) -> bool {
    let lower = token.to_lowercase();
    is_stopword(&lower)
        || FILLER_WORDS.contains(&lower.as_str())
        || !token.chars().any(char::is_alphabetic)
}

fn collect_noun_phrases(tokens: &[&str], out: &mut Vec<String>) {
    let mut run: Vec<&str> = Vec::new();
    for token in tokens.iter().copied().chain(std::iter::once("")) {
        if token.is_empty() || is_boundary(token) {
            if !run.is_empty() && run.len() <= MAX_PHRASE_TOKENS {
                out.push(run.join(" "));
            }
            run.clear();
        } else {
            run.push(token);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Lower,
    Capitalized,
    Mixed,
    AllCaps,
}

fn shape(token: &str) -> Shape {
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    match (letters.first(), upper) {
        (None, _) | (_, 0) => Shape::Lower,
        (Some(_), n) if n == letters.len() && n >= 2 => Shape::AllCaps,
        (Some(first), 1) if first.is_uppercase() => Shape::Capitalized,
        _ => Shape::Mixed,
    }
}

fn collect_entities(tokens: &[&str], out: &mut Vec<Entity>) {
    let mut span: Vec<(usize, &str)> = Vec::new();
    for (idx, token) in tokens.iter().copied().enumerate().chain(std::iter::once((usize::MAX, ""))) {
        let is_name = !token.is_empty()
            && shape(token) != Shape::Lower
            && !is_stopword(&token.to_lowercase());
        if is_name && span.len() < MAX_ENTITY_TOKENS {
            span.push((idx, token));
            continue;
        }
        if let Some(entity) = classify_span(&span) {
            out.push(entity);
        }
        span.clear();
        if is_name {
            span.push((idx, token));
        }
    }
}

fn classify_span(span: &[(usize, &str)]) -> Option<Entity> {
    let (first_idx, first) = *span.first()?;
    let text = span.iter().map(|(_, t)| *t).collect::<Vec<_>>().join(" ");

    if span.len() >= 2 {
        return Some(Entity {
            text,
            tag: EntityTag::Organization,
        });
    }

    let lower = first.to_lowercase();
    let tag = if LANGUAGE_NAMES.contains(&lower.as_str()) {
        EntityTag::Language
    } else {
        match shape(first) {
            Shape::Mixed | Shape::AllCaps => EntityTag::Product,
            // a lone capitalized word opening a clause is just sentence case
            Shape::Capitalized if first_idx == 0 => return None,
            _ => EntityTag::Other,
        }
    };
    Some(Entity { text, tag })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParseOutput {
        HeuristicParser::default().parse(text).unwrap()
    }

    fn entity(text: &str, tag: EntityTag) -> Entity {
        Entity {
            text: text.to_string(),
            tag,
        }
    }

    #[test]
    fn test_noun_phrases_split_on_punctuation_and_stopwords() {
        let out = parse("Experience with Kubernetes, Terraform and data pipelines.");
        assert_eq!(out.noun_phrases, vec!["Kubernetes", "Terraform", "data pipelines"]);
    }

    #[test]
    fn test_long_runs_are_not_phrases() {
        let out = parse("distributed event driven stream processing systems");
        assert!(out.noun_phrases.is_empty(), "{:?}", out.noun_phrases);
    }

    #[test]
    fn test_dotted_names_survive_sentence_splitting() {
        let out = parse("Build services in Node.js. Deploy with Docker.");
        assert!(out.noun_phrases.contains(&"Node.js".to_string()));
        assert!(out.noun_phrases.contains(&"Docker".to_string()));
    }

    #[test]
    fn test_numbers_are_boundaries() {
        let out = parse("5+ years Rust");
        assert_eq!(out.noun_phrases, vec!["Rust"]);
    }

    #[test]
    fn test_entities_by_shape() {
        let out = parse("Familiarity with Apache Kafka and GraphQL, knowledge of AWS");
        assert!(out.entities.contains(&entity("Apache Kafka", EntityTag::Organization)));
        assert!(out.entities.contains(&entity("GraphQL", EntityTag::Product)));
        assert!(out.entities.contains(&entity("AWS", EntityTag::Product)));
    }

    #[test]
    fn test_sentence_initial_word_is_not_an_entity() {
        let out = parse("Required: Terraform");
        assert!(out.entities.is_empty(), "{:?}", out.entities);
    }

    #[test]
    fn test_language_names_are_tagged() {
        let out = parse("Fluent in English and Spanish");
        assert!(out.entities.contains(&entity("English", EntityTag::Language)));
        assert!(out.entities.contains(&entity("Spanish", EntityTag::Language)));
    }

    #[test]
    fn test_shape() {
        assert_eq!(shape("python"), Shape::Lower);
        assert_eq!(shape("Python"), Shape::Capitalized);
        assert_eq!(shape("PostgreSQL"), Shape::Mixed);
        assert_eq!(shape("iOS"), Shape::Mixed);
        assert_eq!(shape("SQL"), Shape::AllCaps);
        assert_eq!(shape("C++"), Shape::Capitalized);
        assert_eq!(shape("42"), Shape::Lower);
    }

    #[test]
    fn test_oversized_input_is_rejected() {
        let err = HeuristicParser::with_max_chars(10)
            .parse("this text is longer than ten characters")
            .unwrap_err();
        assert!(matches!(err, ParseError::TextTooLong { max: 10, .. }));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), ParseOutput::default());
    }
}
