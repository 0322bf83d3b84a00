//! TF-IDF cosine similarity between two documents.
//!
//! The two documents form the whole corpus. Weighting follows the common
//! scikit-learn defaults: tokens are runs of two or more word characters,
//! term frequency is the raw count, idf is smoothed as
//! `ln((1 + n) / (1 + df)) + 1`, and vectors are L2-normalized.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::similarity::{to_percentage, SimilarityError, SimilarityScorer};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("static token regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

#[async_trait]
impl SimilarityScorer for TfIdfScorer {
    async fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        tfidf_cosine(a, b).map(to_percentage)
    }

    fn name(&self) -> &'static str {
        "tfidf"
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Cosine of the TF-IDF vectors of `a` and `b`, in [0, 1].
pub fn tfidf_cosine(a: &str, b: &str) -> Result<f64, SimilarityError> {
    let docs = [tokenize(a), tokenize(b)];

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for doc in &docs {
        let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for term in unique {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }
    if doc_freq.is_empty() {
        return Err(SimilarityError::EmptyVocabulary);
    }

    let n = docs.len() as f64;
    let idf: HashMap<&str, f64> = doc_freq
        .iter()
        .map(|(term, df)| (*term, ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0))
        .collect();

    let vectors: Vec<HashMap<&str, f64>> = docs
        .iter()
        .map(|doc| weighted_vector(doc, &idf))
        .collect();

    let dot: f64 = vectors[0]
        .iter()
        .filter_map(|(term, wa)| vectors[1].get(term).map(|wb| wa * wb))
        .sum();
    Ok(dot.clamp(0.0, 1.0))
}

fn weighted_vector<'a>(doc: &'a [String], idf: &HashMap<&str, f64>) -> HashMap<&'a str, f64> {
    let mut vector: HashMap<&'a str, f64> = HashMap::new();
    for term in doc {
        *vector.entry(term.as_str()).or_insert(0.0) += 1.0;
    }
    for (term, weight) in vector.iter_mut() {
        *weight *= idf.get(term).copied().unwrap_or(0.0);
    }

    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
    vector
}
