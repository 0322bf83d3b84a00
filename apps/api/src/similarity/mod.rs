//! Document similarity scorers.
//!
//! Each scorer compares two preprocessed texts and returns a percentage in
//! [0, 100]. `MatchEngine` holds them as `Arc<dyn SimilarityScorer>` so a
//! backend can be swapped (or stubbed in tests) without touching the engine.

pub mod embedding;
#[cfg(feature = "local-embeddings")]
pub mod local;
pub mod tfidf;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("empty vocabulary: both documents contain no usable terms")]
    EmptyVocabulary,

    #[error("cannot embed empty text")]
    EmptyInput,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("scorer unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    /// Similarity of `a` and `b` as a percentage in [0, 100].
    async fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError>;

    /// Short label used in logs.
    fn name(&self) -> &'static str;
}

/// Stands in for a backend that is switched off. Always errors, so the
/// engine scores the component as 0.
#[derive(Debug, Clone)]
pub struct UnavailableScorer {
    name: &'static str,
    reason: String,
}

impl UnavailableScorer {
    pub fn new(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SimilarityScorer for UnavailableScorer {
    async fn similarity(&self, _a: &str, _b: &str) -> Result<f64, SimilarityError> {
        Err(SimilarityError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Where the semantic component gets its sentence embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// all-MiniLM-L6-v2 computed in-process (`local-embeddings` feature).
    Local,
    /// OpenAI-compatible HTTP endpoint.
    Http,
    /// Semantic component always scores 0.
    Disabled,
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        if cfg!(feature = "local-embeddings") {
            EmbeddingBackend::Local
        } else {
            EmbeddingBackend::Http
        }
    }
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "fastembed" => Ok(EmbeddingBackend::Local),
            "http" | "api" => Ok(EmbeddingBackend::Http),
            "none" | "disabled" | "off" => Ok(EmbeddingBackend::Disabled),
            other => Err(format!(
                "unknown embedding backend '{other}' (expected 'local', 'http' or 'none')"
            )),
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingBackend::Local => f.write_str("local"),
            EmbeddingBackend::Http => f.write_str("http"),
            EmbeddingBackend::Disabled => f.write_str("none"),
        }
    }
}

/// Cosine similarity of two equal-length vectors. 0.0 when either has zero
/// magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut mag_a = 0.0f64;
    let mut mag_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Maps a cosine in [-1, 1] to a percentage clamped to [0, 100].
pub fn to_percentage(cosine: f64) -> f64 {
    (cosine * 100.0).clamp(0.0, 100.0)
}
