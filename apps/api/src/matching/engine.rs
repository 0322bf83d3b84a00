//! Match Engine — combines skill overlap, semantic similarity and TF-IDF
//! similarity into one weighted match percentage.
//!
//! The engine owns no mutable state. One `Arc<MatchEngine>` is built at
//! startup and shared by every request and CLI run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::extraction::{extract_relevant_section, extract_text};
use crate::matching::chunker::{HeuristicParser, ShallowParser};
use crate::matching::discovery::{JobSkills, SkillDiscoverer};
use crate::matching::normalizer::preprocess_for_similarity;
use crate::matching::overlap::compute_skill_overlap;
use crate::matching::skill_matcher::{SkillMatcher, SkillSet};
use crate::matching::vocabulary::SkillVocabulary;
use crate::similarity::embedding::EmbeddingScorer;
use crate::similarity::tfidf::TfIdfScorer;
use crate::similarity::{EmbeddingBackend, SimilarityScorer, UnavailableScorer};

const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

// ── Weights ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum WeightsError {
    #[error("weight '{name}' must be a finite, non-negative number (got {value})")]
    Invalid { name: &'static str, value: f64 },

    #[error("weights must sum to 1.0 (got {0})")]
    BadSum(f64),
}

/// Relative importance of the three signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub skills: f64,
    pub semantic: f64,
    pub tfidf: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            skills: 0.4,
            semantic: 0.3,
            tfidf: 0.3,
        }
    }
}

impl MatchWeights {
    pub fn new(skills: f64, semantic: f64, tfidf: f64) -> Result<Self, WeightsError> {
        let weights = Self {
            skills,
            semantic,
            tfidf,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), WeightsError> {
        for (name, value) in [
            ("skills", self.skills),
            ("semantic", self.semantic),
            ("tfidf", self.tfidf),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(WeightsError::Invalid { name, value });
            }
        }

        let sum = self.skills + self.semantic + self.tfidf;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightsError::BadSum(sum));
        }
        Ok(())
    }

    /// Weighted sum, clamped to [0, 100] and rounded to 2 decimals.
    pub fn combine(&self, skill_score: f64, semantic_score: f64, tfidf_score: f64) -> f64 {
        let raw = self.skills * skill_score
            + self.semantic * semantic_score
            + self.tfidf * tfidf_score;
        round2(raw.clamp(0.0, 100.0))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Discovery mode ──────────────────────────────────────────────────────────

/// How far JD skill discovery may go beyond the vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// Discovered candidates count only when they are vocabulary skills.
    #[default]
    Restricted,
    /// Candidates count as JD skills alongside vocabulary matches.
    Open,
}

impl FromStr for DiscoveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restricted" => Ok(DiscoveryMode::Restricted),
            "open" => Ok(DiscoveryMode::Open),
            other => Err(format!(
                "unknown discovery mode '{other}' (expected 'restricted' or 'open')"
            )),
        }
    }
}

impl fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryMode::Restricted => f.write_str("restricted"),
            DiscoveryMode::Open => f.write_str("open"),
        }
    }
}

// ── Results ─────────────────────────────────────────────────────────────────

/// The match outcome for one resume / job description pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub resume: String,
    pub job_description: String,
    pub match_score: f64,
    pub skills_matched: Vec<String>,
    pub skills_missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_score: f64,
    pub semantic_score: f64,
    pub tfidf_score: f64,
    pub weights: MatchWeights,
    /// Heuristic JD phrases outside the vocabulary. Informational unless the
    /// engine runs in open discovery mode.
    pub candidate_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    #[serde(flatten)]
    pub result: MatchResult,
    pub breakdown: ScoreBreakdown,
}

// ── Engine ──────────────────────────────────────────────────────────────────

pub struct MatchEngine {
    vocabulary: Arc<SkillVocabulary>,
    matcher: SkillMatcher,
    discoverer: SkillDiscoverer,
    tfidf: Arc<dyn SimilarityScorer>,
    semantic: Arc<dyn SimilarityScorer>,
    weights: MatchWeights,
    discovery_mode: DiscoveryMode,
}

impl MatchEngine {
    pub fn new(
        vocabulary: Arc<SkillVocabulary>,
        tfidf: Arc<dyn SimilarityScorer>,
        semantic: Arc<dyn SimilarityScorer>,
    ) -> Self {
        let matcher = SkillMatcher::new(vocabulary.clone());
        let discoverer = SkillDiscoverer::new(matcher.clone(), Arc::new(HeuristicParser::default()));
        Self {
            vocabulary,
            matcher,
            discoverer,
            tfidf,
            semantic,
            weights: MatchWeights::default(),
            discovery_mode: DiscoveryMode::default(),
        }
    }

    pub fn with_weights(mut self, weights: MatchWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_discovery_mode(mut self, mode: DiscoveryMode) -> Self {
        self.discovery_mode = mode;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ShallowParser>) -> Self {
        self.discoverer = SkillDiscoverer::new(self.matcher.clone(), parser);
        self
    }

    /// Builds the engine described by `config`: vocabulary file (or the
    /// built-in list), TF-IDF scorer, and the configured embedding backend.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let vocabulary = match &config.skill_vocabulary_path {
            Some(path) => SkillVocabulary::load(path)
                .with_context(|| format!("Failed to load skill vocabulary {}", path.display()))?,
            None => SkillVocabulary::builtin().context("Failed to build built-in vocabulary")?,
        };
        info!("Skill vocabulary loaded ({} skills)", vocabulary.len());

        let semantic = build_semantic_scorer(config)?;

        Ok(
            MatchEngine::new(Arc::new(vocabulary), Arc::new(TfIdfScorer), semantic)
                .with_weights(config.weights)
                .with_discovery_mode(config.discovery_mode),
        )
    }

    pub fn discovery_mode(&self) -> DiscoveryMode {
        self.discovery_mode
    }

    /// JD skills under `mode`. Restricted mode filters through the vocabulary.
    pub fn discover_job_skills(&self, job_text: &str, mode: DiscoveryMode) -> JobSkills {
        match mode {
            DiscoveryMode::Restricted => self.discoverer.discover(job_text, Some(&self.vocabulary)),
            DiscoveryMode::Open => self.discoverer.discover(job_text, None),
        }
    }

    /// Scores one resume text against one job description text.
    pub async fn match_texts(
        &self,
        resume_label: &str,
        resume_text: &str,
        job_label: &str,
        job_text: &str,
    ) -> MatchReport {
        let resume_clean = preprocess_for_similarity(resume_text);
        let job_clean = preprocess_for_similarity(job_text);

        let tfidf_score =
            score_component(self.tfidf.as_ref(), resume_clean.as_str(), job_clean.as_str()).await;
        let semantic_score = score_component(
            self.semantic.as_ref(),
            resume_clean.as_str(),
            job_clean.as_str(),
        )
        .await;

        let resume_skills = self.matcher.extract_skills(resume_text);
        let job_skills = self.discover_job_skills(job_text, self.discovery_mode);
        let jd_skills: SkillSet = match self.discovery_mode {
            DiscoveryMode::Restricted => job_skills.confirmed.clone(),
            DiscoveryMode::Open => job_skills.all(),
        };

        let overlap = compute_skill_overlap(&resume_skills, &jd_skills);
        let match_score = self
            .weights
            .combine(overlap.score, semantic_score, tfidf_score);

        debug!(
            "Scores for {resume_label} vs {job_label}: skills={:.2} semantic={:.2} tfidf={:.2}",
            overlap.score, semantic_score, tfidf_score
        );
        info!("Matched {resume_label} against {job_label}: {match_score}%");

        MatchReport {
            result: MatchResult {
                resume: resume_label.to_string(),
                job_description: job_label.to_string(),
                match_score,
                skills_matched: overlap.matched.into_iter().collect(),
                skills_missing: overlap.missing.into_iter().collect(),
            },
            breakdown: ScoreBreakdown {
                skill_score: round2(overlap.score),
                semantic_score: round2(semantic_score),
                tfidf_score: round2(tfidf_score),
                weights: self.weights,
                candidate_skills: job_skills.candidates.into_iter().collect(),
            },
        }
    }

    /// Extracts both documents, trims each to its relevant section and
    /// scores them. The paths are the identifiers in the result.
    pub async fn match_resume_to_job(
        &self,
        resume_path: &Path,
        job_path: &Path,
    ) -> Result<MatchReport, AppError> {
        let resume_text = extract_blocking(resume_path.to_path_buf()).await?;
        let job_text = extract_blocking(job_path.to_path_buf()).await?;

        let resume_section = extract_relevant_section(&resume_text);
        let job_section = extract_relevant_section(&job_text);

        Ok(self
            .match_texts(
                &resume_path.display().to_string(),
                resume_section,
                &job_path.display().to_string(),
                job_section,
            )
            .await)
    }
}

fn build_semantic_scorer(config: &Config) -> anyhow::Result<Arc<dyn SimilarityScorer>> {
    match (config.embedding_backend, &config.embedding_api_url) {
        (EmbeddingBackend::Local, _) => local_scorer(),
        (EmbeddingBackend::Http, Some(url)) => {
            let scorer = EmbeddingScorer::new(
                url.clone(),
                config.embedding_model.clone(),
                config.embedding_api_key.clone(),
                Duration::from_secs(config.embedding_timeout_secs),
            )
            .context("Failed to build embedding client")?;
            info!(
                "Semantic scoring via {url} (model: {})",
                config.embedding_model
            );
            Ok(Arc::new(scorer))
        }
        (EmbeddingBackend::Http, None) | (EmbeddingBackend::Disabled, _) => {
            warn!("Semantic scoring disabled: semantic component will score 0");
            Ok(Arc::new(UnavailableScorer::new(
                "semantic",
                "semantic scoring disabled by configuration",
            )))
        }
    }
}

#[cfg(feature = "local-embeddings")]
fn local_scorer() -> anyhow::Result<Arc<dyn SimilarityScorer>> {
    let scorer = crate::similarity::local::LocalEmbeddingScorer::new()
        .context("Failed to load local embedding model")?;
    Ok(Arc::new(scorer))
}

#[cfg(not(feature = "local-embeddings"))]
fn local_scorer() -> anyhow::Result<Arc<dyn SimilarityScorer>> {
    anyhow::bail!("EMBEDDING_BACKEND=local requires building with the `local-embeddings` feature")
}

async fn extract_blocking(path: PathBuf) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || extract_text(&path))
        .await
        .context("Extraction task panicked")?
}

/// A failing scorer degrades to 0 instead of failing the match.
async fn score_component(scorer: &dyn SimilarityScorer, a: &str, b: &str) -> f64 {
    match scorer.similarity(a, b).await {
        Ok(score) => score,
        Err(e) => {
            warn!("{} similarity unavailable, scoring 0: {e}", scorer.name());
            0.0
        }
    }
}
