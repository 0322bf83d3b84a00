use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::matching::engine::{DiscoveryMode, MatchWeights};
use crate::similarity::embedding::{DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL};
use crate::similarity::EmbeddingBackend;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every variable has a default, so an empty environment is valid.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub embedding_backend: EmbeddingBackend,
    /// `None` when `EMBEDDING_API_URL` is set to an empty string.
    pub embedding_api_url: Option<String>,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub embedding_timeout_secs: u64,
    pub weights: MatchWeights,
    pub discovery_mode: DiscoveryMode,
    pub skill_vocabulary_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        let weights = MatchWeights::default();
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            embedding_backend: EmbeddingBackend::default(),
            embedding_api_url: Some(DEFAULT_EMBEDDING_URL.to_string()),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_api_key: None,
            embedding_timeout_secs: 30,
            weights,
            discovery_mode: DiscoveryMode::default(),
            skill_vocabulary_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let embedding_api_url = match lookup("EMBEDDING_API_URL") {
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(url.trim().to_string()),
            None => defaults.embedding_api_url,
        };

        let weights = MatchWeights::new(
            parse_or(&lookup, "MATCH_WEIGHT_SKILLS", defaults.weights.skills)?,
            parse_or(&lookup, "MATCH_WEIGHT_SEMANTIC", defaults.weights.semantic)?,
            parse_or(&lookup, "MATCH_WEIGHT_TFIDF", defaults.weights.tfidf)?,
        )
        .context("Invalid MATCH_WEIGHT_* configuration")?;

        let embedding_backend = match lookup("EMBEDDING_BACKEND") {
            Some(raw) if !raw.trim().is_empty() => raw
                .parse::<EmbeddingBackend>()
                .map_err(|e| anyhow!(e))
                .context("EMBEDDING_BACKEND is invalid")?,
            _ => defaults.embedding_backend,
        };

        let discovery_mode = match lookup("DISCOVERY_MODE") {
            Some(raw) => raw
                .parse::<DiscoveryMode>()
                .map_err(|e| anyhow!(e))
                .context("DISCOVERY_MODE is invalid")?,
            None => defaults.discovery_mode,
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
            embedding_backend,
            embedding_api_url,
            embedding_model: lookup("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_api_key: lookup("EMBEDDING_API_KEY").filter(|k| !k.is_empty()),
            embedding_timeout_secs: parse_or(
                &lookup,
                "EMBEDDING_TIMEOUT_SECS",
                defaults.embedding_timeout_secs,
            )?,
            weights,
            discovery_mode,
            skill_vocabulary_path: lookup("SKILL_VOCABULARY_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.embedding_api_url.as_deref(), Some(DEFAULT_EMBEDDING_URL));
        assert_eq!(config.embedding_model, "all-minilm");
        assert_eq!(config.weights, MatchWeights::default());
        assert_eq!(config.discovery_mode, DiscoveryMode::Restricted);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.skill_vocabulary_path.is_none());
    }

    #[test]
    fn test_empty_embedding_url_disables_semantic() {
        let config = config_from(&[("EMBEDDING_API_URL", "")]).unwrap();
        assert!(config.embedding_api_url.is_none());
    }

    #[test]
    fn test_embedding_backend_selection() {
        let config = config_from(&[("EMBEDDING_BACKEND", "none")]).unwrap();
        assert_eq!(config.embedding_backend, EmbeddingBackend::Disabled);

        let config = config_from(&[("EMBEDDING_BACKEND", "http")]).unwrap();
        assert_eq!(config.embedding_backend, EmbeddingBackend::Http);

        let config = config_from(&[]).unwrap();
        assert_eq!(config.embedding_backend, EmbeddingBackend::default());

        assert!(config_from(&[("EMBEDDING_BACKEND", "gpu")]).is_err());
    }

    #[test]
    fn test_custom_weights_and_mode() {
        let config = config_from(&[
            ("MATCH_WEIGHT_SKILLS", "0.5"),
            ("MATCH_WEIGHT_SEMANTIC", "0.25"),
            ("MATCH_WEIGHT_TFIDF", "0.25"),
            ("DISCOVERY_MODE", "open"),
        ])
        .unwrap();
        assert_eq!(config.weights.skills, 0.5);
        assert_eq!(config.discovery_mode, DiscoveryMode::Open);
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        assert!(config_from(&[("MATCH_WEIGHT_SKILLS", "0.9")]).is_err());
    }

    #[test]
    fn test_rejects_bad_port_and_mode() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("DISCOVERY_MODE", "wide")]).is_err());
    }
}
