//! Embedding similarity via an OpenAI-compatible `/v1/embeddings` endpoint.
//!
//! Both texts are sent in one request (`{ model, input: [a, b] }`) and the
//! cosine of the two returned vectors is the score. Ollama, vLLM,
//! text-embeddings-inference and OpenAI itself all speak this shape.
//!
//! Retries on 429, 5xx and timeouts with exponential backoff. A refused
//! connection fails at once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::similarity::{cosine_similarity, to_percentage, SimilarityError, SimilarityScorer};

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11434/v1/embeddings";
/// all-MiniLM-L6-v2 as published by Ollama.
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 2],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct EmbeddingScorer {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    retry_base_delay: Duration,
}

impl EmbeddingScorer {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SimilarityError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
            api_key,
            retry_base_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the first backoff delay (doubles on each retry).
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    async fn embed_pair(&self, a: &str, b: &str) -> Result<EmbeddingResponse, SimilarityError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: [a, b],
        };

        let mut last_error: Option<SimilarityError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = self.retry_base_delay * (1 << (attempt - 1));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&self.url).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                // nothing listening: waiting will not bring the endpoint up
                Err(e) if e.is_connect() => return Err(SimilarityError::Http(e)),
                Err(e) => {
                    last_error = Some(SimilarityError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!("Embedding API returned {}: {}", status, message);
                last_error = Some(SimilarityError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(SimilarityError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return response
                .json::<EmbeddingResponse>()
                .await
                .map_err(|e| SimilarityError::MalformedResponse(e.to_string()));
        }

        Err(last_error.unwrap_or_else(|| {
            SimilarityError::Unavailable(format!("no response after {MAX_RETRIES} attempts"))
        }))
    }
}

#[async_trait]
impl SimilarityScorer for EmbeddingScorer {
    async fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        if a.trim().is_empty() || b.trim().is_empty() {
            return Err(SimilarityError::EmptyInput);
        }

        let response = self.embed_pair(a, b).await?;
        let cosine = pair_cosine(response)?;
        debug!("Embedding cosine ({}): {:.4}", self.model, cosine);
        Ok(to_percentage(cosine))
    }

    fn name(&self) -> &'static str {
        "semantic"
    }
}

/// Orders the returned vectors by `index` and takes the cosine of the pair.
fn pair_cosine(mut response: EmbeddingResponse) -> Result<f64, SimilarityError> {
    if response.data.len() != 2 {
        return Err(SimilarityError::MalformedResponse(format!(
            "expected 2 embeddings, got {}",
            response.data.len()
        )));
    }
    response.data.sort_by_key(|d| d.index);
    let (a, b) = (&response.data[0].embedding, &response.data[1].embedding);
    if a.is_empty() || a.len() != b.len() {
        return Err(SimilarityError::MalformedResponse(format!(
            "embedding dimensions {} and {} are unusable",
            a.len(),
            b.len()
        )));
    }
    Ok(cosine_similarity(a, b))
}
