//! In-process sentence embeddings: all-MiniLM-L6-v2 through fastembed (ONNX).
//!
//! The model is fetched into the fastembed cache on first load. Inference
//! is CPU-bound and runs on the blocking pool.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

use crate::similarity::{cosine_similarity, to_percentage, SimilarityError, SimilarityScorer};

#[derive(Clone)]
pub struct LocalEmbeddingScorer {
    model: Arc<Mutex<TextEmbedding>>,
}

impl LocalEmbeddingScorer {
    /// Loads all-MiniLM-L6-v2. Blocking; downloads the model when the cache is empty.
    pub fn new() -> Result<Self, SimilarityError> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .map_err(|e| {
                SimilarityError::Unavailable(format!("could not load embedding model: {e}"))
            })?;
        info!("Local embedding model loaded (all-MiniLM-L6-v2)");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl SimilarityScorer for LocalEmbeddingScorer {
    async fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        if a.trim().is_empty() || b.trim().is_empty() {
            return Err(SimilarityError::EmptyInput);
        }

        let model = Arc::clone(&self.model);
        let texts = vec![a.to_string(), b.to_string()];
        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| SimilarityError::Unavailable("embedding model lock poisoned".into()))?;
            model
                .embed(texts, None)
                .map_err(|e| SimilarityError::Unavailable(format!("embedding failed: {e}")))
        })
        .await
        .map_err(|e| SimilarityError::Unavailable(format!("embedding task failed: {e}")))??;

        let [first, second] = embeddings.as_slice() else {
            return Err(SimilarityError::MalformedResponse(format!(
                "expected 2 embeddings, got {}",
                embeddings.len()
            )));
        };
        let cosine = cosine_similarity(first, second);
        debug!("Local embedding cosine: {:.4}", cosine);
        Ok(to_percentage(cosine))
    }

    fn name(&self) -> &'static str {
        "semantic"
    }
}
