use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SimilarityError;
use crate::traits::{Embedder, ProviderFactory, SimilarityMatch, SimilarityProvider};

/// Role of the embedded text, for embedding models that distinguish them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    #[serde(rename = "search_document")]
    Document,
    #[serde(rename = "search_query")]
    Query,
}

/// Nearest activity key by cosine similarity of embeddings.
///
/// Key embeddings are computed once at construction; each lookup embeds
/// only the query.
pub struct EmbeddingProvider {
    embedder: Arc<dyn Embedder>,
    keys: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingProvider {
    pub async fn build(
        embedder: Arc<dyn Embedder>,
        keys: &[String],
    ) -> Result<Self, SimilarityError> {
        if keys.is_empty() {
            return Err(SimilarityError::EmptyCandidates);
        }
        let vectors = embedder.embed(keys, InputType::Document).await?;
        if vectors.len() != keys.len() {
            return Err(SimilarityError::MalformedResponse(format!(
                "expected {} key embeddings, got {}",
                keys.len(),
                vectors.len()
            )));
        }
        Ok(Self {
            embedder,
            keys: keys.to_vec(),
            vectors,
        })
    }
}

#[async_trait]
impl SimilarityProvider for EmbeddingProvider {
    async fn nearest(&self, query: &str) -> Result<Option<SimilarityMatch>, SimilarityError> {
        let mut embedded = self
            .embedder
            .embed(&[query.to_string()], InputType::Query)
            .await?;
        let query_vector = embedded
            .pop()
            .ok_or_else(|| SimilarityError::MalformedResponse("no query embedding".into()))?;

        let best = self
            .keys
            .iter()
            .zip(&self.vectors)
            .map(|(key, vector)| (key, cosine_similarity(&query_vector, vector)))
            .fold(None::<(&String, f32)>, |best, (key, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((key, score)),
            });

        Ok(best.map(|(key, score)| {
            SimilarityMatch::new(key.clone(), f64::from(score).clamp(0.0, 1.0))
        }))
    }
}

/// Builds an [`EmbeddingProvider`] per sector over a shared embedder.
pub struct EmbeddingFactory {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingFactory {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl ProviderFactory for EmbeddingFactory {
    async fn build(
        &self,
        _sector: &str,
        keys: &[String],
    ) -> Result<Arc<dyn SimilarityProvider>, SimilarityError> {
        let provider = EmbeddingProvider::build(Arc::clone(&self.embedder), keys).await?;
        Ok(Arc::new(provider))
    }
}

/// Cosine similarity; `0.0` for empty, mismatched or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
