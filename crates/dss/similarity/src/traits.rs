use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embedding::InputType;
use crate::error::SimilarityError;

/// Closest activity key for a query, with a score in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub key: String,
    pub score: f64,
}

impl SimilarityMatch {
    pub fn new(key: impl Into<String>, score: f64) -> Self {
        Self {
            key: key.into(),
            score,
        }
    }
}

/// Nearest-key lookup over the activity keys of one sector.
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    /// `Ok(None)` when the provider has no candidate to offer.
    async fn nearest(&self, query: &str) -> Result<Option<SimilarityMatch>, SimilarityError>;
}

/// Builds the provider of a sector from its activity keys.
///
/// Construction may involve network calls; the registry calls it at most
/// once per sector.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    async fn build(
        &self,
        sector: &str,
        keys: &[String],
    ) -> Result<Arc<dyn SimilarityProvider>, SimilarityError>;
}

/// Text embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn embed(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>, SimilarityError>;
}
