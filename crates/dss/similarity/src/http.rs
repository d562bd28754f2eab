//! Embedding service client.
//!
//! Posts `{model, texts, input_type}` and reads `{embeddings: [[f32]]}`.

use std::time::Duration;

use async_trait::async_trait;
use dss_types::SimilarityConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::InputType;
use crate::error::SimilarityError;
use crate::traits::Embedder;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: InputType,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// [`Embedder`] backed by an HTTP embedding endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SimilarityError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SimilarityError::Construction(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }

    /// Build from configuration, reading the API key from `api_key_env`.
    pub fn from_config(config: &SimilarityConfig) -> Result<Self, SimilarityError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| SimilarityError::Construction("no embedding endpoint configured".into()))?;
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());
        Self::new(
            endpoint,
            config.model.clone(),
            api_key,
            Duration::from_millis(config.timeout_ms),
        )
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>, SimilarityError> {
        debug!(endpoint = %self.endpoint, texts = texts.len(), ?input_type, "Embedding request");

        let mut request = self.client.post(&self.endpoint).json(&EmbedRequest {
            model: &self.model,
            texts,
            input_type,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport_error)?;
        let body: EmbedResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                SimilarityError::MalformedResponse(e.to_string())
            } else {
                transport_error(e)
            }
        })?;

        if body.embeddings.len() != texts.len() {
            return Err(SimilarityError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }
        Ok(body.embeddings)
    }
}

fn transport_error(err: reqwest::Error) -> SimilarityError {
    if err.is_timeout() {
        SimilarityError::Timeout
    } else {
        SimilarityError::Transport(err)
    }
}
