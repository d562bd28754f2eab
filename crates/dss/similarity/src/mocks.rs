use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dss_types::normalize_key;

use crate::error::SimilarityError;
use crate::traits::{ProviderFactory, SimilarityMatch, SimilarityProvider};

/// Provider with fixed answers keyed by normalized query.
///
/// Queries without an answer yield no match.
#[derive(Clone, Debug, Default)]
pub struct StaticSimilarity {
    answers: HashMap<String, SimilarityMatch>,
    fail_lookups: bool,
}

impl StaticSimilarity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, query: &str, key: impl Into<String>, score: f64) -> Self {
        self.answers
            .insert(normalize_key(query), SimilarityMatch::new(key, score));
        self
    }

    /// Every lookup returns an error.
    pub fn failing(mut self) -> Self {
        self.fail_lookups = true;
        self
    }
}

#[async_trait]
impl SimilarityProvider for StaticSimilarity {
    async fn nearest(&self, query: &str) -> Result<Option<SimilarityMatch>, SimilarityError> {
        if self.fail_lookups {
            return Err(SimilarityError::Lookup("mock lookup failure".into()));
        }
        Ok(self.answers.get(&normalize_key(query)).cloned())
    }
}

/// Factory handing out a [`StaticSimilarity`] for every sector.
///
/// Counts constructions so tests can assert the registry's single-flight
/// behaviour.
#[derive(Debug, Default)]
pub struct StaticFactory {
    provider: StaticSimilarity,
    fail_build: bool,
    build_delay: Option<Duration>,
    builds: AtomicUsize,
}

impl StaticFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, query: &str, key: impl Into<String>, score: f64) -> Self {
        self.provider = self.provider.with_answer(query, key, score);
        self
    }

    /// Every construction fails.
    pub fn failing_build(mut self) -> Self {
        self.fail_build = true;
        self
    }

    /// Constructed providers fail every lookup.
    pub fn failing_lookups(mut self) -> Self {
        self.provider = self.provider.failing();
        self
    }

    /// Sleep during construction to widen race windows.
    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }

    /// Number of constructions attempted so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderFactory for StaticFactory {
    async fn build(
        &self,
        _sector: &str,
        keys: &[String],
    ) -> Result<Arc<dyn SimilarityProvider>, SimilarityError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.build_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_build {
            return Err(SimilarityError::Construction(format!(
                "mock construction failure ({} keys)",
                keys.len()
            )));
        }
        Ok(Arc::new(self.provider.clone()))
    }
}
