use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dss_types::normalize_key;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::SimilarityError;
use crate::traits::{ProviderFactory, SimilarityMatch, SimilarityProvider};

/// How long a failed construction is remembered before a lookup may retry.
pub const DEFAULT_FAILURE_COOLDOWN: Duration = Duration::from_secs(30);

/// Outcome of a registry lookup. Lookups never fail; a provider error is
/// reported as [`SimilarityLookup::Unavailable`].
#[derive(Clone, Debug, PartialEq)]
pub enum SimilarityLookup {
    Match(SimilarityMatch),
    NoMatch,
    /// The provider could not be built or queried.
    Unavailable(String),
}

#[derive(Default)]
struct SectorSlot {
    provider: Option<Arc<dyn SimilarityProvider>>,
    last_failure: Option<(Instant, String)>,
}

type SharedSlot = Arc<Mutex<SectorSlot>>;

/// Per-sector similarity providers, built lazily and kept for the lifetime
/// of the registry.
///
/// Construction runs under the sector's slot lock, so concurrent first
/// lookups wait on a single build. A failed build is remembered for the
/// failure cooldown: lookups inside the window, including those that were
/// waiting on the failed build, report unavailable without building again.
pub struct SimilarityRegistry {
    factory: Arc<dyn ProviderFactory>,
    failure_cooldown: Duration,
    slots: Mutex<HashMap<String, SharedSlot>>,
}

impl SimilarityRegistry {
    pub fn new(factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            factory,
            failure_cooldown: DEFAULT_FAILURE_COOLDOWN,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Registry whose providers never match.
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledFactory))
    }

    pub fn with_failure_cooldown(mut self, cooldown: Duration) -> Self {
        self.failure_cooldown = cooldown;
        self
    }

    /// Nearest activity key of `sector` for `query`.
    pub async fn nearest(&self, sector: &str, keys: &[String], query: &str) -> SimilarityLookup {
        let provider = match self.provider(sector, keys).await {
            Ok(provider) => provider,
            Err(reason) => return SimilarityLookup::Unavailable(reason),
        };

        match provider.nearest(query).await {
            Ok(Some(found)) => {
                debug!(sector, query, key = %found.key, score = found.score, "Similarity lookup");
                SimilarityLookup::Match(found)
            }
            Ok(None) => SimilarityLookup::NoMatch,
            Err(err) => {
                warn!(sector, query, error = %err, "Similarity lookup failed");
                SimilarityLookup::Unavailable(err.to_string())
            }
        }
    }

    /// Sectors whose provider has been built.
    pub async fn constructed_sectors(&self) -> Vec<String> {
        let slots = self.slots.lock().await;
        let mut sectors: Vec<String> = slots
            .iter()
            // A slot locked by an in-flight build has no provider yet.
            .filter(|(_, slot)| slot.try_lock().is_ok_and(|s| s.provider.is_some()))
            .map(|(sector, _)| sector.clone())
            .collect();
        sectors.sort();
        sectors
    }

    async fn provider(
        &self,
        sector: &str,
        keys: &[String],
    ) -> Result<Arc<dyn SimilarityProvider>, String> {
        let sector_key = normalize_key(sector);
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(sector_key.clone()).or_default())
        };

        let mut slot = slot.lock().await;
        if let Some(provider) = &slot.provider {
            return Ok(Arc::clone(provider));
        }
        if let Some((failed_at, reason)) = &slot.last_failure {
            if failed_at.elapsed() < self.failure_cooldown {
                debug!(sector = %sector_key, "Similarity provider in failure cooldown");
                return Err(reason.clone());
            }
        }

        debug!(sector = %sector_key, keys = keys.len(), "Building similarity provider");
        match self.factory.build(&sector_key, keys).await {
            Ok(provider) => {
                slot.last_failure = None;
                slot.provider = Some(Arc::clone(&provider));
                Ok(provider)
            }
            Err(err) => {
                warn!(sector = %sector_key, error = %err, "Similarity provider unavailable");
                let reason = err.to_string();
                slot.last_failure = Some((Instant::now(), reason.clone()));
                Err(reason)
            }
        }
    }
}

impl std::fmt::Debug for SimilarityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityRegistry")
            .field("failure_cooldown", &self.failure_cooldown)
            .finish_non_exhaustive()
    }
}

/// Factory used when semantic matching is switched off.
pub struct DisabledFactory;

struct DisabledProvider;

#[async_trait]
impl SimilarityProvider for DisabledProvider {
    async fn nearest(&self, _query: &str) -> Result<Option<SimilarityMatch>, SimilarityError> {
        Ok(None)
    }
}

#[async_trait]
impl ProviderFactory for DisabledFactory {
    async fn build(
        &self,
        _sector: &str,
        _keys: &[String],
    ) -> Result<Arc<dyn SimilarityProvider>, SimilarityError> {
        Ok(Arc::new(DisabledProvider))
    }
}
