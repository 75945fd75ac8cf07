//! Cascading metadata resolution
//!
//! Providers are consulted one at a time in priority order. Each provider
//! has its own [`ProviderCache`]; a cache hit never touches the network. The
//! first provider whose result carries genres wins, and its year comes with
//! it. Results are never merged across providers.

use crate::cache::{ProviderCache, DEFAULT_CAPACITY};
use crate::providers::MetadataProvider;
use crate::query::{MetadataResult, TrackQuery};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

struct ProviderSlot {
    provider: Arc<dyn MetadataProvider>,
    cache: ProviderCache,
}

/// Runs registered providers as a strict cascading fallback.
pub struct MetadataResolver {
    slots: Vec<ProviderSlot>,
}

impl MetadataResolver {
    pub fn builder() -> MetadataResolverBuilder {
        MetadataResolverBuilder::default()
    }

    /// Names of the registered providers, in default priority order
    pub fn provider_names(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.provider.name()).collect()
    }

    /// Resolves genres and year using every provider in registration order.
    ///
    /// Repeating a lookup returns the same answer only once every provider it
    /// reached has answered successfully; a provider that failed is asked again
    /// next time, so a transient outage can change a later result.
    pub async fn resolve(&self, artist: &str, title: &str) -> MetadataResult {
        let order: Vec<usize> = (0..self.slots.len()).collect();
        self.resolve_slots(&TrackQuery::new(artist, title), &order)
            .await
    }

    /// Resolves using only the named providers, in the given order.
    ///
    /// Unknown names are skipped. Failed providers are not memoized, as in
    /// [`resolve`](Self::resolve).
    pub async fn resolve_with_order(
        &self,
        artist: &str,
        title: &str,
        provider_order: &[&str],
    ) -> MetadataResult {
        let order: Vec<usize> = provider_order
            .iter()
            .filter_map(|name| {
                let index = self.slots.iter().position(|s| s.provider.name() == *name);
                if index.is_none() {
                    debug!(provider = %name, "Skipping unknown metadata provider");
                }
                index
            })
            .collect();

        self.resolve_slots(&TrackQuery::new(artist, title), &order)
            .await
    }

    /// Number of memoized lookups held for a provider
    pub async fn cache_len(&self, provider: &str) -> Option<usize> {
        match self.slot(provider) {
            Some(slot) => Some(slot.cache.len().await),
            None => None,
        }
    }

    /// Drops every memoized lookup of every provider
    pub async fn clear_caches(&self) {
        for slot in &self.slots {
            slot.cache.clear().await;
        }
    }

    fn slot(&self, provider: &str) -> Option<&ProviderSlot> {
        self.slots.iter().find(|s| s.provider.name() == provider)
    }

    #[instrument(skip(self, query, order), fields(query = %query))]
    async fn resolve_slots(&self, query: &TrackQuery, order: &[usize]) -> MetadataResult {
        let key = query.cache_key();
        let mut last = MetadataResult::default();

        for slot in order.iter().filter_map(|&i| self.slots.get(i)) {
            let name = slot.provider.name();

            let result = match slot.cache.get(&key).await {
                Some(cached) => {
                    debug!(provider = name, "Metadata cache hit");
                    cached
                }
                None => match slot.provider.try_lookup(query).await {
                    Ok(result) => {
                        // Empty results are memoized too, so permanently
                        // unknown tracks are not queried again
                        slot.cache.put(key.clone(), result.clone()).await;
                        result
                    }
                    Err(e) => {
                        warn!(provider = name, error = %e, "Metadata provider failed, trying next");
                        MetadataResult::default()
                    }
                },
            };

            if result.has_genres() {
                debug!(provider = name, genres = ?result.genres, year = ?result.year, "Metadata resolved");
                return result;
            }
            last = result;
        }

        debug!("No provider returned genres");
        last
    }
}

/// Builder for [`MetadataResolver`].
///
/// Providers are consulted in the order they are added.
pub struct MetadataResolverBuilder {
    providers: Vec<Arc<dyn MetadataProvider>>,
    cache_capacity: Option<usize>,
}

impl Default for MetadataResolverBuilder {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            cache_capacity: Some(DEFAULT_CAPACITY),
        }
    }
}

impl MetadataResolverBuilder {
    pub fn provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Per-provider cache capacity; `None` keeps entries forever
    pub fn cache_capacity(mut self, capacity: Option<usize>) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn build(self) -> MetadataResolver {
        let capacity = self.cache_capacity;
        MetadataResolver {
            slots: self
                .providers
                .into_iter()
                .map(|provider| ProviderSlot {
                    provider,
                    cache: ProviderCache::with_capacity(capacity),
                })
                .collect(),
        }
    }
}
