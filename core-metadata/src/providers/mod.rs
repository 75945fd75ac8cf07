//! External Metadata Providers
//!
//! This module contains clients for external metadata services:
//! - Discogs - Release database with genre and style classifications
//! - MusicBrainz - Open music encyclopedia with community tags
//!
//! Each provider performs one remote lookup strategy and reports either a
//! normalized [`MetadataResult`] or an error. The resolver turns errors into
//! "no data", so a provider never needs to swallow failures itself.

pub mod discogs;
pub mod musicbrainz;

pub use discogs::DiscogsProvider;
pub use musicbrainz::MusicBrainzProvider;

use crate::error::Result;
use crate::query::{MetadataResult, TrackQuery};
use async_trait::async_trait;
use tracing::warn;

/// A remote source of genre and release-year data.
///
/// New sources are added by implementing this trait and registering them
/// with the [`MetadataResolver`](crate::resolver::MetadataResolver).
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Stable provider name used for ordering, logging and cache lookup
    fn name(&self) -> &str;

    /// Whether the provider has what it needs (credentials) to query remotely
    fn is_enabled(&self) -> bool {
        true
    }

    /// Performs the lookup, surfacing transport and parse failures.
    ///
    /// A disabled provider returns an empty result without any network I/O.
    async fn try_lookup(&self, query: &TrackQuery) -> Result<MetadataResult>;

    /// Performs the lookup, degrading every failure to "no data".
    async fn lookup(&self, query: &TrackQuery) -> MetadataResult {
        match self.try_lookup(query).await {
            Ok(result) => result,
            Err(e) => {
                warn!(provider = self.name(), query = %query, error = %e, "Metadata lookup failed");
                MetadataResult::default()
            }
        }
    }
}
