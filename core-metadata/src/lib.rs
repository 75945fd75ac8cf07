//! # Metadata Enrichment Module
//!
//! Enriches an `(artist, title)` pair with genres and a release year by
//! consulting external metadata providers.
//!
//! ## Overview
//!
//! This module handles:
//! - Normalized track queries and their cache keys
//! - Per-provider memoization of lookups (bounded LRU by default)
//! - Remote providers (Discogs, MusicBrainz) behind one [`MetadataProvider`] trait
//! - Cascading resolution: the first provider that yields genres wins
//!
//! Resolution never fails. Transport errors, rate limits and malformed
//! payloads degrade to an empty [`MetadataResult`] and are logged.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::{MetadataResolver, providers::{DiscogsProvider, MusicBrainzProvider}};
//! use std::sync::Arc;
//!
//! let resolver = MetadataResolver::builder()
//!     .provider(Arc::new(DiscogsProvider::from_config(http.clone(), &config)))
//!     .provider(Arc::new(MusicBrainzProvider::from_config(http, &config)))
//!     .cache_capacity(config.cache_capacity)
//!     .build();
//!
//! let result = resolver.resolve("Daft Punk", "One More Time").await;
//! ```

pub mod cache;
pub mod error;
pub mod providers;
pub mod query;
pub mod resolver;

pub use cache::ProviderCache;
pub use error::{MetadataError, Result};
pub use providers::MetadataProvider;
pub use query::{MetadataResult, TrackQuery};
pub use resolver::{MetadataResolver, MetadataResolverBuilder};
