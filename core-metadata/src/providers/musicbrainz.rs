//! MusicBrainz API Client
//!
//! Harvests community tags (as genres) and a release year from MusicBrainz.
//!
//! ## API Endpoints
//!
//! - **Artist search**: `https://musicbrainz.org/ws/2/artist/?query=artist:"{artist}"&fmt=json&limit=1`
//! - **Recording search**: `https://musicbrainz.org/ws/2/recording/?query=artist:"{artist}" AND recording:"{title}"&fmt=json&limit=1`
//!
//! The artist search contributes broad genre tags, the recording search
//! contributes specific tags and the year. Both tag lists are title-cased and
//! merged as a plain set union.
//!
//! ## Rate Limiting
//!
//! MusicBrainz API enforces rate limiting:
//! - Anonymous clients: 1 request/second
//! - Identified clients (with User-Agent): 1 request/second
//!
//! The client enforces a minimum delay between requests and reports HTTP 503
//! (the service's throttling response) as a rate limit.
//!
//! ## User Agent Requirement
//!
//! MusicBrainz requires all API clients to identify themselves with a proper User-Agent header:
//! Format: "ApplicationName/Version (ContactEmail)"
//! Example: "VexoBot/1.0 (contact@example.com)"

use crate::error::{MetadataError, Result};
use crate::providers::MetadataProvider;
use crate::query::{parse_year, title_case, MetadataResult, TrackQuery};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::config::MetadataApiConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info};

/// MusicBrainz API base URL
const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";

/// Default timeout for API requests
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub const PROVIDER_NAME: &str = "musicbrainz";

/// MusicBrainz artist/recording search client
pub struct MusicBrainzProvider {
    http_client: Arc<dyn HttpClient>,
    user_agent: String,
    base_url: String,
    request_timeout: Duration,
    rate_limiter: Mutex<RateLimiter>,
}

/// Simple rate limiter to enforce delay between requests
struct RateLimiter {
    clock: Arc<dyn Clock>,
    last_request_ms: Option<i64>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(delay_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last_request_ms: None,
            min_delay: Duration::from_millis(delay_ms),
        }
    }

    /// Time still to wait before the next request may go out
    fn pending_delay(&self) -> Option<Duration> {
        let last = self.last_request_ms?;
        let elapsed_ms = self.clock.unix_timestamp_millis() - last;
        let required_ms = self.min_delay.as_millis() as i64;
        (elapsed_ms < required_ms).then(|| Duration::from_millis((required_ms - elapsed_ms) as u64))
    }

    async fn wait_if_needed(&mut self) {
        if let Some(wait_time) = self.pending_delay() {
            debug!("Rate limiting: waiting {:?}", wait_time);
            sleep(wait_time).await;
        }
        self.last_request_ms = Some(self.clock.unix_timestamp_millis());
    }
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArtistHit {
    #[serde(default, alias = "tag-list")]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default, alias = "artist-list")]
    artists: Vec<ArtistHit>,
}

#[derive(Debug, Deserialize)]
struct ReleaseRef {
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RecordingHit {
    #[serde(default, alias = "tag-list")]
    tags: Vec<Tag>,
    #[serde(default)]
    first_release_date: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default, alias = "release-list")]
    releases: Vec<ReleaseRef>,
}

impl RecordingHit {
    /// A recording that carries its own date decides the year, even when that
    /// date is empty or malformed; the first release's date is consulted only
    /// when the recording has no date field at all.
    fn year(&self) -> Option<i32> {
        match self.first_release_date.as_deref().or(self.date.as_deref()) {
            Some(date) => parse_year(date),
            None => self
                .releases
                .first()
                .and_then(|release| release.date.as_deref())
                .and_then(parse_year),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordingSearchResponse {
    #[serde(default, alias = "recording-list")]
    recordings: Vec<RecordingHit>,
}

impl MusicBrainzProvider {
    /// Creates a new MusicBrainz provider
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `user_agent` - User agent string (format: "AppName/Version (Contact)")
    /// * `rate_limit_delay_ms` - Minimum delay between requests in milliseconds
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        user_agent: String,
        rate_limit_delay_ms: u64,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::with_clock(http_client, user_agent, rate_limit_delay_ms, clock)
    }

    pub fn with_clock(
        http_client: Arc<dyn HttpClient>,
        user_agent: String,
        rate_limit_delay_ms: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client,
            user_agent,
            base_url: MUSICBRAINZ_API_BASE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            rate_limiter: Mutex::new(RateLimiter::new(rate_limit_delay_ms, clock)),
        }
    }

    /// Builds the provider from the metadata section of the core configuration
    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &MetadataApiConfig) -> Self {
        Self::new(
            http_client,
            config.musicbrainz_user_agent.clone(),
            config.rate_limit_delay_ms,
        )
        .with_request_timeout(config.request_timeout)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Overrides the API base URL (mirrors, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn artist_search_url(&self, artist: &str) -> String {
        let query = format!("artist:\"{}\"", Self::escape_query(artist));
        format!(
            "{}/artist/?query={}&fmt=json&limit=1",
            self.base_url,
            urlencoding::encode(&query)
        )
    }

    fn recording_search_url(&self, artist: &str, title: &str) -> String {
        // Lucene query syntax: artist:"..." AND recording:"..."
        let query = format!(
            "artist:\"{}\" AND recording:\"{}\"",
            Self::escape_query(artist),
            Self::escape_query(title)
        );
        format!(
            "{}/recording/?query={}&fmt=json&limit=1",
            self.base_url,
            urlencoding::encode(&query)
        )
    }

    async fn search<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!("Searching MusicBrainz: {}", url);

        self.rate_limiter.lock().await.wait_if_needed().await;

        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .timeout(self.request_timeout);

        let response = self.http_client.execute(request).await.map_err(|e| {
            MetadataError::NetworkError(format!("MusicBrainz search failed: {}", e))
        })?;

        match response.status {
            200..=299 => serde_json::from_slice(&response.body).map_err(|e| {
                MetadataError::JsonParse(format!("Failed to parse search results: {}", e))
            }),
            429 | 503 => {
                let retry_after = response
                    .header("Retry-After")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(1);

                Err(MetadataError::RateLimited {
                    provider: "MusicBrainz".to_string(),
                    retry_after_seconds: retry_after,
                })
            }
            status => Err(MetadataError::HttpError {
                status,
                body: String::from_utf8_lossy(&response.body).to_string(),
            }),
        }
    }

    /// Broad genre tags of the best-matching artist
    async fn artist_tags(&self, artist: &str) -> Result<Vec<String>> {
        let response: ArtistSearchResponse = self.search(self.artist_search_url(artist)).await?;
        Ok(response
            .artists
            .into_iter()
            .next()
            .map(|hit| hit.tags.iter().map(|t| title_case(&t.name)).collect())
            .unwrap_or_default())
    }

    /// Specific tags and year of the best-matching recording
    async fn recording_tags(&self, query: &TrackQuery) -> Result<(Vec<String>, Option<i32>)> {
        let response: RecordingSearchResponse = self
            .search(self.recording_search_url(&query.artist, &query.title))
            .await?;

        Ok(response
            .recordings
            .into_iter()
            .next()
            .map(|hit| {
                let tags = hit.tags.iter().map(|t| title_case(&t.name)).collect();
                (tags, hit.year())
            })
            .unwrap_or_default())
    }

    /// Escapes special characters in Lucene query syntax
    fn escape_query(s: &str) -> String {
        // Escape special Lucene characters: + - && || ! ( ) { } [ ] ^ " ~ * ? : \ / .
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('+', "\\+")
            .replace('-', "\\-")
            .replace('!', "\\!")
            .replace('(', "\\(")
            .replace(')', "\\)")
            .replace('{', "\\{")
            .replace('}', "\\}")
            .replace('[', "\\[")
            .replace(']', "\\]")
            .replace('^', "\\^")
            .replace('~', "\\~")
            .replace('*', "\\*")
            .replace('?', "\\?")
            .replace(':', "\\:")
            .replace('/', "\\/")
            .replace('.', "\\.")
    }
}

#[async_trait]
impl MetadataProvider for MusicBrainzProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn try_lookup(&self, query: &TrackQuery) -> Result<MetadataResult> {
        let artist_tags = self.artist_tags(&query.artist).await?;
        let (recording_tags, year) = self.recording_tags(query).await?;

        let result = MetadataResult::new(recording_tags.into_iter().chain(artist_tags), year);

        if result.has_genres() {
            info!(
                genres = ?result.genres,
                year = ?result.year,
                "MusicBrainz found metadata for '{}'",
                query
            );
        }

        Ok(result)
    }
}
