//! Discogs API Client
//!
//! Looks up genres, styles and the release year of the best-matching
//! Discogs release.
//!
//! ## API Endpoints
//!
//! - **Search**: `https://api.discogs.com/database/search?q={artist - title}&type=release&per_page=1`
//!
//! ## Authentication
//!
//! The database search endpoint requires authentication. A personal user
//! token is preferred; a consumer key/secret pair works as well. Without
//! either the provider is disabled for the lifetime of the process and every
//! lookup returns "no data" without touching the network.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::providers::DiscogsProvider;
//! use core_runtime::config::DiscogsCredentials;
//!
//! let provider = DiscogsProvider::new(
//!     http_client,
//!     Some(DiscogsCredentials::UserToken(token)),
//!     "VexoBot/1.0".to_string(),
//! );
//!
//! let result = provider.lookup(&TrackQuery::new("Daft Punk", "One More Time")).await;
//! ```

use crate::error::{MetadataError, Result};
use crate::providers::MetadataProvider;
use crate::query::{MetadataResult, TrackQuery};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use core_runtime::config::{DiscogsCredentials, MetadataApiConfig};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Discogs API base URL
const DISCOGS_API_BASE: &str = "https://api.discogs.com";

/// Default timeout for API requests
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub const PROVIDER_NAME: &str = "discogs";

/// Discogs release search client
pub struct DiscogsProvider {
    http_client: Arc<dyn HttpClient>,
    credentials: Option<DiscogsCredentials>,
    user_agent: String,
    base_url: String,
    request_timeout: Duration,
}

/// One hit of a database search
#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default, alias = "genres")]
    genre: Vec<String>,
    #[serde(default, alias = "styles")]
    style: Vec<String>,
    /// Discogs serves the year as a string on search hits and as a number on
    /// release resources
    #[serde(default)]
    year: Option<serde_json::Value>,
}

impl SearchHit {
    fn year(&self) -> Option<i32> {
        let year = match self.year.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            serde_json::Value::String(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        };
        // Discogs uses 0 for "unknown"
        year.filter(|y| *y > 0)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

impl DiscogsProvider {
    /// Creates a new Discogs provider
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `credentials` - Token or key/secret pair; `None` disables the provider
    /// * `user_agent` - Client identification sent with every request
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        credentials: Option<DiscogsCredentials>,
        user_agent: String,
    ) -> Self {
        match &credentials {
            Some(DiscogsCredentials::UserToken(_)) => {
                info!("Initializing Discogs provider with user token")
            }
            Some(DiscogsCredentials::KeySecret { .. }) => {
                info!("Initializing Discogs provider with consumer key/secret")
            }
            None => warn!(
                "Discogs provider disabled: no credentials found (DISCOGS_TOKEN or DISCOGS_KEY/SECRET)"
            ),
        }

        Self {
            http_client,
            credentials,
            user_agent,
            base_url: DISCOGS_API_BASE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Builds the provider from the metadata section of the core configuration
    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &MetadataApiConfig) -> Self {
        Self::new(
            http_client,
            config.discogs_credentials.clone(),
            config.discogs_user_agent.clone(),
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

    fn search_url(&self, query: &TrackQuery) -> String {
        let q = format!("{} - {}", query.artist, query.title);
        format!(
            "{}/database/search?q={}&type=release&per_page=1",
            self.base_url,
            urlencoding::encode(&q)
        )
    }

    /// Searches releases and returns the first hit, if any
    async fn search_release(
        &self,
        credentials: &DiscogsCredentials,
        query: &TrackQuery,
    ) -> Result<Option<SearchHit>> {
        let url = self.search_url(query);
        debug!("Searching Discogs: {}", url);

        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .header("Authorization", credentials.authorization_header())
            .timeout(self.request_timeout);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::NetworkError(format!("Discogs search failed: {}", e)))?;

        if response.status == 429 {
            let retry_after = response
                .header("Retry-After")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(60);

            return Err(MetadataError::RateLimited {
                provider: "Discogs".to_string(),
                retry_after_seconds: retry_after,
            });
        }

        if !response.is_success() {
            return Err(MetadataError::HttpError {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).to_string(),
            });
        }

        let search: SearchResponse = serde_json::from_slice(&response.body).map_err(|e| {
            MetadataError::JsonParse(format!("Failed to parse Discogs search results: {}", e))
        })?;

        // First hit is taken as the best match
        Ok(search.results.into_iter().next())
    }
}

#[async_trait]
impl MetadataProvider for DiscogsProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    async fn try_lookup(&self, query: &TrackQuery) -> Result<MetadataResult> {
        let Some(credentials) = &self.credentials else {
            return Ok(MetadataResult::default());
        };

        let Some(hit) = self.search_release(credentials, query).await? else {
            debug!("No Discogs release found for '{}'", query);
            return Ok(MetadataResult::default());
        };

        let year = hit.year();
        let result = MetadataResult::new(hit.genre.into_iter().chain(hit.style), year);

        if result.has_genres() {
            info!(
                genres = ?result.genres,
                year = ?result.year,
                "Discogs found genres for '{}'",
                query
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn token() -> Option<DiscogsCredentials> {
        Some(DiscogsCredentials::UserToken("tok".to_string()))
    }

    #[tokio::test]
    async fn test_lookup_merges_genres_and_styles() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| {
                req.url.contains("/database/search?q=Daft%20Punk%20-%20One%20More%20Time")
                    && req.url.contains("type=release")
                    && req.headers.get("Authorization").map(String::as_str)
                        == Some("Discogs token=tok")
                    && req.headers.get("User-Agent").map(String::as_str) == Some("VexoBot/1.0")
            })
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"results":[{"genre":["Electronic"],"style":["House","Disco","electronic"],"year":"2000"},
                                   {"genre":["Pop"],"year":"2001"}]}"#,
                ))
            });

        let provider = DiscogsProvider::new(Arc::new(http), token(), "VexoBot/1.0".into());
        let result = provider
            .try_lookup(&TrackQuery::new("Daft Punk", "One More Time"))
            .await
            .unwrap();

        assert_eq!(result.year, Some(2000));
        assert_eq!(result.genres.len(), 3);
        assert!(result.genres.contains("Electronic"));
        assert!(result.genres.contains("House"));
        assert!(result.genres.contains("Disco"));
    }

    #[tokio::test]
    async fn test_disabled_provider_makes_no_requests() {
        let mut http = MockHttpClient::new();
        http.expect_execute().never();

        let provider = DiscogsProvider::new(Arc::new(http), None, "VexoBot/1.0".into());
        assert!(!provider.is_enabled());

        let result = provider
            .lookup(&TrackQuery::new("Daft Punk", "One More Time"))
            .await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_key_secret_authorization() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| {
                req.headers.get("Authorization").map(String::as_str)
                    == Some("Discogs key=k, secret=s")
            })
            .times(1)
            .returning(|_| Ok(response(200, r#"{"results":[]}"#)));

        let credentials = DiscogsCredentials::KeySecret {
            key: "k".into(),
            secret: "s".into(),
        };
        let provider = DiscogsProvider::new(Arc::new(http), Some(credentials), "VexoBot/1.0".into());
        let result = provider
            .try_lookup(&TrackQuery::new("Nobody", "Nothing"))
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_numeric_and_unknown_years() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, r#"{"results":[{"genres":["Jazz"],"year":0}]}"#)));

        let provider = DiscogsProvider::new(Arc::new(http), token(), "VexoBot/1.0".into());
        let result = provider
            .try_lookup(&TrackQuery::new("Miles Davis", "So What"))
            .await
            .unwrap();

        assert_eq!(result.year, None);
        assert!(result.genres.contains("Jazz"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(1).returning(|_| {
            let mut resp = response(429, "");
            resp.headers.insert("retry-after".into(), "7".into());
            Ok(resp)
        });

        let provider = DiscogsProvider::new(Arc::new(http), token(), "VexoBot/1.0".into());
        let err = provider
            .try_lookup(&TrackQuery::new("a", "b"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MetadataError::RateLimited {
                retry_after_seconds: 7,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failures_degrade_to_no_data() {
        let mut http = MockHttpClient::new();
        let mut calls = 0;
        http.expect_execute().times(3).returning(move |_| {
            calls += 1;
            match calls {
                1 => Ok(response(401, r#"{"message":"You must authenticate"}"#)),
                2 => Ok(response(200, "<html>not json</html>")),
                _ => Err(bridge_traits::BridgeError::Timeout("15s".into())),
            }
        });

        let provider = DiscogsProvider::new(Arc::new(http), token(), "VexoBot/1.0".into());
        let query = TrackQuery::new("a", "b");
        for _ in 0..3 {
            assert!(provider.lookup(&query).await.is_empty());
        }
    }

    #[test]
    fn test_search_url_override() {
        let http = MockHttpClient::new();
        let provider = DiscogsProvider::new(Arc::new(http), token(), "VexoBot/1.0".into())
            .with_base_url("http://localhost:9000/");

        assert_eq!(
            provider.search_url(&TrackQuery::new("AC/DC", "T.N.T.")),
            "http://localhost:9000/database/search?q=AC%2FDC%20-%20T.N.T.&type=release&per_page=1"
        );
    }
}
