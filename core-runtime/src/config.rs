//! # Core Configuration Module
//!
//! Provides configuration management for the enrichment core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance holding every credential and tunable the core needs. It is read
//! once at startup and handed to the metadata resolver and script generator
//! at construction time; nothing reads the environment afterwards.
//!
//! Missing credentials are not an error: the affected provider or service is
//! built in a disabled state and reports "no data" for the process lifetime.
//!
//! ## Usage
//!
//! ### From the environment
//!
//! ```ignore
//! use core_runtime::config::{load_env, CoreConfig};
//!
//! load_env()?;
//! let config = CoreConfig::from_env()?;
//! ```
//!
//! ### Explicit configuration
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, DiscogsCredentials, MetadataApiConfig, ScriptApiConfig};
//!
//! let config = CoreConfig::builder()
//!     .metadata_api_config(
//!         MetadataApiConfig::new()
//!             .with_discogs_credentials(DiscogsCredentials::UserToken("token".into())),
//!     )
//!     .script_api_config(ScriptApiConfig::new().with_api_key("gsk_..."))
//!     .build()?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `DISCOGS_TOKEN` | Discogs personal user token |
//! | `DISCOGS_KEY` / `DISCOGS_CONSUMER_KEY` | Discogs consumer key |
//! | `DISCOGS_SECRET` / `DISCOGS_CONSUMER_SECRET` | Discogs consumer secret |
//! | `MUSICBRAINZ_USER_AGENT` | `App/Version (contact)` identification |
//! | `MUSICBRAINZ_RATE_LIMIT_MS` | Minimum delay between MusicBrainz requests |
//! | `METADATA_REQUEST_TIMEOUT_SECS` | Per-request timeout for metadata providers |
//! | `METADATA_CACHE_CAPACITY` | Entries per provider cache, `0` for unbounded |
//! | `GROQ_API_KEY` | Chat-completions API key |
//! | `GROQ_API_URL` | Chat-completions endpoint override |
//! | `SCRIPT_DEFAULT_MODEL` | Model used when a request names none |
//! | `SCRIPT_REQUEST_TIMEOUT_SECS` | Per-request timeout for script generation |
//! | `LOG_LEVEL` / `LOG_FORMAT` | Logging level and output format |

use crate::error::{Error, Result};
use crate::logging::{redact_if_sensitive, LogFormat, LoggingConfig};
use bridge_traits::{HttpClient, LogLevel};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Discogs client identification sent on every search
pub const DEFAULT_DISCOGS_USER_AGENT: &str = "VexoBot/1.0";

/// MusicBrainz identification (application name, version, contact)
pub const DEFAULT_MUSICBRAINZ_USER_AGENT: &str = "VexoBot/1.0 (contact@example.com)";

/// Chat-completions endpoint for script generation
pub const DEFAULT_SCRIPT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Model used when a script request names neither a preferred nor a fallback model
pub const DEFAULT_SCRIPT_MODEL: &str = "groq/compound-mini";

/// Sampling temperature for script generation
pub const DEFAULT_SCRIPT_TEMPERATURE: f64 = 0.7;

/// Entries kept per provider cache before least-recently-used eviction
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Core configuration for the enrichment core.
///
/// Use [`CoreConfigBuilder`] or [`CoreConfig::from_env`] to construct
/// instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client for provider and generation requests (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Metadata provider configuration (Discogs, MusicBrainz)
    pub metadata_api_config: MetadataApiConfig,

    /// Script generation backend configuration
    pub script_api_config: ScriptApiConfig,

    /// Logging setup applied by the host at startup
    pub logging: LoggingConfig,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("metadata_api_config", &self.metadata_api_config)
            .field("script_api_config", &self.script_api_config)
            .field("logging", &self.logging)
            .finish()
    }
}

/// Discogs authentication material.
///
/// A personal user token is preferred; a consumer key/secret pair is accepted
/// when no token is available.
#[derive(Clone, PartialEq, Eq)]
pub enum DiscogsCredentials {
    UserToken(String),
    KeySecret { key: String, secret: String },
}

impl DiscogsCredentials {
    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> String {
        match self {
            DiscogsCredentials::UserToken(token) => format!("Discogs token={}", token),
            DiscogsCredentials::KeySecret { key, secret } => {
                format!("Discogs key={}, secret={}", key, secret)
            }
        }
    }
}

impl fmt::Debug for DiscogsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscogsCredentials::UserToken(token) => f
                .debug_tuple("UserToken")
                .field(&redact_if_sensitive("token", token))
                .finish(),
            DiscogsCredentials::KeySecret { key, secret } => f
                .debug_struct("KeySecret")
                .field("key", &redact_if_sensitive("key", key))
                .field("secret", &redact_if_sensitive("secret", secret))
                .finish(),
        }
    }
}

/// Configuration for external metadata providers.
///
/// # Security Note
///
/// Credentials should never be hardcoded in the binary. Load them from the
/// environment or a `.env` file kept out of version control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataApiConfig {
    /// Discogs credentials; `None` disables the Discogs provider
    pub discogs_credentials: Option<DiscogsCredentials>,

    /// User agent sent to Discogs
    pub discogs_user_agent: String,

    /// MusicBrainz user agent string (format: "AppName/Version (Contact)")
    ///
    /// See: https://musicbrainz.org/doc/MusicBrainz_API/Rate_Limiting
    pub musicbrainz_user_agent: String,

    /// Minimum delay between MusicBrainz requests in milliseconds
    pub rate_limit_delay_ms: u64,

    /// Timeout applied to every provider request
    pub request_timeout: Duration,

    /// Per-provider cache capacity; `None` keeps every entry for the process lifetime
    pub cache_capacity: Option<usize>,
}

impl Default for MetadataApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataApiConfig {
    /// Creates a config with no Discogs credentials and default pacing
    pub fn new() -> Self {
        Self {
            discogs_credentials: None,
            discogs_user_agent: DEFAULT_DISCOGS_USER_AGENT.to_string(),
            musicbrainz_user_agent: DEFAULT_MUSICBRAINZ_USER_AGENT.to_string(),
            rate_limit_delay_ms: 1000,
            request_timeout: Duration::from_secs(15),
            cache_capacity: Some(DEFAULT_CACHE_CAPACITY),
        }
    }

    /// Sets the Discogs credentials
    pub fn with_discogs_credentials(mut self, credentials: DiscogsCredentials) -> Self {
        self.discogs_credentials = Some(credentials);
        self
    }

    /// Sets the MusicBrainz user agent
    pub fn with_musicbrainz_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.musicbrainz_user_agent = user_agent.into();
        self
    }

    /// Sets the rate limit delay in milliseconds
    pub fn with_rate_limit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.rate_limit_delay_ms = delay_ms;
        self
    }

    /// Sets the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the per-provider cache capacity (`None` for unbounded)
    pub fn with_cache_capacity(mut self, capacity: Option<usize>) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let ua = &self.musicbrainz_user_agent;
        if ua.is_empty() {
            return Err(Error::Config(
                "MusicBrainz user agent cannot be empty".to_string(),
            ));
        }
        if !ua.contains('/') || !ua.contains('(') || !ua.contains(')') {
            return Err(Error::Config(
                "MusicBrainz user agent must follow format: 'AppName/Version (Contact)'"
                    .to_string(),
            ));
        }

        if self.rate_limit_delay_ms > 60_000 {
            return Err(Error::Config(
                "Rate limit delay exceeds maximum of 60 seconds (60,000ms)".to_string(),
            ));
        }

        validate_timeout("Metadata request timeout", self.request_timeout)?;

        if self.cache_capacity == Some(0) {
            return Err(Error::Config(
                "Cache capacity must be greater than 0 (use None for unbounded)".to_string(),
            ));
        }

        Ok(())
    }

    /// Checks if Discogs is configured
    pub fn has_discogs(&self) -> bool {
        self.discogs_credentials.is_some()
    }
}

/// Configuration for the chat-completions backend that writes intro scripts.
#[derive(Clone, PartialEq)]
pub struct ScriptApiConfig {
    /// Bearer token; `None` disables script generation
    pub api_key: Option<String>,

    /// Chat-completions endpoint
    pub endpoint: String,

    /// Model used when the request names none
    pub default_model: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Timeout applied to every generation request
    pub request_timeout: Duration,
}

impl fmt::Debug for ScriptApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptApiConfig")
            .field(
                "api_key",
                &self
                    .api_key
                    .as_deref()
                    .map(|key| redact_if_sensitive("api_key", key)),
            )
            .field("endpoint", &self.endpoint)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for ScriptApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptApiConfig {
    pub fn new() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_SCRIPT_ENDPOINT.to_string(),
            default_model: DEFAULT_SCRIPT_MODEL.to_string(),
            temperature: DEFAULT_SCRIPT_TEMPERATURE,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(Error::Config(format!(
                "Script endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }

        if self.default_model.trim().is_empty() {
            return Err(Error::Config("Default script model cannot be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "Temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }

        validate_timeout("Script request timeout", self.request_timeout)
    }

    /// Checks if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn validate_timeout(name: &str, timeout: Duration) -> Result<()> {
    if timeout.is_zero() {
        return Err(Error::Config(format!("{} must be greater than 0", name)));
    }
    if timeout > MAX_TIMEOUT {
        return Err(Error::Config(format!(
            "{} exceeds maximum of {} seconds",
            name,
            MAX_TIMEOUT.as_secs()
        )));
    }
    Ok(())
}

/// Loads variables from a `.env` file in the working directory (or a parent).
///
/// A missing file is not an error; variables already present in the process
/// environment win over the file.
pub fn load_env() -> Result<()> {
    match dotenv::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "Loaded environment file");
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(Error::Environment(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Builds a configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_any = |keys: &[&str]| keys.iter().find_map(|key| get(key));

        let mut metadata = MetadataApiConfig::new();
        metadata.discogs_credentials = match get("DISCOGS_TOKEN") {
            Some(token) => Some(DiscogsCredentials::UserToken(token)),
            None => match (
                get_any(&["DISCOGS_KEY", "DISCOGS_CONSUMER_KEY"]),
                get_any(&["DISCOGS_SECRET", "DISCOGS_CONSUMER_SECRET"]),
            ) {
                (Some(key), Some(secret)) => Some(DiscogsCredentials::KeySecret { key, secret }),
                _ => None,
            },
        };
        if let Some(ua) = get("MUSICBRAINZ_USER_AGENT") {
            metadata.musicbrainz_user_agent = ua;
        }
        if let Some(ms) = get("MUSICBRAINZ_RATE_LIMIT_MS") {
            metadata.rate_limit_delay_ms = parse_var("MUSICBRAINZ_RATE_LIMIT_MS", &ms)?;
        }
        if let Some(secs) = get("METADATA_REQUEST_TIMEOUT_SECS") {
            metadata.request_timeout =
                Duration::from_secs(parse_var("METADATA_REQUEST_TIMEOUT_SECS", &secs)?);
        }
        if let Some(capacity) = get("METADATA_CACHE_CAPACITY") {
            let capacity: usize = parse_var("METADATA_CACHE_CAPACITY", &capacity)?;
            metadata.cache_capacity = (capacity > 0).then_some(capacity);
        }

        let mut script = ScriptApiConfig::new();
        script.api_key = get("GROQ_API_KEY");
        if let Some(endpoint) = get("GROQ_API_URL") {
            script.endpoint = endpoint;
        }
        if let Some(model) = get("SCRIPT_DEFAULT_MODEL") {
            script.default_model = model;
        }
        if let Some(secs) = get("SCRIPT_REQUEST_TIMEOUT_SECS") {
            script.request_timeout =
                Duration::from_secs(parse_var("SCRIPT_REQUEST_TIMEOUT_SECS", &secs)?);
        }

        let mut logging = LoggingConfig::default();
        if let Some(level) = get("LOG_LEVEL") {
            logging.level = LogLevel::from_str(&level).map_err(Error::Config)?;
        }
        if let Some(format) = get("LOG_FORMAT") {
            logging.format = LogFormat::from_str(&format)?;
        }

        CoreConfig::builder()
            .metadata_api_config(metadata)
            .script_api_config(script)
            .logging(logging)
            .build()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.metadata_api_config.validate()?;
        self.script_api_config.validate()
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| Error::Config(format!("Invalid value for {}: '{}' ({})", name, value, e)))
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Unset sections fall back to their defaults; `build()` validates the
/// result.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    metadata_api_config: Option<MetadataApiConfig>,
    script_api_config: Option<ScriptApiConfig>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) is used by the
    /// service façade when its `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the metadata provider configuration.
    pub fn metadata_api_config(mut self, config: MetadataApiConfig) -> Self {
        self.metadata_api_config = Some(config);
        self
    }

    /// Sets the script generation backend configuration.
    pub fn script_api_config(mut self, config: ScriptApiConfig) -> Self {
        self.script_api_config = Some(config);
        self
    }

    /// Sets the logging configuration.
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if any section fails validation.
    pub fn build(self) -> Result<CoreConfig> {
        let config = CoreConfig {
            http_client: self.http_client,
            metadata_api_config: self.metadata_api_config.unwrap_or_default(),
            script_api_config: self.script_api_config.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_builder_defaults() {
        let config = CoreConfig::builder().build().unwrap();

        assert!(config.http_client.is_none());
        assert!(!config.metadata_api_config.has_discogs());
        assert!(!config.script_api_config.has_api_key());
        assert_eq!(config.script_api_config.default_model, DEFAULT_SCRIPT_MODEL);
        assert_eq!(config.script_api_config.temperature, 0.7);
        assert_eq!(
            config.metadata_api_config.cache_capacity,
            Some(DEFAULT_CACHE_CAPACITY)
        );
    }

    #[test]
    fn test_from_lookup_prefers_discogs_token() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            ("DISCOGS_TOKEN", "tok"),
            ("DISCOGS_KEY", "k"),
            ("DISCOGS_SECRET", "s"),
        ]))
        .unwrap();

        assert_eq!(
            config.metadata_api_config.discogs_credentials,
            Some(DiscogsCredentials::UserToken("tok".to_string()))
        );
    }

    #[test]
    fn test_from_lookup_consumer_pair() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            ("DISCOGS_CONSUMER_KEY", "k"),
            ("DISCOGS_CONSUMER_SECRET", "s"),
        ]))
        .unwrap();

        assert_eq!(
            config.metadata_api_config.discogs_credentials,
            Some(DiscogsCredentials::KeySecret {
                key: "k".to_string(),
                secret: "s".to_string()
            })
        );
    }

    #[test]
    fn test_from_lookup_half_pair_disables_discogs() {
        let config =
            CoreConfig::from_lookup(lookup_from(&[("DISCOGS_KEY", "k"), ("DISCOGS_TOKEN", "  ")]))
                .unwrap();

        assert!(!config.metadata_api_config.has_discogs());
    }

    #[test]
    fn test_from_lookup_script_and_tuning() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "gsk"),
            ("SCRIPT_DEFAULT_MODEL", "llama-3.1-8b-instant"),
            ("SCRIPT_REQUEST_TIMEOUT_SECS", "12"),
            ("METADATA_CACHE_CAPACITY", "0"),
            ("METADATA_REQUEST_TIMEOUT_SECS", "5"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.script_api_config.api_key.as_deref(), Some("gsk"));
        assert_eq!(config.script_api_config.default_model, "llama-3.1-8b-instant");
        assert_eq!(
            config.script_api_config.request_timeout,
            Duration::from_secs(12)
        );
        assert_eq!(config.metadata_api_config.cache_capacity, None);
        assert_eq!(
            config.metadata_api_config.request_timeout,
            Duration::from_secs(5)
        );
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_from_lookup_rejects_bad_number() {
        let result =
            CoreConfig::from_lookup(lookup_from(&[("SCRIPT_REQUEST_TIMEOUT_SECS", "soon")]));

        let err = result.unwrap_err().to_string();
        assert!(err.contains("SCRIPT_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_validate_rejects_bad_user_agent() {
        let result = CoreConfig::builder()
            .metadata_api_config(MetadataApiConfig::new().with_musicbrainz_user_agent("VexoBot"))
            .build();

        assert!(result.unwrap_err().to_string().contains("AppName/Version"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = CoreConfig::builder()
            .script_api_config(ScriptApiConfig::new().with_request_timeout(Duration::ZERO))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be greater than 0"));
    }

    #[test]
    fn test_validate_rejects_temperature() {
        let result = CoreConfig::builder()
            .script_api_config(ScriptApiConfig::new().with_temperature(3.5))
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config = CoreConfig::builder()
            .metadata_api_config(
                MetadataApiConfig::new()
                    .with_discogs_credentials(DiscogsCredentials::UserToken("abc123".into())),
            )
            .script_api_config(ScriptApiConfig::new().with_api_key("gsk_secret"))
            .build()
            .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("abc123"));
        assert!(!rendered.contains("gsk_secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_discogs_authorization_header() {
        assert_eq!(
            DiscogsCredentials::UserToken("t".into()).authorization_header(),
            "Discogs token=t"
        );
        assert_eq!(
            DiscogsCredentials::KeySecret {
                key: "k".into(),
                secret: "s".into()
            }
            .authorization_header(),
            "Discogs key=k, secret=s"
        );
    }
}
