//! Integration tests for logging and configuration bootstrap

use bridge_traits::time::LogLevel;
use core_runtime::config::{CoreConfig, DiscogsCredentials, MetadataApiConfig, ScriptApiConfig};
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use std::time::Duration;

#[test]
fn test_logging_initialization() {
    // Only one global subscriber per process; the second call must fail cleanly
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_spans(false);

    assert!(init_logging(config.clone()).is_ok());
    assert!(init_logging(config).is_err());

    tracing::info!(artist = "Daft Punk", "logging online");
}

#[test]
fn test_redaction_of_credentials() {
    assert_eq!(redact_if_sensitive("DISCOGS_TOKEN", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("authorization", "Bearer gsk"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("title", "One More Time"), "One More Time");
    assert_eq!(redact_if_sensitive("model", "groq/compound-mini"), "groq/compound-mini");
}

#[test]
fn test_config_without_credentials_is_valid() {
    // Missing credentials disable features, they never fail the build
    let config = CoreConfig::from_lookup(|_| None).unwrap();

    assert!(!config.metadata_api_config.has_discogs());
    assert!(!config.script_api_config.has_api_key());
}

#[test]
fn test_full_explicit_config() {
    let config = CoreConfig::builder()
        .metadata_api_config(
            MetadataApiConfig::new()
                .with_discogs_credentials(DiscogsCredentials::KeySecret {
                    key: "k".into(),
                    secret: "s".into(),
                })
                .with_musicbrainz_user_agent("Radio/2.1 (ops@radio.test)")
                .with_rate_limit_delay_ms(1500)
                .with_request_timeout(Duration::from_secs(20))
                .with_cache_capacity(None),
        )
        .script_api_config(
            ScriptApiConfig::new()
                .with_api_key("gsk")
                .with_endpoint("http://localhost:8080/v1/chat/completions")
                .with_default_model("llama-3.3-70b-versatile")
                .with_temperature(0.2),
        )
        .logging(LoggingConfig::default().with_format(LogFormat::Json))
        .build()
        .unwrap();

    assert_eq!(config.metadata_api_config.rate_limit_delay_ms, 1500);
    assert_eq!(config.metadata_api_config.cache_capacity, None);
    assert_eq!(config.script_api_config.default_model, "llama-3.3-70b-versatile");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_rate_limit_ceiling() {
    let result = CoreConfig::builder()
        .metadata_api_config(MetadataApiConfig::new().with_rate_limit_delay_ms(120_000))
        .build();

    assert!(result.unwrap_err().to_string().contains("60 seconds"));
}
