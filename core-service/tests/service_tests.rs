//! End-to-end checks of the service façade with a mocked network

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_runtime::config::{CoreConfig, DiscogsCredentials, MetadataApiConfig, ScriptApiConfig};
use core_script::{PersonaRegistry, ScriptError};
use core_service::{CoreDependencies, CoreService, ScriptInvocation};
use mockall::mock;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

fn reply(status: u16, body: String) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body),
    })
}

fn config(with_credentials: bool) -> CoreConfig {
    let mut metadata = MetadataApiConfig::new().with_rate_limit_delay_ms(0);
    let mut script = ScriptApiConfig::new();
    if with_credentials {
        metadata = metadata.with_discogs_credentials(DiscogsCredentials::UserToken("tok".into()));
        script = script.with_api_key("gsk_test");
    }

    CoreConfig::builder()
        .metadata_api_config(metadata)
        .script_api_config(script)
        .build()
        .unwrap()
}

fn service(http: MockHttpClient, config: &CoreConfig) -> CoreService {
    CoreService::from_config(
        CoreDependencies::new(Arc::new(http)),
        config,
        PersonaRegistry::builtin(),
    )
}

#[tokio::test]
async fn test_resolve_metadata_cascades_and_memoizes() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|req| req.url.contains("api.discogs.com"))
        .times(1)
        .returning(|_| reply(200, r#"{"results":[]}"#.to_string()));
    http.expect_execute()
        .withf(|req| req.url.contains("/ws/2/artist/"))
        .times(1)
        .returning(|_| reply(200, r#"{"artists":[{"tags":[{"name":"electronic"}]}]}"#.to_string()));
    http.expect_execute()
        .withf(|req| req.url.contains("/ws/2/recording/"))
        .times(1)
        .returning(|_| {
            reply(
                200,
                r#"{"recordings":[{"first-release-date":"2000","tags":[{"name":"house"}]}]}"#
                    .to_string(),
            )
        });

    let core = service(http, &config(true));

    let first = core.resolve_metadata("Daft Punk", "One More Time").await;
    let second = core.resolve_metadata("Daft Punk", "One More Time").await;

    assert_eq!(first, second);
    assert_eq!(first.year, Some(2000));
    assert!(first.genres.contains("House"));
    assert!(first.genres.contains("Electronic"));
    assert_eq!(core.resolver().provider_names(), vec!["discogs", "musicbrainz"]);
}

#[tokio::test]
async fn test_generate_script_with_fallback_model() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|req| {
            serde_json::from_slice::<serde_json::Value>(req.body.as_deref().unwrap_or_default())
                .map(|body| body["model"] == "primary")
                .unwrap_or(false)
        })
        .times(1)
        .returning(|_| reply(429, String::new()));
    http.expect_execute()
        .withf(|req| {
            serde_json::from_slice::<serde_json::Value>(req.body.as_deref().unwrap_or_default())
                .map(|body| body["model"] == "backup")
                .unwrap_or(false)
        })
        .times(1)
        .returning(|_| {
            let content = json!({"genre": "House", "release_date": "2000", "text": "Feel it."});
            reply(
                200,
                json!({"choices": [{"message": {"content": content.to_string()}}]}).to_string(),
            )
        });

    let core = service(http, &config(true));
    let script = core
        .generate_script(
            "One More Time",
            "Daft Punk",
            Some("curator"),
            Some("primary"),
            Some("backup"),
        )
        .await
        .unwrap();

    assert_eq!(script.text, "Feel it.");
    assert_eq!(script.genre, "House");
    assert_eq!(script.song, "One More Time");
}

#[tokio::test]
async fn test_missing_credentials_degrade_gracefully() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|req| req.url.contains("discogs") || req.url.contains("chat/completions"))
        .never();
    http.expect_execute()
        .withf(|req| req.url.contains("musicbrainz.org"))
        .returning(|_| reply(503, String::new()));

    let core = service(http, &config(false));
    assert!(!core.script_generation_enabled());

    let metadata = core.resolve_metadata("Daft Punk", "One More Time").await;
    assert!(metadata.is_empty());

    let err = core
        .invoke(&ScriptInvocation::new("One More Time", "Daft Punk"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScriptError::Unavailable(_)));
}

#[test]
fn test_invocation_builder() {
    let invocation = ScriptInvocation::new("Song", "Artist")
        .persona("curator")
        .preferred_model("a")
        .fallback_model("b");

    assert_eq!(invocation.persona_id.as_deref(), Some("curator"));
    assert_eq!(invocation.preferred_model.as_deref(), Some("a"));
    assert_eq!(invocation.fallback_model.as_deref(), Some("b"));
}

#[cfg(feature = "desktop-shims")]
#[test]
fn test_bootstrap_desktop_with_personas() {
    let core = core_service::bootstrap_desktop(
        &config(false),
        Some(r#"[{"id": "hype", "prompt": {"role": "You are a hype host."}}]"#),
    )
    .unwrap();
    assert_eq!(core.personas().ids(), vec!["curator", "hype"]);

    let err = core_service::bootstrap_desktop(&config(false), Some("[{\"id\": \"curator\", \"prompt\": \"x\"}]"));
    assert!(matches!(err, Err(core_service::CoreError::Script(_))));
}
