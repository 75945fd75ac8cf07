//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP) and the
//! startup configuration into the enrichment core, and exposes its two
//! entrypoints:
//!
//! - [`CoreService::resolve_metadata`] - genres and release year, never fails
//! - [`CoreService::generate_script`] - a DJ intro script or a failure marker
//!
//! Desktop and server hosts typically enable the `desktop-shims` feature
//! (which depends on `bridge-desktop`) and call [`bootstrap_desktop`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::http::HttpClient;
use core_metadata::providers::{DiscogsProvider, MusicBrainzProvider};
use core_metadata::{MetadataResolver, MetadataResult};
use core_runtime::config::CoreConfig;
use core_runtime::logging::redact_if_sensitive;
use core_script::{
    PersonaRegistry, PersonaSelector, ScriptError, ScriptGenerator, ScriptRequest, ScriptResult,
};
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
#[derive(Clone)]
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

/// Parameters of one script generation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptInvocation {
    pub song_title: String,
    pub artist_name: String,
    pub persona_id: Option<String>,
    pub preferred_model: Option<String>,
    pub fallback_model: Option<String>,
}

impl ScriptInvocation {
    pub fn new(song_title: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            song_title: song_title.into(),
            artist_name: artist_name.into(),
            ..Default::default()
        }
    }

    pub fn persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }

    pub fn preferred_model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }

    pub fn fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    resolver: Arc<MetadataResolver>,
    selector: Arc<PersonaSelector>,
    generator: Arc<ScriptGenerator>,
}

impl CoreService {
    /// Assemble a service from already-built components.
    pub fn new(
        resolver: MetadataResolver,
        selector: PersonaSelector,
        generator: ScriptGenerator,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            selector: Arc::new(selector),
            generator: Arc::new(generator),
        }
    }

    /// Build every component from the startup configuration.
    ///
    /// Providers run in the order Discogs, then MusicBrainz. Missing
    /// credentials disable the affected provider or the generator; they are
    /// not an error.
    pub fn from_config(
        deps: CoreDependencies,
        config: &CoreConfig,
        personas: PersonaRegistry,
    ) -> Self {
        let metadata = &config.metadata_api_config;
        let script = &config.script_api_config;

        info!(
            discogs = metadata.has_discogs(),
            musicbrainz_user_agent = %redact_if_sensitive("user_agent", &metadata.musicbrainz_user_agent),
            script_backend = script.has_api_key(),
            default_model = %script.default_model,
            personas = personas.len(),
            "Initializing enrichment core"
        );

        let http = deps.http_client;
        let resolver = MetadataResolver::builder()
            .provider(Arc::new(DiscogsProvider::from_config(http.clone(), metadata)))
            .provider(Arc::new(MusicBrainzProvider::from_config(http.clone(), metadata)))
            .cache_capacity(metadata.cache_capacity)
            .build();

        Self::new(
            resolver,
            PersonaSelector::new(Arc::new(personas)),
            ScriptGenerator::from_config(http, script),
        )
    }

    /// Genres and release year for a track. Never fails; "no data" is an
    /// empty result.
    pub async fn resolve_metadata(&self, artist: &str, title: &str) -> MetadataResult {
        self.resolver.resolve(artist, title).await
    }

    /// Generates an intro script.
    ///
    /// An unknown or absent persona id selects a persona at random.
    pub async fn generate_script(
        &self,
        song_title: &str,
        artist_name: &str,
        persona_id: Option<&str>,
        preferred_model: Option<&str>,
        fallback_model: Option<&str>,
    ) -> std::result::Result<ScriptResult, ScriptError> {
        let invocation = ScriptInvocation {
            song_title: song_title.to_string(),
            artist_name: artist_name.to_string(),
            persona_id: persona_id.map(str::to_string),
            preferred_model: preferred_model.map(str::to_string),
            fallback_model: fallback_model.map(str::to_string),
        };
        self.invoke(&invocation).await
    }

    /// [`generate_script`](Self::generate_script) with the parameters bundled.
    pub async fn invoke(
        &self,
        invocation: &ScriptInvocation,
    ) -> std::result::Result<ScriptResult, ScriptError> {
        let persona = self.selector.select(invocation.persona_id.as_deref());

        let mut request = ScriptRequest::new(&invocation.song_title, &invocation.artist_name)
            .with_persona(persona);
        request.preferred_model = invocation.preferred_model.clone();
        request.fallback_model = invocation.fallback_model.clone();

        self.generator.generate(&request).await
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub fn personas(&self) -> &PersonaRegistry {
        self.selector.registry()
    }

    pub fn script_generation_enabled(&self) -> bool {
        self.generator.is_enabled()
    }
}

/// Convenience bootstrapper for desktop and server hosts.
///
/// Uses the HTTP client from the configuration when present, otherwise a
/// reqwest-based client. Persona definitions, when given, are JSON as
/// accepted by [`PersonaRegistry::from_json_str`].
///
/// ```ignore
/// use core_runtime::config::{load_env, CoreConfig};
///
/// load_env()?;
/// let config = CoreConfig::from_env()?;
/// let core = core_service::bootstrap_desktop(&config, None)?;
/// let metadata = core.resolve_metadata("Daft Punk", "One More Time").await;
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(config: &CoreConfig, personas_json: Option<&str>) -> Result<CoreService> {
    let http_client: Arc<dyn HttpClient> = match &config.http_client {
        Some(client) => Arc::clone(client),
        None => Arc::new(bridge_desktop::ReqwestHttpClient::new()?),
    };

    let personas = match personas_json {
        Some(json) => PersonaRegistry::from_json_str(json)?,
        None => PersonaRegistry::builtin(),
    };

    Ok(CoreService::from_config(
        CoreDependencies::new(http_client),
        config,
        personas,
    ))
}
