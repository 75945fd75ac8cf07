//! Multi-model intro script generation
//!
//! Each request walks an ordered list of candidate models:
//!
//! ```text
//! Pending -> TryModel(i) -> Success
//!                        -> NextModel -> TryModel(i + 1) | Exhausted
//!                        -> AbortAll
//! ```
//!
//! Only HTTP 401 aborts the whole request. Rate limits (429), other
//! statuses, transport errors and unusable payloads all move on to the next
//! candidate. There is no retry on the same model.

use crate::error::{Result, ScriptError};
use crate::persona::Persona;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use core_metadata::TrackQuery;
use core_runtime::config::{
    ScriptApiConfig, DEFAULT_SCRIPT_ENDPOINT, DEFAULT_SCRIPT_MODEL, DEFAULT_SCRIPT_TEMPERATURE,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Immutable generator settings, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub default_model: String,
    pub temperature: f64,
    pub request_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SCRIPT_ENDPOINT.to_string(),
            default_model: DEFAULT_SCRIPT_MODEL.to_string(),
            temperature: DEFAULT_SCRIPT_TEMPERATURE,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&ScriptApiConfig> for GeneratorConfig {
    fn from(config: &ScriptApiConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            default_model: config.default_model.clone(),
            temperature: config.temperature,
            request_timeout: config.request_timeout,
        }
    }
}

/// What to write an intro for, and how
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    pub track: TrackQuery,
    pub persona: Option<Persona>,
    pub preferred_model: Option<String>,
    pub fallback_model: Option<String>,
}

impl ScriptRequest {
    pub fn new(song_title: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track: TrackQuery::new(artist_name, song_title),
            persona: None,
            preferred_model: None,
            fallback_model: None,
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = Some(persona);
        self
    }

    pub fn with_preferred_model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    /// `[preferred?, fallback (if distinct)?]`, or the default model when both are absent
    pub fn candidate_models(&self, default_model: &str) -> Vec<String> {
        let mut models = Vec::with_capacity(2);
        if let Some(preferred) = non_blank(&self.preferred_model) {
            models.push(preferred.to_string());
        }
        if let Some(fallback) = non_blank(&self.fallback_model) {
            if non_blank(&self.preferred_model) != Some(fallback) {
                models.push(fallback.to_string());
            }
        }
        if models.is_empty() {
            models.push(default_model.to_string());
        }
        models
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A validated intro script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptResult {
    pub song: String,
    pub artist: String,
    pub genre: String,
    pub release_date: String,
    pub text: String,
}

impl ScriptResult {
    /// Builds a result from the model's JSON object.
    ///
    /// `text` is mandatory (an empty string is accepted). Missing song and
    /// artist come from the request; missing genre and release date are empty.
    fn from_content(content: &Map<String, Value>, track: &TrackQuery) -> Option<Self> {
        let text = content.get("text")?.as_str()?.to_string();
        let field = |key: &str| content.get(key).and_then(value_to_string);

        Some(Self {
            song: field("song").unwrap_or_else(|| track.title.clone()),
            artist: field("artist").unwrap_or_else(|| track.artist.clone()),
            genre: field("genre").unwrap_or_default(),
            release_date: field("release_date").unwrap_or_default(),
            text,
        })
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Result of one candidate model
enum Attempt {
    Success(ScriptResult),
    NextModel,
    AbortAll,
}

/// Generates intro scripts through a chat-completions backend.
pub struct ScriptGenerator {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    config: GeneratorConfig,
}

impl fmt::Debug for ScriptGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptGenerator")
            .field("enabled", &self.api_key.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl ScriptGenerator {
    /// Creates a generator. Without an API key the generator is disabled and
    /// every request fails with [`ScriptError::Unavailable`].
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<String>,
        config: GeneratorConfig,
    ) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!("GROQ_API_KEY not configured; script generation disabled");
        }

        Self {
            http_client,
            api_key,
            config,
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &ScriptApiConfig) -> Self {
        Self::new(http_client, config.api_key.clone(), GeneratorConfig::from(config))
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a script, trying each candidate model in order.
    ///
    /// # Errors
    ///
    /// - [`ScriptError::Unavailable`] when no API key is configured
    /// - [`ScriptError::AuthenticationFailed`] on HTTP 401 (remaining models are skipped)
    /// - [`ScriptError::Exhausted`] when no candidate produced a valid script
    #[instrument(skip(self, request), fields(song = %request.track.title, artist = %request.track.artist))]
    pub async fn generate(&self, request: &ScriptRequest) -> Result<ScriptResult> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ScriptError::Unavailable(
                "no API key configured for the generation backend".to_string(),
            ));
        };

        let system_prompt = match &request.persona {
            Some(persona) => persona.prompt_template.clone(),
            None => Persona::curator().prompt_template,
        };
        let user_content = format!(
            "Song: {}\nArtist: {}",
            request.track.title, request.track.artist
        );

        let models = request.candidate_models(&self.config.default_model);
        for model in &models {
            info!(model = %model, "Requesting script");
            match self
                .try_model(api_key, model, &system_prompt, &user_content, request)
                .await
            {
                Attempt::Success(script) => return Ok(script),
                Attempt::NextModel => continue,
                Attempt::AbortAll => return Err(ScriptError::AuthenticationFailed),
            }
        }

        error!(models = ?models, "All models failed to generate script");
        Err(ScriptError::Exhausted { attempted: models })
    }

    async fn try_model(
        &self,
        api_key: &str,
        model: &str,
        system_prompt: &str,
        user_content: &str,
        request: &ScriptRequest,
    ) -> Attempt {
        let payload = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content},
            ],
            "temperature": self.config.temperature,
            "response_format": {"type": "json_object"},
        });

        let http_request = match HttpRequest::new(HttpMethod::Post, &self.config.endpoint)
            .bearer_token(api_key)
            .json(&payload)
        {
            Ok(req) => req.timeout(self.config.request_timeout),
            Err(e) => {
                error!(model, error = %e, "Failed to build generation request");
                return Attempt::NextModel;
            }
        };

        let started = Instant::now();
        let response = match self.http_client.execute(http_request).await {
            Ok(response) => response,
            Err(e) => {
                error!(model, error = %e, "Failed to generate script");
                return Attempt::NextModel;
            }
        };

        match response.status {
            200 => {}
            401 => {
                error!("Generation backend authentication failed. Check API key.");
                return Attempt::AbortAll;
            }
            429 => {
                warn!(model, "Rate limit hit, trying fallback if available");
                return Attempt::NextModel;
            }
            status => {
                error!(
                    model,
                    status,
                    body = %String::from_utf8_lossy(&response.body),
                    "Generation backend error"
                );
                return Attempt::NextModel;
            }
        }

        let content = match response.json::<ChatCompletion>() {
            Ok(completion) => completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content),
            Err(e) => {
                error!(model, error = %e, "Unreadable chat completion");
                return Attempt::NextModel;
            }
        };
        let Some(content) = content else {
            warn!(model, "Chat completion carried no message content");
            return Attempt::NextModel;
        };

        let parsed = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            _ => {
                error!(model, content = %content, "Model returned invalid JSON");
                return Attempt::NextModel;
            }
        };

        match ScriptResult::from_content(&parsed, &request.track) {
            Some(script) => {
                info!(
                    model,
                    elapsed_secs = %format!("{:.2}", started.elapsed().as_secs_f64()),
                    "Generated script for '{}'",
                    request.track.title
                );
                Attempt::Success(script)
            }
            None => {
                warn!(model, content = %content, "Response missing 'text' field");
                Attempt::NextModel
            }
        }
    }
}
