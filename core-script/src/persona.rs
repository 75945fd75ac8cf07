//! Personas: named system prompts for intro scripts
//!
//! A persona either carries a ready-made prompt string or a set of
//! [`PromptComponents`] that are rendered into the sectioned prompt format
//! the backend expects. Components a persona leaves out are taken from the
//! built-in curator persona.

use crate::error::{Result, ScriptError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Id of the persona that is always registered
pub const DEFAULT_PERSONA_ID: &str = "curator";

const CURATOR_ROLE: &str = "You are a Cool, Knowledgeable Music Curator. You're not a radio DJ with a \"voice\"; you're that friend who always knows the perfect song for the moment. Your vibe is authentic, relaxed, and conversational.";
const CURATOR_TASK: &str = "Write a short, natural intro for the specified track.";
const CURATOR_WORD_COUNT: &str = "Keep it under 40 words.";
const CURATOR_OUTPUT_FORMAT: &str = "Return a valid JSON object with the following keys:
- \"song\": The song title (string)
- \"artist\": The artist name (string)
- \"genre\": The inferred genre (string)
- \"release_date\": The release year (string)
- \"text\": The intro script (string)";
const CURATOR_GUIDELINES: &str = "Natural Flow: Avoid \"radio announcer\" clichés. Talk like a real person.
Connection: Focus on how the song *feels* or the specific moment it fits.
The Reveal: Have 1/3 chance to mention the Artist and Song (naturally).
Rhythm: Use natural pauses.";
const CURATOR_VOCAL_CUES: &str = "Do NOT include any stage directions or bracketed text.";

/// Sections of a structured system prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptComponents {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub word_count: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub guidelines: Option<String>,
    #[serde(default)]
    pub vocal_cues: Option<String>,
}

impl PromptComponents {
    /// Components of the built-in curator persona
    pub fn curator() -> Self {
        Self {
            role: Some(CURATOR_ROLE.to_string()),
            task: Some(CURATOR_TASK.to_string()),
            word_count: Some(CURATOR_WORD_COUNT.to_string()),
            output_format: Some(CURATOR_OUTPUT_FORMAT.to_string()),
            guidelines: Some(CURATOR_GUIDELINES.to_string()),
            vocal_cues: Some(CURATOR_VOCAL_CUES.to_string()),
        }
    }

    /// Renders the system prompt, filling missing sections from the curator
    pub fn render(&self) -> String {
        let pick = |own: &Option<String>, fallback: &'static str| -> String {
            own.clone().unwrap_or_else(|| fallback.to_string())
        };

        format!(
            "ROLE:\n{}\nTASK:\n{}\nTEXT MAX WORD COUNT:\n{}\nOUTPUT FORMAT:\n{}\nSTRICT GUIDELINES:\n{}\nVocal Cues:\n{}",
            pick(&self.role, CURATOR_ROLE),
            pick(&self.task, CURATOR_TASK),
            pick(&self.word_count, CURATOR_WORD_COUNT),
            pick(&self.output_format, CURATOR_OUTPUT_FORMAT),
            pick(&self.guidelines, CURATOR_GUIDELINES),
            pick(&self.vocal_cues, CURATOR_VOCAL_CUES),
        )
    }
}

/// Persona prompt as written in a definition file
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PromptSource {
    Raw(String),
    Components(PromptComponents),
}

#[derive(Debug, Deserialize)]
struct PersonaDefinition {
    id: String,
    #[serde(default, alias = "displayName")]
    display_name: Option<String>,
    prompt: PromptSource,
}

/// A named system prompt controlling the tone of generated scripts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Persona {
    pub id: String,
    pub display_name: String,
    pub prompt_template: String,
}

impl Persona {
    /// Persona with a ready-made prompt, used verbatim
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            prompt_template: prompt_template.into(),
        }
    }

    /// Persona whose prompt is rendered from components
    pub fn from_components(
        id: impl Into<String>,
        display_name: impl Into<String>,
        components: &PromptComponents,
    ) -> Self {
        Self::new(id, display_name, components.render())
    }

    /// The built-in curator persona
    pub fn curator() -> Self {
        Self::from_components(
            DEFAULT_PERSONA_ID,
            "Music Curator",
            &PromptComponents::curator(),
        )
    }
}

/// Read-only set of personas indexed by id.
///
/// Populated at startup; the curator persona is always present, so the
/// registry is never empty.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PersonaRegistry {
    /// Registry containing only the built-in personas
    pub fn builtin() -> Self {
        Self {
            personas: vec![Persona::curator()],
        }
    }

    /// Built-ins plus the given personas. Duplicate ids are rejected.
    pub fn with_personas(personas: impl IntoIterator<Item = Persona>) -> Result<Self> {
        let mut registry = Self::builtin();
        for persona in personas {
            registry.register(persona)?;
        }
        Ok(registry)
    }

    /// Built-ins plus personas from a JSON array:
    ///
    /// ```json
    /// [
    ///   {"id": "hype", "display_name": "Hype Host", "prompt": {"role": "You are a hype host."}},
    ///   {"id": "noir", "prompt": "You narrate like a detective novel. Reply in JSON with a text key."}
    /// ]
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let definitions: Vec<PersonaDefinition> = serde_json::from_str(json)
            .map_err(|e| ScriptError::InvalidPersona(format!("Failed to parse personas: {}", e)))?;

        let personas = definitions
            .into_iter()
            .map(|definition| {
                if definition.id.trim().is_empty() {
                    return Err(ScriptError::InvalidPersona(
                        "Persona id cannot be empty".to_string(),
                    ));
                }
                let display_name = definition
                    .display_name
                    .unwrap_or_else(|| definition.id.clone());
                Ok(match definition.prompt {
                    PromptSource::Raw(prompt) if prompt.trim().is_empty() => {
                        Persona::from_components(definition.id, display_name, &PromptComponents::default())
                    }
                    PromptSource::Raw(prompt) => Persona::new(definition.id, display_name, prompt),
                    PromptSource::Components(components) => {
                        Persona::from_components(definition.id, display_name, &components)
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::with_personas(personas)
    }

    fn register(&mut self, persona: Persona) -> Result<()> {
        if self.get(&persona.id).is_some() {
            return Err(ScriptError::DuplicatePersona(persona.id));
        }
        self.personas.push(persona);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.personas.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

/// Picks the persona for a request.
pub struct PersonaSelector {
    registry: Arc<PersonaRegistry>,
    rng: Mutex<StdRng>,
}

impl PersonaSelector {
    /// Selector drawing from OS entropy
    pub fn new(registry: Arc<PersonaRegistry>) -> Self {
        Self::with_rng(registry, StdRng::from_os_rng())
    }

    /// Selector with a reproducible random sequence
    pub fn with_seed(registry: Arc<PersonaRegistry>, seed: u64) -> Self {
        Self::with_rng(registry, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(registry: Arc<PersonaRegistry>, rng: StdRng) -> Self {
        Self {
            registry,
            rng: Mutex::new(rng),
        }
    }

    pub fn registry(&self) -> &PersonaRegistry {
        &self.registry
    }

    /// Returns the requested persona when it exists, otherwise one chosen
    /// uniformly at random.
    pub fn select(&self, explicit_id: Option<&str>) -> Persona {
        if let Some(id) = explicit_id {
            match self.registry.get(id) {
                Some(persona) => return persona.clone(),
                None => debug!(persona = id, "Unknown persona requested, picking at random"),
            }
        }

        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.random_range(0..self.registry.len())
        };
        self.registry
            .personas
            .get(index)
            .cloned()
            .unwrap_or_else(Persona::curator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn three_personas() -> Arc<PersonaRegistry> {
        Arc::new(
            PersonaRegistry::with_personas(vec![
                Persona::new("hype", "Hype Host", "Be loud."),
                Persona::new("noir", "Noir Narrator", "Be moody."),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_curator_prompt_sections() {
        let prompt = Persona::curator().prompt_template;

        assert!(prompt.starts_with("ROLE:\nYou are a Cool, Knowledgeable Music Curator."));
        assert!(prompt.contains("\nTASK:\nWrite a short, natural intro for the specified track.\n"));
        assert!(prompt.contains("\nTEXT MAX WORD COUNT:\nKeep it under 40 words.\n"));
        assert!(prompt.contains("\nOUTPUT FORMAT:\nReturn a valid JSON object"));
        assert!(prompt.contains("\nSTRICT GUIDELINES:\nNatural Flow:"));
        assert!(prompt.ends_with(
            "Vocal Cues:\nDo NOT include any stage directions or bracketed text."
        ));
    }

    #[test]
    fn test_missing_components_fall_back_to_curator() {
        let components = PromptComponents {
            role: Some("You are a late-night jazz host.".to_string()),
            word_count: Some("Keep it under 20 words.".to_string()),
            ..Default::default()
        };
        let prompt = components.render();

        assert!(prompt.starts_with("ROLE:\nYou are a late-night jazz host.\nTASK:\nWrite a short"));
        assert!(prompt.contains("Keep it under 20 words."));
        assert!(!prompt.contains("Keep it under 40 words."));
        assert!(prompt.contains("Do NOT include any stage directions"));
    }

    #[test]
    fn test_from_json_str() {
        let registry = PersonaRegistry::from_json_str(
            r#"[
                {"id": "hype", "display_name": "Hype Host", "prompt": {"role": "You are a hype host."}},
                {"id": "noir", "prompt": "You narrate like a detective novel."}
            ]"#,
        )
        .unwrap();

        assert_eq!(registry.ids(), vec!["curator", "hype", "noir"]);

        let hype = registry.get("hype").unwrap();
        assert_eq!(hype.display_name, "Hype Host");
        assert!(hype.prompt_template.starts_with("ROLE:\nYou are a hype host.\nTASK:"));

        let noir = registry.get("noir").unwrap();
        assert_eq!(noir.display_name, "noir");
        assert_eq!(noir.prompt_template, "You narrate like a detective novel.");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = PersonaRegistry::from_json_str(
            r#"[{"id": "curator", "prompt": "again"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::DuplicatePersona(id) if id == "curator"));

        let err = PersonaRegistry::with_personas(vec![
            Persona::new("a", "A", "x"),
            Persona::new("a", "A2", "y"),
        ])
        .unwrap_err();
        assert!(matches!(err, ScriptError::DuplicatePersona(_)));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            PersonaRegistry::from_json_str("{not json"),
            Err(ScriptError::InvalidPersona(_))
        ));
        assert!(matches!(
            PersonaRegistry::from_json_str(r#"[{"id": " ", "prompt": "x"}]"#),
            Err(ScriptError::InvalidPersona(_))
        ));
    }

    #[test]
    fn test_explicit_persona_always_returned() {
        let selector = PersonaSelector::with_seed(three_personas(), 7);
        for _ in 0..50 {
            assert_eq!(selector.select(Some("noir")).id, "noir");
        }
    }

    #[test]
    fn test_unknown_persona_falls_back_to_random() {
        let registry = three_personas();
        let selector = PersonaSelector::with_seed(registry.clone(), 3);

        let persona = selector.select(Some("missing"));
        assert!(registry.get(&persona.id).is_some());
    }

    #[test]
    fn test_random_selection_reaches_every_persona() {
        let registry = three_personas();
        let mut seen = HashSet::new();
        for seed in 0..200 {
            let selector = PersonaSelector::with_seed(registry.clone(), seed);
            seen.insert(selector.select(None).id);
        }

        assert_eq!(seen.len(), registry.len());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let registry = three_personas();
        let a = PersonaSelector::with_seed(registry.clone(), 42);
        let b = PersonaSelector::with_seed(registry, 42);

        let picks_a: Vec<String> = (0..20).map(|_| a.select(None).id).collect();
        let picks_b: Vec<String> = (0..20).map(|_| b.select(None).id).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_builtin_only_always_curator() {
        let selector = PersonaSelector::new(Arc::new(PersonaRegistry::builtin()));
        assert_eq!(selector.select(None).id, DEFAULT_PERSONA_ID);
    }
}
