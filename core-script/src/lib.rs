//! # Intro Script Generation
//!
//! Writes a short spoken "DJ intro" for a track using a chat-completions
//! backend.
//!
//! ## Overview
//!
//! - [`PersonaRegistry`] holds the named system prompts (personas); the
//!   built-in "curator" persona is always present.
//! - [`PersonaSelector`] returns an explicitly requested persona or picks one
//!   uniformly at random. The random source can be seeded.
//! - [`ScriptGenerator`] tries each candidate model in order until one
//!   returns a JSON object with a `text` field. HTTP 401 aborts the whole
//!   request, HTTP 429 and every other failure move on to the next model.
//!
//! ## Usage
//!
//! ```ignore
//! use core_script::{PersonaRegistry, PersonaSelector, ScriptGenerator, ScriptRequest};
//! use std::sync::Arc;
//!
//! let selector = PersonaSelector::new(Arc::new(PersonaRegistry::builtin()));
//! let generator = ScriptGenerator::from_config(http_client, &config.script_api_config);
//!
//! let request = ScriptRequest::new("One More Time", "Daft Punk")
//!     .with_persona(selector.select(None));
//! match generator.generate(&request).await {
//!     Ok(script) => println!("{}", script.text),
//!     Err(e) => tracing::warn!(error = %e, "No intro this time"),
//! }
//! ```

pub mod error;
pub mod generator;
pub mod persona;

pub use error::{Result, ScriptError};
pub use generator::{GeneratorConfig, ScriptGenerator, ScriptRequest, ScriptResult};
pub use persona::{Persona, PersonaRegistry, PersonaSelector, PromptComponents};
