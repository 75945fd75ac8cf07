use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Script generation unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication with the generation backend failed")]
    AuthenticationFailed,

    #[error("All models failed to generate a script (tried: {})", .attempted.join(", "))]
    Exhausted { attempted: Vec<String> },

    #[error("Duplicate persona id: {0}")]
    DuplicatePersona(String),

    #[error("Invalid persona definition: {0}")]
    InvalidPersona(String),

    #[error("Request construction failed: {0}")]
    Request(String),
}

pub type Result<T> = std::result::Result<T, ScriptError>;
