use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Script error: {0}")]
    Script(#[from] core_script::ScriptError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
