//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] aperture_bridge::BridgeError),

    #[error("Script error: {0}")]
    Script(#[from] aperture_script::ScriptError),

    #[error("DOM error: {0}")]
    Dom(#[from] aperture_dom::DomError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
