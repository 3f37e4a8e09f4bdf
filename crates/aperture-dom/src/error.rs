//! DOM relay error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("Malformed DOM event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DomError>;
