//! Script assembly error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Fragment '{fragment}' references unknown placeholder '{placeholder}'")]
    UnresolvedPlaceholder {
        fragment: String,
        placeholder: String,
    },

    #[error("Fragment '{fragment}' has an unterminated placeholder")]
    UnterminatedPlaceholder { fragment: String },
}

pub type Result<T> = std::result::Result<T, ScriptError>;
