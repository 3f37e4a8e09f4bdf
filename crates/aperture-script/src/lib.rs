//! Aperture script layer
//!
//! The boundary-side half of the bridge: the JS fragments injected into the
//! content context, their deterministic load order, and per-session
//! parameter substitution.

mod assembler;
mod error;
mod fragment;

pub use assembler::{assemble, Backend, SessionParams, UiFlags};
pub use error::ScriptError;
pub use fragment::{
    builtin_fragments, substitute, Fragment, API_FRAGMENT, FINISH_FRAGMENT, POLYFILL_FRAGMENT,
};

pub type Result<T> = std::result::Result<T, ScriptError>;
