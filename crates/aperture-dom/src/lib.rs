//! Aperture DOM layer
//!
//! Host-side element proxies, their event handler registries, the
//! per-session drop-path registry populated by the native file-drop hook,
//! and the relay that fans boundary DOM events out to host handlers.

mod dnd;
mod element;
mod error;
mod event;
mod relay;

pub use dnd::DropPathRegistry;
pub use element::{ElementRegistry, EventHandler, HandlerId};
pub use error::DomError;
pub use event::{DataTransfer, DomEvent, DroppedFile, DROP_EVENT};
pub use relay::EventRelay;

pub type Result<T> = std::result::Result<T, DomError>;
