//! Aperture core
//!
//! Session coordination for the JS/host bridge: exposure, catalog
//! generation, injection-script assembly, and boundary call routing.
//! The windowing layer implements the collaborator traits and owns the
//! native control; everything here is control-agnostic.

mod config;
mod error;
mod session;

pub use config::WindowConfig;
pub use error::CoreError;
pub use session::WindowSession;

// Re-export the bridge surface
pub use aperture_bridge::{
    AsyncCallbackRegistry, BridgeError, CallFailure, CallRequest, CapabilityError, EventSink,
    FunctionCatalog, FunctionDescriptor, HostObject, MethodSpec, OverflowPolicy, ScriptEvaluator,
    WindowControl, WorkerPool, ASYNC_CALLBACK_FN, EVENT_HANDLER_FN, MOVE_WINDOW_FN,
};
pub use aperture_dom::{
    DataTransfer, DomError, DomEvent, DroppedFile, EventHandler, EventRelay, HandlerId,
    DROP_EVENT,
};
pub use aperture_script::{Backend, Fragment, ScriptError, UiFlags};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
