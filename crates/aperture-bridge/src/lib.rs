//! Aperture bridge
//!
//! The JS-to-host RPC core: host function catalog generation, call dispatch
//! with a bounded worker pool, async callback correlation, and the escaping
//! routines used when embedding values in generated JS. The surrounding
//! windowing layer supplies the collaborators ([`ScriptEvaluator`],
//! [`WindowControl`], [`EventSink`]); nothing here touches a native control
//! directly.

mod callbacks;
mod catalog;
mod dispatch;
mod error;
mod escape;
mod pool;

pub use callbacks::AsyncCallbackRegistry;
pub use catalog::{
    generate, resolve_path, AdHocFn, FunctionCatalog, FunctionDescriptor, FunctionRegistry,
    HostObject, MethodSpec, ObjectArena,
};
pub use dispatch::{
    CallRequest, Dispatcher, EventSink, ScriptEvaluator, WindowControl, ASYNC_CALLBACK_FN,
    EVENT_HANDLER_FN, MOVE_WINDOW_FN,
};
pub use error::{BridgeError, CallFailure, CapabilityError};
pub use escape::{embed_json, escape_double_quoted, escape_single_quoted};
pub use pool::{OverflowPolicy, WorkerPool};

pub type Result<T> = std::result::Result<T, BridgeError>;
