//! Call dispatch
//!
//! Boundary-originated calls funnel through [`Dispatcher::dispatch`]. Three
//! privileged names are handled inline on the calling thread (they are
//! intentionally cheap); everything else resolves to a host callable and
//! runs on the worker pool, delivering exactly one result statement back
//! into the content context per dispatched request. Unresolvable names are
//! logged and get no response; the content side applies its own timeout.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::callbacks::AsyncCallbackRegistry;
use crate::catalog::{resolve_path, AdHocFn, FunctionRegistry, HostObject};
use crate::error::CallFailure;
use crate::escape::{escape_double_quoted, escape_single_quoted};
use crate::pool::WorkerPool;

/// Moves the window by boundary-supplied coordinates. Inline, synchronous.
pub const MOVE_WINDOW_FN: &str = "apertureMoveWindow";
/// DOM event intake: `{event: {...}, nodeId}`. Inline, synchronous.
pub const EVENT_HANDLER_FN: &str = "apertureEventHandler";
/// Async-callback delivery keyed by correlation id. Inline, synchronous.
pub const ASYNC_CALLBACK_FN: &str = "apertureAsyncCallback";

/// Evaluates JS in the content context. Implementations marshal to the
/// thread that owns the rendering surface.
pub trait ScriptEvaluator: Send + Sync {
    fn evaluate(&self, script: &str);
}

/// Window primitive consumed by the privileged move call.
pub trait WindowControl: Send + Sync {
    fn move_window(&self, x: f64, y: f64);
}

/// Receiver for boundary-originated DOM events.
pub trait EventSink: Send + Sync {
    fn dispatch_event(&self, node_id: &str, event: Value);
}

/// A boundary-originated call: qualified name, argument value, correlation
/// token. Field names follow the wire protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub function_name: String,
    #[serde(default)]
    pub args: Value,
    pub correlation_id: String,
}

enum CallTarget {
    AdHoc(AdHocFn),
    Object(Arc<dyn HostObject>, String),
}

pub struct Dispatcher {
    functions: Arc<FunctionRegistry>,
    roots: Arc<RwLock<Vec<(String, Arc<dyn HostObject>)>>>,
    callbacks: Arc<AsyncCallbackRegistry>,
    evaluator: Arc<dyn ScriptEvaluator>,
    window: Arc<dyn WindowControl>,
    events: Arc<dyn EventSink>,
    pool: Arc<WorkerPool>,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        functions: Arc<FunctionRegistry>,
        roots: Arc<RwLock<Vec<(String, Arc<dyn HostObject>)>>>,
        callbacks: Arc<AsyncCallbackRegistry>,
        evaluator: Arc<dyn ScriptEvaluator>,
        window: Arc<dyn WindowControl>,
        events: Arc<dyn EventSink>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            functions,
            roots,
            callbacks,
            evaluator,
            window,
            events,
            pool,
        }
    }

    pub fn dispatch(&self, request: CallRequest) {
        match request.function_name.as_str() {
            MOVE_WINDOW_FN => self.move_window(&request),
            EVENT_HANDLER_FN => self.intake_event(&request),
            ASYNC_CALLBACK_FN => self.deliver_async(&request),
            _ => self.dispatch_host_call(request),
        }
    }

    fn move_window(&self, request: &CallRequest) {
        let coords = request
            .args
            .as_array()
            .filter(|a| a.len() == 2)
            .and_then(|a| Some((a[0].as_f64()?, a[1].as_f64()?)));

        match coords {
            Some((x, y)) => self.window.move_window(x, y),
            None => tracing::error!(
                args = %request.args,
                "move-window call with malformed coordinates"
            ),
        }
    }

    fn intake_event(&self, request: &CallRequest) {
        let args = unwrap_single(&request.args);
        let node_id = args.get("nodeId").and_then(|v| v.as_str());
        let event = args.get("event");

        match (node_id, event) {
            (Some(node_id), Some(event)) => {
                self.events.dispatch_event(node_id, event.clone());
            }
            _ => tracing::error!(args = %request.args, "malformed DOM event intake payload"),
        }
    }

    fn deliver_async(&self, request: &CallRequest) {
        // The content side stringifies the completion value, so the payload
        // arrives as JSON text inside a string.
        let value = match unwrap_single(&request.args) {
            Value::Null => None,
            Value::String(text) => match serde_json::from_str(text) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!(
                        correlation_id = %request.correlation_id,
                        error = %e,
                        "undecodable async callback payload"
                    );
                    None
                }
            },
            other => Some(other.clone()),
        };

        self.callbacks.resolve(&request.correlation_id, value);
    }

    fn dispatch_host_call(&self, request: CallRequest) {
        // Ad-hoc registrations shadow the exposed object graph.
        let target = match self.functions.get(&request.function_name) {
            Some(function) => CallTarget::AdHoc(function),
            None => match resolve_path(&self.roots.read(), &request.function_name) {
                Some((object, method)) => CallTarget::Object(object, method),
                None => {
                    tracing::error!(
                        function = %request.function_name,
                        "function does not exist"
                    );
                    return;
                }
            },
        };

        let evaluator = Arc::clone(&self.evaluator);
        let submitted = self.pool.submit(move || {
            let args = coerce_args(&request.args);
            let function_name = request.function_name;

            let outcome = catch_unwind(AssertUnwindSafe(|| match &target {
                CallTarget::AdHoc(function) => function(&args),
                CallTarget::Object(object, method) => object.call(method, &args),
            }))
            .unwrap_or_else(|payload| Err(CallFailure::from_panic(payload, &function_name)));

            let script = match outcome {
                Ok(value) => result_script(&function_name, &request.correlation_id, &value),
                Err(failure) => {
                    tracing::error!(
                        function = %function_name,
                        error = %failure,
                        "host function failed"
                    );
                    error_script(&function_name, &request.correlation_id, &failure)
                }
            };

            evaluator.evaluate(&script);
        });

        if let Err(e) = submitted {
            tracing::error!(error = %e, "dropping host call, worker pool unavailable");
        }
    }
}

/// Boundary args may be a single value or a sequence of values.
fn coerce_args(args: &Value) -> Vec<Value> {
    match args {
        Value::Null => Vec::new(),
        Value::Array(values) => values.clone(),
        other => vec![other.clone()],
    }
}

/// Privileged payloads arrive either bare or wrapped in a one-element list.
fn unwrap_single(args: &Value) -> &Value {
    match args {
        Value::Array(values) if values.len() == 1 => &values[0],
        other => other,
    }
}

fn result_script(function_name: &str, correlation_id: &str, value: &Value) -> String {
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(e) => {
            let failure = CallFailure::new(e.to_string(), "SerializationError", "");
            return error_script(function_name, correlation_id, &failure);
        }
    };
    delivery_script(function_name, correlation_id, false, &encoded)
}

fn error_script(function_name: &str, correlation_id: &str, failure: &CallFailure) -> String {
    let encoded = serde_json::to_string(failure).unwrap_or_else(|_| {
        "{\"message\":\"unserializable failure\",\"name\":\"Error\",\"stack\":\"\"}".to_string()
    });
    delivery_script(function_name, correlation_id, true, &encoded)
}

/// The evaluated statement writing into the correlation-addressed result
/// slot of the injected client.
fn delivery_script(
    function_name: &str,
    correlation_id: &str,
    is_error: bool,
    json_text: &str,
) -> String {
    let slot_fn = escape_double_quoted(function_name);
    let slot_id = escape_double_quoted(correlation_id);
    let value = escape_single_quoted(json_text);

    if is_error {
        format!(
            "window.aperture._returnValues[\"{}\"][\"{}\"] = {{isError: true, value: '{}'}}",
            slot_fn, slot_id, value
        )
    } else {
        format!(
            "window.aperture._returnValues[\"{}\"][\"{}\"] = {{value: '{}'}}",
            slot_fn, slot_id, value
        )
    }
}
