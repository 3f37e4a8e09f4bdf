//! Window session
//!
//! One `WindowSession` per hosted window: it owns the exposed object graph,
//! regenerates the function catalog on exposure changes, assembles the
//! injection script, and routes boundary traffic to the dispatcher and the
//! event relay. The windowing layer supplies the evaluate and window-move
//! primitives and calls the native drop hook.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use aperture_bridge::{
    generate, AsyncCallbackRegistry, CallFailure, CallRequest, Dispatcher, FunctionCatalog,
    FunctionRegistry, HostObject, ObjectArena, ScriptEvaluator, WindowControl, WorkerPool,
};
use aperture_bridge::escape_double_quoted;
use aperture_dom::{DropPathRegistry, ElementRegistry, EventHandler, EventRelay, HandlerId};
use aperture_script::{assemble, builtin_fragments, SessionParams};

use crate::config::WindowConfig;
use crate::error::CoreError;
use crate::Result;

pub struct WindowSession {
    id: String,
    token: String,
    config: WindowConfig,
    arena: ObjectArena,
    roots: Arc<RwLock<Vec<(String, Arc<dyn HostObject>)>>>,
    functions: Arc<FunctionRegistry>,
    catalog: RwLock<FunctionCatalog>,
    callbacks: Arc<AsyncCallbackRegistry>,
    elements: Arc<ElementRegistry>,
    drop_paths: Arc<DropPathRegistry>,
    dispatcher: Dispatcher,
    evaluator: Arc<dyn ScriptEvaluator>,
}

impl WindowSession {
    pub fn new(
        config: WindowConfig,
        evaluator: Arc<dyn ScriptEvaluator>,
        window: Arc<dyn WindowControl>,
    ) -> Result<Self> {
        let pool = Arc::new(WorkerPool::new(
            config.workers,
            config.queue_capacity,
            config.overflow,
        )?);

        let elements = Arc::new(ElementRegistry::new());
        let drop_paths = Arc::new(DropPathRegistry::new());
        let relay = Arc::new(EventRelay::new(
            Arc::clone(&elements),
            Arc::clone(&drop_paths),
            Arc::clone(&pool),
        ));

        let functions = Arc::new(FunctionRegistry::new());
        let roots: Arc<RwLock<Vec<(String, Arc<dyn HostObject>)>>> =
            Arc::new(RwLock::new(Vec::new()));
        let callbacks = Arc::new(AsyncCallbackRegistry::new());

        let dispatcher = Dispatcher::new(
            Arc::clone(&functions),
            Arc::clone(&roots),
            Arc::clone(&callbacks),
            Arc::clone(&evaluator),
            window,
            relay,
            pool,
        );

        let session = Self {
            id: Uuid::new_v4().simple().to_string(),
            token: Uuid::new_v4().simple().to_string(),
            config,
            arena: ObjectArena::new(),
            roots,
            functions,
            catalog: RwLock::new(FunctionCatalog::default()),
            callbacks,
            elements,
            drop_paths,
            dispatcher,
            evaluator,
        };

        tracing::info!(session_id = %session.id, "created window session");
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Expose a host object at the top level of the content-side api.
    pub fn expose(&self, object: Arc<dyn HostObject>) {
        self.roots.write().push((String::new(), object));
        self.rebuild_catalog();
    }

    /// Expose a host object under a name prefix.
    pub fn expose_as(&self, name: impl Into<String>, object: Arc<dyn HostObject>) {
        self.roots.write().push((name.into(), object));
        self.rebuild_catalog();
    }

    /// Register an ad-hoc function. Takes precedence over the object graph
    /// on name collision.
    pub fn expose_function<F>(&self, name: impl Into<String>, parameters: &[&str], function: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, CallFailure> + Send + Sync + 'static,
    {
        self.functions.register(name, parameters, function);
        self.rebuild_catalog();
    }

    // Exposure changes replace the catalog snapshot; they never mutate the
    // one already injected.
    fn rebuild_catalog(&self) {
        let catalog = generate(&self.arena, &self.roots.read(), &self.functions);
        tracing::debug!(
            session_id = %self.id,
            functions = catalog.len(),
            "rebuilt function catalog"
        );
        *self.catalog.write() = catalog;
    }

    pub fn catalog(&self) -> FunctionCatalog {
        self.catalog.read().clone()
    }

    /// The assembled script to hand to the control's inject primitive
    /// before the session becomes interactive.
    pub fn injection_script(&self) -> Result<String> {
        let params = SessionParams {
            token: self.token.clone(),
            window_id: self.id.clone(),
            catalog_json: self.catalog.read().to_json()?,
            backend: self.config.backend,
            ui: self.config.ui.clone(),
        };
        Ok(assemble(&builtin_fragments(), &params)?)
    }

    /// Assemble and evaluate the injection script.
    pub fn inject(&self) -> Result<()> {
        let script = self.injection_script()?;
        self.evaluator.evaluate(&script);
        Ok(())
    }

    /// Boundary entry point for a decoded call triad.
    pub fn handle_call(&self, request: CallRequest) {
        self.dispatcher.dispatch(request);
    }

    /// Boundary entry point for a raw JSON call payload.
    pub fn handle_raw(&self, payload: &str) -> Result<()> {
        let request: CallRequest =
            serde_json::from_str(payload).map_err(CoreError::Serialization)?;
        self.dispatcher.dispatch(request);
        Ok(())
    }

    /// Evaluate JS in the content context, fire-and-forget.
    pub fn evaluate(&self, script: &str) {
        self.evaluator.evaluate(script);
    }

    /// Evaluate JS expecting an asynchronous result. The completion value
    /// comes back through the privileged async-delivery call and resolves
    /// `callback` exactly once. Returns the correlation id.
    pub fn evaluate_with_callback<F>(&self, script: &str, callback: F) -> String
    where
        F: FnOnce(Option<Value>) + Send + 'static,
    {
        let correlation_id = Uuid::new_v4().simple().to_string();
        self.callbacks.register(correlation_id.clone(), callback);

        let wrapped = format!(
            "window.aperture._asyncResult(eval(\"{}\"), \"{}\")",
            escape_double_quoted(script),
            escape_double_quoted(&correlation_id)
        );
        self.evaluator.evaluate(&wrapped);

        correlation_id
    }

    /// Native file-drop hook: records a dropped file's display name and
    /// path ahead of the DOM drop event.
    pub fn notify_native_drop(&self, display_name: impl Into<String>, path: impl Into<String>) {
        self.drop_paths.record(display_name, path);
    }

    /// Register a host-side proxy for a content element.
    pub fn register_element(&self, node_id: impl Into<String>) {
        self.elements.insert(node_id);
    }

    pub fn remove_element(&self, node_id: &str) -> bool {
        self.elements.remove(node_id)
    }

    /// Subscribe a handler to a DOM event type on an element.
    pub fn on(&self, node_id: &str, event_type: &str, handler: EventHandler) -> HandlerId {
        self.elements.on(node_id, event_type, handler)
    }

    pub fn off(&self, node_id: &str, event_type: &str, handler: HandlerId) {
        self.elements.off(node_id, event_type, handler);
    }

    pub fn pending_callbacks(&self) -> usize {
        self.callbacks.pending()
    }
}
