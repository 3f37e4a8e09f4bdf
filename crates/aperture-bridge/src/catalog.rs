//! Host function catalog
//!
//! Host code declares what the content side may call: objects implement
//! [`HostObject`] with an explicit capability list, and ad-hoc functions are
//! registered by name. Catalog generation walks the object graph depth-first
//! and emits one [`FunctionDescriptor`] per reachable declared method. The
//! resulting catalog is an immutable snapshot; re-exposure builds a new one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;

use crate::error::{CallFailure, CapabilityError};

/// A callable member declared by a host object: its name and positional
/// parameter names (no receiver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    pub parameters: Vec<String>,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>, parameters: &[&str]) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// An object exposed to the content side.
///
/// The capability list replaces runtime reflection: each object declares its
/// callable members and nested objects, and routes invocations itself.
pub trait HostObject: Send + Sync {
    /// Declared callable members.
    fn methods(&self) -> Result<Vec<MethodSpec>, CapabilityError>;

    /// Nested host objects reachable by attribute access.
    fn children(&self) -> Vec<(String, Arc<dyn HostObject>)> {
        Vec::new()
    }

    /// Invoke a declared method with JSON-decoded arguments.
    fn call(&self, method: &str, args: &[Value]) -> Result<Value, CallFailure>;
}

/// One entry of the generated stub: a qualified function name and its
/// parameter names, serialized with the wire keys the injected client reads.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FunctionDescriptor {
    #[serde(rename = "func")]
    pub qualified_name: String,
    #[serde(rename = "params")]
    pub parameters: Vec<String>,
}

/// Ordered, immutable list of functions exposed to the content side.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FunctionCatalog {
    entries: Vec<FunctionDescriptor>,
}

impl FunctionCatalog {
    pub fn entries(&self) -> &[FunctionDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.qualified_name == qualified_name)
    }

    /// Serialized form embedded into the injected stub.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }
}

/// Assigns each exposed object a stable integer id on first sight.
///
/// The generation walk keeps a visited set of these ids, so traversal
/// terminates on graphs with shared or back references.
#[derive(Default)]
pub struct ObjectArena {
    inner: Mutex<ArenaInner>,
}

#[derive(Default)]
struct ArenaInner {
    ids: HashMap<usize, u64>,
    next: u64,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_of(&self, object: &Arc<dyn HostObject>) -> u64 {
        let key = Arc::as_ptr(object) as *const () as usize;
        let mut inner = self.inner.lock();
        if let Some(id) = inner.ids.get(&key) {
            return *id;
        }
        let id = inner.next;
        inner.next += 1;
        inner.ids.insert(key, id);
        id
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().ids.is_empty()
    }
}

pub type AdHocFn = Arc<dyn Fn(&[Value]) -> Result<Value, CallFailure> + Send + Sync>;

/// Ad-hoc functions registered by name at runtime.
///
/// Checked before the exposed object graph at dispatch time, and merged into
/// the catalog after graph discovery, winning name collisions.
#[derive(Default)]
pub struct FunctionRegistry {
    entries: RwLock<Vec<AdHocEntry>>,
}

struct AdHocEntry {
    name: String,
    parameters: Vec<String>,
    function: AdHocFn,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous registration of the same
    /// name in place.
    pub fn register<F>(&self, name: impl Into<String>, parameters: &[&str], function: F)
    where
        F: Fn(&[Value]) -> Result<Value, CallFailure> + Send + Sync + 'static,
    {
        let entry = AdHocEntry {
            name: name.into(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            function: Arc::new(function),
        };

        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    pub fn unregister(&self, name: &str) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.name != name);
        entries.len() != before
    }

    pub fn get(&self, name: &str) -> Option<AdHocFn> {
        self.entries
            .read()
            .iter()
            .find(|e| e.name == name)
            .map(|e| Arc::clone(&e.function))
    }

    fn descriptors(&self) -> Vec<FunctionDescriptor> {
        self.entries
            .read()
            .iter()
            .map(|e| FunctionDescriptor {
                qualified_name: e.name.clone(),
                parameters: e.parameters.clone(),
            })
            .collect()
    }
}

/// Build the function catalog for a set of exposed roots.
///
/// A discovery failure empties the reflective portion and is logged; the
/// bridge still loads. Ad-hoc registrations are merged afterwards and win
/// name collisions (replacing parameters in place, keeping catalog order).
pub fn generate(
    arena: &ObjectArena,
    roots: &[(String, Arc<dyn HostObject>)],
    functions: &FunctionRegistry,
) -> FunctionCatalog {
    let mut entries = Vec::new();
    let mut visited = HashSet::new();

    for (prefix, root) in roots {
        if let Err(e) = walk(arena, root, prefix, &mut visited, &mut entries) {
            tracing::error!(error = %e, "host capability discovery failed, catalog degraded to empty");
            entries.clear();
            break;
        }
    }

    for descriptor in functions.descriptors() {
        match entries
            .iter_mut()
            .find(|e| e.qualified_name == descriptor.qualified_name)
        {
            Some(existing) => *existing = descriptor,
            None => entries.push(descriptor),
        }
    }

    FunctionCatalog { entries }
}

fn walk(
    arena: &ObjectArena,
    object: &Arc<dyn HostObject>,
    prefix: &str,
    visited: &mut HashSet<u64>,
    out: &mut Vec<FunctionDescriptor>,
) -> Result<(), CapabilityError> {
    // Each object is visited at most once, by arena id.
    if !visited.insert(arena.id_of(object)) {
        return Ok(());
    }

    for spec in object.methods()? {
        out.push(FunctionDescriptor {
            qualified_name: join_path(prefix, &spec.name),
            parameters: spec.parameters,
        });
    }

    for (name, child) in object.children() {
        let child_prefix = join_path(prefix, &name);
        walk(arena, &child, &child_prefix, visited, out)?;
    }

    Ok(())
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Resolve a qualified name against the exposed object graph.
///
/// Walks the attribute path segment by segment; any missing intermediate
/// short-circuits to `None`. Returns the owning object and the method name.
pub fn resolve_path(
    roots: &[(String, Arc<dyn HostObject>)],
    qualified_name: &str,
) -> Option<(Arc<dyn HostObject>, String)> {
    for (prefix, root) in roots {
        let rest = if prefix.is_empty() {
            qualified_name
        } else if let Some(rest) = qualified_name
            .strip_prefix(prefix.as_str())
            .and_then(|r| r.strip_prefix('.'))
        {
            rest
        } else {
            continue;
        };

        if let Some(resolved) = resolve_from(root, rest) {
            return Some(resolved);
        }
    }
    None
}

fn resolve_from(
    root: &Arc<dyn HostObject>,
    path: &str,
) -> Option<(Arc<dyn HostObject>, String)> {
    let segments: Vec<&str> = path.split('.').collect();
    let (method, intermediate) = segments.split_last()?;

    let mut node = Arc::clone(root);
    for segment in intermediate {
        let child = node
            .children()
            .into_iter()
            .find(|(name, _)| name == segment)
            .map(|(_, child)| child)?;
        node = child;
    }

    let declares_method = node
        .methods()
        .ok()?
        .iter()
        .any(|spec| spec.name == *method);

    declares_method.then(|| (node, method.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Leaf {
        greeting: &'static str,
    }

    impl HostObject for Leaf {
        fn methods(&self) -> Result<Vec<MethodSpec>, CapabilityError> {
            Ok(vec![MethodSpec::new("greet", &["name"])])
        }

        fn call(&self, method: &str, args: &[Value]) -> Result<Value, CallFailure> {
            match method {
                "greet" => {
                    let name = args.first().and_then(|v| v.as_str()).unwrap_or("nobody");
                    Ok(json!(format!("{} {}", self.greeting, name)))
                }
                other => Err(CallFailure::new(
                    format!("unknown method {}", other),
                    "AttributeError",
                    "",
                )),
            }
        }
    }

    struct Root {
        shared: Arc<dyn HostObject>,
    }

    impl HostObject for Root {
        fn methods(&self) -> Result<Vec<MethodSpec>, CapabilityError> {
            Ok(vec![MethodSpec::new("ping", &[])])
        }

        fn children(&self) -> Vec<(String, Arc<dyn HostObject>)> {
            // Same child under two names: a shared reference in the graph.
            vec![
                ("left".to_string(), Arc::clone(&self.shared)),
                ("right".to_string(), Arc::clone(&self.shared)),
            ]
        }

        fn call(&self, method: &str, _args: &[Value]) -> Result<Value, CallFailure> {
            match method {
                "ping" => Ok(json!("pong")),
                other => Err(CallFailure::new(
                    format!("unknown method {}", other),
                    "AttributeError",
                    "",
                )),
            }
        }
    }

    struct Broken;

    impl HostObject for Broken {
        fn methods(&self) -> Result<Vec<MethodSpec>, CapabilityError> {
            Err(CapabilityError("introspection unavailable".to_string()))
        }

        fn call(&self, _method: &str, _args: &[Value]) -> Result<Value, CallFailure> {
            Err(CallFailure::new("unreachable", "Error", ""))
        }
    }

    fn roots_of(object: Arc<dyn HostObject>) -> Vec<(String, Arc<dyn HostObject>)> {
        vec![(String::new(), object)]
    }

    #[test]
    fn test_catalog_counts_reachable_methods() {
        let arena = ObjectArena::new();
        let roots = roots_of(Arc::new(Leaf { greeting: "hello" }));
        let catalog = generate(&arena, &roots, &FunctionRegistry::new());

        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("greet"));
        assert_eq!(catalog.entries()[0].parameters, vec!["name".to_string()]);
    }

    #[test]
    fn test_shared_child_visited_once() {
        let arena = ObjectArena::new();
        let shared: Arc<dyn HostObject> = Arc::new(Leaf { greeting: "hi" });
        let roots = roots_of(Arc::new(Root { shared }));
        let catalog = generate(&arena, &roots, &FunctionRegistry::new());

        // ping on the root plus greet under the first name only.
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("ping"));
        assert!(catalog.contains("left.greet"));
        assert!(!catalog.contains("right.greet"));
    }

    struct Node {
        label: &'static str,
        back: parking_lot::Mutex<Option<Arc<dyn HostObject>>>,
    }

    impl Node {
        fn new(label: &'static str) -> Arc<Self> {
            Arc::new(Self {
                label,
                back: parking_lot::Mutex::new(None),
            })
        }
    }

    impl HostObject for Node {
        fn methods(&self) -> Result<Vec<MethodSpec>, CapabilityError> {
            Ok(vec![MethodSpec::new(self.label, &[])])
        }

        fn children(&self) -> Vec<(String, Arc<dyn HostObject>)> {
            self.back
                .lock()
                .as_ref()
                .map(|b| vec![("next".to_string(), Arc::clone(b))])
                .unwrap_or_default()
        }

        fn call(&self, _method: &str, _args: &[Value]) -> Result<Value, CallFailure> {
            Ok(json!(self.label))
        }
    }

    #[test]
    fn test_back_reference_cycle_terminates() {
        let a = Node::new("alpha");
        let b = Node::new("beta");
        *a.back.lock() = Some(b.clone() as Arc<dyn HostObject>);
        *b.back.lock() = Some(a.clone() as Arc<dyn HostObject>);

        let arena = ObjectArena::new();
        let roots = roots_of(a);
        let catalog = generate(&arena, &roots, &FunctionRegistry::new());

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("alpha"));
        assert!(catalog.contains("next.beta"));
    }

    #[test]
    fn test_adhoc_functions_add_and_win_collisions() {
        let arena = ObjectArena::new();
        let roots = roots_of(Arc::new(Leaf { greeting: "hello" }));

        let functions = FunctionRegistry::new();
        functions.register("extra", &["x", "y"], |_args| Ok(json!(null)));
        functions.register("greet", &["who"], |_args| Ok(json!("override")));

        let catalog = generate(&arena, &roots, &functions);

        assert_eq!(catalog.len(), 2);
        // Collision keeps catalog position but takes the ad-hoc signature.
        assert_eq!(catalog.entries()[0].qualified_name, "greet");
        assert_eq!(catalog.entries()[0].parameters, vec!["who".to_string()]);
        assert!(catalog.contains("extra"));
    }

    #[test]
    fn test_discovery_failure_degrades_to_empty() {
        let arena = ObjectArena::new();
        let roots = roots_of(Arc::new(Broken));
        let functions = FunctionRegistry::new();
        functions.register("survivor", &[], |_args| Ok(json!(1)));

        let catalog = generate(&arena, &roots, &functions);

        // Reflective portion empties; ad-hoc registrations still load.
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("survivor"));
    }

    #[test]
    fn test_resolve_path_walks_children() {
        let shared: Arc<dyn HostObject> = Arc::new(Leaf { greeting: "hey" });
        let roots = roots_of(Arc::new(Root { shared }));

        let (object, method) = resolve_path(&roots, "left.greet").unwrap();
        assert_eq!(method, "greet");
        assert_eq!(object.call(&method, &[json!("you")]).unwrap(), json!("hey you"));

        assert!(resolve_path(&roots, "middle.greet").is_none());
        assert!(resolve_path(&roots, "left.missing").is_none());
    }

    #[test]
    fn test_catalog_serializes_wire_form() {
        let arena = ObjectArena::new();
        let roots = roots_of(Arc::new(Leaf { greeting: "hello" }));
        let catalog = generate(&arena, &roots, &FunctionRegistry::new());

        let json = catalog.to_json().unwrap();
        assert_eq!(json, r#"[{"func":"greet","params":["name"]}]"#);
    }
}
