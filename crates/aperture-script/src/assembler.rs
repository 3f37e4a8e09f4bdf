//! Injection script assembly
//!
//! Orders fragments deterministically (polyfill, then api, then everything
//! else in discovery order, finish last), substitutes session parameters,
//! and concatenates into the single script text handed to the control's
//! inject primitive before the session is interactive.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;
use crate::fragment::{substitute, Fragment, API_FRAGMENT, FINISH_FRAGMENT, POLYFILL_FRAGMENT};

/// Rendering control backend hosting the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    WebKit,
    WebView2,
    Chromium,
    /// Trident-era embedded control; the only backend needing the polyfill.
    Legacy,
}

impl Backend {
    pub fn tag(&self) -> &'static str {
        match self {
            Backend::WebKit => "webkit",
            Backend::WebView2 => "webview2",
            Backend::Chromium => "chromium",
            Backend::Legacy => "legacy",
        }
    }

    pub fn needs_polyfill(&self) -> bool {
        matches!(self, Backend::Legacy)
    }

    pub fn default_for_platform() -> Self {
        if cfg!(target_os = "windows") {
            Backend::WebView2
        } else {
            Backend::WebKit
        }
    }
}

/// UI behavior flags consumed by the customize fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiFlags {
    pub text_select: bool,
    pub zoomable: bool,
    pub draggable: bool,
    pub frameless: bool,
    pub easy_drag: bool,
    pub drag_region_selector: String,
}

impl Default for UiFlags {
    fn default() -> Self {
        Self {
            text_select: true,
            zoomable: false,
            draggable: false,
            frameless: false,
            easy_drag: true,
            drag_region_selector: ".aperture-drag-region".to_string(),
        }
    }
}

/// Per-session values substituted into the fragments.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub token: String,
    pub window_id: String,
    /// Serialized function catalog, spliced as a JS array literal.
    pub catalog_json: String,
    pub backend: Backend,
    pub ui: UiFlags,
}

impl SessionParams {
    fn values_for(&self, fragment_name: &str) -> HashMap<&'static str, String> {
        let mut values = HashMap::new();
        match fragment_name {
            API_FRAGMENT => {
                values.insert("token", self.token.clone());
                values.insert("platform", self.backend.tag().to_string());
                values.insert("window_id", self.window_id.clone());
                values.insert("func_list", self.catalog_json.clone());
            }
            "customize" => {
                values.insert("text_select", js_bool(self.ui.text_select));
                values.insert("zoomable", js_bool(self.ui.zoomable));
                values.insert("draggable", js_bool(self.ui.draggable));
                // Whole-surface dragging only makes sense frameless, and only
                // the chromium backend lacks a native drag region.
                values.insert(
                    "easy_drag",
                    js_bool(
                        self.backend == Backend::Chromium
                            && self.ui.easy_drag
                            && self.ui.frameless,
                    ),
                );
                values.insert("drag_selector", self.ui.drag_region_selector.clone());
            }
            _ => {}
        }
        values
    }
}

fn js_bool(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Assemble the ordered, substituted injection script.
pub fn assemble(fragments: &[Fragment], params: &SessionParams) -> Result<String, ScriptError> {
    let mut script = String::new();

    for fragment in order_fragments(fragments) {
        if fragment.name == POLYFILL_FRAGMENT && !params.backend.needs_polyfill() {
            continue;
        }
        script.push_str(&substitute(fragment, &params.values_for(&fragment.name))?);
        script.push('\n');
    }

    Ok(script)
}

/// Polyfill first, api second, finish last; everything else keeps discovery
/// order in between. The api fragment must exist before any fragment that
/// calls into it.
fn order_fragments(fragments: &[Fragment]) -> Vec<&Fragment> {
    let mut polyfill = None;
    let mut api = None;
    let mut finish = None;
    let mut rest = Vec::new();

    for fragment in fragments {
        match fragment.name.as_str() {
            POLYFILL_FRAGMENT => polyfill = Some(fragment),
            API_FRAGMENT => api = Some(fragment),
            FINISH_FRAGMENT => finish = Some(fragment),
            _ => rest.push(fragment),
        }
    }

    let mut ordered = Vec::with_capacity(fragments.len());
    ordered.extend(polyfill);
    ordered.extend(api);
    ordered.append(&mut rest);
    ordered.extend(finish);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::builtin_fragments;

    fn params(backend: Backend) -> SessionParams {
        SessionParams {
            token: "tok".to_string(),
            window_id: "win-1".to_string(),
            catalog_json: r#"[{"func":"greet","params":["name"]}]"#.to_string(),
            backend,
            ui: UiFlags::default(),
        }
    }

    fn plain(name: &str, body: &str) -> Fragment {
        Fragment::new(name, body)
    }

    #[test]
    fn test_order_polyfill_api_rest_finish() {
        let fragments = vec![
            plain("finish", "F;"),
            plain("x", "X;"),
            plain("api", "A;"),
            plain("polyfill", "P;"),
            plain("y", "Y;"),
        ];
        let script = assemble(&fragments, &params(Backend::Legacy)).unwrap();

        let positions: Vec<usize> = ["P;", "A;", "X;", "Y;", "F;"]
            .iter()
            .map(|s| script.find(s).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_polyfill_skipped_on_modern_backends() {
        let fragments = vec![
            plain("polyfill", "P;"),
            plain("api", "A;"),
            plain("x", "X;"),
            plain("finish", "F;"),
        ];
        let script = assemble(&fragments, &params(Backend::WebKit)).unwrap();

        assert!(!script.contains("P;"));
        let positions: Vec<usize> = ["A;", "X;", "F;"]
            .iter()
            .map(|s| script.find(s).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_builtin_assembly_leaves_no_placeholders() {
        let script = assemble(&builtin_fragments(), &params(Backend::WebView2)).unwrap();

        assert!(!script.contains("%{"));
        assert!(script.contains("'tok'"));
        assert!(script.contains("'win-1'"));
        assert!(script.contains(r#"[{"func":"greet","params":["name"]}]"#));
    }

    #[test]
    fn test_easy_drag_requires_frameless_chromium() {
        let mut p = params(Backend::Chromium);
        p.ui.frameless = true;
        let values = p.values_for("customize");
        assert_eq!(values["easy_drag"], "true");

        let values = params(Backend::Chromium).values_for("customize");
        assert_eq!(values["easy_drag"], "false");

        let mut p = params(Backend::WebKit);
        p.ui.frameless = true;
        let values = p.values_for("customize");
        assert_eq!(values["easy_drag"], "false");
    }

    #[test]
    fn test_catalog_splices_as_array_literal() {
        let script = assemble(&builtin_fragments(), &params(Backend::WebKit)).unwrap();
        let spliced = script
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with("bind("))
            .unwrap()
            .to_string();

        let json_part = spliced
            .strip_prefix("bind(")
            .and_then(|s| s.strip_suffix(");"))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(json_part).unwrap();
        assert_eq!(parsed[0]["func"], "greet");
    }
}
