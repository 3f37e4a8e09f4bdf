//! Script fragments and placeholder substitution
//!
//! Fragments are named JS sources with `%{name}` placeholders. Substitution
//! is total: a placeholder with no supplied value is an assembly-time error,
//! never a runtime condition in the content context.

use std::collections::HashMap;

use crate::error::ScriptError;

pub const POLYFILL_FRAGMENT: &str = "polyfill";
pub const API_FRAGMENT: &str = "api";
pub const FINISH_FRAGMENT: &str = "finish";

#[derive(Debug, Clone)]
pub struct Fragment {
    pub name: String,
    pub source: String,
}

impl Fragment {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// The fragments shipped with the bridge, in discovery order.
pub fn builtin_fragments() -> Vec<Fragment> {
    vec![
        Fragment::new(POLYFILL_FRAGMENT, include_str!("../js/polyfill.js")),
        Fragment::new(API_FRAGMENT, include_str!("../js/api.js")),
        Fragment::new("customize", include_str!("../js/customize.js")),
        Fragment::new(FINISH_FRAGMENT, include_str!("../js/finish.js")),
    ]
}

/// Substitute every `%{name}` placeholder in `fragment` from `values`.
pub fn substitute(fragment: &Fragment, values: &HashMap<&str, String>) -> Result<String, ScriptError> {
    let mut out = String::with_capacity(fragment.source.len());
    let mut rest = fragment.source.as_str();

    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let end = after
            .find('}')
            .ok_or_else(|| ScriptError::UnterminatedPlaceholder {
                fragment: fragment.name.clone(),
            })?;
        let key = &after[..end];

        let value = values
            .get(key)
            .ok_or_else(|| ScriptError::UnresolvedPlaceholder {
                fragment: fragment.name.clone(),
                placeholder: key.to_string(),
            })?;

        out.push_str(value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
