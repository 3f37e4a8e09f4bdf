//! Escaping for values embedded in generated JS
//!
//! Result delivery and host-initiated evaluation splice JSON text into
//! string literals inside evaluated statements. All embedding goes through
//! the two routines here; nothing else in the workspace escapes by hand.

use serde::Serialize;

/// Escape `text` for embedding inside a single-quoted JS string literal.
pub fn escape_single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape `text` for embedding inside a double-quoted JS string literal.
pub fn escape_double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON-encode `value` and escape it for a single-quoted literal.
pub fn embed_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(escape_single_quoted(&serde_json::to_string(value)?))
}
