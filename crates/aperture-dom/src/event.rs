//! Boundary DOM event payloads

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DROP_EVENT: &str = "drop";

/// A DOM event as serialized by the injected client. Unknown fields are
/// preserved so handlers see whatever the content side sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(
        rename = "dataTransfer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub data_transfer: Option<DataTransfer>,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

impl DomEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data_transfer: None,
            detail: Map::new(),
        }
    }

    pub fn is_drop(&self) -> bool {
        self.event_type == DROP_EVENT
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataTransfer {
    #[serde(default)]
    pub files: Vec<DroppedFile>,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

/// A file named in a drop event's transfer list. `full_path` is attached by
/// the relay when the native hook recorded a matching path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedFile {
    pub name: String,
    #[serde(
        rename = "fullPath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_path: Option<PathBuf>,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_path: None,
            detail: Map::new(),
        }
    }
}
