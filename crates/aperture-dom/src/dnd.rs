//! Drop-path registry
//!
//! The native file-drop hook fires before the DOM drop event reaches the
//! relay and records each dropped file's display name and filesystem path
//! here. The relay consumes entries as it matches files: one entry resolves
//! at most one drop. Unmatched entries persist until overwritten or the
//! session ends. One registry per window session.

use std::borrow::Cow;
use std::path::PathBuf;

use parking_lot::Mutex;
use percent_encoding::percent_decode_str;

#[derive(Default)]
pub struct DropPathRegistry {
    // Display names and paths arrive percent-encoded from the native hook.
    paths: Mutex<Vec<(String, String)>>,
}

impl DropPathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dropped file from the native hook.
    pub fn record(&self, display_name: impl Into<String>, path: impl Into<String>) {
        self.paths.lock().push((display_name.into(), path.into()));
    }

    /// Resolve and consume the first entry whose decoded display name
    /// matches `file_name`. A second identical drop without a fresh native
    /// record stays unresolved.
    pub fn take(&self, file_name: &str) -> Option<PathBuf> {
        let mut paths = self.paths.lock();
        let index = paths
            .iter()
            .position(|(name, _)| decode(name) == file_name)?;
        let (_, path) = paths.remove(index);
        Some(PathBuf::from(decode(&path).into_owned()))
    }

    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }

    pub fn clear(&self) {
        self.paths.lock().clear();
    }
}

fn decode(text: &str) -> Cow<'_, str> {
    percent_decode_str(text).decode_utf8_lossy()
}
