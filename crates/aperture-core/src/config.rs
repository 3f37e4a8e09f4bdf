//! Window session configuration

use serde::{Deserialize, Serialize};

use aperture_bridge::OverflowPolicy;
use aperture_script::{Backend, UiFlags};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Rendering control backend hosting this session.
    pub backend: Backend,
    /// UI behavior flags consumed by the injected customize fragment.
    pub ui: UiFlags,
    /// Worker threads running host callables and event handlers.
    pub workers: usize,
    /// Bounded job queue depth.
    pub queue_capacity: usize,
    /// What submission does when the queue is full.
    pub overflow: OverflowPolicy,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default_for_platform(),
            ui: UiFlags::default(),
            workers: 4,
            queue_capacity: 64,
            overflow: OverflowPolicy::Reject,
        }
    }
}
