//! Frames
//!
//! The client's model of the screen currently shown by one navigation
//! controller. A frame's `id` is its presentation identity: a new id means the
//! view must be mounted afresh, an unchanged id means only its props moved.

pub mod id;

pub use id::{FrameId, FrameIdAllocator};

use crate::response::Metadata;
use crate::unpack::Value;
use std::fmt;
use std::sync::Arc;

/// View tag of a controller that has not rendered anything yet.
pub const LOADING_VIEW: &str = "loading";

/// Predicate a view registers to decide whether a same-view render should
/// remount it. Receives the new path and the new decoded props.
pub type ShouldReload = Arc<dyn Fn(&str, &Value) -> bool + Send + Sync>;

/// Currently displayed server-driven screen
#[derive(Clone)]
pub struct Frame {
    pub id: FrameId,
    pub path: String,
    pub metadata: Metadata,
    pub view: String,
    pub props: Value,
    pub context: Value,
    pub should_reload: Option<ShouldReload>,
}

impl Frame {
    /// Placeholder frame a controller starts with.
    pub fn loading(id: FrameId, path: impl Into<String>) -> Self {
        Frame {
            id,
            path: path.into(),
            metadata: Metadata::titled("Loading"),
            view: LOADING_VIEW.to_string(),
            props: Value::empty_dict(),
            context: Value::empty_dict(),
            should_reload: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.view == LOADING_VIEW
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("view", &self.view)
            .field("props", &self.props)
            .field("context", &self.context)
            .field("should_reload", &self.should_reload.is_some())
            .finish()
    }
}
