//! Frame id allocation
//!
//! Ids are handed out by an allocator owned by whoever builds a controller
//! tree. Controllers sharing an allocator see one monotonically increasing
//! sequence; independent trees (and tests) use independent allocators.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type FrameId = u64;

/// Shared monotonic frame id counter
#[derive(Debug, Clone)]
pub struct FrameIdAllocator {
    last: Arc<AtomicU64>,
}

impl Default for FrameIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameIdAllocator {
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Allocator whose first id is `last + 1`.
    pub fn starting_after(last: FrameId) -> Self {
        FrameIdAllocator {
            last: Arc::new(AtomicU64::new(last)),
        }
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> FrameId {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Most recently allocated id (0 when none has been handed out).
    pub fn last_id(&self) -> FrameId {
        self.last.load(Ordering::SeqCst)
    }
}
