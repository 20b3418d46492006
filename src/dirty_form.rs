//! Unsaved-changes guard
//!
//! Tracks whether a form in the current scope has unsaved edits and lets a
//! navigation ask for permission to leave. The request waits until the user
//! confirms or cancels.

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Debug, Default)]
struct DirtyFormState {
    dirty: bool,
    unload_requested: bool,
    unload_confirmed: bool,
    waiter: Option<oneshot::Sender<bool>>,
}

#[derive(Debug, Default)]
pub struct DirtyFormScope {
    state: Mutex<DirtyFormState>,
}

impl DirtyFormScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&self) {
        self.state.lock().dirty = true;
    }

    pub fn mark_clean(&self) {
        self.state.lock().dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Ask to leave the scope. Resolves `true` at once when nothing is dirty;
    /// otherwise waits for [`confirm_unload`](Self::confirm_unload) (`true`) or
    /// [`cancel_unload`](Self::cancel_unload) (`false`). A newer request
    /// supersedes an older one, which then resolves `false`.
    pub async fn request_unload(&self) -> bool {
        let receiver = {
            let mut state = self.state.lock();
            if !state.dirty {
                return true;
            }
            state.unload_requested = true;
            let (sender, receiver) = oneshot::channel();
            if let Some(previous) = state.waiter.replace(sender) {
                let _ = previous.send(false);
            }
            receiver
        };
        debug!("Unload requested with unsaved changes");
        receiver.await.unwrap_or(false)
    }

    pub fn confirm_unload(&self) {
        let mut state = self.state.lock();
        if !state.unload_requested {
            return;
        }
        state.unload_requested = false;
        state.unload_confirmed = true;
        if let Some(waiter) = state.waiter.take() {
            let _ = waiter.send(true);
        }
    }

    pub fn cancel_unload(&self) {
        let mut state = self.state.lock();
        if !state.unload_requested {
            return;
        }
        state.unload_requested = false;
        if let Some(waiter) = state.waiter.take() {
            let _ = waiter.send(false);
        }
    }

    pub fn unload_requested(&self) -> bool {
        self.state.lock().unload_requested
    }

    /// Dirty and a leave request is waiting on the user.
    pub fn unload_blocked(&self) -> bool {
        let state = self.state.lock();
        state.dirty && state.unload_requested
    }

    pub fn unload_confirmed(&self) -> bool {
        self.state.lock().unload_confirmed
    }
}
