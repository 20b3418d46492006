//! Periodic prop refresh for views that poll the server.

use crate::error::NavigationError;
use crate::navigation::NavigationController;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Handle to a background task calling [`NavigationController::refresh_props`]
/// on an interval. Dropping the handle stops the task.
pub struct AutoRefresh {
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    /// Start refreshing `controller` every `every`. Must be called inside a tokio runtime.
    /// Only a weak reference is kept, so the task ends once the controller is gone.
    pub fn spawn(
        controller: &Arc<NavigationController>,
        every: Duration,
    ) -> Result<Self, NavigationError> {
        if every.is_zero() {
            return Err(NavigationError::ZeroRefreshInterval);
        }
        let controller = Arc::downgrade(controller);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(controller) = controller.upgrade() else {
                    debug!("Controller dropped; stopping auto refresh");
                    break;
                };
                if let Err(e) = controller.refresh_props().await {
                    warn!(error = %e, "Auto refresh failed");
                }
            }
        });
        Ok(Self { handle })
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
