//! Presentation-facing notifications.

use crate::frame::Frame;
use crate::response::{Message, ServerErrorKind};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// Handlers a controller invokes as responses are applied. All default to no-ops.
pub trait NavigationCallbacks: Send + Sync {
    /// A render response was applied. `new_frame` is true when the frame id changed.
    fn on_navigation(&self, _frame: &Frame, _new_frame: bool, _messages: &[Message]) {}

    /// An overlay handed a response to its parent and should close.
    fn on_escalate(&self) {}

    fn on_overlay_close(&self, _messages: &[Message]) {}

    fn on_server_error(&self, _kind: ServerErrorKind) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoCallbacks;

impl NavigationCallbacks for NoCallbacks {}

/// One callback invocation, as a value.
#[derive(Debug, Clone)]
pub enum NavigationEvent {
    Navigated {
        frame: Frame,
        new_frame: bool,
        messages: Vec<Message>,
    },
    Escalated,
    OverlayClosed {
        messages: Vec<Message>,
    },
    ServerError(ServerErrorKind),
}

/// Callbacks that forward every invocation into a channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: UnboundedSender<NavigationEvent>,
}

pub fn event_channel() -> (EventSender, UnboundedReceiver<NavigationEvent>) {
    let (sender, receiver) = unbounded_channel();
    (EventSender { sender }, receiver)
}

impl EventSender {
    fn emit(&self, event: NavigationEvent) {
        if self.sender.send(event).is_err() {
            trace!("Navigation event dropped; receiver closed");
        }
    }
}

impl NavigationCallbacks for EventSender {
    fn on_navigation(&self, frame: &Frame, new_frame: bool, messages: &[Message]) {
        self.emit(NavigationEvent::Navigated {
            frame: frame.clone(),
            new_frame,
            messages: messages.to_vec(),
        });
    }

    fn on_escalate(&self) {
        self.emit(NavigationEvent::Escalated);
    }

    fn on_overlay_close(&self, messages: &[Message]) {
        self.emit(NavigationEvent::OverlayClosed {
            messages: messages.to_vec(),
        });
    }

    fn on_server_error(&self, kind: ServerErrorKind) {
        self.emit(NavigationEvent::ServerError(kind));
    }
}
