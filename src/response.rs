//! Server response wire model.
//!
//! Every response is a JSON object tagged by `action`. Render payloads carry
//! packed `props` and `context` graphs that are decoded only when the response
//! is actually applied.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A notification shown alongside a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: String,
    #[serde(alias = "html")]
    pub text: String,
}

impl Message {
    pub fn new(level: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub title: String,
}

impl Metadata {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub view: String,
    #[serde(default = "empty_object")]
    pub props: JsonValue,
    #[serde(default = "empty_object")]
    pub context: JsonValue,
    #[serde(default = "default_metadata")]
    pub metadata: Metadata,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Whether the response may render inside an overlay.
    #[serde(default)]
    pub overlay: bool,
}

impl RenderResponse {
    pub fn new(view: impl Into<String>, props: JsonValue) -> Self {
        Self {
            view: view.into(),
            props,
            context: empty_object(),
            metadata: default_metadata(),
            messages: Vec::new(),
            overlay: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata = Metadata::titled(title);
        self
    }

    pub fn with_context(mut self, context: JsonValue) -> Self {
        self.context = context;
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn in_overlay(mut self) -> Self {
        self.overlay = true;
        self
    }
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

fn default_metadata() -> Metadata {
    Metadata::titled("")
}

/// A response from the server, discriminated by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Response {
    Render(RenderResponse),
    Redirect {
        path: String,
    },
    Reload,
    CloseOverlay {
        #[serde(default)]
        messages: Vec<Message>,
    },
    ServerError,
    NetworkError,
}

impl Response {
    pub fn action(&self) -> &'static str {
        match self {
            Response::Render(_) => "render",
            Response::Redirect { .. } => "redirect",
            Response::Reload => "reload",
            Response::CloseOverlay { .. } => "close-overlay",
            Response::ServerError => "server-error",
            Response::NetworkError => "network-error",
        }
    }

    pub fn redirect(path: impl Into<String>) -> Self {
        Response::Redirect { path: path.into() }
    }
}

impl From<RenderResponse> for Response {
    fn from(render: RenderResponse) -> Self {
        Response::Render(render)
    }
}

/// Which failure a `server-error`/`network-error` response reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerErrorKind {
    Server,
    Network,
}

impl ServerErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerErrorKind::Server => "server",
            ServerErrorKind::Network => "network",
        }
    }
}
