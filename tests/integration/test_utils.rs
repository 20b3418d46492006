//! Shared test utilities for integration tests
//!
//! Provides a scripted in-memory transport, a recording parent for overlay
//! tests, controller setup helpers and isolated environment handling for
//! configuration tests.

use async_trait::async_trait;
use navbridge::browser::MemoryBrowser;
use navbridge::navigation::{
    event_channel, ControllerBuilder, NavigationController, NavigationEvent, ResponseHandler,
};
use navbridge::response::{RenderResponse, Response};
use navbridge::transport::{FormData, Transport};
use navbridge::unpack::TypeRegistry;
use navbridge::NavigationError;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;

pub const ORIGIN: &str = "http://localhost";

/// One request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct Request {
    pub method: &'static str,
    pub path: String,
    pub overlay: bool,
    pub form: Option<FormData>,
}

#[derive(Default)]
struct ScriptState {
    requests: Vec<Request>,
    held: HashMap<usize, oneshot::Sender<Response>>,
    routes: HashMap<String, Response>,
}

/// Transport answering from a route table, or holding requests until the test
/// releases them with [`ScriptedTransport::respond`].
#[derive(Default)]
pub struct ScriptedTransport {
    state: Mutex<ScriptState>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every GET for `path` immediately with `response`.
    pub fn route(&self, path: &str, response: Response) {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(path.to_string(), response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Release the held request with index `index` (0-based, in issue order).
    pub fn respond(&self, index: usize, response: Response) {
        let sender = self
            .state
            .lock()
            .unwrap()
            .held
            .remove(&index)
            .unwrap_or_else(|| panic!("request {} is not being held", index));
        let _ = sender.send(response);
    }

    /// Yield until at least `count` requests have been issued.
    pub async fn wait_for_requests(&self, count: usize) {
        for _ in 0..10_000 {
            if self.request_count() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!(
            "expected {} requests, saw {}",
            count,
            self.request_count()
        );
    }

    async fn exchange(&self, request: Request) -> Response {
        let receiver = {
            let mut state = self.state.lock().unwrap();
            let path = request.path.clone();
            let request_is_get = request.method == "GET";
            let index = state.requests.len();
            state.requests.push(request);
            if request_is_get {
                if let Some(response) = state.routes.get(&path) {
                    return response.clone();
                }
            }
            let (sender, receiver) = oneshot::channel();
            state.held.insert(index, sender);
            receiver
        };
        receiver.await.unwrap_or(Response::NetworkError)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str, overlay: bool) -> Response {
        self.exchange(Request {
            method: "GET",
            path: path.to_string(),
            overlay,
            form: None,
        })
        .await
    }

    async fn post(&self, path: &str, form: FormData, overlay: bool) -> Response {
        self.exchange(Request {
            method: "POST",
            path: path.to_string(),
            overlay,
            form: Some(form),
        })
        .await
    }
}

/// Parent stand-in that records every escalated response.
#[derive(Default)]
pub struct RecordingParent {
    calls: Mutex<Vec<(Response, String, bool, bool)>>,
}

impl RecordingParent {
    pub fn calls(&self) -> Vec<(Response, String, bool, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ResponseHandler for RecordingParent {
    fn handle_response(
        &self,
        response: Response,
        path: &str,
        push_state: bool,
        never_reload: bool,
    ) -> Result<(), NavigationError> {
        self.calls
            .lock()
            .unwrap()
            .push((response, path.to_string(), push_state, never_reload));
        Ok(())
    }
}

pub fn render(view: &str, props: JsonValue) -> Response {
    RenderResponse::new(view, props).with_title(view).into()
}

pub fn page(view: &str) -> Response {
    render(view, json!({}))
}

/// Everything a top-level controller test usually needs.
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub browser: Arc<MemoryBrowser>,
    pub controller: Arc<NavigationController>,
    pub events: UnboundedReceiver<NavigationEvent>,
}

impl Harness {
    /// Top-level controller at `/` whose initial response renders `initial_view`.
    pub fn start(initial_view: &str) -> Self {
        Self::start_with(page(initial_view), "/")
    }

    pub fn start_with(initial: Response, path: &str) -> Self {
        let transport = ScriptedTransport::new();
        let browser = Arc::new(MemoryBrowser::new(ORIGIN, path));
        let (sender, events) = event_channel();
        let controller = ControllerBuilder::new(
            transport.clone(),
            Arc::new(TypeRegistry::with_defaults()),
        )
        .browser(browser.clone())
        .callbacks(Arc::new(sender))
        .start(initial, path)
        .unwrap();
        Self {
            transport,
            browser,
            controller,
            events,
        }
    }

    /// Events emitted so far.
    pub fn drain_events(&mut self) -> Vec<NavigationEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    saved: Vec<(String, Option<String>)>,
}

impl EnvState {
    fn capture(keys: &[&str]) -> Self {
        Self {
            saved: keys
                .iter()
                .map(|k| (k.to_string(), std::env::var(k).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (key, value) in self.saved {
            match value {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// Run `f` with `XDG_CONFIG_HOME` and `HOME` pointed into `test_dir` and the
/// given extra variables set. Everything is restored afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let mut keys = vec!["HOME", "XDG_CONFIG_HOME"];
    keys.extend(vars.iter().map(|(k, _)| *k));
    let env_state = EnvState::capture(&keys);

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();
    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().to_str().unwrap());
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = f();

    env_state.restore();

    result
}
