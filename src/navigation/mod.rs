//! Navigation Controller
//!
//! Owns the current [`Frame`] of one navigation scope, issues requests through
//! a [`Transport`], decodes render payloads and applies them under the
//! fetch-ordering and frame-transition rules.
//!
//! Controllers form a tree: an overlay controller has exactly one parent and
//! escalates responses it cannot render itself. The parent is reached only
//! through [`ResponseHandler::handle_response`]; no other state is shared.

pub mod auto_refresh;
pub mod callbacks;
pub mod epoch;

pub use auto_refresh::AutoRefresh;
pub use callbacks::{event_channel, EventSender, NavigationCallbacks, NavigationEvent, NoCallbacks};
pub use epoch::{FetchEpoch, FetchId};

use crate::browser::{Browser, HistoryState, MemoryBrowser};
use crate::dirty_form::DirtyFormScope;
use crate::error::NavigationError;
use crate::frame::{Frame, FrameId, FrameIdAllocator, ShouldReload};
use crate::response::{Message, Metadata, RenderResponse, Response, ServerErrorKind};
use crate::transport::{FormData, Transport};
use crate::unpack::{unpack, TypeRegistry, Value};
use parking_lot::Mutex;
use reqwest::Url;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Origin assumed when no browser is attached.
pub const DEFAULT_ORIGIN: &str = "http://localhost";

/// Anything a response can be escalated to.
pub trait ResponseHandler: Send + Sync {
    fn handle_response(
        &self,
        response: Response,
        path: &str,
        push_state: bool,
        never_reload: bool,
    ) -> Result<(), NavigationError>;
}

#[derive(Debug, Clone, Copy)]
pub struct NavigateOptions {
    pub push_state: bool,
    pub skip_dirty_form_check: bool,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            push_state: true,
            skip_dirty_form_check: false,
        }
    }
}

enum FetchRequest {
    Get,
    Post(FormData),
}

impl FetchRequest {
    fn method(&self) -> &'static str {
        match self {
            FetchRequest::Get => "GET",
            FetchRequest::Post(_) => "POST",
        }
    }
}

enum Target {
    Local(String),
    Foreign,
}

struct ControllerState {
    frame: Frame,
    is_navigating: bool,
    redirect_to: Option<String>,
    epoch: FetchEpoch,
}

pub struct NavigationController {
    parent: Option<Arc<dyn ResponseHandler>>,
    transport: Arc<dyn Transport>,
    registry: Arc<TypeRegistry>,
    browser: Arc<dyn Browser>,
    frame_ids: FrameIdAllocator,
    callbacks: Arc<dyn NavigationCallbacks>,
    dirty_form: Option<Arc<DirtyFormScope>>,
    state: Mutex<ControllerState>,
    this: Weak<NavigationController>,
}

/// Builder for top-level and overlay controllers.
pub struct ControllerBuilder {
    transport: Arc<dyn Transport>,
    registry: Arc<TypeRegistry>,
    browser: Option<Arc<dyn Browser>>,
    frame_ids: Option<FrameIdAllocator>,
    parent: Option<Arc<dyn ResponseHandler>>,
    callbacks: Option<Arc<dyn NavigationCallbacks>>,
    dirty_form: Option<Arc<DirtyFormScope>>,
}

impl ControllerBuilder {
    pub fn new(transport: Arc<dyn Transport>, registry: Arc<TypeRegistry>) -> Self {
        Self {
            transport,
            registry,
            browser: None,
            frame_ids: None,
            parent: None,
            callbacks: None,
            dirty_form: None,
        }
    }

    pub fn browser(mut self, browser: Arc<dyn Browser>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Share a frame id sequence with other controllers.
    pub fn frame_ids(mut self, frame_ids: FrameIdAllocator) -> Self {
        self.frame_ids = Some(frame_ids);
        self
    }

    /// Make this an overlay controller escalating to `parent`.
    pub fn parent(mut self, parent: Arc<dyn ResponseHandler>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn callbacks(mut self, callbacks: Arc<dyn NavigationCallbacks>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn dirty_form(mut self, scope: Arc<DirtyFormScope>) -> Self {
        self.dirty_form = Some(scope);
        self
    }

    /// Build the controller and run `initial_response` through the normal
    /// dispatch path (no push, reload allowed, initial-load warnings on).
    pub fn start(
        self,
        initial_response: Response,
        initial_path: &str,
    ) -> Result<Arc<NavigationController>, NavigationError> {
        let frame_ids = self.frame_ids.unwrap_or_default();
        let browser = self
            .browser
            .unwrap_or_else(|| Arc::new(MemoryBrowser::new(DEFAULT_ORIGIN, initial_path)));
        let frame = Frame::loading(frame_ids.next_id(), initial_path);

        let controller = Arc::new_cyclic(|this| NavigationController {
            parent: self.parent,
            transport: self.transport,
            registry: self.registry,
            browser,
            frame_ids,
            callbacks: self.callbacks.unwrap_or_else(|| Arc::new(NoCallbacks)),
            dirty_form: self.dirty_form,
            state: Mutex::new(ControllerState {
                frame,
                is_navigating: false,
                redirect_to: None,
                epoch: FetchEpoch::new(),
            }),
            this: this.clone(),
        });

        debug!(
            frame_id = controller.frame_id(),
            path = initial_path,
            overlay = controller.is_overlay(),
            "Controller created"
        );
        controller.dispatch(initial_response, initial_path, false, false, true)?;
        Ok(controller)
    }
}

impl NavigationController {
    pub fn builder(transport: Arc<dyn Transport>, registry: Arc<TypeRegistry>) -> ControllerBuilder {
        ControllerBuilder::new(transport, registry)
    }

    pub fn is_overlay(&self) -> bool {
        self.parent.is_some()
    }

    /// Snapshot of the current frame.
    pub fn current_frame(&self) -> Frame {
        self.state.lock().frame.clone()
    }

    pub fn frame_id(&self) -> FrameId {
        self.state.lock().frame.id
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().frame.is_loading()
    }

    pub fn is_navigating(&self) -> bool {
        self.state.lock().is_navigating
    }

    pub fn set_is_navigating(&self, navigating: bool) {
        self.state.lock().is_navigating = navigating;
    }

    /// Whether any request issued by this controller has not finished yet.
    pub fn fetch_in_progress(&self) -> bool {
        self.state.lock().epoch.in_flight()
    }

    /// Redirect target recorded but not yet followed.
    pub fn pending_redirect(&self) -> Option<String> {
        self.state.lock().redirect_to.clone()
    }

    pub async fn navigate(&self, url: &str, push_state: bool) -> Result<(), NavigationError> {
        self.navigate_with(
            url,
            NavigateOptions {
                push_state,
                ..NavigateOptions::default()
            },
        )
        .await
    }

    pub async fn navigate_with(
        &self,
        url: &str,
        options: NavigateOptions,
    ) -> Result<(), NavigationError> {
        if !options.skip_dirty_form_check {
            if let Some(scope) = &self.dirty_form {
                if !scope.request_unload().await {
                    debug!(url, "Navigation abandoned; unsaved changes kept");
                    return Ok(());
                }
            }
        }

        let path = match self.resolve_target(url)? {
            Target::Local(path) => path,
            Target::Foreign => {
                info!(url, "Foreign origin; loading page outside the controller");
                self.browser.assign(url);
                return Ok(());
            }
        };

        self.set_is_navigating(true);
        let _navigating = NavigatingGuard(self);
        let fetch_id = self.state.lock().epoch.issue();
        self.run_fetch(fetch_id, FetchRequest::Get, path, options.push_state, false)
            .await
    }

    pub async fn submit_form(&self, url: &str, form: FormData) -> Result<(), NavigationError> {
        let fetch_id = self.state.lock().epoch.issue();
        self.run_fetch(fetch_id, FetchRequest::Post(form), url.to_string(), true, false)
            .await
    }

    /// Re-fetch the current path without pushing history or remounting the view.
    /// A no-op while any request from this controller is still in flight.
    pub async fn refresh_props(&self) -> Result<(), NavigationError> {
        let (fetch_id, path) = {
            let mut state = self.state.lock();
            if state.epoch.in_flight() {
                debug!("Refresh skipped; a fetch is already in flight");
                return Ok(());
            }
            (state.epoch.issue(), state.frame.path.clone())
        };
        self.run_fetch(fetch_id, FetchRequest::Get, path, false, true)
            .await
    }

    /// Rewrite the current frame's path, but only if `frame_id` is still current.
    pub fn replace_path(&self, frame_id: FrameId, path: &str) {
        {
            let mut state = self.state.lock();
            if state.frame.id != frame_id {
                debug!(frame_id, current = state.frame.id, "Ignoring stale replace_path");
                return;
            }
            state.frame.path = path.to_string();
        }
        if !self.is_overlay() {
            self.browser.replace_state(HistoryState::default(), path);
        }
    }

    /// Attach a should-reload predicate to the current frame, if `frame_id` is
    /// still current. Returns whether it was attached.
    pub fn register_should_reload(&self, frame_id: FrameId, callback: ShouldReload) -> bool {
        let mut state = self.state.lock();
        if state.frame.id != frame_id {
            return false;
        }
        state.frame.should_reload = Some(callback);
        true
    }

    /// Load `path` as an overlay above this controller. The overlay shares this
    /// controller's transport, registry, browser and frame id sequence.
    pub async fn open_overlay(
        self: &Arc<Self>,
        path: &str,
        callbacks: Arc<dyn NavigationCallbacks>,
    ) -> Result<Arc<NavigationController>, NavigationError> {
        info!(path, "Opening overlay");
        let response = self.transport.get(path, true).await;
        let parent: Arc<dyn ResponseHandler> = self.clone();
        ControllerBuilder::new(self.transport.clone(), self.registry.clone())
            .browser(self.browser.clone())
            .frame_ids(self.frame_ids.clone())
            .parent(parent)
            .callbacks(callbacks)
            .start(response, path)
    }

    fn resolve_target(&self, url: &str) -> Result<Target, NavigationError> {
        if url.starts_with('/') {
            return Ok(Target::Local(url.to_string()));
        }
        let parsed = Url::parse(url).map_err(|e| NavigationError::InvalidUrl(format!("{}: {}", url, e)))?;
        if parsed.origin().ascii_serialization() != self.browser.origin() {
            return Ok(Target::Foreign);
        }
        let mut path = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            path.push('?');
            path.push_str(query);
        }
        Ok(Target::Local(path))
    }

    async fn run_fetch(
        &self,
        fetch_id: FetchId,
        request: FetchRequest,
        path: String,
        push_state: bool,
        never_reload: bool,
    ) -> Result<(), NavigationError> {
        let _in_flight = InFlightGuard(self);
        let overlay = self.is_overlay();
        debug!(fetch_id, path = %path, method = request.method(), overlay, "Issuing fetch");

        let response = match request {
            FetchRequest::Get => self.transport.get(&path, overlay).await,
            FetchRequest::Post(form) => self.transport.post(&path, form, overlay).await,
        };

        if !self.state.lock().epoch.accept(fetch_id) {
            debug!(fetch_id, path = %path, "Discarding stale response");
            return Ok(());
        }

        self.dispatch(response, &path, push_state, never_reload, false)
    }

    fn dispatch(
        &self,
        response: Response,
        path: &str,
        push_state: bool,
        never_reload: bool,
        initial: bool,
    ) -> Result<(), NavigationError> {
        match response {
            Response::Render(render) => {
                if let Some(parent) = self.parent.as_ref().filter(|_| !render.overlay) {
                    if initial {
                        warn!(
                            path,
                            "Overlay request returned a response that cannot be rendered in an overlay"
                        );
                    }
                    info!(path, view = %render.view, "Escalating render to parent");
                    let result = parent.handle_response(Response::Render(render), path, true, false);
                    self.callbacks.on_escalate();
                    return result;
                }
                self.apply_render(render, path, push_state, never_reload)
            }
            Response::Redirect { path: target } => {
                self.schedule_redirect(target);
                Ok(())
            }
            Response::Reload => match &self.parent {
                None => {
                    info!(path, "Reload requested; loading page");
                    self.browser.assign(path);
                    Ok(())
                }
                Some(parent) => {
                    info!(path, "Escalating reload to parent");
                    parent.handle_response(Response::Reload, path, true, false)
                }
            },
            Response::CloseOverlay { messages } => {
                self.callbacks.on_overlay_close(&messages);
                Ok(())
            }
            Response::ServerError => {
                self.callbacks.on_server_error(ServerErrorKind::Server);
                Err(NavigationError::Server(path.to_string()))
            }
            Response::NetworkError => {
                self.callbacks.on_server_error(ServerErrorKind::Network);
                Err(NavigationError::Network(path.to_string()))
            }
        }
    }

    fn apply_render(
        &self,
        render: RenderResponse,
        path: &str,
        push_state: bool,
        never_reload: bool,
    ) -> Result<(), NavigationError> {
        // Decode before touching anything so a bad payload leaves the frame intact.
        let props = unpack(&render.props, &self.registry)?;
        let context = unpack(&render.context, &self.registry)?;

        let mut reload = !never_reload;
        if reload {
            let should_reload = {
                let state = self.state.lock();
                if state.frame.view == render.view {
                    state.frame.should_reload.clone()
                } else {
                    None
                }
            };
            if let Some(should_reload) = should_reload {
                reload = should_reload(path, &props);
            }
        }

        self.push_frame(
            path,
            render.metadata,
            render.view,
            props,
            context,
            &render.messages,
            push_state,
            reload,
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn push_frame(
        &self,
        path: &str,
        metadata: Metadata,
        view: String,
        props: Value,
        context: Value,
        messages: &[Message],
        push_state: bool,
        reload: bool,
    ) {
        if !self.is_overlay() {
            self.update_browser(path, &metadata.title, push_state);
        }

        let (frame, new_frame) = {
            let mut state = self.state.lock();
            let new_frame = view != state.frame.view || reload;
            let frame = &mut state.frame;
            if new_frame {
                frame.id = self.frame_ids.next_id();
                frame.should_reload = None;
            }
            frame.path = path.to_string();
            frame.metadata = metadata;
            frame.view = view;
            frame.props = props;
            frame.context = context;
            (frame.clone(), new_frame)
        };

        debug!(frame_id = frame.id, view = %frame.view, path, new_frame, "Applied render");
        self.callbacks.on_navigation(&frame, new_frame, messages);
    }

    fn update_browser(&self, path: &str, title: &str, push_state: bool) {
        self.browser.set_title(title);
        if !push_state {
            return;
        }

        let scroll_position = self.browser.scroll_y();
        // Going back to the page we came from: restore where the user was.
        let restore_to = match self.browser.history_state() {
            Some(HistoryState {
                prev_path: Some(prev_path),
                prev_scroll_position,
            }) if prev_path == path => prev_scroll_position.unwrap_or(0.0),
            _ => 0.0,
        };

        self.browser.push_state(
            HistoryState {
                prev_path: Some(self.browser.pathname()),
                prev_scroll_position: Some(scroll_position),
            },
            path,
        );
        self.browser.scroll_to(restore_to);
    }

    fn schedule_redirect(&self, target: String) {
        info!(path = %target, "Following redirect");
        self.state.lock().redirect_to = Some(target);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available; redirect left pending");
            return;
        };
        let this = self.this.clone();
        // Runs as its own task so redirect chains do not deepen this call stack.
        runtime.spawn(async move {
            let Some(controller) = this.upgrade() else {
                return;
            };
            let Some(target) = controller.take_pending_redirect() else {
                return;
            };
            let options = NavigateOptions {
                push_state: true,
                skip_dirty_form_check: true,
            };
            if let Err(e) = controller.navigate_with(&target, options).await {
                warn!(path = %target, error = %e, "Redirect navigation failed");
            }
        });
    }

    fn take_pending_redirect(&self) -> Option<String> {
        self.state.lock().redirect_to.take()
    }
}

impl ResponseHandler for NavigationController {
    fn handle_response(
        &self,
        response: Response,
        path: &str,
        push_state: bool,
        never_reload: bool,
    ) -> Result<(), NavigationError> {
        self.dispatch(response, path, push_state, never_reload, false)
    }
}

struct NavigatingGuard<'a>(&'a NavigationController);

impl Drop for NavigatingGuard<'_> {
    fn drop(&mut self) {
        self.0.set_is_navigating(false);
    }
}

struct InFlightGuard<'a>(&'a NavigationController);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.state.lock().epoch.finish();
    }
}
