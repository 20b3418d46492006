//! Integration tests for response actions and browser integration

use crate::integration::test_utils::{page, Harness};
use navbridge::browser::{Browser, HistoryState};
use navbridge::navigation::NavigationEvent;
use navbridge::response::{Response, ServerErrorKind};
use navbridge::NavigationError;

async fn wait_for_view(h: &Harness, view: &str) {
    for _ in 0..10_000 {
        if h.controller.current_frame().view == view {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "view {} never rendered; current is {}",
        view,
        h.controller.current_frame().view
    );
}

#[tokio::test]
async fn test_redirect_is_followed_as_new_navigation() {
    let mut h = Harness::start("Home");
    h.transport.route("/old/", Response::redirect("/new/"));
    h.transport.route("/new/", page("New"));

    h.controller.navigate("/old/", true).await.unwrap();
    wait_for_view(&h, "New").await;

    assert_eq!(h.controller.pending_redirect(), None);
    let paths: Vec<String> = h.transport.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/old/".to_string(), "/new/".to_string()]);
    let urls: Vec<String> = h.browser.history().into_iter().map(|e| e.url).collect();
    assert_eq!(urls, vec!["/".to_string(), "/new/".to_string()]);
    assert!(h.drain_events().iter().any(|e| matches!(
        e,
        NavigationEvent::Navigated { frame, .. } if frame.view == "New"
    )));
}

#[tokio::test]
async fn test_initial_redirect_leaves_loading_frame_until_followed() {
    let h = Harness::start_with(Response::redirect("/login/"), "/");
    // The follow-up runs as its own task, so nothing has been fetched yet.
    assert!(h.controller.is_loading());
    assert_eq!(h.controller.pending_redirect().as_deref(), Some("/login/"));
    h.transport.route("/login/", page("Login"));
    wait_for_view(&h, "Login").await;
    assert_eq!(h.controller.current_frame().path, "/login/");
}

#[tokio::test]
async fn test_reload_hands_off_to_full_page_load() {
    let h = Harness::start("Home");
    h.transport.route("/export/", Response::Reload);

    h.controller.navigate("/export/", true).await.unwrap();

    assert_eq!(h.browser.assigned(), vec!["/export/".to_string()]);
    assert_eq!(h.controller.current_frame().view, "Home");
}

#[tokio::test]
async fn test_server_and_network_errors_reach_callbacks() {
    let mut h = Harness::start("Home");
    h.transport.route("/boom/", Response::ServerError);
    h.transport.route("/offline/", Response::NetworkError);
    h.drain_events();

    let result = h.controller.navigate("/boom/", true).await;
    assert!(matches!(result, Err(NavigationError::Server(p)) if p == "/boom/"));
    let result = h.controller.navigate("/offline/", true).await;
    assert!(matches!(result, Err(NavigationError::Network(_))));

    let kinds: Vec<ServerErrorKind> = h
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            NavigationEvent::ServerError(kind) => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![ServerErrorKind::Server, ServerErrorKind::Network]);
    assert_eq!(h.controller.current_frame().view, "Home");
    assert!(!h.controller.is_navigating());
}

#[tokio::test]
async fn test_push_records_previous_path_and_scroll() {
    let h = Harness::start("Home");
    h.transport.route("/a/", page("A"));
    h.transport.route("/", page("Home"));

    h.browser.set_scroll(120.0);
    h.controller.navigate("/a/", true).await.unwrap();

    assert_eq!(h.browser.title(), "A");
    assert_eq!(h.browser.scroll_y(), 0.0);
    let history = h.browser.history();
    assert_eq!(history.len(), 2);
    assert_eq!(
        history[1].state,
        HistoryState {
            prev_path: Some("/".to_string()),
            prev_scroll_position: Some(120.0),
        }
    );

    // Heading back to the page we came from restores its scroll offset.
    h.browser.set_scroll(40.0);
    h.controller.navigate("/", true).await.unwrap();
    assert_eq!(h.browser.scroll_y(), 120.0);
    assert_eq!(h.browser.title(), "Home");
}

#[tokio::test]
async fn test_navigate_without_push_only_sets_title() {
    let h = Harness::start("Home");
    h.transport.route("/a/", page("A"));

    h.controller.navigate("/a/", false).await.unwrap();

    assert_eq!(h.browser.history().len(), 1);
    assert_eq!(h.browser.title(), "A");
    assert_eq!(h.controller.current_frame().path, "/a/");
}

#[tokio::test]
async fn test_foreign_origin_bypasses_controller() {
    let h = Harness::start("Home");

    h.controller
        .navigate("https://docs.example.org/guide/", true)
        .await
        .unwrap();

    assert_eq!(h.transport.request_count(), 0);
    assert_eq!(
        h.browser.assigned(),
        vec!["https://docs.example.org/guide/".to_string()]
    );
}

#[tokio::test]
async fn test_same_origin_absolute_url_is_fetched_by_path() {
    let h = Harness::start("Home");
    h.transport.route("/search/?q=rust", page("Results"));

    h.controller
        .navigate("http://localhost/search/?q=rust", true)
        .await
        .unwrap();

    assert_eq!(h.controller.current_frame().view, "Results");
    assert_eq!(h.browser.pathname(), "/search/");
}

#[tokio::test]
async fn test_unparseable_url_is_rejected() {
    let h = Harness::start("Home");
    let result = h.controller.navigate("not a url", true).await;
    assert!(matches!(result, Err(NavigationError::InvalidUrl(_))));
    assert_eq!(h.transport.request_count(), 0);
}

#[tokio::test]
async fn test_form_submission_posts_fields() {
    let h = Harness::start("Form");

    let submit = tokio::spawn({
        let c = h.controller.clone();
        async move {
            c.submit_form("/form/", [("name", "Ada"), ("lang", "rust")].into_iter().collect())
                .await
        }
    });
    h.transport.wait_for_requests(1).await;
    h.transport.respond(0, page("Thanks"));
    submit.await.unwrap().unwrap();

    let requests = h.transport.requests();
    assert_eq!(requests[0].method, "POST");
    assert!(!requests[0].overlay);
    let form = requests[0].form.as_ref().unwrap();
    assert_eq!(form.get("name"), Some("Ada"));
    assert_eq!(form.fields().len(), 2);
    assert_eq!(h.controller.current_frame().view, "Thanks");
    assert_eq!(h.browser.history().len(), 2);
}
