//! Integration tests for fetch ordering and in-flight tracking

use crate::integration::test_utils::{page, render, Harness};
use navbridge::navigation::NavigationEvent;
use serde_json::json;

#[tokio::test]
async fn test_later_navigation_wins_when_responses_arrive_reversed() {
    let mut h = Harness::start("Home");
    h.drain_events();

    let first = tokio::spawn({
        let c = h.controller.clone();
        async move { c.navigate("/a/", true).await }
    });
    h.transport.wait_for_requests(1).await;
    let second = tokio::spawn({
        let c = h.controller.clone();
        async move { c.navigate("/b/", true).await }
    });
    h.transport.wait_for_requests(2).await;

    h.transport.respond(1, page("B"));
    second.await.unwrap().unwrap();
    h.transport.respond(0, page("A"));
    first.await.unwrap().unwrap();

    let frame = h.controller.current_frame();
    assert_eq!(frame.view, "B");
    assert_eq!(frame.path, "/b/");

    let navigated: Vec<String> = h
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            NavigationEvent::Navigated { frame, .. } => Some(frame.view),
            _ => None,
        })
        .collect();
    assert_eq!(navigated, vec!["B".to_string()]);
}

#[tokio::test]
async fn test_in_order_responses_are_all_applied() {
    let mut h = Harness::start("Home");
    h.drain_events();

    let first = tokio::spawn({
        let c = h.controller.clone();
        async move { c.navigate("/a/", true).await }
    });
    h.transport.wait_for_requests(1).await;
    let second = tokio::spawn({
        let c = h.controller.clone();
        async move { c.navigate("/b/", true).await }
    });
    h.transport.wait_for_requests(2).await;

    h.transport.respond(0, page("A"));
    first.await.unwrap().unwrap();
    assert_eq!(h.controller.current_frame().view, "A");
    h.transport.respond(1, page("B"));
    second.await.unwrap().unwrap();
    assert_eq!(h.controller.current_frame().view, "B");
    assert_eq!(h.drain_events().len(), 2);
}

#[tokio::test]
async fn test_refresh_props_is_single_flight() {
    let h = Harness::start("Home");

    let refresh = tokio::spawn({
        let c = h.controller.clone();
        async move { c.refresh_props().await }
    });
    h.transport.wait_for_requests(1).await;
    assert!(h.controller.fetch_in_progress());

    // A second refresh while the first is outstanding issues nothing.
    h.controller.refresh_props().await.unwrap();
    assert_eq!(h.transport.request_count(), 1);

    h.transport.respond(0, render("Home", json!({"count": 2})));
    refresh.await.unwrap().unwrap();
    assert!(!h.controller.fetch_in_progress());
    assert_eq!(h.transport.requests()[0].path, "/");
}

#[tokio::test]
async fn test_refresh_skipped_while_navigation_in_flight() {
    let h = Harness::start("Home");
    let nav = tokio::spawn({
        let c = h.controller.clone();
        async move { c.navigate("/a/", true).await }
    });
    h.transport.wait_for_requests(1).await;
    assert!(h.controller.is_navigating());

    h.controller.refresh_props().await.unwrap();
    assert_eq!(h.transport.request_count(), 1);

    h.transport.respond(0, page("A"));
    nav.await.unwrap().unwrap();
    assert!(!h.controller.is_navigating());
}

#[tokio::test]
async fn test_stale_and_failed_fetches_release_in_flight() {
    let h = Harness::start("Home");

    let first = tokio::spawn({
        let c = h.controller.clone();
        async move { c.navigate("/a/", true).await }
    });
    h.transport.wait_for_requests(1).await;
    let second = tokio::spawn({
        let c = h.controller.clone();
        async move { c.navigate("/b/", true).await }
    });
    h.transport.wait_for_requests(2).await;

    h.transport.respond(1, navbridge::Response::ServerError);
    assert!(second.await.unwrap().is_err());
    h.transport.respond(0, page("A"));
    first.await.unwrap().unwrap();

    // The server error advanced the high-water mark, so A was stale.
    assert_eq!(h.controller.current_frame().view, "Home");
    assert!(!h.controller.fetch_in_progress());

    let refresh = tokio::spawn({
        let c = h.controller.clone();
        async move { c.refresh_props().await }
    });
    h.transport.wait_for_requests(3).await;
    h.transport.respond(2, page("Home"));
    refresh.await.unwrap().unwrap();
}
