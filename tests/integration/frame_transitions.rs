//! Integration tests for the frame-transition rule

use crate::integration::test_utils::{page, render, Harness};
use navbridge::navigation::{NavigationEvent, ResponseHandler};
use navbridge::unpack::Value;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn last_navigation(h: &mut Harness) -> (u64, bool) {
    h.drain_events()
        .into_iter()
        .rev()
        .find_map(|e| match e {
            NavigationEvent::Navigated {
                frame, new_frame, ..
            } => Some((frame.id, new_frame)),
            _ => None,
        })
        .expect("no navigation event")
}

#[test]
fn test_initial_render_is_a_new_frame() {
    let mut h = Harness::start("Home");
    let (id, new_frame) = last_navigation(&mut h);
    assert!(new_frame);
    assert_eq!(id, h.controller.frame_id());
    assert!(!h.controller.is_loading());
}

#[test]
fn test_same_view_without_reload_keeps_frame() {
    let mut h = Harness::start("Home");
    let before = h.controller.frame_id();
    h.drain_events();

    h.controller
        .handle_response(render("Home", json!({"n": 1})), "/", false, true)
        .unwrap();

    let (id, new_frame) = last_navigation(&mut h);
    assert!(!new_frame);
    assert_eq!(id, before);
    assert_eq!(
        h.controller.current_frame().props.get("n"),
        Some(&Value::from(1))
    );
}

#[test]
fn test_same_view_with_reload_allowed_is_new_frame() {
    let mut h = Harness::start("Home");
    let before = h.controller.frame_id();

    h.controller
        .handle_response(page("Home"), "/", false, false)
        .unwrap();

    let (id, new_frame) = last_navigation(&mut h);
    assert!(new_frame);
    assert!(id > before);
}

#[test]
fn test_view_change_is_new_frame_even_when_reload_forbidden() {
    let mut h = Harness::start("Home");
    let before = h.controller.frame_id();

    h.controller
        .handle_response(page("Detail"), "/d/", false, true)
        .unwrap();

    let (id, new_frame) = last_navigation(&mut h);
    assert!(new_frame);
    assert!(id > before);
}

#[test]
fn test_should_reload_decides_for_same_view() {
    let mut h = Harness::start("List");
    let frame_id = h.controller.frame_id();
    let seen = Arc::new(AtomicUsize::new(0));
    let attached = h.controller.register_should_reload(frame_id, {
        let seen = seen.clone();
        Arc::new(move |path: &str, props: &Value| {
            seen.fetch_add(1, Ordering::SeqCst);
            path != "/list/?page=2" || props.get("reset").is_some()
        })
    });
    assert!(attached);

    h.controller
        .handle_response(render("List", json!({"page": 2})), "/list/?page=2", true, false)
        .unwrap();
    let (id, new_frame) = last_navigation(&mut h);
    assert!(!new_frame);
    assert_eq!(id, frame_id);
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    h.controller
        .handle_response(render("List", json!({"reset": true})), "/list/?page=2", true, false)
        .unwrap();
    let (_, new_frame) = last_navigation(&mut h);
    assert!(new_frame);

    // A new frame drops the predicate: the next same-view render remounts.
    h.controller
        .handle_response(page("List"), "/list/?page=2", true, false)
        .unwrap();
    let (_, new_frame) = last_navigation(&mut h);
    assert!(new_frame);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn test_should_reload_ignored_when_reload_forbidden() {
    let mut h = Harness::start("List");
    let frame_id = h.controller.frame_id();
    h.controller
        .register_should_reload(frame_id, Arc::new(|_: &str, _: &Value| true));

    h.controller
        .handle_response(page("List"), "/", false, true)
        .unwrap();
    let (id, new_frame) = last_navigation(&mut h);
    assert!(!new_frame);
    assert_eq!(id, frame_id);
}

#[test]
fn test_should_reload_for_stale_frame_is_rejected() {
    let h = Harness::start("Home");
    let stale = h.controller.frame_id();
    h.controller
        .handle_response(page("Other"), "/o/", true, false)
        .unwrap();
    assert!(!h
        .controller
        .register_should_reload(stale, Arc::new(|_: &str, _: &Value| false)));
    assert!(h.controller.current_frame().should_reload.is_none());
}

#[test]
fn test_replace_path_only_applies_to_current_frame() {
    let h = Harness::start("Home");
    let original = h.controller.frame_id();

    h.controller.replace_path(original, "/?tab=2");
    assert_eq!(h.controller.current_frame().path, "/?tab=2");
    assert_eq!(h.browser.history().last().unwrap().url, "/?tab=2");

    h.controller
        .handle_response(page("Other"), "/other/", true, false)
        .unwrap();
    h.controller.replace_path(original, "/?tab=3");
    assert_eq!(h.controller.current_frame().path, "/other/");
    assert_eq!(h.browser.history().last().unwrap().url, "/other/");
}

#[test]
fn test_bad_payload_leaves_frame_untouched() {
    let h = Harness::start("Home");
    let before = h.controller.current_frame();

    let result = h.controller.handle_response(
        render("Broken", json!({"x": {"_type": "Nope", "_args": []}})),
        "/broken/",
        true,
        false,
    );
    assert!(matches!(
        result,
        Err(navbridge::NavigationError::Decode(
            navbridge::DecodeError::UnknownType(_)
        ))
    ));
    let after = h.controller.current_frame();
    assert_eq!(after.id, before.id);
    assert_eq!(after.view, "Home");
    assert_eq!(h.browser.history().len(), 1);
}
