//! Drop-container marking with a dwell timer.
//!
//! Runs on a paused clock so dwell boundaries are exact.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Harness;
use stage_core::{
    ContainerHighlightType, ElementHandle, KeyModifiers, PointerEvent, PointerKind, Rect,
    StageError, StageEvent, StageHooks, StageOptions, StageResult,
    DEFAULT_CONTAINER_HIGHLIGHT_CLASS,
};
use tokio::time::sleep;

const DWELL_MS: u64 = 800;

fn hover(x: f64, y: f64) -> PointerEvent {
    PointerEvent::new(PointerKind::Move, x, y)
}

fn marked(h: &Harness) -> Option<String> {
    h.stage.marked_container().map(|el| el.id().to_string())
}

// ============================================================================
// Dwell timer
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_dwell_marks_topmost_container() {
    let mut h = Harness::mounted().await;

    let timer = h
        .stage
        .delayed_mark_container(&hover(300.0, 350.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");
    assert_eq!(timer.container().id().as_str(), "inner");

    sleep(Duration::from_millis(DWELL_MS - 1)).await;
    assert!(marked(&h).is_none());
    assert!(timer.is_active());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(marked(&h).as_deref(), Some("inner"));
    assert!(h.el("inner").has_class(DEFAULT_CONTAINER_HIGHLIGHT_CLASS));

    let StageEvent::Highlight(el) = h.expect_event("highlight").await else {
        unreachable!("expect_event filters by name");
    };
    assert_eq!(el.id().as_str(), "inner");
}

#[tokio::test(start_paused = true)]
async fn test_excluded_container_is_skipped() {
    let h = Harness::mounted().await;
    let inner = h.el("inner");

    let timer = h
        .stage
        .delayed_mark_container(&hover(300.0, 350.0), &[inner])
        .expect("hooks succeed")
        .expect("timer armed");

    assert_eq!(timer.container().id().as_str(), "container-1");
}

#[tokio::test(start_paused = true)]
async fn test_nothing_armed_outside_containers() {
    let h = Harness::mounted().await;

    let timer = h
        .stage
        .delayed_mark_container(&hover(60.0, 35.0), &[])
        .expect("hooks succeed");

    assert!(timer.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_timer_never_marks() {
    let mut h = Harness::mounted().await;
    h.drain();

    let timer = h
        .stage
        .delayed_mark_container(&hover(300.0, 350.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");
    sleep(Duration::from_millis(DWELL_MS / 2)).await;
    timer.cancel();
    sleep(Duration::from_millis(DWELL_MS * 2)).await;

    assert!(timer.is_cancelled());
    assert!(marked(&h).is_none());
    assert!(!h.el("inner").has_class(DEFAULT_CONTAINER_HIGHLIGHT_CLASS));
    assert!(h.drain_names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rearming_same_container_keeps_running_timer() {
    let h = Harness::mounted().await;

    let first = h
        .stage
        .delayed_mark_container(&hover(300.0, 350.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");
    sleep(Duration::from_millis(DWELL_MS / 2)).await;

    let again = h
        .stage
        .delayed_mark_container(&hover(310.0, 360.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");
    assert_eq!(again.seq(), first.seq());

    sleep(Duration::from_millis(DWELL_MS / 2 + 1)).await;
    assert_eq!(marked(&h).as_deref(), Some("inner"));
}

#[tokio::test(start_paused = true)]
async fn test_moving_to_another_container_restarts_dwell() {
    let h = Harness::mounted().await;

    let first = h
        .stage
        .delayed_mark_container(&hover(300.0, 350.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");
    sleep(Duration::from_millis(DWELL_MS / 2)).await;

    let second = h
        .stage
        .delayed_mark_container(&hover(210.0, 210.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");
    assert!(first.is_cancelled());
    assert_eq!(second.container().id().as_str(), "container-1");

    sleep(Duration::from_millis(DWELL_MS / 2 + 1)).await;
    assert!(marked(&h).is_none());

    sleep(Duration::from_millis(DWELL_MS / 2)).await;
    assert_eq!(marked(&h).as_deref(), Some("container-1"));
}

#[tokio::test(start_paused = true)]
async fn test_marked_container_is_not_rearmed() {
    let h = Harness::mounted().await;
    h.stage
        .delayed_mark_container(&hover(300.0, 350.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");
    sleep(Duration::from_millis(DWELL_MS + 1)).await;
    assert_eq!(marked(&h).as_deref(), Some("inner"));

    let again = h
        .stage
        .delayed_mark_container(&hover(300.0, 350.0), &[])
        .expect("hooks succeed");
    assert!(again.is_none());

    h.stage.clear_container_mark();
    assert!(marked(&h).is_none());
    assert!(!h.el("inner").has_class(DEFAULT_CONTAINER_HIGHLIGHT_CLASS));
}

#[tokio::test(start_paused = true)]
async fn test_alt_type_requires_alt_key() {
    let options = StageOptions {
        container_highlight_type: ContainerHighlightType::Alt,
        ..StageOptions::default()
    };
    let h = Harness::with_options(options).await;

    let plain = h
        .stage
        .delayed_mark_container(&hover(300.0, 350.0), &[])
        .expect("hooks succeed");
    assert!(plain.is_none());

    let alt = KeyModifiers {
        alt: true,
        ..KeyModifiers::default()
    };
    let held = h
        .stage
        .delayed_mark_container(&hover(300.0, 350.0).with_modifiers(alt), &[])
        .expect("hooks succeed");
    assert!(held.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_custom_duration_and_class() {
    let options = StageOptions {
        container_highlight_duration: 200,
        container_highlight_class_name: "drop-here".to_string(),
        ..StageOptions::default()
    };
    let h = Harness::with_options(options).await;

    h.stage
        .delayed_mark_container(&hover(300.0, 350.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");
    sleep(Duration::from_millis(201)).await;

    assert_eq!(marked(&h).as_deref(), Some("inner"));
    assert!(h.el("inner").has_class("drop-here"));
}

#[tokio::test(start_paused = true)]
#[allow(deprecated)]
async fn test_legacy_name_arms_the_same_timer() {
    let h = Harness::mounted().await;

    let timer = h
        .stage
        .container_highlight_timeout(&hover(300.0, 350.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");

    assert_eq!(timer.container().id().as_str(), "inner");
}

struct BrokenContainers;

impl StageHooks for BrokenContainers {
    fn is_container(&self, _el: &ElementHandle, _event: &PointerEvent) -> StageResult<bool> {
        Err(StageError::Hook("container lookup failed".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_container_hook_failure_propagates() {
    let h = Harness::with_config(StageOptions::default(), Arc::new(BrokenContainers)).await;

    let result = h.stage.delayed_mark_container(&hover(300.0, 350.0), &[]);

    assert!(matches!(result, Err(StageError::Hook(_))));
    assert!(marked(&h).is_none());
}

// ============================================================================
// Marking during a drag
// ============================================================================

async fn press_and_drag_to(h: &Harness, x: f64, y: f64) {
    h.stage.select("node-1", None).await.expect("select succeeds");
    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Down, 60.0, 35.0))
        .await
        .expect("down");
    // First move starts the drag, the second one looks for a container.
    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Move, x - 1.0, y - 1.0))
        .await
        .expect("move");
    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Move, x, y))
        .await
        .expect("move");
}

#[tokio::test(start_paused = true)]
async fn test_drop_after_dwell_reports_parent() {
    let mut h = Harness::mounted().await;
    press_and_drag_to(&h, 301.0, 351.0).await;

    sleep(Duration::from_millis(DWELL_MS + 1)).await;
    assert_eq!(marked(&h).as_deref(), Some("inner"));
    h.drain();

    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Up, 301.0, 351.0))
        .await
        .expect("up");

    let events = h.drain();
    let [StageEvent::Update(data)] = &events[..] else {
        panic!("expected one update, got {events:?}");
    };
    assert_eq!(
        data.parent_el.as_ref().map(|el| el.id().to_string()),
        Some("inner".to_string())
    );
    assert_eq!(data.data[0].rect, Rect::new(251.0, 326.0, 100.0, 50.0));
    assert!(marked(&h).is_none());
    assert!(!h.el("inner").has_class(DEFAULT_CONTAINER_HIGHLIGHT_CLASS));
}

#[tokio::test(start_paused = true)]
async fn test_drop_before_dwell_has_no_parent() {
    let mut h = Harness::mounted().await;
    press_and_drag_to(&h, 301.0, 351.0).await;
    sleep(Duration::from_millis(DWELL_MS / 2)).await;
    h.drain();

    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Up, 301.0, 351.0))
        .await
        .expect("up");
    sleep(Duration::from_millis(DWELL_MS)).await;

    let events = h.drain();
    let [StageEvent::Update(data)] = &events[..] else {
        panic!("expected one update, got {events:?}");
    };
    assert!(data.parent_el.is_none());
    assert!(marked(&h).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dragging_off_container_cancels_pending_mark() {
    let mut h = Harness::mounted().await;
    press_and_drag_to(&h, 301.0, 351.0).await;
    sleep(Duration::from_millis(DWELL_MS / 8)).await;

    // Bare page: no container under the pointer.
    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Move, 700.0, 1000.0))
        .await
        .expect("move");
    sleep(Duration::from_millis(DWELL_MS * 2)).await;
    assert!(marked(&h).is_none());
    h.drain();

    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Up, 700.0, 1000.0))
        .await
        .expect("up");

    let events = h.drain();
    let [StageEvent::Update(data)] = &events[..] else {
        panic!("expected one update, got {events:?}");
    };
    assert!(data.parent_el.is_none());
    assert!(!h.el("inner").has_class(DEFAULT_CONTAINER_HIGHLIGHT_CLASS));
}

#[tokio::test(start_paused = true)]
async fn test_dragging_off_marked_container_drops_mark() {
    let mut h = Harness::mounted().await;
    press_and_drag_to(&h, 301.0, 351.0).await;
    sleep(Duration::from_millis(DWELL_MS + 1)).await;
    assert_eq!(marked(&h).as_deref(), Some("inner"));

    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Move, 700.0, 1000.0))
        .await
        .expect("move");

    assert!(marked(&h).is_none());
    assert!(!h.el("inner").has_class(DEFAULT_CONTAINER_HIGHLIGHT_CLASS));
    h.drain();

    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Up, 700.0, 1000.0))
        .await
        .expect("up");
    let events = h.drain();
    let [StageEvent::Update(data)] = &events[..] else {
        panic!("expected one update, got {events:?}");
    };
    assert!(data.parent_el.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_pointer_leave_cancels_pending_mark() {
    let mut h = Harness::mounted().await;
    h.stage
        .delayed_mark_container(&hover(300.0, 350.0), &[])
        .expect("hooks succeed")
        .expect("timer armed");
    h.drain();

    h.stage
        .handle_pointer(PointerEvent::new(PointerKind::Leave, 900.0, 350.0))
        .await
        .expect("leave");
    sleep(Duration::from_millis(DWELL_MS * 2)).await;

    assert!(marked(&h).is_none());
    assert_eq!(h.drain_names(), vec!["mouseleave"]);
}
