#![forbid(unsafe_code)]

use std::sync::Arc;

use ghboard_collection::{CollectionConfig, DragOutcome, KeyStep, Layout, OrderedCollection};
use ghboard_core::Item;
use ghboard_persist::{KvStore, MemoryStore};

fn list(n: usize) -> OrderedCollection<usize> {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let cfg = CollectionConfig::new("prs").with_estimated_size(128.0).with_layout(Layout::List { width: 600.0 });
    let mut c = OrderedCollection::new(cfg, store);
    c.set_items((0..n).map(|i| Item::new(format!("pr-{}", i), i)).collect());
    c
}

#[test]
fn two_hundred_items_render_a_small_window() {
    let mut c = list(200);
    c.set_viewport(0.0, 700.0);
    let vis = c.visible();
    assert_eq!(vis.window.range(), 0..11);
    assert_eq!(vis.items.len(), 11);
    assert_eq!(vis.items[0].id, "pr-0");
    assert_eq!(vis.items[10].rect.y, 1280.0);
    assert_eq!(c.total_size(), 200.0 * 128.0);
}

#[test]
fn measurements_refine_total_and_follow_reorders() {
    let mut c = list(200);
    assert!(c.record_size("pr-0", 200.0));
    assert!(!c.record_size("missing", 50.0));
    assert_eq!(c.total_size(), 199.0 * 128.0 + 200.0);

    c.move_item("pr-0", "pr-2");
    let vis = c.visible_at(0.0, 300.0);
    // pr-1, pr-2 at 128 each, then the measured pr-0
    assert_eq!(vis.items[2].id, "pr-0");
    assert_eq!(vis.items[2].rect.y, 256.0);
    assert_eq!(vis.items[2].rect.height, 200.0);
}

#[test]
fn scrolling_deep_keeps_window_bounded() {
    let c = list(5_000);
    let vis = c.visible_at(128.0 * 2_500.0, 700.0);
    assert_eq!(vis.window.start_index, 2_495);
    assert_eq!(vis.window.end_index, 2_511);
    assert!(vis.items.iter().all(|v| v.index >= 2_495 && v.index < 2_511));
}

#[test]
fn grid_cards_window_by_row() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let cfg = CollectionConfig::stat_cards().with_estimated_size(100.0).with_overscan(0);
    let mut c = OrderedCollection::new(cfg, store);
    c.set_items((0..12).map(|i| Item::new(format!("card-{}", i), i)).collect());
    // rows of 116 (100 + 16 gap), no gap after the last row
    let vis = c.visible_at(0.0, 200.0);
    assert_eq!(vis.window.range(), 0..6);
    assert_eq!(vis.items[4].rect.x, 296.0);
    assert_eq!(vis.items[4].rect.y, 116.0);
    assert_eq!(c.total_size(), 3.0 * 116.0 + 100.0);
}

#[test]
fn pointer_drag_resolves_closest_visible_item() {
    let mut c = list(50);
    c.set_viewport(0.0, 700.0);
    assert_eq!(c.drag_over_point(10.0, 10.0), None);
    c.drag_start("pr-0");
    assert!(c.visible().items[0].dragging);
    assert_eq!(c.drag_over_point(300.0, 128.0 * 3.0 + 70.0).as_deref(), Some("pr-3"));
    assert_eq!(c.drag_end(), DragOutcome::Moved { from: 0, to: 3 });
    assert_eq!(&c.ids()[..4], &["pr-1", "pr-2", "pr-3", "pr-0"]);
}

#[test]
fn pointer_far_below_viewport_only_sees_windowed_items() {
    let mut c = list(200);
    c.set_viewport(0.0, 700.0);
    c.drag_start("pr-0");
    // Item 150 is not materialized; the nearest visible one is the last in the window.
    assert_eq!(c.drag_over_point(300.0, 128.0 * 150.0).as_deref(), Some("pr-10"));
    c.drag_cancel();
    assert_eq!(c.ids()[0], "pr-0");
}

#[test]
fn keyboard_drag_steps_through_grid() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let mut c = OrderedCollection::new(CollectionConfig::stat_cards(), store);
    c.set_items((0..6).map(|i| Item::new(format!("c{}", i), i)).collect());
    c.drag_start("c0");
    assert_eq!(c.drag_key(KeyStep::Down).as_deref(), Some("c3"));
    assert_eq!(c.drag_key(KeyStep::Right).as_deref(), Some("c4"));
    assert_eq!(c.drag_key(KeyStep::Down), None);
    assert_eq!(c.over_id(), Some("c4"));
    assert_eq!(c.drag_end(), DragOutcome::Moved { from: 0, to: 4 });
    assert_eq!(c.ids(), &["c1", "c2", "c3", "c4", "c0", "c5"]);
}

#[test]
fn layout_follows_measurements_moves_and_refreshes() {
    let mut c = list(10);
    assert_eq!(c.total_size(), 1280.0);
    c.record_size("pr-9", 28.0);
    assert_eq!(c.total_size(), 1180.0);
    c.move_item("pr-9", "pr-0");
    let vis = c.visible_at(0.0, 100.0);
    assert_eq!(vis.items[0].id, "pr-9");
    assert_eq!(vis.items[1].rect.y, 28.0);
    c.set_items((0..5).map(|i| Item::new(format!("pr-{}", i), i)).collect());
    assert_eq!(c.total_size(), 5.0 * 128.0);
}
