#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ghboard_collection::{CollectionConfig, DragOutcome, OrderedCollection};
use ghboard_core::Item;
use ghboard_persist::{load_order, order_key, KvStore, MemoryStore, WriteBehind};

#[derive(Debug, Clone, PartialEq)]
struct Pr { title: String }

fn prs(ids: &[&str]) -> Vec<Item<Pr>> {
    ids.iter().map(|id| Item::new(*id, Pr { title: format!("PR {}", id) })).collect()
}

fn order_of<T>(c: &OrderedCollection<T>) -> Vec<String> { c.ids().to_vec() }

/// Counts writes and can be switched to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    sets: AtomicUsize,
    broken: bool,
}

impl KvStore for FlakyStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        if self.broken { anyhow::bail!("storage unavailable") }
        self.inner.get(key)
    }
    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.broken { anyhow::bail!("quota exceeded") }
        self.inner.set(key, value)
    }
    fn remove(&self, key: &str) -> anyhow::Result<()> {
        if self.broken { anyhow::bail!("storage unavailable") }
        self.inner.remove(key)
    }
}

#[test]
fn order_survives_remount() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let mut c = OrderedCollection::new(CollectionConfig::pull_requests(), store.clone());
    c.set_items(prs(&["1", "2", "3", "4"]));
    assert!(c.move_item("4", "1"));
    assert_eq!(order_of(&c), vec!["4", "1", "2", "3"]);

    // Upstream removed PR 2 and opened PR 5 before the next session.
    let mut again = OrderedCollection::new(CollectionConfig::pull_requests(), store.clone());
    again.set_items(prs(&["1", "3", "5"]));
    assert_eq!(order_of(&again), vec!["1", "3", "5"]);

    let mut third = OrderedCollection::new(CollectionConfig::pull_requests(), store);
    third.set_items(prs(&["5", "4", "3", "1"]));
    assert_eq!(order_of(&third), vec!["4", "1", "3", "5"]);
    assert_eq!(third.get("4").map(|p| p.title.as_str()), Some("PR 4"));
}

#[test]
fn collections_keep_independent_keys() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let mut cards = OrderedCollection::new(CollectionConfig::stat_cards(), store.clone());
    let mut list = OrderedCollection::new(CollectionConfig::pull_requests(), store.clone());
    cards.set_items(prs(&["a", "b"]));
    list.set_items(prs(&["a", "b"]));
    cards.move_item("b", "a");
    assert_eq!(load_order(&*store, "stat-cards"), vec!["b", "a"]);
    assert!(load_order(&*store, "pull-requests").is_empty());
    assert_eq!(order_of(&list), vec!["a", "b"]);
}

#[test]
fn noop_moves_do_not_write() {
    let store = Arc::new(FlakyStore::default());
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store.clone());
    c.set_items(prs(&["a", "b", "c"]));
    assert!(!c.move_item("a", "a"));
    assert!(!c.move_item("a", "nope"));
    assert_eq!(order_of(&c), vec!["a", "b", "c"]);
    assert_eq!(store.sets.load(Ordering::SeqCst), 0);
    assert!(c.move_item("a", "b"));
    assert_eq!(store.sets.load(Ordering::SeqCst), 1);
}

#[test]
fn broken_storage_falls_back_to_source_order() {
    let store = Arc::new(FlakyStore { broken: true, ..Default::default() });
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store.clone());
    c.set_items(prs(&["a", "b", "c"]));
    assert_eq!(order_of(&c), vec!["a", "b", "c"]);
    // Write fails, in-memory order still changes.
    assert!(c.move_item("c", "a"));
    assert_eq!(order_of(&c), vec!["c", "a", "b"]);
    c.reset_order();
    assert_eq!(order_of(&c), vec!["a", "b", "c"]);
}

#[test]
fn malformed_record_falls_back_to_source_order() {
    let store = Arc::new(MemoryStore::new());
    store.set(&order_key("x"), b"{\"not\": \"an array\"}").unwrap();
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store.clone());
    c.set_items(prs(&["a", "b"]));
    assert_eq!(order_of(&c), vec!["a", "b"]);
}

#[test]
fn reset_clears_stored_order() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store.clone());
    c.set_items(prs(&["a", "b", "c"]));
    c.move_item("a", "c");
    assert_eq!(load_order(&*store, "x"), vec!["b", "c", "a"]);
    c.reset_order();
    assert!(load_order(&*store, "x").is_empty());
    assert_eq!(order_of(&c), vec!["a", "b", "c"]);
}

#[test]
fn refresh_keeps_user_order_and_appends_new_items() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store);
    c.set_items(prs(&["a", "b", "c"]));
    c.move_item("c", "a");
    c.set_items(prs(&["a", "b", "c", "d"]));
    assert_eq!(order_of(&c), vec!["c", "a", "b", "d"]);
    c.set_items(prs(&["d", "b"]));
    assert_eq!(order_of(&c), vec!["b", "d"]);
}

#[test]
fn drag_cancel_restores_exact_order() {
    let store = Arc::new(FlakyStore::default());
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store.clone());
    c.set_items(prs(&["a", "b", "c"]));
    let before = c.order().clone();
    assert_eq!(c.drag_start("a"), DragOutcome::Started);
    c.drag_over(Some("c"));
    assert_eq!(c.drag_cancel(), DragOutcome::Cancelled);
    assert_eq!(c.order(), &before);
    assert_eq!(store.sets.load(Ordering::SeqCst), 0);
}

#[test]
fn drag_drop_moves_and_persists() {
    let store = Arc::new(FlakyStore::default());
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store.clone());
    c.set_items(prs(&["a", "b", "c"]));
    c.drag_start("a");
    c.drag_over(Some("c"));
    assert_eq!(c.active_id(), Some("a"));
    assert_eq!(c.drag_end(), DragOutcome::Moved { from: 0, to: 2 });
    assert_eq!(order_of(&c), vec!["b", "c", "a"]);
    assert_eq!(c.active_id(), None);
    assert_eq!(store.sets.load(Ordering::SeqCst), 1);
}

#[test]
fn target_removed_mid_drag_cancels() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store);
    c.set_items(prs(&["a", "b", "c"]));
    c.drag_start("a");
    c.drag_over(Some("c"));
    c.set_items(prs(&["a", "b"]));
    assert_eq!(c.drag_end(), DragOutcome::Cancelled);
    assert_eq!(order_of(&c), vec!["a", "b"]);

    c.drag_start("b");
    c.set_items(prs(&["a"]));
    assert_eq!(c.active_id(), None);
}

#[test]
fn write_behind_coalesces_collection_writes() {
    let backend = Arc::new(FlakyStore::default());
    let wb = Arc::new(WriteBehind::new(backend.clone()));
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), wb.clone());
    c.set_items(prs(&["a", "b", "c", "d"]));
    c.move_item("a", "d");
    c.move_item("b", "a");
    c.move_item("c", "b");
    assert_eq!(backend.sets.load(Ordering::SeqCst), 0);
    assert_eq!(wb.flush(), 1);
    assert_eq!(backend.sets.load(Ordering::SeqCst), 1);
    assert_eq!(load_order(&*backend, "x"), order_of(&c));
}

#[test]
fn empty_first_fetch_keeps_stored_order() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    store.set(&order_key("x"), br#"["c","a","b"]"#).unwrap();
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store.clone());
    // still loading
    c.set_items(Vec::new());
    assert!(c.is_empty());
    c.set_items(prs(&["a", "b", "c"]));
    assert_eq!(order_of(&c), vec!["c", "a", "b"]);
    assert!(c.move_item("a", "b"));
    assert_eq!(order_of(&c), vec!["c", "b", "a"]);
    assert_eq!(load_order(&*store, "x"), vec!["c", "b", "a"]);
}

#[test]
fn partial_refresh_keeps_hidden_positions() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let mut c = OrderedCollection::new(CollectionConfig::new("x"), store.clone());
    c.set_items(prs(&["a", "b", "c", "d"]));
    c.move_item("d", "a");
    assert_eq!(order_of(&c), vec!["d", "a", "b", "c"]);

    // d missing from one fetch; the user reorders what is there
    c.set_items(prs(&["a", "b", "c"]));
    assert_eq!(order_of(&c), vec!["a", "b", "c"]);
    c.move_item("c", "a");
    assert_eq!(load_order(&*store, "x"), vec!["d", "c", "a", "b"]);

    c.set_items(prs(&["a", "b", "c", "d"]));
    assert_eq!(order_of(&c), vec!["d", "c", "a", "b"]);

    let mut again = OrderedCollection::new(CollectionConfig::new("x"), store);
    again.set_items(prs(&["b", "d", "a", "c"]));
    assert_eq!(order_of(&again), vec!["d", "c", "a", "b"]);
}
