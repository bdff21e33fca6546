#![forbid(unsafe_code)]

use std::sync::Arc;

use ghboard_core::{Item, ItemId};
use ghboard_persist::{clear_order, load_order, save_order, KvStore};
use metrics::counter;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::config::CollectionConfig;
use crate::drag::{closest_target, keyboard_target, DragEvent, DragMachine, DragOutcome, KeyStep};
use crate::order::{splice_order, OrderState};
use crate::window::{LayoutIndex, Rect, SizeCache, ViewportWindow};

/// An item materialized for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleItem<'a, T> {
    /// Position in display order.
    pub index: usize,
    pub id: &'a str,
    pub payload: &'a T,
    pub rect: Rect,
    /// True for the in-place copy of the item being dragged.
    pub dragging: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleWindow<'a, T> {
    pub window: ViewportWindow,
    pub items: Vec<VisibleItem<'a, T>>,
}

/// User-orderable, windowed view over a refreshed item set.
///
/// The stored order is read on the first [`set_items`](Self::set_items) and
/// stays the merge base for every later refresh, so ids missing from one
/// fetch (an empty list while loading, a partial page) get their positions
/// back when they return. The base, including ids the source currently
/// lacks, is written back after every successful move. Storage problems are
/// logged and never surface to the caller.
pub struct OrderedCollection<T> {
    config: CollectionConfig,
    store: Arc<dyn KvStore>,
    items: FxHashMap<ItemId, T>,
    source_ids: Vec<ItemId>,
    order: OrderState,
    /// Preferred sequence: the display order with absent ids kept in place.
    remembered: Vec<ItemId>,
    sizes: SizeCache,
    layout: LayoutIndex,
    drag: DragMachine,
    mounted: bool,
    scroll_offset: f32,
    viewport_size: f32,
}

impl<T> OrderedCollection<T> {
    pub fn new(config: CollectionConfig, store: Arc<dyn KvStore>) -> Self {
        let sizes = SizeCache::new(config.estimated_size);
        Self {
            config,
            store,
            items: FxHashMap::default(),
            source_ids: Vec::new(),
            order: OrderState::new(),
            remembered: Vec::new(),
            sizes,
            layout: LayoutIndex::default(),
            drag: DragMachine::new(),
            mounted: false,
            scroll_offset: 0.0,
            viewport_size: 0.0,
        }
    }

    pub fn config(&self) -> &CollectionConfig { &self.config }
    pub fn len(&self) -> usize { self.order.len() }
    pub fn is_empty(&self) -> bool { self.order.is_empty() }
    pub fn ids(&self) -> &[ItemId] { self.order.ids() }
    pub fn order(&self) -> &OrderState { &self.order }
    pub fn get(&self, id: &str) -> Option<&T> { self.items.get(id) }

    /// Items in display order.
    pub fn ordered(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.order.ids().iter().filter_map(|id| self.items.get(id).map(|p| (id.as_str(), p)))
    }

    /// Replace the source data. The first call loads the stored order; every
    /// call merges the source with it.
    pub fn set_items(&mut self, items: Vec<Item<T>>) {
        let mut source_ids = Vec::with_capacity(items.len());
        let mut map: FxHashMap<ItemId, T> = FxHashMap::default();
        let mut dups = 0usize;
        for it in items {
            if map.contains_key(&it.id) {
                dups += 1;
                continue;
            }
            source_ids.push(it.id.clone());
            map.insert(it.id, it.payload);
        }
        if dups > 0 {
            warn!(collection = %self.config.key, dups, "duplicate item ids in source; keeping first");
        }
        self.items = map;
        self.source_ids = source_ids;

        if !self.mounted {
            self.remembered = load_order(&*self.store, &self.config.key);
            self.mounted = true;
            info!(collection = %self.config.key, items = self.source_ids.len(), stored = self.remembered.len(), "collection mounted");
        }
        let next = OrderState::from_merge(&self.source_ids, &self.remembered);
        if next != self.order {
            debug!(collection = %self.config.key, items = next.len(), "order merged with refreshed source");
        }
        self.order = next;
        self.remembered = splice_order(&self.remembered, self.order.ids());
        self.sizes.retain_ids(self.order.ids());
        self.relayout();

        if let Some(active) = self.drag.active_id() {
            if !self.order.contains(active) {
                debug!(collection = %self.config.key, "dragged item disappeared; cancelling drag");
                self.drag.handle(DragEvent::Cancel, &mut self.order);
            }
        }
    }

    /// Move `source` onto `target`'s slot. No-op (and no write) when the ids
    /// are equal or either is unknown.
    pub fn move_item(&mut self, source: &str, target: &str) -> bool {
        match self.order.move_item(source, target) {
            Some((from, to)) => {
                self.after_move(from, to);
                true
            }
            None => false,
        }
    }

    /// Move `id` to absolute position `index`.
    pub fn move_to(&mut self, id: &str, index: usize) -> bool {
        match self.order.move_to(id, index) {
            Some((from, to)) => {
                self.after_move(from, to);
                true
            }
            None => false,
        }
    }

    /// Forget the stored order and fall back to source order.
    pub fn reset_order(&mut self) {
        if let Err(e) = clear_order(&*self.store, &self.config.key) {
            warn!(collection = %self.config.key, error = ?e, "clearing stored order failed");
        }
        self.order = OrderState::from_merge(&self.source_ids, &[]);
        self.remembered = self.order.ids().to_vec();
        self.relayout();
        info!(collection = %self.config.key, "order reset to source order");
    }

    fn after_move(&mut self, from: usize, to: usize) {
        counter!("order_moves_total", 1u64);
        debug!(collection = %self.config.key, from, to, "item moved");
        self.remembered = splice_order(&self.remembered, self.order.ids());
        self.relayout();
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = save_order(&*self.store, &self.config.key, &self.remembered) {
            warn!(collection = %self.config.key, error = ?e, "saving order failed; keeping in-memory order");
            counter!("order_save_errors_total", 1u64);
        }
    }

    /// Rebuild row offsets after the order or a size changed.
    fn relayout(&mut self) {
        self.layout = LayoutIndex::build(self.config.layout, self.sizes.sizes_for(self.order.ids()));
    }

    // ---- drag ----

    pub fn active_id(&self) -> Option<&str> { self.drag.active_id() }
    pub fn over_id(&self) -> Option<&str> { self.drag.state().over_id() }

    pub fn handle_drag(&mut self, event: DragEvent) -> DragOutcome {
        let outcome = self.drag.handle(event, &mut self.order);
        match outcome {
            DragOutcome::Moved { from, to } => self.after_move(from, to),
            DragOutcome::Cancelled => {
                counter!("drag_cancelled_total", 1u64);
            }
            _ => {}
        }
        outcome
    }

    pub fn drag_start(&mut self, id: &str) -> DragOutcome {
        self.handle_drag(DragEvent::Start(id.to_string()))
    }

    pub fn drag_over(&mut self, target: Option<&str>) -> DragOutcome {
        self.handle_drag(DragEvent::Over(target.map(|s| s.to_string())))
    }

    /// Pointer sensor: hover the visible item closest to the content-space
    /// point `(x, y)`.
    pub fn drag_over_point(&mut self, x: f32, y: f32) -> Option<ItemId> {
        if !self.drag.is_dragging() {
            return None;
        }
        let target = {
            let vis = self.visible();
            closest_target(x, y, vis.items.iter().map(|v| (v.id, v.rect))).map(|s| s.to_string())
        };
        self.drag_over(target.as_deref());
        target
    }

    /// Keyboard sensor: hover the slot one step from the current target
    /// (or from the dragged item when nothing is hovered yet).
    pub fn drag_key(&mut self, step: KeyStep) -> Option<ItemId> {
        let from = self.over_id().or(self.active_id())?.to_string();
        let target = keyboard_target(&self.order, &from, step, self.config.layout.columns()).map(|s| s.to_string());
        if target.is_some() {
            self.drag_over(target.as_deref());
        }
        target
    }

    /// Drop on the currently hovered item.
    pub fn drag_end(&mut self) -> DragOutcome {
        let over = self.over_id().map(|s| s.to_string());
        self.handle_drag(DragEvent::End(over))
    }

    pub fn drag_cancel(&mut self) -> DragOutcome {
        self.handle_drag(DragEvent::Cancel)
    }

    // ---- windowing ----

    pub fn set_viewport(&mut self, scroll_offset: f32, viewport_size: f32) {
        self.scroll_offset = scroll_offset;
        self.viewport_size = viewport_size;
    }

    /// Report a rendered item's actual size.
    pub fn record_size(&mut self, id: &str, size: f32) -> bool {
        let changed = self.items.contains_key(id) && self.sizes.record(id, size);
        if changed {
            self.relayout();
        }
        changed
    }

    pub fn total_size(&self) -> f32 { self.layout.total_size() }

    /// Window for the last viewport passed to [`set_viewport`](Self::set_viewport).
    pub fn visible(&self) -> VisibleWindow<'_, T> {
        self.visible_at(self.scroll_offset, self.viewport_size)
    }

    pub fn visible_at(&self, scroll_offset: f32, viewport_size: f32) -> VisibleWindow<'_, T> {
        let lw = self.layout.window(scroll_offset, viewport_size, self.config.overscan);
        let active = self.drag.active_id();
        let mut items = Vec::with_capacity(lw.items.len());
        for (index, rect) in lw.items.range().zip(lw.rects.iter().copied()) {
            let id = self.order.ids()[index].as_str();
            if let Some(payload) = self.items.get(id) {
                items.push(VisibleItem { index, id, payload, rect, dragging: active == Some(id) });
            }
        }
        VisibleWindow { window: lw.items, items }
    }
}
