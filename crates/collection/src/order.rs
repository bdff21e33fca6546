//! Display order: merging a stored order with fresh source data, and moves.

#![forbid(unsafe_code)]

use ghboard_core::ItemId;
use rustc_hash::FxHashSet;

/// Reconcile a stored order `persisted` with the current `source` ids.
///
/// Known ids keep their stored order, ids new to the source follow in source
/// order. Stale and repeated ids are dropped, so the result is always a
/// permutation of the distinct ids in `source`.
pub fn merge_order(source: &[ItemId], persisted: &[ItemId]) -> Vec<ItemId> {
    let live: FxHashSet<&str> = source.iter().map(|s| s.as_str()).collect();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut out = Vec::with_capacity(live.len());
    for id in persisted {
        if live.contains(id.as_str()) && seen.insert(id.as_str()) {
            out.push(id.clone());
        }
    }
    for id in source {
        if seen.insert(id.as_str()) {
            out.push(id.clone());
        }
    }
    out
}

/// Write `order` back into `base`, keeping ids of `base` that are absent from
/// `order` in their slots.
///
/// Slots of `base` held by ids present in `order` are refilled with `order`
/// in sequence; ids of `order` unknown to `base` follow at the end. Repeated
/// ids in `base` keep their first occurrence.
pub fn splice_order(base: &[ItemId], order: &[ItemId]) -> Vec<ItemId> {
    let live: FxHashSet<&str> = order.iter().map(|s| s.as_str()).collect();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut next = order.iter();
    let mut out = Vec::with_capacity(base.len().max(order.len()));
    for id in base {
        if !seen.insert(id.as_str()) {
            continue;
        }
        if live.contains(id.as_str()) {
            if let Some(n) = next.next() {
                out.push(n.clone());
            }
        } else {
            out.push(id.clone());
        }
    }
    out.extend(next.cloned());
    out
}

/// Move the element at `from` so it ends up at `to`, shifting the rest.
pub fn array_move<T>(v: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= v.len() || to >= v.len() {
        return;
    }
    let x = v.remove(from);
    v.insert(to, x);
}

/// User-chosen order of item ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderState {
    ids: Vec<ItemId>,
}

impl OrderState {
    pub fn new() -> Self { Self::default() }

    pub fn from_merge(source: &[ItemId], persisted: &[ItemId]) -> Self {
        Self { ids: merge_order(source, persisted) }
    }

    pub fn ids(&self) -> &[ItemId] { &self.ids }
    pub fn len(&self) -> usize { self.ids.len() }
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|x| x == id)
    }

    pub fn contains(&self, id: &str) -> bool { self.position(id).is_some() }

    /// Move `source` into the slot currently held by `target`. Moving down
    /// lands after the target, moving up lands before it.
    ///
    /// Not idempotent: once moved, `target` sits on the other side of
    /// `source`, so repeating the call moves it back. Use
    /// [`move_to`](Self::move_to) for a repeatable positional move.
    ///
    /// Returns `(from, to)` when the order changed.
    pub fn move_item(&mut self, source: &str, target: &str) -> Option<(usize, usize)> {
        if source == target {
            return None;
        }
        let from = self.position(source)?;
        let to = self.position(target)?;
        array_move(&mut self.ids, from, to);
        Some((from, to))
    }

    /// Move `id` to absolute position `index` (clamped to the last slot).
    pub fn move_to(&mut self, id: &str, index: usize) -> Option<(usize, usize)> {
        let from = self.position(id)?;
        let to = index.min(self.ids.len().saturating_sub(1));
        if from == to {
            return None;
        }
        array_move(&mut self.ids, from, to);
        Some((from, to))
    }
}
