//! Windowing: which items to materialize for a scroll position.
//!
//! Sizes come in as plain numbers; measurement only changes those numbers,
//! never the shape of the computation.

#![forbid(unsafe_code)]

use std::ops::Range;

use ghboard_core::ItemId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::Layout;

pub const DEFAULT_OVERSCAN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn distance_sq(&self, x: f32, y: f32) -> f32 {
        let (cx, cy) = self.center();
        (cx - x) * (cx - x) + (cy - y) * (cy - y)
    }
}

/// Materialized slice of a list: `start_index..end_index` plus the leading
/// offset of each item in that range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewportWindow {
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
    pub offsets: SmallVec<[f32; 32]>,
    /// Sum of every size, measured or estimated.
    pub total_size: f32,
}

impl ViewportWindow {
    pub fn range(&self) -> Range<usize> { self.start_index..self.end_index }
    pub fn len(&self) -> usize { self.end_index - self.start_index }
    pub fn is_empty(&self) -> bool { self.end_index == self.start_index }

    pub fn offset_of(&self, index: usize) -> Option<f32> {
        if self.range().contains(&index) { self.offsets.get(index - self.start_index).copied() } else { None }
    }
}

fn sanitize(size: f32) -> f32 {
    if size.is_finite() && size > 0.0 { size } else { 0.0 }
}

/// Prefix offsets over a run of sizes: `starts[i]` is where item `i` begins,
/// the final entry is the total.
#[derive(Debug, Clone, PartialEq)]
pub struct Offsets {
    starts: Vec<f32>,
}

impl Default for Offsets {
    fn default() -> Self { Self { starts: vec![0.0] } }
}

impl Offsets {
    pub fn from_sizes(sizes: &[f32]) -> Self {
        let mut starts = Vec::with_capacity(sizes.len() + 1);
        let mut acc = 0.0f32;
        starts.push(0.0);
        for s in sizes {
            acc += sanitize(*s);
            starts.push(acc);
        }
        Self { starts }
    }

    pub fn len(&self) -> usize { self.starts.len() - 1 }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
    pub fn total(&self) -> f32 { self.starts[self.len()] }

    pub fn start_of(&self, index: usize) -> Option<f32> {
        if index < self.len() { self.starts.get(index).copied() } else { None }
    }

    /// Window covering `[scroll_offset, scroll_offset + viewport_size]`
    /// widened by `overscan` entries on each side.
    pub fn window(&self, scroll_offset: f32, viewport_size: f32, overscan: usize) -> ViewportWindow {
        let n = self.len();
        let total = self.total();
        if n == 0 {
            return ViewportWindow { total_size: total, ..Default::default() };
        }
        let viewport = sanitize(viewport_size);
        let max_scroll = (total - viewport).max(0.0);
        let top = if scroll_offset.is_finite() { scroll_offset.clamp(0.0, max_scroll) } else { 0.0 };
        let bottom = top + viewport;

        // first entry whose end lies below the top edge
        let first = self.starts[1..].partition_point(|&end| end <= top).min(n - 1);
        // entries starting above the bottom edge
        let last_excl = self.starts[..n].partition_point(|&start| start < bottom);
        let visible_end = last_excl.max(first + 1).min(n);

        let start_index = first.saturating_sub(overscan);
        let end_index = visible_end.saturating_add(overscan).min(n);
        let offsets = self.starts[start_index..end_index].iter().copied().collect();
        ViewportWindow { start_index, end_index, offsets, total_size: total }
    }
}

/// Compute the window covering `[scroll_offset, scroll_offset + viewport_size]`
/// widened by `overscan` items on each side.
///
/// Scroll offsets outside `[0, total - viewport]` are clamped into it. The
/// visible part always holds at least one item when the list is non-empty.
pub fn compute_visible_range(scroll_offset: f32, viewport_size: f32, sizes: &[f32], overscan: usize) -> ViewportWindow {
    Offsets::from_sizes(sizes).window(scroll_offset, viewport_size, overscan)
}

/// Window over a laid-out collection plus a rectangle per materialized item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutWindow {
    /// Item-level window; offsets are each item's row offset.
    pub items: ViewportWindow,
    pub rects: Vec<Rect>,
}

/// Item sizes laid out in rows, with row offsets precomputed so a scroll
/// only costs a binary search plus the materialized items.
///
/// A grid row is as tall as its tallest item; rows are separated by the gap,
/// with none after the last row.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutIndex {
    layout: Layout,
    sizes: Vec<f32>,
    rows: Offsets,
}

impl LayoutIndex {
    pub fn build(layout: Layout, sizes: Vec<f32>) -> Self {
        let columns = layout.columns();
        let gap = layout.gap();
        let row_count = (sizes.len() + columns - 1) / columns;
        let row_sizes: Vec<f32> = sizes
            .chunks(columns)
            .enumerate()
            .map(|(r, row)| {
                let tallest = row.iter().copied().map(sanitize).fold(0.0f32, f32::max);
                if r + 1 < row_count { tallest + gap } else { tallest }
            })
            .collect();
        Self { layout, rows: Offsets::from_sizes(&row_sizes), sizes }
    }

    pub fn len(&self) -> usize { self.sizes.len() }
    pub fn is_empty(&self) -> bool { self.sizes.is_empty() }
    pub fn total_size(&self) -> f32 { self.rows.total() }

    /// Rows are windowed, then expanded to whole rows of items.
    pub fn window(&self, scroll_offset: f32, viewport_size: f32, overscan: usize) -> LayoutWindow {
        let columns = self.layout.columns();
        let gap = self.layout.gap();
        let rows = self.rows.window(scroll_offset, viewport_size, overscan);

        let start_index = rows.start_index * columns;
        let end_index = (rows.end_index * columns).min(self.sizes.len());
        let mut offsets: SmallVec<[f32; 32]> = SmallVec::with_capacity(end_index - start_index);
        let mut rects = Vec::with_capacity(end_index - start_index);
        let width = self.layout.column_width();
        for i in start_index..end_index {
            let y = rows.offset_of(i / columns).unwrap_or(0.0);
            let col = (i % columns) as f32;
            offsets.push(y);
            rects.push(Rect { x: col * (width + gap), y, width, height: sanitize(self.sizes[i]) });
        }
        LayoutWindow {
            items: ViewportWindow { start_index, end_index, offsets, total_size: rows.total_size },
            rects,
        }
    }
}

impl Default for LayoutIndex {
    fn default() -> Self { Self::build(Layout::List { width: 0.0 }, Vec::new()) }
}

/// Window a collection under `layout` in one shot.
pub fn compute_layout_window(
    layout: &Layout,
    scroll_offset: f32,
    viewport_size: f32,
    sizes: &[f32],
    overscan: usize,
) -> LayoutWindow {
    LayoutIndex::build(*layout, sizes.to_vec()).window(scroll_offset, viewport_size, overscan)
}

/// Per-item sizes: an estimate until the item reports a measurement.
///
/// Measurements are keyed by id so they follow items across reorders.
#[derive(Debug, Clone, Default)]
pub struct SizeCache {
    estimate: f32,
    measured: FxHashMap<ItemId, f32>,
}

impl SizeCache {
    pub fn new(estimate: f32) -> Self {
        Self { estimate: sanitize(estimate), measured: FxHashMap::default() }
    }

    pub fn estimate(&self) -> f32 { self.estimate }
    pub fn measured_len(&self) -> usize { self.measured.len() }

    pub fn size_of(&self, id: &str) -> f32 {
        self.measured.get(id).copied().unwrap_or(self.estimate)
    }

    /// Record a measured size. Returns whether the stored size changed.
    pub fn record(&mut self, id: &str, size: f32) -> bool {
        let size = sanitize(size);
        match self.measured.get(id) {
            Some(old) if *old == size => false,
            _ => {
                self.measured.insert(id.to_string(), size);
                true
            }
        }
    }

    pub fn sizes_for(&self, ids: &[ItemId]) -> Vec<f32> {
        ids.iter().map(|id| self.size_of(id)).collect()
    }

    /// Forget measurements of ids no longer present.
    pub fn retain_ids(&mut self, ids: &[ItemId]) {
        if self.measured.is_empty() {
            return;
        }
        let live: rustc_hash::FxHashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
        self.measured.retain(|k, _| live.contains(k.as_str()));
    }
}
