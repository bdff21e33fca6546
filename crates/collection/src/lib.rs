//! ghboard collections: ordered, windowed item lists with durable user order.
//!
//! - `order`: merge of stored order with fresh source data, moves
//! - `window`: which items to materialize for a scroll position
//! - `drag`: the drag-to-reorder state machine and drop-target resolution
//! - `collection`: the pieces above bound to a `KvStore`

#![forbid(unsafe_code)]

pub mod collection;
pub mod config;
pub mod drag;
pub mod order;
pub mod window;

pub use collection::{OrderedCollection, VisibleItem, VisibleWindow};
pub use config::{CollectionConfig, Layout};
pub use drag::{DragEvent, DragMachine, DragOutcome, DragState, KeyStep};
pub use order::{merge_order, splice_order, OrderState};
pub use window::{
    compute_layout_window, compute_visible_range, LayoutIndex, LayoutWindow, Offsets, Rect, SizeCache, ViewportWindow,
    DEFAULT_OVERSCAN,
};
