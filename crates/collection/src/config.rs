//! Per-collection configuration.
//!
//! Each collection instance carries its own storage key, size estimate and
//! layout; the stat-card grid and the pull-request list differ in all three.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::window::DEFAULT_OVERSCAN;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    /// One item per row.
    List { width: f32 },
    /// Row-major grid. Each row is as tall as its tallest item.
    Grid { columns: usize, column_width: f32, gap: f32 },
}

impl Layout {
    pub fn columns(&self) -> usize {
        match self {
            Layout::List { .. } => 1,
            Layout::Grid { columns, .. } => (*columns).max(1),
        }
    }

    pub fn column_width(&self) -> f32 {
        match self {
            Layout::List { width } => *width,
            Layout::Grid { column_width, .. } => *column_width,
        }
    }

    pub fn gap(&self) -> f32 {
        match self {
            Layout::List { .. } => 0.0,
            Layout::Grid { gap, .. } => gap.max(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection identifier; also names the stored order record.
    pub key: String,
    /// Size assumed for items that have not reported a measurement.
    pub estimated_size: f32,
    pub overscan: usize,
    pub layout: Layout,
}

impl CollectionConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            estimated_size: 128.0,
            overscan: DEFAULT_OVERSCAN,
            layout: Layout::List { width: 640.0 },
        }
    }

    /// Statistics cards: a three-column grid.
    pub fn stat_cards() -> Self {
        Self::new("stat-cards").with_layout(Layout::Grid { columns: 3, column_width: 280.0, gap: 16.0 })
    }

    /// Pull-request list: one row per PR.
    pub fn pull_requests() -> Self {
        Self::new("pull-requests").with_estimated_size(96.0)
    }

    pub fn with_estimated_size(mut self, size: f32) -> Self {
        self.estimated_size = size;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Resolve a preset by collection key; unknown keys get a plain list.
    pub fn preset(key: &str) -> Self {
        match key {
            "stat-cards" => Self::stat_cards(),
            "pull-requests" => Self::pull_requests(),
            other => Self::new(other),
        }
    }
}
