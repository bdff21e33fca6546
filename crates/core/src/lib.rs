//! ghboard core types: collection items, contribution days and activity stats.

#![forbid(unsafe_code)]

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub mod calendar;
pub mod error;

pub use error::OrderRecordError;

/// Stable identifier of an item within one collection.
pub type ItemId = String;

/// Element of an ordered collection. The payload is opaque to ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item<T> {
    pub id: ItemId,
    pub payload: T,
}

impl<T> Item<T> {
    pub fn new(id: impl Into<ItemId>, payload: T) -> Self {
        Self { id: id.into(), payload }
    }
}

/// One calendar day of contribution activity.
///
/// `weekday` follows the 0..=6 encoding with 0 = Sunday.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: u32,
    pub weekday: u8,
}

impl ContributionDay {
    /// Build a day whose weekday label is derived from the date.
    pub fn from_date(date: NaiveDate, count: u32) -> Self {
        Self { date, count, weekday: date.weekday().num_days_from_sunday() as u8 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeakDay {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Streak {
    pub days: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusiestWeekday {
    pub weekday: u8,
    pub total_count: u64,
}

/// Derived statistics over a contribution calendar. Every field is `None`
/// when the calendar holds no contributions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ActivityStats {
    pub peak_day: Option<PeakDay>,
    pub longest_streak: Option<Streak>,
    pub busiest_weekday: Option<BusiestWeekday>,
}

impl ActivityStats {
    pub fn is_empty(&self) -> bool {
        self.peak_day.is_none() && self.longest_streak.is_none() && self.busiest_weekday.is_none()
    }
}

pub const WEEKDAY_NAMES: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

/// Human label for a 0..=6 weekday index.
pub fn weekday_name(weekday: u8) -> &'static str {
    WEEKDAY_NAMES.get(weekday as usize).copied().unwrap_or("?")
}

pub mod prelude {
    pub use super::{ActivityStats, BusiestWeekday, ContributionDay, Item, ItemId, PeakDay, Streak};
}
