//! ghboard stats: derived activity statistics over a contribution calendar.
//!
//! Input is copied and sorted by date first (O(n log n)); the caller's slice
//! is never mutated and need not be chronological. Everything after the sort
//! is a single linear pass.

#![forbid(unsafe_code)]

use chrono::NaiveDate;
use ghboard_core::{ActivityStats, BusiestWeekday, ContributionDay, PeakDay, Streak};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sort by date and collapse repeated dates (counts summed, first weekday
/// label kept).
pub fn normalize(days: &[ContributionDay]) -> Vec<ContributionDay> {
    let mut sorted = days.to_vec();
    sorted.sort_by_key(|d| d.date);
    let mut out: Vec<ContributionDay> = Vec::with_capacity(sorted.len());
    for d in sorted {
        match out.last_mut() {
            Some(last) if last.date == d.date => last.count = last.count.saturating_add(d.count),
            _ => out.push(d),
        }
    }
    out
}

fn is_next_day(prev: NaiveDate, date: NaiveDate) -> bool {
    prev.succ_opt() == Some(date)
}

/// Earliest day holding the maximum positive count.
fn peak_day(sorted: &[ContributionDay]) -> Option<PeakDay> {
    let mut best: Option<PeakDay> = None;
    for d in sorted.iter().filter(|d| d.count > 0) {
        match best {
            Some(b) if b.count >= d.count => {}
            _ => best = Some(PeakDay { date: d.date, count: d.count }),
        }
    }
    best
}

/// Longest run of calendar-adjacent days with a positive count, and the run
/// ending on the last day of the series.
fn streaks(sorted: &[ContributionDay]) -> (u32, u32) {
    let mut current = 0u32;
    let mut best = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for d in sorted {
        if d.count == 0 {
            current = 0;
        } else if prev.map(|p| is_next_day(p, d.date)).unwrap_or(false) {
            current += 1;
        } else {
            // first day, or a gap in the series
            current = 1;
        }
        best = best.max(current);
        prev = Some(d.date);
    }
    (best, current)
}

/// Contribution totals per weekday label (0 = Sunday). Days with an
/// out-of-range label are skipped.
pub fn weekday_totals(days: &[ContributionDay]) -> [u64; 7] {
    let mut totals = [0u64; 7];
    for d in days {
        match totals.get_mut(d.weekday as usize) {
            Some(t) => *t += u64::from(d.count),
            None => debug!(date = %d.date, weekday = d.weekday, "weekday label out of range; skipped"),
        }
    }
    totals
}

/// Weekday with the largest total; the lowest index wins ties.
fn busiest_weekday(totals: &[u64; 7]) -> Option<BusiestWeekday> {
    let mut best: Option<BusiestWeekday> = None;
    for (weekday, &total) in totals.iter().enumerate() {
        if total == 0 {
            continue;
        }
        match best {
            Some(b) if b.total_count >= total => {}
            _ => best = Some(BusiestWeekday { weekday: weekday as u8, total_count: total }),
        }
    }
    best
}

fn aggregate_sorted(sorted: &[ContributionDay]) -> ActivityStats {
    let (longest, _) = streaks(sorted);
    ActivityStats {
        peak_day: peak_day(sorted),
        longest_streak: (longest > 0).then_some(Streak { days: longest }),
        busiest_weekday: busiest_weekday(&weekday_totals(sorted)),
    }
}

/// Peak day, longest streak and busiest weekday. Empty or all-zero input
/// yields all `None`.
pub fn aggregate(days: &[ContributionDay]) -> ActivityStats {
    aggregate_sorted(&normalize(days))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CalendarSummary {
    pub stats: ActivityStats,
    pub total_contributions: u64,
    pub active_days: usize,
    /// Run of active days ending on the latest date in the series.
    pub current_streak: u32,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// [`aggregate`] plus totals for headline cards.
pub fn summarize(days: &[ContributionDay]) -> CalendarSummary {
    let sorted = normalize(days);
    let (_, current) = streaks(&sorted);
    let summary = CalendarSummary {
        stats: aggregate_sorted(&sorted),
        total_contributions: sorted.iter().map(|d| u64::from(d.count)).sum(),
        active_days: sorted.iter().filter(|d| d.count > 0).count(),
        current_streak: current,
        first_date: sorted.first().map(|d| d.date),
        last_date: sorted.last().map(|d| d.date),
    };
    debug!(days = sorted.len(), total = summary.total_contributions, "calendar summarized");
    summary
}
