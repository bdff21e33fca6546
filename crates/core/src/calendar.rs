//! Contribution calendar input shapes.
//!
//! Accepts either a flat list of days or the GitHub `contributionCalendar`
//! object (`weeks[].contributionDays[]`) and flattens it into
//! [`ContributionDay`] values.

#![forbid(unsafe_code)]

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::ContributionDay;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub contribution_count: u32,
    pub weekday: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWeek {
    #[serde(default)]
    pub contribution_days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionCalendar {
    #[serde(default)]
    pub total_contributions: Option<u64>,
    #[serde(default)]
    pub weeks: Vec<CalendarWeek>,
}

impl ContributionCalendar {
    pub fn into_days(self) -> Vec<ContributionDay> {
        self.weeks
            .into_iter()
            .flat_map(|w| w.contribution_days)
            .map(|d| ContributionDay { date: d.date, count: d.contribution_count, weekday: d.weekday })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CalendarDoc {
    Days(Vec<ContributionDay>),
    Wrapped {
        #[serde(rename = "contributionCalendar")]
        contribution_calendar: ContributionCalendar,
    },
    // Must stay last: every field defaults, so it accepts any object.
    Calendar(ContributionCalendar),
}

/// Parse calendar JSON in any of the accepted shapes.
pub fn parse_days(json: &str) -> Result<Vec<ContributionDay>, serde_json::Error> {
    let doc: CalendarDoc = serde_json::from_str(json)?;
    let days = match doc {
        CalendarDoc::Days(days) => days,
        CalendarDoc::Wrapped { contribution_calendar } => contribution_calendar.into_days(),
        CalendarDoc::Calendar(cal) => cal.into_days(),
    };
    debug!(days = days.len(), "parsed contribution calendar");
    Ok(days)
}
