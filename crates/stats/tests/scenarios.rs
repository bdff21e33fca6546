#![forbid(unsafe_code)]

use chrono::{Duration, NaiveDate};
use ghboard_core::{calendar::parse_days, ContributionDay, PeakDay, Streak};
use ghboard_stats::{aggregate, summarize, weekday_totals};

fn start() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() }

fn series(counts: &[u32]) -> Vec<ContributionDay> {
    counts
        .iter()
        .enumerate()
        .map(|(i, c)| ContributionDay::from_date(start() + Duration::days(i as i64), *c))
        .collect()
}

#[test]
fn five_day_window() {
    let days = series(&[3, 1, 0, 5, 2]);
    let stats = aggregate(&days);
    assert_eq!(stats.peak_day, Some(PeakDay { date: start() + Duration::days(3), count: 5 }));
    assert_eq!(stats.longest_streak, Some(Streak { days: 2 }));
    assert!(stats.busiest_weekday.is_some());
}

#[test]
fn empty_and_idle_years_have_no_stats() {
    assert!(aggregate(&[]).is_empty());
    let idle = series(&[0; 365]);
    assert!(aggregate(&idle).is_empty());
    assert_eq!(weekday_totals(&idle), [0; 7]);
    assert_eq!(summarize(&idle).active_days, 0);
}

#[test]
fn peak_tie_goes_to_earliest_date() {
    let days = series(&[4, 0, 4, 4]);
    let stats = aggregate(&days);
    assert_eq!(stats.peak_day.map(|p| p.date), Some(start()));
    assert_eq!(stats.longest_streak, Some(Streak { days: 2 }));
}

#[test]
fn input_order_does_not_matter() {
    let mut days = series(&[1, 2, 3, 0, 7, 7, 1]);
    let expected = aggregate(&days);
    days.reverse();
    let snapshot = days.clone();
    assert_eq!(aggregate(&days), expected);
    // caller's slice is untouched
    assert_eq!(days, snapshot);
}

#[test]
fn every_day_active_for_a_year() {
    let days = series(&[1; 366]);
    let summary = summarize(&days);
    assert_eq!(summary.stats.longest_streak, Some(Streak { days: 366 }));
    assert_eq!(summary.current_streak, 366);
    assert_eq!(summary.total_contributions, 366);
    // 2024 starts on a Monday and has 366 days, so Monday and Tuesday tie at 53
    assert_eq!(summary.stats.busiest_weekday.map(|b| b.weekday), Some(1));
}

#[test]
fn aggregates_a_parsed_calendar() {
    let json = r#"{"weeks":[{"contributionDays":[
        {"date":"2024-03-03","contributionCount":2,"weekday":0},
        {"date":"2024-03-04","contributionCount":6,"weekday":1},
        {"date":"2024-03-05","contributionCount":1,"weekday":2}
    ]}]}"#;
    let days = parse_days(json).unwrap();
    let stats = aggregate(&days);
    assert_eq!(stats.peak_day.map(|p| p.count), Some(6));
    assert_eq!(stats.longest_streak, Some(Streak { days: 3 }));
    assert_eq!(stats.busiest_weekday.map(|b| b.total_count), Some(6));
}
