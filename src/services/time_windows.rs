use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::domain::ticket_set::TicketSet;

/// Furthest an overview looks back, in iterations before the current one.
pub const OVERVIEW_ITERATION_SPAN: i64 = 8;
/// Furthest a planning follow-up looks back.
pub const PLANNING_ITERATION_SPAN: i64 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Where time series start: creation of the oldest accepted ticket, else of
/// the oldest active one. A configured date only wins when it is more recent.
pub fn reference_start(
    stories: &TicketSet,
    configured: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let oldest = stories
        .query_oldest_accepted()
        .or_else(|| stories.query_oldest_active())
        .map(|ticket| ticket.created_at());
    match (oldest, configured) {
        (Some(oldest), Some(configured)) => Some(oldest.max(configured)),
        (oldest, configured) => oldest.or(configured),
    }
}

/// Consecutive week long windows from `start`, as long as a window starts
/// before `now`. Labelled `Y.M.D - M.D`.
pub fn weekly_windows(start: DateTime<Utc>, now: DateTime<Utc>) -> Vec<TimeWindow> {
    windows(start, now, Duration::weeks(1), |start, end| {
        format!("{} - {}.{}", date_label(start), end.month(), end.day())
    })
}

/// Consecutive day long windows from `start`, labelled `Y.M.D`.
pub fn daily_windows(start: DateTime<Utc>, now: DateTime<Utc>) -> Vec<TimeWindow> {
    windows(start, now, Duration::days(1), |start, _| date_label(start))
}

fn windows<F>(start: DateTime<Utc>, now: DateTime<Utc>, step: Duration, label: F) -> Vec<TimeWindow>
where
    F: Fn(DateTime<Utc>, DateTime<Utc>) -> String,
{
    let mut windows = Vec::new();
    let mut current = start;
    while current < now {
        let end = current + step;
        windows.push(TimeWindow {
            label: label(current, end),
            start: current,
            end,
        });
        current = end;
    }
    windows
}

pub fn date_label(date: DateTime<Utc>) -> String {
    format!("{}.{}.{}", date.year(), date.month(), date.day())
}

/// First iteration shown by the overview: at most
/// [`OVERVIEW_ITERATION_SPAN`] iterations back, never after the current one
/// and never before iteration 1.
pub fn overview_iteration_start(current_iteration: u32, configured: Option<i64>) -> i64 {
    let current = i64::from(current_iteration);
    let earliest = current - OVERVIEW_ITERATION_SPAN;
    configured
        .unwrap_or(earliest)
        .max(earliest)
        .min(current)
        .max(1)
}

/// First iteration shown by the planning follow-up. Defaults to iteration 1.
pub fn planning_iteration_start(current_iteration: u32, configured: Option<i64>) -> i64 {
    let current = i64::from(current_iteration);
    let earliest = current - PLANNING_ITERATION_SPAN;
    match configured {
        Some(start) => start.max(earliest).min(current).max(1),
        None => 1,
    }
}
