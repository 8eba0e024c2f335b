use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::ticket_set::TicketSet;
use crate::services::time_windows::weekly_windows;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyLeadTime {
    pub week: String,
    pub max_days: i64,
    pub avg_days: i64,
    pub min_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadTimeReport {
    pub weeks: Vec<WeeklyLeadTime>,
    pub max_days: i64,
}

/// Days from request to acceptance for the tickets accepted each week.
///
/// Weeks without accepted tickets report zero for all three figures.
pub fn build_lead_time(
    stories: &TicketSet,
    start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> LeadTimeReport {
    let Some(start) = start else {
        return LeadTimeReport::default();
    };

    let weeks: Vec<WeeklyLeadTime> = weekly_windows(start, now)
        .into_iter()
        .map(|window| {
            let days: Vec<i64> = stories
                .query_accepted_between(window.start, window.end)
                .iter()
                .filter_map(|ticket| ticket.lead_time())
                .map(|lead_time| lead_time.num_days())
                .collect();
            let total: i64 = days.iter().sum();
            WeeklyLeadTime {
                week: window.label,
                max_days: days.iter().copied().max().unwrap_or(0).max(0),
                avg_days: if days.is_empty() { 0 } else { total / days.len() as i64 },
                min_days: days.iter().copied().min().unwrap_or(0),
            }
        })
        .collect();
    let max_days = weeks.iter().map(|week| week.max_days).max().unwrap_or(0);

    LeadTimeReport { weeks, max_days }
}
