use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::ticket::TicketType;
use crate::domain::ticket_set::TicketSet;
use crate::services::time_windows::weekly_windows;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VelocityReport {
    pub weeks: Vec<String>,
    /// Smoothed sum of accepted feature estimates per week.
    pub story_points: Vec<i64>,
    /// Smoothed number of accepted features per week.
    pub story_count: Vec<i64>,
    /// Highest raw weekly point total.
    pub max_points: i64,
}

/// Weekly feature velocity since `start`, in points and in stories.
pub fn build_velocity(
    stories: &TicketSet,
    start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> VelocityReport {
    let Some(start) = start else {
        return VelocityReport::default();
    };
    let features = stories.query_type(TicketType::Feature);
    let windows = weekly_windows(start, now);

    let mut points = Vec::with_capacity(windows.len());
    let mut counts = Vec::with_capacity(windows.len());
    for window in &windows {
        let delivered = features.query_accepted_between(window.start, window.end);
        points.push(i64::from(delivered.total_estimate()));
        counts.push(delivered.len() as i64);
    }

    VelocityReport {
        weeks: windows.into_iter().map(|window| window.label).collect(),
        max_points: points.iter().copied().max().unwrap_or(0),
        story_points: calculate_velocity(&points),
        story_count: calculate_velocity(&counts),
    }
}

/// Smooths a per-period series with a cascaded three point average.
///
/// Series of three entries or fewer come back unchanged. Beyond that the first
/// three entries are kept and every later entry averages its raw value with
/// the two previous *smoothed* values, rounding down.
pub fn calculate_velocity(base: &[i64]) -> Vec<i64> {
    if base.len() <= 3 {
        return base.to_vec();
    }

    let mut result = base[..3].to_vec();
    for i in 3..base.len() {
        let sum = base[i] + result[i - 1] + result[i - 2];
        result.push(sum.div_euclid(3));
    }
    result
}
