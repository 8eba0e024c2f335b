use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::domain::project::Project;
use crate::domain::ticket::iteration_label;
use crate::services::time_windows::daily_windows;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationBurndown {
    pub iteration: i64,
    pub planned: usize,
    /// Tickets still open per day, aligned with [`BurndownReport::days`].
    /// Days before the iteration started hold zero.
    pub remaining: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BurndownReport {
    pub days: Vec<String>,
    pub iterations: Vec<IterationBurndown>,
    pub max_planned: usize,
}

/// Daily burn-down of the tickets planned for each iteration from
/// `iteration_start` up to the current one. Empty when `iteration_start`
/// has no representable date.
pub fn build_burndown(project: &Project, iteration_start: i64, now: DateTime<Utc>) -> BurndownReport {
    let Some(origin) = project.iteration_start(iteration_start) else {
        warn!(iteration_start, "iteration start out of range, burn-down left empty");
        return BurndownReport::default();
    };
    let days = daily_windows(origin, now);

    let mut iterations = Vec::new();
    for iteration in iteration_start.max(1)..=i64::from(project.current_iteration()) {
        let Ok(number) = u32::try_from(iteration) else {
            continue;
        };
        let planned = project.stories().query_label_substring(&iteration_label(number));
        if planned.is_empty() {
            continue;
        }
        let Some(began) = project.iteration_start(iteration) else {
            continue;
        };
        let remaining = days
            .iter()
            .map(|day| {
                if day.start < began {
                    0
                } else {
                    planned.len() - planned.query_accepted_between(origin, day.start).len()
                }
            })
            .collect();
        iterations.push(IterationBurndown {
            iteration,
            planned: planned.len(),
            remaining,
        });
    }

    BurndownReport {
        max_planned: iterations.iter().map(|burndown| burndown.planned).max().unwrap_or(0),
        days: days.into_iter().map(|day| day.label).collect(),
        iterations,
    }
}
