use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::ticket::TicketType;
use crate::domain::ticket_set::TicketSet;
use crate::services::time_windows::{weekly_windows, TimeWindow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowCounts {
    pub created: usize,
    pub accepted: usize,
}

impl FlowCounts {
    fn within(stories: &TicketSet, window: &TimeWindow) -> Self {
        Self {
            created: stories.query_created_between(window.start, window.end).len(),
            accepted: stories.query_accepted_between(window.start, window.end).len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyThroughput {
    pub week: String,
    pub all: FlowCounts,
    pub features: FlowCounts,
    pub bugs: FlowCounts,
    pub chores: FlowCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThroughputReport {
    pub weeks: Vec<WeeklyThroughput>,
    /// Highest weekly created or accepted count over all stories.
    pub max: usize,
}

/// Requested versus accepted stories per week since `start`.
pub fn build_throughput(
    stories: &TicketSet,
    start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ThroughputReport {
    let Some(start) = start else {
        return ThroughputReport::default();
    };
    let features = stories.query_type(TicketType::Feature);
    let bugs = stories.query_type(TicketType::Bug);
    let chores = stories.query_type(TicketType::Chore);

    let weeks: Vec<WeeklyThroughput> = weekly_windows(start, now)
        .iter()
        .map(|window| WeeklyThroughput {
            week: window.label.clone(),
            all: FlowCounts::within(stories, window),
            features: FlowCounts::within(&features, window),
            bugs: FlowCounts::within(&bugs, window),
            chores: FlowCounts::within(&chores, window),
        })
        .collect();
    let max = weeks
        .iter()
        .map(|week| week.all.created.max(week.all.accepted))
        .max()
        .unwrap_or(0);

    ThroughputReport { weeks, max }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{accepted, at, open, ticket_set};

    #[test]
    fn counts_created_and_accepted_per_week_and_type() {
        let stories = ticket_set(vec![
            accepted(1, "feature", at(2022, 1, 4), at(2022, 1, 5)),
            accepted(2, "bug", at(2022, 1, 4), at(2022, 1, 12)),
            open(3, "chore", "started", at(2022, 1, 11)),
            open(4, "feature", "unstarted", at(2022, 1, 12)),
        ]);

        let report = build_throughput(&stories, Some(at(2022, 1, 3)), at(2022, 1, 15));

        assert_eq!(report.weeks.len(), 2);
        let first = &report.weeks[0];
        assert_eq!(first.week, "2022.1.3 - 1.10");
        assert_eq!(first.all, FlowCounts { created: 2, accepted: 1 });
        assert_eq!(first.features, FlowCounts { created: 1, accepted: 1 });
        assert_eq!(first.bugs, FlowCounts { created: 1, accepted: 0 });
        let second = &report.weeks[1];
        assert_eq!(second.all, FlowCounts { created: 2, accepted: 1 });
        assert_eq!(second.chores, FlowCounts { created: 1, accepted: 0 });
        assert_eq!(second.bugs, FlowCounts { created: 0, accepted: 1 });
        assert_eq!(report.max, 2);
    }

    #[test]
    fn window_boundaries_are_exclusive() {
        let stories = ticket_set(vec![accepted(1, "feature", at(2022, 1, 3), at(2022, 1, 10))]);

        let report = build_throughput(&stories, Some(at(2022, 1, 3)), at(2022, 1, 15));

        assert_eq!(report.weeks[0].all, FlowCounts::default());
        assert_eq!(report.weeks[1].all, FlowCounts::default());
    }

    #[test]
    fn no_start_means_no_weeks() {
        let report = build_throughput(&TicketSet::new(), None, at(2022, 1, 15));
        assert_eq!(report, ThroughputReport::default());
    }
}
