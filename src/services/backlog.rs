use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::ticket_set::TicketSet;
use crate::services::time_windows::date_label;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacklogDay {
    pub day: String,
    pub opened: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BacklogReport {
    pub days: Vec<BacklogDay>,
}

/// Cumulative opened and closed ticket counts per day, starting at the
/// creation of the oldest ticket still open. Empty when nothing is open.
pub fn build_backlog(stories: &TicketSet, now: DateTime<Utc>) -> BacklogReport {
    let Some(oldest) = stories.query_oldest_active().map(|ticket| ticket.created_at()) else {
        return BacklogReport::default();
    };

    let opened_before = stories
        .query_created_between(DateTime::<Utc>::UNIX_EPOCH, oldest)
        .len();
    let closed_before = stories
        .query_accepted_between(DateTime::<Utc>::UNIX_EPOCH, oldest)
        .len();

    let span = (now - oldest).num_days().max(0);
    let days = (0..=span)
        .map(|offset| {
            let day = oldest + Duration::days(offset);
            BacklogDay {
                day: date_label(day),
                opened: stories.query_created_between(oldest, day).len() + opened_before,
                closed: stories.query_created_and_accepted_between(oldest, day).len()
                    + closed_before,
            }
        })
        .collect();

    BacklogReport { days }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{accepted, at, open, ticket_set};

    #[test]
    fn accumulates_from_the_oldest_open_ticket() {
        let stories = ticket_set(vec![
            accepted(1, "feature", at(2021, 12, 20), at(2021, 12, 30)),
            open(2, "bug", "started", at(2022, 1, 3)),
            accepted(3, "chore", at(2022, 1, 3) + Duration::hours(1), at(2022, 1, 4) + Duration::hours(1)),
            open(4, "feature", "unstarted", at(2022, 1, 4) + Duration::hours(2)),
        ]);

        let report = build_backlog(&stories, at(2022, 1, 6));

        let summary: Vec<_> = report
            .days
            .iter()
            .map(|day| (day.day.as_str(), day.opened, day.closed))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("2022.1.3", 1, 1),
                ("2022.1.4", 2, 1),
                ("2022.1.5", 3, 2),
                ("2022.1.6", 3, 2),
            ]
        );
    }

    #[test]
    fn nothing_open_means_empty_report() {
        let stories = ticket_set(vec![accepted(1, "feature", at(2022, 1, 1), at(2022, 1, 2))]);
        assert!(build_backlog(&stories, at(2022, 1, 6)).days.is_empty());
    }
}
