use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::project::Project;
use crate::domain::ticket::TicketType;
use crate::domain::ticket_set::TicketSet;
use crate::services::distribution::{label_distribution, state_distribution, type_distribution, Slice};
use crate::services::report_yaml::{ticket_rows, TicketRow};
use crate::services::time_windows::weekly_windows;
use crate::services::velocity_calculation::calculate_velocity;

/// Current work of one developer compared with what they delivered so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperLoad {
    pub name: String,
    pub delivered_tickets: usize,
    pub delivered_points: u32,
    pub current_tickets: usize,
    pub current_points: u32,
    pub iteration_days: i64,
    pub avg_points_per_ticket: Option<f64>,
    pub avg_tickets_per_iteration: Option<f64>,
    /// Around 1.0 when the current assignment matches the usual pace.
    /// Absent when there is no history to compare against.
    pub load: Option<f64>,
}

/// Load of every developer who owns open work.
pub fn build_developer_loads(project: &Project, now: DateTime<Utc>) -> Vec<DeveloperLoad> {
    project
        .stories()
        .query_active()
        .query_unique_owners()
        .into_iter()
        .map(|name| developer_load(project, name, now))
        .collect()
}

fn developer_load(project: &Project, name: String, now: DateTime<Utc>) -> DeveloperLoad {
    let owned = project.stories().query_owner_substring(&name);
    let since = owned
        .query_oldest_accepted()
        .and_then(|ticket| ticket.accepted_at())
        .unwrap_or(now);

    let delivered = owned.query_accepted_between(since, now);
    let current = owned.query_active();
    let delivered_points = feature_points(&delivered);
    let current_points = feature_points(&current);
    let iteration_days = project.iteration_length().num_days();
    let history_days = (now - since).num_days();

    let avg_points_per_ticket =
        ratio(f64::from(delivered_points), delivered.len() as f64);
    let avg_tickets_per_iteration = ratio(
        delivered.len() as f64 * iteration_days as f64,
        history_days as f64,
    );
    let current_points_per_ticket = ratio(f64::from(current_points), current.len() as f64);

    let point_ratio = match (current_points_per_ticket, avg_points_per_ticket) {
        (Some(current), Some(average)) => ratio(current, average),
        _ => None,
    };
    let ticket_ratio =
        avg_tickets_per_iteration.and_then(|average| ratio(current.len() as f64, average));
    let present: Vec<f64> = [point_ratio, ticket_ratio].into_iter().flatten().collect();
    let load = if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    };

    DeveloperLoad {
        name,
        delivered_tickets: delivered.len(),
        delivered_points,
        current_tickets: current.len(),
        current_points,
        iteration_days,
        avg_points_per_ticket,
        avg_tickets_per_iteration,
        load,
    }
}

fn feature_points(stories: &TicketSet) -> u32 {
    stories.query_type(TicketType::Feature).total_estimate()
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeveloperWeek {
    pub week: String,
    pub all: usize,
    pub bugs: usize,
    pub chores: usize,
    pub features: usize,
    pub feature_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperDetail {
    pub name: String,
    pub types: Vec<Slice>,
    pub states: Vec<Slice>,
    pub labels: Vec<Slice>,
    pub weeks: Vec<DeveloperWeek>,
    pub velocity_points: Vec<i64>,
    pub velocity_count: Vec<i64>,
    pub open_stories: Vec<TicketRow>,
}

/// Breakdown of one developer's open work and weekly deliveries since `start`.
pub fn build_developer_detail(
    project: &Project,
    name: &str,
    special_labels: &[String],
    start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DeveloperDetail {
    let open = project.stories().query_active().query_owner_substring(name);
    let owned = project.stories().query_owner_substring(name);

    let weeks: Vec<DeveloperWeek> = start
        .map(|start| weekly_windows(start, now))
        .unwrap_or_default()
        .into_iter()
        .map(|window| {
            let accepted = owned.query_accepted_between(window.start, window.end);
            let features = accepted.query_type(TicketType::Feature);
            DeveloperWeek {
                week: window.label,
                all: accepted.len(),
                bugs: accepted.query_type(TicketType::Bug).len(),
                chores: accepted.query_type(TicketType::Chore).len(),
                features: features.len(),
                feature_points: features.total_estimate(),
            }
        })
        .collect();
    let points: Vec<i64> = weeks.iter().map(|week| i64::from(week.feature_points)).collect();
    let counts: Vec<i64> = weeks.iter().map(|week| week.features as i64).collect();

    DeveloperDetail {
        name: name.to_string(),
        types: type_distribution(&open),
        states: state_distribution(&open),
        labels: label_distribution(&open, special_labels),
        velocity_points: calculate_velocity(&points),
        velocity_count: calculate_velocity(&counts),
        weeks,
        open_stories: ticket_rows(&open),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{accepted, at, open, sample_project, ticket_set, StoryJson};
    use serde_json::json;

    fn owned_by(story: StoryJson, owner: u64) -> StoryJson {
        story.with("owner_ids", json!([owner]))
    }

    fn sample() -> Project {
        sample_project(
            5,
            ticket_set(vec![
                owned_by(accepted(1, "feature", at(2022, 1, 1), at(2022, 1, 4)), 1001).with("estimate", json!(1)),
                owned_by(accepted(2, "feature", at(2022, 1, 1), at(2022, 1, 11)), 1001).with("estimate", json!(2)),
                owned_by(accepted(3, "bug", at(2022, 1, 1), at(2022, 1, 18)), 1001),
                owned_by(open(4, "feature", "started", at(2022, 1, 20)), 1001).with("estimate", json!(4)),
                owned_by(open(5, "chore", "unstarted", at(2022, 1, 20)), 1001),
                owned_by(open(6, "bug", "started", at(2022, 1, 20)), 1003),
            ]),
        )
    }

    #[test]
    fn load_compares_current_work_with_history() {
        let loads = build_developer_loads(&sample(), at(2022, 2, 1));

        let names: Vec<_> = loads.iter().map(|load| load.name.as_str()).collect();
        assert_eq!(names, vec!["Alice Johnson", "Carol Davis"]);

        let alice = &loads[0];
        // History starts at the first acceptance, which is itself excluded.
        assert_eq!(alice.delivered_tickets, 2);
        assert_eq!(alice.delivered_points, 2);
        assert_eq!(alice.current_tickets, 2);
        assert_eq!(alice.current_points, 4);
        assert_eq!(alice.iteration_days, 14);
        assert_eq!(alice.avg_points_per_ticket, Some(1.0));
        assert_eq!(alice.avg_tickets_per_iteration, Some(1.0));
        // (2.0 / 1.0 + 2.0 / 1.0) / 2
        assert_eq!(alice.load, Some(2.0));
    }

    #[test]
    fn developer_without_history_has_no_load() {
        let loads = build_developer_loads(&sample(), at(2022, 2, 1));

        let carol = &loads[1];
        assert_eq!(carol.delivered_tickets, 0);
        assert_eq!(carol.avg_points_per_ticket, None);
        assert_eq!(carol.avg_tickets_per_iteration, None);
        assert_eq!(carol.load, None);
    }

    #[test]
    fn detail_breaks_down_open_work_and_weekly_delivery() {
        let project = sample();
        let detail = build_developer_detail(
            &project,
            "Alice",
            &["ux".to_string()],
            Some(at(2022, 1, 3)),
            at(2022, 1, 20),
        );

        assert_eq!(detail.open_stories.len(), 2);
        assert_eq!(detail.types[2].name, "features");
        assert_eq!(detail.types[2].fraction, 0.5);
        assert_eq!(detail.labels.last().map(|slice| slice.count), Some(2));
        let weekly: Vec<_> = detail
            .weeks
            .iter()
            .map(|week| (week.all, week.bugs, week.features, week.feature_points))
            .collect();
        assert_eq!(weekly, vec![(1, 0, 1, 1), (1, 0, 1, 2), (1, 1, 0, 0)]);
        assert_eq!(detail.velocity_points, vec![1, 2, 0]);
    }
}
