use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::project_context::{CommandError, ProjectContext};
use crate::services::backlog::{build_backlog, BacklogReport};
use crate::services::burndown::{build_burndown, BurndownReport};
use crate::services::distribution::{backlog_distribution, label_distribution, type_distribution, Slice};
use crate::services::lead_time::{build_lead_time, LeadTimeReport};
use crate::services::report_yaml::{ticket_rows, write_report, TicketRow};
use crate::services::time_windows::overview_iteration_start;
use crate::services::velocity_calculation::{build_velocity, VelocityReport};

#[derive(Serialize)]
pub struct OverviewReport {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub velocity: VelocityReport,
    pub lead_time: LeadTimeReport,
    pub backlog: BacklogReport,
    pub iteration_start: i64,
    pub burndown: BurndownReport,
    pub status: Vec<Slice>,
    pub types: Vec<Slice>,
    pub labels: Vec<Slice>,
    pub open_stories: Vec<TicketRow>,
}

pub fn build_overview(context: &ProjectContext) -> OverviewReport {
    let project = &context.project;
    let stories = project.stories();
    let open = stories.query_active();
    let start = context.reference_start();
    let iteration_start = overview_iteration_start(
        project.current_iteration(),
        context.config.configured_iteration_start(),
    );

    OverviewReport {
        project: context.display_name(),
        generated_at: context.now,
        velocity: build_velocity(stories, start, context.now),
        lead_time: build_lead_time(stories, start, context.now),
        backlog: build_backlog(stories, context.now),
        iteration_start,
        burndown: build_burndown(project, iteration_start, context.now),
        status: backlog_distribution(&open),
        types: type_distribution(&open),
        labels: label_distribution(&open, &context.config.special_labels()),
        open_stories: ticket_rows(&open),
    }
}

pub async fn overview_command(config: &str, output: &str) -> Result<(), CommandError> {
    let context = ProjectContext::load(config).await?;
    write_report(output, &build_overview(&context)).await?;
    println!("Overview report written to {output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::services::pivotal_config::PivotalProjectMetaData;
    use crate::test_support::{accepted, at, open, sample_project, ticket_set};
    use serde_json::json;

    #[test]
    fn overview_combines_all_sections() {
        let project = sample_project(
            3,
            ticket_set(vec![
                accepted(1, "feature", at(2022, 1, 4), at(2022, 1, 12)).with("estimate", json!(2)),
                open(2, "bug", "unscheduled", at(2022, 1, 20)).with("labels", json!(["ux", "[3]"])),
                open(3, "feature", "started", at(2022, 1, 25)),
            ]),
        );
        let config = PivotalProjectMetaData::from_yaml_str(
            "project_id: 1\nspecial_labels: ux\niteration_start: nonsense",
        )
        .unwrap();
        let context = ProjectContext {
            config,
            project: Arc::new(project),
            now: at(2022, 2, 1),
        };

        let report = build_overview(&context);

        assert_eq!(report.project, "Account: 42, Demo");
        assert_eq!(report.iteration_start, 1);
        assert_eq!(report.velocity.weeks.len(), 4);
        assert_eq!(report.velocity.max_points, 2);
        assert_eq!(report.lead_time.max_days, 8);
        assert_eq!(report.backlog.days.first().map(|day| day.opened), Some(1));
        assert_eq!(report.burndown.iterations.len(), 1);
        assert_eq!(report.burndown.iterations[0].iteration, 3);
        assert_eq!(report.status[0].count, 1);
        assert_eq!(report.labels[0].count, 1);
        assert_eq!(report.open_stories.len(), 2);
    }

    #[test]
    fn huge_configured_iteration_start_falls_back_to_current() {
        let project = sample_project(
            3,
            ticket_set(vec![open(1, "feature", "started", at(2022, 1, 20)).with("labels", json!(["[3]"]))]),
        );
        let config =
            PivotalProjectMetaData::from_yaml_str("project_id: 1\niteration_start: 10000000").unwrap();
        let context = ProjectContext {
            config,
            project: Arc::new(project),
            now: at(2022, 2, 1),
        };

        let report = build_overview(&context);

        assert_eq!(report.iteration_start, 3);
        assert_eq!(report.burndown.iterations.len(), 1);
        assert_eq!(report.burndown.iterations[0].iteration, 3);
    }
}
