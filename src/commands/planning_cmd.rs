use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::project_context::{CommandError, ProjectContext};
use crate::services::planning_followup::{build_planning_followup, PlanningReport};
use crate::services::report_yaml::write_report;
use crate::services::time_windows::planning_iteration_start;

#[derive(Serialize)]
pub struct PlanningView {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub iteration_start: u32,
    pub planning: PlanningReport,
}

pub fn build_planning_view(
    context: &ProjectContext,
    iteration: Option<u32>,
) -> Result<PlanningView, CommandError> {
    let current = context.project.current_iteration();
    let iteration = iteration.unwrap_or(current);
    let iteration_start = planning_iteration_start(current, context.config.configured_iteration_start());
    let iteration_start = u32::try_from(iteration_start).unwrap_or(1);

    let planning = build_planning_followup(&context.project, iteration, iteration_start)
        .ok_or(CommandError::IterationOutOfRange(iteration))?;
    Ok(PlanningView {
        project: context.display_name(),
        generated_at: context.now,
        iteration_start,
        planning,
    })
}

pub async fn planning_command(
    config: &str,
    output: &str,
    iteration: Option<u32>,
) -> Result<(), CommandError> {
    let context = ProjectContext::load(config).await?;
    write_report(output, &build_planning_view(&context, iteration)?).await?;
    println!("Planning report written to {output}");
    Ok(())
}
