use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::project_context::{CommandError, ProjectContext};
use crate::services::report_yaml::write_report;
use crate::services::starvation::{build_starvation, AgeFilter, StarvationReport};

#[derive(Serialize)]
pub struct StarvationView {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub starvation: StarvationReport,
}

pub fn build_starvation_view(context: &ProjectContext, filter: Option<u32>) -> StarvationView {
    StarvationView {
        project: context.display_name(),
        generated_at: context.now,
        starvation: build_starvation(
            context.project.stories(),
            AgeFilter::from_index(filter),
            context.now,
        ),
    }
}

pub async fn starvation_command(
    config: &str,
    output: &str,
    filter: Option<u32>,
) -> Result<(), CommandError> {
    let context = ProjectContext::load(config).await?;
    write_report(output, &build_starvation_view(&context, filter)).await?;
    println!("Starvation report written to {output}");
    Ok(())
}
