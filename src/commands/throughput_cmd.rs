use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::project_context::{CommandError, ProjectContext};
use crate::services::report_yaml::write_report;
use crate::services::throughput::{build_throughput, ThroughputReport};

#[derive(Serialize)]
pub struct ThroughputView {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub throughput: ThroughputReport,
}

pub fn build_throughput_view(context: &ProjectContext) -> ThroughputView {
    ThroughputView {
        project: context.display_name(),
        generated_at: context.now,
        throughput: build_throughput(context.project.stories(), context.reference_start(), context.now),
    }
}

pub async fn throughput_command(config: &str, output: &str) -> Result<(), CommandError> {
    let context = ProjectContext::load(config).await?;
    write_report(output, &build_throughput_view(&context)).await?;
    println!("Throughput report written to {output}");
    Ok(())
}
