use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::project_context::{CommandError, ProjectContext};
use crate::services::developer_load::{
    build_developer_detail, build_developer_loads, DeveloperDetail, DeveloperLoad,
};
use crate::services::report_yaml::write_report;

#[derive(Serialize)]
pub struct DevelopersView {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub developers: Vec<DeveloperLoad>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DeveloperDetail>,
}

pub fn build_developers_view(context: &ProjectContext, developer: Option<&str>) -> DevelopersView {
    let detail = developer.map(|name| {
        build_developer_detail(
            &context.project,
            name,
            &context.config.special_labels(),
            context.reference_start(),
            context.now,
        )
    });
    DevelopersView {
        project: context.display_name(),
        generated_at: context.now,
        developers: build_developer_loads(&context.project, context.now),
        detail,
    }
}

pub async fn developers_command(
    config: &str,
    output: &str,
    developer: Option<&str>,
) -> Result<(), CommandError> {
    let context = ProjectContext::load(config).await?;
    write_report(output, &build_developers_view(&context, developer)).await?;
    println!("Developers report written to {output}");
    Ok(())
}
