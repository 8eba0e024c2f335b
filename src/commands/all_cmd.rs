use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::project_context::{CommandError, ProjectContext};
use crate::services::report_yaml::{ticket_rows, write_report, TicketRow};

#[derive(Serialize)]
pub struct AllStoriesView {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub stories: Vec<TicketRow>,
}

pub fn build_all_stories_view(context: &ProjectContext) -> AllStoriesView {
    AllStoriesView {
        project: context.display_name(),
        generated_at: context.now,
        stories: ticket_rows(context.project.stories()),
    }
}

pub async fn all_command(config: &str, output: &str) -> Result<(), CommandError> {
    let context = ProjectContext::load(config).await?;
    write_report(output, &build_all_stories_view(&context)).await?;
    println!("All stories report written to {output}");
    Ok(())
}
