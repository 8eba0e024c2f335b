use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::commands::all_cmd::build_all_stories_view;
use crate::commands::developers_cmd::build_developers_view;
use crate::commands::overview_cmd::build_overview;
use crate::commands::planning_cmd::build_planning_view;
use crate::commands::project_context::{CommandError, ProjectSession};
use crate::commands::starvation_cmd::build_starvation_view;
use crate::commands::throughput_cmd::build_throughput_view;
use crate::services::report_yaml::{write_report, ReportError};

async fn write_into<T: Serialize>(directory: &Path, name: &str, report: &T) -> Result<(), CommandError> {
    let path = directory.join(name);
    write_report(&path, report).await?;
    println!("{} written", path.display());
    Ok(())
}

/// Writes every report of one project into `output_dir`, downloading the
/// project once.
pub async fn reports_command(config: &str, output_dir: &str) -> Result<(), CommandError> {
    let directory = Path::new(output_dir);
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(ReportError::from)?;

    let session = ProjectSession::open(config)?;

    let context = session.context().await?;
    write_into(directory, "overview.yaml", &build_overview(&context)).await?;

    let context = session.context().await?;
    write_into(directory, "throughput.yaml", &build_throughput_view(&context)).await?;

    let context = session.context().await?;
    write_into(directory, "starvation.yaml", &build_starvation_view(&context, None)).await?;

    let context = session.context().await?;
    write_into(directory, "developers.yaml", &build_developers_view(&context, None)).await?;

    let context = session.context().await?;
    write_into(directory, "planning.yaml", &build_planning_view(&context, None)?).await?;

    let context = session.context().await?;
    write_into(directory, "all.yaml", &build_all_stories_view(&context)).await?;

    info!(cached_projects = session.cached_projects(), "all reports written");
    Ok(())
}
