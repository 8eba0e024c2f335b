use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::domain::project::{Project, ProjectKey};
use crate::domain::ticket::Ticket;
use crate::domain::ticket_set::TicketSet;
use crate::domain::user_lookup::UserLookup;
use crate::services::data_source::{DataSource, DataSourceError, StoryPage};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to load project {project_id}: {source}")]
    Fetch {
        project_id: u64,
        #[source]
        source: DataSourceError,
    },
    #[error("project {project_id} has invalid metadata: {reason}")]
    InvalidMetadata { project_id: u64, reason: String },
}

impl LoadError {
    pub fn project_id(&self) -> u64 {
        match self {
            LoadError::Fetch { project_id, .. } | LoadError::InvalidMetadata { project_id, .. } => {
                *project_id
            }
        }
    }
}

/// Turns the upstream project, membership and story data into a [`Project`].
#[derive(Clone)]
pub struct ProjectLoader {
    source: Arc<dyn DataSource>,
}

impl ProjectLoader {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    #[instrument(skip(self), fields(project_id = key.project_id))]
    pub async fn load(&self, key: &ProjectKey) -> Result<Project, LoadError> {
        let result = self.try_load(key).await;
        if let Err(err) = &result {
            error!(error = %err, "project load failed");
        }
        result
    }

    async fn try_load(&self, key: &ProjectKey) -> Result<Project, LoadError> {
        let project_id = key.project_id;
        let fetch_error = |source| LoadError::Fetch { project_id, source };

        let metadata = self.source.get_project(key).await.map_err(fetch_error)?;
        let start = NaiveDate::parse_from_str(&metadata.start_date, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|date| date.and_utc())
            .ok_or_else(|| LoadError::InvalidMetadata {
                project_id,
                reason: format!("unparsable start_date {:?}", metadata.start_date),
            })?;
        if metadata.iteration_length == 0 {
            return Err(LoadError::InvalidMetadata {
                project_id,
                reason: "iteration_length is zero".to_string(),
            });
        }

        let memberships = self.source.get_memberships(key).await.map_err(fetch_error)?;
        let users = UserLookup::from_memberships(&memberships);

        let pages = self.source.get_story_pages(key).await.map_err(fetch_error)?;
        let stories = build_ticket_set(&pages, &users);

        info!(
            name = %metadata.name,
            users = users.len(),
            stories = stories.len(),
            "project loaded"
        );

        Ok(Project::new(
            metadata.name,
            metadata.account_id.to_string(),
            metadata.current_iteration_number,
            Duration::weeks(i64::from(metadata.iteration_length)),
            start,
            users,
            stories,
        ))
    }
}

/// Builds the ticket set from story pages, skipping malformed records.
///
/// Plain story entries are tagged with their 1-based page position; entries
/// shaped like iterations (`{"number": n, "stories": [...]}`) tag their
/// stories with `n`.
pub fn build_ticket_set(pages: &[StoryPage], users: &UserLookup) -> TicketSet {
    let mut tickets = Vec::new();
    let mut skipped = 0usize;
    let mut iteration_position = 0u32;

    for (page_index, page) in pages.iter().enumerate() {
        let page_number = u32::try_from(page_index + 1).unwrap_or(u32::MAX);
        for entry in page {
            match entry.get("stories").and_then(Value::as_array) {
                Some(stories) => {
                    iteration_position += 1;
                    let number = entry
                        .get("number")
                        .and_then(Value::as_u64)
                        .and_then(|number| u32::try_from(number).ok())
                        .unwrap_or(iteration_position);
                    for story in stories {
                        push_ticket(&mut tickets, &mut skipped, story, users, number);
                    }
                }
                None => push_ticket(&mut tickets, &mut skipped, entry, users, page_number),
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = tickets.len(), "skipped malformed story records");
    }
    tickets.into_iter().collect()
}

fn push_ticket(
    tickets: &mut Vec<Ticket>,
    skipped: &mut usize,
    record: &Value,
    users: &UserLookup,
    iteration: u32,
) {
    match Ticket::from_record(record, users) {
        Ok(ticket) => tickets.push(ticket.with_iteration_label(iteration)),
        Err(err) => {
            *skipped += 1;
            let url = record.get("url").and_then(|url| url.as_str());
            warn!(
                id = ?record.get("id"),
                url = ?url,
                error = %err,
                "skipping story record"
            );
        }
    }
}
