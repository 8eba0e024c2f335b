use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::project::ProjectKey;
use crate::domain::user_lookup::Membership;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("resource not found")]
    NotFound,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request timed out")]
    Timeout,
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Other(String),
}

/// Project metadata as reported by `GET /projects/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    pub account_id: u64,
    /// `yyyy-MM-dd`
    pub start_date: String,
    pub current_iteration_number: u32,
    /// In weeks.
    pub iteration_length: u32,
}

/// One page of story data. Entries are either story records or iterations
/// wrapping them (`{"number": n, "stories": [...]}`).
pub type StoryPage = Vec<Value>;

/// Describes an interface for retrieving project, membership and story data.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    async fn get_project(&self, key: &ProjectKey) -> Result<ProjectMetadata, DataSourceError>;

    async fn get_memberships(&self, key: &ProjectKey) -> Result<Vec<Membership>, DataSourceError>;

    /// All story pages, in upstream order.
    async fn get_story_pages(&self, key: &ProjectKey) -> Result<Vec<StoryPage>, DataSourceError>;
}
