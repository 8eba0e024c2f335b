use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::domain::project::{Project, ProjectKey};
use crate::services::data_source::{DataSource, DataSourceError};
use crate::services::pivotal_api::PivotalApiClient;
use crate::services::pivotal_config::{AuthData, ConfigError, PivotalConfigParser, PivotalProjectMetaData};
use crate::services::project_cache::ProjectCache;
use crate::services::project_loader::LoadError;
use crate::services::report_yaml::ReportError;
use crate::services::time_windows::reference_start;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create Pivotal client: {0}")]
    Client(#[from] DataSourceError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("iteration {0} is out of range for this project")]
    IterationOutOfRange(u32),
}

/// A configured project connection whose loads go through one
/// [`ProjectCache`], so several reports share a single download.
pub struct ProjectSession {
    config: PivotalProjectMetaData,
    key: ProjectKey,
    cache: ProjectCache,
}

impl ProjectSession {
    pub fn open(config_path: &str) -> Result<Self, CommandError> {
        let config = PivotalConfigParser.parse(config_path)?;
        let auth = AuthData::from_env()?;
        let client = PivotalApiClient::from_config(&config)?;
        Ok(Self::with_source(config, &auth, Arc::new(client)))
    }

    pub fn with_source(config: PivotalProjectMetaData, auth: &AuthData, source: Arc<dyn DataSource>) -> Self {
        Self {
            key: config.project_key(auth),
            config,
            cache: ProjectCache::new(source),
        }
    }

    pub async fn context(&self) -> Result<ProjectContext, CommandError> {
        let project = self.cache.get(&self.key).await?;
        info!(project = %project.display_name(), "project ready");
        Ok(ProjectContext {
            config: self.config.clone(),
            project,
            now: Utc::now(),
        })
    }

    pub fn cached_projects(&self) -> usize {
        self.cache.len()
    }
}

/// Everything a report command needs: its configuration, the loaded project
/// and the instant the report is computed for.
pub struct ProjectContext {
    pub config: PivotalProjectMetaData,
    pub project: Arc<Project>,
    pub now: DateTime<Utc>,
}

impl ProjectContext {
    pub async fn load(config_path: &str) -> Result<Self, CommandError> {
        ProjectSession::open(config_path)?.context().await
    }

    /// Start of the weekly series, honouring a configured `date_start`.
    pub fn reference_start(&self) -> Option<DateTime<Utc>> {
        reference_start(self.project.stories(), self.config.configured_start_date())
    }

    pub fn display_name(&self) -> String {
        self.project.display_name()
    }
}
