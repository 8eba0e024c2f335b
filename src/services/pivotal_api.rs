use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::domain::project::ProjectKey;
use crate::domain::user_lookup::Membership;
use crate::services::data_source::{DataSource, DataSourceError, ProjectMetadata, StoryPage};
use crate::services::pivotal_config::PivotalProjectMetaData;

pub const TOKEN_HEADER: &str = "X-TrackerToken";
pub const PAGINATION_TOTAL_HEADER: &str = "X-Tracker-Pagination-Total";
pub const PAGINATION_LIMIT_HEADER: &str = "X-Tracker-Pagination-Limit";

pub struct PivotalApiClient {
    base_url: String,
    page_size: u32,
    client: Client,
}

impl PivotalApiClient {
    pub fn new(base_url: &str, timeout: Duration, page_size: u32) -> Result<Self, DataSourceError> {
        if base_url.trim().is_empty() {
            return Err(DataSourceError::Other("base_url must not be empty".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| DataSourceError::Other(format!("failed to build http client: {err}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
            client,
        })
    }

    pub fn from_config(config: &PivotalProjectMetaData) -> Result<Self, DataSourceError> {
        Self::new(&config.base_url, config.request_timeout(), config.page_size)
    }

    async fn send(
        &self,
        url: &str,
        key: &ProjectKey,
        params: &[(&str, String)],
    ) -> Result<Response, DataSourceError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .header(TOKEN_HEADER, key.token.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DataSourceError::Unauthorized);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(DataSourceError::NotFound);
        }
        if !status.is_success() {
            return Err(DataSourceError::Connection(format!("{url} answered {status}")));
        }
        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        key: &ProjectKey,
    ) -> Result<T, DataSourceError> {
        self.send(url, key, &[])
            .await?
            .json::<T>()
            .await
            .map_err(map_body_error)
    }
}

#[async_trait::async_trait]
impl DataSource for PivotalApiClient {
    async fn get_project(&self, key: &ProjectKey) -> Result<ProjectMetadata, DataSourceError> {
        let url = format!("{}/projects/{}", self.base_url, key.project_id);
        self.fetch_json(&url, key).await
    }

    async fn get_memberships(&self, key: &ProjectKey) -> Result<Vec<Membership>, DataSourceError> {
        let url = format!("{}/projects/{}/memberships", self.base_url, key.project_id);
        self.fetch_json(&url, key).await
    }

    async fn get_story_pages(&self, key: &ProjectKey) -> Result<Vec<StoryPage>, DataSourceError> {
        let url = format!("{}/projects/{}/stories", self.base_url, key.project_id);
        let mut pages = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let params = [
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ];
            let response = self.send(&url, key, &params).await?;
            let total = header_u64(response.headers(), PAGINATION_TOTAL_HEADER);
            let limit = header_u64(response.headers(), PAGINATION_LIMIT_HEADER);

            let payload = response.json::<Value>().await.map_err(map_body_error)?;
            let page = match payload {
                Value::Array(entries) => entries,
                _ => return Err(DataSourceError::Parse("expected an array of stories".to_string())),
            };
            debug!(offset, entries = page.len(), ?total, ?limit, "fetched story page");
            pages.push(page);

            let (Some(total), Some(limit)) = (total, limit) else {
                break;
            };
            if limit == 0 {
                break;
            }
            offset = offset.saturating_add(limit);
            if offset >= total {
                break;
            }
        }

        Ok(pages)
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn map_transport_error(err: reqwest::Error) -> DataSourceError {
    if err.is_timeout() {
        DataSourceError::Timeout
    } else {
        DataSourceError::Connection(err.to_string())
    }
}

fn map_body_error(err: reqwest::Error) -> DataSourceError {
    if err.is_timeout() {
        DataSourceError::Timeout
    } else {
        DataSourceError::Parse(err.to_string())
    }
}
