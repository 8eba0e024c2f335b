use std::env;
use std::fs;
use std::io;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::warn;

use crate::domain::project::ProjectKey;

pub const DEFAULT_API_URL: &str = "https://www.pivotaltracker.com/services/v5";
pub const TOKEN_ENV_VAR: &str = "PIVOTAL_API_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config is missing project_id")]
    MissingProjectId,
    #[error("PIVOTAL_API_TOKEN is not set")]
    MissingToken,
}

/// Per-project settings, read from a YAML file.
///
/// `iteration_start` and `date_start` are kept as raw text: a malformed value
/// never fails a report, it falls back to a default instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PivotalProjectMetaData {
    pub base_url: String,
    pub project_id: u64,
    /// Comma separated labels that get their own slice in label distributions.
    pub special_labels: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub iteration_start: Option<String>,
    #[serde(deserialize_with = "scalar_as_string")]
    pub date_start: Option<String>,
    pub request_timeout_secs: u64,
    pub page_size: u32,
}

impl Default for PivotalProjectMetaData {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            project_id: 0,
            special_labels: String::new(),
            iteration_start: None,
            date_start: None,
            request_timeout_secs: 30,
            page_size: 500,
        }
    }
}

impl PivotalProjectMetaData {
    pub fn from_yaml_file(filepath: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(filepath)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let metadata: PivotalProjectMetaData = serde_yaml::from_str(contents)?;
        if metadata.project_id == 0 {
            return Err(ConfigError::MissingProjectId);
        }
        Ok(metadata)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn project_key(&self, auth: &AuthData) -> ProjectKey {
        ProjectKey::new(self.project_id, auth.api_token.clone())
    }

    /// The configured special labels, trimmed, empty entries dropped.
    pub fn special_labels(&self) -> Vec<String> {
        self.special_labels
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The configured reference start date, if present and well formed.
    pub fn configured_start_date(&self) -> Option<DateTime<Utc>> {
        let text = self.date_start.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        let parsed = NaiveDateTime::parse_from_str(text, "%Y/%m/%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
            .or_else(|_| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .or_else(|_| NaiveDate::parse_from_str(text, "%Y/%m/%d"))
                    .map(|date| date.and_hms_opt(0, 0, 0).unwrap_or_default())
            });
        match parsed {
            Ok(date) => Some(date.and_utc()),
            Err(_) => {
                warn!(date_start = text, "unparsable date_start, using the oldest known date");
                None
            }
        }
    }

    /// The configured first iteration to report on, if present and numeric.
    pub fn configured_iteration_start(&self) -> Option<i64> {
        let text = self.iteration_start.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        match text.parse() {
            Ok(iteration) => Some(iteration),
            Err(_) => {
                warn!(iteration_start = text, "unparsable iteration_start, using the default");
                None
            }
        }
    }
}

pub struct PivotalConfigParser;

impl PivotalConfigParser {
    pub fn parse(&self, filepath: &str) -> Result<PivotalProjectMetaData, ConfigError> {
        PivotalProjectMetaData::from_yaml_file(filepath)
    }
}

#[derive(Clone)]
pub struct AuthData {
    pub api_token: String,
}

impl AuthData {
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(TOKEN_ENV_VAR) {
            Ok(api_token) if !api_token.trim().is_empty() => Ok(Self { api_token }),
            _ => Err(ConfigError::MissingToken),
        }
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(text)) => Some(text),
        Some(serde_yaml::Value::Number(number)) => Some(number.to_string()),
        Some(serde_yaml::Value::Bool(flag)) => Some(flag.to_string()),
        Some(other) => Some(format!("{other:?}")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::at;

    #[test]
    fn parses_full_config() {
        let config = PivotalProjectMetaData::from_yaml_str(
            r#"
base_url: http://localhost:1234
project_id: 99
special_labels: "backend , frontend,ux,"
iteration_start: 3
date_start: "2022/01/10 00:00:00"
request_timeout_secs: 5
"#,
        )
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:1234");
        assert_eq!(config.project_id, 99);
        assert_eq!(config.special_labels(), vec!["backend", "frontend", "ux"]);
        assert_eq!(config.configured_iteration_start(), Some(3));
        assert_eq!(config.configured_start_date(), Some(at(2022, 1, 10)));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.page_size, 500);
    }

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config = PivotalProjectMetaData::from_yaml_str("project_id: 7").unwrap();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert!(config.special_labels().is_empty());
        assert_eq!(config.configured_iteration_start(), None);
        assert_eq!(config.configured_start_date(), None);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = PivotalProjectMetaData::from_yaml_str(
            r#"
project_id: 7
iteration_start: soon
date_start: last tuesday
"#,
        )
        .unwrap();
        assert_eq!(config.configured_iteration_start(), None);
        assert_eq!(config.configured_start_date(), None);
    }

    #[test]
    fn accepts_plain_dates() {
        let config = PivotalProjectMetaData::from_yaml_str("project_id: 7\ndate_start: 2022-03-01").unwrap();
        assert_eq!(config.configured_start_date(), Some(at(2022, 3, 1)));
    }

    #[test]
    fn missing_project_id_is_an_error() {
        let result = PivotalProjectMetaData::from_yaml_str("special_labels: ux");
        assert!(matches!(result, Err(ConfigError::MissingProjectId)));
    }
}
