use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::domain::user_lookup::UserLookup;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
	#[error("story record is not a json object")]
	NotAnObject,
	#[error("missing field: {0}")]
	MissingField(&'static str),
	#[error("malformed field: {0}")]
	MalformedField(&'static str),
	#[error("malformed url: {0}")]
	MalformedUrl(String),
	#[error("invalid timestamp in {field}: {value}")]
	InvalidTimestamp { field: &'static str, value: String },
	#[error("unknown story type: {0}")]
	UnknownType(String),
	#[error("unknown story state: {0}")]
	UnknownState(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
	Bug,
	Feature,
	Chore,
	Release,
}

impl TicketType {
	/// Every type a ticket can have, in reporting order.
	pub const ALL: [TicketType; 4] = [
		TicketType::Bug,
		TicketType::Chore,
		TicketType::Feature,
		TicketType::Release,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			TicketType::Bug => "bug",
			TicketType::Feature => "feature",
			TicketType::Chore => "chore",
			TicketType::Release => "release",
		}
	}
}

impl FromStr for TicketType {
	type Err = TicketError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.to_ascii_lowercase().as_str() {
			"bug" => Ok(TicketType::Bug),
			"feature" => Ok(TicketType::Feature),
			"chore" => Ok(TicketType::Chore),
			"release" => Ok(TicketType::Release),
			_ => Err(TicketError::UnknownType(value.to_string())),
		}
	}
}

impl fmt::Display for TicketType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
	Unscheduled,
	Unstarted,
	Started,
	Finished,
	Delivered,
	Accepted,
	Rejected,
}

impl TicketState {
	/// Every state a ticket can be in, in reporting order.
	pub const ALL: [TicketState; 7] = [
		TicketState::Accepted,
		TicketState::Rejected,
		TicketState::Delivered,
		TicketState::Finished,
		TicketState::Started,
		TicketState::Unstarted,
		TicketState::Unscheduled,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			TicketState::Unscheduled => "unscheduled",
			TicketState::Unstarted => "unstarted",
			TicketState::Started => "started",
			TicketState::Finished => "finished",
			TicketState::Delivered => "delivered",
			TicketState::Accepted => "accepted",
			TicketState::Rejected => "rejected",
		}
	}
}

impl FromStr for TicketState {
	type Err = TicketError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.to_ascii_lowercase().as_str() {
			"unscheduled" => Ok(TicketState::Unscheduled),
			"unstarted" => Ok(TicketState::Unstarted),
			"started" => Ok(TicketState::Started),
			"finished" => Ok(TicketState::Finished),
			"delivered" => Ok(TicketState::Delivered),
			"accepted" => Ok(TicketState::Accepted),
			"rejected" => Ok(TicketState::Rejected),
			_ => Err(TicketError::UnknownState(value.to_string())),
		}
	}
}

impl fmt::Display for TicketState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A single Pivotal Tracker story.
///
/// Tickets are only built through [`Ticket::from_record`], which guarantees
/// that `accepted_at` is present exactly when the state is `accepted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
	id: u64,
	title: String,
	ticket_type: TicketType,
	state: TicketState,
	estimate: u32,
	created_at: DateTime<Utc>,
	accepted_at: Option<DateTime<Utc>>,
	labels: Vec<String>,
	requested_by: Option<String>,
	owner: Option<String>,
	url: Url,
}

impl Ticket {
	/// Builds a ticket from one upstream story entry, resolving user ids
	/// through `users`.
	pub fn from_record(record: &Value, users: &UserLookup) -> Result<Self, TicketError> {
		let fields = record.as_object().ok_or(TicketError::NotAnObject)?;

		let id = get_field_u64(fields, "id").ok_or(TicketError::MissingField("id"))?;
		let ticket_type: TicketType = get_field_str(fields, "story_type")
			.ok_or(TicketError::MissingField("story_type"))?
			.parse()?;
		let url_text = get_field_str(fields, "url").ok_or(TicketError::MissingField("url"))?;
		let url = Url::parse(url_text).map_err(|_| TicketError::MalformedUrl(url_text.to_string()))?;
		let state: TicketState = get_field_str(fields, "current_state")
			.ok_or(TicketError::MissingField("current_state"))?
			.parse()?;
		let title = get_field_str(fields, "name")
			.ok_or(TicketError::MissingField("name"))?
			.to_string();

		// Story points only carry meaning on features.
		let estimate = match ticket_type {
			TicketType::Feature => fields
				.get("estimate")
				.and_then(Value::as_i64)
				.and_then(|value| u32::try_from(value).ok())
				.unwrap_or(0),
			_ => 0,
		};

		let requested_by = get_field_u64(fields, "requested_by_id")
			.and_then(|user_id| users.get_user(user_id))
			.map(str::to_string);
		let owner = resolve_owners(fields, users)?;

		let created_at = get_field_timestamp(fields, "created_at")?
			.ok_or(TicketError::MissingField("created_at"))?;
		let accepted_at = if state == TicketState::Accepted {
			Some(
				get_field_timestamp(fields, "accepted_at")?
					.ok_or(TicketError::MissingField("accepted_at"))?,
			)
		} else {
			None
		};

		let labels = parse_labels(fields)?;

		Ok(Self {
			id,
			title,
			ticket_type,
			state,
			estimate,
			created_at,
			accepted_at,
			labels,
			requested_by,
			owner,
			url,
		})
	}

	/// Tags the ticket with `[iteration]` unless it already carries an
	/// iteration label.
	pub fn with_iteration_label(mut self, iteration: u32) -> Self {
		if !self.has_iteration_label() {
			self.labels.push(iteration_label(iteration));
		}
		self
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn ticket_type(&self) -> TicketType {
		self.ticket_type
	}

	pub fn state(&self) -> TicketState {
		self.state
	}

	pub fn estimate(&self) -> u32 {
		self.estimate
	}

	pub fn created_at(&self) -> DateTime<Utc> {
		self.created_at
	}

	pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
		self.accepted_at
	}

	pub fn labels(&self) -> &[String] {
		&self.labels
	}

	pub fn requested_by(&self) -> Option<&str> {
		self.requested_by.as_deref()
	}

	pub fn owner(&self) -> Option<&str> {
		self.owner.as_deref()
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	pub fn is_accepted(&self) -> bool {
		self.state == TicketState::Accepted
	}

	/// Labels joined with `,`, or `None` when the ticket has no labels.
	pub fn joined_labels(&self) -> Option<String> {
		if self.labels.is_empty() {
			None
		} else {
			Some(self.labels.join(","))
		}
	}

	/// Substring match against the joined labels, so `"5"` also matches `"25"`.
	pub fn has_label_substring(&self, needle: &str) -> bool {
		self.joined_labels()
			.is_some_and(|labels| labels.contains(needle))
	}

	/// Substring match against the joined owner names.
	pub fn has_owner_substring(&self, needle: &str) -> bool {
		self.owner.as_deref().is_some_and(|owner| owner.contains(needle))
	}

	pub fn has_iteration_label(&self) -> bool {
		self.labels
			.iter()
			.any(|label| parse_iteration_label(label).is_some())
	}

	/// Time between creation and acceptance.
	pub fn lead_time(&self) -> Option<Duration> {
		self.accepted_at.map(|accepted| accepted - self.created_at)
	}

	pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
		now - self.created_at
	}
}

impl fmt::Display for Ticket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} - {}", self.id, self.title)
	}
}

pub fn iteration_label(iteration: u32) -> String {
	format!("[{iteration}]")
}

/// Returns `N` for labels following the `[N]` convention.
pub fn parse_iteration_label(label: &str) -> Option<u32> {
	label
		.trim()
		.strip_prefix('[')?
		.strip_suffix(']')?
		.parse()
		.ok()
}

fn resolve_owners(
	fields: &Map<String, Value>,
	users: &UserLookup,
) -> Result<Option<String>, TicketError> {
	let owner_ids = match fields.get("owner_ids") {
		None | Some(Value::Null) => return Ok(None),
		Some(Value::Array(values)) => values,
		Some(_) => return Err(TicketError::MalformedField("owner_ids")),
	};

	let names: Vec<&str> = owner_ids
		.iter()
		.filter_map(Value::as_u64)
		.filter_map(|user_id| users.get_user(user_id))
		.collect();

	if names.is_empty() {
		Ok(None)
	} else {
		Ok(Some(names.join(",")))
	}
}

fn parse_labels(fields: &Map<String, Value>) -> Result<Vec<String>, TicketError> {
	let values = fields
		.get("labels")
		.and_then(Value::as_array)
		.ok_or(TicketError::MissingField("labels"))?;

	values
		.iter()
		.map(|value| match value {
			Value::String(text) => Ok(text.clone()),
			Value::Object(label) => label
				.get("name")
				.and_then(Value::as_str)
				.map(str::to_string)
				.ok_or(TicketError::MalformedField("labels")),
			_ => Err(TicketError::MalformedField("labels")),
		})
		.collect()
}

fn get_field_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
	fields.get(key).and_then(Value::as_str)
}

fn get_field_u64(fields: &Map<String, Value>, key: &str) -> Option<u64> {
	fields.get(key).and_then(|value| match value {
		Value::Number(number) => number.as_u64(),
		Value::String(text) => text.parse().ok(),
		_ => None,
	})
}

fn get_field_timestamp(
	fields: &Map<String, Value>,
	key: &'static str,
) -> Result<Option<DateTime<Utc>>, TicketError> {
	match fields.get(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(text)) => DateTime::parse_from_rfc3339(text)
			.map(|date| Some(date.with_timezone(&Utc)))
			.map_err(|_| TicketError::InvalidTimestamp {
				field: key,
				value: text.clone(),
			}),
		Some(Value::Number(number)) => number
			.as_i64()
			.and_then(DateTime::<Utc>::from_timestamp_millis)
			.map(Some)
			.ok_or(TicketError::InvalidTimestamp {
				field: key,
				value: number.to_string(),
			}),
		Some(other) => Err(TicketError::InvalidTimestamp {
			field: key,
			value: other.to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{at, sample_users, story_json};
	use serde_json::json;

	#[test]
	fn parses_accepted_feature_with_owners_and_labels() {
		let record = story_json(1, "feature", "accepted", "2022-01-03T00:00:00Z", Some("2022-01-10T00:00:00Z"))
			.with("estimate", json!(5))
			.with("owner_ids", json!([1001, 1002]))
			.with("labels", json!([{ "name": "backend" }, { "name": "[3]" }]))
			.into_value();

		let ticket = Ticket::from_record(&record, &sample_users()).unwrap();
		assert_eq!(ticket.id(), 1);
		assert_eq!(ticket.ticket_type(), TicketType::Feature);
		assert_eq!(ticket.state(), TicketState::Accepted);
		assert_eq!(ticket.estimate(), 5);
		assert_eq!(ticket.owner(), Some("Alice Johnson,Bob Smith"));
		assert_eq!(ticket.requested_by(), Some("Alice Johnson"));
		assert_eq!(ticket.joined_labels().as_deref(), Some("backend,[3]"));
		assert_eq!(ticket.accepted_at(), Some(at(2022, 1, 10)));
		assert_eq!(ticket.lead_time(), Some(Duration::days(7)));
		assert!(ticket.has_iteration_label());
	}

	#[test]
	fn accepted_date_is_dropped_unless_state_is_accepted() {
		let record = story_json(2, "bug", "delivered", "2022-01-03T00:00:00Z", Some("2022-01-10T00:00:00Z"))
			.into_value();

		let ticket = Ticket::from_record(&record, &sample_users()).unwrap();
		assert_eq!(ticket.accepted_at(), None);
		assert_eq!(ticket.lead_time(), None);
	}

	#[test]
	fn accepted_without_accepted_date_fails() {
		let record = story_json(3, "feature", "accepted", "2022-01-03T00:00:00Z", None).into_value();
		assert_eq!(
			Ticket::from_record(&record, &sample_users()),
			Err(TicketError::MissingField("accepted_at"))
		);
	}

	#[test]
	fn missing_labels_field_fails() {
		let record = story_json(4, "chore", "started", "2022-01-03T00:00:00Z", None)
			.without("labels")
			.into_value();
		assert_eq!(
			Ticket::from_record(&record, &sample_users()),
			Err(TicketError::MissingField("labels"))
		);
	}

	#[test]
	fn malformed_url_fails() {
		let record = story_json(5, "chore", "started", "2022-01-03T00:00:00Z", None)
			.with("url", json!("not a url"))
			.into_value();
		assert_eq!(
			Ticket::from_record(&record, &sample_users()),
			Err(TicketError::MalformedUrl("not a url".to_string()))
		);
	}

	#[test]
	fn unknown_state_fails() {
		let record = story_json(6, "chore", "planned", "2022-01-03T00:00:00Z", None).into_value();
		assert_eq!(
			Ticket::from_record(&record, &sample_users()),
			Err(TicketError::UnknownState("planned".to_string()))
		);
	}

	#[test]
	fn non_feature_estimates_are_zero() {
		let record = story_json(7, "bug", "started", "2022-01-03T00:00:00Z", None)
			.with("estimate", json!(3))
			.into_value();
		let ticket = Ticket::from_record(&record, &sample_users()).unwrap();
		assert_eq!(ticket.estimate(), 0);
	}

	#[test]
	fn unresolved_owners_are_skipped() {
		let record = story_json(8, "feature", "started", "2022-01-03T00:00:00Z", None)
			.with("owner_ids", json!([9999, 1003]))
			.into_value();
		let ticket = Ticket::from_record(&record, &sample_users()).unwrap();
		assert_eq!(ticket.owner(), Some("Carol Davis"));

		let record = story_json(9, "feature", "started", "2022-01-03T00:00:00Z", None)
			.with("owner_ids", json!([9999]))
			.into_value();
		let ticket = Ticket::from_record(&record, &sample_users()).unwrap();
		assert_eq!(ticket.owner(), None);
	}

	#[test]
	fn iteration_label_is_added_only_when_missing() {
		let record = story_json(10, "feature", "started", "2022-01-03T00:00:00Z", None).into_value();
		let ticket = Ticket::from_record(&record, &sample_users())
			.unwrap()
			.with_iteration_label(4);
		assert_eq!(ticket.labels(), ["[4]".to_string()]);

		let relabelled = ticket.with_iteration_label(7);
		assert_eq!(relabelled.labels(), ["[4]".to_string()]);
	}

	#[test]
	fn label_substring_is_ambiguous() {
		let record = story_json(11, "feature", "started", "2022-01-03T00:00:00Z", None)
			.with("labels", json!(["[25]"]))
			.into_value();
		let ticket = Ticket::from_record(&record, &sample_users()).unwrap();
		assert!(ticket.has_label_substring("5"));
		assert!(ticket.has_label_substring("[25]"));
		assert!(!ticket.has_label_substring("[5]"));
	}

	#[test]
	fn parses_iteration_labels() {
		assert_eq!(parse_iteration_label("[12]"), Some(12));
		assert_eq!(parse_iteration_label(" [3] "), Some(3));
		assert_eq!(parse_iteration_label("[x]"), None);
		assert_eq!(parse_iteration_label("12"), None);
	}

	#[test]
	fn enumerations_round_trip_through_strings() {
		for ticket_type in TicketType::ALL {
			assert_eq!(ticket_type.as_str().parse::<TicketType>().unwrap(), ticket_type);
		}
		for state in TicketState::ALL {
			assert_eq!(state.to_string().parse::<TicketState>().unwrap(), state);
		}
	}
}
