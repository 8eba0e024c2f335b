use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::domain::project::{Project, ProjectKey};
use crate::domain::ticket::Ticket;
use crate::domain::ticket_set::TicketSet;
use crate::domain::user_lookup::{Membership, Person, UserLookup};
use crate::services::data_source::{DataSource, DataSourceError, ProjectMetadata, StoryPage};

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn sample_users() -> UserLookup {
    let mut users = UserLookup::new();
    users.add_user(1001, "Alice Johnson");
    users.add_user(1002, "Bob Smith");
    users.add_user(1003, "Carol Davis");
    users.add_user(2001, "Al");
    users.add_user(2002, "Alice");
    users
}

/// A story record as the Pivotal API would return it, ready to be tweaked.
pub struct StoryJson(Value);

impl StoryJson {
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.0[key] = value;
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        if let Some(fields) = self.0.as_object_mut() {
            fields.remove(key);
        }
        self
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn build(self) -> Ticket {
        Ticket::from_record(&self.0, &sample_users()).unwrap()
    }
}

pub fn story_json(
    id: u64,
    story_type: &str,
    state: &str,
    created_at: &str,
    accepted_at: Option<&str>,
) -> StoryJson {
    let mut record = json!({
        "id": id,
        "story_type": story_type,
        "url": format!("https://www.pivotaltracker.com/story/show/{id}"),
        "current_state": state,
        "name": format!("Story {id}"),
        "requested_by_id": 1001,
        "owner_ids": [],
        "created_at": created_at,
        "labels": []
    });
    if let Some(accepted_at) = accepted_at {
        record["accepted_at"] = json!(accepted_at);
    }
    StoryJson(record)
}

pub fn rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339()
}

/// An accepted ticket created and accepted on the given dates.
pub fn accepted(id: u64, story_type: &str, created: DateTime<Utc>, done: DateTime<Utc>) -> StoryJson {
    story_json(id, story_type, "accepted", &rfc3339(created), Some(&rfc3339(done)))
}

/// A not yet accepted ticket in `state`.
pub fn open(id: u64, story_type: &str, state: &str, created: DateTime<Utc>) -> StoryJson {
    story_json(id, story_type, state, &rfc3339(created), None)
}

pub fn ticket_set(stories: Vec<StoryJson>) -> TicketSet {
    stories.into_iter().map(StoryJson::build).collect()
}

/// A project whose first two-week iteration starts on 2022-01-03.
pub fn sample_project(current_iteration: u32, stories: TicketSet) -> Project {
    Project::new(
        "Demo".to_string(),
        "42".to_string(),
        current_iteration,
        Duration::weeks(2),
        at(2022, 1, 3),
        sample_users(),
        stories,
    )
}

/// In-memory [`DataSource`] serving the `sample_project` metadata and a fixed
/// set of story pages.
pub struct FakeSource {
    pages: Vec<StoryPage>,
    start_date: Mutex<String>,
    loads: AtomicUsize,
    failures_remaining: AtomicUsize,
    gated: AtomicBool,
    pub started: Notify,
    pub gate: Notify,
}

impl FakeSource {
    pub fn with_pages(pages: Vec<StoryPage>) -> Self {
        Self {
            pages,
            start_date: Mutex::new("2022-01-03".to_string()),
            loads: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
            gated: AtomicBool::new(false),
            started: Notify::new(),
            gate: Notify::new(),
        }
    }

    /// Number of project loads that reached the source.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// The next `count` loads fail with a connection error.
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    pub fn set_start_date(&self, start_date: &str) {
        *self.start_date.lock().unwrap() = start_date.to_string();
    }

    /// Loads block after signalling `started` until `gate` is notified.
    pub fn hold_loads(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl DataSource for FakeSource {
    async fn get_project(&self, _key: &ProjectKey) -> Result<ProjectMetadata, DataSourceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DataSourceError::Connection("refused".to_string()));
        }
        Ok(ProjectMetadata {
            name: "Demo".to_string(),
            account_id: 42,
            start_date: self.start_date.lock().unwrap().clone(),
            current_iteration_number: 5,
            iteration_length: 2,
        })
    }

    async fn get_memberships(&self, _key: &ProjectKey) -> Result<Vec<Membership>, DataSourceError> {
        Ok(vec![
            Membership { person: Person { id: 1001, name: "Alice Johnson".to_string() } },
            Membership { person: Person { id: 1002, name: "Bob Smith".to_string() } },
        ])
    }

    async fn get_story_pages(&self, _key: &ProjectKey) -> Result<Vec<StoryPage>, DataSourceError> {
        Ok(self.pages.clone())
    }
}
