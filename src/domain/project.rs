use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::domain::ticket_set::TicketSet;
use crate::domain::user_lookup::UserLookup;

/// Identifies one user's snapshot of one project.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProjectKey {
    pub project_id: u64,
    pub token: String,
}

impl ProjectKey {
    pub fn new(project_id: u64, token: impl Into<String>) -> Self {
        Self {
            project_id,
            token: token.into(),
        }
    }
}

impl fmt::Debug for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectKey")
            .field("project_id", &self.project_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project {}", self.project_id)
    }
}

/// One snapshot of a Pivotal Tracker project, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    name: String,
    account: String,
    current_iteration: u32,
    iteration_length: Duration,
    iterations_start: DateTime<Utc>,
    users: UserLookup,
    stories: TicketSet,
}

impl Project {
    pub fn new(
        name: String,
        account: String,
        current_iteration: u32,
        iteration_length: Duration,
        iterations_start: DateTime<Utc>,
        users: UserLookup,
        stories: TicketSet,
    ) -> Self {
        Self {
            name,
            account,
            current_iteration,
            iteration_length,
            iterations_start,
            users,
            stories,
        }
    }

    pub fn stories(&self) -> &TicketSet {
        &self.stories
    }

    pub fn users(&self) -> &UserLookup {
        &self.users
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// When iteration #1 started.
    pub fn start(&self) -> DateTime<Utc> {
        self.iterations_start
    }

    pub fn current_iteration(&self) -> u32 {
        self.current_iteration
    }

    pub fn iteration_length(&self) -> Duration {
        self.iteration_length
    }

    pub fn display_name(&self) -> String {
        format!("Account: {}, {}", self.account, self.name)
    }

    /// Start of the given (1-based) iteration. Iteration 0 and below map to
    /// points before the project start. `None` when the date is out of range.
    pub fn iteration_start(&self, iteration: i64) -> Option<DateTime<Utc>> {
        let offset = i32::try_from(iteration.checked_sub(1)?).ok()?;
        let elapsed = self.iteration_length.checked_mul(offset)?;
        self.iterations_start.checked_add_signed(elapsed)
    }

    /// `[start, end)` of the given iteration.
    pub fn iteration_window(&self, iteration: i64) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((
            self.iteration_start(iteration)?,
            self.iteration_start(iteration.checked_add(1)?)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, sample_project};

    #[test]
    fn key_debug_output_hides_the_token() {
        let key = ProjectKey::new(99, "secret-token");
        let printed = format!("{key:?}");
        assert!(printed.contains("99"));
        assert!(!printed.contains("secret-token"));
    }

    #[test]
    fn keys_compare_by_field() {
        assert_ne!(ProjectKey::new(1, "2/x"), ProjectKey::new(12, "x"));
    }

    #[test]
    fn display_name_includes_account() {
        let project = sample_project(5, TicketSet::new());
        assert_eq!(project.display_name(), "Account: 42, Demo");
    }

    #[test]
    fn iteration_windows_follow_the_iteration_length() {
        let project = sample_project(5, TicketSet::new());
        assert_eq!(project.iteration_window(1), Some((at(2022, 1, 3), at(2022, 1, 17))));
        assert_eq!(project.iteration_window(3), Some((at(2022, 1, 31), at(2022, 2, 14))));
        assert_eq!(project.iteration_start(0), Some(at(2021, 12, 20)));
    }

    #[test]
    fn unreachable_iterations_have_no_window() {
        let project = sample_project(5, TicketSet::new());
        assert_eq!(project.iteration_start(10_000_000), None);
        assert_eq!(project.iteration_window(4_000_000_000), None);
        assert_eq!(project.iteration_window(i64::MAX), None);
        assert_eq!(project.iteration_start(i64::MIN), None);
    }
}
