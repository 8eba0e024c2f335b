use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::ticket::{Ticket, TicketState};
use crate::domain::ticket_set::TicketSet;

/// Label marking tickets that are waiting on purpose.
pub const ON_HOLD_LABEL: &str = "on hold";

/// Creation age brackets offered by the starvation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeFilter {
    LessThanOneWeek,
    TwoToThreeWeeks,
    ThreeToFourWeeks,
    OneToTwoMonths,
    MoreThanTwoMonths,
    All,
}

impl AgeFilter {
    /// Maps the numeric filter of the command line; unknown values show all.
    pub fn from_index(index: Option<u32>) -> Self {
        match index {
            Some(0) => AgeFilter::LessThanOneWeek,
            Some(1) => AgeFilter::TwoToThreeWeeks,
            Some(2) => AgeFilter::ThreeToFourWeeks,
            Some(3) => AgeFilter::OneToTwoMonths,
            Some(4) => AgeFilter::MoreThanTwoMonths,
            _ => AgeFilter::All,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgeFilter::LessThanOneWeek => "less than one week ago",
            AgeFilter::TwoToThreeWeeks => "2 to 3 weeks ago",
            AgeFilter::ThreeToFourWeeks => "3 to 4 weeks ago",
            AgeFilter::OneToTwoMonths => "1 to 2 months ago",
            AgeFilter::MoreThanTwoMonths => "more than 2 months ago",
            AgeFilter::All => "all",
        }
    }

    /// The creation window `(start, end)` this filter selects at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let ago = |days| now - Duration::days(days);
        match self {
            AgeFilter::LessThanOneWeek => (ago(7), now),
            AgeFilter::TwoToThreeWeeks => (ago(14), ago(7)),
            AgeFilter::ThreeToFourWeeks => (ago(21), ago(14)),
            AgeFilter::OneToTwoMonths => (ago(60), ago(30)),
            AgeFilter::MoreThanTwoMonths => (DateTime::<Utc>::UNIX_EPOCH, ago(60)),
            AgeFilter::All => (DateTime::<Utc>::UNIX_EPOCH, now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarvingTicket {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub labels: Option<String>,
    pub age_days: i64,
    pub on_hold: bool,
}

impl StarvingTicket {
    fn new(ticket: &Ticket, now: DateTime<Utc>) -> Self {
        Self {
            id: ticket.id(),
            title: ticket.title().to_string(),
            url: ticket.url().to_string(),
            labels: ticket.joined_labels(),
            age_days: ticket.age_at(now).num_days(),
            on_hold: ticket.has_label_substring(ON_HOLD_LABEL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarvationReport {
    pub filter: &'static str,
    /// Icebox tickets nobody has scheduled yet.
    pub unscheduled: Vec<StarvingTicket>,
    /// Scheduled tickets still waiting for acceptance.
    pub scheduled: Vec<StarvingTicket>,
}

pub fn build_starvation(stories: &TicketSet, filter: AgeFilter, now: DateTime<Utc>) -> StarvationReport {
    let (start, end) = filter.window(now);
    let rows = |set: TicketSet| -> Vec<StarvingTicket> {
        set.query_created_between(start, end)
            .iter()
            .map(|ticket| StarvingTicket::new(ticket, now))
            .collect()
    };

    StarvationReport {
        filter: filter.description(),
        unscheduled: rows(stories.query_state(TicketState::Unscheduled)),
        scheduled: rows(stories.query_active().query_not_state(TicketState::Unscheduled)),
    }
}
