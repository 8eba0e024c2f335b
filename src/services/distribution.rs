use serde::Serialize;

use crate::domain::ticket::TicketState;
use crate::domain::ticket_set::TicketSet;

/// One named share of a ticket set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub name: String,
    pub count: usize,
    pub fraction: f64,
}

impl Slice {
    fn new(name: impl Into<String>, count: usize, total: usize) -> Self {
        let fraction = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        };
        Self {
            name: name.into(),
            count,
            fraction,
        }
    }
}

/// Share of every known state, in the fixed state order.
pub fn state_distribution(stories: &TicketSet) -> Vec<Slice> {
    stories
        .query_unique_states()
        .iter()
        .map(|state| Slice::new(state.as_str(), stories.query_state(*state).len(), stories.len()))
        .collect()
}

/// Share of every known type, named in the plural (`bugs`, `features`, ...).
pub fn type_distribution(stories: &TicketSet) -> Vec<Slice> {
    stories
        .query_unique_types()
        .iter()
        .map(|ticket_type| {
            Slice::new(
                format!("{}s", ticket_type.as_str()),
                stories.query_type(*ticket_type).len(),
                stories.len(),
            )
        })
        .collect()
}

/// Share of each special label plus an `others` slice for the remainder.
///
/// Labels match by substring, so a ticket can count towards several special
/// labels; `others` never drops below zero.
pub fn label_distribution(stories: &TicketSet, special_labels: &[String]) -> Vec<Slice> {
    let mut slices: Vec<Slice> = special_labels
        .iter()
        .map(|label| Slice::new(label.as_str(), stories.query_label_substring(label).len(), stories.len()))
        .collect();
    let labelled: usize = slices.iter().map(|slice| slice.count).sum();
    slices.push(Slice::new(
        "others",
        stories.len().saturating_sub(labelled),
        stories.len(),
    ));
    slices
}

/// Where the open work sits: icebox (unscheduled), backlog (unstarted) or
/// started (everything else).
pub fn backlog_distribution(active: &TicketSet) -> Vec<Slice> {
    let icebox = active.query_state(TicketState::Unscheduled).len();
    let backlog = active.query_state(TicketState::Unstarted).len();
    let total = active.len();
    vec![
        Slice::new("icebox", icebox, total),
        Slice::new("backlog", backlog, total),
        Slice::new("started", total.saturating_sub(icebox + backlog), total),
    ]
}
