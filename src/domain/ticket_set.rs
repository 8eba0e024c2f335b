use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::ticket::{Ticket, TicketState, TicketType};

/// An ordered collection of tickets and the queries over it.
///
/// Every query leaves `self` untouched and returns a new set that shares the
/// underlying tickets. Order follows load order and is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketSet {
    tickets: Vec<Arc<Ticket>>,
}

impl TicketSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter().map(Arc::as_ref)
    }

    /// Sum of the story point estimates in the set.
    pub fn total_estimate(&self) -> u32 {
        self.iter().map(Ticket::estimate).sum()
    }

    fn filter<F>(&self, predicate: F) -> TicketSet
    where
        F: Fn(&Ticket) -> bool,
    {
        TicketSet {
            tickets: self
                .tickets
                .iter()
                .filter(|ticket| predicate(ticket))
                .cloned()
                .collect(),
        }
    }

    /// Tickets accepted strictly after `start` and strictly before `end`.
    pub fn query_accepted_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> TicketSet {
        self.filter(|ticket| {
            ticket
                .accepted_at()
                .is_some_and(|accepted| start < accepted && accepted < end)
        })
    }

    /// Tickets created strictly after `start` and strictly before `end`.
    pub fn query_created_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> TicketSet {
        self.filter(|ticket| start < ticket.created_at() && ticket.created_at() < end)
    }

    pub fn query_created_and_accepted_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TicketSet {
        self.query_created_between(start, end)
            .query_accepted_between(start, end)
    }

    /// Tickets that are not accepted yet.
    pub fn query_active(&self) -> TicketSet {
        self.query_not_state(TicketState::Accepted)
    }

    pub fn query_state(&self, state: TicketState) -> TicketSet {
        self.filter(|ticket| ticket.state() == state)
    }

    pub fn query_not_state(&self, state: TicketState) -> TicketSet {
        self.filter(|ticket| ticket.state() != state)
    }

    pub fn query_type(&self, ticket_type: TicketType) -> TicketSet {
        self.filter(|ticket| ticket.ticket_type() == ticket_type)
    }

    /// Tickets whose joined owner names contain `owner`.
    ///
    /// This is a substring match: `"Al"` also selects tickets owned by
    /// `"Alice"`, and a multi-owner ticket matches each of its owners.
    pub fn query_owner_substring(&self, owner: &str) -> TicketSet {
        self.filter(|ticket| ticket.has_owner_substring(owner))
    }

    /// Tickets whose joined labels contain `label` (`"5"` matches `"25"`).
    pub fn query_label_substring(&self, label: &str) -> TicketSet {
        self.filter(|ticket| ticket.has_label_substring(label))
    }

    /// Complement of [`TicketSet::query_label_substring`]; unlabelled tickets
    /// always pass.
    pub fn query_not_label_substring(&self, label: &str) -> TicketSet {
        self.filter(|ticket| !ticket.has_label_substring(label))
    }

    /// Distinct non-empty owner strings, sorted.
    pub fn query_unique_owners(&self) -> Vec<String> {
        self.iter()
            .filter_map(Ticket::owner)
            .filter(|owner| !owner.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// All ticket states; fixed, independent of the data.
    pub fn query_unique_states(&self) -> &'static [TicketState] {
        &TicketState::ALL
    }

    /// All ticket types; fixed, independent of the data.
    pub fn query_unique_types(&self) -> &'static [TicketType] {
        &TicketType::ALL
    }

    /// The earliest created ticket that is not accepted.
    pub fn query_oldest_active(&self) -> Option<&Ticket> {
        self.iter()
            .filter(|ticket| !ticket.is_accepted())
            .min_by_key(|ticket| ticket.created_at())
    }

    /// The ticket with the earliest acceptance date.
    pub fn query_oldest_accepted(&self) -> Option<&Ticket> {
        self.iter()
            .filter_map(|ticket| ticket.accepted_at().map(|accepted| (accepted, ticket)))
            .min_by_key(|(accepted, _)| *accepted)
            .map(|(_, ticket)| ticket)
    }
}

impl FromIterator<Ticket> for TicketSet {
    fn from_iter<I: IntoIterator<Item = Ticket>>(iter: I) -> Self {
        TicketSet {
            tickets: iter.into_iter().map(Arc::new).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TicketSet {
    type Item = &'a Ticket;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, Arc<Ticket>>, fn(&'a Arc<Ticket>) -> &'a Ticket>;

    fn into_iter(self) -> Self::IntoIter {
        self.tickets.iter().map(Arc::as_ref as fn(&'a Arc<Ticket>) -> &'a Ticket)
    }
}
