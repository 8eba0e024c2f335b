use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::domain::ticket::{Ticket, TicketState, TicketType};
use crate::domain::ticket_set::TicketSet;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_yaml::Error),
    #[error("failed to write report: {0}")]
    Write(#[from] io::Error),
}

/// A ticket as listed in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRow {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub state: TicketState,
    pub estimate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    pub url: String,
}

impl From<&Ticket> for TicketRow {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id(),
            title: ticket.title().to_string(),
            ticket_type: ticket.ticket_type(),
            state: ticket.state(),
            estimate: ticket.estimate(),
            owner: ticket.owner().map(str::to_string),
            requested_by: ticket.requested_by().map(str::to_string),
            labels: ticket.joined_labels(),
            url: ticket.url().to_string(),
        }
    }
}

pub fn ticket_rows(stories: &TicketSet) -> Vec<TicketRow> {
    stories.iter().map(TicketRow::from).collect()
}

pub fn serialize_report_to_yaml<W: Write, T: Serialize>(
    writer: &mut W,
    report: &T,
) -> Result<(), ReportError> {
    let yaml = serde_yaml::to_string(report)?;
    writer.write_all(yaml.as_bytes())?;
    Ok(())
}

pub async fn write_report<T: Serialize>(path: impl AsRef<Path>, report: &T) -> Result<(), ReportError> {
    let mut buffer = Vec::new();
    serialize_report_to_yaml(&mut buffer, report)?;
    tokio::fs::write(path, buffer).await?;
    Ok(())
}
