use crate::domain::cabinet::{
    Client, Task, TimesheetEntry, calendar_date, minutes_between, parse_clock,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use time::Date;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimesheetFilter {
    /// Inclusive.
    pub from: Option<Date>,
    /// Inclusive.
    pub to: Option<Date>,
    pub client_id: Option<String>,
}

impl TimesheetFilter {
    pub fn matches(&self, entry: &TimesheetEntry) -> bool {
        if self.from.is_some_and(|from| entry.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| entry.date > to) {
            return false;
        }
        match &self.client_id {
            Some(client_id) => entry.client_ref.as_deref() == Some(client_id.as_str()),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillableSplit {
    pub billable_minutes: u64,
    pub billable_amount: f64,
    pub non_billable_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTimeSummary {
    pub client_id: String,
    pub company: String,
    pub minutes: u64,
    pub billable_amount: f64,
    pub total_fees: f64,
    pub theoretical_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetSummary {
    pub total_minutes: u64,
    pub total_label: String,
    pub by_task: BTreeMap<String, u64>,
    pub billable: BillableSplit,
    pub clients: Vec<ClientTimeSummary>,
}

/// Sums the entries matching `filter`. Every client in `clients` (only the filtered one when a
/// client filter is set) gets a row; time without a client, or logged on a client outside that
/// list, counts in the totals only.
pub fn aggregate(
    entries: &[TimesheetEntry],
    clients: &[Client],
    filter: &TimesheetFilter,
) -> TimesheetSummary {
    let mut rows: Vec<ClientTimeSummary> = clients
        .iter()
        .filter(|client| {
            filter
                .client_id
                .as_deref()
                .is_none_or(|client_id| client.id == client_id)
        })
        .map(|client| ClientTimeSummary {
            client_id: client.id.clone(),
            company: client.company.clone(),
            minutes: 0,
            billable_amount: 0.0,
            total_fees: client.total_fees(),
            theoretical_time: client.theoretical_time,
        })
        .collect();
    let row_index: HashMap<String, usize> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| (row.client_id.clone(), index))
        .collect();

    let mut summary = TimesheetSummary::default();
    for entry in entries.iter().filter(|entry| filter.matches(entry)) {
        let minutes = entry.minutes();
        let amount = entry.billed_amount();

        summary.total_minutes += minutes;
        *summary
            .by_task
            .entry(entry.task.label().to_string())
            .or_default() += minutes;
        if entry.billable {
            summary.billable.billable_minutes += minutes;
            summary.billable.billable_amount += amount;
        } else {
            summary.billable.non_billable_minutes += minutes;
        }

        if let Some(index) = entry
            .client_ref
            .as_deref()
            .and_then(|client_id| row_index.get(client_id))
        {
            rows[*index].minutes += minutes;
            rows[*index].billable_amount += amount;
        }
    }

    summary.total_label = format_minutes(summary.total_minutes);
    summary.clients = rows;

    summary
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySheet {
    #[serde(with = "calendar_date")]
    pub date: Date,
    pub entries: Vec<TimesheetEntry>,
    pub total_minutes: u64,
    pub total_label: String,
}

pub fn day_sheet(entries: &[TimesheetEntry], date: Date) -> DaySheet {
    let entries: Vec<TimesheetEntry> = entries
        .iter()
        .filter(|entry| entry.date == date)
        .cloned()
        .collect();
    let total_minutes = entries.iter().map(TimesheetEntry::minutes).sum();

    DaySheet {
        date,
        entries,
        total_minutes,
        total_label: format_minutes(total_minutes),
    }
}

pub fn format_minutes(minutes: u64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// New entries
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimesheetEntry {
    #[serde(with = "calendar_date")]
    pub date: Date,
    #[serde(default)]
    pub collaborator: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    pub task: Task,
    #[serde(alias = "start")]
    pub start_time: String,
    #[serde(alias = "end")]
    pub end_time: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub billable_amount: Option<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TimesheetEntryError {
    #[error("start and end must be HH:MM times")]
    InvalidTime,

    #[error("end time must be after start time")]
    EndNotAfterStart,

    #[error("billable amount must be a non-negative number")]
    InvalidAmount,

    #[error("entry has no collaborator")]
    MissingCollaborator,
}

impl NewTimesheetEntry {
    /// Checks the entry and derives its duration. Entries ending at or before their start are
    /// rejected here so they never reach storage.
    pub fn validate(self) -> Result<TimesheetEntry, TimesheetEntryError> {
        if parse_clock(&self.start_time).is_none() || parse_clock(&self.end_time).is_none()
        {
            return Err(TimesheetEntryError::InvalidTime);
        }
        let duration = minutes_between(&self.start_time, &self.end_time)
            .ok_or(TimesheetEntryError::EndNotAfterStart)?;
        let collaborator = self
            .collaborator
            .filter(|id| !id.trim().is_empty())
            .ok_or(TimesheetEntryError::MissingCollaborator)?;

        let billable_amount = if self.billable {
            match self.billable_amount {
                Some(amount) if !amount.is_finite() || amount < 0.0 => {
                    return Err(TimesheetEntryError::InvalidAmount);
                }
                amount => amount,
            }
        } else {
            None
        };

        Ok(TimesheetEntry {
            id: None,
            date: self.date,
            collaborator_ref: Some(collaborator),
            client_ref: self.client.filter(|id| !id.is_empty() && id != "none"),
            client_name: None,
            task: self.task,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: u32::try_from(duration).unwrap_or(u32::MAX),
            comment: self.comment.filter(|comment| !comment.trim().is_empty()),
            billable: self.billable,
            billable_amount,
        })
    }
}
