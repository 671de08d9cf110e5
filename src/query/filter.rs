use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::query::period::{DateRange, Interval};
use crate::ticket::{Priority, Status, Ticket};

/// Filter state for a dashboard view. `None` on a dimension means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub priority: Option<Priority>,
    pub region: Option<String>,
    pub assignment_group: Option<String>,
    pub assignee: Option<String>,
    pub status: Option<Status>,
    pub date_range: DateRange,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn priority(mut self, p: Priority) -> Self {
        self.priority = Some(p);
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn assignment_group(mut self, group: &str) -> Self {
        self.assignment_group = Some(group.to_string());
        self
    }

    pub fn assignee(mut self, name: &str) -> Self {
        self.assignee = Some(name.to_string());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    /// Same criteria with the status dimension reset to "all".
    pub fn without_status(&self) -> Self {
        Self {
            status: None,
            ..self.clone()
        }
    }

    /// Same criteria with the date dimension reset to "all".
    pub fn without_date_range(&self) -> Self {
        Self {
            date_range: DateRange::All,
            ..self.clone()
        }
    }

    /// Number of non-date dimensions that constrain the result.
    pub fn active_count(&self) -> usize {
        [
            self.priority.is_some(),
            self.region.is_some(),
            self.assignment_group.is_some(),
            self.assignee.is_some(),
            self.status.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    /// Attribute checks only; the date dimension is handled by the caller.
    fn matches_attributes(&self, t: &Ticket) -> bool {
        if let Some(p) = self.priority {
            if t.priority != p {
                return false;
            }
        }
        if let Some(ref region) = self.region {
            if &t.region != region {
                return false;
            }
        }
        if let Some(ref group) = self.assignment_group {
            if &t.assignment_group != group {
                return false;
            }
        }
        if let Some(ref assignee) = self.assignee {
            if t.assignee.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }
        if let Some(ref status) = self.status {
            if &t.status != status {
                return false;
            }
        }
        true
    }
}

/// Keep tickets matching every constrained dimension, in input order.
pub fn filter_tickets(tickets: &[Ticket], criteria: &FilterCriteria, now: DateTime<Utc>) -> Vec<Ticket> {
    let interval = criteria.date_range.resolve(now);
    let kept = filter_in_interval(tickets, criteria, interval);
    log::debug!(
        "filter {} -> {} tickets (range {}, interval {:?})",
        tickets.len(),
        kept.len(),
        criteria.date_range,
        interval
    );
    kept
}

/// Like [`filter_tickets`] but against an explicit interval instead of the
/// criteria's own date range. Used for previous-period comparisons.
pub fn filter_in_interval(
    tickets: &[Ticket],
    criteria: &FilterCriteria,
    interval: Option<Interval>,
) -> Vec<Ticket> {
    tickets
        .iter()
        .filter(|t| criteria.matches_attributes(t))
        .filter(|t| interval.map_or(true, |i| i.contains(t.created)))
        .cloned()
        .collect()
}
