use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date_util::de;
use crate::error::{Error, Result};

/// Hop count at or above which a ticket counts as "high-hop".
pub const HIGH_HOP_THRESHOLD: u32 = 3;

/// Name used when a grouping field (assignee, resolver) is blank.
pub const UNSPECIFIED: &str = "Unspecified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
    P4,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::P1, Priority::P2, Priority::P3, Priority::P4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
            Priority::P4 => "P4",
        }
    }

    /// Chart label, e.g. "P1 Critical".
    pub fn label(&self) -> &'static str {
        match self {
            Priority::P1 => "P1 Critical",
            Priority::P2 => "P2 High",
            Priority::P3 => "P3 Moderate",
            Priority::P4 => "P4 Low",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    /// Accepts "P1", "p1", "1" and chart labels such as "P1 Critical".
    fn from_str(s: &str) -> Result<Self> {
        let head = s.split_whitespace().next().unwrap_or("").to_ascii_uppercase();
        match head.trim_start_matches('P') {
            "1" => Ok(Priority::P1),
            "2" => Ok(Priority::P2),
            "3" => Ok(Priority::P3),
            "4" => Ok(Priority::P4),
            _ => Err(Error::InvalidFilter {
                field: "priority".into(),
                value: s.to_string(),
            }),
        }
    }
}

/// Per-priority counters laid out P1..P4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
    pub p4: usize,
}

impl PriorityCounts {
    pub fn increment(&mut self, priority: Priority) {
        match priority {
            Priority::P1 => self.p1 += 1,
            Priority::P2 => self.p2 += 1,
            Priority::P3 => self.p3 += 1,
            Priority::P4 => self.p4 += 1,
        }
    }

    pub fn get(&self, priority: Priority) -> usize {
        [self.p1, self.p2, self.p3, self.p4][priority.index()]
    }

    pub fn total(&self) -> usize {
        self.p1 + self.p2 + self.p3 + self.p4
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Pending,
    Resolved,
    Closed,
    Cancelled,
    #[serde(untagged)]
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Pending => "Pending",
            Status::Resolved => "Resolved",
            Status::Closed => "Closed",
            Status::Cancelled => "Cancelled",
            Status::Other(s) => s,
        }
    }

    /// Backlog = Open or In Progress.
    pub fn is_backlog(&self) -> bool {
        matches!(self, Status::Open | Status::InProgress)
    }
}

/// Snapshot statuses go through [`Status::from_str`], so "open" and "Open"
/// are the same status. Anything unrecognized (even blank) is kept verbatim.
impl<'de> Deserialize<'de> for Status {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse::<Status>().unwrap_or(Status::Other(raw)))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Ok(match s.to_lowercase().as_str() {
            "open" => Status::Open,
            "in progress" | "in-progress" | "in_progress" => Status::InProgress,
            "pending" => Status::Pending,
            "resolved" => Status::Resolved,
            "closed" => Status::Closed,
            "cancelled" | "canceled" => Status::Cancelled,
            "" => {
                return Err(Error::InvalidFilter {
                    field: "status".into(),
                    value: s.to_string(),
                })
            }
            _ => Status::Other(s.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlaStatus {
    Met,
    Breached,
}

impl SlaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaStatus::Met => "met",
            SlaStatus::Breached => "breached",
        }
    }
}

impl FromStr for SlaStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "met" => Ok(SlaStatus::Met),
            "breached" => Ok(SlaStatus::Breached),
            _ => Err(Error::InvalidFilter {
                field: "sla".into(),
                value: s.to_string(),
            }),
        }
    }
}

/// One support incident from a snapshot. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub ticket_id: String,
    #[serde(default)]
    pub title: String,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub assignment_group: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub resolver: Option<String>,
    #[serde(deserialize_with = "de::timestamp")]
    pub created: DateTime<Utc>,
    #[serde(default, alias = "resolvedAt", deserialize_with = "de::timestamp_opt")]
    pub resolved: Option<DateTime<Utc>>,
    pub sla_status: SlaStatus,
    #[serde(default, deserialize_with = "de::lenient_count")]
    pub reassignment_count: u32,
    #[serde(default)]
    pub reopen_count: Option<u32>,
}

impl Ticket {
    pub fn is_backlog(&self) -> bool {
        self.status.is_backlog()
    }

    /// Reopen predicate shared by every aggregation: an explicit reopen count
    /// wins when present, otherwise the title or status mentions a reopen.
    pub fn is_reopened(&self) -> bool {
        if let Some(count) = self.reopen_count {
            return count > 0;
        }
        let title = self.title.to_lowercase();
        let status = self.status.as_str().to_lowercase();
        title.contains("reopen") || title.contains("re-open") || status.contains("reopen")
    }

    pub fn is_high_hop(&self) -> bool {
        self.reassignment_count >= HIGH_HOP_THRESHOLD
    }

    /// Hours between creation and resolution. `None` while unresolved.
    /// Resolutions stamped before creation count as zero.
    pub fn resolution_hours(&self) -> Option<f64> {
        self.resolved.map(|resolved| {
            let secs = (resolved - self.created).num_seconds().max(0);
            secs as f64 / 3600.0
        })
    }

    /// Whole days outstanding: until resolution when resolved, else until `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        let until = self.resolved.unwrap_or(now);
        (until - self.created).num_days().max(0)
    }

    /// Assignee name, or [`UNSPECIFIED`] when blank.
    pub fn assignee_name(&self) -> &str {
        display_name(self.assignee.as_deref())
    }

    /// Resolver name, or [`UNSPECIFIED`] when blank.
    pub fn resolver_name(&self) -> &str {
        display_name(self.resolver.as_deref())
    }
}

fn display_name(raw: Option<&str>) -> &str {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => UNSPECIFIED,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Reference "now" used throughout the test suites: 2026-10-19 12:00 UTC.
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    pub fn ticket(id: &str, priority: Priority, status: Status) -> Ticket {
        Ticket {
            ticket_id: id.to_string(),
            title: format!("Incident {id}"),
            priority,
            status,
            assignment_group: "Service Desk".to_string(),
            region: "EMEA".to_string(),
            assignee: Some("Alice".to_string()),
            resolver: None,
            created: now() - chrono::Duration::days(1),
            resolved: None,
            sla_status: SlaStatus::Met,
            reassignment_count: 0,
            reopen_count: None,
        }
    }

    pub fn days_ago(mut t: Ticket, days: i64) -> Ticket {
        t.created = now() - chrono::Duration::days(days);
        t
    }

    pub fn resolved_after(mut t: Ticket, hours: i64) -> Ticket {
        t.resolved = Some(t.created + chrono::Duration::hours(hours));
        t.status = Status::Resolved;
        t
    }
}
