//! Chart selections and the ticket rows behind them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::leaderboard::GroupBy;
use crate::metrics::{in_reopen_week, week_label, AgeBucket, REOPEN_WEEKS};
use crate::table::{Column, DrillDownTable, PageSize, Row};
use crate::ticket::{Priority, SlaStatus, Ticket};

const CREATED_FMT: &str = "%Y-%m-%d %H:%M";

/// A clicked chart element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Selection {
    /// Backlog tickets of one priority.
    Priority(Priority),
    /// Backlog tickets of one assignment group.
    Group(String),
    /// Backlog tickets of one assignee.
    Assignee(String),
    /// Backlog tickets in an age bin, optionally one priority only.
    AgeBucket {
        bucket: AgeBucket,
        priority: Option<Priority>,
    },
    Sla {
        priority: Priority,
        status: SlaStatus,
    },
    InflowDay(NaiveDate),
    BacklogDay(NaiveDate),
    MttrDay(NaiveDate),
    /// Reopened tickets in trailing week `index` (0 = most recent).
    ReopenWeek(usize),
    Leader {
        group_by: GroupBy,
        name: String,
    },
}

impl Selection {
    /// Whether `t` belongs to the selected chart element.
    pub fn matches(&self, t: &Ticket, now: DateTime<Utc>) -> bool {
        match self {
            Selection::Priority(p) => t.is_backlog() && t.priority == *p,
            Selection::Group(g) => t.is_backlog() && &t.assignment_group == g,
            Selection::Assignee(name) => t.is_backlog() && t.assignee_name() == name,
            Selection::AgeBucket { bucket, priority } => {
                t.is_backlog()
                    && AgeBucket::from_days(t.age_days(now)) == *bucket
                    && priority.map_or(true, |p| t.priority == p)
            }
            Selection::Sla { priority, status } => {
                t.priority == *priority && t.sla_status == *status
            }
            Selection::InflowDay(d) => t.created.date_naive() == *d,
            Selection::BacklogDay(d) => t.is_backlog() && t.created.date_naive() == *d,
            Selection::MttrDay(d) => t.resolved.is_some_and(|r| r.date_naive() == *d),
            Selection::ReopenWeek(i) => in_reopen_week(t, *i, now) && t.is_reopened(),
            Selection::Leader { group_by, name } => group_by.key_of(t) == name,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Selection::Priority(p) => format!("{} backlog", p.label()),
            Selection::Group(g) => format!("{g} backlog"),
            Selection::Assignee(name) => format!("Backlog assigned to {name}"),
            Selection::AgeBucket { bucket, priority } => match priority {
                Some(p) => format!("{p} tickets aged {bucket} days"),
                None => format!("Tickets aged {bucket} days"),
            },
            Selection::Sla { priority, status } => {
                format!("{} - SLA {}", priority.label(), status.as_str())
            }
            Selection::InflowDay(d) => format!("Tickets created {d}"),
            Selection::BacklogDay(d) => format!("Backlog created {d}"),
            Selection::MttrDay(d) => format!("Tickets resolved {d}"),
            Selection::ReopenWeek(i) => format!("Reopened tickets {}", week_label(*i)),
            Selection::Leader { group_by, name } => format!("{}: {name}", group_by.label()),
        }
    }

    fn column_keys(&self) -> &'static [&'static str] {
        match self {
            Selection::Priority(_) => &["ticketId", "title", "status", "assignee", "created"],
            Selection::Group(_) => &["ticketId", "title", "priority", "status", "age"],
            Selection::Assignee(_) => &["ticketId", "title", "priority", "status", "age"],
            Selection::AgeBucket { .. } => {
                &["ticketId", "title", "priority", "age", "status", "assignee"]
            }
            Selection::Sla { .. } => &[
                "ticketId", "title", "priority", "status", "slaStatus", "assignee", "created",
            ],
            Selection::InflowDay(_) => &["ticketId", "title", "priority", "status", "created"],
            Selection::BacklogDay(_) => &["ticketId", "title", "priority", "age", "assignee"],
            Selection::MttrDay(_) => &["ticketId", "title", "priority", "status", "mttr", "created"],
            Selection::ReopenWeek(_) => {
                &["ticketId", "title", "priority", "status", "assignee", "created"]
            }
            Selection::Leader { .. } => &[
                "ticketId",
                "title",
                "priority",
                "status",
                "assignedTo",
                "resolvedBy",
                "created",
                "reopened",
                "hops",
                "sla",
            ],
        }
    }
}

fn column_label(key: &str) -> &'static str {
    match key {
        "ticketId" => "Ticket ID",
        "title" => "Title",
        "priority" => "Priority",
        "status" => "Status",
        "assignee" | "assignedTo" => "Assigned To",
        "resolvedBy" => "Resolved By",
        "created" => "Created",
        "age" => "Age (days)",
        "slaStatus" => "SLA Status",
        "sla" => "SLA",
        "mttr" => "MTTR (hrs)",
        "reopened" => "Reopened",
        "hops" => "Hops",
        _ => "",
    }
}

fn cell(t: &Ticket, key: &str, now: DateTime<Utc>) -> Value {
    match key {
        "ticketId" => json!(t.ticket_id),
        "title" => json!(t.title),
        "priority" => json!(t.priority.as_str()),
        "status" => json!(t.status.as_str()),
        "assignee" | "assignedTo" => json!(t.assignee),
        "resolvedBy" => json!(t.resolver.as_deref().unwrap_or("")),
        "created" => json!(t.created.format(CREATED_FMT).to_string()),
        "age" => json!(t.age_days(now)),
        "slaStatus" | "sla" => json!(t.sla_status.as_str()),
        "mttr" => json!(t.resolution_hours().map(crate::date_util::round1)),
        "reopened" => json!(if t.is_reopened() { "yes" } else { "no" }),
        "hops" => json!(t.reassignment_count),
        _ => Value::Null,
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Priority(p) => write!(f, "priority:{p}"),
            Selection::Group(g) => write!(f, "group:{g}"),
            Selection::Assignee(name) => write!(f, "owner:{name}"),
            Selection::AgeBucket { bucket, priority } => match priority {
                Some(p) => write!(f, "age:{bucket}:{p}"),
                None => write!(f, "age:{bucket}"),
            },
            Selection::Sla { priority, status } => write!(f, "sla:{priority}:{}", status.as_str()),
            Selection::InflowDay(d) => write!(f, "inflow:{d}"),
            Selection::BacklogDay(d) => write!(f, "backlog:{d}"),
            Selection::MttrDay(d) => write!(f, "mttr:{d}"),
            Selection::ReopenWeek(i) => write!(f, "reopen:{}", week_label(*i)),
            Selection::Leader { group_by, name } => write!(f, "{group_by}:{name}"),
        }
    }
}

fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidSelection(format!("expected YYYY-MM-DD, got {s:?}")))
}

fn non_empty(s: &str, what: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        Err(Error::InvalidSelection(format!("missing {what}")))
    } else {
        Ok(s.to_string())
    }
}

impl FromStr for Selection {
    type Err = Error;

    /// `<kind>:<value>[:<value>]`, for example `priority:P1`,
    /// `age:8-14:P2`, `sla:P1:breached`, `inflow:2026-10-01`, `reopen:W2`,
    /// `resolver:Alice`.
    fn from_str(s: &str) -> Result<Self> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidSelection(format!("expected <kind>:<value>, got {s:?}")))?;

        let sel = match kind.trim().to_lowercase().as_str() {
            "priority" => Selection::Priority(rest.parse()?),
            "group" => Selection::Group(non_empty(rest, "group name")?),
            "owner" => Selection::Assignee(non_empty(rest, "assignee name")?),
            "age" => {
                let (bucket, priority) = match rest.rsplit_once(':') {
                    Some((b, p)) => (b, Some(p.parse::<Priority>()?)),
                    None => (rest, None),
                };
                Selection::AgeBucket {
                    bucket: bucket.parse()?,
                    priority,
                }
            }
            "sla" => {
                let (p, status) = rest.split_once(':').ok_or_else(|| {
                    Error::InvalidSelection("expected sla:<priority>:<met|breached>".into())
                })?;
                Selection::Sla {
                    priority: p.parse()?,
                    status: status.parse()?,
                }
            }
            "inflow" => Selection::InflowDay(parse_day(rest)?),
            "backlog" => Selection::BacklogDay(parse_day(rest)?),
            "mttr" => Selection::MttrDay(parse_day(rest)?),
            "reopen" => {
                let n: usize = rest
                    .trim()
                    .trim_start_matches(['W', 'w'])
                    .parse()
                    .map_err(|_| Error::InvalidSelection(format!("bad week: {rest:?}")))?;
                if n == 0 || n > REOPEN_WEEKS {
                    return Err(Error::InvalidSelection(format!(
                        "week must be W1..W{REOPEN_WEEKS}, got {rest:?}"
                    )));
                }
                Selection::ReopenWeek(n - 1)
            }
            "resolver" | "assignee" => Selection::Leader {
                group_by: kind.parse()?,
                name: non_empty(rest, "name")?,
            },
            other => {
                return Err(Error::InvalidSelection(format!(
                    "unknown selection kind: {other}"
                )))
            }
        };
        Ok(sel)
    }
}

/// Rows behind one selection, ready for a [`DrillDownTable`].
#[derive(Debug, Clone, Serialize)]
pub struct DrillDown {
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl DrillDown {
    pub fn into_table(self, page_size: PageSize) -> DrillDownTable {
        let mut table = DrillDownTable::new(page_size);
        table.open(&self.title, self.columns, self.rows);
        table
    }
}

/// Select the tickets behind `selection` and project them into rows, in
/// input order.
pub fn drill_down(tickets: &[Ticket], selection: &Selection, now: DateTime<Utc>) -> DrillDown {
    let keys = selection.column_keys();
    let columns = keys
        .iter()
        .map(|k| Column::new(k, column_label(k)))
        .collect();
    let rows: Vec<Row> = tickets
        .iter()
        .filter(|t| selection.matches(t, now))
        .map(|t| keys.iter().map(|k| (k.to_string(), cell(t, k, now))).collect())
        .collect();
    log::debug!("drill-down {selection}: {} rows", rows.len());

    DrillDown {
        title: selection.title(),
        columns,
        rows,
    }
}
