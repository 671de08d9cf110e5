use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::ticket::{Priority, PriorityCounts};

/// Headline numbers for a ticket set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_tickets: usize,
    /// Open or In Progress.
    pub backlog_tickets: usize,
    /// Percentage, one decimal.
    pub sla_met_rate: f64,
    /// Mean resolution time in hours over resolved tickets, one decimal.
    pub mttr: f64,
    /// Percentage, one decimal.
    pub reopen_rate: f64,
    pub high_hop_tickets: usize,
}

/// The six KPI cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KpiKind {
    TotalTickets,
    Backlog,
    SlaMet,
    Mttr,
    ReopenRate,
    HighHop,
}

impl KpiKind {
    pub const ALL: [KpiKind; 6] = [
        KpiKind::TotalTickets,
        KpiKind::Backlog,
        KpiKind::SlaMet,
        KpiKind::Mttr,
        KpiKind::ReopenRate,
        KpiKind::HighHop,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            KpiKind::TotalTickets => "Total Tickets",
            KpiKind::Backlog => "Backlog",
            KpiKind::SlaMet => "SLA Met %",
            KpiKind::Mttr => "MTTR (hrs)",
            KpiKind::ReopenRate => "Reopen Rate %",
            KpiKind::HighHop => "High-Hop Tickets",
        }
    }

    /// Whether an increase is an improvement.
    pub fn higher_is_good(&self) -> bool {
        matches!(self, KpiKind::TotalTickets | KpiKind::SlaMet)
    }

    pub fn value(&self, kpis: &Kpis) -> f64 {
        match self {
            KpiKind::TotalTickets => kpis.total_tickets as f64,
            KpiKind::Backlog => kpis.backlog_tickets as f64,
            KpiKind::SlaMet => kpis.sla_met_rate,
            KpiKind::Mttr => kpis.mttr,
            KpiKind::ReopenRate => kpis.reopen_rate,
            KpiKind::HighHop => kpis.high_hop_tickets as f64,
        }
    }
}

/// Severity band of a KPI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiStatus {
    High,
    Moderate,
    Low,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

/// Whether a movement is good news for the metric it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Good,
    Warn,
    Bad,
    Neutral,
}

/// Change of a value relative to the previous period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    /// Absolute percent change, one decimal.
    pub value: f64,
    pub direction: TrendDirection,
    pub label: String,
}

impl Trend {
    pub fn tone(&self, higher_is_good: bool) -> Tone {
        match (self.direction, higher_is_good) {
            (TrendDirection::Neutral, _) => Tone::Neutral,
            (TrendDirection::Up, true) | (TrendDirection::Down, false) => Tone::Good,
            (TrendDirection::Up, false) | (TrendDirection::Down, true) => Tone::Bad,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction {
            TrendDirection::Up => "▲",
            TrendDirection::Down => "▼",
            TrendDirection::Neutral => "•",
        };
        write!(f, "{arrow} {:.1}% {}", self.value, self.label)
    }
}

/// One KPI card: current value, band and movement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiCard {
    pub kind: KpiKind,
    pub title: &'static str,
    pub value: f64,
    pub previous: f64,
    pub status: KpiStatus,
    pub trend: Trend,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCount {
    pub priority: Priority,
    pub label: &'static str,
    pub count: usize,
}

/// Count for a named category (assignment group, assignee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AgeBucket {
    #[serde(rename = "0-2")]
    UpTo2,
    #[serde(rename = "3-7")]
    UpTo7,
    #[serde(rename = "8-14")]
    UpTo14,
    #[serde(rename = "15-30")]
    UpTo30,
    #[serde(rename = ">30")]
    Over30,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 5] = [
        AgeBucket::UpTo2,
        AgeBucket::UpTo7,
        AgeBucket::UpTo14,
        AgeBucket::UpTo30,
        AgeBucket::Over30,
    ];

    pub fn from_days(days: i64) -> Self {
        match days {
            i64::MIN..=2 => AgeBucket::UpTo2,
            3..=7 => AgeBucket::UpTo7,
            8..=14 => AgeBucket::UpTo14,
            15..=30 => AgeBucket::UpTo30,
            _ => AgeBucket::Over30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::UpTo2 => "0-2",
            AgeBucket::UpTo7 => "3-7",
            AgeBucket::UpTo14 => "8-14",
            AgeBucket::UpTo30 => "15-30",
            AgeBucket::Over30 => ">30",
        }
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().trim_end_matches(" days").trim_end_matches('d');
        match s {
            "0-2" => Ok(AgeBucket::UpTo2),
            "3-7" => Ok(AgeBucket::UpTo7),
            "8-14" => Ok(AgeBucket::UpTo14),
            "15-30" => Ok(AgeBucket::UpTo30),
            ">30" | "30+" => Ok(AgeBucket::Over30),
            _ => Err(Error::InvalidSelection(format!("unknown age bucket: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeingRow {
    pub bucket: AgeBucket,
    pub counts: PriorityCounts,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMttr {
    pub date: NaiveDate,
    /// Mean resolution hours of tickets resolved that day, one decimal.
    pub mttr: f64,
    pub resolved: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaRow {
    pub priority: Priority,
    pub label: &'static str,
    pub met: usize,
    pub breached: usize,
    pub met_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityMttr {
    pub priority: Priority,
    pub label: &'static str,
    pub mttr: f64,
    pub resolved: usize,
}

/// One trailing 7-day window; `W1` is the most recent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReopenWeek {
    pub week: String,
    pub index: usize,
    pub tickets: usize,
    pub reopened: usize,
    pub rate: f64,
}
