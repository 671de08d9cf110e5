use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::date_util::{percentage, round1};
use crate::error::{Error, Result};
use crate::metrics::Tone;
use crate::query::{filter_tickets, FilterCriteria};
use crate::table::collate::locale_cmp;
use crate::table::SortDirection;
use crate::ticket::{SlaStatus, Ticket};

/// Whose name a ticket is credited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Resolver,
    Assignee,
}

impl GroupBy {
    pub fn label(&self) -> &'static str {
        match self {
            GroupBy::Resolver => "Resolved By",
            GroupBy::Assignee => "Assigned To",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Resolver => "resolver",
            GroupBy::Assignee => "assignee",
        }
    }

    /// Name `t` is grouped under, "Unspecified" when blank.
    pub fn key_of<'a>(&self, t: &'a Ticket) -> &'a str {
        match self {
            GroupBy::Resolver => t.resolver_name(),
            GroupBy::Assignee => t.assignee_name(),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "resolver" | "resolved" | "resolved-by" => Ok(GroupBy::Resolver),
            "assignee" | "assigned" | "assigned-to" => Ok(GroupBy::Assignee),
            _ => Err(Error::InvalidFilter {
                field: "group-by".into(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaderboardSortKey {
    #[default]
    Total,
    SlaMetRate,
    Reopened,
    HighHop,
    Name,
}

impl LeaderboardSortKey {
    /// Names ascend, counts and rates descend.
    pub fn default_direction(&self) -> SortDirection {
        match self {
            LeaderboardSortKey::Name => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    fn metric(&self, row: &LeaderboardRow) -> f64 {
        match self {
            LeaderboardSortKey::Total => row.total as f64,
            LeaderboardSortKey::SlaMetRate => row.sla_met_rate,
            LeaderboardSortKey::Reopened => row.reopened as f64,
            LeaderboardSortKey::HighHop => row.high_hop as f64,
            LeaderboardSortKey::Name => 0.0,
        }
    }
}

impl FromStr for LeaderboardSortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "total" | "tickets" => Ok(LeaderboardSortKey::Total),
            "sla" | "slametrate" | "slamet" => Ok(LeaderboardSortKey::SlaMetRate),
            "reopened" | "reopens" => Ok(LeaderboardSortKey::Reopened),
            "highhop" | "hops" => Ok(LeaderboardSortKey::HighHop),
            "name" => Ok(LeaderboardSortKey::Name),
            _ => Err(Error::InvalidFilter {
                field: "sort".into(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    /// 1-based position in the current sort order.
    pub rank: usize,
    pub name: String,
    pub total: usize,
    pub reopened: usize,
    pub high_hop: usize,
    pub sla_met: usize,
    /// Percentage, one decimal.
    pub sla_met_rate: f64,
}

impl LeaderboardRow {
    pub fn initials(&self) -> String {
        initials(&self.name)
    }

    pub fn sla_tone(&self) -> Tone {
        sla_tone(self.sla_met_rate)
    }

    pub fn reopened_tone(&self) -> Tone {
        ratio_tone(self.reopened, self.total)
    }

    pub fn high_hop_tone(&self) -> Tone {
        ratio_tone(self.high_hop, self.total)
    }
}

pub fn sla_tone(rate: f64) -> Tone {
    if rate >= 95.0 {
        Tone::Good
    } else if rate >= 85.0 {
        Tone::Warn
    } else {
        Tone::Bad
    }
}

/// Tone for a "lower is better" share such as reopens per ticket.
pub fn ratio_tone(numerator: usize, denominator: usize) -> Tone {
    if denominator == 0 {
        return Tone::Warn;
    }
    let pct = percentage(numerator, denominator);
    if pct <= 2.0 {
        Tone::Good
    } else if pct <= 8.0 {
        Tone::Warn
    } else {
        Tone::Bad
    }
}

/// First letters of the first two words, or the first two letters of a
/// single word, uppercased. "?" for a blank name.
pub fn initials(name: &str) -> String {
    let mut words = name.split_whitespace();
    let Some(first) = words.next() else {
        return "?".to_string();
    };
    let mut out: String = first.chars().take(1).collect();
    match words.next() {
        Some(second) => out.extend(second.chars().take(1)),
        None => out.extend(first.chars().skip(1).take(1)),
    }
    out.to_uppercase()
}

/// One row per distinct name, ranked by total descending.
pub fn build_leaderboard(tickets: &[Ticket], group_by: GroupBy) -> Vec<LeaderboardRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<LeaderboardRow> = Vec::new();

    for t in tickets {
        let name = group_by.key_of(t);
        let i = *index.entry(name).or_insert_with(|| {
            rows.push(LeaderboardRow {
                rank: 0,
                name: name.to_string(),
                total: 0,
                reopened: 0,
                high_hop: 0,
                sla_met: 0,
                sla_met_rate: 0.0,
            });
            rows.len() - 1
        });
        let row = &mut rows[i];
        row.total += 1;
        if t.is_reopened() {
            row.reopened += 1;
        }
        if t.is_high_hop() {
            row.high_hop += 1;
        }
        if t.sla_status == SlaStatus::Met {
            row.sla_met += 1;
        }
    }

    for row in &mut rows {
        row.sla_met_rate = round1(percentage(row.sla_met, row.total));
    }
    sort_leaderboard(&mut rows, LeaderboardSortKey::Total, SortDirection::Desc);
    rows
}

/// Reorder and re-rank. Numeric keys break ties by name ascending whatever
/// the direction.
pub fn sort_leaderboard(rows: &mut [LeaderboardRow], key: LeaderboardSortKey, direction: SortDirection) {
    rows.sort_by(|a, b| match key {
        LeaderboardSortKey::Name => direction.apply(locale_cmp(&a.name, &b.name)),
        _ => {
            let ord = key
                .metric(a)
                .partial_cmp(&key.metric(b))
                .unwrap_or(Ordering::Equal);
            if ord == Ordering::Equal {
                locale_cmp(&a.name, &b.name)
            } else {
                direction.apply(ord)
            }
        }
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
}

/// A ranked, display-ready leaderboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub group_by: GroupBy,
    pub sort_key: LeaderboardSortKey,
    pub direction: SortDirection,
    /// Distinct names before truncation.
    pub people: usize,
    pub tickets: usize,
    /// Top rows only.
    pub rows: Vec<LeaderboardRow>,
}

/// Rank everyone matching `criteria` (the status dimension is ignored) and
/// keep the first `limit` rows.
pub fn leaderboard(
    tickets: &[Ticket],
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
    group_by: GroupBy,
    sort_key: LeaderboardSortKey,
    direction: SortDirection,
    limit: usize,
) -> Leaderboard {
    let scoped = filter_tickets(tickets, &criteria.without_status(), now);
    let mut rows = build_leaderboard(&scoped, group_by);
    sort_leaderboard(&mut rows, sort_key, direction);
    let people = rows.len();
    rows.truncate(limit);
    log::debug!(
        "leaderboard by {group_by}: {people} people over {} tickets",
        scoped.len()
    );
    Leaderboard {
        group_by,
        sort_key,
        direction,
        people,
        tickets: scoped.len(),
        rows,
    }
}
