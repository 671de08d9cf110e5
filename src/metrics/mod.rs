pub mod series;
pub mod types;

pub use series::{backlog_trend, inflow_trend, mttr_trend, series_days};
pub use types::*;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::date_util::{percentage, round1};
use crate::query::{filter_in_interval, filter_tickets, FilterCriteria};
use crate::ticket::{Priority, PriorityCounts, SlaStatus, Ticket};

pub const TREND_LABEL: &str = "vs last period";

/// Number of trailing weekly windows in the reopen trend.
pub const REOPEN_WEEKS: usize = 4;

/// Headline KPIs. Empty input yields all zeros.
pub fn calculate_kpis(tickets: &[Ticket]) -> Kpis {
    let total = tickets.len();
    let backlog = tickets.iter().filter(|t| t.is_backlog()).count();
    let met = tickets
        .iter()
        .filter(|t| t.sla_status == SlaStatus::Met)
        .count();
    let reopened = tickets.iter().filter(|t| t.is_reopened()).count();
    let high_hop = tickets.iter().filter(|t| t.is_high_hop()).count();

    Kpis {
        total_tickets: total,
        backlog_tickets: backlog,
        sla_met_rate: round1(percentage(met, total)),
        mttr: round1(mean_resolution_hours(tickets.iter()).0),
        reopen_rate: round1(percentage(reopened, total)),
        high_hop_tickets: high_hop,
    }
}

/// Mean resolution hours and the number of resolved tickets that went into it.
fn mean_resolution_hours<'a>(tickets: impl Iterator<Item = &'a Ticket>) -> (f64, usize) {
    let (sum, n) = tickets
        .filter_map(|t| t.resolution_hours())
        .fold((0.0, 0usize), |(sum, n), h| (sum + h, n + 1));
    if n == 0 {
        (0.0, 0)
    } else {
        (sum / n as f64, n)
    }
}

/// Percent change from `previous` to `current`.
pub fn trend(current: f64, previous: f64) -> Trend {
    if previous == 0.0 {
        let (value, direction) = if current > 0.0 {
            (100.0, TrendDirection::Up)
        } else {
            (0.0, TrendDirection::Neutral)
        };
        return Trend {
            value,
            direction,
            label: TREND_LABEL.to_string(),
        };
    }

    let direction = if current > previous {
        TrendDirection::Up
    } else if current < previous {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };
    Trend {
        value: round1((current - previous).abs() / previous.abs() * 100.0),
        direction,
        label: TREND_LABEL.to_string(),
    }
}

/// Severity band for a KPI value under the configured thresholds.
pub fn kpi_status(kind: KpiKind, value: f64, config: &Config) -> KpiStatus {
    let above = |high: f64, moderate: f64| {
        if value > high {
            KpiStatus::High
        } else if value > moderate {
            KpiStatus::Moderate
        } else {
            KpiStatus::Low
        }
    };
    match kind {
        KpiKind::TotalTickets => KpiStatus::Neutral,
        KpiKind::Backlog => above(config.backlog_high as f64, config.backlog_moderate as f64),
        KpiKind::SlaMet => {
            if value < config.sla_high_below {
                KpiStatus::High
            } else if value < config.sla_moderate_below {
                KpiStatus::Moderate
            } else {
                KpiStatus::Low
            }
        }
        KpiKind::Mttr => above(config.mttr_high_hours, config.mttr_moderate_hours),
        KpiKind::ReopenRate => above(config.reopen_high_pct, config.reopen_moderate_pct),
        KpiKind::HighHop => above(config.high_hop_high as f64, config.high_hop_moderate as f64),
    }
}

/// The six KPI cards for `criteria`, each compared against the window of
/// identical length immediately before the active range. An unbounded
/// range has no previous window and compares against an empty set.
pub fn kpi_trends(
    tickets: &[Ticket],
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
    config: &Config,
) -> Vec<KpiCard> {
    let current = calculate_kpis(&filter_tickets(tickets, criteria, now));
    let previous = match criteria.date_range.previous_interval(now) {
        Some(window) => calculate_kpis(&filter_in_interval(tickets, criteria, Some(window))),
        None => Kpis::default(),
    };
    log::debug!(
        "kpi trends: {} tickets now, {} in previous window",
        current.total_tickets,
        previous.total_tickets
    );

    KpiKind::ALL
        .into_iter()
        .map(|kind| {
            let value = kind.value(&current);
            let before = kind.value(&previous);
            let trend = trend(value, before);
            let tone = trend.tone(kind.higher_is_good());
            KpiCard {
                kind,
                title: kind.label(),
                value,
                previous: before,
                status: kpi_status(kind, value, config),
                trend,
                tone,
            }
        })
        .collect()
}

/// Backlog tickets per priority, highest count first. Ties keep P1..P4 order.
pub fn tickets_by_priority(tickets: &[Ticket]) -> Vec<PriorityCount> {
    let mut counts = PriorityCounts::default();
    for t in tickets.iter().filter(|t| t.is_backlog()) {
        counts.increment(t.priority);
    }
    let mut rows: Vec<PriorityCount> = Priority::ALL
        .into_iter()
        .map(|p| PriorityCount {
            priority: p,
            label: p.label(),
            count: counts.get(p),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

fn top_counts<'a>(names: impl Iterator<Item = &'a str>, top_n: usize) -> Vec<NamedCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    let mut rows: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount {
            name: name.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    rows.truncate(top_n);
    rows
}

/// Tickets per assignment group, top `top_n`. The caller picks the subset.
pub fn tickets_by_group(tickets: &[Ticket], top_n: usize) -> Vec<NamedCount> {
    top_counts(tickets.iter().map(|t| t.assignment_group.as_str()), top_n)
}

/// Backlog tickets per assignee, top `top_n`.
pub fn backlog_by_assignee(tickets: &[Ticket], top_n: usize) -> Vec<NamedCount> {
    top_counts(
        tickets
            .iter()
            .filter(|t| t.is_backlog())
            .map(|t| t.assignee_name()),
        top_n,
    )
}

/// Backlog tickets binned by age against `now`, with per-priority counts.
pub fn ageing_buckets(tickets: &[Ticket], now: DateTime<Utc>) -> Vec<AgeingRow> {
    let mut rows: Vec<AgeingRow> = AgeBucket::ALL
        .into_iter()
        .map(|bucket| AgeingRow {
            bucket,
            counts: PriorityCounts::default(),
            total: 0,
        })
        .collect();

    for t in tickets.iter().filter(|t| t.is_backlog()) {
        let bucket = AgeBucket::from_days(t.age_days(now));
        if let Some(row) = rows.iter_mut().find(|r| r.bucket == bucket) {
            row.counts.increment(t.priority);
            row.total += 1;
        }
    }
    rows
}

/// Met/breached split per priority.
pub fn sla_tracking(tickets: &[Ticket]) -> Vec<SlaRow> {
    Priority::ALL
        .into_iter()
        .map(|p| {
            let (met, breached) = tickets.iter().filter(|t| t.priority == p).fold(
                (0, 0),
                |(met, breached), t| match t.sla_status {
                    SlaStatus::Met => (met + 1, breached),
                    SlaStatus::Breached => (met, breached + 1),
                },
            );
            SlaRow {
                priority: p,
                label: p.label(),
                met,
                breached,
                met_rate: round1(percentage(met, met + breached)),
            }
        })
        .collect()
}

pub fn mttr_by_priority(tickets: &[Ticket]) -> Vec<PriorityMttr> {
    Priority::ALL
        .into_iter()
        .map(|p| {
            let (mean, resolved) =
                mean_resolution_hours(tickets.iter().filter(|t| t.priority == p));
            PriorityMttr {
                priority: p,
                label: p.label(),
                mttr: round1(mean),
                resolved,
            }
        })
        .collect()
}

/// Whether `t` was created in trailing week `index` (0 = the last 7 days).
pub fn in_reopen_week(t: &Ticket, index: usize, now: DateTime<Utc>) -> bool {
    let age = now - t.created;
    let from = Duration::days(7 * index as i64);
    let to = Duration::days(7 * (index as i64 + 1));
    age >= from && age < to
}

pub fn week_label(index: usize) -> String {
    format!("W{}", index + 1)
}

/// Reopen rate over the last four 7-day windows, most recent first.
pub fn reopen_trend(tickets: &[Ticket], now: DateTime<Utc>) -> Vec<ReopenWeek> {
    (0..REOPEN_WEEKS)
        .map(|index| {
            let window: Vec<&Ticket> = tickets
                .iter()
                .filter(|t| in_reopen_week(t, index, now))
                .collect();
            let reopened = window.iter().filter(|t| t.is_reopened()).count();
            ReopenWeek {
                week: week_label(index),
                index,
                tickets: window.len(),
                reopened,
                rate: round1(percentage(reopened, window.len())),
            }
        })
        .collect()
}
