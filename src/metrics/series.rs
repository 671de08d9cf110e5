//! Daily time series. Every series covers a contiguous run of days, with
//! zero entries for days that saw nothing.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::date_util::{days_inclusive, round1};
use crate::metrics::types::{DailyCount, DailyMttr};
use crate::query::DateRange;
use crate::ticket::Ticket;

/// Days a series over `range` covers.
///
/// A bounded range covers every day it touches. `All` covers the first to
/// the last day seen in `tickets` (creation or resolution), limited to the
/// `max_days` trailing days ending today.
pub fn series_days(
    tickets: &[Ticket],
    range: &DateRange,
    now: DateTime<Utc>,
    max_days: u32,
) -> Vec<NaiveDate> {
    if let Some(interval) = range.resolve(now) {
        let (first, last) = interval.day_span();
        return days_inclusive(first, last);
    }

    let seen = tickets
        .iter()
        .flat_map(|t| std::iter::once(t.created).chain(t.resolved))
        .map(|ts| ts.date_naive());
    let (Some(first), Some(last)) = (seen.clone().min(), seen.max()) else {
        return Vec::new();
    };

    let today = now.date_naive();
    let floor = today - Duration::days(max_days.saturating_sub(1) as i64);
    days_inclusive(first.max(floor), last.min(today))
}

fn daily_counts(days: Vec<NaiveDate>, dates: impl Iterator<Item = NaiveDate>) -> Vec<DailyCount> {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for d in dates {
        *counts.entry(d).or_default() += 1;
    }
    days.into_iter()
        .map(|date| DailyCount {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Tickets created per day.
pub fn inflow_trend(
    tickets: &[Ticket],
    range: &DateRange,
    now: DateTime<Utc>,
    max_days: u32,
) -> Vec<DailyCount> {
    let days = series_days(tickets, range, now, max_days);
    daily_counts(days, tickets.iter().map(|t| t.created.date_naive()))
}

/// Backlog tickets per creation day.
pub fn backlog_trend(
    tickets: &[Ticket],
    range: &DateRange,
    now: DateTime<Utc>,
    max_days: u32,
) -> Vec<DailyCount> {
    let days = series_days(tickets, range, now, max_days);
    daily_counts(
        days,
        tickets
            .iter()
            .filter(|t| t.is_backlog())
            .map(|t| t.created.date_naive()),
    )
}

/// Mean resolution hours per resolution day.
pub fn mttr_trend(
    tickets: &[Ticket],
    range: &DateRange,
    now: DateTime<Utc>,
    max_days: u32,
) -> Vec<DailyMttr> {
    let mut per_day: HashMap<NaiveDate, (f64, usize)> = HashMap::new();
    for t in tickets {
        if let (Some(resolved), Some(hours)) = (t.resolved, t.resolution_hours()) {
            let entry = per_day.entry(resolved.date_naive()).or_default();
            entry.0 += hours;
            entry.1 += 1;
        }
    }

    series_days(tickets, range, now, max_days)
        .into_iter()
        .map(|date| {
            let (sum, n) = per_day.get(&date).copied().unwrap_or_default();
            DailyMttr {
                date,
                mttr: if n == 0 { 0.0 } else { round1(sum / n as f64) },
                resolved: n,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::fixtures::*;
    use crate::ticket::{Priority, Status};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_bounded_range_is_contiguous() {
        let tickets = vec![days_ago(ticket("1", Priority::P1, Status::Open), 2)];
        let series = inflow_trend(&tickets, &DateRange::Rolling(7), now(), 90);
        // 12 Oct 12:00 .. 19 Oct 12:00 touches 12..=19
        assert_eq!(series.len(), 8);
        assert_eq!(series.first().unwrap().date, day(12));
        assert_eq!(series.last().unwrap().date, day(19));
        assert_eq!(series.iter().map(|d| d.count).sum::<usize>(), 1);
        assert_eq!(
            series.iter().find(|d| d.date == day(17)).unwrap().count,
            1
        );
    }

    #[test]
    fn test_all_range_spans_the_data() {
        let tickets = vec![
            days_ago(ticket("1", Priority::P1, Status::Open), 5),
            days_ago(ticket("2", Priority::P1, Status::Open), 2),
        ];
        let days = series_days(&tickets, &DateRange::All, now(), 90);
        assert_eq!(days.first(), Some(&day(14)));
        assert_eq!(days.last(), Some(&day(17)));
        assert_eq!(days.len(), 4);
    }

    #[test]
    fn test_all_range_clamps_to_max_days() {
        let tickets = vec![
            days_ago(ticket("1", Priority::P1, Status::Open), 400),
            days_ago(ticket("2", Priority::P1, Status::Open), 0),
        ];
        let days = series_days(&tickets, &DateRange::All, now(), 30);
        assert_eq!(days.len(), 30);
        assert_eq!(days.last(), Some(&day(19)));
    }

    #[test]
    fn test_empty_data_has_empty_all_series() {
        assert!(series_days(&[], &DateRange::All, now(), 90).is_empty());
        assert!(!series_days(&[], &DateRange::Rolling(7), now(), 90).is_empty());
    }

    #[test]
    fn test_backlog_trend_counts_open_work_only() {
        let tickets = vec![
            days_ago(ticket("1", Priority::P1, Status::Open), 1),
            days_ago(ticket("2", Priority::P1, Status::Closed), 1),
            days_ago(ticket("3", Priority::P1, Status::InProgress), 1),
        ];
        let series = backlog_trend(&tickets, &DateRange::Rolling(7), now(), 90);
        assert_eq!(series.iter().find(|d| d.date == day(18)).unwrap().count, 2);
    }

    #[test]
    fn test_mttr_trend_buckets_by_resolution_day() {
        let tickets = vec![
            resolved_after(days_ago(ticket("1", Priority::P1, Status::Open), 3), 24),
            resolved_after(days_ago(ticket("2", Priority::P1, Status::Open), 2), 3),
            ticket("3", Priority::P1, Status::Open),
        ];
        let series = mttr_trend(&tickets, &DateRange::Rolling(7), now(), 90);
        let d17 = series.iter().find(|d| d.date == day(17)).unwrap();
        assert_eq!(d17.resolved, 2);
        assert_eq!(d17.mttr, 13.5);
        let d16 = series.iter().find(|d| d.date == day(16)).unwrap();
        assert_eq!((d16.resolved, d16.mttr), (0, 0.0));
    }
}
