use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::metrics::{
    self, AgeingRow, DailyCount, DailyMttr, KpiCard, NamedCount, PriorityCount, PriorityMttr,
    ReopenWeek, SlaRow,
};
use crate::query::{filter_tickets, FilterCriteria, Interval};
use crate::ticket::Ticket;

/// Every derived view for one (criteria, now) pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub criteria: FilterCriteria,
    pub now: DateTime<Utc>,
    /// `None` for an unbounded range.
    pub interval: Option<Interval>,
    pub ticket_count: usize,
    pub kpis: Vec<KpiCard>,
    pub by_priority: Vec<PriorityCount>,
    pub backlog_by_group: Vec<NamedCount>,
    pub backlog_by_assignee: Vec<NamedCount>,
    pub ageing: Vec<AgeingRow>,
    pub inflow: Vec<DailyCount>,
    pub backlog_trend: Vec<DailyCount>,
    pub mttr_trend: Vec<DailyMttr>,
    pub sla: Vec<SlaRow>,
    pub mttr_by_priority: Vec<PriorityMttr>,
    pub reopen_trend: Vec<ReopenWeek>,
}

impl Dashboard {
    /// Filter `tickets` once and compute every view from the result.
    pub fn build(
        tickets: &[Ticket],
        criteria: &FilterCriteria,
        now: DateTime<Utc>,
        config: &Config,
    ) -> Self {
        let filtered = filter_tickets(tickets, criteria, now);
        let backlog: Vec<Ticket> = filtered.iter().filter(|t| t.is_backlog()).cloned().collect();
        let range = &criteria.date_range;
        let days = config.max_series_days;

        log::debug!(
            "building dashboard over {} tickets ({} backlog)",
            filtered.len(),
            backlog.len()
        );

        Self {
            criteria: criteria.clone(),
            now,
            interval: range.resolve(now),
            ticket_count: filtered.len(),
            kpis: metrics::kpi_trends(tickets, criteria, now, config),
            by_priority: metrics::tickets_by_priority(&filtered),
            backlog_by_group: metrics::tickets_by_group(&backlog, config.top_groups),
            backlog_by_assignee: metrics::backlog_by_assignee(&filtered, config.top_assignees),
            ageing: metrics::ageing_buckets(&filtered, now),
            inflow: metrics::inflow_trend(&filtered, range, now, days),
            backlog_trend: metrics::backlog_trend(&filtered, range, now, days),
            mttr_trend: metrics::mttr_trend(&filtered, range, now, days),
            sla: metrics::sla_tracking(&filtered),
            mttr_by_priority: metrics::mttr_by_priority(&filtered),
            reopen_trend: metrics::reopen_trend(&filtered, now),
        }
    }
}
