pub mod config;
pub mod dashboard;
pub mod date_util;
pub mod drilldown;
pub mod error;
pub mod leaderboard;
pub mod metrics;
pub mod query;
pub mod store;
pub mod table;
pub mod ticket;

pub use config::Config;
pub use dashboard::Dashboard;
pub use drilldown::{drill_down, DrillDown, Selection};
pub use error::{Error, Result};
pub use leaderboard::{GroupBy, Leaderboard, LeaderboardRow, LeaderboardSortKey};
pub use metrics::{calculate_kpis, trend, KpiCard, Kpis, Trend, TrendDirection};
pub use query::{filter_tickets, DateRange, FilterCriteria, Interval};
pub use store::{StoreSummary, TicketStore};
pub use table::{Column, DrillDownTable, PageSize, Row, SortDirection, TablePage};
pub use ticket::{Priority, SlaStatus, Status, Ticket};

use chrono::{DateTime, Utc};

struct CachedDashboard {
    criteria: FilterCriteria,
    now: DateTime<Utc>,
    dashboard: Dashboard,
}

/// Main entry point: a loaded ticket snapshot plus configuration.
pub struct TicketDash {
    store: TicketStore,
    config: Config,
    cache: Option<CachedDashboard>,
}

impl TicketDash {
    pub fn new(store: TicketStore, config: Config) -> Self {
        Self {
            store,
            config,
            cache: None,
        }
    }

    pub fn store(&self) -> &TicketStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tickets matching `criteria`, in snapshot order.
    pub fn filtered(&self, criteria: &FilterCriteria, now: DateTime<Utc>) -> Vec<Ticket> {
        filter_tickets(self.store.tickets(), criteria, now)
    }

    /// The dashboard for `criteria` at `now`. The last result is memoized;
    /// asking again with the same pair returns it without recomputing.
    pub fn dashboard(&mut self, criteria: &FilterCriteria, now: DateTime<Utc>) -> &Dashboard {
        let cached = match self.cache.take() {
            Some(c) if c.criteria == *criteria && c.now == now => {
                log::debug!("dashboard cache hit");
                c
            }
            _ => CachedDashboard {
                criteria: criteria.clone(),
                now,
                dashboard: Dashboard::build(self.store.tickets(), criteria, now, &self.config),
            },
        };
        &self.cache.insert(cached).dashboard
    }

    pub fn leaderboard(
        &self,
        criteria: &FilterCriteria,
        now: DateTime<Utc>,
        group_by: GroupBy,
        sort_key: LeaderboardSortKey,
        direction: SortDirection,
    ) -> Leaderboard {
        leaderboard::leaderboard(
            self.store.tickets(),
            criteria,
            now,
            group_by,
            sort_key,
            direction,
            self.config.leaderboard_limit,
        )
    }

    /// Rows behind a chart selection. Leaderboard selections ignore the
    /// status filter, like the leaderboard itself.
    pub fn drill_down(
        &self,
        criteria: &FilterCriteria,
        now: DateTime<Utc>,
        selection: &Selection,
    ) -> DrillDown {
        let scope = match selection {
            Selection::Leader { .. } => criteria.without_status(),
            _ => criteria.clone(),
        };
        drill_down(&self.filtered(&scope, now), selection, now)
    }

    /// A drill-down table opened on a selection with the configured page size.
    pub fn open_table(
        &self,
        criteria: &FilterCriteria,
        now: DateTime<Utc>,
        selection: &Selection,
    ) -> DrillDownTable {
        self.drill_down(criteria, now, selection)
            .into_table(self.config.page_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::fixtures::*;

    fn dash() -> TicketDash {
        let mut closed = ticket("2", Priority::P1, Status::Closed);
        closed.resolver = Some("Alice".into());
        let mut open = ticket("1", Priority::P1, Status::Open);
        open.resolver = Some("Alice".into());
        TicketDash::new(
            TicketStore::from_tickets(vec![open, closed]),
            Config::default(),
        )
    }

    #[test]
    fn test_dashboard_memoizes_by_criteria_and_now() {
        let mut d = dash();
        let criteria = FilterCriteria::new();
        let first = d.dashboard(&criteria, now()).ticket_count;
        assert_eq!(first, 2);
        assert!(d.cache.is_some());

        assert_eq!(d.dashboard(&criteria, now()).ticket_count, 2);

        let open_only = FilterCriteria::new().status(Status::Open);
        assert_eq!(d.dashboard(&open_only, now()).ticket_count, 1);
        assert_eq!(d.cache.as_ref().map(|c| &c.criteria), Some(&open_only));
    }

    #[test]
    fn test_leader_drill_ignores_status() {
        let d = dash();
        let criteria = FilterCriteria::new().status(Status::Open);
        let sel = Selection::Leader {
            group_by: GroupBy::Resolver,
            name: "Alice".into(),
        };
        assert_eq!(d.drill_down(&criteria, now(), &sel).rows.len(), 2);
        let p1 = Selection::Priority(Priority::P1);
        assert_eq!(d.drill_down(&criteria, now(), &p1).rows.len(), 1);
    }

    #[test]
    fn test_open_table_uses_configured_page_size() {
        let d = dash();
        let table = d.open_table(
            &FilterCriteria::new(),
            now(),
            &Selection::Priority(Priority::P1),
        );
        assert_eq!(table.page_size(), PageSize::Fifty);
        assert_eq!(table.view().total_rows, 1);
    }
}
