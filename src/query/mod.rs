pub mod filter;
pub mod period;

pub use filter::{filter_in_interval, filter_tickets, FilterCriteria};
pub use period::{DateRange, Interval};
