use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;

use crate::date_util::{day_start, parse_timestamp, quarter_start};
use crate::error::{Error, Result};

/// Longest accepted rolling range, in days.
pub const MAX_ROLLING_DAYS: u32 = 36_500;

static RE_CUSTOM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^custom:(.+?)\.\.(.+)$").unwrap());

/// The date-range dimension of a filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DateRange {
    #[default]
    All,
    Today,
    /// Trailing N days ending now: `7d`, `30d`, `90d`.
    Rolling(u32),
    MonthToDate,
    QuarterToDate,
    YearToDate,
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A resolved half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// The window of identical length immediately before this one.
    /// Saturates at the earliest representable instant.
    pub fn previous(&self) -> Self {
        Self {
            start: earlier(self.start, self.duration()),
            end: self.start,
        }
    }

    /// Calendar days touched by the interval, first to last inclusive.
    pub fn day_span(&self) -> (NaiveDate, NaiveDate) {
        let first = self.start.date_naive();
        // `end` is exclusive: an interval ending exactly at midnight does not touch that day.
        let last_instant = if self.end > self.start {
            self.end - Duration::nanoseconds(1)
        } else {
            self.start
        };
        (first, last_instant.date_naive())
    }
}

/// `t - len`, saturating at the earliest representable instant.
fn earlier(t: DateTime<Utc>, len: Duration) -> DateTime<Utc> {
    t.checked_sub_signed(len).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl DateRange {
    /// Parse a date-range string.
    ///
    /// Supported formats:
    /// - `all`: no constraint
    /// - `today`: since midnight
    /// - `7d`, `30d`, `90d` (any `Nd`): trailing N days
    /// - `mtd` / `qtd` / `ytd`: month / quarter / year to date
    /// - `custom:<start>..<end>`: explicit range, both ends required
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        match s.to_lowercase().as_str() {
            "all" | "" => return Ok(DateRange::All),
            "today" => return Ok(DateRange::Today),
            "mtd" => return Ok(DateRange::MonthToDate),
            "qtd" => return Ok(DateRange::QuarterToDate),
            "ytd" => return Ok(DateRange::YearToDate),
            "custom" => {
                return Err(Error::DateRangeParse(
                    "custom range requires both start and end (custom:<start>..<end>)".into(),
                ))
            }
            _ => {}
        }

        if s.ends_with('d') || s.ends_with('D') {
            if let Ok(n) = s[..s.len() - 1].parse::<u32>() {
                if n == 0 {
                    return Err(Error::DateRangeParse(format!("empty rolling range: {s}")));
                }
                if n > MAX_ROLLING_DAYS {
                    return Err(Error::DateRangeParse(format!(
                        "rolling range longer than {MAX_ROLLING_DAYS} days: {s}"
                    )));
                }
                return Ok(DateRange::Rolling(n));
            }
        }

        if let Some(caps) = RE_CUSTOM.captures(s) {
            let start = parse_timestamp(&caps[1])
                .ok_or_else(|| Error::DateRangeParse(format!("invalid start: {}", &caps[1])))?;
            let end = parse_timestamp(&caps[2])
                .ok_or_else(|| Error::DateRangeParse(format!("invalid end: {}", &caps[2])))?;
            return Self::custom(start, end);
        }

        Err(Error::DateRangeParse(format!("unrecognized date range: {s}")))
    }

    /// Explicit range. The end must not precede the start.
    pub fn custom(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(Error::DateRangeParse(format!(
                "custom range ends before it starts: {start} > {end}"
            )));
        }
        Ok(DateRange::Custom { start, end })
    }

    /// Canonical key, the inverse of [`DateRange::parse`].
    pub fn to_key(&self) -> String {
        match self {
            DateRange::All => "all".into(),
            DateRange::Today => "today".into(),
            DateRange::Rolling(n) => format!("{n}d"),
            DateRange::MonthToDate => "mtd".into(),
            DateRange::QuarterToDate => "qtd".into(),
            DateRange::YearToDate => "ytd".into(),
            DateRange::Custom { start, end } => {
                format!("custom:{}..{}", start.to_rfc3339(), end.to_rfc3339())
            }
        }
    }

    /// Resolve against `now`. `None` means unconstrained.
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<Interval> {
        let today = now.date_naive();
        match self {
            DateRange::All => None,
            DateRange::Today => Some(Interval::new(day_start(today), now)),
            DateRange::Rolling(n) => Some(Interval::new(earlier(now, Duration::days(*n as i64)), now)),
            DateRange::MonthToDate => {
                let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
                Some(Interval::new(day_start(first), now))
            }
            DateRange::QuarterToDate => Some(Interval::new(day_start(quarter_start(today)), now)),
            DateRange::YearToDate => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                Some(Interval::new(day_start(first), now))
            }
            DateRange::Custom { start, end } => Some(Interval::new(*start, *end)),
        }
    }

    /// The preceding window of identical length, if the range is bounded.
    pub fn previous_interval(&self, now: DateTime<Utc>) -> Option<Interval> {
        self.resolve(now).map(|i| i.previous())
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

impl std::str::FromStr for DateRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for DateRange {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 19, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_parse_presets() {
        assert_eq!(DateRange::parse("all").unwrap(), DateRange::All);
        assert_eq!(DateRange::parse("today").unwrap(), DateRange::Today);
        assert_eq!(DateRange::parse("7d").unwrap(), DateRange::Rolling(7));
        assert_eq!(DateRange::parse("30D").unwrap(), DateRange::Rolling(30));
        assert_eq!(DateRange::parse("MTD").unwrap(), DateRange::MonthToDate);
        assert_eq!(DateRange::parse("qtd").unwrap(), DateRange::QuarterToDate);
        assert_eq!(DateRange::parse("ytd").unwrap(), DateRange::YearToDate);
    }

    #[test]
    fn test_parse_custom() {
        let r = DateRange::parse("custom:2026-08-01..2026-08-15").unwrap();
        let i = r.resolve(now()).unwrap();
        assert_eq!(i.start, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
        assert_eq!(i.end, Utc.with_ymd_and_hms(2026, 8, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(DateRange::parse("custom").is_err());
        assert!(DateRange::parse("custom:2026-08-01..").is_err());
        assert!(DateRange::parse("custom:2026-08-15..2026-08-01").is_err());
        assert!(DateRange::parse("0d").is_err());
        assert!(DateRange::parse("fortnight").is_err());
    }

    #[test]
    fn test_parse_rejects_overlong_rolling_range() {
        assert_eq!(
            DateRange::parse("36500d").unwrap(),
            DateRange::Rolling(MAX_ROLLING_DAYS)
        );
        assert!(DateRange::parse("36501d").is_err());
        assert!(DateRange::parse("100000000d").is_err());
    }

    #[test]
    fn test_huge_rolling_range_saturates() {
        let i = DateRange::Rolling(u32::MAX).resolve(now()).unwrap();
        assert_eq!(i.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(i.end, now());

        let p = i.previous();
        assert_eq!(p.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(p.end, i.start);
    }

    #[test]
    fn test_key_round_trip_for_presets() {
        for key in ["all", "today", "7d", "30d", "90d", "mtd", "qtd", "ytd"] {
            assert_eq!(DateRange::parse(key).unwrap().to_key(), key);
        }
    }

    #[test]
    fn test_resolve_all_is_unbounded() {
        assert!(DateRange::All.resolve(now()).is_none());
        assert!(DateRange::All.previous_interval(now()).is_none());
    }

    #[test]
    fn test_resolve_today() {
        let i = DateRange::Today.resolve(now()).unwrap();
        assert_eq!(i.start, Utc.with_ymd_and_hms(2026, 8, 19, 0, 0, 0).unwrap());
        assert_eq!(i.end, now());
    }

    #[test]
    fn test_resolve_rolling() {
        let i = DateRange::Rolling(7).resolve(now()).unwrap();
        assert_eq!(i.duration(), Duration::days(7));
        assert_eq!(i.end, now());
    }

    #[test]
    fn test_resolve_to_date() {
        let m = DateRange::MonthToDate.resolve(now()).unwrap();
        assert_eq!(m.start, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());

        let q = DateRange::QuarterToDate.resolve(now()).unwrap();
        assert_eq!(q.start, Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap());

        let y = DateRange::YearToDate.resolve(now()).unwrap();
        assert_eq!(y.start, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_interval_contains_is_half_open() {
        let i = DateRange::Rolling(1).resolve(now()).unwrap();
        assert!(i.contains(i.start));
        assert!(!i.contains(i.end));
    }

    #[test]
    fn test_previous_interval_same_length() {
        let i = DateRange::MonthToDate.resolve(now()).unwrap();
        let p = DateRange::MonthToDate.previous_interval(now()).unwrap();
        assert_eq!(p.end, i.start);
        assert_eq!(p.duration(), i.duration());
    }

    #[test]
    fn test_day_span_excludes_midnight_end() {
        let r = DateRange::parse("custom:2026-08-01..2026-08-04").unwrap();
        let (first, last) = r.resolve(now()).unwrap().day_span();
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 8, 3).unwrap());
    }
}
