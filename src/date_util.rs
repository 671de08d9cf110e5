use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const SNAPSHOT_DT_FMTS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Get the quarter (1-4) for a given date.
pub fn quarter_of(d: NaiveDate) -> u8 {
    ((d.month() - 1) / 3 + 1) as u8
}

/// First day of the quarter containing `d`.
pub fn quarter_start(d: NaiveDate) -> NaiveDate {
    let month = (quarter_of(d) as u32 - 1) * 3 + 1;
    NaiveDate::from_ymd_opt(d.year(), month, 1).unwrap_or(d)
}

/// Midnight UTC of the given date.
pub fn day_start(d: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN))
}

/// Every date from `start` to `end`, both inclusive. Empty when `end < start`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut d = start;
    while d <= end {
        days.push(d);
        d += Duration::days(1);
    }
    days
}

/// Parse a timestamp as found in ticket snapshots and on the command line.
///
/// Accepts RFC 3339 (`2026-01-05T16:24:00Z`), ServiceNow-style
/// `2026-01-05 16:24:00` (read as UTC) and bare dates (`2026-01-05`, midnight
/// UTC). Returns `None` for empty or unparseable input.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in SNAPSHOT_DT_FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(day_start)
}

/// Round to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Serde helpers for `#[serde(deserialize_with = "...")]`.
pub mod de {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    /// Required timestamp in any format [`super::parse_timestamp`] accepts.
    pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s:?}")))
    }

    /// `null`, missing or `""` → None.
    pub fn timestamp_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => super::parse_timestamp(v)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {v:?}"))),
        }
    }

    /// Hop counts arrive as numbers, numeric strings or not at all.
    /// Anything that does not coerce to a non-negative integer counts as 0.
    pub fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        Ok(match v {
            serde_json::Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
                .map(|n| n.min(u32::MAX as u64) as u32)
                .unwrap_or(0),
            serde_json::Value::String(s) => s.trim().parse::<u32>().unwrap_or(0),
            _ => 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()), 1);
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()), 1);
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()), 2);
        assert_eq!(quarter_of(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()), 3);
        assert_eq!(
            quarter_of(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()),
            4
        );
    }

    #[test]
    fn test_quarter_start() {
        assert_eq!(
            quarter_start(NaiveDate::from_ymd_opt(2026, 8, 19).unwrap()),
            NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()
        );
        assert_eq!(
            quarter_start(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_days_inclusive() {
        let a = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(days_inclusive(a, b).len(), 4);
        assert!(days_inclusive(b, a).is_empty());
        assert_eq!(days_inclusive(a, a), vec![a]);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2026-01-05T16:24:00Z").unwrap();
        let snow = parse_timestamp("2026-01-05 16:24:00").unwrap();
        assert_eq!(rfc, snow);
        assert_eq!(rfc.hour(), 16);

        let offset = parse_timestamp("2026-01-05T18:24:00+02:00").unwrap();
        assert_eq!(offset, rfc);

        let date = parse_timestamp("2026-01-05").unwrap();
        assert_eq!(date.hour(), 0);

        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round1(50.0), 50.0);
        assert_eq!(round1(0.04), 0.0);
        assert_eq!(round1(12.25), 12.3);
    }

    #[test]
    fn test_percentage_zero_denominator() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }
}
