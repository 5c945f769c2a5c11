use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::error::ForecastError;

/// Hours of the day with elevated traffic
pub const RUSH_HOURS: [u32; 6] = [7, 8, 9, 17, 18, 19];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

pub fn is_rush_hour(hour: u32) -> bool {
    RUSH_HOURS.contains(&hour)
}

/// Day of week index, 0 = Monday
pub fn is_weekend_day(day_of_week: u32) -> bool {
    day_of_week >= 5
}

/// A forecast timestamp and its calendar attributes.
///
/// Attributes are read from the wall clock of the timestamp's own offset and
/// are always derived on access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint(DateTime<FixedOffset>);

impl TimePoint {
    pub fn new(timestamp: DateTime<FixedOffset>) -> Self {
        Self(timestamp)
    }

    pub fn now() -> Self {
        Self(Utc::now().fixed_offset())
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.0
    }

    /// Hour of day (0-23)
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Day of week (0=Monday, 6=Sunday)
    pub fn day_of_week(&self) -> u32 {
        self.0.weekday().num_days_from_monday()
    }

    pub fn is_weekend(&self) -> bool {
        is_weekend_day(self.day_of_week())
    }

    pub fn is_rush_hour(&self) -> bool {
        is_rush_hour(self.hour())
    }

    /// Full weekday name, e.g. "Monday"
    pub fn day_name(&self) -> String {
        self.0.format("%A").to_string()
    }

    /// `None` when the result is outside the representable date range
    pub fn plus_hours(&self, hours: i64) -> Option<Self> {
        let delta = Duration::try_hours(hours)?;
        self.0.checked_add_signed(delta).map(Self)
    }

    /// Up to `count` consecutive hourly points starting at `self`; stops
    /// early at the end of the representable date range
    pub fn hourly(self, count: usize) -> impl Iterator<Item = TimePoint> {
        (0..count).map_while(move |i| self.plus_hours(i as i64))
    }

    pub fn to_iso_string(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl From<DateTime<FixedOffset>> for TimePoint {
    fn from(timestamp: DateTime<FixedOffset>) -> Self {
        Self(timestamp)
    }
}

impl From<DateTime<Utc>> for TimePoint {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp.fixed_offset())
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (`Z` or numeric offsets), naive date-times and bare
/// dates. Naive values are taken as UTC wall-clock time.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<TimePoint, ForecastError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ForecastError::invalid_input(field, "timestamp is empty"));
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(TimePoint(ts));
    }
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(value, format) {
            return Ok(TimePoint(ts));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(TimePoint(naive.and_utc().fixed_offset()));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(TimePoint(midnight.and_utc().fixed_offset()));
        }
    }

    Err(ForecastError::invalid_input(
        field,
        format!("'{}' is not an ISO-8601 timestamp", value),
    ))
}

/// Parse an optional timestamp, falling back to the current time
pub fn parse_or_now(field: &str, raw: Option<&str>) -> Result<TimePoint, ForecastError> {
    match raw {
        Some(value) => parse_timestamp(field, value),
        None => Ok(TimePoint::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_rush_hours() {
        for hour in 0..24 {
            let expected = matches!(hour, 7 | 8 | 9 | 17 | 18 | 19);
            assert_eq!(is_rush_hour(hour), expected, "hour {}", hour);
        }
    }

    #[test]
    fn test_weekend_flag() {
        // 2025-01-06 is a Monday
        let monday = parse_timestamp("timestamp", "2025-01-06T10:00:00").unwrap();
        for offset in 0..7 {
            let point = monday.plus_hours(24 * offset).unwrap();
            assert_eq!(point.day_of_week(), offset as u32);
            assert_eq!(point.is_weekend(), offset >= 5);
        }
    }

    #[rstest]
    #[case("2025-01-06T14:30:00", 14, 0)]
    #[case("2025-01-06T14:30:00Z", 14, 0)]
    #[case("2025-01-06T14:30:00.250Z", 14, 0)]
    #[case("2025-01-06T14:30", 14, 0)]
    #[case("2025-01-06 14:30:00", 14, 0)]
    #[case("2025-01-06T14:30:00+05:30", 14, 0)]
    #[case("2025-01-06", 0, 0)]
    fn test_parse_timestamp_formats(
        #[case] raw: &str,
        #[case] hour: u32,
        #[case] day_of_week: u32,
    ) {
        let point = parse_timestamp("timestamp", raw).unwrap();
        assert_eq!(point.hour(), hour);
        assert_eq!(point.day_of_week(), day_of_week);
    }

    #[test]
    fn test_offset_keeps_wall_clock() {
        let point = parse_timestamp("timestamp", "2025-01-06T08:00:00-05:00").unwrap();
        assert_eq!(point.hour(), 8);
        assert!(point.is_rush_hour());
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2025-13-01T00:00:00")]
    #[case("06/01/2025 14:30")]
    fn test_parse_timestamp_rejects(#[case] raw: &str) {
        let err = parse_timestamp("start_time", raw).unwrap_err();
        match err {
            ForecastError::InvalidInput { field, .. } => assert_eq!(field, "start_time"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_hourly_sequence() {
        let start = parse_timestamp("start_time", "2025-01-06T22:00:00Z").unwrap();
        let points: Vec<TimePoint> = start.hourly(4).collect();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], start);
        assert_eq!(points[2].hour(), 0);
        assert_eq!(points[2].day_of_week(), 1);
        assert_eq!(points[3].day_name(), "Tuesday");
    }

    #[test]
    fn test_hourly_stops_at_date_range_end() {
        let last_hour = TimePoint::from(NaiveDate::MAX.and_hms_opt(23, 0, 0).unwrap().and_utc());
        assert!(last_hour.plus_hours(1).is_none());
        assert_eq!(last_hour.plus_hours(0), Some(last_hour));
        assert_eq!(last_hour.hourly(5).count(), 1);
    }
}
