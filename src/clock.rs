//! Time source for meta stamping

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of the current time, injected into the user service
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Parse an RFC 3339 timestamp, e.g. `2024-02-01T12:00:00Z`
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self(DateTime::parse_from_rfc3339(rfc3339)?.with_timezone(&Utc)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Render a timestamp as ISO-8601 UTC with a trailing `Z`.
///
/// Always six fractional digits, so stamps of the same clock sort
/// lexicographically in time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_whole_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-02-01T12:00:00.000000Z");
    }

    #[test]
    fn test_format_microseconds() {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
            + chrono::Duration::microseconds(1500);
        assert_eq!(format_timestamp(at), "2024-02-01T12:00:00.001500Z");
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::parse("2024-02-01T12:00:00Z").unwrap();
        assert_eq!(format_timestamp(clock.now()), "2024-02-01T12:00:00.000000Z");
    }

    #[test]
    fn test_format_truncates_nanoseconds() {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(483_578_922);
        assert_eq!(format_timestamp(at), "2024-02-01T12:00:00.483578Z");
    }

    #[test]
    fn test_system_clock_has_microsecond_precision() {
        let stamp = format_timestamp(SystemClock.now());
        let fraction = stamp
            .strip_suffix('Z')
            .and_then(|s| s.rsplit_once('.'))
            .map(|(_, digits)| digits)
            .unwrap();
        assert_eq!(fraction.len(), 6);
        assert!(fraction.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_stamps_sort_in_time_order() {
        let base = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let stamps: Vec<String> = [0, 100_000_000, 120_000_000, 999_999_000]
            .into_iter()
            .map(|ns| format_timestamp(base + chrono::Duration::nanoseconds(ns)))
            .collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
    }
}
