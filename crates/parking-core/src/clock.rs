//! # Business Clock
//!
//! The single place where instants meet the business time zone.
//!
//! ## Why a Named Zone?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Server runs in UTC, the lot runs in America/Sao_Paulo (UTC-3).        │
//! │                                                                         │
//! │  "Today" at 22:30 local is already "tomorrow" in UTC:                  │
//! │     2026-10-16 22:30 -03:00  ==  2026-10-17 01:30 UTC                   │
//! │                                                                         │
//! │  Day windows (one open register per day) and stay arithmetic are       │
//! │  always computed with BOTH endpoints converted into the same zone.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The clock is passed explicitly to every operation that needs "now".
//! Tests pin it with [`BusinessClock::fixed`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CoreResult, ValidationError};

/// Time-zone aware clock for the lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessClock {
    tz: Tz,
    fixed: Option<DateTime<Utc>>,
}

impl BusinessClock {
    /// A clock reading the system time.
    pub fn new(tz: Tz) -> Self {
        BusinessClock { tz, fixed: None }
    }

    /// A clock pinned to one instant.
    pub fn fixed(tz: Tz, now: DateTime<Utc>) -> Self {
        BusinessClock {
            tz,
            fixed: Some(now),
        }
    }

    /// Parses an IANA zone name (`"America/Sao_Paulo"`).
    pub fn from_zone_name(name: &str) -> CoreResult<Self> {
        let tz: Tz = name.trim().parse().map_err(|_| ValidationError::InvalidFormat {
            field: "timezone".to_string(),
            reason: format!("'{}' is not an IANA time zone", name),
        })?;
        Ok(BusinessClock::new(tz))
    }

    /// Same zone, pinned to `now`.
    pub fn at(&self, now: DateTime<Utc>) -> Self {
        BusinessClock::fixed(self.tz, now)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.fixed.unwrap_or_else(Utc::now)
    }

    /// Converts an instant into the business zone.
    pub fn local(&self, ts: DateTime<Utc>) -> DateTime<Tz> {
        ts.with_timezone(&self.tz)
    }

    /// Calendar day of `ts` in the business zone.
    pub fn local_day(&self, ts: DateTime<Utc>) -> NaiveDate {
        self.local(ts).date_naive()
    }

    /// `[local midnight, next local midnight)` around `ts`, as UTC instants.
    pub fn day_window(&self, ts: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let day = self.local_day(ts);
        let next = day.succ_opt().unwrap_or(day);
        (self.start_of(day), self.start_of(next))
    }

    /// Whole minutes from `entry` to `now`, floored. Negative if `entry` is later.
    pub fn stay_minutes(&self, entry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let elapsed = self.local(now) - self.local(entry);
        elapsed.num_milliseconds().div_euclid(60_000)
    }

    /// Local midnight of `day`. A DST gap at midnight falls back to the
    /// latest valid instant, then to plain UTC.
    fn start_of(&self, day: NaiveDate) -> DateTime<Utc> {
        let naive: NaiveDateTime = day.and_time(chrono::NaiveTime::MIN);
        match self.tz.from_local_datetime(&naive).latest() {
            Some(dt) => dt.with_timezone(&Utc),
            None => match self
                .tz
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
            {
                Some(dt) => dt.with_timezone(&Utc),
                None => naive.and_utc(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sao_paulo() -> BusinessClock {
        BusinessClock::from_zone_name("America/Sao_Paulo").unwrap()
    }

    #[test]
    fn test_from_zone_name() {
        assert!(BusinessClock::from_zone_name("Europe/Lisbon").is_ok());
        assert!(BusinessClock::from_zone_name("Mars/Olympus").is_err());
    }

    #[test]
    fn test_local_day_differs_from_utc_day() {
        let clock = sao_paulo();
        // 01:30 UTC on the 17th is 22:30 on the 16th in Sao Paulo
        let ts = Utc.with_ymd_and_hms(2026, 10, 17, 1, 30, 0).unwrap();
        assert_eq!(
            clock.local_day(ts),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
        );
    }

    #[test]
    fn test_day_window() {
        let clock = sao_paulo();
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 15, 0, 0).unwrap();
        let (start, end) = clock.day_window(ts);

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 16, 3, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 10, 17, 3, 0, 0).unwrap());
        assert!(start <= ts && ts < end);
    }

    #[test]
    fn test_stay_minutes_floors() {
        let clock = sao_paulo();
        let entry = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();

        assert_eq!(clock.stay_minutes(entry, entry + Duration::seconds(59)), 0);
        assert_eq!(clock.stay_minutes(entry, entry + Duration::seconds(60)), 1);
        assert_eq!(clock.stay_minutes(entry, entry + Duration::minutes(65)), 65);
        assert_eq!(clock.stay_minutes(entry, entry - Duration::seconds(30)), -1);
    }

    #[test]
    fn test_fixed_clock() {
        let instant = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let clock = sao_paulo().at(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.timezone(), chrono_tz::America::Sao_Paulo);
    }
}
