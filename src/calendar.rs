//! Zone-aware calendar service
//!
//! Resolves zone names and turns local wall clock times into zoned
//! timestamps. Wall clock times that fall into a DST gap do not exist and
//! resolve to `None`; times repeated when clocks fall back resolve to the
//! earlier instant.

use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{GeneratorError, Result};
use crate::types::{LocalDateTime, LOCAL_TIME_FORMAT};

/// Resolve an IANA zone name such as `Europe/Helsinki`
pub fn time_zone_from_string(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| GeneratorError::UnknownTimeZone(name.to_string()).into())
}

/// Resolve a local wall clock time in the given zone
pub fn local_time(naive: NaiveDateTime, zone: Tz) -> Option<LocalDateTime> {
    zone.from_local_datetime(&naive).earliest()
}

/// Local time `offset` after midnight of `date`
///
/// Returns `None` when the wall clock time is skipped by a DST change.
pub fn make_time(date: NaiveDate, offset: Duration, zone: Tz) -> Option<LocalDateTime> {
    let naive = date.and_hms_opt(0, 0, 0)?.checked_add_signed(offset)?;
    local_time(naive, zone)
}

/// Interpret a naive timestamp as UTC and express it in the given zone
pub fn from_utc(naive: NaiveDateTime, zone: Tz) -> LocalDateTime {
    zone.from_utc_datetime(&naive)
}

/// Render a zoned timestamp with its zone abbreviation
pub fn format_local(t: &LocalDateTime) -> String {
    t.format(LOCAL_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_unknown_zone() {
        assert!(time_zone_from_string("Europe/Helsinki").is_ok());
        assert!(time_zone_from_string("Mars/Olympus").is_err());
    }

    #[test]
    fn test_spring_forward_gap() {
        let tz = time_zone_from_string("Europe/Helsinki").unwrap();
        assert!(make_time(date(2012, 3, 25), Duration::hours(3), tz).is_none());

        let t = make_time(date(2012, 3, 25), Duration::hours(4), tz).unwrap();
        assert_eq!(format_local(&t), "2012-Mar-25 04:00:00 EEST");
    }

    #[test]
    fn test_fall_back_takes_earlier() {
        let tz = time_zone_from_string("Europe/Helsinki").unwrap();
        let t = make_time(date(2012, 10, 28), Duration::hours(3), tz).unwrap();
        assert_eq!(format_local(&t), "2012-Oct-28 03:00:00 EEST");
    }

    #[test]
    fn test_from_utc() {
        let naive = date(2016, 2, 7).and_hms_opt(0, 0, 0).unwrap();
        let t = from_utc(naive, chrono_tz::Europe::Helsinki);
        assert_eq!(format_local(&t), "2016-Feb-07 02:00:00 EET");
    }
}
