//! Timestamp generation across zones and daylight saving changes

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tseries::calendar::time_zone_from_string;
use tseries::generator::{generate, Defaults, Mode, TimeSeriesGeneratorOptions};
use tseries::error::{Error, GeneratorError};
use tseries::types::LOCAL_TIME_FORMAT;

fn naive(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn zone(name: &str) -> Tz {
    time_zone_from_string(name).unwrap()
}

fn render(options: &TimeSeriesGeneratorOptions, zone_name: &str) -> String {
    generate(options, zone(zone_name))
        .unwrap()
        .iter()
        .map(|t| format!("{}\n", t.format(LOCAL_TIME_FORMAT)))
        .collect()
}

fn local_options(mode: Mode, start: NaiveDateTime) -> TimeSeriesGeneratorOptions {
    let mut options = TimeSeriesGeneratorOptions::new(start);
    options.mode = mode;
    options.start_time = Some(start);
    options.start_time_utc = false;
    options
}

fn fixed_times(start: NaiveDateTime, steps: u32, clock_times: &[u32]) -> TimeSeriesGeneratorOptions {
    let mut options = local_options(Mode::FixedTimes, start);
    options.time_steps = Some(steps);
    options.time_list.extend(clock_times.iter().copied());
    options
}

fn time_steps(start: NaiveDateTime, hours: i64, step: u32, steps: u32) -> TimeSeriesGeneratorOptions {
    let mut options = local_options(Mode::TimeSteps, start);
    options.end_time = Some(start + Duration::hours(hours));
    options.time_step = Some(step);
    options.time_steps = Some(steps);
    options
}

fn late_october_noons() -> Arc<Vec<DateTime<Utc>>> {
    Arc::new(
        (28..=31)
            .map(|d| naive(2012, 10, d, 12).and_utc())
            .collect(),
    )
}

#[test]
fn test_fixed_times_utc() {
    let options = fixed_times(naive(2012, 11, 13, 5), 4, &[300, 1300, 1700]);
    assert_eq!(
        render(&options, "UTC"),
        "2012-Nov-13 13:00:00 UTC\n\
         2012-Nov-13 17:00:00 UTC\n\
         2012-Nov-14 03:00:00 UTC\n\
         2012-Nov-14 13:00:00 UTC\n"
    );
}

#[test]
fn test_fixed_times_helsinki() {
    let options = fixed_times(naive(2012, 11, 13, 5), 4, &[300, 1300, 1700]);
    assert_eq!(
        render(&options, "Europe/Helsinki"),
        "2012-Nov-13 13:00:00 EET\n\
         2012-Nov-13 17:00:00 EET\n\
         2012-Nov-14 03:00:00 EET\n\
         2012-Nov-14 13:00:00 EET\n"
    );
}

#[test]
fn test_fixed_times_to_summer_time() {
    let options = fixed_times(naive(2012, 3, 24, 0), 11, &[200, 300, 400, 1300]);
    assert_eq!(
        render(&options, "Europe/Helsinki"),
        "2012-Mar-24 02:00:00 EET\n\
         2012-Mar-24 03:00:00 EET\n\
         2012-Mar-24 04:00:00 EET\n\
         2012-Mar-24 13:00:00 EET\n\
         2012-Mar-25 02:00:00 EET\n\
         2012-Mar-25 04:00:00 EEST\n\
         2012-Mar-25 13:00:00 EEST\n\
         2012-Mar-26 02:00:00 EEST\n\
         2012-Mar-26 03:00:00 EEST\n\
         2012-Mar-26 04:00:00 EEST\n\
         2012-Mar-26 13:00:00 EEST\n"
    );
}

#[test]
fn test_fixed_times_to_winter_time() {
    let options = fixed_times(naive(2012, 10, 27, 0), 11, &[200, 300, 400, 1300]);
    assert_eq!(
        render(&options, "Europe/Helsinki"),
        "2012-Oct-27 02:00:00 EEST\n\
         2012-Oct-27 03:00:00 EEST\n\
         2012-Oct-27 04:00:00 EEST\n\
         2012-Oct-27 13:00:00 EEST\n\
         2012-Oct-28 02:00:00 EEST\n\
         2012-Oct-28 03:00:00 EEST\n\
         2012-Oct-28 04:00:00 EET\n\
         2012-Oct-28 13:00:00 EET\n\
         2012-Oct-29 02:00:00 EET\n\
         2012-Oct-29 03:00:00 EET\n\
         2012-Oct-29 04:00:00 EET\n"
    );
}

#[test]
fn test_fixed_times_on_selected_day() {
    let mut options = fixed_times(naive(2012, 11, 13, 5), 4, &[300, 1300, 1700]);
    options.days.insert(14);
    assert_eq!(
        render(&options, "UTC"),
        "2012-Nov-14 03:00:00 UTC\n\
         2012-Nov-14 13:00:00 UTC\n\
         2012-Nov-14 17:00:00 UTC\n\
         2012-Dec-14 03:00:00 UTC\n"
    );
}

#[test]
fn test_fixed_times_until_end() {
    let mut options = local_options(Mode::FixedTimes, naive(2012, 11, 13, 5));
    options.end_time = Some(naive(2012, 11, 14, 12));
    options.end_time_utc = false;
    options.time_list.extend([300, 1300]);
    assert_eq!(
        render(&options, "UTC"),
        "2012-Nov-13 13:00:00 UTC\n\
         2012-Nov-14 03:00:00 UTC\n"
    );
}

#[test]
fn test_time_steps_utc() {
    let options = time_steps(naive(2012, 11, 13, 5), 24, 180, 4);
    assert_eq!(
        render(&options, "UTC"),
        "2012-Nov-13 06:00:00 UTC\n\
         2012-Nov-13 09:00:00 UTC\n\
         2012-Nov-13 12:00:00 UTC\n\
         2012-Nov-13 15:00:00 UTC\n"
    );
}

#[test]
fn test_time_steps_helsinki() {
    let options = time_steps(naive(2012, 11, 13, 5), 24, 180, 4);
    assert_eq!(
        render(&options, "Europe/Helsinki"),
        "2012-Nov-13 06:00:00 EET\n\
         2012-Nov-13 09:00:00 EET\n\
         2012-Nov-13 12:00:00 EET\n\
         2012-Nov-13 15:00:00 EET\n"
    );
}

#[test]
fn test_time_steps_to_summer_time() {
    let options = time_steps(naive(2012, 3, 25, 0), 48, 60, 8);
    assert_eq!(
        render(&options, "Europe/Helsinki"),
        "2012-Mar-25 00:00:00 EET\n\
         2012-Mar-25 01:00:00 EET\n\
         2012-Mar-25 02:00:00 EET\n\
         2012-Mar-25 04:00:00 EEST\n\
         2012-Mar-25 05:00:00 EEST\n\
         2012-Mar-25 06:00:00 EEST\n\
         2012-Mar-25 07:00:00 EEST\n\
         2012-Mar-25 08:00:00 EEST\n"
    );
}

#[test]
fn test_time_steps_to_winter_time() {
    let options = time_steps(naive(2012, 10, 28, 0), 48, 60, 8);
    assert_eq!(
        render(&options, "Europe/Helsinki"),
        "2012-Oct-28 00:00:00 EEST\n\
         2012-Oct-28 01:00:00 EEST\n\
         2012-Oct-28 02:00:00 EEST\n\
         2012-Oct-28 03:00:00 EEST\n\
         2012-Oct-28 04:00:00 EET\n\
         2012-Oct-28 05:00:00 EET\n\
         2012-Oct-28 06:00:00 EET\n\
         2012-Oct-28 07:00:00 EET\n"
    );
}

#[test]
fn test_zero_step_yields_endpoints() {
    let options = time_steps(naive(2012, 11, 13, 5), 24, 0, 4);
    assert_eq!(
        render(&options, "UTC"),
        "2012-Nov-13 05:00:00 UTC\n\
         2012-Nov-14 05:00:00 UTC\n"
    );
}

#[test]
fn test_time_steps_on_selected_day() {
    let mut options = time_steps(naive(2012, 11, 13, 5), 48, 180, 4);
    options.days.insert(14);
    assert_eq!(
        render(&options, "UTC"),
        "2012-Nov-14 00:00:00 UTC\n\
         2012-Nov-14 03:00:00 UTC\n\
         2012-Nov-14 06:00:00 UTC\n\
         2012-Nov-14 09:00:00 UTC\n"
    );
}

#[test]
fn test_time_steps_from_epoch_start() {
    let start = DateTime::from_timestamp(1_454_803_200, 0).unwrap().naive_utc();
    let mut options = TimeSeriesGeneratorOptions::new(start);
    options.mode = Mode::TimeSteps;
    options.start_time = Some(start);
    options.end_time = Some(start + Duration::hours(24));
    options.time_step = Some(60);
    options.time_steps = Some(4);

    assert_eq!(
        render(&options, "Europe/Helsinki"),
        "2016-Feb-07 02:00:00 EET\n\
         2016-Feb-07 03:00:00 EET\n\
         2016-Feb-07 04:00:00 EET\n\
         2016-Feb-07 05:00:00 EET\n"
    );
    assert_eq!(
        render(&options, "UTC"),
        "2016-Feb-07 00:00:00 UTC\n\
         2016-Feb-07 01:00:00 UTC\n\
         2016-Feb-07 02:00:00 UTC\n\
         2016-Feb-07 03:00:00 UTC\n"
    );
}

#[test]
fn test_data_times() {
    let mut options = local_options(Mode::DataTimes, naive(2012, 10, 28, 0));
    options.set_data_times(late_october_noons(), false);
    options.time_steps = Some(2);

    assert_eq!(
        render(&options, "Europe/Helsinki"),
        "2012-Oct-28 14:00:00 EET\n\
         2012-Oct-29 14:00:00 EET\n"
    );
}

#[test]
fn test_data_times_climatology() {
    let mut options = local_options(Mode::DataTimes, naive(2011, 10, 29, 0));
    options.end_time = Some(naive(2013, 10, 29, 0));
    options.end_time_utc = false;
    options.set_data_times(late_october_noons(), true);

    assert_eq!(
        render(&options, "Europe/Helsinki"),
        "2011-Oct-29 15:00:00 EEST\n\
         2011-Oct-30 14:00:00 EET\n\
         2011-Oct-31 14:00:00 EET\n\
         2012-Oct-28 14:00:00 EET\n\
         2012-Oct-29 14:00:00 EET\n\
         2012-Oct-30 14:00:00 EET\n\
         2012-Oct-31 14:00:00 EET\n\
         2013-Oct-28 14:00:00 EET\n"
    );
}

#[test]
fn test_data_times_span_from_data() {
    let mut options = TimeSeriesGeneratorOptions::new(naive(2012, 1, 1, 0));
    options.mode = Mode::DataTimes;
    options.start_time_data = true;
    options.end_time_data = true;
    options.set_data_times(late_october_noons(), false);

    let times = generate(&options, zone("UTC")).unwrap();
    assert_eq!(times.len(), 4);
    assert_eq!(
        times[3].format(LOCAL_TIME_FORMAT).to_string(),
        "2012-Oct-31 12:00:00 UTC"
    );
}

#[test]
fn test_defaults_for_empty_request() {
    let now = naive(2012, 11, 13, 5);
    let defaults = Defaults {
        start_offset: -1440,
        ..Defaults::default()
    };

    let mut options = TimeSeriesGeneratorOptions::new(now);
    options.apply_defaults(&defaults).unwrap();

    assert_eq!(options.mode, Mode::TimeSteps);
    assert!(options.start_time_assumed);
    assert!(options.start_time_utc);
    assert_eq!(options.start_time, Some(now - Duration::hours(24)));
    assert_eq!(options.end_time, Some(now));
}

#[test]
fn test_defaults_keep_explicit_request() {
    let start = naive(2012, 11, 13, 5);
    let end = naive(2012, 11, 14, 5);

    let mut options = TimeSeriesGeneratorOptions::new(start);
    options.start_time = Some(start);
    options.end_time = Some(end);
    options.time_step = Some(180);
    options.apply_defaults(&Defaults::default()).unwrap();

    assert!(!options.start_time_assumed);
    assert_eq!(options.start_time, Some(start));
    assert_eq!(options.end_time, Some(end));
    assert_eq!(options.time_step, Some(180));
    assert_eq!(render(&options, "UTC").lines().count(), 8);
}

#[test]
fn test_step_count_past_calendar_is_an_error() {
    let mut options = TimeSeriesGeneratorOptions::new(naive(2020, 1, 1, 0));
    options.mode = Mode::TimeSteps;
    options.start_time = Some(naive(2020, 1, 1, 0));
    options.time_step = Some(525_600);
    options.time_steps = Some(300_000);

    let err = generate(&options, zone("UTC")).unwrap_err();
    assert!(matches!(err, Error::Generator(GeneratorError::TimeRangeOverflow)));

    options.time_step = Some(u32::MAX);
    options.time_steps = Some(u32::MAX);
    assert!(generate(&options, zone("UTC")).is_err());
}

#[test]
fn test_defaults_reject_span_past_calendar() {
    let mut options = TimeSeriesGeneratorOptions::new(naive(2020, 1, 1, 0));
    options.time_step = Some(525_600);
    options.time_steps = Some(300_000);

    let err = options.apply_defaults(&Defaults::default()).unwrap_err();
    assert!(matches!(err, Error::Generator(GeneratorError::TimeRangeOverflow)));
    assert!(options.end_time.is_none());
}
