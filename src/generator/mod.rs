//! Time series generator
//!
//! Produces the sorted, duplicate-free list of zoned timestamps a request
//! asks for. Local wall-clock times are resolved through the calendar
//! service, so times skipped by a DST change are left out and times repeated
//! when clocks fall back resolve to the earlier instant.
//!
//! # Modes
//!
//! - **FixedTimes**: given clock times of day, walking calendar days from
//!   the start date, until the end time or until enough steps are found
//! - **TimeSteps**: fixed cadence in minutes, aligned to local midnight
//! - **DataTimes**: timestamps taken from the data, optionally repeated
//!   over every year of the period (climatology)
//! - **GraphTimes**: data times plus the next full hour after the start
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tseries::generator::{generate, Mode, TimeSeriesGeneratorOptions};
//!
//! let start = NaiveDate::from_ymd_opt(2016, 2, 7).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let mut options = TimeSeriesGeneratorOptions::new(start);
//! options.mode = Mode::TimeSteps;
//! options.start_time = Some(start);
//! options.time_step = Some(60);
//! options.time_steps = Some(4);
//!
//! let times = generate(&options, chrono_tz::UTC).unwrap();
//! assert_eq!(times.len(), 4);
//! ```

pub mod options;

pub use options::{Defaults, Mode, TimeSeriesGeneratorOptions, DEFAULT_TIME_STEP};

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use tracing::debug;

use crate::calendar::{from_utc, local_time, make_time};
use crate::error::{GeneratorError, Result};
use crate::types::{LocalDateTime, LocalTimeList};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Upper bound on the calendar days a count-limited walk may visit
const MAX_WALK_DAYS: u32 = 366 * 200;

/// Generate the timestamps described by `options` in `zone`
///
/// Taking the start or end from empty data yields an empty list.
pub fn generate(options: &TimeSeriesGeneratorOptions, zone: Tz) -> Result<LocalTimeList> {
    let data = options.data_times();

    let start = if options.start_time_data {
        match data.first() {
            Some(t) => from_utc(t.naive_utc(), zone),
            None => return Ok(Vec::new()),
        }
    } else {
        let naive = options.start_time.ok_or(GeneratorError::MissingStartTime)?;
        resolve(naive, options.start_time_utc, zone)?
    };

    let end = if options.end_time_data {
        match data.last() {
            Some(t) => Some(from_utc(t.naive_utc(), zone)),
            None => return Ok(Vec::new()),
        }
    } else {
        match options.end_time {
            Some(naive) => Some(resolve(naive, options.end_time_utc, zone)?),
            None => derived_end(options, start)?,
        }
    };

    debug!(
        mode = %options.mode,
        start = %start,
        end = ?end,
        zone = %zone.name(),
        "generating time series"
    );

    let mut times = BTreeSet::new();
    match options.mode {
        Mode::FixedTimes => fixed_times(&mut times, options, start, end, zone)?,
        Mode::TimeSteps => {
            let end = end.ok_or(GeneratorError::MissingEndTime)?;
            time_steps(&mut times, options, start, end, zone);
        }
        Mode::DataTimes => data_times(&mut times, options, start, end, zone),
        Mode::GraphTimes => graph_times(&mut times, options, start, end, zone),
    }

    debug!(steps = times.len(), "time series generated");
    Ok(times.into_iter().collect())
}

fn resolve(naive: NaiveDateTime, utc: bool, zone: Tz) -> Result<LocalDateTime> {
    if utc {
        return Ok(from_utc(naive, zone));
    }
    local_time(naive, zone).ok_or_else(|| {
        GeneratorError::NonexistentLocalTime {
            time: naive.to_string(),
            zone: zone.name().to_string(),
        }
        .into()
    })
}

/// End time from the step count when no end is given
fn derived_end(
    options: &TimeSeriesGeneratorOptions,
    start: LocalDateTime,
) -> Result<Option<LocalDateTime>> {
    let Some(steps) = options.time_steps else {
        return Ok(None);
    };
    let step = options.time_step.unwrap_or(DEFAULT_TIME_STEP);
    i64::from(step)
        .checked_mul(i64::from(steps))
        .and_then(Duration::try_minutes)
        .and_then(|span| start.checked_add_signed(span))
        .map(Some)
        .ok_or_else(|| GeneratorError::TimeRangeOverflow.into())
}

fn day_allowed(options: &TimeSeriesGeneratorOptions, day: u32) -> bool {
    options.days.is_empty() || options.days.contains(&day)
}

fn in_period(t: LocalDateTime, start: LocalDateTime, end: Option<LocalDateTime>) -> bool {
    t >= start && end.map_or(true, |e| t <= e)
}

fn hhmm_offset(hhmm: u32) -> Duration {
    Duration::hours(i64::from(hhmm / 100)) + Duration::minutes(i64::from(hhmm % 100))
}

// ============================================================================
// FixedTimes
// ============================================================================

fn fixed_times(
    times: &mut BTreeSet<LocalDateTime>,
    options: &TimeSeriesGeneratorOptions,
    start: LocalDateTime,
    end: Option<LocalDateTime>,
    zone: Tz,
) -> Result<()> {
    if options.time_list.is_empty() {
        return Ok(());
    }

    match options.time_steps {
        Some(count) => fixed_times_for_steps(times, options, start, count as usize, zone),
        None => {
            let end = end.ok_or(GeneratorError::MissingEndTime)?;
            fixed_times_until(times, options, start, end, zone);
        }
    }
    Ok(())
}

fn fixed_times_until(
    times: &mut BTreeSet<LocalDateTime>,
    options: &TimeSeriesGeneratorOptions,
    start: LocalDateTime,
    end: LocalDateTime,
    zone: Tz,
) {
    let last_day = end.date_naive();
    let days = start.date_naive().iter_days().take_while(|d| *d <= last_day);

    for day in days {
        if !day_allowed(options, day.day()) {
            continue;
        }
        for &hhmm in &options.time_list {
            if let Some(t) = make_time(day, hhmm_offset(hhmm), zone) {
                if in_period(t, start, Some(end)) {
                    times.insert(t);
                }
            }
        }
    }
}

fn fixed_times_for_steps(
    times: &mut BTreeSet<LocalDateTime>,
    options: &TimeSeriesGeneratorOptions,
    start: LocalDateTime,
    count: usize,
    zone: Tz,
) {
    if count == 0 {
        return;
    }

    let days = start.date_naive().iter_days().take(MAX_WALK_DAYS as usize);
    for day in days {
        if !day_allowed(options, day.day()) {
            continue;
        }
        for &hhmm in &options.time_list {
            let Some(t) = make_time(day, hhmm_offset(hhmm), zone) else {
                continue;
            };
            if t >= start {
                times.insert(t);
            }
            if times.len() >= count {
                return;
            }
        }
    }
}

// ============================================================================
// TimeSteps
// ============================================================================

fn time_steps(
    times: &mut BTreeSet<LocalDateTime>,
    options: &TimeSeriesGeneratorOptions,
    start: LocalDateTime,
    end: LocalDateTime,
    zone: Tz,
) {
    let step = options.time_step.unwrap_or(DEFAULT_TIME_STEP);
    if step == 0 {
        times.insert(start);
        times.insert(end);
        return;
    }

    let mut day: NaiveDate = start.date_naive();
    let mut minutes: u32 = 0;
    loop {
        if minutes >= MINUTES_PER_DAY {
            minutes -= MINUTES_PER_DAY;
            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        let t = make_time(day, Duration::minutes(i64::from(minutes)), zone);
        if t.is_some_and(|t| t > end) {
            break;
        }
        // Midnight may itself be skipped by DST; use the next day as the bound
        if t.is_none() && day > end.date_naive() {
            break;
        }

        if day_allowed(options, day.day()) {
            if let Some(t) = t {
                match options.time_steps {
                    Some(count) => {
                        if t >= start {
                            times.insert(t);
                        }
                        if times.len() >= count as usize {
                            break;
                        }
                    }
                    None => {
                        if in_period(t, start, Some(end)) {
                            times.insert(t);
                        }
                    }
                }
            }
        }
        minutes += step;
    }
}

// ============================================================================
// DataTimes and GraphTimes
// ============================================================================

fn data_times(
    times: &mut BTreeSet<LocalDateTime>,
    options: &TimeSeriesGeneratorOptions,
    start: LocalDateTime,
    end: Option<LocalDateTime>,
    zone: Tz,
) {
    if options.is_climatology {
        climatology_times(times, options, start, end, zone);
        return;
    }

    for t in options.data_times().iter() {
        let lt = from_utc(t.naive_utc(), zone);
        if !day_allowed(options, lt.day()) {
            continue;
        }
        match options.time_steps {
            Some(count) => {
                let count = count as usize;
                if lt >= start && times.len() < count {
                    times.insert(lt);
                }
                if times.len() >= count {
                    break;
                }
            }
            None => {
                if in_period(lt, start, end) {
                    times.insert(lt);
                }
            }
        }
    }
}

/// Data times repeated over every year from the start year to the end year
///
/// Dates that do not exist in a year (29 February) are skipped.
fn climatology_times(
    times: &mut BTreeSet<LocalDateTime>,
    options: &TimeSeriesGeneratorOptions,
    start: LocalDateTime,
    end: Option<LocalDateTime>,
    zone: Tz,
) {
    let first_year = start.year();
    let last_year = end.map_or(first_year, |e| e.year());

    for year in first_year..=last_year {
        for t in options.data_times().iter() {
            if options
                .time_steps
                .is_some_and(|count| times.len() >= count as usize)
            {
                break;
            }

            let naive = t.naive_utc();
            let Some(shifted) = naive.with_year(year) else {
                continue;
            };
            let lt = from_utc(shifted, zone);
            if end.is_some_and(|e| lt > e) {
                break;
            }
            if !day_allowed(options, lt.day()) {
                continue;
            }
            if in_period(lt, start, end) {
                times.insert(lt);
            }
        }
    }
}

fn graph_times(
    times: &mut BTreeSet<LocalDateTime>,
    options: &TimeSeriesGeneratorOptions,
    start: LocalDateTime,
    end: Option<LocalDateTime>,
    zone: Tz,
) {
    let extra = start.minute() * 60 + start.second();
    if extra > 0 {
        if let Some(t) = start.checked_add_signed(Duration::seconds(i64::from(3600 - extra))) {
            times.insert(t);
        }
    }
    data_times(times, options, start, end, zone);
}
