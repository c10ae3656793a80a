//! Time series generation options
//!
//! Describes which timestamps the generator should produce. Start and end
//! times are naive wall-clock values; the `*_utc` flags say whether they are
//! UTC instants or local times in the zone handed to the generator.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::error::{GeneratorError, Result};

/// Timestep used when none is given, in minutes
pub const DEFAULT_TIME_STEP: u32 = 60;

/// Timestamp selection algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Timestamps present in the data
    DataTimes,
    /// Data timestamps plus the next full hour after the start
    GraphTimes,
    /// Fixed clock times of day
    FixedTimes,
    /// Fixed cadence
    #[default]
    TimeSteps,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::DataTimes => "DataTimes",
            Mode::GraphTimes => "GraphTimes",
            Mode::FixedTimes => "FixedTimes",
            Mode::TimeSteps => "TimeSteps",
        };
        f.write_str(name)
    }
}

/// Fallbacks for options a request leaves out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    /// Start time offset from now, in minutes
    pub start_offset: i32,
    /// Length of the series when no end is given, in minutes
    pub interval_length: u32,
    /// Timestep in minutes
    pub time_step: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            start_offset: 0,
            interval_length: 1440,
            time_step: DEFAULT_TIME_STEP,
        }
    }
}

/// Options for `generate`
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesGeneratorOptions {
    /// Algorithm
    pub mode: Mode,
    /// Start time, see `start_time_utc`
    pub start_time: Option<NaiveDateTime>,
    /// End time, see `end_time_utc`
    pub end_time: Option<NaiveDateTime>,
    /// Start time is a UTC instant rather than local wall-clock time
    pub start_time_utc: bool,
    /// End time is a UTC instant rather than local wall-clock time
    pub end_time_utc: bool,
    /// Number of timesteps to produce
    pub time_steps: Option<u32>,
    /// Timestep in minutes for `Mode::TimeSteps`; 0 yields only the endpoints
    pub time_step: Option<u32>,
    /// Clock times of day as HHMM integers for `Mode::FixedTimes`
    pub time_list: BTreeSet<u32>,
    /// Allowed days of month; empty allows all
    pub days: BTreeSet<u32>,
    /// Take the start time from the first data time
    pub start_time_data: bool,
    /// Take the end time from the last data time
    pub end_time_data: bool,
    /// Repeat data times over every year between start and end
    pub is_climatology: bool,
    /// Start time was filled in from defaults
    pub start_time_assumed: bool,
    data_times: Arc<Vec<DateTime<Utc>>>,
    now: NaiveDateTime,
}

impl TimeSeriesGeneratorOptions {
    /// Empty options; `now` is the UTC reference time used by defaults
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            mode: Mode::default(),
            start_time: None,
            end_time: None,
            start_time_utc: true,
            end_time_utc: true,
            time_steps: None,
            time_step: None,
            time_list: BTreeSet::new(),
            days: BTreeSet::new(),
            start_time_data: false,
            end_time_data: false,
            is_climatology: false,
            start_time_assumed: false,
            data_times: Arc::new(Vec::new()),
            now,
        }
    }

    /// Reference time
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// True if every available timestep is output
    pub fn all(&self) -> bool {
        match self.mode {
            Mode::DataTimes | Mode::GraphTimes => true,
            Mode::FixedTimes => false,
            Mode::TimeSteps => matches!(self.time_step, None | Some(0)),
        }
    }

    /// Set the data times (UTC, ascending) and the climatology flag
    pub fn set_data_times(&mut self, times: Arc<Vec<DateTime<Utc>>>, climatology: bool) {
        self.data_times = times;
        self.is_climatology = climatology;
    }

    /// Data times
    pub fn data_times(&self) -> &Arc<Vec<DateTime<Utc>>> {
        &self.data_times
    }

    /// Fill in start, end and timestep the way a request without them is read
    ///
    /// A missing start becomes `now + start_offset` in UTC. A missing end
    /// becomes start plus `time_steps` steps when a count is given, or start
    /// plus the default interval length otherwise. Fails with
    /// `TimeRangeOverflow` when either sum leaves the calendar.
    pub fn apply_defaults(&mut self, defaults: &Defaults) -> Result<()> {
        if self.start_time.is_none() && !self.start_time_data {
            let start = add_minutes(self.now, Some(i64::from(defaults.start_offset)))?;
            self.start_time = Some(start);
            self.start_time_utc = true;
            self.start_time_assumed = true;
        }

        if self.end_time.is_none() && !self.end_time_data {
            let Some(start) = self.start_time else {
                return Ok(());
            };
            let minutes = match self.time_steps {
                Some(steps) => {
                    let step = *self.time_step.get_or_insert(defaults.time_step);
                    i64::from(step).checked_mul(i64::from(steps))
                }
                None => Some(i64::from(defaults.interval_length)),
            };
            self.end_time = Some(add_minutes(start, minutes)?);
            self.end_time_utc = self.start_time_utc;
        }
        Ok(())
    }

    /// Hash over every option that affects the output
    pub fn hash_value(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.mode.hash(&mut hasher);
        self.start_time.hash(&mut hasher);
        self.end_time.hash(&mut hasher);
        self.start_time_utc.hash(&mut hasher);
        self.end_time_utc.hash(&mut hasher);
        self.time_steps.hash(&mut hasher);
        self.time_step.hash(&mut hasher);
        self.time_list.hash(&mut hasher);
        self.days.hash(&mut hasher);
        self.data_times.hash(&mut hasher);
        self.start_time_data.hash(&mut hasher);
        self.end_time_data.hash(&mut hasher);
        self.is_climatology.hash(&mut hasher);
        hasher.finish()
    }
}

fn add_minutes(t: NaiveDateTime, minutes: Option<i64>) -> Result<NaiveDateTime> {
    minutes
        .and_then(Duration::try_minutes)
        .and_then(|span| t.checked_add_signed(span))
        .ok_or_else(|| GeneratorError::TimeRangeOverflow.into())
}

fn write_optional<T: fmt::Display>(f: &mut fmt::Formatter<'_>, value: Option<T>) -> fmt::Result {
    match value {
        Some(v) => write!(f, "{}", v),
        None => Ok(()),
    }
}

impl fmt::Display for TimeSeriesGeneratorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TimeSeriesGeneratorOptions:")?;
        writeln!(f, "    mode          : {}", self.mode)?;
        write!(f, "    startTime     : ")?;
        write_optional(f, self.start_time)?;
        write!(f, "\n    endTime       : ")?;
        write_optional(f, self.end_time)?;
        writeln!(f, "\n    startTimeUTC  : {}", self.start_time_utc)?;
        writeln!(f, "    endTimeUTC    : {}", self.end_time_utc)?;
        write!(f, "    timeSteps     : ")?;
        write_optional(f, self.time_steps)?;
        write!(f, "\n    timeStep      : ")?;
        write_optional(f, self.time_step)?;
        writeln!(f, "\n    startTimeData : {}", self.start_time_data)?;
        writeln!(f, "    endTimeData   : {}", self.end_time_data)?;
        write!(f, "    timeList      :")?;
        for t in &self.time_list {
            write!(f, " {}", t)?;
        }
        write!(f, "\n    days          :")?;
        for d in &self.days {
            write!(f, " {}", d)?;
        }
        write!(f, "\n    dataTimes     :")?;
        for t in self.data_times.iter() {
            write!(f, " '{}'", t.format("%Y-%m-%dT%H:%M:%S"))?;
        }
        writeln!(f, "\n    climatology   : {}", self.is_climatology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 2, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_all() {
        let mut options = TimeSeriesGeneratorOptions::new(now());
        assert!(options.all());
        options.time_step = Some(60);
        assert!(!options.all());
        options.mode = Mode::DataTimes;
        assert!(options.all());
        options.mode = Mode::FixedTimes;
        assert!(!options.all());
    }

    #[test]
    fn test_defaults_fill_start_and_end() {
        let mut options = TimeSeriesGeneratorOptions::new(now());
        options.apply_defaults(&Defaults::default()).unwrap();

        assert!(options.start_time_assumed);
        assert_eq!(options.start_time, Some(now()));
        assert_eq!(options.end_time, Some(now() + Duration::minutes(1440)));
    }

    #[test]
    fn test_defaults_derive_end_from_steps() {
        let mut options = TimeSeriesGeneratorOptions::new(now());
        options.time_steps = Some(4);
        options.apply_defaults(&Defaults::default()).unwrap();

        assert_eq!(options.time_step, Some(60));
        assert_eq!(options.end_time, Some(now() + Duration::hours(4)));
    }

    #[test]
    fn test_hash_changes_with_options() {
        let a = TimeSeriesGeneratorOptions::new(now());
        let mut b = a.clone();
        assert_eq!(a.hash_value(), b.hash_value());

        b.time_list.insert(300);
        assert_ne!(a.hash_value(), b.hash_value());
    }

    #[test]
    fn test_display_lists_mode() {
        let options = TimeSeriesGeneratorOptions::new(now());
        assert!(options.to_string().contains("mode          : TimeSteps"));
    }
}
