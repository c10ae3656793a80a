//! Core data types used throughout the crate
//!
//! This module defines the value model shared by statistics, generation and
//! aggregation:
//!
//! # Key Types
//!
//! - **`Value`**: closed variant over missing, string, double, int, coordinate and date
//! - **`TimedValue`**: a single `(time, value)` sample
//! - **`TimeSeries`**: time-ordered samples for one parameter at one location
//! - **`LonLatTimeSeries`**: a series paired with its coordinate
//! - **`TimeSeriesGroup`**: co-located series sharing one timestamp sequence
//!
//! # Example
//!
//! ```rust
//! use chrono::TimeZone;
//! use chrono_tz::Tz;
//! use tseries::types::{TimeSeries, TimedValue, Value};
//!
//! let t = Tz::UTC.with_ymd_and_hms(2015, 3, 2, 22, 0, 0).unwrap();
//! let mut ts = TimeSeries::new();
//! ts.push(TimedValue::new(t, 1.5));
//! ts.push(TimedValue::new(t + chrono::Duration::hours(1), Value::None));
//!
//! assert_eq!(ts.len(), 2);
//! assert!(ts[1].value.is_none());
//! ```

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::ValueError;

/// Zoned local timestamp
///
/// Ordering and equality compare the underlying instant, so timestamps
/// expressed in different zones compare correctly.
pub type LocalDateTime = DateTime<Tz>;

/// Sorted list of zoned timestamps, as produced by the generator
pub type LocalTimeList = Vec<LocalDateTime>;

/// Rendering pattern for zoned timestamps, e.g. `2012-Mar-25 04:00:00 EEST`
pub const LOCAL_TIME_FORMAT: &str = "%Y-%b-%d %H:%M:%S %Z";

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude
    pub lon: f64,
    /// Latitude
    pub lat: f64,
}

impl LonLat {
    /// Create a coordinate from longitude and latitude
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A single observed or computed value
///
/// `None` is the missing value. Statistics apply to the numeric variants;
/// strings, coordinates and dates follow their own reduction rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Missing value
    #[default]
    None,
    /// Symbolic value
    String(String),
    /// Floating point value
    Double(f64),
    /// Integer value
    Int(i32),
    /// Coordinate value
    LonLat(LonLat),
    /// Timestamp value
    DateTime(LocalDateTime),
}

impl Value {
    /// True for the missing value
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Numeric content without string parsing
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(f64::from(*i)),
            _ => None,
        }
    }

    /// Name of the active variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::String(_) => "string",
            Value::Double(_) => "double",
            Value::Int(_) => "int",
            Value::LonLat(_) => "lonlat-coordinate",
            Value::DateTime(_) => "date",
        }
    }

    /// Get the value as a double
    ///
    /// Ints convert exactly and strings are parsed. Missing values,
    /// coordinates and dates are not convertible.
    pub fn as_double(&self) -> Result<f64, ValueError> {
        match self {
            Value::Double(d) => Ok(*d),
            Value::Int(i) => Ok(f64::from(*i)),
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| ValueError::Parse {
                value: s.clone(),
            }),
            other => Err(ValueError::NotConvertible {
                from: other.type_name(),
                to: "double",
            }),
        }
    }

    /// Get the value as an int
    ///
    /// Doubles are truncated toward zero; strings may hold either form.
    pub fn as_int(&self) -> Result<i32, ValueError> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Double(d) => truncate_to_int(*d).ok_or(ValueError::NotConvertible {
                from: "double",
                to: "int",
            }),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i32>() {
                    return Ok(i);
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(truncate_to_int)
                    .ok_or_else(|| ValueError::Parse { value: s.clone() })
            }
            other => Err(ValueError::NotConvertible {
                from: other.type_name(),
                to: "int",
            }),
        }
    }
}

fn truncate_to_int(d: f64) -> Option<i32> {
    let t = d.trunc();
    if t.is_finite() && t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX) {
        Some(t as i32)
    } else {
        None
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<LonLat> for Value {
    fn from(v: LonLat) -> Self {
        Value::LonLat(v)
    }
}

impl From<LocalDateTime> for Value {
    fn from(v: LocalDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "nan"),
            Value::String(s) => write!(f, "{}", s),
            Value::Double(d) => write!(f, "{}", d),
            Value::Int(i) => write!(f, "{}", i),
            Value::LonLat(c) => write!(f, "{}, {}", c.lon, c.lat),
            Value::DateTime(t) => write!(f, "{}", t.format(LOCAL_TIME_FORMAT)),
        }
    }
}

/// A value at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct TimedValue {
    /// Valid time of the value
    pub time: LocalDateTime,
    /// The value itself
    pub value: Value,
}

impl TimedValue {
    /// Create a timed value
    pub fn new(time: LocalDateTime, value: impl Into<Value>) -> Self {
        Self {
            time,
            value: value.into(),
        }
    }

    /// Create a missing value at the given time
    pub fn missing(time: LocalDateTime) -> Self {
        Self {
            time,
            value: Value::None,
        }
    }
}

/// Time-ordered samples
///
/// Callers keep the timestamps non-decreasing. Operations in this crate
/// never mutate their input series; they return new ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries(Vec<TimedValue>);

impl TimeSeries {
    /// Create an empty series
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create an empty series with room for `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Timestamps of all samples in order
    pub fn times(&self) -> LocalTimeList {
        self.0.iter().map(|tv| tv.time).collect()
    }

    /// True if timestamps never decrease
    pub fn is_time_ordered(&self) -> bool {
        self.0.windows(2).all(|w| w[0].time <= w[1].time)
    }
}

impl Deref for TimeSeries {
    type Target = Vec<TimedValue>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for TimeSeries {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<TimedValue>> for TimeSeries {
    fn from(v: Vec<TimedValue>) -> Self {
        Self(v)
    }
}

impl FromIterator<TimedValue> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = TimedValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TimeSeries {
    type Item = TimedValue;
    type IntoIter = std::vec::IntoIter<TimedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a TimedValue;
    type IntoIter = std::slice::Iter<'a, TimedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One location's series together with its coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct LonLatTimeSeries {
    /// Location of the series
    pub lonlat: LonLat,
    /// Values at the location
    pub timeseries: TimeSeries,
}

impl LonLatTimeSeries {
    /// Pair a coordinate with a series
    pub fn new(lonlat: LonLat, timeseries: TimeSeries) -> Self {
        Self { lonlat, timeseries }
    }

    /// Timestamps of the series
    pub fn times(&self) -> LocalTimeList {
        self.timeseries.times()
    }
}

/// Several coordinate-series pairs sharing one timestamp sequence
pub type TimeSeriesGroup = Vec<LonLatTimeSeries>;

/// Parallel columns, e.g. one series per requested parameter
pub type TimeSeriesVector = Vec<TimeSeries>;
