//! tseries - statistics, time grids and aggregation for weather time series
//!
//! This library provides:
//! - Time-weighted statistics over timestamped samples, including circular
//!   statistics for wind directions
//! - Generation of output timestamp grids across daylight saving changes
//! - Time and area aggregation of series and location groups
//! - Alignment helpers for padding and pruning series against a grid
//!
//! # Example
//!
//! ```
//! use chrono::TimeZone;
//! use tseries::aggregation::{Aggregator, DataFunction, DataFunctions, FunctionId, FunctionType};
//! use tseries::{TimeSeries, TimedValue, Value};
//!
//! let t0 = chrono_tz::UTC.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
//! let t1 = chrono_tz::UTC.with_ymd_and_hms(2020, 1, 1, 1, 0, 0).unwrap();
//! let ts: TimeSeries = vec![TimedValue::new(t0, 1.0), TimedValue::new(t1, 3.0)].into();
//!
//! let max = DataFunction::new(FunctionId::Maximum, FunctionType::Time).with_intervals(60, 0);
//! let out = Aggregator::new()
//!     .aggregate(&ts, &DataFunctions::single(max), &[t1])
//!     .unwrap();
//! assert_eq!(out[0].value, Value::Double(3.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregation;
pub mod calendar;
pub mod error;
pub mod generator;
pub mod types;
pub mod utility;

/// Configuration management with TOML support
pub mod config;

/// Tracing subscriber initialisation
pub mod logging;

/// Value formatting and series display
pub mod output;

// Re-export main types
pub use config::Config;
pub use error::{Error, Result};
pub use types::{
    LocalDateTime, LocalTimeList, LonLat, LonLatTimeSeries, TimeSeries, TimeSeriesGroup,
    TimeSeriesVector, TimedValue, Value,
};
