//! Time and area aggregation
//!
//! Reduces series onto a timestep grid (time aggregation), across the
//! members of a group (area aggregation), or both in either order.
//!
//! # Composition
//!
//! ```text
//!   inner    outer    series                     group
//!   -----    -----    ------                     -----
//!   Area     Time     filter -> time             area -> time   (one member)
//!   Time     Area     time -> filter             time -> area   (one member)
//!   Area     -        filter                     area           (one member)
//!   Time     -        time                       time           (per member)
//!   -        -        identity                   identity
//! ```
//!
//! A single series has no area axis, so an area function applied to it only
//! filters values outside the function's limits.
//!
//! # Time windows
//!
//! For every timestep `t` the window is `[t - behind, t + ahead]`, both ends
//! inclusive. Both window edges only move forward as `t` advances, so the
//! scan over the input is a two-pointer walk:
//!
//! ```text
//!   input   o--o----o--o---o----o--o---o
//!                ^begin      ^end
//!   t             [----t----]
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, TimeZone};
//! use tseries::aggregation::{Aggregator, DataFunction, DataFunctions, FunctionId, FunctionType};
//! use tseries::types::{TimeSeries, TimedValue};
//!
//! let t0 = chrono_tz::UTC.with_ymd_and_hms(2015, 3, 2, 22, 0, 0).unwrap();
//! let series: TimeSeries = (0..5)
//!     .map(|h| TimedValue::new(t0 + Duration::hours(h), (h + 1) as f64))
//!     .collect();
//!
//! let mean = DataFunction::new(FunctionId::Mean, FunctionType::Time).with_intervals(120, 0);
//! let aggregator = Aggregator::new();
//! let result = aggregator
//!     .aggregate(&series, &DataFunctions::single(mean), &series.times())
//!     .unwrap();
//!
//! assert_eq!(result.len(), 5);
//! assert_eq!(aggregator.stats().windows_computed, 5);
//! ```

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Duration;
use tracing::{debug, trace, warn};

use crate::error::{AggregationError, Error, Result};
use crate::types::{
    LocalDateTime, LonLat, LonLatTimeSeries, TimeSeries, TimeSeriesGroup, TimedValue, Value,
    LOCAL_TIME_FORMAT,
};

use super::function::{DataFunction, DataFunctions, FunctionId, FunctionType};
use super::stat::{DataItem, Stat, Window};

/// Missing sentinel handed to `Stat` during aggregation
pub const DEFAULT_MISSING_VALUE: f64 = 32700.0;

// ============================================================================
// Statistic Calculator
// ============================================================================

/// Accumulates the samples of one aggregation window
///
/// Doubles and ints go to the numeric statistics; every other value,
/// including missing ones, is kept aside for the type-specific rules.
#[derive(Debug, Clone)]
pub struct StatCalculator {
    data: Vec<DataItem>,
    others: Vec<TimedValue>,
    timestep: Option<LocalDateTime>,
    missing_value: f64,
}

impl Default for StatCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatCalculator {
    /// Empty calculator
    pub fn new() -> Self {
        Self::with_missing_value(DEFAULT_MISSING_VALUE)
    }

    /// Empty calculator using a specific numeric missing sentinel
    pub fn with_missing_value(missing_value: f64) -> Self {
        Self {
            data: Vec::new(),
            others: Vec::new(),
            timestep: None,
            missing_value,
        }
    }

    /// Timestep used by Nearest and Interpolate
    pub fn set_timestep(&mut self, timestep: LocalDateTime) {
        self.timestep = Some(timestep);
    }

    /// Add one sample
    ///
    /// A NaN double counts as a missing sample.
    pub fn push(&mut self, tv: &TimedValue) {
        match tv.value.numeric() {
            Some(v) if v.is_nan() => self.others.push(TimedValue::missing(tv.time)),
            Some(v) => self.data.push(DataItem::new(tv.time, v)),
            None => self.others.push(tv.clone()),
        }
    }

    /// Number of samples added
    pub fn len(&self) -> usize {
        self.data.len() + self.others.len()
    }

    /// True if nothing was added
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute the function over the accumulated samples
    ///
    /// A missing sample makes the result missing unless the function
    /// tolerates missing values. Numbers may not share a window with
    /// strings, dates or coordinates.
    pub fn stat_value(&self, func: &DataFunction, use_weights: bool) -> Result<Value> {
        if !func.is_nan_function() && self.others.iter().any(|tv| tv.value.is_none()) {
            return Ok(Value::None);
        }

        if !self.data.is_empty() {
            if let Some(odd) = self.others.iter().find(|tv| !tv.value.is_none()) {
                return Err(AggregationError::MixedValueTypes {
                    expected: "double",
                    found: odd.value.type_name(),
                }
                .into());
            }
            let result = self.numeric_value(func, use_weights);
            if result == self.missing_value || result.is_nan() {
                return Ok(Value::None);
            }
            return Ok(Value::Double(result));
        }

        let present: Vec<&TimedValue> =
            self.others.iter().filter(|tv| !tv.value.is_none()).collect();
        let Some(first) = present.first() else {
            return Ok(Value::None);
        };

        let expected = first.value.type_name();
        if let Some(odd) = present.iter().find(|tv| tv.value.type_name() != expected) {
            return Err(AggregationError::MixedValueTypes {
                expected,
                found: odd.value.type_name(),
            }
            .into());
        }

        match &first.value {
            Value::String(_) => self.string_value(func, &present),
            Value::DateTime(_) => date_value(func, &present),
            Value::LonLat(_) => lonlat_value(func, &present),
            _ => Ok(Value::None),
        }
    }

    fn numeric_value(&self, func: &DataFunction, use_weights: bool) -> f64 {
        let missing = self.missing_value;
        let mut stat = Stat::with_data(self.data.clone(), missing);
        stat.set_weights(use_weights);
        stat.set_degrees(func.is_circular());

        let all = Window::ALL;
        match func.id() {
            FunctionId::Mean => stat.mean(all),
            FunctionId::ArithmeticMean => {
                stat.set_weights(false);
                stat.mean(all)
            }
            FunctionId::CircularMean => stat.circlemean(all),
            FunctionId::Maximum => stat.max(all),
            FunctionId::Minimum => stat.min(all),
            FunctionId::Median => stat.median(all),
            FunctionId::Sum => {
                stat.set_weights(false);
                stat.sum(all)
            }
            FunctionId::Integ => stat.integ(all),
            FunctionId::StandardDeviation => stat.stddev(all),
            FunctionId::Percentage => stat.percentage(func.lower_limit(), func.upper_limit(), all),
            FunctionId::Count => stat.count(func.lower_limit(), func.upper_limit(), all),
            FunctionId::Change => stat.change(all),
            FunctionId::Trend => stat.trend(all),
            FunctionId::Nearest => self
                .timestep
                .map_or(missing, |t| stat.nearest(t, all)),
            FunctionId::Interpolate => self
                .timestep
                .map_or(missing, |t| stat.interpolate(t, all)),
            FunctionId::NullFunction => missing,
        }
    }

    fn string_value(&self, func: &DataFunction, items: &[&TimedValue]) -> Result<Value> {
        let pick = |i: usize| items.get(i).map_or(Value::None, |tv| tv.value.clone());

        let value = match func.id() {
            FunctionId::Mean
            | FunctionId::ArithmeticMean
            | FunctionId::StandardDeviation
            | FunctionId::Percentage
            | FunctionId::Change
            | FunctionId::Trend
            | FunctionId::Minimum => pick(0),
            FunctionId::Maximum => pick(items.len() - 1),
            FunctionId::Median => pick(items.len() / 2),
            FunctionId::Nearest | FunctionId::Interpolate => self
                .timestep
                .and_then(|t| items.iter().find(|tv| tv.time == t))
                .map_or_else(|| pick(0), |tv| tv.value.clone()),
            FunctionId::Sum | FunctionId::Integ => {
                let joined: Vec<String> = items.iter().map(|tv| tv.value.to_string()).collect();
                Value::String(format!("[{}]", joined.join(" ")))
            }
            FunctionId::Count => {
                let ones = items.iter().map(|tv| DataItem::new(tv.time, 1.0)).collect();
                let stat = Stat::with_data(ones, self.missing_value);
                let count = stat.count(func.lower_limit(), func.upper_limit(), Window::ALL);
                Value::String(count.to_string())
            }
            _ => return Err(unsupported(func, "string")),
        };
        Ok(value)
    }
}

/// Attach the function and timestep to a window failure
fn at_timestep(func: &DataFunction, t: LocalDateTime, err: Error) -> Error {
    match err {
        Error::Aggregation(source) => AggregationError::AtTimestep {
            function: func.hash_key(),
            time: t.format(LOCAL_TIME_FORMAT).to_string(),
            source: Box::new(source),
        }
        .into(),
        other => other,
    }
}

fn unsupported(func: &DataFunction, value_type: &'static str) -> Error {
    AggregationError::UnsupportedFunction {
        function: func.hash_key(),
        value_type,
    }
    .into()
}

fn date_value(func: &DataFunction, items: &[&TimedValue]) -> Result<Value> {
    let index = match func.id() {
        FunctionId::Maximum => items.len() - 1,
        FunctionId::Minimum => 0,
        FunctionId::Median => items.len() / 2,
        _ => return Err(unsupported(func, "date")),
    };
    Ok(items[index].value.clone())
}

fn lonlat_value(func: &DataFunction, items: &[&TimedValue]) -> Result<Value> {
    let coords: Vec<LonLat> = items
        .iter()
        .filter_map(|tv| match tv.value {
            Value::LonLat(c) => Some(c),
            _ => None,
        })
        .collect();

    let lons = coords.iter().map(|c| c.lon);
    let lats = coords.iter().map(|c| c.lat);

    let result = match func.id() {
        FunctionId::Maximum => LonLat::new(
            lons.fold(f64::NEG_INFINITY, f64::max),
            lats.fold(f64::NEG_INFINITY, f64::max),
        ),
        FunctionId::Minimum => LonLat::new(
            lons.fold(f64::INFINITY, f64::min),
            lats.fold(f64::INFINITY, f64::min),
        ),
        FunctionId::Sum | FunctionId::Integ => LonLat::new(
            wrap_by_subtraction(lons.sum(), 180.0),
            wrap_by_subtraction(lats.sum(), 90.0),
        ),
        _ => return Err(unsupported(func, "lonlat-coordinate")),
    };
    Ok(Value::LonLat(result))
}

/// Step `value` toward zero by `limit` until it is within `[-limit, limit]`
///
/// Sums far outside the coordinate range end up bounded but are not
/// geographically meaningful.
fn wrap_by_subtraction(mut value: f64, limit: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    while value.abs() > limit {
        value -= limit * value.signum();
    }
    value
}

// ============================================================================
// Filtering
// ============================================================================

/// True if the sample takes part in the reduction
///
/// Limits only filter when they are given and the function does not use
/// them as its own argument. Non-numeric values always pass.
pub fn include_value(tv: &TimedValue, func: &DataFunction) -> bool {
    if !func.lower_or_upper_limit_given() || func.id().uses_limits_as_argument() {
        return true;
    }
    match tv.value.numeric() {
        Some(v) => v >= func.lower_limit() && v <= func.upper_limit(),
        None => true,
    }
}

/// Replace excluded values with missing ones, keeping every timestamp
pub fn filter(ts: &TimeSeries, func: &DataFunction) -> TimeSeries {
    ts.iter()
        .map(|tv| {
            if include_value(tv, func) {
                tv.clone()
            } else {
                TimedValue::missing(tv.time)
            }
        })
        .collect()
}

// ============================================================================
// Aggregator Statistics
// ============================================================================

/// Counters for aggregation work
#[derive(Debug, Default)]
pub struct AggregatorStats {
    /// Aggregate calls
    pub aggregations: AtomicU64,

    /// Series fed to time or area reductions
    pub series_processed: AtomicU64,

    /// Samples fed to statistic calculators
    pub points_processed: AtomicU64,

    /// Output values computed
    pub windows_computed: AtomicU64,

    /// Aggregate calls that produced nothing
    pub empty_results: AtomicU64,
}

impl AggregatorStats {
    /// Get a snapshot of current statistics
    pub fn snapshot(&self) -> AggregatorStatsSnapshot {
        AggregatorStatsSnapshot {
            aggregations: self.aggregations.load(Ordering::Relaxed),
            series_processed: self.series_processed.load(Ordering::Relaxed),
            points_processed: self.points_processed.load(Ordering::Relaxed),
            windows_computed: self.windows_computed.load(Ordering::Relaxed),
            empty_results: self.empty_results.load(Ordering::Relaxed),
        }
    }

    fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }
}

/// Snapshot of aggregator statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorStatsSnapshot {
    /// Aggregate calls
    pub aggregations: u64,
    /// Series reduced
    pub series_processed: u64,
    /// Samples reduced
    pub points_processed: u64,
    /// Output values computed
    pub windows_computed: u64,
    /// Empty results
    pub empty_results: u64,
}

// ============================================================================
// Reductions
// ============================================================================

/// Reduce a series onto `timesteps` with a time function
///
/// The input should be ordered by time. Unordered input is sorted
/// (stably) before the scan.
pub fn time_aggregate(
    ts: &TimeSeries,
    func: &DataFunction,
    timesteps: &[LocalDateTime],
) -> Result<TimeSeries> {
    time_aggregate_counted(ts, func, timesteps, DEFAULT_MISSING_VALUE, None)
}

/// Time aggregation of every group member, keeping their coordinates
pub fn time_aggregate_group(
    group: &TimeSeriesGroup,
    func: &DataFunction,
    timesteps: &[LocalDateTime],
) -> Result<TimeSeriesGroup> {
    time_aggregate_group_counted(group, func, timesteps, DEFAULT_MISSING_VALUE, None)
}

/// Reduce each time slice of a group across its members
///
/// Members are matched by index; timestamps come from the first member.
pub fn area_aggregate(group: &TimeSeriesGroup, func: &DataFunction) -> Result<TimeSeries> {
    area_aggregate_counted(group, func, DEFAULT_MISSING_VALUE, None)
}

fn time_aggregate_counted(
    ts: &TimeSeries,
    func: &DataFunction,
    timesteps: &[LocalDateTime],
    missing_value: f64,
    stats: Option<&AggregatorStats>,
) -> Result<TimeSeries> {
    let mut ret = TimeSeries::with_capacity(timesteps.len());
    if ts.is_empty() {
        return Ok(ret);
    }

    let input: Cow<'_, [TimedValue]> = if ts.is_time_ordered() {
        Cow::Borrowed(ts.as_slice())
    } else {
        warn!(
            points = ts.len(),
            "time aggregation input is not ordered by time, sorting a copy"
        );
        let mut sorted = ts.to_vec();
        sorted.sort_by_key(|tv| tv.time);
        Cow::Owned(sorted)
    };

    let behind = Duration::minutes(i64::from(func.interval_behind()));
    let ahead = Duration::minutes(i64::from(func.interval_ahead()));

    let mut begin = 0;
    let mut end = 0;
    for &t in timesteps {
        let window_begin = t - behind;
        let window_end = t + ahead;

        while begin < input.len() && input[begin].time < window_begin {
            begin += 1;
        }
        while end < input.len() && input[end].time <= window_end {
            end += 1;
        }

        let mut calculator = StatCalculator::with_missing_value(missing_value);
        calculator.set_timestep(t);
        for tv in &input[begin..end.max(begin)] {
            if include_value(tv, func) {
                calculator.push(tv);
            }
        }

        if let Some(stats) = stats {
            AggregatorStats::add(&stats.points_processed, calculator.len());
            AggregatorStats::add(&stats.windows_computed, 1);
        }
        let value = calculator
            .stat_value(func, true)
            .map_err(|e| at_timestep(func, t, e))?;
        ret.push(TimedValue::new(t, value));
    }

    if let Some(stats) = stats {
        AggregatorStats::add(&stats.series_processed, 1);
    }
    trace!(function = %func.id(), steps = ret.len(), "time aggregation done");
    Ok(ret)
}

fn time_aggregate_group_counted(
    group: &TimeSeriesGroup,
    func: &DataFunction,
    timesteps: &[LocalDateTime],
    missing_value: f64,
    stats: Option<&AggregatorStats>,
) -> Result<TimeSeriesGroup> {
    group
        .iter()
        .map(|member| {
            let ts =
                time_aggregate_counted(&member.timeseries, func, timesteps, missing_value, stats)?;
            Ok(LonLatTimeSeries::new(member.lonlat, ts))
        })
        .collect()
}

fn area_aggregate_counted(
    group: &TimeSeriesGroup,
    func: &DataFunction,
    missing_value: f64,
    stats: Option<&AggregatorStats>,
) -> Result<TimeSeries> {
    let Some(first) = group.first() else {
        return Ok(TimeSeries::new());
    };

    let expected = first.timeseries.len();
    if let Some((index, member)) = group
        .iter()
        .enumerate()
        .find(|(_, m)| m.timeseries.len() < expected)
    {
        return Err(AggregationError::GroupMisaligned {
            index,
            expected,
            actual: member.timeseries.len(),
        }
        .into());
    }

    let mut ret = TimeSeries::with_capacity(expected);
    for (i, slot) in first.timeseries.iter().enumerate() {
        let mut calculator = StatCalculator::with_missing_value(missing_value);
        for member in group {
            let tv = &member.timeseries[i];
            if include_value(tv, func) {
                calculator.push(tv);
            }
        }

        if let Some(stats) = stats {
            AggregatorStats::add(&stats.points_processed, calculator.len());
            AggregatorStats::add(&stats.windows_computed, 1);
        }
        let value = calculator
            .stat_value(func, false)
            .map_err(|e| at_timestep(func, slot.time, e))?;
        ret.push(TimedValue::new(slot.time, value));
    }

    if let Some(stats) = stats {
        AggregatorStats::add(&stats.series_processed, group.len());
    }
    Ok(ret)
}

// ============================================================================
// Aggregator
// ============================================================================

/// Input shapes the aggregator accepts
pub trait Aggregatable: Sized {
    /// Apply `functions` onto the `timesteps` grid
    fn aggregate_with(
        &self,
        aggregator: &Aggregator,
        functions: &DataFunctions,
        timesteps: &[LocalDateTime],
    ) -> Result<Self>;

    /// Timestamps of the input itself, used when no grid is given
    fn own_timesteps(&self) -> Vec<LocalDateTime>;

    /// True if there is nothing to aggregate
    fn is_empty_input(&self) -> bool;
}

/// Aggregation entry point with work counters
///
/// Holds no data between calls; one instance can serve any number of
/// requests.
#[derive(Debug)]
pub struct Aggregator {
    stats: AggregatorStats,
    missing_value: f64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Aggregator with the default numeric missing sentinel
    pub fn new() -> Self {
        Self {
            stats: AggregatorStats::default(),
            missing_value: DEFAULT_MISSING_VALUE,
        }
    }

    /// Use a different numeric missing sentinel
    ///
    /// Numeric samples equal to the sentinel count as missing.
    pub fn with_missing_value(mut self, missing_value: f64) -> Self {
        self.missing_value = missing_value;
        self
    }

    /// Numeric missing sentinel
    pub fn missing_value(&self) -> f64 {
        self.missing_value
    }

    /// Aggregate a series or group onto `timesteps`
    pub fn aggregate<T: Aggregatable>(
        &self,
        input: &T,
        functions: &DataFunctions,
        timesteps: &[LocalDateTime],
    ) -> Result<T> {
        AggregatorStats::add(&self.stats.aggregations, 1);
        let ret = input.aggregate_with(self, functions, timesteps)?;
        if ret.is_empty_input() {
            AggregatorStats::add(&self.stats.empty_results, 1);
        }
        Ok(ret)
    }

    /// Aggregate onto the input's own timestamps
    pub fn aggregate_on_own_times<T: Aggregatable>(
        &self,
        input: &T,
        functions: &DataFunctions,
    ) -> Result<T> {
        let timesteps = input.own_timesteps();
        self.aggregate(input, functions, &timesteps)
    }

    /// Counter snapshot
    pub fn stats(&self) -> AggregatorStatsSnapshot {
        self.stats.snapshot()
    }

    fn time(
        &self,
        ts: &TimeSeries,
        func: &DataFunction,
        timesteps: &[LocalDateTime],
    ) -> Result<TimeSeries> {
        time_aggregate_counted(ts, func, timesteps, self.missing_value, Some(&self.stats))
    }

    fn time_group(
        &self,
        group: &TimeSeriesGroup,
        func: &DataFunction,
        timesteps: &[LocalDateTime],
    ) -> Result<TimeSeriesGroup> {
        time_aggregate_group_counted(group, func, timesteps, self.missing_value, Some(&self.stats))
    }

    fn area(&self, group: &TimeSeriesGroup, func: &DataFunction) -> Result<TimeSeries> {
        area_aggregate_counted(group, func, self.missing_value, Some(&self.stats))
    }
}

impl Aggregatable for TimeSeries {
    fn aggregate_with(
        &self,
        aggregator: &Aggregator,
        functions: &DataFunctions,
        timesteps: &[LocalDateTime],
    ) -> Result<Self> {
        let inner = &functions.inner;
        let outer = &functions.outer;

        match inner.kind() {
            FunctionType::Area => {
                debug!(inner = %inner.id(), outer = %outer.id(), "series: filter then time");
                let filtered = filter(self, inner);
                if outer.kind() == FunctionType::Time {
                    aggregator.time(&filtered, outer, timesteps)
                } else {
                    Ok(filtered)
                }
            }
            FunctionType::Time => {
                debug!(inner = %inner.id(), outer = %outer.id(), "series: time then filter");
                let aggregated = aggregator.time(self, inner, timesteps)?;
                if outer.kind() == FunctionType::Area {
                    Ok(filter(&aggregated, outer))
                } else {
                    Ok(aggregated)
                }
            }
            FunctionType::Null => Ok(self.clone()),
        }
    }

    fn own_timesteps(&self) -> Vec<LocalDateTime> {
        self.times()
    }

    fn is_empty_input(&self) -> bool {
        self.is_empty()
    }
}

impl Aggregatable for TimeSeriesGroup {
    fn aggregate_with(
        &self,
        aggregator: &Aggregator,
        functions: &DataFunctions,
        timesteps: &[LocalDateTime],
    ) -> Result<Self> {
        let Some(first) = self.first() else {
            return Ok(Vec::new());
        };

        let inner = &functions.inner;
        let outer = &functions.outer;

        let ret = match (inner.kind(), outer.kind()) {
            (FunctionType::Area, FunctionType::Time) => {
                debug!(inner = %inner.id(), outer = %outer.id(), members = self.len(), "group: area then time");
                let area = aggregator.area(self, inner)?;
                let ts = aggregator.time(&area, outer, timesteps)?;
                vec![LonLatTimeSeries::new(first.lonlat, ts)]
            }
            (FunctionType::Time, FunctionType::Area) => {
                debug!(inner = %inner.id(), outer = %outer.id(), members = self.len(), "group: time then area");
                let timed = aggregator.time_group(self, inner, timesteps)?;
                let ts = aggregator.area(&timed, outer)?;
                vec![LonLatTimeSeries::new(first.lonlat, ts)]
            }
            (FunctionType::Area, _) => {
                debug!(function = %inner.id(), members = self.len(), "group: area");
                vec![LonLatTimeSeries::new(first.lonlat, aggregator.area(self, inner)?)]
            }
            (FunctionType::Time, _) => {
                debug!(function = %inner.id(), members = self.len(), "group: time");
                aggregator.time_group(self, inner, timesteps)?
            }
            (FunctionType::Null, _) => self.clone(),
        };
        Ok(ret)
    }

    fn own_timesteps(&self) -> Vec<LocalDateTime> {
        self.first().map(|m| m.times()).unwrap_or_default()
    }

    fn is_empty_input(&self) -> bool {
        self.is_empty()
    }
}
