//! Weighted statistics over timestamped samples
//!
//! `Stat` holds a vector of `(time, value, weight)` items and computes one
//! scalar statistic at a time, optionally restricted to an inclusive time
//! window.
//!
//! # Weighting
//!
//! When weighting is enabled and every sample has a timestamp, each sample
//! represents the time span around it: half the gap to its predecessor plus
//! half the gap to its successor. Weights are in seconds and are recomputed
//! for every filtered subset.
//!
//! ```text
//!   t0        t1              t2
//!   |----|----|-------|-------|
//!   w0 = (t1-t0)/2
//!        w1 = (t1-t0)/2 + (t2-t1)/2
//!                     w2 = (t2-t1)/2
//! ```
//!
//! A lone sample keeps the default weight of one second.
//!
//! # Missing values
//!
//! Every statistic returns the configured missing value (NaN by default)
//! when the window is inverted, empty, or contains a missing sample.
//! `nearest` and `interpolate` skip missing samples instead.
//!
//! # Example
//!
//! ```rust
//! use tseries::aggregation::stat::{Stat, Window};
//!
//! let stat = Stat::from_values(&[2.0, 1.0, 5.0, 3.0, 4.0]);
//! assert_eq!(stat.sum(Window::ALL), 15.0);
//! assert_eq!(stat.mean(Window::ALL), 3.0);
//! assert_eq!(stat.median(Window::ALL), 3.0);
//! ```

use crate::types::LocalDateTime;

/// Weight of a sample that has no neighbours or when weighting is off
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// One sample fed to `Stat`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataItem {
    /// Sample time, if known
    pub time: Option<LocalDateTime>,
    /// Sample value
    pub value: f64,
    /// Sample weight in seconds
    pub weight: f64,
}

impl DataItem {
    /// Timestamped sample
    pub fn new(time: LocalDateTime, value: f64) -> Self {
        Self {
            time: Some(time),
            value,
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Sample without a timestamp
    pub fn untimed(value: f64) -> Self {
        Self {
            time: None,
            value,
            weight: DEFAULT_WEIGHT,
        }
    }
}

/// Inclusive time window; an open side is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Window {
    /// First included time
    pub start: Option<LocalDateTime>,
    /// Last included time
    pub end: Option<LocalDateTime>,
}

impl Window {
    /// The whole data set
    pub const ALL: Window = Window {
        start: None,
        end: None,
    };

    /// Window with optional bounds
    pub fn new(start: Option<LocalDateTime>, end: Option<LocalDateTime>) -> Self {
        Self { start, end }
    }

    /// Both bounds given
    pub fn between(start: LocalDateTime, end: LocalDateTime) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// From `start` to the end of the data
    pub fn since(start: LocalDateTime) -> Self {
        Self::new(Some(start), None)
    }

    /// From the start of the data to `end`
    pub fn until(end: LocalDateTime) -> Self {
        Self::new(None, Some(end))
    }

    /// True if neither side is bounded
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// True if start is after end
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }

    /// True if `t` lies inside the window
    pub fn contains(&self, t: LocalDateTime) -> bool {
        self.start.map_or(true, |s| t >= s) && self.end.map_or(true, |e| t <= e)
    }

    fn bounds_secs(&self) -> (f64, f64) {
        (
            self.start.map_or(f64::NEG_INFINITY, epoch_secs),
            self.end.map_or(f64::INFINITY, epoch_secs),
        )
    }
}

fn epoch_secs(t: LocalDateTime) -> f64 {
    t.timestamp_millis() as f64 / 1000.0
}

/// Signed shortest arc from `from` to `to` in degrees, in (-180, 180]
pub fn angular_difference(from: f64, to: f64) -> f64 {
    let d = (to - from).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Statistics calculator
#[derive(Debug, Clone)]
pub struct Stat {
    data: Vec<DataItem>,
    missing: f64,
    weights: bool,
    degrees: bool,
}

impl Default for Stat {
    fn default() -> Self {
        Self::new()
    }
}

impl Stat {
    /// Empty calculator with NaN as the missing value
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            missing: f64::NAN,
            weights: true,
            degrees: false,
        }
    }

    /// Calculator over the given items with a specific missing value
    pub fn with_data(data: Vec<DataItem>, missing: f64) -> Self {
        Self {
            data,
            missing,
            ..Self::new()
        }
    }

    /// Calculator over untimed values
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            data: values.iter().copied().map(DataItem::untimed).collect(),
            ..Self::new()
        }
    }

    /// Replace the data
    pub fn set_data(&mut self, data: Vec<DataItem>) {
        self.data = data;
    }

    /// Append a timestamped value
    pub fn add_timed(&mut self, time: LocalDateTime, value: f64) {
        self.data.push(DataItem::new(time, value));
    }

    /// Append a value without a timestamp
    pub fn add_value(&mut self, value: f64) {
        self.data.push(DataItem::untimed(value));
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if there are no items
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Set the value that marks missing data, both on input and output
    pub fn set_missing_value(&mut self, missing: f64) {
        self.missing = missing;
    }

    /// The missing value
    pub fn missing_value(&self) -> f64 {
        self.missing
    }

    /// True if `value` is the missing value (NaN matches NaN)
    pub fn is_missing(&self, value: f64) -> bool {
        value == self.missing || (self.missing.is_nan() && value.is_nan())
    }

    /// Enable or disable time weighting
    pub fn set_weights(&mut self, on: bool) {
        self.weights = on;
    }

    /// Enable or disable circular (0-360 degrees) semantics
    pub fn set_degrees(&mut self, on: bool) {
        self.degrees = on;
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Unweighted sum; degrees are reduced modulo 360
    pub fn sum(&self, window: Window) -> f64 {
        let Some(items) = self.valid_subset(window) else {
            return self.missing;
        };
        let sum: f64 = items.iter().map(|d| d.value).sum();
        if self.degrees {
            sum.rem_euclid(360.0)
        } else {
            sum
        }
    }

    /// Time integral in value x hours
    ///
    /// Each sample covers the span given by its weight. Samples whose span
    /// only partly overlaps the window contribute the overlapping fraction.
    /// Without weighting the integral is the plain sum.
    pub fn integ(&self, window: Window) -> f64 {
        if window.is_inverted() {
            return self.missing;
        }
        if !self.weighted(&self.data) {
            return self.sum(window);
        }

        let (lo, hi) = window.bounds_secs();
        let times: Vec<f64> = self
            .data
            .iter()
            .map(|d| d.time.map_or(0.0, epoch_secs))
            .collect();

        let n = self.data.len();
        let mut touched = false;
        let mut integral = 0.0;

        for (i, item) in self.data.iter().enumerate() {
            let t = times[i];
            let (start, end) = if n == 1 {
                (t, t + DEFAULT_WEIGHT)
            } else {
                let before = if i > 0 { (t - times[i - 1]) / 2.0 } else { 0.0 };
                let after = if i + 1 < n { (times[i + 1] - t) / 2.0 } else { 0.0 };
                (t - before, t + after)
            };

            let overlap = end.min(hi) - start.max(lo);
            let inside = t >= lo && t <= hi;
            if overlap <= 0.0 && !inside {
                continue;
            }
            if self.is_missing(item.value) {
                return self.missing;
            }
            touched = true;
            integral += item.value * overlap.max(0.0);
        }

        if touched {
            integral / 3600.0
        } else {
            self.missing
        }
    }

    /// Minimum value
    pub fn min(&self, window: Window) -> f64 {
        match self.valid_subset(window) {
            Some(items) => items.iter().map(|d| d.value).fold(f64::INFINITY, f64::min),
            None => self.missing,
        }
    }

    /// Maximum value
    pub fn max(&self, window: Window) -> f64 {
        match self.valid_subset(window) {
            Some(items) => items
                .iter()
                .map(|d| d.value)
                .fold(f64::NEG_INFINITY, f64::max),
            None => self.missing,
        }
    }

    /// Mean, weighted when weighting applies
    ///
    /// In degrees mode every sample is first unwrapped to within 180 degrees
    /// of its predecessor, so 350 and 10 average to 0 rather than 180.
    pub fn mean(&self, window: Window) -> f64 {
        match self.valid_subset(window) {
            Some(items) => self.mean_of(&items),
            None => self.missing,
        }
    }

    /// Vector mean of directions in degrees, in [0, 360)
    pub fn circlemean(&self, window: Window) -> f64 {
        let Some(items) = self.valid_subset(window) else {
            return self.missing;
        };
        let (sin, cos) = items.iter().fold((0.0, 0.0), |(s, c), d| {
            let r = d.value.to_radians();
            (s + d.weight * r.sin(), c + d.weight * r.cos())
        });
        sin.atan2(cos).to_degrees().rem_euclid(360.0)
    }

    /// Weighted median
    ///
    /// Walks the samples in value order accumulating weight. When the
    /// cumulative weight lands exactly on half of the total the result is
    /// the midpoint of that sample and the next one.
    pub fn median(&self, window: Window) -> f64 {
        let Some(mut items) = self.valid_subset(window) else {
            return self.missing;
        };
        items.sort_by(|a, b| a.value.total_cmp(&b.value));

        let half = total_weight(&items) / 2.0;
        let mut cumulative = 0.0;
        for (i, item) in items.iter().enumerate() {
            cumulative += item.weight;
            if cumulative == half {
                if let Some(next) = items.get(i + 1) {
                    return (item.value + next.value) / 2.0;
                }
            }
            if cumulative >= half {
                return item.value;
            }
        }
        items.last().map_or(self.missing, |d| d.value)
    }

    /// Sample variance
    ///
    /// Unweighted this is the usual n-1 estimator. Weighted, the weights are
    /// treated as frequencies with the lightest sample counting as one
    /// observation. Degrees use the shortest angular residual from the mean.
    pub fn variance(&self, window: Window) -> f64 {
        match self.valid_subset(window) {
            Some(items) => self.variance_of(&items),
            None => self.missing,
        }
    }

    /// Square root of the variance
    pub fn stddev(&self, window: Window) -> f64 {
        match self.valid_subset(window) {
            Some(items) => self.variance_of(&items).sqrt(),
            None => self.missing,
        }
    }

    /// Last value minus first value; degrees give the signed shortest arc
    pub fn change(&self, window: Window) -> f64 {
        let Some(items) = self.valid_subset(window) else {
            return self.missing;
        };
        match (items.first(), items.last()) {
            (Some(first), Some(last)) if self.degrees => {
                angular_difference(first.value, last.value)
            }
            (Some(first), Some(last)) => last.value - first.value,
            _ => self.missing,
        }
    }

    /// Direction of consecutive changes as a percentage
    ///
    /// Rises minus falls, divided by the number of steps (the effective
    /// sample count less one) and scaled to 100. Needs two samples.
    pub fn trend(&self, window: Window) -> f64 {
        let Some(items) = self.valid_subset(window) else {
            return self.missing;
        };
        if items.len() < 2 {
            return self.missing;
        }

        let (ups, downs) = items.windows(2).fold((0u32, 0u32), |(up, down), w| {
            let diff = if self.degrees {
                angular_difference(w[0].value, w[1].value)
            } else {
                w[1].value - w[0].value
            };
            if diff > 0.0 {
                (up + 1, down)
            } else if diff < 0.0 {
                (up, down + 1)
            } else {
                (up, down)
            }
        });

        let steps = effective_count(&items) - 1.0;
        (f64::from(ups) - f64::from(downs)) / steps * 100.0
    }

    /// Number of samples with value in `[lower, upper]`
    pub fn count(&self, lower: f64, upper: f64, window: Window) -> f64 {
        match self.valid_subset(window) {
            Some(items) => items
                .iter()
                .filter(|d| d.value >= lower && d.value <= upper)
                .count() as f64,
            None => self.missing,
        }
    }

    /// Weighted share (0-100) of samples with value in `[lower, upper]`
    pub fn percentage(&self, lower: f64, upper: f64, window: Window) -> f64 {
        let Some(items) = self.valid_subset(window) else {
            return self.missing;
        };
        let total = total_weight(&items);
        let inside: f64 = items
            .iter()
            .filter(|d| d.value >= lower && d.value <= upper)
            .map(|d| d.weight)
            .sum();
        inside / total * 100.0
    }

    /// Value of the sample closest in time to `t`
    ///
    /// Ties go to the earlier sample. Missing samples are skipped.
    pub fn nearest(&self, t: LocalDateTime, window: Window) -> f64 {
        let candidates = self.timed_valid(window);
        let target = epoch_secs(t);

        let mut best: Option<(f64, f64)> = None;
        for (time, value) in candidates {
            let distance = (time - target).abs();
            match best {
                Some((d, _)) if distance >= d => {}
                _ => best = Some((distance, value)),
            }
        }
        best.map_or(self.missing, |(_, v)| v)
    }

    /// Linear interpolation to `t`
    ///
    /// An exact hit returns that sample. Otherwise two samples are needed;
    /// outside the data span the two samples at that end are extrapolated.
    /// Degrees follow the shorter arc. Missing samples are skipped.
    pub fn interpolate(&self, t: LocalDateTime, window: Window) -> f64 {
        let candidates = self.timed_valid(window);
        let target = epoch_secs(t);

        if let Some(&(_, v)) = candidates.iter().find(|(time, _)| *time == target) {
            return v;
        }
        if candidates.len() < 2 {
            return self.missing;
        }

        let upper = candidates
            .iter()
            .position(|(time, _)| *time > target)
            .unwrap_or(candidates.len() - 1)
            .max(1);
        let (t0, v0) = candidates[upper - 1];
        let (t1, v1) = candidates[upper];
        if t1 == t0 {
            return v0;
        }

        let fraction = (target - t0) / (t1 - t0);
        if self.degrees {
            (v0 + angular_difference(v0, v1) * fraction).rem_euclid(360.0)
        } else {
            v0 + (v1 - v0) * fraction
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn weighted(&self, items: &[DataItem]) -> bool {
        self.weights && items.iter().all(|d| d.time.is_some())
    }

    /// Items inside the window with weights assigned, or None if the
    /// window is inverted or empty or holds a missing sample
    fn valid_subset(&self, window: Window) -> Option<Vec<DataItem>> {
        let items = self.subset(window)?;
        if items.iter().any(|d| self.is_missing(d.value)) {
            return None;
        }
        Some(items)
    }

    fn subset(&self, window: Window) -> Option<Vec<DataItem>> {
        if window.is_inverted() {
            return None;
        }

        let mut items: Vec<DataItem> = if window.is_unbounded() {
            self.data.clone()
        } else {
            self.data
                .iter()
                .filter(|d| d.time.is_some_and(|t| window.contains(t)))
                .copied()
                .collect()
        };
        if items.is_empty() {
            return None;
        }

        self.assign_weights(&mut items);
        Some(items)
    }

    fn assign_weights(&self, items: &mut [DataItem]) {
        let n = items.len();
        if n < 2 || !self.weighted(items) {
            items.iter_mut().for_each(|d| d.weight = DEFAULT_WEIGHT);
            return;
        }

        let times: Vec<f64> = items
            .iter()
            .map(|d| d.time.map_or(0.0, epoch_secs))
            .collect();
        for (i, item) in items.iter_mut().enumerate() {
            let before = if i > 0 { (times[i] - times[i - 1]) / 2.0 } else { 0.0 };
            let after = if i + 1 < n { (times[i + 1] - times[i]) / 2.0 } else { 0.0 };
            item.weight = before + after;
        }

        // Samples sharing one timestamp carry no span
        if total_weight(items) <= 0.0 {
            items.iter_mut().for_each(|d| d.weight = DEFAULT_WEIGHT);
        }
    }

    /// Timestamped, non-missing samples inside the window as (seconds, value)
    fn timed_valid(&self, window: Window) -> Vec<(f64, f64)> {
        if window.is_inverted() {
            return Vec::new();
        }
        let mut out: Vec<(f64, f64)> = self
            .data
            .iter()
            .filter(|d| !self.is_missing(d.value))
            .filter_map(|d| d.time.filter(|t| window.contains(*t)).map(|t| (t, d.value)))
            .map(|(t, v)| (epoch_secs(t), v))
            .collect();
        out.sort_by(|a, b| a.0.total_cmp(&b.0));
        out
    }

    fn mean_of(&self, items: &[DataItem]) -> f64 {
        let total = total_weight(items);
        if !self.degrees {
            return items.iter().map(|d| d.weight * d.value).sum::<f64>() / total;
        }

        let mut previous: Option<f64> = None;
        let mut acc = 0.0;
        for item in items {
            let unwrapped = match previous {
                Some(p) => p + angular_difference(p, item.value),
                None => item.value,
            };
            acc += item.weight * unwrapped;
            previous = Some(unwrapped);
        }
        (acc / total).rem_euclid(360.0)
    }

    fn variance_of(&self, items: &[DataItem]) -> f64 {
        if items.len() < 2 {
            return 0.0;
        }
        let n_eff = effective_count(items);
        if n_eff <= 1.0 {
            return 0.0;
        }

        let center = self.mean_of(items);
        let squares: f64 = items
            .iter()
            .map(|d| {
                let r = if self.degrees {
                    angular_difference(center, d.value)
                } else {
                    d.value - center
                };
                d.weight * r * r
            })
            .sum();

        squares / total_weight(items) * n_eff / (n_eff - 1.0)
    }
}

fn total_weight(items: &[DataItem]) -> f64 {
    items.iter().map(|d| d.weight).sum()
}

/// Number of observations the weights stand for, counting the lightest
/// positive weight as one
fn effective_count(items: &[DataItem]) -> f64 {
    let lightest = items
        .iter()
        .map(|d| d.weight)
        .filter(|w| *w > 0.0)
        .fold(f64::INFINITY, f64::min);
    if lightest.is_finite() {
        total_weight(items) / lightest
    } else {
        items.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> LocalDateTime {
        chrono_tz::UTC.with_ymd_and_hms(2013, 12, 2, h, m, 0).unwrap()
    }

    fn fixture() -> Stat {
        let mut stat = Stat::new();
        for (h, v) in [(14, 2.0), (15, 1.0), (17, 5.0), (20, 3.0), (22, 4.0)] {
            stat.add_timed(at(h, 0), v);
        }
        stat
    }

    #[test]
    fn test_weights_follow_time_spans() {
        let stat = fixture();
        let items = stat.subset(Window::ALL).unwrap();
        let weights: Vec<f64> = items.iter().map(|d| d.weight).collect();
        assert_eq!(weights, vec![1800.0, 5400.0, 9000.0, 9000.0, 3600.0]);
    }

    #[test]
    fn test_untimed_items_are_unweighted() {
        let mut stat = fixture();
        stat.add_value(4.0);
        let items = stat.subset(Window::ALL).unwrap();
        assert!(items.iter().all(|d| d.weight == DEFAULT_WEIGHT));
    }

    #[test]
    fn test_single_item_keeps_default_weight() {
        let mut stat = Stat::new();
        stat.add_timed(at(12, 0), 7.0);
        assert_eq!(stat.mean(Window::ALL), 7.0);
        assert_eq!(stat.variance(Window::ALL), 0.0);
        assert!(stat.trend(Window::ALL).is_nan());
    }

    #[test]
    fn test_inverted_window_is_missing() {
        let stat = fixture();
        let w = Window::between(at(20, 0), at(14, 0));
        assert!(stat.sum(w).is_nan());
        assert!(stat.mean(w).is_nan());
        assert!(stat.integ(w).is_nan());
        assert!(stat.nearest(at(15, 0), w).is_nan());
    }

    #[test]
    fn test_empty_window_is_missing() {
        let stat = fixture();
        assert!(stat.max(Window::between(at(15, 30), at(16, 30))).is_nan());
    }

    #[test]
    fn test_angular_difference() {
        assert_eq!(angular_difference(350.0, 90.0), 100.0);
        assert_eq!(angular_difference(90.0, 350.0), -100.0);
        assert_eq!(angular_difference(0.0, 180.0), 180.0);
        assert_eq!(angular_difference(10.0, 10.0), 0.0);
    }

    #[test]
    fn test_circlemean() {
        let mut stat = Stat::from_values(&[350.0, 10.0]);
        stat.set_degrees(true);
        let mean = stat.circlemean(Window::ALL);
        assert!(mean < 1e-9 || (360.0 - mean) < 1e-9);
    }

    #[test]
    fn test_interpolate_needs_two_samples() {
        let mut stat = Stat::new();
        stat.add_timed(at(12, 0), 3.0);
        assert_eq!(stat.interpolate(at(12, 0), Window::ALL), 3.0);
        assert!(stat.interpolate(at(13, 0), Window::ALL).is_nan());
        assert_eq!(stat.nearest(at(13, 0), Window::ALL), 3.0);
    }
}
