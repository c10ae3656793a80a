//! Aggregation function descriptors
//!
//! A `DataFunction` names one statistic, the axis it reduces along (time or
//! area), an optional value range and the look-behind/look-ahead window used
//! by time aggregation. `DataFunctions` pairs an inner and an outer function;
//! the aggregator dispatches on the kinds of the pair.
//!
//! # Example
//!
//! ```rust
//! use tseries::aggregation::function::{DataFunction, DataFunctions, FunctionId, FunctionType};
//!
//! let mut inner = DataFunction::new(FunctionId::Mean, FunctionType::Time);
//! inner.set_intervals(120, 0);
//! let functions = DataFunctions::new(inner, DataFunction::default());
//!
//! assert!(functions.inner.exists());
//! assert!(!functions.outer.exists());
//! assert_eq!(functions.inner.hash_key(), functions.inner.clone().hash_key());
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

/// Longest aggregation window in either direction: seven days in minutes
pub const MAX_AGGREGATION_INTERVAL: u32 = 7 * 24 * 60;

/// Statistic computed by a `DataFunction`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionId {
    /// Time-weighted mean
    Mean,
    /// Unweighted arithmetic mean
    ArithmeticMean,
    /// Vector mean of directions
    CircularMean,
    /// Largest value
    Maximum,
    /// Smallest value
    Minimum,
    /// Weighted median
    Median,
    /// Plain sum
    Sum,
    /// Time integral
    Integ,
    /// Sample standard deviation
    StandardDeviation,
    /// Share of values inside the limits
    Percentage,
    /// Number of values inside the limits
    Count,
    /// Last value minus first value
    Change,
    /// Rises versus falls as a percentage
    Trend,
    /// Value closest to the timestep
    Nearest,
    /// Value interpolated to the timestep
    Interpolate,
    /// No statistic
    NullFunction,
}

impl FunctionId {
    /// Short name used in diagnostics and cache keys
    pub fn name(&self) -> &'static str {
        match self {
            FunctionId::Mean => "Mean",
            FunctionId::ArithmeticMean => "Amean",
            FunctionId::CircularMean => "CircleMean",
            FunctionId::Maximum => "Maximum",
            FunctionId::Minimum => "Minimum",
            FunctionId::Median => "Median",
            FunctionId::Sum => "Sum",
            FunctionId::Integ => "Integ",
            FunctionId::StandardDeviation => "StandardDeviation",
            FunctionId::Percentage => "Percentage",
            FunctionId::Count => "Count",
            FunctionId::Change => "Change",
            FunctionId::Trend => "Trend",
            FunctionId::Nearest => "Nearest",
            FunctionId::Interpolate => "Interpolate",
            FunctionId::NullFunction => "NullFunction",
        }
    }

    /// Functions that skip missing values instead of failing on them
    pub fn is_nan_tolerant(&self) -> bool {
        matches!(self, FunctionId::Nearest | FunctionId::Interpolate)
    }

    /// Functions that take the limits as their argument instead of as a filter
    pub fn uses_limits_as_argument(&self) -> bool {
        matches!(self, FunctionId::Percentage | FunctionId::Count)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Axis a function reduces along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    /// Reduce samples of one location over a time window
    Time,
    /// Reduce one time slice across locations
    Area,
    /// No reduction
    Null,
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionType::Time => f.write_str("TimeFunction"),
            FunctionType::Area => f.write_str("AreaFunction"),
            FunctionType::Null => f.write_str("NullFunctionType"),
        }
    }
}

/// One aggregation function with its parameters
#[derive(Debug, Clone)]
pub struct DataFunction {
    id: FunctionId,
    kind: FunctionType,
    lower_limit: f64,
    upper_limit: f64,
    interval_behind: u32,
    interval_ahead: u32,
    nan_function: bool,
    circular: bool,
}

impl Default for DataFunction {
    fn default() -> Self {
        Self::new(FunctionId::NullFunction, FunctionType::Null)
    }
}

impl DataFunction {
    /// Function with no limits and the maximum aggregation window
    pub fn new(id: FunctionId, kind: FunctionType) -> Self {
        Self {
            id,
            kind,
            lower_limit: f64::MIN,
            upper_limit: f64::MAX,
            interval_behind: MAX_AGGREGATION_INTERVAL,
            interval_ahead: MAX_AGGREGATION_INTERVAL,
            nan_function: id.is_nan_tolerant(),
            circular: false,
        }
    }

    /// Function restricted to values in `[lower, upper]`
    pub fn with_limits(id: FunctionId, kind: FunctionType, lower: f64, upper: f64) -> Self {
        let mut function = Self::new(id, kind);
        function.set_limits(lower, upper);
        function
    }

    /// Builder form of `set_intervals`
    pub fn with_intervals(mut self, behind: u32, ahead: u32) -> Self {
        self.set_intervals(behind, ahead);
        self
    }

    /// Builder form of `set_circular`
    pub fn with_circular(mut self, circular: bool) -> Self {
        self.circular = circular;
        self
    }

    /// True unless this is the null function type
    pub fn exists(&self) -> bool {
        self.kind != FunctionType::Null
    }

    /// Statistic
    pub fn id(&self) -> FunctionId {
        self.id
    }

    /// Reduction axis
    pub fn kind(&self) -> FunctionType {
        self.kind
    }

    /// Lower value limit
    pub fn lower_limit(&self) -> f64 {
        self.lower_limit
    }

    /// Upper value limit
    pub fn upper_limit(&self) -> f64 {
        self.upper_limit
    }

    /// True if either limit differs from its unrestricted default
    pub fn lower_or_upper_limit_given(&self) -> bool {
        self.lower_limit != f64::MIN || self.upper_limit != f64::MAX
    }

    /// Minutes before the timestep included in a time window
    pub fn interval_behind(&self) -> u32 {
        self.interval_behind
    }

    /// Minutes after the timestep included in a time window
    pub fn interval_ahead(&self) -> u32 {
        self.interval_ahead
    }

    /// True if missing samples are skipped rather than poisoning the result
    pub fn is_nan_function(&self) -> bool {
        self.nan_function
    }

    /// True if values are directions in degrees
    pub fn is_circular(&self) -> bool {
        self.circular
    }

    /// Set both value limits
    pub fn set_limits(&mut self, lower: f64, upper: f64) {
        self.lower_limit = lower;
        self.upper_limit = upper;
    }

    /// Set the look-behind and look-ahead windows in minutes
    pub fn set_intervals(&mut self, behind: u32, ahead: u32) {
        self.interval_behind = behind;
        self.interval_ahead = ahead;
    }

    /// Set the look-behind window in minutes
    pub fn set_interval_behind(&mut self, minutes: u32) {
        self.interval_behind = minutes;
    }

    /// Set the look-ahead window in minutes
    pub fn set_interval_ahead(&mut self, minutes: u32) {
        self.interval_ahead = minutes;
    }

    /// Override NaN tolerance
    pub fn set_nan_function(&mut self, nan: bool) {
        self.nan_function = nan;
    }

    /// Mark values as directions in degrees
    pub fn set_circular(&mut self, circular: bool) {
        self.circular = circular;
    }

    /// Human readable summary, e.g. `Mean of time, window -120/+0 min`
    pub fn info(&self) -> String {
        let axis = match self.kind {
            FunctionType::Time => "time",
            FunctionType::Area => "area",
            FunctionType::Null => "nothing",
        };
        let mut out = format!("{} of {}", self.id, axis);
        if self.lower_or_upper_limit_given() {
            out.push_str(&format!(
                ", range [{}, {}]",
                self.lower_limit, self.upper_limit
            ));
        }
        if self.kind == FunctionType::Time {
            out.push_str(&format!(
                ", window -{}/+{} min",
                self.interval_behind, self.interval_ahead
            ));
        }
        out
    }

    /// Stable key combining every parameter, for result caches
    pub fn hash_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}",
            self.id,
            self.kind,
            self.lower_limit,
            self.upper_limit,
            self.interval_behind,
            self.interval_ahead,
            u8::from(self.nan_function),
            u8::from(self.circular)
        )
    }
}

impl PartialEq for DataFunction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.lower_limit.to_bits() == other.lower_limit.to_bits()
            && self.upper_limit.to_bits() == other.upper_limit.to_bits()
            && self.interval_behind == other.interval_behind
            && self.interval_ahead == other.interval_ahead
            && self.nan_function == other.nan_function
            && self.circular == other.circular
    }
}

impl Eq for DataFunction {}

impl Hash for DataFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.kind.hash(state);
        self.lower_limit.to_bits().hash(state);
        self.upper_limit.to_bits().hash(state);
        self.interval_behind.hash(state);
        self.interval_ahead.hash(state);
        self.nan_function.hash(state);
        self.circular.hash(state);
    }
}

impl fmt::Display for DataFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function id: {}", self.id)?;
        writeln!(f, "function type: {}", self.kind)?;
        writeln!(f, "lower limit: {}", self.lower_limit)?;
        writeln!(f, "upper limit: {}", self.upper_limit)?;
        writeln!(f, "interval behind: {}", self.interval_behind)?;
        writeln!(f, "interval ahead: {}", self.interval_ahead)?;
        writeln!(f, "nan function: {}", self.nan_function)?;
        writeln!(f, "circular: {}", self.circular)
    }
}

/// Inner and outer aggregation functions
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataFunctions {
    /// Applied first
    pub inner: DataFunction,
    /// Applied to the result of the inner function
    pub outer: DataFunction,
}

impl DataFunctions {
    /// Pair two functions
    pub fn new(inner: DataFunction, outer: DataFunction) -> Self {
        Self { inner, outer }
    }

    /// Only an inner function
    pub fn single(inner: DataFunction) -> Self {
        Self {
            inner,
            outer: DataFunction::default(),
        }
    }
}

impl fmt::Display for DataFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "inner function:")?;
        write!(f, "{}", self.inner)?;
        writeln!(f, "outer function:")?;
        write!(f, "{}", self.outer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_defaults() {
        let f = DataFunction::default();
        assert!(!f.exists());
        assert_eq!(f.id(), FunctionId::NullFunction);
        assert!(!f.lower_or_upper_limit_given());
        assert_eq!(f.interval_behind(), MAX_AGGREGATION_INTERVAL);
        assert_eq!(f.interval_ahead(), MAX_AGGREGATION_INTERVAL);
        assert!(!f.is_nan_function());
    }

    #[test]
    fn test_nan_functions() {
        assert!(DataFunction::new(FunctionId::Nearest, FunctionType::Time).is_nan_function());
        assert!(DataFunction::new(FunctionId::Interpolate, FunctionType::Time).is_nan_function());
        assert!(!DataFunction::new(FunctionId::Mean, FunctionType::Time).is_nan_function());
    }

    #[test]
    fn test_limits_given() {
        let f = DataFunction::with_limits(FunctionId::Mean, FunctionType::Area, 2.0, f64::MAX);
        assert!(f.lower_or_upper_limit_given());
    }

    #[test]
    fn test_hash_and_eq_follow_parameters() {
        let a = DataFunction::new(FunctionId::Mean, FunctionType::Time).with_intervals(60, 0);
        let b = a.clone();
        let c = a.clone().with_intervals(60, 60);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.hash_key(), b.hash_key());
        assert_ne!(a.hash_key(), c.hash_key());

        let set: HashSet<DataFunction> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_info() {
        let f = DataFunction::with_limits(FunctionId::Maximum, FunctionType::Area, 1.0, 2.0);
        assert_eq!(f.info(), "Maximum of area, range [1, 2]");

        let t = DataFunction::new(FunctionId::Sum, FunctionType::Time).with_intervals(30, 0);
        assert_eq!(t.info(), "Sum of time, window -30/+0 min");
    }
}
