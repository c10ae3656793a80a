//! Error types for statistics, time generation and aggregation

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Aggregation error
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    /// Time series generation error
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    /// Time series utility error
    #[error("Utility error: {0}")]
    Utility(#[from] UtilityError),

    /// Value conversion error
    #[error("Value error: {0}")]
    Value(#[from] ValueError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Aggregation errors
///
/// Raised when a statistic cannot be applied to the values it was given.
/// Missing values are never errors; they produce a missing result instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    /// The function has no rule for the value type
    #[error("Function {function} can not be applied for a {value_type}")]
    UnsupportedFunction {
        /// Function descriptor key
        function: String,
        /// Name of the offending value type
        value_type: &'static str,
    },

    /// Non-numeric values of different types inside one aggregation window
    #[error("Mixed value types in aggregation window: expected {expected}, found {found}")]
    MixedValueTypes {
        /// Type of the first value in the window
        expected: &'static str,
        /// Type that broke the pattern
        found: &'static str,
    },

    /// A group member is shorter than the first member
    #[error("Group member {index} has {actual} values, expected {expected}")]
    GroupMisaligned {
        /// Index of the member in the group
        index: usize,
        /// Length of the first member
        expected: usize,
        /// Length of the offending member
        actual: usize,
    },

    /// A window failed; names the function and the timestep it was computed for
    #[error("{function} failed at {time}: {source}")]
    AtTimestep {
        /// Function descriptor key
        function: String,
        /// Timestep of the failing window
        time: String,
        /// What went wrong inside the window
        #[source]
        source: Box<AggregationError>,
    },
}

/// Time series generation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    /// No start time and start is not taken from data
    #[error("Start time is not set")]
    MissingStartTime,

    /// No end time and it cannot be derived
    #[error("End time is not set and cannot be derived from the number of timesteps")]
    MissingEndTime,

    /// Local wall clock time falls into a DST gap
    #[error("Local time {time} does not exist in time zone {zone}")]
    NonexistentLocalTime {
        /// Requested wall clock time
        time: String,
        /// Zone name
        zone: String,
    },

    /// Unknown time zone name
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// Start plus the requested span falls outside the supported calendar
    #[error("Time range overflows the supported calendar")]
    TimeRangeOverflow,
}

/// Errors from the time series utility functions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UtilityError {
    /// Station column index beyond the bundle width
    #[error("Station column index {index} out of bounds for {columns} columns")]
    StationIndexOutOfBounds {
        /// Requested column index
        index: usize,
        /// Number of columns in the bundle
        columns: usize,
    },

    /// Station identifier is missing or not a scalar
    #[error("Invalid station identifier: {value}")]
    InvalidStationId {
        /// Rendered offending value
        value: String,
    },

    /// Station column has no values
    #[error("Station column is empty")]
    EmptyStationColumn,
}

/// Value conversion errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// The variant cannot be converted to the requested type
    #[error("Cannot convert {from} to {to}")]
    NotConvertible {
        /// Source variant name
        from: &'static str,
        /// Target type name
        to: &'static str,
    },

    /// String content is not a number
    #[error("Cannot parse '{value}' as a number")]
    Parse {
        /// The offending string
        value: String,
    },
}

/// Rejected configuration settings
///
/// Each variant names the TOML key it was raised for.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Numeric setting above its ceiling
    #[error("{key} = {value} exceeds the maximum of {max}")]
    TooLarge {
        /// Setting key
        key: &'static str,
        /// Configured value
        value: String,
        /// Largest accepted value
        max: String,
    },

    /// Setting the library cannot work with
    #[error("{key} is invalid: {reason}")]
    Invalid {
        /// Setting key
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Configuration(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
