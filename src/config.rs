//! Configuration management for tseries
//!
//! TOML configuration with per-field defaults and environment variable
//! overrides. Every section may be left out of the file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::aggregation::{Aggregator, DataFunction, FunctionId, FunctionType, MAX_AGGREGATION_INTERVAL};
use crate::calendar::time_zone_from_string;
use crate::error::{Error, Result, ValidationError};
use crate::generator::Defaults;
use crate::logging::LoggingConfig;
use crate::output::{LonLatFormat, ValueFormatter};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Aggregation settings
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Time series generation settings
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Value formatting
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Aggregation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregationConfig {
    /// Sentinel the statistics engine treats as missing
    #[serde(default = "default_missing_value")]
    pub missing_value: f64,

    /// Look-behind window for time functions, in minutes
    #[serde(default = "default_interval")]
    pub default_interval_behind: u32,

    /// Look-ahead window for time functions, in minutes
    #[serde(default = "default_interval")]
    pub default_interval_ahead: u32,
}

/// Generator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Start offset from now when a request has no start time, in minutes
    #[serde(default)]
    pub default_start_offset: i32,

    /// Series length when a request has no end time, in minutes
    #[serde(default = "default_interval_length")]
    pub default_interval_length: u32,

    /// Timestep in minutes
    #[serde(default = "default_time_step")]
    pub default_time_step: u32,

    /// IANA zone name
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Decimals for doubles
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Text for missing values
    #[serde(default = "default_missing_text")]
    pub missing_text: String,

    /// Coordinate component order
    #[serde(default)]
    pub lonlat_format: LonLatFormat,
}

// Default value functions
fn default_missing_value() -> f64 { crate::aggregation::DEFAULT_MISSING_VALUE }
fn default_interval() -> u32 { MAX_AGGREGATION_INTERVAL }
fn default_interval_length() -> u32 { 1440 }
fn default_time_step() -> u32 { crate::generator::DEFAULT_TIME_STEP }
fn default_time_zone() -> String { "UTC".to_string() }
fn default_precision() -> usize { 1 }
fn default_missing_text() -> String { "nan".to_string() }

const MAX_PRECISION: usize = 16;

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            missing_value: default_missing_value(),
            default_interval_behind: default_interval(),
            default_interval_ahead: default_interval(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_start_offset: 0,
            default_interval_length: default_interval_length(),
            default_time_step: default_time_step(),
            time_zone: default_time_zone(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            missing_text: default_missing_text(),
            lonlat_format: LonLatFormat::default(),
        }
    }
}

impl AggregationConfig {
    /// Function with the configured default window
    pub fn data_function(&self, id: FunctionId, kind: FunctionType) -> DataFunction {
        DataFunction::new(id, kind)
            .with_intervals(self.default_interval_behind, self.default_interval_ahead)
    }

    /// Aggregator using the configured missing value sentinel
    pub fn aggregator(&self) -> Aggregator {
        Aggregator::new().with_missing_value(self.missing_value)
    }
}

impl GeneratorConfig {
    /// Fallbacks for `TimeSeriesGeneratorOptions::apply_defaults`
    pub fn defaults(&self) -> Defaults {
        Defaults {
            start_offset: self.default_start_offset,
            interval_length: self.default_interval_length,
            time_step: self.default_time_step,
        }
    }

    /// Parsed time zone
    pub fn zone(&self) -> Result<chrono_tz::Tz> {
        time_zone_from_string(&self.time_zone)
    }
}

impl OutputConfig {
    /// Formatter with the configured precision, missing text and coordinate order
    pub fn formatter(&self) -> ValueFormatter {
        ValueFormatter::new(self.precision, self.missing_text.clone())
            .with_lonlat_format(self.lonlat_format)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    ///
    /// Values that do not parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Generator
        if let Some(zone) = lookup("TSERIES_TIME_ZONE") {
            self.generator.time_zone = zone;
        }
        if let Some(s) = lookup("TSERIES_TIME_STEP").and_then(|v| v.parse().ok()) {
            self.generator.default_time_step = s;
        }

        // Aggregation
        if let Some(m) = lookup("TSERIES_MISSING_VALUE").and_then(|v| v.parse().ok()) {
            self.aggregation.missing_value = m;
        }

        // Output
        if let Some(p) = lookup("TSERIES_PRECISION").and_then(|v| v.parse().ok()) {
            self.output.precision = p;
        }

        // Logging
        if let Some(log_level) = lookup("RUST_LOG") {
            self.logging.log_level = log_level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let step = self.generator.default_time_step;
        if step == 0 || 1440 % step != 0 {
            return Err(ValidationError::Invalid {
                key: "generator.default_time_step",
                reason: format!("{} must be positive and divide 1440", step),
            }
            .into());
        }

        self.generator.zone()?;

        if self.output.precision > MAX_PRECISION {
            return Err(ValidationError::TooLarge {
                key: "output.precision",
                value: self.output.precision.to_string(),
                max: MAX_PRECISION.to_string(),
            }
            .into());
        }

        let aggregation = &self.aggregation;
        for (key, minutes) in [
            ("aggregation.default_interval_behind", aggregation.default_interval_behind),
            ("aggregation.default_interval_ahead", aggregation.default_interval_ahead),
        ] {
            if minutes > MAX_AGGREGATION_INTERVAL {
                return Err(ValidationError::TooLarge {
                    key,
                    value: minutes.to_string(),
                    max: MAX_AGGREGATION_INTERVAL.to_string(),
                }
                .into());
            }
        }

        if aggregation.missing_value.is_nan() {
            return Err(ValidationError::Invalid {
                key: "aggregation.missing_value",
                reason: "must be a number".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }
}
