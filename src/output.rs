//! Value formatting and series rendering
//!
//! Presentation helpers only; nothing in the statistics or aggregation code
//! depends on them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{
    LonLat, LonLatTimeSeries, TimeSeries, TimeSeriesGroup, TimeSeriesVector, Value,
    LOCAL_TIME_FORMAT,
};

/// Order of coordinate components in text output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LonLatFormat {
    /// Longitude first
    #[default]
    LonLat,
    /// Latitude first
    LatLon,
}

/// Converts values to display strings
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFormatter {
    precision: usize,
    missing_text: String,
    lonlat_format: LonLatFormat,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new(1, "nan")
    }
}

impl ValueFormatter {
    /// Formatter with `precision` decimals and the given missing text
    pub fn new(precision: usize, missing_text: impl Into<String>) -> Self {
        Self {
            precision,
            missing_text: missing_text.into(),
            lonlat_format: LonLatFormat::default(),
        }
    }

    /// Set the coordinate component order
    pub fn with_lonlat_format(mut self, format: LonLatFormat) -> Self {
        self.lonlat_format = format;
        self
    }

    /// Decimals for doubles
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Text printed for missing values
    pub fn missing(&self) -> &str {
        &self.missing_text
    }

    /// Format a double; NaN prints as the missing text
    pub fn format_double(&self, d: f64) -> String {
        if d.is_nan() {
            return self.missing_text.clone();
        }
        format!("{:.*}", self.precision, d)
    }

    /// Format a coordinate in the configured component order
    pub fn format_lonlat(&self, c: &LonLat) -> String {
        let (first, second) = match self.lonlat_format {
            LonLatFormat::LonLat => (c.lon, c.lat),
            LonLatFormat::LatLon => (c.lat, c.lon),
        };
        format!("{}, {}", self.format_double(first), self.format_double(second))
    }

    /// Format any value
    ///
    /// Dates print as ISO 8601 local time without the zone.
    pub fn format(&self, value: &Value) -> String {
        match value {
            Value::None => self.missing_text.clone(),
            Value::String(s) => s.clone(),
            Value::Double(d) => self.format_double(*d),
            Value::Int(i) => i.to_string(),
            Value::LonLat(c) => self.format_lonlat(c),
            Value::DateTime(t) => t.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for TimeSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tv in self.iter() {
            writeln!(f, "{} -> {}", tv.time.format(LOCAL_TIME_FORMAT), tv.value)?;
        }
        Ok(())
    }
}

impl fmt::Display for LonLatTimeSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "location (lon, lat): {}, {}", self.lonlat.lon, self.lonlat.lat)?;
        write!(f, "{}", self.timeseries)
    }
}

/// Display adapter for a group: member series separated by blank lines
pub struct GroupDisplay<'a>(pub &'a TimeSeriesGroup);

impl fmt::Display for GroupDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, member) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", member.timeseries)?;
        }
        Ok(())
    }
}

/// Display adapter for a vector: each column under a `column #i` header
pub struct VectorDisplay<'a>(pub &'a TimeSeriesVector);

impl fmt::Display for VectorDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, column) in self.0.iter().enumerate() {
            writeln!(f, "column #{}", i)?;
            write!(f, "{}", column)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimedValue;
    use chrono::TimeZone;

    #[test]
    fn test_format_values() {
        let formatter = ValueFormatter::new(2, "-");
        assert_eq!(formatter.format(&Value::None), "-");
        assert_eq!(formatter.format(&Value::Double(1.005)), "1.00");
        assert_eq!(formatter.format(&Value::Double(f64::NAN)), "-");
        assert_eq!(formatter.format(&Value::Int(7)), "7");
        assert_eq!(formatter.format(&Value::from("x")), "x");
    }

    #[test]
    fn test_lonlat_order() {
        let c = Value::LonLat(LonLat::new(24.9, 60.2));
        let lonlat = ValueFormatter::new(1, "nan");
        let latlon = lonlat.clone().with_lonlat_format(LonLatFormat::LatLon);
        assert_eq!(lonlat.format(&c), "24.9, 60.2");
        assert_eq!(latlon.format(&c), "60.2, 24.9");
    }

    #[test]
    fn test_date_is_iso_local() {
        let t = chrono_tz::Europe::Helsinki
            .with_ymd_and_hms(2015, 3, 3, 0, 0, 0)
            .unwrap();
        assert_eq!(
            ValueFormatter::default().format(&Value::from(t)),
            "2015-03-03T00:00:00"
        );
    }

    #[test]
    fn test_series_display() {
        let t = chrono_tz::EET.with_ymd_and_hms(2015, 3, 3, 0, 0, 0).unwrap();
        let ts: TimeSeries = vec![TimedValue::new(t, 1.5), TimedValue::missing(t)].into();
        assert_eq!(
            ts.to_string(),
            "2015-Mar-03 00:00:00 EET -> 1.5\n2015-Mar-03 00:00:00 EET -> nan\n"
        );

        let vector = vec![ts];
        assert!(VectorDisplay(&vector).to_string().starts_with("column #0\n"));
    }
}
