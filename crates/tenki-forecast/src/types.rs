use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FetchError;

/// Region identifier, the key into the catalog's region table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Forecast reporting area (JMA office code, e.g. `130000`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaCode(String);

impl AreaCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AreaCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Coarse condition category from a JMA weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConditionBucket {
    Clear,
    Cloudy,
    Rain,
    Snow,
    #[default]
    Unknown,
}

impl ConditionBucket {
    /// Bucket by the hundreds digit: 1xx clear, 2xx cloudy, 3xx rain, 4xx snow.
    pub fn from_weather_code(code: &str) -> Self {
        match code.trim().parse::<u32>().map(|c| c / 100) {
            Ok(1) => Self::Clear,
            Ok(2) => Self::Cloudy,
            Ok(3) => Self::Rain,
            Ok(4) => Self::Snow,
            _ => Self::Unknown,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Unknown => "Unknown",
        }
    }
}

/// A temperature reading, or the explicit "unknown" sentinel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    Celsius(f64),
    #[default]
    Unknown,
}

impl Temperature {
    /// Parse a JMA temperature value. Blank or non-numeric text is unknown.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok())
            .map_or(Self::Unknown, Self::Celsius)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Celsius(v) => Some(*v),
            Self::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.value().is_some()
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius(v) => write!(f, "{}℃", v),
            Self::Unknown => f.write_str("-℃"),
        }
    }
}

/// One day of the short-range forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: String,
    pub condition: String,
    pub bucket: ConditionBucket,
    pub max_temp: Temperature,
    pub min_temp: Temperature,
}

/// Normalized forecast for one area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaForecast {
    pub area: AreaCode,
    /// `<office name> - <sub-area name>`
    pub name: String,
    pub days: Vec<DayForecast>,
}

/// An area whose fetch failed, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct AreaFailure {
    pub area: AreaCode,
    pub cause: FetchError,
}

/// Aggregated outcome of one region selection
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub region: RegionCode,
    /// Successful areas, in the region's configured order
    pub successes: Vec<AreaForecast>,
    /// Failed areas, in the region's configured order
    pub failures: Vec<AreaFailure>,
}

impl BatchResult {
    /// Total number of day entries across all successful areas
    pub fn day_count(&self) -> usize {
        self.successes.iter().map(|a| a.days.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.successes.is_empty()
    }
}
