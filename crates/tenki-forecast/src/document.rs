//! Forecast document model.
//!
//! The forecast endpoint returns an array of reports, each carrying a list of
//! time series. A time series has one date axis (`timeDefines`) and, per area,
//! any number of parallel value axes (`weathers`, `weatherCodes`, `tempsMax`,
//! ...). Value axes whose length does not match the date axis are dropped.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::FetchError;

pub const WEATHERS: &str = "weathers";
pub const WEATHER_CODES: &str = "weatherCodes";
pub const TEMPS_MAX: &str = "tempsMax";
pub const TEMPS_MIN: &str = "tempsMin";

/// Raw per-area forecast, flattened across reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastDocument {
    pub publishing_office: Option<String>,
    pub report_datetime: Option<String>,
    pub series: Vec<TimeSeries>,
}

/// One shared date axis with the per-area value axes aligned to it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    pub dates: Vec<String>,
    pub areas: Vec<SeriesArea>,
}

/// Value axes for one sub-area within a time series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesArea {
    pub code: String,
    pub name: String,
    axes: BTreeMap<String, Vec<String>>,
}

impl SeriesArea {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            axes: BTreeMap::new(),
        }
    }

    pub fn with_axis(mut self, axis: &str, values: Vec<String>) -> Self {
        self.axes.insert(axis.to_string(), values);
        self
    }

    pub fn axis(&self, axis: &str) -> Option<&[String]> {
        self.axes.get(axis).map(Vec::as_slice)
    }

    pub fn has_axis(&self, axis: &str) -> bool {
        self.axes.contains_key(axis)
    }
}

impl TimeSeries {
    /// Build a series, dropping any area axis whose length differs from `dates`.
    pub fn new(dates: Vec<String>, areas: Vec<SeriesArea>) -> Self {
        let expected = dates.len();
        let areas = areas
            .into_iter()
            .map(|mut area| {
                area.axes.retain(|name, values| {
                    let aligned = values.len() == expected;
                    if !aligned {
                        tracing::debug!(
                            "Dropping axis {} for {}: {} values for {} dates",
                            name,
                            area.code,
                            values.len(),
                            expected
                        );
                    }
                    aligned
                });
                area
            })
            .collect();
        Self { dates, areas }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    #[serde(default)]
    publishing_office: Option<String>,
    #[serde(default)]
    report_datetime: Option<String>,
    #[serde(default)]
    time_series: Vec<RawTimeSeries>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimeSeries {
    #[serde(default)]
    time_defines: Vec<String>,
    #[serde(default)]
    areas: Vec<RawArea>,
}

#[derive(Debug, Deserialize)]
struct RawArea {
    area: RawAreaRef,
    #[serde(flatten)]
    axes: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawAreaRef {
    #[serde(default)]
    name: String,
    #[serde(default)]
    code: String,
}

/// Text form of an array axis. Strings and numbers are kept; any other element
/// disqualifies the axis.
fn text_axis(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

impl From<RawArea> for SeriesArea {
    fn from(raw: RawArea) -> Self {
        let axes = raw
            .axes
            .iter()
            .filter_map(|(name, value)| text_axis(value).map(|values| (name.clone(), values)))
            .collect();
        Self {
            code: raw.area.code,
            name: raw.area.name,
            axes,
        }
    }
}

impl ForecastDocument {
    /// Parse a forecast response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, FetchError> {
        let reports: Vec<RawReport> =
            serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(Self::from_reports(reports))
    }

    fn from_reports(reports: Vec<RawReport>) -> Self {
        let publishing_office = reports.iter().find_map(|r| r.publishing_office.clone());
        let report_datetime = reports.iter().find_map(|r| r.report_datetime.clone());

        let series = reports
            .into_iter()
            .flat_map(|report| report.time_series)
            .map(|raw| {
                TimeSeries::new(
                    raw.time_defines,
                    raw.areas.into_iter().map(SeriesArea::from).collect(),
                )
            })
            .collect();

        Self {
            publishing_office,
            report_datetime,
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "publishingOffice": "水戸地方気象台",
            "reportDatetime": "2024-11-20T11:00:00+09:00",
            "timeSeries": [
                {
                    "timeDefines": ["2024-11-20T11:00:00+09:00", "2024-11-21T00:00:00+09:00"],
                    "areas": [
                        {
                            "area": {"name": "北部", "code": "080010"},
                            "weatherCodes": ["100", "201"],
                            "weathers": ["晴れ", "くもり　時々　晴れ"],
                            "winds": ["北の風", "北の風"]
                        }
                    ]
                }
            ]
        },
        {
            "publishingOffice": "水戸地方気象台",
            "timeSeries": [
                {
                    "timeDefines": ["2024-11-21T00:00:00+09:00", "2024-11-22T00:00:00+09:00"],
                    "areas": [
                        {
                            "area": {"name": "水戸", "code": "40201"},
                            "tempsMax": ["", 15],
                            "tempsMin": ["", "6"],
                            "tempsMaxUpper": ["", "17", "18"]
                        }
                    ]
                }
            ]
        }
    ]"#;

    #[test]
    fn parses_reports_into_flat_series() {
        let doc = ForecastDocument::from_slice(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.series.len(), 2);
        assert_eq!(doc.publishing_office.as_deref(), Some("水戸地方気象台"));
        assert_eq!(doc.report_datetime.as_deref(), Some("2024-11-20T11:00:00+09:00"));

        let first = &doc.series[0].areas[0];
        assert_eq!(first.code, "080010");
        assert_eq!(first.axis(WEATHER_CODES).unwrap(), ["100", "201"]);
    }

    #[test]
    fn numeric_values_are_kept_as_text() {
        let doc = ForecastDocument::from_slice(SAMPLE.as_bytes()).unwrap();
        let temps = &doc.series[1].areas[0];
        assert_eq!(temps.axis(TEMPS_MAX).unwrap(), ["", "15"]);
    }

    #[test]
    fn misaligned_axis_is_dropped() {
        let doc = ForecastDocument::from_slice(SAMPLE.as_bytes()).unwrap();
        let temps = &doc.series[1].areas[0];
        assert!(!temps.has_axis("tempsMaxUpper"));
        assert!(temps.has_axis(TEMPS_MIN));
    }

    #[test]
    fn non_text_axis_is_ignored() {
        let body = r#"[{"timeSeries": [{"timeDefines": ["a"], "areas": [
            {"area": {"name": "x", "code": "1"}, "weathers": ["晴れ"], "nested": [{"k": 1}]}
        ]}]}]"#;
        let doc = ForecastDocument::from_slice(body.as_bytes()).unwrap();
        let area = &doc.series[0].areas[0];
        assert!(area.has_axis(WEATHERS));
        assert!(!area.has_axis("nested"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = ForecastDocument::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn object_instead_of_array_is_malformed() {
        let err = ForecastDocument::from_slice(br#"{"timeSeries": []}"#).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
