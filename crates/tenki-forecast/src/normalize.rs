//! Reshape a forecast document into a uniform `AreaForecast`.

use chrono::DateTime;

use crate::document::{
    ForecastDocument, SeriesArea, TimeSeries, TEMPS_MAX, TEMPS_MIN, WEATHERS, WEATHER_CODES,
};
use crate::error::FetchError;
use crate::types::{AreaCode, AreaForecast, ConditionBucket, DayForecast, Temperature};

/// Length of the short-range forecast window
pub const SHORT_RANGE_DAYS: usize = 3;

/// Office name used when the catalog has no entry for an area
pub const UNKNOWN_OFFICE_NAME: &str = "未知の地域";

/// Render an RFC 3339 timestamp as `YYYY-MM-DD`; anything else is kept verbatim.
pub fn format_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn is_temperature_area(area: &SeriesArea) -> bool {
    area.has_axis(TEMPS_MAX) || area.has_axis(TEMPS_MIN)
}

/// First time series after the condition series that carries temperatures.
fn temperature_series(doc: &ForecastDocument) -> Option<(&TimeSeries, &SeriesArea)> {
    doc.series.iter().skip(1).find_map(|series| {
        series
            .areas
            .iter()
            .find(|a| is_temperature_area(a))
            .map(|area| (series, area))
    })
}

/// Temperatures are joined by position. Log when the date axes disagree so the
/// assumption can be checked against live data.
fn check_alignment(conditions: &TimeSeries, temps: &TimeSeries, area: &AreaCode) {
    let mismatch = conditions
        .dates
        .iter()
        .zip(&temps.dates)
        .take(SHORT_RANGE_DAYS)
        .position(|(c, t)| format_date(c) != format_date(t));

    if let Some(index) = mismatch {
        tracing::debug!(
            area = %area,
            index,
            "Temperature dates do not line up with condition dates; joining by position"
        );
    }
}

/// Normalize one area's document.
///
/// The first time series supplies dates and conditions (first sub-area with a
/// `weathers` axis). Temperatures come from the first later series with
/// `tempsMax`/`tempsMin`, joined by index. Output is truncated to
/// [`SHORT_RANGE_DAYS`]; missing temperatures become [`Temperature::Unknown`].
pub fn normalize(
    area: &AreaCode,
    office_name: Option<&str>,
    doc: &ForecastDocument,
) -> Result<AreaForecast, FetchError> {
    let conditions = doc
        .series
        .first()
        .ok_or_else(|| FetchError::Malformed("document has no time series".into()))?;

    let sub_area = conditions
        .areas
        .iter()
        .find(|a| a.has_axis(WEATHERS))
        .ok_or_else(|| FetchError::Malformed("no area with weather conditions".into()))?;

    let weathers = sub_area.axis(WEATHERS).unwrap_or_default();
    let codes = sub_area.axis(WEATHER_CODES).unwrap_or_default();

    let temps = temperature_series(doc);
    if let Some((series, _)) = temps {
        check_alignment(conditions, series, area);
    }
    let temp_area = temps.map(|(_, a)| a);
    let temp_at = |axis: &str, index: usize| {
        Temperature::parse(
            temp_area
                .and_then(|a| a.axis(axis))
                .and_then(|values| values.get(index))
                .map(String::as_str),
        )
    };

    let days = conditions
        .dates
        .iter()
        .zip(weathers)
        .take(SHORT_RANGE_DAYS)
        .enumerate()
        .map(|(index, (date, weather))| DayForecast {
            date: format_date(date),
            condition: weather.replace('\u{3000}', ""),
            bucket: codes
                .get(index)
                .map_or(ConditionBucket::Unknown, |c| ConditionBucket::from_weather_code(c)),
            max_temp: temp_at(TEMPS_MAX, index),
            min_temp: temp_at(TEMPS_MIN, index),
        })
        .collect();

    Ok(AreaForecast {
        area: area.clone(),
        name: format!(
            "{} - {}",
            office_name.unwrap_or(UNKNOWN_OFFICE_NAME),
            sub_area.name
        ),
        days,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn dates(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("2024-11-{:02}T00:00:00+09:00", 20 + i))
            .collect()
    }

    fn condition_series(n: usize) -> TimeSeries {
        let weathers: Vec<String> = (0..n).map(|i| format!("晴れ　{}", i)).collect();
        let codes: Vec<String> = (0..n).map(|i| format!("{}00", i % 4 + 1)).collect();
        TimeSeries::new(
            dates(n),
            vec![SeriesArea::new("080010", "北部")
                .with_axis(WEATHERS, weathers)
                .with_axis(WEATHER_CODES, codes)],
        )
    }

    fn temperature_block(max: &[&str], min: &[&str]) -> TimeSeries {
        TimeSeries::new(
            dates(max.len()),
            vec![SeriesArea::new("40201", "水戸")
                .with_axis(TEMPS_MAX, strings(max))
                .with_axis(TEMPS_MIN, strings(min))],
        )
    }

    #[test]
    fn truncates_to_three_days() {
        let doc = ForecastDocument {
            series: vec![condition_series(5)],
            ..Default::default()
        };
        let forecast = normalize(&AreaCode::new("080000"), Some("茨城県"), &doc).unwrap();
        assert_eq!(forecast.days.len(), SHORT_RANGE_DAYS);
        assert_eq!(forecast.name, "茨城県 - 北部");
        assert_eq!(forecast.days[0].date, "2024-11-20");
    }

    #[test]
    fn short_temperature_series_yields_unknown_sentinel() {
        let doc = ForecastDocument {
            series: vec![condition_series(5), temperature_block(&["15", "16"], &["5", "6"])],
            ..Default::default()
        };
        let forecast = normalize(&AreaCode::new("080000"), Some("茨城県"), &doc).unwrap();

        assert_eq!(forecast.days.len(), 3);
        assert_eq!(forecast.days[0].max_temp, Temperature::Celsius(15.0));
        assert_eq!(forecast.days[1].min_temp, Temperature::Celsius(6.0));
        assert_eq!(forecast.days[2].max_temp, Temperature::Unknown);
        assert_eq!(forecast.days[2].min_temp, Temperature::Unknown);
    }

    #[test]
    fn missing_temperature_series_is_all_unknown() {
        let doc = ForecastDocument {
            series: vec![condition_series(3)],
            ..Default::default()
        };
        let forecast = normalize(&AreaCode::new("080000"), None, &doc).unwrap();
        assert!(forecast
            .days
            .iter()
            .all(|d| !d.max_temp.is_known() && !d.min_temp.is_known()));
        assert!(forecast.name.starts_with(UNKNOWN_OFFICE_NAME));
    }

    #[test]
    fn blank_temperature_is_unknown() {
        let doc = ForecastDocument {
            series: vec![condition_series(3), temperature_block(&["", "12", "13"], &["", "", "4"])],
            ..Default::default()
        };
        let forecast = normalize(&AreaCode::new("080000"), Some("茨城県"), &doc).unwrap();
        assert_eq!(forecast.days[0].max_temp, Temperature::Unknown);
        assert_eq!(forecast.days[1].max_temp, Temperature::Celsius(12.0));
        assert_eq!(forecast.days[1].min_temp, Temperature::Unknown);
        assert_eq!(forecast.days[2].min_temp, Temperature::Celsius(4.0));
    }

    #[test]
    fn full_width_spaces_are_removed_and_codes_bucketed() {
        let doc = ForecastDocument {
            series: vec![condition_series(3)],
            ..Default::default()
        };
        let forecast = normalize(&AreaCode::new("080000"), Some("茨城県"), &doc).unwrap();
        assert_eq!(forecast.days[0].condition, "晴れ0");
        assert_eq!(forecast.days[0].bucket, ConditionBucket::Clear);
        assert_eq!(forecast.days[1].bucket, ConditionBucket::Cloudy);
        assert_eq!(forecast.days[2].bucket, ConditionBucket::Rain);
    }

    #[test]
    fn skips_sub_areas_without_conditions() {
        let series = TimeSeries::new(
            dates(2),
            vec![
                SeriesArea::new("080001", "沿岸").with_axis("waves", strings(&["1", "2"])),
                SeriesArea::new("080020", "南部").with_axis(WEATHERS, strings(&["雨", "雪"])),
            ],
        );
        let doc = ForecastDocument {
            series: vec![series],
            ..Default::default()
        };
        let forecast = normalize(&AreaCode::new("080000"), Some("茨城県"), &doc).unwrap();
        assert_eq!(forecast.name, "茨城県 - 南部");
        assert_eq!(forecast.days.len(), 2);
        assert_eq!(forecast.days[0].bucket, ConditionBucket::Unknown);
    }

    #[test]
    fn misaligned_condition_axis_is_malformed() {
        let series = TimeSeries::new(
            dates(5),
            vec![SeriesArea::new("080010", "北部").with_axis(WEATHERS, strings(&["晴れ", "雨"]))],
        );
        let doc = ForecastDocument {
            series: vec![series],
            ..Default::default()
        };
        let err = normalize(&AreaCode::new("080000"), None, &doc).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn empty_document_is_malformed() {
        let err = normalize(&AreaCode::new("080000"), None, &ForecastDocument::default())
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn unparseable_date_is_kept() {
        assert_eq!(format_date("tomorrow"), "tomorrow");
        assert_eq!(format_date("2024-01-02T05:00:00+09:00"), "2024-01-02");
    }
}
