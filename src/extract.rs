//! # Payload Extraction
//!
//! The single validation gate between the OpenWeatherMap payload and the rest
//! of the pipeline. The payload is walked as an untyped [`serde_json::Value`]
//! so every failure can name the exact path that was missing or malformed,
//! e.g. `daily[3].weather[0].icon`.
//!
//! ## Windows
//! - `daily[0]` is today: it feeds the max/min/precipitation of
//!   [`CurrentConditions`], then `daily[1..8]` become the forecast strip
//! - `hourly[0]` is the current hour and is skipped; `hourly[1..9]` become
//!   the hourly strip
//!
//! A payload too short to fill either window is rejected outright rather
//! than rendered partially.

use crate::local_time::{self, TimeError};
use crate::{
    CurrentConditions, DailyForecastEntry, HourlyForecastEntry, WeatherReport, DAILY_ENTRIES,
    HOURLY_ENTRIES,
};
use serde_json::Value;
use thiserror::Error;

/// Reasons a payload cannot become a [`WeatherReport`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// A required key is absent
    #[error("missing field: {0}")]
    MissingField(String),

    /// A key is present but holds the wrong kind of value
    #[error("invalid field {path}: expected {expected}")]
    InvalidField { path: String, expected: &'static str },

    /// A forecast section is too short to fill its window
    #[error("insufficient {section} data: need {needed} entries, got {found}")]
    InsufficientData {
        section: &'static str,
        needed: usize,
        found: usize,
    },

    /// A timestamp could not be converted to local time
    #[error("{path}: {source}")]
    InvalidTimestamp {
        path: String,
        #[source]
        source: TimeError,
    },
}

/// Entries `daily` must hold: today plus the forecast window.
const DAILY_REQUIRED: usize = DAILY_ENTRIES + 1;
/// Entries `hourly` must hold: the current hour plus the forecast window.
const HOURLY_REQUIRED: usize = HOURLY_ENTRIES + 1;

/// Validate a raw payload into a [`WeatherReport`].
///
/// # Errors
/// Fails on the first missing, mistyped or unconvertible field, or when
/// `daily` has fewer than 8 entries or `hourly` fewer than 9.
pub fn extract(payload: &Value) -> Result<WeatherReport, ExtractError> {
    let root = Node::root(payload);

    let daily = root.field("daily")?.array()?;
    if daily.len() < DAILY_REQUIRED {
        return Err(ExtractError::InsufficientData {
            section: "daily",
            needed: DAILY_REQUIRED,
            found: daily.len(),
        });
    }

    let hourly = root.field("hourly")?.array()?;
    if hourly.len() < HOURLY_REQUIRED {
        return Err(ExtractError::InsufficientData {
            section: "hourly",
            needed: HOURLY_REQUIRED,
            found: hourly.len(),
        });
    }

    let current = current_conditions(&root.field("current")?, &daily[0])?;

    let daily = daily[1..DAILY_REQUIRED]
        .iter()
        .map(daily_entry)
        .collect::<Result<Vec<_>, _>>()?;

    let hourly = hourly[1..HOURLY_REQUIRED]
        .iter()
        .map(hourly_entry)
        .collect::<Result<Vec<_>, _>>()?;

    let report = WeatherReport {
        current,
        daily: daily.try_into().map_err(|v: Vec<_>| ExtractError::InsufficientData {
            section: "daily",
            needed: DAILY_ENTRIES,
            found: v.len(),
        })?,
        hourly: hourly.try_into().map_err(|v: Vec<_>| ExtractError::InsufficientData {
            section: "hourly",
            needed: HOURLY_ENTRIES,
            found: v.len(),
        })?,
    };

    tracing::debug!(
        icon = %report.current.icon,
        temp = report.current.temp_current,
        "weather payload extracted"
    );
    Ok(report)
}

fn current_conditions(current: &Node, today: &Node) -> Result<CurrentConditions, ExtractError> {
    let weather = current.field("weather")?.index(0)?;
    let today_temp = today.field("temp")?;

    Ok(CurrentConditions {
        observed_at: current.field("dt")?.time_with(local_time::to_local_date_time)?,
        temp_current: current.field("temp")?.number()?,
        feels_like: current.field("feels_like")?.number()?,
        humidity: current.field("humidity")?.number()?,
        wind_speed: current.field("wind_speed")?.number()?,
        description: title_case(&weather.field("description")?.string()?),
        icon: weather.field("icon")?.string()?,
        temp_max: today_temp.field("max")?.number()?,
        temp_min: today_temp.field("min")?.number()?,
        precip_percent: today.field("pop")?.percent()?,
        uvi: current.field("uvi")?.number()?,
        sunrise: current.field("sunrise")?.time_with(local_time::to_local_display_time)?,
        sunset: current.field("sunset")?.time_with(local_time::to_local_display_time)?,
        pressure: current.field("pressure")?.number()?,
    })
}

fn daily_entry(day: &Node) -> Result<DailyForecastEntry, ExtractError> {
    let weather = day.field("weather")?.index(0)?;
    let temp = day.field("temp")?;

    Ok(DailyForecastEntry {
        day: day.field("dt")?.time_with(local_time::to_local_weekday)?,
        temp_max: temp.field("max")?.number()?,
        temp_min: temp.field("min")?.number()?,
        description: title_case(&weather.field("description")?.string()?),
        precip_percent: day.field("pop")?.percent()?,
        icon: weather.field("icon")?.string()?,
    })
}

fn hourly_entry(hour: &Node) -> Result<HourlyForecastEntry, ExtractError> {
    Ok(HourlyForecastEntry {
        time: hour.field("dt")?.time_with(local_time::to_local_display_time)?,
        temp: hour.field("temp")?.number()?,
        icon: hour.field("weather")?.index(0)?.field("icon")?.string()?,
    })
}

/// Upper-case the first letter of every word and lower-case the rest.
///
/// `"light intensity shower rain"` becomes `"Light Intensity Shower Rain"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// A JSON value paired with the path it was reached by.
struct Node<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Node<'a> {
    fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn invalid(&self, expected: &'static str) -> ExtractError {
        ExtractError::InvalidField {
            path: self.path.clone(),
            expected,
        }
    }

    fn field(&self, key: &str) -> Result<Node<'a>, ExtractError> {
        let path = self.child_path(key);
        let object = self.value.as_object().ok_or_else(|| self.invalid("object"))?;
        match object.get(key) {
            Some(value) => Ok(Node { value, path }),
            None => Err(ExtractError::MissingField(path)),
        }
    }

    fn index(&self, i: usize) -> Result<Node<'a>, ExtractError> {
        let path = format!("{}[{}]", self.path, i);
        let items = self.value.as_array().ok_or_else(|| self.invalid("array"))?;
        match items.get(i) {
            Some(value) => Ok(Node { value, path }),
            None => Err(ExtractError::MissingField(path)),
        }
    }

    fn array(&self) -> Result<Vec<Node<'a>>, ExtractError> {
        let items = self.value.as_array().ok_or_else(|| self.invalid("array"))?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, value)| Node {
                value,
                path: format!("{}[{}]", self.path, i),
            })
            .collect())
    }

    fn number(&self) -> Result<f64, ExtractError> {
        self.value.as_f64().ok_or_else(|| self.invalid("number"))
    }

    fn string(&self) -> Result<String, ExtractError> {
        self.value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid("string"))
    }

    /// A 0–1 probability as a whole 0–100 percentage.
    fn percent(&self) -> Result<u8, ExtractError> {
        let fraction = self.number()?;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(self.invalid("probability between 0 and 1"));
        }
        Ok((fraction * 100.0).round() as u8)
    }

    fn time_with(
        &self,
        format: fn(i64) -> Result<String, TimeError>,
    ) -> Result<String, ExtractError> {
        local_time::epoch_from_json(self.value)
            .and_then(format)
            .map_err(|source| ExtractError::InvalidTimestamp {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// 2025-07-04 16:00 UTC, inside the daylight window
    const BASE: i64 = 1_751_644_800;

    fn day(i: i64) -> Value {
        json!({
            "dt": BASE + i * 86_400,
            "temp": { "max": 20.0 + i as f64, "min": 10.0 + i as f64 },
            "pop": 0.1 * i as f64,
            "weather": [{ "description": "scattered clouds", "icon": "03d" }]
        })
    }

    fn hour(i: i64) -> Value {
        json!({
            "dt": BASE + i * 3_600,
            "temp": 15.0 + i as f64,
            "weather": [{ "description": "clear sky", "icon": "01d" }]
        })
    }

    fn payload(days: i64, hours: i64) -> Value {
        json!({
            "current": {
                "dt": BASE,
                "temp": 15.0,
                "feels_like": 13.6,
                "humidity": 72,
                "wind_speed": 3.46,
                "uvi": 5.2,
                "pressure": 1013,
                "sunrise": BASE - 6 * 3_600,
                "sunset": BASE + 8 * 3_600,
                "weather": [{ "description": "light rain", "icon": "10d" }]
            },
            "daily": (0..days).map(day).collect::<Vec<_>>(),
            "hourly": (0..hours).map(hour).collect::<Vec<_>>(),
        })
    }

    #[test]
    fn test_extracts_current_conditions() {
        let report = extract(&payload(8, 9)).unwrap();
        let current = &report.current;

        assert_eq!(current.temp_current, 15.0);
        assert_eq!(current.feels_like, 13.6);
        assert_eq!(current.humidity, 72.0);
        assert_eq!(current.wind_speed, 3.46);
        assert_eq!(current.description, "Light Rain");
        assert_eq!(current.icon, "10d");
        assert_eq!(current.temp_max, 20.0);
        assert_eq!(current.temp_min, 10.0);
        assert_eq!(current.precip_percent, 0);
        assert_eq!(current.pressure, 1013.0);
        assert_eq!(current.observed_at, "07/04/2025 12:00 PM");
        assert_eq!(current.sunrise, "06:00 AM");
        assert_eq!(current.sunset, "08:00 PM");
    }

    #[test]
    fn test_windows_skip_today_and_current_hour() {
        let report = extract(&payload(9, 48)).unwrap();

        assert_eq!(report.daily.len(), 7);
        assert_eq!(report.daily[0].temp_max, 21.0);
        assert_eq!(report.daily[6].temp_max, 27.0);
        assert_eq!(report.daily[0].day, "Sat");

        assert_eq!(report.hourly.len(), 8);
        assert_eq!(report.hourly[0].temp, 16.0);
        assert_eq!(report.hourly[0].time, "01:00 PM");
        assert_eq!(report.hourly[7].temp, 23.0);
    }

    #[test]
    fn test_short_daily_fails() {
        let err = extract(&payload(7, 9)).unwrap_err();
        assert_eq!(
            err,
            ExtractError::InsufficientData {
                section: "daily",
                needed: 8,
                found: 7
            }
        );
    }

    #[test]
    fn test_short_hourly_fails() {
        let err = extract(&payload(8, 8)).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::InsufficientData {
                section: "hourly",
                found: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_precipitation_is_percentage() {
        let mut data = payload(8, 9);
        data["daily"][0]["pop"] = json!(0.42);
        data["daily"][3]["pop"] = json!(0.57);

        let report = extract(&data).unwrap();
        assert_eq!(report.current.precip_percent, 42);
        assert_eq!(report.daily[2].precip_percent, 57);
    }

    #[test]
    fn test_missing_nested_field_names_path() {
        let mut data = payload(8, 9);
        data["daily"][3]["weather"][0]
            .as_object_mut()
            .unwrap()
            .remove("icon");

        assert_eq!(
            extract(&data).unwrap_err(),
            ExtractError::MissingField("daily[3].weather[0].icon".to_string())
        );
    }

    #[test]
    fn test_missing_top_level_section() {
        let mut data = payload(8, 9);
        data.as_object_mut().unwrap().remove("current");
        assert_eq!(
            extract(&data).unwrap_err(),
            ExtractError::MissingField("current".to_string())
        );
    }

    #[test]
    fn test_empty_weather_list_is_missing() {
        let mut data = payload(8, 9);
        data["hourly"][2]["weather"] = json!([]);
        assert_eq!(
            extract(&data).unwrap_err(),
            ExtractError::MissingField("hourly[2].weather[0]".to_string())
        );
    }

    #[test]
    fn test_wrong_type_is_invalid() {
        let mut data = payload(8, 9);
        data["current"]["temp"] = json!("warm");
        assert_eq!(
            extract(&data).unwrap_err(),
            ExtractError::InvalidField {
                path: "current.temp".to_string(),
                expected: "number"
            }
        );
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let mut data = payload(8, 9);
        data["current"]["sunrise"] = json!("dawn");
        assert!(matches!(
            extract(&data).unwrap_err(),
            ExtractError::InvalidTimestamp { path, .. } if path == "current.sunrise"
        ));
    }

    #[test]
    fn test_string_timestamp_is_accepted() {
        let mut data = payload(8, 9);
        data["current"]["sunset"] = json!((BASE + 8 * 3_600).to_string());
        assert_eq!(extract(&data).unwrap().current.sunset, "08:00 PM");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("light intensity shower rain"), "Light Intensity Shower Rain");
        assert_eq!(title_case("OVERCAST clouds"), "Overcast Clouds");
        assert_eq!(title_case(""), "");
    }
}
