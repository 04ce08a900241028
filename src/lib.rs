//! # Weather Display Core Library
//!
//! This library turns an OpenWeatherMap One Call payload into a finished
//! monochrome frame for a Waveshare 7.5" (800×480) e-ink panel.
//!
//! ## Data Flow
//! Each refresh is one linear pass with no state carried between runs:
//! 1. **Fetch**: [`weather_data::fetch`] downloads the raw JSON payload
//! 2. **Extract**: [`extract::extract`] validates it into a [`WeatherReport`]
//! 3. **Layout**: [`layout::LayoutEngine`] turns the report into draw operations
//! 4. **Render**: [`renderer::render`] rasterises the operations onto a [`canvas::Canvas`]
//! 5. **Display**: a [`display::DisplaySink`] takes ownership of the canvas
//!
//! A failure anywhere before step 5 skips the cycle, so the panel keeps
//! showing the last good frame.
//!
//! ## Core Types
//! - [`CurrentConditions`]: today's conditions, formatted for display
//! - [`DailyForecastEntry`]: one of the next seven days
//! - [`HourlyForecastEntry`]: one of the next eight hours
//! - [`WeatherReport`]: exactly one of the first, seven of the second, eight of the third

use serde::{Deserialize, Serialize};

pub mod assets;
pub mod canvas;
pub mod config;
pub mod display;
pub mod extract;
pub mod layout;
pub mod local_time;
pub mod pipeline;
pub mod record;
pub mod renderer;
pub mod weather_data;

#[cfg(test)]
mod tests;

/// Number of forecast days shown along the bottom strip.
pub const DAILY_ENTRIES: usize = 7;

/// Number of forecast hours shown down the right-hand strip.
pub const HOURLY_ENTRIES: usize = 8;

/// Current conditions for the top half of the display.
///
/// Times are already local display strings; no epoch values survive
/// extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Local date and time of the observation, e.g. `10/19/2026 03:05 PM`
    pub observed_at: String,
    pub temp_current: f64,
    pub feels_like: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    pub wind_speed: f64,
    /// Title-cased description, e.g. `Light Rain`
    pub description: String,
    /// OpenWeatherMap icon code, e.g. `01d`
    pub icon: String,
    pub temp_max: f64,
    pub temp_min: f64,
    /// Chance of precipitation today, 0–100
    pub precip_percent: u8,
    pub uvi: f64,
    pub sunrise: String,
    pub sunset: String,
    /// Sea-level pressure in hPa
    pub pressure: f64,
}

/// One day of the seven-day forecast.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastEntry {
    /// Abbreviated weekday, e.g. `Tue`
    pub day: String,
    pub temp_max: f64,
    pub temp_min: f64,
    pub description: String,
    pub precip_percent: u8,
    pub icon: String,
}

/// One hour of the eight-hour forecast.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecastEntry {
    /// Local 12-hour time, e.g. `04:00 PM`
    pub time: String,
    pub temp: f64,
    pub icon: String,
}

/// Everything one refresh needs, validated and fixed in size.
///
/// The array lengths encode the display contract: a payload that cannot fill
/// them never becomes a report.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub daily: [DailyForecastEntry; DAILY_ENTRIES],
    pub hourly: [HourlyForecastEntry; HOURLY_ENTRIES],
}
