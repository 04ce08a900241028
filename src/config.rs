//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! weather-config.toml file. It covers the forecast location, the
//! OpenWeatherMap request, the panel, the refresh schedule and CSV recording.
//!
//! Every section is optional; missing keys take the defaults below.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file, relative to the working directory
pub const CONFIG_FILE: &str = "weather-config.toml";

/// Environment variable that overrides `api.key`
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Application configuration loaded from weather-config.toml
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where the forecast is for
    pub location: LocationConfig,
    /// OpenWeatherMap request settings
    pub api: ApiConfig,
    /// Panel size and assets
    pub display: DisplayConfig,
    pub schedule: ScheduleConfig,
    /// CSV history of current conditions
    pub record: RecordConfig,
}

/// Forecast location
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Human-readable name, written to the CSV history
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Measurement system requested from the API and shown on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the `units` query parameter
    pub fn as_query(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_suffix(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_suffix(self) -> &'static str {
        match self {
            Units::Metric => "M/S",
            Units::Imperial => "MPH",
        }
    }
}

/// OpenWeatherMap request settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// One Call API key; `OPENWEATHER_API_KEY` takes precedence
    pub key: String,
    pub units: Units,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

/// Panel and asset configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// E-ink display width in pixels
    pub width: u32,
    /// E-ink display height in pixels
    pub height: u32,
    /// Directory of `<icon id>.png` files
    pub icon_dir: PathBuf,
    /// Wiring, only read when built with the `hardware` feature
    pub hardware: HardwareConfig,
}

/// SPI device and BCM line numbers for the Waveshare HAT
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub spi_device: String,
    pub gpio_chip: String,
    pub dc_pin: u32,
    pub rst_pin: u32,
    pub busy_pin: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minutes between refresh cycles
    pub refresh_minutes: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordConfig {
    pub enabled: bool,
    pub csv_path: PathBuf,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            name: "New York, NY".to_string(),
            latitude: 40.7128,
            longitude: -74.0060,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            key: String::new(),
            units: Units::Metric,
            timeout_secs: 10,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: 800,  // Waveshare 7.5" V2
            height: 480, // Waveshare 7.5" V2
            icon_dir: PathBuf::from("pic/icon"),
            hardware: HardwareConfig::default(),
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        HardwareConfig {
            spi_device: "/dev/spidev0.0".to_string(),
            gpio_chip: "/dev/gpiochip0".to_string(),
            dc_pin: 25,
            rst_pin: 17,
            busy_pin: 24,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            refresh_minutes: 30,
        }
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        RecordConfig {
            enabled: true,
            csv_path: PathBuf::from("records.csv"),
        }
    }
}

impl Config {
    /// Load configuration from weather-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path, then apply environment
    /// overrides.
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    tracing::info!(location = %config.location.name, "configuration loaded");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        };
        config.with_api_key_override(env::var(API_KEY_ENV).ok())
    }

    /// Replace the API key when `key` is present and non-empty.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.key = key;
        }
        self
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        tracing::info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}
