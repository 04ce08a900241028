//! # OpenWeatherMap Data Fetching
//!
//! This module handles the one network operation of a refresh cycle:
//! downloading the One Call 3.0 payload for the configured location.
//!
//! ## Data Source
//! - **URL**: `https://api.openweathermap.org/data/3.0/onecall`
//! - **Query**: `lat`, `lon`, `units` and `appid` from [`Config`]
//! - **Format**: JSON with `current`, `hourly` (48 entries) and `daily`
//!   (8 entries) sections
//!
//! The payload is returned untouched as a [`serde_json::Value`]; turning it
//! into typed records is [`crate::extract`]'s job.
//!
//! ## Error Handling
//! There is no cache and no offline substitute. Any failure (timeout,
//! non-2xx status, body that is not JSON) surfaces as a [`FetchError`] and the
//! caller skips the cycle, leaving the previous frame on the panel.

use crate::config::Config;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// One Call 3.0 endpoint
pub const ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Errors that can occur while fetching the payload.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No API key in the config file or the environment
    #[error("no OpenWeatherMap API key configured")]
    MissingApiKey,

    /// The request URL could not be built
    #[error("invalid request URL: {0}")]
    Url(String),

    /// HTTP request failed (network, timeout, or body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("OpenWeatherMap returned {0}")]
    Status(StatusCode),
}

/// Build the One Call request URL for the configured location.
pub fn request_url(config: &Config) -> Result<Url, FetchError> {
    if config.api.key.trim().is_empty() {
        return Err(FetchError::MissingApiKey);
    }

    Url::parse_with_params(
        ONECALL_URL,
        &[
            ("lat", config.location.latitude.to_string()),
            ("lon", config.location.longitude.to_string()),
            ("units", config.api.units.as_query().to_string()),
            ("appid", config.api.key.clone()),
        ],
    )
    .map_err(|e| FetchError::Url(e.to_string()))
}

/// HTTP client whose every request is bounded by the configured timeout.
pub fn client(config: &Config) -> Result<Client, FetchError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.api.timeout_secs))
        .user_agent(concat!("weather-display/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Download the raw One Call payload.
///
/// # Example
/// ```no_run
/// use weather_display_lib::{config::Config, weather_data};
///
/// # async fn run() -> Result<(), weather_data::FetchError> {
/// let config = Config::load();
/// let client = weather_data::client(&config)?;
/// let payload = weather_data::fetch(&client, &config).await?;
/// println!("{}", payload["current"]["temp"]);
/// # Ok(())
/// # }
/// ```
pub async fn fetch(client: &Client, config: &Config) -> Result<Value, FetchError> {
    let url = request_url(config)?;
    tracing::debug!(
        lat = config.location.latitude,
        lon = config.location.longitude,
        "requesting One Call payload"
    );

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let payload = response.json::<Value>().await?;
    tracing::info!(location = %config.location.name, "weather payload received");
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Units;

    fn config_with_key(key: &str) -> Config {
        let mut config = Config::default();
        config.api.key = key.to_string();
        config
    }

    #[test]
    fn test_request_url_carries_location_and_units() {
        let mut config = config_with_key("secret");
        config.api.units = Units::Imperial;

        let url = request_url(&config).unwrap();
        assert_eq!(url.host_str(), Some("api.openweathermap.org"));
        assert_eq!(url.path(), "/data/3.0/onecall");

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            query,
            vec![
                ("lat".to_string(), "40.7128".to_string()),
                ("lon".to_string(), "-74.006".to_string()),
                ("units".to_string(), "imperial".to_string()),
                ("appid".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_key_is_rejected_before_any_request() {
        assert!(matches!(
            request_url(&config_with_key("")),
            Err(FetchError::MissingApiKey)
        ));
        assert!(matches!(
            request_url(&config_with_key("   ")),
            Err(FetchError::MissingApiKey)
        ));
    }

    #[test]
    fn test_client_builds() {
        assert!(client(&Config::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_without_key_fails_fast() {
        let config = config_with_key("");
        let client = client(&config).unwrap();
        let result = fetch(&client, &config).await;
        assert!(matches!(result, Err(FetchError::MissingApiKey)));
    }
}
