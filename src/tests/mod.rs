//! Cross-module scenarios: a raw payload all the way to a finished frame.

mod pipeline_tests;

use crate::assets::{Icon, InMemoryAssets};
use serde_json::{json, Value};

/// 2025-07-04 16:00 UTC, which is 12:00 PM Eastern daylight time
pub(crate) const BASE: i64 = 1_751_644_800;

/// A One Call payload with `days` daily and `hours` hourly entries.
pub(crate) fn payload(days: i64, hours: i64) -> Value {
    let daily: Vec<Value> = (0..days)
        .map(|i| {
            json!({
                "dt": BASE + i * 86_400,
                "temp": { "day": 18.0, "max": 20.0 + i as f64, "min": 10.0 + i as f64 },
                "pop": 0.1 * i as f64,
                "weather": [{ "id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d" }]
            })
        })
        .collect();
    let hourly: Vec<Value> = (0..hours)
        .map(|i| {
            json!({
                "dt": BASE + i * 3_600,
                "temp": 15.0 + i as f64,
                "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }]
            })
        })
        .collect();

    json!({
        "lat": 40.7128,
        "lon": -74.006,
        "timezone": "America/New_York",
        "current": {
            "dt": BASE,
            "sunrise": BASE - 6 * 3_600,
            "sunset": BASE + 8 * 3_600,
            "temp": 15.0,
            "feels_like": 13.6,
            "pressure": 1013,
            "humidity": 72,
            "uvi": 5.2,
            "wind_speed": 3.46,
            "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }]
        },
        "hourly": hourly,
        "daily": daily,
    })
}

/// Solid icons for every id the payload and the metric cells use.
pub(crate) fn full_assets() -> InMemoryAssets {
    let ids = [
        "01d",
        "03d",
        "10d",
        "high_temp_icon",
        "low_temp_icon",
        "uv-protection",
        "humidity_icon",
        "wind_icon",
        "precipitation_icon",
        "sunrise_icon",
        "sunset_icon",
    ];
    let mut assets = InMemoryAssets::new();
    for id in ids {
        assets.insert(id, Icon::from_fn(8, 8, |_, _| true));
    }
    assets
}
