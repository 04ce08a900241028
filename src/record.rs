//! CSV history of current conditions.
//!
//! One row is appended per successful extraction, before layout starts.
//! Recording is a side channel: callers log a failure and carry on with the
//! frame.
//!
//! Columns carry the extracted values, not the display strings. Temperatures,
//! humidity, wind, UV index and pressure are written at full precision
//! (`15.2`, `3.46`). Precipitation is the whole percentage already rounded
//! during extraction (a `0.57` chance becomes `57`).

use crate::CurrentConditions;
use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column names written when a file is first created.
pub const HEADER: [&str; 13] = [
    "timestamp",
    "location",
    "temp",
    "feels_like",
    "temp_max",
    "temp_min",
    "humidity",
    "precipitation",
    "wind_speed",
    "sunrise",
    "sunset",
    "uvi",
    "pressure",
];

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Persists current conditions somewhere.
pub trait ConditionsRecorder {
    fn record(&mut self, current: &CurrentConditions) -> Result<(), RecordError>;
}

/// Appends rows to a CSV file, writing a header into a new or empty file.
#[derive(Clone, Debug)]
pub struct CsvRecorder {
    path: PathBuf,
    location: String,
}

impl CsvRecorder {
    pub fn new(path: impl Into<PathBuf>, location: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            location: location.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a row stamped with `at` instead of the wall clock.
    pub fn record_at(
        &mut self,
        current: &CurrentConditions,
        at: NaiveDateTime,
    ) -> Result<(), RecordError> {
        let io_err = |source| RecordError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        let is_empty = file.metadata().map_err(io_err)?.len() == 0;

        let mut out = String::new();
        if is_empty {
            push_row(&mut out, HEADER.iter().map(|h| h.to_string()));
        }
        push_row(&mut out, self.row(current, at).into_iter());

        file.write_all(out.as_bytes()).map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), "conditions recorded");
        Ok(())
    }

    /// Fields for one row. `precip_percent` is a `u8`, every other number
    /// keeps its `f64` precision.
    fn row(&self, current: &CurrentConditions, at: NaiveDateTime) -> Vec<String> {
        vec![
            at.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.location.clone(),
            current.temp_current.to_string(),
            current.feels_like.to_string(),
            current.temp_max.to_string(),
            current.temp_min.to_string(),
            current.humidity.to_string(),
            current.precip_percent.to_string(),
            current.wind_speed.to_string(),
            current.sunrise.clone(),
            current.sunset.clone(),
            current.uvi.to_string(),
            current.pressure.to_string(),
        ]
    }
}

impl ConditionsRecorder for CsvRecorder {
    fn record(&mut self, current: &CurrentConditions) -> Result<(), RecordError> {
        self.record_at(current, Local::now().naive_local())
    }
}

/// Quote a field when it holds a separator, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row(out: &mut String, fields: impl Iterator<Item = String>) {
    let line: Vec<String> = fields.map(|f| escape(&f)).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}
