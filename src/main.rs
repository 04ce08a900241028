//! # Weather Display Application Entry Point
//!
//! This binary wires the library together: it loads configuration and icons
//! once, then runs refresh cycles (fetch, extract, record, layout, render,
//! display) every `schedule.refresh_minutes`.
//!
//! ## Flags
//! - `--once`: run a single cycle and exit, for cron or systemd timers. A
//!   failed cycle makes the process exit non-zero
//! - `--stdout`: print an ASCII preview instead of driving the panel
//! - `--pbm <path>`: write each frame to a PBM file
//! - `--config <path>`: read configuration from `path`
//!
//! Without `--stdout` or `--pbm`, a build with `--features hardware` drives
//! the Waveshare panel and any other build prints the ASCII preview.

use embedded_graphics::prelude::Size;
use reqwest::Client;
use std::{env, time::Duration};
use tracing_subscriber::EnvFilter;
use weather_display_lib::{
    assets::{AssetStore, IconDirectory, InMemoryAssets},
    config::Config,
    display::{AsciiSink, DisplaySink, PbmSink},
    layout::{LayoutEngine, LayoutTable},
    pipeline::Pipeline,
    record::{ConditionsRecorder, CsvRecorder},
    weather_data,
};

/// Command line switches, read the same way on every platform.
#[derive(Debug, Default, PartialEq)]
struct Args {
    once: bool,
    stdout: bool,
    pbm: Option<String>,
    config: Option<String>,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut parsed = Args::default();
        let mut args = args.into_iter().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--once" => parsed.once = true,
                "--stdout" => parsed.stdout = true,
                "--pbm" => parsed.pbm = args.next(),
                "--config" => parsed.config = args.next(),
                other => tracing::warn!(arg = other, "ignoring unknown argument"),
            }
        }
        parsed
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // File and line numbers are noise on the Pi's journal
    if cfg!(debug_assertions) {
        builder.with_file(true).with_line_number(true).init();
    } else {
        builder.with_target(false).init();
    }
}

/// Icons from the configured directory, or none at all.
///
/// Without icons every cell still shows its text.
fn load_assets(config: &Config) -> Box<dyn AssetStore> {
    match IconDirectory::load(&config.display.icon_dir) {
        Ok(icons) => Box::new(icons),
        Err(e) => {
            tracing::warn!(error = %e, "icons unavailable, drawing text only");
            Box::new(InMemoryAssets::new())
        }
    }
}

fn open_sink(args: &Args, config: &Config) -> anyhow::Result<Box<dyn DisplaySink>> {
    if let Some(path) = &args.pbm {
        return Ok(Box::new(PbmSink::new(path)));
    }
    if args.stdout {
        return Ok(Box::new(AsciiSink::stdout()));
    }

    #[cfg(all(target_os = "linux", feature = "hardware"))]
    let sink: Box<dyn DisplaySink> = Box::new(weather_display_lib::display::open_panel(
        &config.display.hardware,
    )?);

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    let sink: Box<dyn DisplaySink> = {
        let _ = config;
        tracing::info!("built without the hardware feature, using the ASCII preview");
        Box::new(AsciiSink::stdout())
    };

    Ok(sink)
}

/// Fetch one payload and push it through the pipeline.
async fn refresh(
    client: &Client,
    config: &Config,
    pipeline: &Pipeline<'_>,
    recorder: Option<&mut dyn ConditionsRecorder>,
    sink: &mut dyn DisplaySink,
) -> anyhow::Result<()> {
    let payload = weather_data::fetch(client, config).await?;
    pipeline.run(&payload, recorder, sink)?;
    Ok(())
}

/// Decide what follows a cycle: `Some` ends the run with that result.
///
/// A single `--once` cycle reports its own outcome so cron and systemd see
/// the failure. On a schedule the error is logged and the last good frame
/// stays on the panel until the next attempt.
fn after_cycle(result: anyhow::Result<()>, once: bool) -> Option<anyhow::Result<()>> {
    if once {
        return Some(result);
    }
    if let Err(e) = result {
        tracing::error!("refresh cycle skipped: {e:#}");
    }
    None
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse(env::args());
    let config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    let assets = load_assets(&config);
    let engine = LayoutEngine::new(LayoutTable::default(), config.api.units);
    let canvas_size = Size::new(config.display.width, config.display.height);
    let pipeline = Pipeline::new(engine, assets.as_ref(), canvas_size);

    let mut sink = open_sink(&args, &config)?;
    let mut recorder = config
        .record
        .enabled
        .then(|| CsvRecorder::new(&config.record.csv_path, &config.location.name));

    let client = weather_data::client(&config)?;
    let interval = Duration::from_secs(config.schedule.refresh_minutes.max(1) * 60);

    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        loop {
            let recorder = recorder
                .as_mut()
                .map(|r| r as &mut dyn ConditionsRecorder);

            let result = refresh(&client, &config, &pipeline, recorder, sink.as_mut()).await;
            if let Some(done) = after_cycle(result, args.once) {
                return done;
            }

            tracing::debug!(minutes = interval.as_secs() / 60, "sleeping until next refresh");
            tokio::time::sleep(interval).await;
        }
    })
}
