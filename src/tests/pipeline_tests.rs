use super::{full_assets, payload};
use crate::assets::InMemoryAssets;
use crate::canvas::{Canvas, PANEL_HEIGHT, PANEL_WIDTH};
use crate::config::Units;
use crate::display::{DisplayError, DisplaySink, PbmSink};
use crate::layout::{LayoutEngine, LayoutTable};
use crate::pipeline::Pipeline;
use crate::record::{ConditionsRecorder, CsvRecorder, RecordError};
use crate::CurrentConditions;
use embedded_graphics::prelude::*;
use std::fs;
use std::io;
use tempfile::tempdir;

const PANEL: Size = Size::new(PANEL_WIDTH, PANEL_HEIGHT);

#[derive(Default)]
struct CaptureSink {
    frames: Vec<Canvas>,
}

impl DisplaySink for CaptureSink {
    fn show(&mut self, canvas: Canvas) -> Result<(), DisplayError> {
        self.frames.push(canvas);
        Ok(())
    }
}

struct FailingSink;

impl DisplaySink for FailingSink {
    fn show(&mut self, _canvas: Canvas) -> Result<(), DisplayError> {
        Err(DisplayError::Hardware("busy line never released".to_string()))
    }
}

#[derive(Default)]
struct CountingRecorder {
    rows: Vec<CurrentConditions>,
}

impl ConditionsRecorder for CountingRecorder {
    fn record(&mut self, current: &CurrentConditions) -> Result<(), RecordError> {
        self.rows.push(current.clone());
        Ok(())
    }
}

struct FailingRecorder;

impl ConditionsRecorder for FailingRecorder {
    fn record(&mut self, _current: &CurrentConditions) -> Result<(), RecordError> {
        Err(RecordError::Io {
            path: "records.csv".into(),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        })
    }
}

fn engine() -> LayoutEngine {
    LayoutEngine::new(LayoutTable::default(), Units::Metric)
}

#[test]
fn full_payload_reaches_the_sink() {
    let assets = full_assets();
    let pipeline = Pipeline::new(engine(), &assets, PANEL);
    let mut sink = CaptureSink::default();
    let mut recorder = CountingRecorder::default();

    let report = pipeline
        .run(&payload(8, 48), Some(&mut recorder), &mut sink)
        .unwrap();

    assert_eq!(report.current.observed_at, "07/04/2025 12:00 PM");
    assert_eq!(report.current.sunrise, "06:00 AM");
    assert_eq!(report.current.sunset, "08:00 PM");
    assert_eq!(report.daily[0].day, "Sat");
    assert_eq!(report.hourly[0].time, "01:00 PM");

    assert_eq!(sink.frames.len(), 1);
    let frame = &sink.frames[0];
    assert_eq!(frame.size(), PANEL);
    assert!(frame.ink_count() > 0);

    // Solid 180 px primary icon
    assert_eq!(frame.ink_in(Point::new(40, 15), Size::new(180, 180)), 180 * 180);

    assert_eq!(recorder.rows, vec![report.current.clone()]);
}

#[test]
fn short_daily_section_never_reaches_the_sink() {
    let assets = full_assets();
    let pipeline = Pipeline::new(engine(), &assets, PANEL);
    let mut sink = CaptureSink::default();
    let mut recorder = CountingRecorder::default();

    let result = pipeline.run(&payload(5, 48), Some(&mut recorder), &mut sink);

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("insufficient daily data"));
    assert!(sink.frames.is_empty());
    assert!(recorder.rows.is_empty());
}

#[test]
fn short_hourly_section_never_reaches_the_sink() {
    let assets = full_assets();
    let pipeline = Pipeline::new(engine(), &assets, PANEL);
    let mut sink = CaptureSink::default();

    assert!(pipeline.run(&payload(8, 8), None, &mut sink).is_err());
    assert!(sink.frames.is_empty());
}

#[test]
fn missing_icons_still_produce_a_text_frame() {
    let with_icons = full_assets();
    let without_icons = InMemoryAssets::new();
    let data = payload(8, 48);

    let mut full = CaptureSink::default();
    Pipeline::new(engine(), &with_icons, PANEL)
        .run(&data, None, &mut full)
        .unwrap();

    let mut bare = CaptureSink::default();
    Pipeline::new(engine(), &without_icons, PANEL)
        .run(&data, None, &mut bare)
        .unwrap();

    let bare = &bare.frames[0];
    assert_eq!(bare.ink_in(Point::new(40, 15), Size::new(180, 180)), 0);
    assert!(bare.ink_count() > 0);
    assert!(bare.ink_count() < full.frames[0].ink_count());

    // Text areas are identical either way: the big temperature
    let temp = (Point::new(250, 40), Size::new(160, 80));
    assert_eq!(
        bare.ink_in(temp.0, temp.1),
        full.frames[0].ink_in(temp.0, temp.1)
    );
}

#[test]
fn identical_payloads_give_identical_frames() {
    let assets = full_assets();
    let pipeline = Pipeline::new(engine(), &assets, PANEL);
    let data = payload(8, 48);

    let mut sink = CaptureSink::default();
    pipeline.run(&data, None, &mut sink).unwrap();
    pipeline.run(&data, None, &mut sink).unwrap();

    assert_eq!(sink.frames[0], sink.frames[1]);
}

#[test]
fn recorder_failure_does_not_block_the_frame() {
    let assets = full_assets();
    let pipeline = Pipeline::new(engine(), &assets, PANEL);
    let mut sink = CaptureSink::default();

    pipeline
        .run(&payload(8, 48), Some(&mut FailingRecorder), &mut sink)
        .unwrap();
    assert_eq!(sink.frames.len(), 1);
}

#[test]
fn sink_failure_is_reported() {
    let assets = full_assets();
    let pipeline = Pipeline::new(engine(), &assets, PANEL);

    let err = pipeline
        .run(&payload(8, 48), None, &mut FailingSink)
        .unwrap_err();
    assert!(format!("{err:#}").contains("busy line never released"));
}

#[test]
fn csv_and_pbm_files_are_written() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("records.csv");
    let pbm = dir.path().join("frame.pbm");

    let assets = full_assets();
    let pipeline = Pipeline::new(engine(), &assets, PANEL);
    let mut recorder = CsvRecorder::new(&csv, "New York, NY");
    let mut sink = PbmSink::new(&pbm);

    pipeline
        .run(&payload(8, 48), Some(&mut recorder), &mut sink)
        .unwrap();

    let rows = fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = rows.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains(",\"New York, NY\",15,13.6,20,10,72,0,3.46,06:00 AM,08:00 PM,5.2,1013"));

    let frame = fs::read(&pbm).unwrap();
    let header = b"P4\n800 480\n";
    assert_eq!(&frame[..header.len()], header);
    assert_eq!(frame.len(), header.len() + 100 * 480);
}

#[test]
fn imperial_units_change_the_frame() {
    let assets = full_assets();
    let data = payload(8, 48);

    let mut metric = CaptureSink::default();
    Pipeline::new(engine(), &assets, PANEL)
        .run(&data, None, &mut metric)
        .unwrap();

    let mut imperial = CaptureSink::default();
    Pipeline::new(
        LayoutEngine::new(LayoutTable::default(), Units::Imperial),
        &assets,
        PANEL,
    )
    .run(&data, None, &mut imperial)
    .unwrap();

    assert_ne!(metric.frames[0], imperial.frames[0]);
}

#[test]
fn minimal_payload_lays_out_primary_block_and_forecast_strip() {
    let mut data = payload(8, 9);
    data["current"]["weather"][0]["icon"] = serde_json::json!("01d");

    let report = crate::extract::extract(&data).unwrap();
    assert_eq!(report.current.temp_current, 15.0);
    assert_eq!(report.current.temp_max, 20.0);
    assert_eq!(report.current.icon, "01d");
    assert_eq!(report.daily[0].temp_max, 21.0);
    assert_eq!(report.hourly[0].temp, 16.0);

    let table = LayoutTable::default();
    let ops = engine().layout_report(&report, PANEL, &full_assets());

    let primary = table.primary.origin(PANEL);
    let temp = ops
        .iter()
        .find(|op| op.text() == Some("15°C"))
        .expect("temperature text");
    let pos = temp.position();
    assert!(pos.x >= primary.x && pos.x < primary.x + table.primary.width as i32);
    assert!(pos.y >= primary.y && pos.y < primary.y + table.primary.height as i32);

    let xs: Vec<i32> = ops
        .iter()
        .filter(|op| op.text().is_some_and(|t| t.starts_with("High: ")))
        .map(|op| op.position().x)
        .collect();
    assert_eq!(xs.len(), 7);
    assert!(xs.windows(2).all(|w| w[0] < w[1]));
}
