//! One refresh cycle after the network fetch:
//! extract → record → layout → render → display.
//!
//! Each stage runs to completion before the next starts and nothing survives
//! between cycles except the shared assets. An extraction failure stops the
//! cycle before layout, so the sink is never handed a half-built frame.

use crate::assets::AssetStore;
use crate::canvas::Canvas;
use crate::display::DisplaySink;
use crate::extract::extract;
use crate::layout::LayoutEngine;
use crate::record::ConditionsRecorder;
use crate::renderer::render;
use crate::WeatherReport;
use anyhow::Context;
use embedded_graphics::prelude::Size;
use serde_json::Value;

pub struct Pipeline<'a> {
    engine: LayoutEngine,
    assets: &'a dyn AssetStore,
    canvas_size: Size,
}

impl<'a> Pipeline<'a> {
    pub fn new(engine: LayoutEngine, assets: &'a dyn AssetStore, canvas_size: Size) -> Self {
        Self {
            engine,
            assets,
            canvas_size,
        }
    }

    /// Lay out and rasterise a report.
    pub fn frame(&self, report: &WeatherReport) -> Canvas {
        let ops = self
            .engine
            .layout_report(report, self.canvas_size, self.assets);
        tracing::debug!(ops = ops.len(), "layout computed");
        render(&ops, self.canvas_size, self.assets)
    }

    /// Turn a raw payload into a frame on `sink`.
    ///
    /// A recorder failure is logged and does not stop the frame.
    pub fn run(
        &self,
        payload: &Value,
        recorder: Option<&mut dyn ConditionsRecorder>,
        sink: &mut dyn DisplaySink,
    ) -> anyhow::Result<WeatherReport> {
        let report = extract(payload).context("weather payload rejected")?;
        tracing::info!(
            temp = report.current.temp_current,
            description = %report.current.description,
            "conditions extracted"
        );

        if let Some(recorder) = recorder {
            if let Err(e) = recorder.record(&report.current) {
                tracing::warn!(error = %e, "could not record conditions");
            }
        }

        let canvas = self.frame(&report);
        sink.show(canvas).context("display update failed")?;
        Ok(report)
    }
}
