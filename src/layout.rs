//! # Display Layout
//!
//! Turns a [`WeatherReport`] into the flat list of draw operations for one
//! frame. The layout is a fixed grid: every position comes from a
//! [`LayoutTable`] of named regions, never from the size of the content.
//!
//! ```text
//! ┌──────────────────────────────────────────────── header ┐
//! │ primary: icon  15°C                       │ hourly      │
//! │                Feels Like: 14°C           │  ☼ 01:00 PM │
//! │                Light Rain                 │  ☼ 02:00 PM │
//! │ secondary: ↑ 20°C   ≈ 72%      ☀ 06:00 AM │  ...        │
//! │            ↓ 10°C   ~ 3.5 M/S  ☾ 08:00 PM │             │
//! │            UV 5     ☂ 0%                  │             │
//! │ forecast:  Sat  Sun  Mon  Tue  Wed  Thu  Fri            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is a pure function of the records, the canvas size and the set
//! of available icons: the same inputs always produce the same operations.
//! A cell whose icon is missing keeps its text and simply loses the icon.

use crate::assets::{AssetStore, FontSize};
use crate::config::Units;
use crate::{
    CurrentConditions, DailyForecastEntry, HourlyForecastEntry, WeatherReport, DAILY_ENTRIES,
    HOURLY_ENTRIES,
};
use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

/// One instruction for the renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Text whose top-left corner sits at `position`
    Text {
        position: Point,
        text: String,
        font_size: FontSize,
        color: BinaryColor,
    },
    /// A `size`×`size` icon whose top-left corner sits at `position`
    Icon {
        position: Point,
        icon: String,
        size: u32,
    },
}

impl DrawOp {
    pub fn position(&self) -> Point {
        match self {
            DrawOp::Text { position, .. } | DrawOp::Icon { position, .. } => *position,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DrawOp::Text { text, .. } => Some(text),
            DrawOp::Icon { .. } => None,
        }
    }
}

/// Canvas corner a region is measured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
}

/// A named block of the screen.
///
/// `x`/`y` are distances from the anchor corner to the region's top-left
/// corner; `spacing` is the step between repeated cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub anchor: Anchor,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub spacing: Point,
}

impl Region {
    /// Top-left corner of the region on a canvas of `canvas` size.
    pub fn origin(&self, canvas: Size) -> Point {
        match self.anchor {
            Anchor::TopLeft => Point::new(self.x, self.y),
            Anchor::TopRight => Point::new(canvas.width as i32 - self.x, self.y),
            Anchor::BottomLeft => Point::new(self.x, canvas.height as i32 - self.y),
        }
    }

    /// Top-left corner of the cell at `(column, row)`.
    pub fn cell(&self, canvas: Size, column: usize, row: usize) -> Point {
        self.origin(canvas)
            + Point::new(
                self.spacing.x * column as i32,
                self.spacing.y * row as i32,
            )
    }
}

/// Text heights used across the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSizes {
    pub header: FontSize,
    pub temperature: FontSize,
    pub feels_like: FontSize,
    pub description: FontSize,
    pub metric: FontSize,
    pub metric_time: FontSize,
    pub strip_label: FontSize,
    pub strip_detail: FontSize,
}

/// Icon edge lengths used across the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconSizes {
    pub primary: u32,
    pub metric: u32,
    pub strip: u32,
}

/// Every fixed position on the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutTable {
    pub header: Region,
    pub primary: Region,
    pub secondary: Region,
    pub forecast: Region,
    pub hourly: Region,
    pub fonts: FontSizes,
    pub icons: IconSizes,
}

impl Default for LayoutTable {
    /// Positions for the 800×480 Waveshare 7.5" panel.
    fn default() -> Self {
        Self {
            header: Region {
                anchor: Anchor::TopRight,
                x: 330,
                y: 10,
                width: 320,
                height: 30,
                spacing: Point::zero(),
            },
            primary: Region {
                anchor: Anchor::TopLeft,
                x: 40,
                y: 15,
                width: 520,
                height: 200,
                spacing: Point::zero(),
            },
            secondary: Region {
                anchor: Anchor::TopLeft,
                x: 40,
                y: 230,
                width: 480,
                height: 140,
                spacing: Point::new(160, 50),
            },
            forecast: Region {
                anchor: Anchor::BottomLeft,
                x: 40,
                y: 100,
                width: 735,
                height: 95,
                spacing: Point::new(105, 0),
            },
            hourly: Region {
                anchor: Anchor::TopRight,
                x: 200,
                y: 85,
                width: 190,
                height: 280,
                spacing: Point::new(0, 35),
            },
            fonts: FontSizes {
                header: FontSize(30),
                temperature: FontSize(80),
                feels_like: FontSize(30),
                description: FontSize(18),
                metric: FontSize(22),
                metric_time: FontSize(24),
                strip_label: FontSize(22),
                strip_detail: FontSize(18),
            },
            icons: IconSizes {
                primary: 180,
                metric: 35,
                strip: 32,
            },
        }
    }
}

// Element offsets inside their region
const PRIMARY_TEMP: Point = Point::new(210, 25);
const PRIMARY_FEELS_LIKE: Point = Point::new(210, 115);
const PRIMARY_DESCRIPTION: Point = Point::new(210, 165);
const METRIC_TEXT: Point = Point::new(40, 0);
const FORECAST_ICON: Point = Point::new(45, 0);
const FORECAST_DAY: Point = Point::new(0, 5);
const FORECAST_HIGH: Point = Point::new(0, 35);
const FORECAST_LOW: Point = Point::new(0, 55);
const FORECAST_PRECIP: Point = Point::new(0, 75);
const HOURLY_ICON: Point = Point::new(0, -5);
const HOURLY_TEXT: Point = Point::new(45, 0);

/// The icon-plus-text cells of the secondary block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Metric {
    High,
    Low,
    Uv,
    Humidity,
    Wind,
    Precipitation,
    Sunrise,
    Sunset,
}

/// `(column, row, metric)` for each secondary cell.
const SECONDARY_CELLS: [(usize, usize, Metric); 8] = [
    (0, 0, Metric::High),
    (0, 1, Metric::Low),
    (0, 2, Metric::Uv),
    (1, 0, Metric::Humidity),
    (1, 1, Metric::Wind),
    (1, 2, Metric::Precipitation),
    (2, 0, Metric::Sunrise),
    (2, 1, Metric::Sunset),
];

impl Metric {
    fn icon(self) -> &'static str {
        match self {
            Metric::High => "high_temp_icon",
            Metric::Low => "low_temp_icon",
            Metric::Uv => "uv-protection",
            Metric::Humidity => "humidity_icon",
            Metric::Wind => "wind_icon",
            Metric::Precipitation => "precipitation_icon",
            Metric::Sunrise => "sunrise_icon",
            Metric::Sunset => "sunset_icon",
        }
    }

    fn text(self, current: &CurrentConditions, units: Units) -> String {
        match self {
            Metric::High => temperature(current.temp_max, units),
            Metric::Low => temperature(current.temp_min, units),
            Metric::Uv => whole(current.uvi),
            Metric::Humidity => format!("{}%", whole(current.humidity)),
            Metric::Wind => format!("{:.1} {}", current.wind_speed, units.wind_suffix()),
            Metric::Precipitation => format!("{}%", current.precip_percent),
            Metric::Sunrise => current.sunrise.clone(),
            Metric::Sunset => current.sunset.clone(),
        }
    }
}

/// Round to a whole number, never printing `-0`.
fn whole(value: f64) -> String {
    let rounded = value.round();
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{:.0}", rounded)
    }
}

fn temperature(value: f64, units: Units) -> String {
    format!("{}{}", whole(value), units.temperature_suffix())
}

/// Computes draw operations from a [`LayoutTable`].
#[derive(Clone, Debug)]
pub struct LayoutEngine {
    table: LayoutTable,
    units: Units,
}

impl LayoutEngine {
    pub fn new(table: LayoutTable, units: Units) -> Self {
        Self { table, units }
    }

    pub fn table(&self) -> &LayoutTable {
        &self.table
    }

    /// Lay out a whole report.
    pub fn layout_report(
        &self,
        report: &WeatherReport,
        canvas: Size,
        assets: &dyn AssetStore,
    ) -> Vec<DrawOp> {
        self.layout(&report.current, &report.daily, &report.hourly, canvas, assets)
    }

    /// Lay out the three records onto a canvas of `canvas` size.
    ///
    /// Only the first seven daily and eight hourly entries are drawn.
    pub fn layout(
        &self,
        current: &CurrentConditions,
        daily: &[DailyForecastEntry],
        hourly: &[HourlyForecastEntry],
        canvas: Size,
        assets: &dyn AssetStore,
    ) -> Vec<DrawOp> {
        let mut ops = Ops::new(assets);

        self.header(&mut ops, current, canvas);
        self.primary(&mut ops, current, canvas);
        self.secondary(&mut ops, current, canvas);
        self.forecast_strip(&mut ops, daily, canvas);
        self.hourly_strip(&mut ops, hourly, canvas);

        ops.finish()
    }

    fn header(&self, ops: &mut Ops, current: &CurrentConditions, canvas: Size) {
        let origin = self.table.header.origin(canvas);
        ops.text(origin, &current.observed_at, self.table.fonts.header);
    }

    fn primary(&self, ops: &mut Ops, current: &CurrentConditions, canvas: Size) {
        let fonts = &self.table.fonts;
        let origin = self.table.primary.origin(canvas);

        ops.icon(origin, &current.icon, self.table.icons.primary);
        ops.text(
            origin + PRIMARY_TEMP,
            &temperature(current.temp_current, self.units),
            fonts.temperature,
        );
        ops.text(
            origin + PRIMARY_FEELS_LIKE,
            &format!("Feels Like: {}", temperature(current.feels_like, self.units)),
            fonts.feels_like,
        );
        ops.text(
            origin + PRIMARY_DESCRIPTION,
            &current.description,
            fonts.description,
        );
    }

    fn secondary(&self, ops: &mut Ops, current: &CurrentConditions, canvas: Size) {
        for (column, row, metric) in SECONDARY_CELLS {
            let cell = self.table.secondary.cell(canvas, column, row);
            let font = match metric {
                Metric::Sunrise | Metric::Sunset => self.table.fonts.metric_time,
                _ => self.table.fonts.metric,
            };

            ops.icon(cell, metric.icon(), self.table.icons.metric);
            ops.text(cell + METRIC_TEXT, &metric.text(current, self.units), font);
        }
    }

    fn forecast_strip(&self, ops: &mut Ops, daily: &[DailyForecastEntry], canvas: Size) {
        let fonts = &self.table.fonts;

        for (i, day) in daily.iter().take(DAILY_ENTRIES).enumerate() {
            let column = self.table.forecast.cell(canvas, i, 0);

            ops.icon(column + FORECAST_ICON, &day.icon, self.table.icons.strip);
            ops.text(column + FORECAST_DAY, &day.day, fonts.strip_label);
            ops.text(
                column + FORECAST_HIGH,
                &format!("High: {}", temperature(day.temp_max, self.units)),
                fonts.strip_detail,
            );
            ops.text(
                column + FORECAST_LOW,
                &format!("Low: {}", temperature(day.temp_min, self.units)),
                fonts.strip_detail,
            );
            ops.text(
                column + FORECAST_PRECIP,
                &format!("{}%", day.precip_percent),
                fonts.strip_detail,
            );
        }
    }

    fn hourly_strip(&self, ops: &mut Ops, hourly: &[HourlyForecastEntry], canvas: Size) {
        for (i, hour) in hourly.iter().take(HOURLY_ENTRIES).enumerate() {
            let row = self.table.hourly.cell(canvas, 0, i);

            ops.icon(row + HOURLY_ICON, &hour.icon, self.table.icons.strip);
            ops.text(
                row + HOURLY_TEXT,
                &format!("{} {}", hour.time, temperature(hour.temp, self.units)),
                self.table.fonts.strip_detail,
            );
        }
    }
}

/// Accumulates operations, dropping icons the asset store cannot supply.
struct Ops<'a> {
    assets: &'a dyn AssetStore,
    ops: Vec<DrawOp>,
}

impl<'a> Ops<'a> {
    fn new(assets: &'a dyn AssetStore) -> Self {
        Self {
            assets,
            ops: Vec::with_capacity(96),
        }
    }

    fn text(&mut self, position: Point, text: &str, font_size: FontSize) {
        self.ops.push(DrawOp::Text {
            position,
            text: text.to_string(),
            font_size,
            color: BinaryColor::On,
        });
    }

    fn icon(&mut self, position: Point, icon: &str, size: u32) {
        if !self.assets.has_icon(icon) {
            tracing::debug!(icon, "no icon asset, cell drawn as text only");
            return;
        }
        self.ops.push(DrawOp::Icon {
            position,
            icon: icon.to_string(),
            size,
        });
    }

    fn finish(self) -> Vec<DrawOp> {
        self.ops
    }
}
