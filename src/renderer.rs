//! # Frame Rendering
//!
//! Rasterises [`DrawOp`]s onto a [`Canvas`], plus a coarse ASCII preview of
//! a finished canvas for development on a desktop without a panel.
//!
//! Text is drawn with embedded-graphics mono fonts. Sizes larger than the
//! biggest bundled font are drawn through `Scaled`, which blows every font
//! pixel up into a square block.

use crate::assets::AssetStore;
use crate::canvas::Canvas;
use crate::layout::DrawOp;
use core::convert::Infallible;
use embedded_graphics::{
    image::{Image, ImageRaw},
    mono_font::MonoTextStyle,
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};

/// Draw every operation, in order, onto a fresh white canvas.
///
/// Icons the asset store cannot supply are skipped; nothing here fails.
pub fn render(ops: &[DrawOp], size: Size, assets: &dyn AssetStore) -> Canvas {
    let mut canvas = Canvas::new(size.width, size.height);

    for op in ops {
        match op {
            DrawOp::Text {
                position,
                text,
                font_size,
                color,
            } => {
                let font = assets.font(*font_size);
                let style = MonoTextStyle::new(font.font, *color);
                let mut target = Scaled {
                    canvas: &mut canvas,
                    origin: *position,
                    scale: font.scale,
                };
                Text::with_baseline(text, Point::zero(), style, Baseline::Top)
                    .draw(&mut target)
                    .ok();
            }
            DrawOp::Icon {
                position,
                icon,
                size,
            } => {
                let Some(bitmap) = assets.icon(icon, *size) else {
                    tracing::warn!(icon = %icon, "icon vanished between layout and render");
                    continue;
                };
                let raw = ImageRaw::<BinaryColor>::new(bitmap.data(), bitmap.width());
                Image::new(&raw, *position).draw(&mut canvas).ok();
            }
        }
    }

    canvas
}

/// Draws onto a canvas at an offset, each pixel enlarged to `scale`×`scale`.
struct Scaled<'a> {
    canvas: &'a mut Canvas,
    origin: Point,
    scale: u32,
}

impl OriginDimensions for Scaled<'_> {
    fn size(&self) -> Size {
        let scale = self.scale.max(1);
        Size::new(
            self.canvas.width().div_ceil(scale),
            self.canvas.height().div_ceil(scale),
        )
    }
}

impl DrawTarget for Scaled<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let scale = self.scale.max(1) as i32;
        for Pixel(point, color) in pixels {
            let base = self.origin + point * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    let (x, y) = (base.x + dx, base.y + dy);
                    if x >= 0 && y >= 0 {
                        self.canvas.set_pixel(x as u32, y as u32, color);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Downsample a canvas to `columns` characters per line for a terminal.
///
/// Each character covers a block twice as tall as it is wide, roughly the
/// shape of a terminal cell, and is `#` when a quarter or more of it is ink.
pub fn draw_ascii(canvas: &Canvas, columns: u32) -> String {
    let cell_width = canvas.width().div_ceil(columns.max(1)).max(1);
    let cell_height = cell_width * 2;
    let rows = canvas.height().div_ceil(cell_height);
    let cols = canvas.width().div_ceil(cell_width);

    let mut out = String::with_capacity(((cols + 1) * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let top_left = Point::new((col * cell_width) as i32, (row * cell_height) as i32);
            let ink = canvas.ink_in(top_left, Size::new(cell_width, cell_height));
            let area = (cell_width * cell_height) as usize;
            out.push(if ink * 4 >= area && ink > 0 { '#' } else { ' ' });
        }
        // Keep lines free of trailing blanks
        while out.ends_with(' ') {
            out.pop();
        }
        out.push('\n');
    }
    out
}
