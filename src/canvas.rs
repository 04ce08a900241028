//! Monochrome frame buffer for the 7.5" panel.
//!
//! One bit per pixel, rows packed MSB-first and padded to whole bytes, the
//! same layout the Waveshare controllers and PBM files expect. A set bit is
//! white paper, a cleared bit is black ink.
//!
//! The canvas implements embedded-graphics [`DrawTarget`] with
//! [`BinaryColor::On`] meaning ink, so any embedded-graphics primitive, font or
//! image can be drawn onto it directly.

use core::convert::Infallible;
use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

/// Panel dimensions for the Waveshare 7.5" V2
pub const PANEL_WIDTH: u32 = 800;
pub const PANEL_HEIGHT: u32 = 480;

/// A fixed-size 1-bit raster, white when created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8);
        let buffer_size = (bytes_per_row * height) as usize;
        Self {
            width,
            height,
            buffer: vec![0xFF; buffer_size], // White by default
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed rows, 1 = white, 0 = black.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    pub fn clear(&mut self, color: BinaryColor) {
        match color {
            BinaryColor::Off => self.buffer.fill(0xFF),
            BinaryColor::On => self.buffer.fill(0x00),
        }
    }

    fn locate(&self, x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bytes_per_row = self.width.div_ceil(8);
        let byte_index = (y * bytes_per_row + x / 8) as usize;
        Some((byte_index, 0x80 >> (x % 8)))
    }

    /// Set one pixel; coordinates outside the canvas are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: BinaryColor) {
        if let Some((index, mask)) = self.locate(x, y) {
            match color {
                BinaryColor::On => self.buffer[index] &= !mask,
                BinaryColor::Off => self.buffer[index] |= mask,
            }
        }
    }

    /// Colour at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        self.locate(x, y).map(|(index, mask)| {
            if self.buffer[index] & mask == 0 {
                BinaryColor::On
            } else {
                BinaryColor::Off
            }
        })
    }

    /// Number of inked pixels inside `area`.
    pub fn ink_in(&self, top_left: Point, size: Size) -> usize {
        let x0 = top_left.x.max(0) as u32;
        let y0 = top_left.y.max(0) as u32;
        let x1 = (top_left.x + size.width as i32).max(0) as u32;
        let y1 = (top_left.y + size.height as i32).max(0) as u32;
        (y0..y1.min(self.height))
            .flat_map(|y| (x0..x1.min(self.width)).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y) == Some(BinaryColor::On))
            .count()
    }

    /// Number of inked pixels on the whole canvas.
    pub fn ink_count(&self) -> usize {
        self.ink_in(Point::zero(), self.size())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}
