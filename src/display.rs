//! # Display Sinks
//!
//! The last step of a cycle hands the finished [`Canvas`] to a
//! [`DisplaySink`]. The sink takes ownership; nothing keeps the frame after
//! `show` returns.
//!
//! - [`PbmSink`] writes a binary PBM (`P4`) file, handy for inspecting frames
//!   on a desktop or serving them to another device
//! - [`AsciiSink`] prints a coarse preview to a terminal
//! - `EpdSink` (with the `hardware` feature) drives a Waveshare 7.5" V2 panel
//!   over SPI

use crate::canvas::Canvas;
use crate::renderer::draw_ascii;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("display IO: {0}")]
    Io(#[from] io::Error),

    #[error("frame is {got_width}×{got_height}, panel is {width}×{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },

    /// SPI, GPIO or controller failure, already formatted
    #[error("panel: {0}")]
    Hardware(String),
}

/// Receives one finished frame per cycle.
pub trait DisplaySink {
    fn show(&mut self, canvas: Canvas) -> Result<(), DisplayError>;
}

/// Writes each frame to a PBM file, replacing the previous one.
#[derive(Clone, Debug)]
pub struct PbmSink {
    path: PathBuf,
}

impl PbmSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

/// Encode a canvas as binary PBM.
///
/// PBM uses 1 for black, the opposite of the canvas, so every byte is
/// inverted. Row padding is identical in both formats.
pub fn encode_pbm(canvas: &Canvas) -> Vec<u8> {
    let header = format!("P4\n{} {}\n", canvas.width(), canvas.height());
    let mut out = Vec::with_capacity(header.len() + canvas.buffer().len());
    out.extend_from_slice(header.as_bytes());
    out.extend(canvas.buffer().iter().map(|byte| !byte));
    out
}

impl DisplaySink for PbmSink {
    fn show(&mut self, canvas: Canvas) -> Result<(), DisplayError> {
        // Write beside the target and rename, so readers never see half a frame
        let tmp = self.path.with_extension("pbm.tmp");
        fs::write(&tmp, encode_pbm(&canvas))?;
        fs::rename(&tmp, &self.path)?;
        tracing::info!(path = %self.path.display(), "frame written");
        Ok(())
    }
}

/// Prints a downsampled preview of each frame.
pub struct AsciiSink<W: Write> {
    out: W,
    columns: u32,
}

impl AsciiSink<io::Stdout> {
    /// 100-column preview on standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout(), 100)
    }
}

impl<W: Write> AsciiSink<W> {
    pub fn new(out: W, columns: u32) -> Self {
        Self { out, columns }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for AsciiSink<W> {
    fn show(&mut self, canvas: Canvas) -> Result<(), DisplayError> {
        self.out
            .write_all(draw_ascii(&canvas, self.columns).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(all(target_os = "linux", feature = "hardware"))]
pub use epd::{open_panel, EpdSink};

#[cfg(all(target_os = "linux", feature = "hardware"))]
mod epd {
    use super::{DisplayError, DisplaySink};
    use crate::canvas::Canvas;
    use crate::config::HardwareConfig;
    use embedded_hal::{
        delay::DelayNs,
        digital::{InputPin, OutputPin},
        spi::SpiDevice,
    };
    use epd_waveshare::{
        epd7in5_v2::{Epd7in5, HEIGHT, WIDTH},
        prelude::*,
    };
    use linux_embedded_hal::{
        gpio_cdev::{Chip, LineRequestFlags},
        spidev::{SpiModeFlags, SpidevOptions},
        CdevPin, Delay, SpidevDevice,
    };

    fn hw<E: core::fmt::Debug>(context: &'static str) -> impl FnOnce(E) -> DisplayError {
        move |e| DisplayError::Hardware(format!("{context}: {e:?}"))
    }

    /// A Waveshare 7.5" V2 panel. The controller sleeps between frames.
    pub struct EpdSink<SPI, BUSY, DC, RST, DELAY> {
        spi: SPI,
        epd: Epd7in5<SPI, BUSY, DC, RST, DELAY>,
        delay: DELAY,
    }

    impl<SPI, BUSY, DC, RST, DELAY> EpdSink<SPI, BUSY, DC, RST, DELAY>
    where
        SPI: SpiDevice,
        BUSY: InputPin,
        DC: OutputPin,
        RST: OutputPin,
        DELAY: DelayNs,
    {
        pub fn new(
            mut spi: SPI,
            busy: BUSY,
            dc: DC,
            rst: RST,
            mut delay: DELAY,
        ) -> Result<Self, DisplayError> {
            let epd = Epd7in5::new(&mut spi, busy, dc, rst, &mut delay, None)
                .map_err(hw("init"))?;
            Ok(Self { spi, epd, delay })
        }
    }

    impl<SPI, BUSY, DC, RST, DELAY> DisplaySink for EpdSink<SPI, BUSY, DC, RST, DELAY>
    where
        SPI: SpiDevice,
        BUSY: InputPin,
        DC: OutputPin,
        RST: OutputPin,
        DELAY: DelayNs,
    {
        fn show(&mut self, canvas: Canvas) -> Result<(), DisplayError> {
            if canvas.width() != WIDTH || canvas.height() != HEIGHT {
                return Err(DisplayError::SizeMismatch {
                    width: WIDTH,
                    height: HEIGHT,
                    got_width: canvas.width(),
                    got_height: canvas.height(),
                });
            }

            // The V2 controller reads a set bit as black
            let frame: Vec<u8> = canvas.into_buffer().into_iter().map(|b| !b).collect();

            self.epd
                .wake_up(&mut self.spi, &mut self.delay)
                .map_err(hw("wake"))?;
            self.epd
                .update_and_display_frame(&mut self.spi, &frame, &mut self.delay)
                .map_err(hw("update"))?;
            self.epd
                .sleep(&mut self.spi, &mut self.delay)
                .map_err(hw("sleep"))?;

            tracing::info!("panel refreshed");
            Ok(())
        }
    }

    fn output_pin(chip: &mut Chip, line: u32, label: &str) -> Result<CdevPin, DisplayError> {
        let handle = chip
            .get_line(line)
            .and_then(|l| l.request(LineRequestFlags::OUTPUT, 0, label))
            .map_err(hw("gpio line"))?;
        CdevPin::new(handle).map_err(hw("gpio pin"))
    }

    /// Open the SPI device and GPIO lines named in the config.
    pub fn open_panel(
        config: &HardwareConfig,
    ) -> Result<EpdSink<SpidevDevice, CdevPin, CdevPin, CdevPin, Delay>, DisplayError> {
        let mut spi = SpidevDevice::open(&config.spi_device).map_err(hw("open spi"))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(4_000_000)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.configure(&options).map_err(hw("configure spi"))?;

        let mut chip = Chip::new(&config.gpio_chip).map_err(hw("open gpio chip"))?;
        let busy_handle = chip
            .get_line(config.busy_pin)
            .and_then(|l| l.request(LineRequestFlags::INPUT, 0, "weather-busy"))
            .map_err(hw("gpio line"))?;
        let busy = CdevPin::new(busy_handle).map_err(hw("gpio pin"))?;
        let dc = output_pin(&mut chip, config.dc_pin, "weather-dc")?;
        let rst = output_pin(&mut chip, config.rst_pin, "weather-rst")?;

        tracing::info!(spi = %config.spi_device, "opening e-ink panel");
        EpdSink::new(spi, busy, dc, rst, Delay {})
    }
}
