//! # Icons and Fonts
//!
//! Read-only display assets, loaded once at start-up and shared by reference
//! with the layout engine and the renderer.
//!
//! ## Icons
//! Icons are addressed by string id: OpenWeatherMap icon codes (`01d`, `10n`,
//! ...) for conditions, plus a handful of fixed glyph names for the metric
//! cells (`wind_icon`, `sunrise_icon`, ...). On disk each id is a PNG file
//! `<id>.png`; it is decoded with the `image` crate, resized to the cell and
//! thresholded to one bit.
//!
//! ## Fonts
//! Text uses the ISO-8859-1 mono fonts bundled with embedded-graphics (they
//! carry the `°` glyph). A requested pixel height maps to the tallest
//! font × integer scale that fits, so a size 80 temperature is the 10×20 font
//! drawn at 4×.

use embedded_graphics::mono_font::{iso_8859_1, MonoFont};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading assets from disk.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("icon directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("icon {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Nominal text height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontSize(pub u32);

/// Base fonts considered when mapping a size, smallest first.
const BASE_FONTS: [&MonoFont<'static>; 4] = [
    &iso_8859_1::FONT_6X13,
    &iso_8859_1::FONT_7X14,
    &iso_8859_1::FONT_9X18,
    &iso_8859_1::FONT_10X20,
];

const MAX_SCALE: u32 = 6;

/// A mono font and the integer factor it is drawn at.
#[derive(Clone, Copy, Debug)]
pub struct FontHandle {
    pub font: &'static MonoFont<'static>,
    pub scale: u32,
}

impl FontHandle {
    /// Tallest font × scale whose height does not exceed `size`.
    ///
    /// Sizes smaller than every base font fall back to the smallest one.
    pub fn for_size(size: FontSize) -> Self {
        let mut best = FontHandle {
            font: BASE_FONTS[0],
            scale: 1,
        };
        let mut best_height = 0;
        for scale in 1..=MAX_SCALE {
            for font in BASE_FONTS {
                let height = font.character_size.height * scale;
                if height <= size.0 && height > best_height {
                    best = FontHandle { font, scale };
                    best_height = height;
                }
            }
        }
        best
    }

    pub fn line_height(&self) -> u32 {
        self.font.character_size.height * self.scale
    }

    /// Horizontal advance of one character, spacing included.
    pub fn char_advance(&self) -> u32 {
        (self.font.character_size.width + self.font.character_spacing) * self.scale
    }

    /// Rendered width of `text` in pixels.
    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.char_advance()
    }
}

/// A square-or-rectangular 1-bit bitmap.
///
/// Rows are packed MSB-first and padded to whole bytes; a set bit is ink.
/// This is the layout `ImageRaw<BinaryColor>` reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Icon {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Icon {
    /// Build an icon from a per-pixel ink predicate.
    pub fn from_fn(width: u32, height: u32, ink: impl Fn(u32, u32) -> bool) -> Self {
        let bytes_per_row = width.div_ceil(8);
        let mut data = vec![0u8; (bytes_per_row * height) as usize];
        for y in 0..height {
            for x in 0..width {
                if ink(x, y) {
                    data[(y * bytes_per_row + x / 8) as usize] |= 0x80 >> (x % 8);
                }
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let bytes_per_row = self.width.div_ceil(8);
        self.data[(y * bytes_per_row + x / 8) as usize] & (0x80 >> (x % 8)) != 0
    }

    /// Nearest-neighbour resize to a `size`×`size` square.
    pub fn resized(&self, size: u32) -> Icon {
        if self.width == size && self.height == size {
            return self.clone();
        }
        Icon::from_fn(size, size, |x, y| {
            self.is_ink(x * self.width / size, y * self.height / size)
        })
    }
}

/// Source of icons and fonts for one display.
pub trait AssetStore {
    /// The icon `id` scaled to `size`×`size`, or `None` when no asset exists.
    fn icon(&self, id: &str, size: u32) -> Option<Icon>;

    /// Whether an icon exists for `id`, without producing it.
    fn has_icon(&self, id: &str) -> bool;

    fn font(&self, size: FontSize) -> FontHandle {
        FontHandle::for_size(size)
    }
}

/// Icons held in memory, keyed by id.
///
/// Used for tests and for text-only previews when no icon directory is
/// available.
#[derive(Clone, Debug, Default)]
pub struct InMemoryAssets {
    icons: HashMap<String, Icon>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, icon: Icon) {
        self.icons.insert(id.into(), icon);
    }

    pub fn with_icon(mut self, id: impl Into<String>, icon: Icon) -> Self {
        self.insert(id, icon);
        self
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

impl AssetStore for InMemoryAssets {
    fn icon(&self, id: &str, size: u32) -> Option<Icon> {
        self.icons.get(id).map(|icon| icon.resized(size))
    }

    fn has_icon(&self, id: &str) -> bool {
        self.icons.contains_key(id)
    }
}

/// Icons decoded from a directory of `<id>.png` files.
pub struct IconDirectory {
    images: HashMap<String, image::GrayAlphaImage>,
}

impl IconDirectory {
    /// Decode every PNG in `dir`.
    ///
    /// A file that fails to decode is logged and skipped, so only its cells
    /// lose their icon. Only an unreadable directory is an error.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, AssetError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| AssetError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut images = HashMap::new();
        for entry in entries {
            let path = entry
                .map_err(|source| AssetError::Directory {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();

            let is_png = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_png {
                continue;
            }

            match image::open(&path) {
                Ok(decoded) => {
                    images.insert(id.to_string(), decoded.to_luma_alpha8());
                }
                Err(source) => {
                    let error = AssetError::Decode {
                        path: path.clone(),
                        source,
                    };
                    tracing::warn!(%error, "skipping undecodable icon");
                }
            }
        }

        tracing::info!(count = images.len(), dir = %dir.display(), "icons loaded");
        Ok(Self { images })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl AssetStore for IconDirectory {
    fn icon(&self, id: &str, size: u32) -> Option<Icon> {
        let source = self.images.get(id)?;
        let scaled =
            image::imageops::resize(source, size, size, image::imageops::FilterType::Triangle);

        // Transparent or light pixels are paper; dark opaque pixels are ink
        Some(Icon::from_fn(size, size, |x, y| {
            let [luma, alpha] = scaled.get_pixel(x, y).0;
            alpha >= 128 && luma < 128
        }))
    }

    fn has_icon(&self, id: &str) -> bool {
        self.images.contains_key(id)
    }
}
