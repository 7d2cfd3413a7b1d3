//! Image decoding into per-pixel grayscale samples.
//!
//! A [`PixelField`] is the pure data form of a portrait: one sample per
//! output pixel with its grayscale value and whether it should be rendered
//! at all. Transparent pixels and near-white pixels are marked invisible so
//! that white zones (which are never really white in photographs) don't
//! produce stray points.
//!
//! # Example
//!
//! ```ignore
//! use dotfield::pixels::PixelField;
//!
//! let field = PixelField::decode("images/0001.png", 100)?;
//! println!("{}x{}, {} visible", field.width(), field.height(), field.visible_pixel_count());
//! ```

use std::path::Path;

use crate::error::DecodeError;

/// Grayscale value above which a pixel is considered too clear to render.
pub const BRIGHT_THRESHOLD: f32 = 220.0;

/// One raster pixel of a decoded portrait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    /// Column in the output image.
    pub x: u32,
    /// Row in the output image.
    pub y: u32,
    /// Mean of the RGB channels, 0-255. Zero for invisible samples.
    pub brightness: f32,
    /// Whether this pixel produces a point.
    pub visible: bool,
}

/// A decoded image as a dense grid of grayscale samples.
///
/// Samples are stored in row-major order, one per pixel, including the
/// invisible ones (so grid indexing stays trivial).
#[derive(Debug, Clone)]
pub struct PixelField {
    width: u32,
    height: u32,
    samples: Vec<PixelSample>,
    visible_count: usize,
}

impl PixelField {
    /// Load and decode an image file into a pixel field.
    ///
    /// When `max_dimension > 0` the image is resized so that the longer of
    /// width/height equals `max_dimension`, preserving aspect ratio. Zero
    /// keeps the native size.
    pub fn decode<P: AsRef<Path>>(path: P, max_dimension: u32) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        log::debug!("decoding image {}", path.display());

        let img = image::open(path)?;
        let img = if max_dimension > 0 {
            img.resize(
                max_dimension,
                max_dimension,
                image::imageops::FilterType::Triangle,
            )
        } else {
            img
        };

        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::from_rgba(rgba.as_raw(), width, height))
    }

    /// Build a pixel field from raw RGBA bytes (4 bytes per pixel).
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != width * height * 4`.
    pub fn from_rgba(data: &[u8], width: u32, height: u32) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "RGBA data size mismatch"
        );

        let mut samples = Vec::with_capacity((width * height) as usize);
        let mut visible_count = 0;

        for (i, px) in data.chunks_exact(4).enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;

            // A pixel with any transparency is never rendered.
            if px[3] < 255 {
                samples.push(PixelSample {
                    x,
                    y,
                    brightness: 0.0,
                    visible: false,
                });
                continue;
            }

            let brightness = (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0;
            if brightness > BRIGHT_THRESHOLD {
                samples.push(PixelSample {
                    x,
                    y,
                    brightness: 0.0,
                    visible: false,
                });
            } else {
                samples.push(PixelSample {
                    x,
                    y,
                    brightness,
                    visible: true,
                });
                visible_count += 1;
            }
        }

        Self {
            width,
            height,
            samples,
            visible_count,
        }
    }

    /// Width of the decoded image in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the decoded image in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels (`width * height`).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Number of samples that produce points.
    #[inline]
    pub fn visible_pixel_count(&self) -> usize {
        self.visible_count
    }

    /// All samples in row-major order.
    #[inline]
    pub fn samples(&self) -> &[PixelSample] {
        &self.samples
    }

    /// The sample at grid position `(x, y)`, if in bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<&PixelSample> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples.get((y * self.width + x) as usize)
    }

    /// Iterator over the visible samples only.
    pub fn visible(&self) -> impl Iterator<Item = &PixelSample> {
        self.samples.iter().filter(|s| s.visible)
    }
}
