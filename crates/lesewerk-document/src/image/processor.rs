// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor. Holds the few pixel operations a page needs between the
// renderer and the recognizer.

use image::{DynamicImage, RgbImage};
use tracing::instrument;

/// Image processing pipeline operating on a single in-memory page image.
///
/// ```ignore
/// let rgb = ImageProcessor::from_rgba_on_white(width, height, pixmap_bytes)?
///     .into_rgb8();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Composite premultiplied RGBA samples onto a white page.
    ///
    /// Unpainted page areas come out of the renderer fully transparent; OCR
    /// engines expect them white. Returns `None` when `rgba` does not hold
    /// exactly `width * height` pixels.
    #[instrument(skip(rgba), fields(bytes = rgba.len()))]
    pub fn from_rgba_on_white(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if rgba.len() != expected {
            return None;
        }
        let rgb: Vec<u8> = rgba
            .chunks_exact(4)
            .flat_map(|px| {
                let background = 255 - px[3];
                [
                    px[0].saturating_add(background),
                    px[1].saturating_add(background),
                    px[2].saturating_add(background),
                ]
            })
            .collect();
        RgbImage::from_raw(width, height, rgb).map(|image| Self {
            image: DynamicImage::ImageRgb8(image),
        })
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the processor and return 8-bit RGB pixels, the layout every
    /// recognizer backend reads.
    pub fn into_rgb8(self) -> RgbImage {
        match self.image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.into_rgb8(),
        }
    }
}
