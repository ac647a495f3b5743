// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open a PDF with `hayro`, count its pages, and render each page
// to a pixel image at the requested resolution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hayro::{InterpreterSettings, Pdf, RenderSettings};
use image::DynamicImage;
use lesewerk_core::error::{LesewerkError, PageError, Result};
use tracing::{debug, info, instrument};

use crate::image::ImageProcessor;
use crate::traits::{DocumentSource, PageDocument};

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Largest page raster, in pixels, a render may allocate.
pub const MAX_PAGE_PIXELS: f32 = 250_000_000.0;

/// Reads pages of an existing PDF file.
///
/// Wraps `hayro::Pdf`. Every page is rendered in full (scanned images in any
/// PDF codec, vector art and text alike) with `/Rotate` applied, then flattened
/// onto white.
pub struct PdfReader {
    /// The parsed document.
    pdf: Pdf,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        debug!("Opening PDF: {}", path_ref.display());

        let open_err = |reason: String| LesewerkError::DocumentOpen {
            path: path_ref.display().to_string(),
            reason,
        };
        let data = std::fs::read(path_ref).map_err(|err| open_err(err.to_string()))?;
        let pdf = Self::parse(data).map_err(open_err)?;
        Ok(Self::from_pdf(pdf, Some(path_ref.display().to_string())))
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let pdf = Self::parse(data.to_vec()).map_err(|reason| LesewerkError::DocumentOpen {
            path: "<memory>".into(),
            reason,
        })?;
        Ok(Self::from_pdf(pdf, None))
    }

    fn parse(data: Vec<u8>) -> std::result::Result<Pdf, String> {
        Pdf::new(Arc::new(data)).map_err(|err| format!("failed to parse PDF: {err:?}"))
    }

    fn from_pdf(pdf: Pdf, source_path: Option<String>) -> Self {
        debug!(pages = pdf.pages().len(), "PDF loaded");
        Self { pdf, source_path }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pdf.pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Rendering ------------------------------------------------------------

    /// Render page `page_index` (zero-based) at `resolution_dpi`.
    ///
    /// Fails with `PageError::Render` for a missing page, a degenerate media
    /// box, or a raster larger than [`MAX_PAGE_PIXELS`].
    #[instrument(skip(self))]
    pub fn render(
        &self,
        page_index: usize,
        resolution_dpi: f32,
    ) -> std::result::Result<DynamicImage, PageError> {
        let render_err = |reason: String| PageError::Render { page_index, reason };

        let page = self.pdf.pages().get(page_index).ok_or_else(|| {
            render_err(format!(
                "page out of range (document has {} pages)",
                self.page_count()
            ))
        })?;

        let media_box = page.media_box();
        let width_pt = (media_box.x1 - media_box.x0).abs() as f32;
        let height_pt = (media_box.y1 - media_box.y0).abs() as f32;
        if !(width_pt > 0.0 && height_pt > 0.0) {
            return Err(render_err(format!(
                "invalid page size {width_pt} x {height_pt} pt"
            )));
        }

        let scale = resolution_dpi / POINTS_PER_INCH;
        let (width_px, height_px) = (width_pt * scale, height_pt * scale);
        let too_wide = width_px.max(height_px) > f32::from(u16::MAX);
        if too_wide || width_px * height_px > MAX_PAGE_PIXELS {
            return Err(render_err(format!(
                "{width_px:.0} x {height_px:.0} px at {resolution_dpi} dpi exceeds the page raster limit"
            )));
        }

        let settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            ..Default::default()
        };
        let pixmap = hayro::render(page, &InterpreterSettings::default(), &settings);
        let processor = ImageProcessor::from_rgba_on_white(
            u32::from(pixmap.width()),
            u32::from(pixmap.height()),
            pixmap.data_as_u8_slice(),
        )
        .ok_or_else(|| render_err("renderer returned a malformed pixmap".into()))?;

        debug!(
            width = processor.width(),
            height = processor.height(),
            "Page rendered"
        );
        Ok(processor.into_dynamic())
    }
}

impl PageDocument for PdfReader {
    fn page_count(&self) -> usize {
        PdfReader::page_count(self)
    }

    fn render_page(
        &mut self,
        page_index: usize,
        resolution_dpi: f32,
    ) -> std::result::Result<DynamicImage, PageError> {
        self.render(page_index, resolution_dpi)
    }
}

/// A PDF on disk. Every [`open`](DocumentSource::open) parses the file into an
/// independent [`PdfReader`], so workers never share a handle.
#[derive(Debug, Clone)]
pub struct PdfSource {
    path: PathBuf,
}

impl PdfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for PdfSource {
    fn open(&self) -> Result<Box<dyn PageDocument>> {
        let reader = PdfReader::open(&self.path)?;
        info!(
            path = %self.path.display(),
            pages = reader.page_count(),
            "PDF handle opened"
        );
        Ok(Box::new(reader))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
