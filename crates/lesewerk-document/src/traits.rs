// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator traits consumed by the extraction pipeline.
//
// The pipeline never touches a PDF library or an OCR engine directly. It
// opens page handles through a `DocumentSource` and reads text through a
// `TextRecognizer`, so tests can drive it with scripted fakes.

use image::{DynamicImage, RgbImage};
use lesewerk_core::error::{PageError, Result};

/// Opens independent handles to one paginated document.
///
/// Each worker opens its own handle; handles are never shared across
/// threads, so a page renderer does not have to be thread-safe.
pub trait DocumentSource: Send + Sync {
    /// Open a fresh handle. Fails with `LesewerkError::DocumentOpen` when the
    /// source is unreadable or corrupt.
    fn open(&self) -> Result<Box<dyn PageDocument>>;

    /// Short description for logs (usually the file path).
    fn describe(&self) -> String;
}

/// One open handle to a paginated document.
pub trait PageDocument: Send {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Render page `page_index` (zero-based) at `resolution_dpi`.
    fn render_page(
        &mut self,
        page_index: usize,
        resolution_dpi: f32,
    ) -> std::result::Result<DynamicImage, PageError>;
}

/// Turns a page image into text.
///
/// One recognizer is shared by every worker, so implementations must be
/// callable concurrently.
pub trait TextRecognizer: Send + Sync {
    /// Engine name for logs and error messages.
    fn name(&self) -> &str;

    /// Whether this engine can read `language`. Checked once before any page
    /// is dispatched.
    fn supports_language(&self, language: &str) -> bool;

    /// Recognise the text on one page.
    fn recognize(
        &self,
        page_index: usize,
        image: &RgbImage,
        language: &str,
    ) -> std::result::Result<String, PageError>;
}
