// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lesewerk-document: Page sources and text recognizers for the Lesewerk
// extraction pipeline.
//
// Provides the collaborator traits the pipeline is written against, a PDF
// page renderer, pixel format conversion, and OCR
// backends (tesseract, and ocrs behind the "ocr" feature).

pub mod image;
pub mod pdf;
pub mod scan;
pub mod traits;

// Re-export the primary structs so callers can use `lesewerk_document::PdfSource` etc.
pub use self::image::processor::ImageProcessor;
pub use pdf::reader::{PdfReader, PdfSource};
pub use scan::tesseract::TesseractCli;
pub use traits::{DocumentSource, PageDocument, TextRecognizer};

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrEngine;
