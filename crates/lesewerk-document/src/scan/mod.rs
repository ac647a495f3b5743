// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition backends: the `tesseract` command-line engine, and the
// pure-Rust `ocrs` engine behind the `ocr` feature.

pub mod tesseract;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use tesseract::TesseractCli;

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
