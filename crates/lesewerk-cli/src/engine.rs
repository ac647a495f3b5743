// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognizer construction for the selected engine.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lesewerk_core::error::Result;
use lesewerk_document::{TesseractCli, TextRecognizer};
use tracing::{info, warn};

use crate::cli::Engine;

/// Build the recognizer for `engine`. Blocking: may start processes or load
/// model files.
///
/// `time_limit` bounds each tesseract run so a hung process is killed
/// rather than outliving its page.
pub fn build(
    engine: Engine,
    model_dir: Option<&Path>,
    time_limit: Option<Duration>,
) -> Result<Arc<dyn TextRecognizer>> {
    match engine {
        Engine::Tesseract => {
            if model_dir.is_some() {
                warn!("--model-dir only applies to the ocrs engine; ignoring it");
            }
            let tesseract = TesseractCli::new().with_time_limit(time_limit);
            tesseract.probe()?;
            let tesseract = tesseract.load_languages()?;
            info!(
                languages = tesseract.languages().map_or(0, |set| set.len()),
                "Using tesseract"
            );
            Ok(Arc::new(tesseract))
        }
        Engine::Ocrs => build_ocrs(model_dir),
    }
}

#[cfg(feature = "ocr")]
fn build_ocrs(model_dir: Option<&Path>) -> Result<Arc<dyn TextRecognizer>> {
    use lesewerk_document::OcrEngine;
    use lesewerk_document::scan::ocr::OcrConfig;

    let config = match model_dir {
        Some(dir) => OcrConfig::from_dir(dir),
        None => OcrConfig::default(),
    };
    info!("Using ocrs");
    Ok(Arc::new(OcrEngine::new(config)?))
}

#[cfg(not(feature = "ocr"))]
fn build_ocrs(_model_dir: Option<&Path>) -> Result<Arc<dyn TextRecognizer>> {
    Err(lesewerk_core::error::LesewerkError::RecognizerUnavailable(
        "this build of lesewerk was compiled without the `ocr` feature".into(),
    ))
}
