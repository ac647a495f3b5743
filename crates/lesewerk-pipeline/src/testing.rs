// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted documents and recognizers for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use lesewerk_core::error::{LesewerkError, PageError, Result};
use lesewerk_document::{DocumentSource, PageDocument, TextRecognizer};

/// A document whose pages take scripted times and can fail or panic.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    pub pages: usize,
    pub delays: HashMap<usize, Duration>,
    pub render_failures: HashSet<usize>,
    pub panics: HashSet<usize>,
    pub unopenable: bool,
    pub opens: Arc<AtomicUsize>,
    pub renders: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn delay(mut self, page: usize, delay: Duration) -> Self {
        self.delays.insert(page, delay);
        self
    }

    pub fn fail_render(mut self, page: usize) -> Self {
        self.render_failures.insert(page);
        self
    }

    pub fn panic_on(mut self, page: usize) -> Self {
        self.panics.insert(page);
        self
    }

    pub fn unopenable(mut self) -> Self {
        self.unopenable = true;
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl DocumentSource for ScriptedSource {
    fn open(&self) -> Result<Box<dyn PageDocument>> {
        if self.unopenable {
            return Err(LesewerkError::DocumentOpen {
                path: self.describe(),
                reason: "not a PDF".into(),
            });
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedDocument {
            script: self.clone(),
        }))
    }

    fn describe(&self) -> String {
        format!("scripted:{}", self.pages)
    }
}

struct ScriptedDocument {
    script: ScriptedSource,
}

impl PageDocument for ScriptedDocument {
    fn page_count(&self) -> usize {
        self.script.pages
    }

    fn render_page(
        &mut self,
        page_index: usize,
        resolution_dpi: f32,
    ) -> std::result::Result<DynamicImage, PageError> {
        self.script.renders.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.script.delays.get(&page_index) {
            std::thread::sleep(*delay);
        }
        if self.script.panics.contains(&page_index) {
            panic!("scripted panic on page {page_index}");
        }
        if self.script.render_failures.contains(&page_index) {
            return Err(PageError::Render {
                page_index,
                reason: "scripted render failure".into(),
            });
        }
        // One inch square, shaded by page so the recognizer can check it.
        let side = resolution_dpi.round().max(1.0) as u32;
        let shade = (page_index % 256) as u8;
        Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            side,
            side,
            Luma([shade]),
        )))
    }
}

/// Reads back the page shade as `page <index>`.
///
/// Also gauges how many recognitions run at once.
#[derive(Default)]
pub struct EchoRecognizer {
    pub languages: Vec<String>,
    pub failures: HashSet<usize>,
    pub hold: Option<Duration>,
    pub calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl EchoRecognizer {
    pub fn new() -> Self {
        Self {
            languages: vec!["eng".into()],
            ..Self::default()
        }
    }

    pub fn fail_on(mut self, page: usize) -> Self {
        self.failures.insert(page);
        self
    }

    /// Spend `hold` inside every recognition.
    pub fn hold_for(mut self, hold: Duration) -> Self {
        self.hold = Some(hold);
        self
    }

    /// Most recognitions ever in flight at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for EchoRecognizer {
    fn name(&self) -> &str {
        "echo"
    }

    fn supports_language(&self, language: &str) -> bool {
        self.languages.iter().any(|known| known == language)
    }

    fn recognize(
        &self,
        page_index: usize,
        image: &RgbImage,
        _language: &str,
    ) -> std::result::Result<String, PageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        if let Some(hold) = self.hold {
            std::thread::sleep(hold);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failures.contains(&page_index) {
            return Err(PageError::Recognition {
                page_index,
                reason: "scripted recognition failure".into(),
            });
        }
        let shade = image.get_pixel(0, 0).0[0];
        Ok(format!("page {shade}"))
    }
}
