// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Lesewerk extraction pipeline.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PageError;

/// One page of work: render page `page_index` at `resolution_dpi` and read it
/// in `language`.
///
/// Tasks are immutable once built; the dispatcher hands each one to exactly
/// one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTask {
    page_index: usize,
    resolution_dpi: f32,
    language: Arc<str>,
}

impl PageTask {
    pub fn new(page_index: usize, resolution_dpi: f32, language: Arc<str>) -> Self {
        Self {
            page_index,
            resolution_dpi,
            language,
        }
    }

    /// Build one task per page of a `page_count`-page document, in page order.
    pub fn for_document(page_count: usize, resolution_dpi: f32, language: &str) -> Vec<Self> {
        let language: Arc<str> = Arc::from(language);
        (0..page_count)
            .map(|page_index| Self::new(page_index, resolution_dpi, Arc::clone(&language)))
            .collect()
    }

    /// Zero-based page index.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Rendering resolution in dots per inch.
    pub fn resolution_dpi(&self) -> f32 {
        self.resolution_dpi
    }

    /// Recognizer language tag (e.g. `eng`, `deu+eng`).
    pub fn language(&self) -> &str {
        &self.language
    }
}

/// What happened to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageOutcome {
    /// Text was recognised (possibly empty for a blank page).
    Recognized(String),
    /// The page could not be rendered or read.
    Failed(PageError),
}

/// The single result produced for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub page_index: usize,
    pub outcome: PageOutcome,
    /// Wall-clock time the worker spent on this page.
    pub elapsed: Duration,
}

impl PageResult {
    pub fn recognized(page_index: usize, text: String, elapsed: Duration) -> Self {
        Self {
            page_index,
            outcome: PageOutcome::Recognized(text),
            elapsed,
        }
    }

    /// A failed page; the index is taken from the error.
    pub fn failed(error: PageError, elapsed: Duration) -> Self {
        Self {
            page_index: error.page_index(),
            outcome: PageOutcome::Failed(error),
            elapsed,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, PageOutcome::Recognized(_))
    }

    /// Recognised text, or the empty string for a failed page.
    pub fn text(&self) -> &str {
        match &self.outcome {
            PageOutcome::Recognized(text) => text,
            PageOutcome::Failed(_) => "",
        }
    }

    pub fn error(&self) -> Option<&PageError> {
        match &self.outcome {
            PageOutcome::Recognized(_) => None,
            PageOutcome::Failed(err) => Some(err),
        }
    }
}
