// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Lesewerk.
//
// Two layers: `LesewerkError` is raised to the caller and aborts a run,
// while `PageError` describes a single page that could not be read and is
// carried as data inside a `PageResult`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all Lesewerk operations.
#[derive(Debug, Error)]
pub enum LesewerkError {
    // -- Document errors --
    #[error("cannot open document {path}: {reason}")]
    DocumentOpen { path: String, reason: String },

    // -- Assembly invariants --
    #[error("page {page_index} produced more than one result")]
    DuplicateResult { page_index: usize },

    #[error("{} of {total} pages have no result (first missing: {})", missing.len(), missing.first().copied().unwrap_or_default())]
    IncompleteResults { missing: Vec<usize>, total: usize },

    // -- Recognition setup --
    #[error("recognizer `{engine}` cannot read language `{language}`")]
    UnsupportedLanguage { language: String, engine: String },

    #[error("recognizer unavailable: {0}")]
    RecognizerUnavailable(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Run control --
    #[error("extraction cancelled")]
    Cancelled,

    #[error("worker pool failure: {0}")]
    WorkerPool(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LesewerkError>;

/// Why a single page produced no text.
///
/// Page errors never abort a run; they are recorded in the page's result and
/// reported in the final summary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PageError {
    #[error("page {page_index}: rendering failed: {reason}")]
    Render { page_index: usize, reason: String },

    #[error("page {page_index}: recognition failed: {reason}")]
    Recognition { page_index: usize, reason: String },

    #[error("page {page_index}: timed out after {:.1}s", after.as_secs_f64())]
    Timeout { page_index: usize, after: Duration },

    #[error("page {page_index}: worker panicked")]
    WorkerPanicked { page_index: usize },
}

impl PageError {
    /// The page this error belongs to.
    pub fn page_index(&self) -> usize {
        match self {
            Self::Render { page_index, .. }
            | Self::Recognition { page_index, .. }
            | Self::Timeout { page_index, .. }
            | Self::WorkerPanicked { page_index } => *page_index,
        }
    }

    /// Short stage label for logs and summaries.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Render { .. } => "render",
            Self::Recognition { .. } => "recognize",
            Self::Timeout { .. } => "timeout",
            Self::WorkerPanicked { .. } => "worker",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_results_names_first_missing_page() {
        let err = LesewerkError::IncompleteResults {
            missing: vec![3, 7],
            total: 10,
        };
        assert_eq!(
            err.to_string(),
            "2 of 10 pages have no result (first missing: 3)"
        );
    }

    #[test]
    fn page_error_reports_index_and_stage() {
        let err = PageError::Timeout {
            page_index: 4,
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.page_index(), 4);
        assert_eq!(err.stage(), "timeout");
        assert_eq!(err.to_string(), "page 4: timed out after 1.5s");
    }
}
