// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LesewerkError, Result};

/// Default rendering resolution in dots per inch.
pub const DEFAULT_RESOLUTION_DPI: f32 = 300.0;

/// Default recognizer language tag.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Highest accepted rendering resolution. A letter page at this setting is
/// already 20400 x 26400 pixels.
pub const MAX_RESOLUTION_DPI: f32 = 2400.0;

/// Boundary placed between consecutive pages in the final text.
pub const DEFAULT_PAGE_SEPARATOR: &str = "\n\n";

/// Settings for one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rendering resolution in dots per inch.
    pub resolution_dpi: f32,
    /// Recognizer language tag.
    pub language: String,
    /// Explicit worker count. Overrides hardware detection when set.
    pub worker_count: Option<usize>,
    /// Per-page time limit in seconds. No limit when unset.
    pub page_timeout_secs: Option<u64>,
    /// Text inserted between pages.
    pub page_separator: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resolution_dpi: DEFAULT_RESOLUTION_DPI,
            language: DEFAULT_LANGUAGE.to_string(),
            worker_count: None,
            page_timeout_secs: None,
            page_separator: DEFAULT_PAGE_SEPARATOR.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.resolution_dpi.is_finite() || self.resolution_dpi <= 0.0 {
            return Err(LesewerkError::InvalidConfig(format!(
                "resolution must be a positive number, got {}",
                self.resolution_dpi
            )));
        }
        if self.resolution_dpi > MAX_RESOLUTION_DPI {
            return Err(LesewerkError::InvalidConfig(format!(
                "resolution {} dpi is above the {MAX_RESOLUTION_DPI} dpi limit",
                self.resolution_dpi
            )));
        }
        if self.language.trim().is_empty() {
            return Err(LesewerkError::InvalidConfig(
                "language tag must not be empty".into(),
            ));
        }
        if self.worker_count == Some(0) {
            return Err(LesewerkError::InvalidConfig(
                "worker count must be at least 1".into(),
            ));
        }
        if self.page_timeout_secs == Some(0) {
            return Err(LesewerkError::InvalidConfig(
                "page timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }

    pub fn page_timeout(&self) -> Option<Duration> {
        self.page_timeout_secs.map(Duration::from_secs)
    }
}
