// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract recognizer: drives the `tesseract` command-line tool.
//
// Each page is written to a private scratch directory as a PNG and read back
// with `tesseract <png> <base> -l <language>`, which leaves the text in
// `<base>.txt`. Nothing is kept after the call: the directory is removed when
// the page is done, success or not.
//
// With a time limit set, a tesseract process still running at the deadline
// is killed and the page fails with `PageError::Timeout`.
//
// Language tags follow tesseract's own syntax, including combinations such
// as `deu+eng`. Installed languages can be queried up front with
// [`TesseractCli::load_languages`] so a missing traineddata file is reported
// once, before any page is dispatched.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use image::{ImageFormat, RgbImage};
use lesewerk_core::error::{LesewerkError, PageError, Result};
use tracing::{debug, info, instrument, warn};

use crate::traits::TextRecognizer;

/// Default executable name, resolved through `PATH`.
const DEFAULT_BINARY: &str = "tesseract";

/// How often a running tesseract is checked against its deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Text recognizer backed by the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    /// Executable to run.
    binary: PathBuf,
    /// Extra arguments appended after `-l <language>` (e.g. `--psm 1`).
    extra_args: Vec<String>,
    /// Installed languages, when known.
    languages: Option<BTreeSet<String>>,
    /// Kill tesseract after this long.
    time_limit: Option<Duration>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractCli {
    /// Use the `tesseract` found on `PATH`.
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_BINARY)
    }

    /// Use a specific executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
            languages: None,
            time_limit: None,
        }
    }

    /// Append extra command-line arguments to every invocation.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Declare the installed languages instead of asking the binary.
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = Some(languages.into_iter().map(Into::into).collect());
        self
    }

    /// Kill any recognition still running after `limit`.
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    /// Check that the executable can be started.
    pub fn probe(&self) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|err| {
                LesewerkError::RecognizerUnavailable(format!(
                    "cannot run {}: {err}",
                    self.binary.display()
                ))
            })?;
        if !output.status.success() {
            return Err(LesewerkError::RecognizerUnavailable(format!(
                "{} --version exited with {}",
                self.binary.display(),
                output.status
            )));
        }
        Ok(())
    }

    /// Ask the executable which languages are installed and remember them.
    #[instrument(skip(self), fields(binary = %self.binary.display()))]
    pub fn load_languages(mut self) -> Result<Self> {
        let output = Command::new(&self.binary)
            .arg("--list-langs")
            .output()
            .map_err(|err| {
                LesewerkError::RecognizerUnavailable(format!(
                    "cannot run {}: {err}",
                    self.binary.display()
                ))
            })?;
        if !output.status.success() {
            return Err(LesewerkError::RecognizerUnavailable(format!(
                "{} --list-langs exited with {}",
                self.binary.display(),
                output.status
            )));
        }

        // Older releases print the list on stderr.
        let mut listing = String::from_utf8_lossy(&output.stdout).into_owned();
        listing.push_str(&String::from_utf8_lossy(&output.stderr));
        let languages = parse_language_list(&listing);
        info!(count = languages.len(), "Tesseract languages loaded");
        self.languages = Some(languages);
        Ok(self)
    }

    /// Installed languages, if they have been loaded or declared.
    pub fn languages(&self) -> Option<&BTreeSet<String>> {
        self.languages.as_ref()
    }
}

/// Parse `tesseract --list-langs` output: a header line followed by one
/// language code per line.
fn parse_language_list(listing: &str) -> BTreeSet<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .filter(|line| !line.contains(' '))
        .map(str::to_string)
        .collect()
}

impl TextRecognizer for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn supports_language(&self, language: &str) -> bool {
        match &self.languages {
            Some(installed) => language
                .split('+')
                .all(|part| !part.is_empty() && installed.contains(part)),
            // Unknown until tesseract runs; a missing language then fails per page.
            None => !language.trim().is_empty(),
        }
    }

    fn recognize(
        &self,
        page_index: usize,
        image: &RgbImage,
        language: &str,
    ) -> std::result::Result<String, PageError> {
        let fail = |reason: String| PageError::Recognition { page_index, reason };

        let scratch = tempfile::Builder::new()
            .prefix("lesewerk-page-")
            .tempdir()
            .map_err(|err| fail(format!("cannot create scratch directory: {err}")))?;
        let png = scratch.path().join("page.png");
        let base = scratch.path().join("page");
        image
            .save_with_format(&png, ImageFormat::Png)
            .map_err(|err| fail(format!("cannot write scratch image: {err}")))?;
        let stderr_path = scratch.path().join("stderr.log");
        let stderr = File::create(&stderr_path)
            .map_err(|err| fail(format!("cannot create scratch log: {err}")))?;

        let child = Command::new(&self.binary)
            .arg(&png)
            .arg(&base)
            .arg("-l")
            .arg(language)
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr)
            .spawn()
            .map_err(|err| fail(format!("cannot run {}: {err}", self.binary.display())))?;

        let status = match self.wait(child).map_err(|err| fail(format!("waiting for tesseract: {err}")))? {
            Some(status) => status,
            None => {
                let after = self.time_limit.unwrap_or_default();
                warn!(page_index, limit_secs = after.as_secs_f64(), "Tesseract killed at its time limit");
                return Err(PageError::Timeout { page_index, after });
            }
        };

        if !status.success() {
            let log = std::fs::read_to_string(&stderr_path).unwrap_or_default();
            let detail = log
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no diagnostic output");
            return Err(fail(format!("tesseract exited with {status}: {detail}")));
        }

        let text = std::fs::read_to_string(base.with_extension("txt"))
            .map_err(|err| fail(format!("tesseract left no text output: {err}")))?;
        debug!(page_index, chars = text.len(), "Tesseract recognition complete");
        Ok(text)
    }
}

impl TesseractCli {
    /// Wait for `child`, killing it at the time limit. `None` means it was
    /// killed.
    fn wait(&self, mut child: Child) -> std::io::Result<Option<ExitStatus>> {
        let Some(limit) = self.time_limit else {
            return child.wait().map(Some);
        };
        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                // Already exited between the checks is fine; reap either way.
                let _ = child.kill();
                child.wait()?;
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
