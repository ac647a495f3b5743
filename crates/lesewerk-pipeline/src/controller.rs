// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline controller: drives one extraction run from opening the document
// to writing the assembled text.
//
//   Opening -> Sizing -> Dispatching -> Aggregating -> Finalizing -> Done
//
// Any fatal error moves the run to `Failed`. Page failures are not fatal;
// they are recorded and reported in the summary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lesewerk_core::config::PipelineConfig;
use lesewerk_core::error::{LesewerkError, PageError, Result};
use lesewerk_core::types::PageTask;
use lesewerk_document::{DocumentSource, PageDocument, TextRecognizer};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument, warn};

use crate::assemble::ResultAssembler;
use crate::dispatch::{CancelHandle, Dispatcher};
use crate::hardware::HardwareProfile;
use crate::progress::{LogProgress, ProgressObserver, ProgressTracker};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Opening,
    Sizing,
    Dispatching,
    Aggregating,
    Finalizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Sizing => "sizing",
            Self::Dispatching => "dispatching",
            Self::Aggregating => "aggregating",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Destination for the assembled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Created or truncated, then written as UTF-8.
    File(PathBuf),
    Stdout,
}

impl OutputSink {
    /// `<stem>.txt` in the current directory.
    pub fn beside_cwd(document: &Path) -> Self {
        let stem = document
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "output".to_string());
        Self::File(PathBuf::from(format!("{stem}.txt")))
    }

    /// Parse a command-line destination; `-` means standard output.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdout
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    pub async fn write(&self, text: &str) -> Result<()> {
        match self {
            Self::File(path) => {
                tokio::fs::write(path, text.as_bytes()).await?;
                info!(path = %path.display(), bytes = text.len(), "Output written");
            }
            Self::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(text.as_bytes()).await?;
                if !text.ends_with('\n') {
                    stdout.write_all(b"\n").await?;
                }
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdout => f.write_str("<stdout>"),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// Page texts in page order, joined by the configured separator.
    pub text: String,
    pub total_pages: usize,
    pub succeeded_pages: usize,
    /// One entry per failed page, in page order.
    pub failed_pages: Vec<PageError>,
    pub elapsed: Duration,
    pub pages_per_second: f64,
    pub hardware: HardwareProfile,
    pub state: PipelineState,
}

impl ExtractionReport {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed_pages.iter().map(PageError::page_index).collect()
    }
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pages processed:  {}", self.total_pages)?;
        writeln!(f, "Pages recognised: {}", self.succeeded_pages)?;
        if !self.failed_pages.is_empty() {
            let indices: Vec<String> = self
                .failed_indices()
                .iter()
                .map(ToString::to_string)
                .collect();
            writeln!(f, "Failed pages:     {}", indices.join(", "))?;
        }
        writeln!(f, "Elapsed:          {:.2}s", self.elapsed.as_secs_f64())?;
        write!(f, "Throughput:       {:.2} pages/sec", self.pages_per_second)
    }
}

/// Runs extractions with one configuration.
pub struct PipelineController {
    config: PipelineConfig,
    observer: Box<dyn ProgressObserver>,
    cancel: CancelHandle,
    state: PipelineState,
}

impl PipelineController {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            observer: Box::new(LogProgress),
            cancel: CancelHandle::new(),
            state: PipelineState::Idle,
        }
    }

    /// Replace the default (debug log) progress observer.
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Handle for cancelling the run from another task.
    ///
    /// Cancellation is permanent: later runs on this controller fail at once.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "Pipeline state");
        self.state = next;
    }

    /// Extract the text of every page of `source`.
    ///
    /// Writes the text to `sink` when one is given. Runs can be repeated;
    /// each run rereads the document and recomputes every page.
    #[instrument(skip_all, fields(document = %source.describe(), engine = recognizer.name()))]
    pub async fn run(
        &mut self,
        source: Arc<dyn DocumentSource>,
        recognizer: Arc<dyn TextRecognizer>,
        sink: Option<&OutputSink>,
    ) -> Result<ExtractionReport> {
        match self.execute(source, recognizer, sink).await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.transition(PipelineState::Failed);
                error!(error = %err, "Extraction failed");
                Err(err)
            }
        }
    }

    async fn execute(
        &mut self,
        source: Arc<dyn DocumentSource>,
        recognizer: Arc<dyn TextRecognizer>,
        sink: Option<&OutputSink>,
    ) -> Result<ExtractionReport> {
        self.transition(PipelineState::Opening);
        self.config.validate()?;
        let document = {
            let source = Arc::clone(&source);
            tokio::task::spawn_blocking(move || source.open())
                .await
                .map_err(|err| LesewerkError::WorkerPool(format!("document open task failed: {err}")))??
        };

        self.transition(PipelineState::Sizing);
        let total_pages = document.page_count();
        let hardware = HardwareProfile::detect(self.config.worker_count);
        if !recognizer.supports_language(&self.config.language) {
            return Err(LesewerkError::UnsupportedLanguage {
                language: self.config.language.clone(),
                engine: recognizer.name().to_string(),
            });
        }
        let mut tracker = ProgressTracker::new(total_pages);
        let mut assembler = ResultAssembler::new(total_pages, self.config.page_separator.clone());
        info!(
            pages = total_pages,
            workers = hardware.worker_count,
            dpi = self.config.resolution_dpi,
            language = %self.config.language,
            "Starting extraction"
        );

        if total_pages > 0 {
            self.dispatch(document, source, recognizer, &hardware, &mut tracker, &mut assembler)
                .await?;
        } else {
            info!("Document has no pages");
        }

        self.transition(PipelineState::Finalizing);
        let text = assembler.finalize()?;
        if let Some(sink) = sink {
            sink.write(&text).await?;
        }

        let elapsed = tracker.elapsed();
        let report = ExtractionReport {
            text,
            total_pages,
            succeeded_pages: assembler.succeeded(),
            failed_pages: assembler.failures(),
            elapsed,
            pages_per_second: total_pages as f64 / elapsed.as_secs_f64().max(0.001),
            hardware,
            state: PipelineState::Done,
        };
        self.transition(PipelineState::Done);
        info!(
            pages = report.total_pages,
            recognised = report.succeeded_pages,
            failed = report.failed_pages.len(),
            elapsed_secs = report.elapsed.as_secs_f64(),
            pages_per_second = report.pages_per_second,
            "Extraction complete"
        );
        Ok(report)
    }

    /// Dispatching and Aggregating: run every page and fill the assembler.
    async fn dispatch(
        &mut self,
        document: Box<dyn PageDocument>,
        source: Arc<dyn DocumentSource>,
        recognizer: Arc<dyn TextRecognizer>,
        hardware: &HardwareProfile,
        tracker: &mut ProgressTracker,
        assembler: &mut ResultAssembler,
    ) -> Result<()> {
        self.transition(PipelineState::Dispatching);
        let tasks = PageTask::for_document(
            assembler.page_count(),
            self.config.resolution_dpi,
            &self.config.language,
        );
        let dispatcher = Dispatcher::new(source, recognizer, hardware.worker_count)
            .with_page_timeout(self.config.page_timeout())
            .with_cancel_handle(self.cancel.clone());
        let mut stream = dispatcher.submit_all_with(tasks, Some(document));

        self.transition(PipelineState::Aggregating);
        let cancel = self.cancel.clone();
        while !assembler.is_complete() {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = stream.next() => Some(next),
            };
            let Some(next) = next else {
                stream.abort();
                warn!(completed = assembler.recorded(), "Extraction cancelled");
                return Err(LesewerkError::Cancelled);
            };
            // Workers only stop early if the pool broke; finalize reports the gaps.
            let Some(result) = next else { break };

            if let Some(err) = result.error() {
                warn!(page_index = err.page_index(), stage = err.stage(), error = %err, "Page failed");
            }
            let succeeded = result.succeeded();
            if let Err(err) = assembler.record(result) {
                stream.abort();
                return Err(err);
            }
            self.observer.on_progress(tracker.on_completion(succeeded));
        }

        stream.join().await
    }
}
