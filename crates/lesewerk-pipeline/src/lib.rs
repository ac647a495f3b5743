// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lesewerk pipeline: parallel page-level text extraction.
//
// A `PipelineController` opens a document, sizes a worker pool from the
// `HardwareProfile`, runs every page through the `Dispatcher`, and joins
// the completion-ordered results back into page order with the
// `ResultAssembler` while the `ProgressTracker` reports throughput.

pub mod assemble;
pub mod controller;
pub mod dispatch;
pub mod hardware;
pub mod progress;

#[cfg(test)]
pub(crate) mod testing;

pub use assemble::ResultAssembler;
pub use controller::{ExtractionReport, OutputSink, PipelineController, PipelineState};
pub use dispatch::{CancelHandle, Dispatcher, ResultStream};
pub use hardware::HardwareProfile;
pub use progress::{LogProgress, ProgressObserver, ProgressState, ProgressTracker};
