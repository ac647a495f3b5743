// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lesewerk: parallel OCR text extraction for scanned documents.
//
// Entry point. Parses arguments, initialises logging on stderr, builds the
// recognizer, and runs the extraction pipeline with a live progress line.
// Exit status: 0 on success (even with failed pages), 1 on a fatal error,
// 2 on a usage error.

mod cli;
mod engine;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::human_errors::{Severity, humanize_error};
use lesewerk_document::PdfSource;
use lesewerk_pipeline::{ExtractionReport, PipelineController, ProgressState};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(document = %cli.document.display(), "Lesewerk starting");

    match run(&cli).await {
        Ok(report) => {
            if !cli.quiet {
                eprintln!("{report}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("hint:  {}", human.suggestion);
            if human.severity == Severity::Internal {
                eprintln!("detail: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<ExtractionReport> {
    let config = cli.pipeline_config()?;
    let sink = cli.sink();

    let choice = cli.engine;
    let model_dir = cli.model_dir.clone();
    let time_limit = config.page_timeout();
    let recognizer =
        tokio::task::spawn_blocking(move || engine::build(choice, model_dir.as_deref(), time_limit))
        .await
        .map_err(|err| LesewerkError::WorkerPool(format!("recognizer setup failed: {err}")))??;

    let show_progress = !cli.quiet;
    let mut controller =
        PipelineController::new(config).with_observer(move |state: &ProgressState| {
            if show_progress {
                let mut stderr = std::io::stderr().lock();
                let _ = write!(stderr, "\r{state}");
                let _ = stderr.flush();
            }
        });

    let cancel = controller.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; abandoning the run");
            cancel.cancel();
        }
    });

    let source = Arc::new(PdfSource::new(cli.document.clone()));
    let outcome = controller.run(source, recognizer, Some(&sink)).await;
    interrupt.abort();

    if show_progress {
        // Finish the carriage-return progress line.
        eprintln!();
    }
    outcome
}
