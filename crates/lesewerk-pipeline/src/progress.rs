// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress tracking: completion counts, throughput and ETA.
//
// Updated once per finished page, in completion order, by the task that
// drains the result stream. Nothing here blocks a worker.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

/// Elapsed time is clamped to at least this many seconds so the first
/// completion does not report an absurd throughput.
const MIN_ELAPSED_SECS: f64 = 0.1;

/// Throughput floor used when estimating time remaining.
const MIN_THROUGHPUT: f64 = 0.001;

/// Snapshot of a run's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    /// Pages finished, successfully or not.
    pub completed: usize,
    /// Pages finished with text.
    pub succeeded: usize,
    /// Pages in the document.
    pub total: usize,
    /// Time since the tracker started.
    pub elapsed: Duration,
    /// Pages per second so far.
    pub throughput: f64,
    /// Estimated time until the last page finishes.
    pub eta: Duration,
}

impl ProgressState {
    fn initial(total: usize) -> Self {
        Self {
            completed: 0,
            succeeded: 0,
            total,
            elapsed: Duration::ZERO,
            throughput: 0.0,
            eta: Duration::ZERO,
        }
    }

    /// Completion as a percentage. An empty document counts as complete.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress: {:.1}% | Pages: {}/{} | {:.2} pages/sec | ETA: {:.1}s",
            self.percent(),
            self.completed,
            self.total,
            self.throughput,
            self.eta.as_secs_f64()
        )
    }
}

/// Counts completions against a fixed page total.
#[derive(Debug)]
pub struct ProgressTracker {
    started: Instant,
    state: ProgressState,
}

impl ProgressTracker {
    /// Start the clock now.
    pub fn new(total: usize) -> Self {
        Self::started_at(total, Instant::now())
    }

    pub fn started_at(total: usize, started: Instant) -> Self {
        Self {
            started,
            state: ProgressState::initial(total),
        }
    }

    /// Record one finished page, timed against the wall clock.
    pub fn on_completion(&mut self, succeeded: bool) -> &ProgressState {
        self.on_completion_at(succeeded, Instant::now())
    }

    /// Record one finished page at `now`.
    ///
    /// Completions past the total are ignored; the count never exceeds it.
    pub fn on_completion_at(&mut self, succeeded: bool, now: Instant) -> &ProgressState {
        if self.state.is_complete() {
            return &self.state;
        }

        let state = &mut self.state;
        state.completed += 1;
        if succeeded {
            state.succeeded += 1;
        }
        state.elapsed = now.saturating_duration_since(self.started);

        let secs = state.elapsed.as_secs_f64().max(MIN_ELAPSED_SECS);
        state.throughput = state.completed as f64 / secs;
        let remaining = state.total - state.completed;
        state.eta = if remaining == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(remaining as f64 / state.throughput.max(MIN_THROUGHPUT))
        };

        &self.state
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Receives a progress snapshot after every finished page.
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, state: &ProgressState);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressState) + Send,
{
    fn on_progress(&mut self, state: &ProgressState) {
        self(state)
    }
}

/// Observer that writes each snapshot to the debug log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, state: &ProgressState) {
        debug!(
            completed = state.completed,
            total = state.total,
            throughput = state.throughput,
            eta_secs = state.eta.as_secs_f64(),
            "{state}"
        );
    }
}
