// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page dispatcher: a fixed pool of workers draining a shared task queue.
//
// Each worker is a tokio task that owns its own document handle, pulls the
// next page from the queue, and runs render + recognize on the blocking
// pool. Results are sent back as soon as they exist, so the receiving side
// sees them in completion order, not page order.
//
// Failure isolation:
// - a page error (render or recognize) becomes a failed `PageResult`;
// - a panic inside the blocking job becomes `PageError::WorkerPanicked`,
//   and the worker opens a fresh handle for its next page;
// - a page exceeding the timeout becomes `PageError::Timeout`; the job is
//   abandoned and its handle with it.
// In every case the page still gets exactly one result.
//
// A blocking job only starts once it holds one of `worker_count` permits and
// keeps it until the job itself returns. An abandoned job therefore still
// occupies its slot, and timeouts never push concurrency past the pool size.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lesewerk_core::error::{LesewerkError, PageError, Result};
use lesewerk_core::types::{PageOutcome, PageResult, PageTask};
use lesewerk_document::{DocumentSource, ImageProcessor, PageDocument, TextRecognizer};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

/// Shared cancellation flag for a run.
///
/// Cloning is cheap; every clone observes the same flag. Once cancelled,
/// workers take no further pages and in-flight results are discarded.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives in `self`, so this only errors if it is dropped mid-wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Queue of pages not yet claimed by a worker.
type TaskQueue = Arc<Mutex<VecDeque<PageTask>>>;

/// State every worker shares.
struct WorkerContext {
    source: Arc<dyn DocumentSource>,
    recognizer: Arc<dyn TextRecognizer>,
    queue: TaskQueue,
    page_timeout: Option<Duration>,
    cancel: CancelHandle,
    /// One permit per running page job.
    slots: Arc<Semaphore>,
}

impl WorkerContext {
    fn next_task(&self) -> Option<PageTask> {
        if self.cancel.is_cancelled() {
            return None;
        }
        // A poisoned queue only means another worker panicked while popping;
        // the VecDeque itself is still consistent.
        let mut queue = self
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        queue.pop_front()
    }

    /// Wait for a free job slot. `None` once the run is cancelled.
    async fn claim_slot(&self) -> Option<OwnedSemaphorePermit> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = Arc::clone(&self.slots).acquire_owned() => permit.ok(),
        }
    }
}

/// Runs page tasks on a fixed number of workers.
pub struct Dispatcher {
    source: Arc<dyn DocumentSource>,
    recognizer: Arc<dyn TextRecognizer>,
    worker_count: usize,
    page_timeout: Option<Duration>,
    cancel: CancelHandle,
}

impl Dispatcher {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        recognizer: Arc<dyn TextRecognizer>,
        worker_count: usize,
    ) -> Self {
        Self {
            source,
            recognizer,
            worker_count: worker_count.max(1),
            page_timeout: None,
            cancel: CancelHandle::new(),
        }
    }

    /// Give up on any page that runs longer than `timeout`.
    pub fn with_page_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.page_timeout = timeout;
        self
    }

    /// Share an existing cancellation flag instead of a private one.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Submit every task and start the workers.
    pub fn submit_all(&self, tasks: Vec<PageTask>) -> ResultStream {
        self.submit_all_with(tasks, None)
    }

    /// Like [`submit_all`](Self::submit_all), handing an already-open
    /// document handle to the first worker.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip_all, fields(pages = tasks.len(), workers = self.worker_count))]
    pub fn submit_all_with(
        &self,
        tasks: Vec<PageTask>,
        primed: Option<Box<dyn PageDocument>>,
    ) -> ResultStream {
        // Never spin up more workers (and document handles) than pages.
        let spawned = self.worker_count.min(tasks.len());
        let (results_tx, results_rx) = mpsc::channel(tasks.len().max(1));

        let context = Arc::new(WorkerContext {
            source: Arc::clone(&self.source),
            recognizer: Arc::clone(&self.recognizer),
            queue: Arc::new(Mutex::new(tasks.into())),
            page_timeout: self.page_timeout,
            cancel: self.cancel.clone(),
            slots: Arc::new(Semaphore::new(self.worker_count)),
        });

        let mut primed = primed;
        let workers = (0..spawned)
            .map(|worker_id| {
                let context = Arc::clone(&context);
                let results = results_tx.clone();
                let handle = primed.take();
                tokio::spawn(run_worker(worker_id, context, handle, results))
            })
            .collect();
        debug!(spawned, "Workers started");

        ResultStream {
            results: results_rx,
            workers,
            cancel: self.cancel.clone(),
        }
    }
}

/// Completion-ordered results of a submission.
pub struct ResultStream {
    results: mpsc::Receiver<PageResult>,
    workers: Vec<JoinHandle<()>>,
    cancel: CancelHandle,
}

impl ResultStream {
    /// Next finished page, or `None` once every worker has exited.
    pub async fn next(&mut self) -> Option<PageResult> {
        self.results.recv().await
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Stop handing out pages and discard whatever is still running.
    pub fn abort(&mut self) {
        self.cancel.cancel();
        self.results.close();
    }

    /// Wait for every worker to exit, releasing their document handles.
    ///
    /// Page jobs abandoned by a timeout may still be running on the blocking
    /// pool; they are not waited for, but keep their slot until they return.
    pub async fn join(self) -> Result<()> {
        let ResultStream {
            results, workers, ..
        } = self;
        // Dropping the receiver unblocks any worker still sending.
        drop(results);
        for worker in workers {
            worker
                .await
                .map_err(|err| LesewerkError::WorkerPool(format!("worker task failed: {err}")))?;
        }
        Ok(())
    }
}

/// Open a document handle on the blocking pool.
async fn open_handle(source: &Arc<dyn DocumentSource>) -> Result<Box<dyn PageDocument>> {
    let source = Arc::clone(source);
    tokio::task::spawn_blocking(move || source.open())
        .await
        .map_err(|err| LesewerkError::WorkerPool(format!("document open task failed: {err}")))?
}

/// Render one page and read its text.
fn process_page(
    document: &mut dyn PageDocument,
    recognizer: &dyn TextRecognizer,
    task: &PageTask,
) -> std::result::Result<String, PageError> {
    let rendered = document.render_page(task.page_index(), task.resolution_dpi())?;
    let pixels = ImageProcessor::from_dynamic(rendered).into_rgb8();
    recognizer.recognize(task.page_index(), &pixels, task.language())
    // `pixels` is dropped here, before the next page is rendered.
}

async fn run_worker(
    worker_id: usize,
    context: Arc<WorkerContext>,
    mut handle: Option<Box<dyn PageDocument>>,
    results: mpsc::Sender<PageResult>,
) {
    while let Some(task) = context.next_task() {
        let page_index = task.page_index();
        let started = Instant::now();
        let Some(slot) = context.claim_slot().await else {
            debug!(worker_id, page_index, "Run cancelled while waiting for a slot");
            break;
        };

        let outcome = match handle.take() {
            Some(document) => run_page(&context, slot, document, task, &mut handle).await,
            None => match open_handle(&context.source).await {
                Ok(document) => run_page(&context, slot, document, task, &mut handle).await,
                Err(err) => {
                    warn!(worker_id, page_index, error = %err, "Worker could not open document");
                    PageOutcome::Failed(PageError::Render {
                        page_index,
                        reason: format!("document handle unavailable: {err}"),
                    })
                }
            },
        };

        if context.cancel.is_cancelled() {
            debug!(worker_id, page_index, "Run cancelled; discarding page result");
            break;
        }

        let result = PageResult {
            page_index,
            outcome,
            elapsed: started.elapsed(),
        };
        if let Some(err) = result.error() {
            debug!(worker_id, page_index, stage = err.stage(), "Page failed");
        } else {
            debug!(worker_id, page_index, elapsed_ms = result.elapsed.as_millis() as u64, "Page done");
        }
        if results.send(result).await.is_err() {
            debug!(worker_id, "Result receiver gone; worker stopping");
            break;
        }
    }
    debug!(worker_id, "Worker exiting");
}

/// Run one page on the blocking pool. On success the document handle is
/// put back into `reuse` for the next page.
///
/// `permit` moves into the job and is released when the job returns, even
/// if the worker stopped waiting for it.
async fn run_page(
    context: &WorkerContext,
    permit: OwnedSemaphorePermit,
    mut document: Box<dyn PageDocument>,
    task: PageTask,
    reuse: &mut Option<Box<dyn PageDocument>>,
) -> PageOutcome {
    let page_index = task.page_index();
    let recognizer = Arc::clone(&context.recognizer);
    let job = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let text = process_page(document.as_mut(), recognizer.as_ref(), &task);
        (document, text)
    });

    let joined = match context.page_timeout {
        Some(limit) => match tokio::time::timeout(limit, job).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(page_index, timeout_secs = limit.as_secs_f64(), "Page timed out");
                return PageOutcome::Failed(PageError::Timeout {
                    page_index,
                    after: limit,
                });
            }
        },
        None => job.await,
    };

    match joined {
        Ok((document, text)) => {
            *reuse = Some(document);
            match text {
                Ok(text) => PageOutcome::Recognized(text),
                Err(err) => PageOutcome::Failed(err),
            }
        }
        Err(err) => {
            error!(page_index, error = %err, "Page job panicked");
            PageOutcome::Failed(PageError::WorkerPanicked { page_index })
        }
    }
}
