//! Background I/O worker.
//!
//! Filesystem work must not block the UI thread. Handlers that touch the disk
//! package their work as a [`Job`] and submit it here; a single named thread
//! runs jobs in submission order and posts a [`Completion`] back. The UI
//! thread collects completions with [`IoWorker::try_completions`] and delivers
//! them through the correlator, so every script callback is still invoked on
//! the UI thread.

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::correlator::CallbackTicket;
use crate::error::BridgeError;

/// Tracing target for worker activity.
pub(crate) const WORKER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::worker");

const WORKER_THREAD_NAME: &str = "hostbridge-io";

/// Unit of deferred native work.
pub type Job = Box<dyn FnOnce() -> Result<Value, BridgeError> + Send + 'static>;

/// Callback run on the worker thread after each completion is posted.
///
/// Hosts use it to schedule a [`pump`](crate::BridgeContext::pump) on their
/// UI loop.
pub type CompletionWaker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Result of a job, ready for delivery on the UI thread.
#[derive(Debug)]
pub struct Completion {
    /// Ticket of the originating call; `None` for fire-and-forget.
    pub ticket: Option<CallbackTicket>,
    /// Action that produced the outcome.
    pub action: String,
    /// Job outcome.
    pub outcome: Result<Value, BridgeError>,
}

/// Errors raised by the worker lifecycle.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker thread could not be started.
    #[error("failed to spawn I/O worker: {source}")]
    Spawn {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The worker thread panicked outside a job.
    #[error("I/O worker thread panicked")]
    ThreadPanic,
}

struct Task {
    ticket: Option<CallbackTicket>,
    action: String,
    job: Job,
}

/// Handle to the FIFO worker thread.
pub struct IoWorker {
    jobs: Option<Sender<Task>>,
    completions: Receiver<Completion>,
    cancelled: Arc<AtomicBool>,
    outstanding: usize,
    handle: Option<thread::JoinHandle<()>>,
}

impl IoWorker {
    /// Starts the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Spawn`] when the OS refuses the thread.
    pub fn spawn(waker: Option<CompletionWaker>) -> Result<Self, WorkerError> {
        let (job_tx, job_rx) = mpsc::channel::<Task>();
        let (done_tx, done_rx) = mpsc::channel::<Completion>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || run_jobs(&job_rx, &done_tx, &flag, waker.as_ref()))
            .map_err(|source| WorkerError::Spawn { source })?;
        Ok(Self {
            jobs: Some(job_tx),
            completions: done_rx,
            cancelled,
            outstanding: 0,
            handle: Some(handle),
        })
    }

    /// Queues a job behind every job submitted before it.
    ///
    /// # Errors
    ///
    /// When the worker has stopped, the job is not run and a failed
    /// [`Completion`] is handed back for immediate delivery.
    pub fn submit(
        &mut self,
        ticket: Option<CallbackTicket>,
        action: &str,
        job: Job,
    ) -> Result<(), Completion> {
        let task = Task {
            ticket,
            action: action.to_owned(),
            job,
        };
        let Some(sender) = self.jobs.as_ref() else {
            return Err(stopped(task));
        };
        match sender.send(task) {
            Ok(()) => {
                self.outstanding += 1;
                Ok(())
            }
            Err(mpsc::SendError(task)) => Err(stopped(task)),
        }
    }

    /// Collects every completion posted so far without blocking.
    pub fn try_completions(&mut self) -> Vec<Completion> {
        let drained: Vec<Completion> = self.completions.try_iter().collect();
        self.outstanding = self.outstanding.saturating_sub(drained.len());
        drained
    }

    /// Blocks for up to `timeout` waiting for the next completion.
    pub fn wait_completion(&mut self, timeout: Duration) -> Option<Completion> {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => {
                self.outstanding = self.outstanding.saturating_sub(1);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Jobs submitted whose completion has not been collected.
    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.jobs.is_none()
    }

    /// Stops the worker, skipping queued jobs, and joins the thread.
    ///
    /// A job already running is allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ThreadPanic`] if the thread panicked.
    pub fn shutdown(&mut self) -> Result<(), WorkerError> {
        self.cancelled.store(true, Ordering::SeqCst);
        self.jobs = None;
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle.join().map_err(|_| WorkerError::ThreadPanic)?;
        let discarded = self.completions.try_iter().count();
        if discarded > 0 {
            debug!(target: WORKER_TARGET, discarded, "discarded completions at shutdown");
        }
        self.outstanding = 0;
        Ok(())
    }
}

impl Drop for IoWorker {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.jobs = None;
    }
}

fn stopped(task: Task) -> Completion {
    Completion {
        outcome: Err(BridgeError::destroyed(task.action.as_str())),
        ticket: task.ticket,
        action: task.action,
    }
}

fn run_jobs(
    jobs: &Receiver<Task>,
    completions: &Sender<Completion>,
    cancelled: &AtomicBool,
    waker: Option<&CompletionWaker>,
) {
    debug!(target: WORKER_TARGET, "I/O worker started");
    for task in jobs {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        let Task {
            ticket,
            action,
            job,
        } = task;
        let outcome = catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|_| {
            warn!(target: WORKER_TARGET, %action, "job panicked");
            Err(BridgeError::panicked(action.as_str()))
        });
        let completion = Completion {
            ticket,
            action,
            outcome,
        };
        if completions.send(completion).is_err() {
            break;
        }
        if let Some(wake) = waker {
            wake();
        }
    }
    debug!(target: WORKER_TARGET, "I/O worker stopped");
}
