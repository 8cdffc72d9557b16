//! Background job runner
//!
//! Long aggregation queries run off the caller's thread, one at a time.
//! Results and failures come back over a crossbeam channel; a failure is
//! reported as a title/message pair ready to show to the user.

use crate::error::{BoreholeError, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Message shown for a job that panicked
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Why a job did not produce a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    /// Title the job was submitted under
    pub title: String,
    pub message: String,
}

/// Outcome of a background job
#[derive(Debug)]
pub enum JobEvent<T> {
    Finished(T),
    Failed(JobFailure),
}

/// Runs at most one job at a time on a worker thread
pub struct BackgroundWorker<T> {
    busy: Arc<AtomicBool>,
    tx: Sender<JobEvent<T>>,
    rx: Receiver<JobEvent<T>>,
}

impl<T: Send + 'static> BackgroundWorker<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    /// `true` while a submitted job has not finished
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start `job` on a new thread.
    ///
    /// Fails without running anything when another job is still busy.
    pub fn submit<F>(&self, title: impl Into<String>, job: F) -> Result<()>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let title = title.into();
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(BoreholeError::Job(format!(
                "{} rejected, another job is running",
                title
            )));
        }

        let busy = Arc::clone(&self.busy);
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name("borehole-job".to_string())
            .spawn(move || {
                tracing::debug!("Job {} started", title);
                let event = match std::panic::catch_unwind(AssertUnwindSafe(job)) {
                    Ok(Ok(value)) => JobEvent::Finished(value),
                    Ok(Err(e)) => {
                        tracing::warn!("Job {} failed: {}", title, e);
                        JobEvent::Failed(JobFailure {
                            title,
                            message: e.to_string(),
                        })
                    }
                    Err(_) => {
                        tracing::warn!("Job {} panicked", title);
                        JobEvent::Failed(JobFailure {
                            title,
                            message: UNKNOWN_ERROR_MESSAGE.to_string(),
                        })
                    }
                };
                busy.store(false, Ordering::SeqCst);
                let _ = tx.send(event);
            });

        if let Err(e) = spawned {
            self.busy.store(false, Ordering::SeqCst);
            return Err(BoreholeError::Job(format!("Failed to start worker thread: {}", e)));
        }
        Ok(())
    }

    /// Next finished job, if any
    pub fn try_recv(&self) -> Option<JobEvent<T>> {
        self.rx.try_recv().ok()
    }

    /// Block until a job finishes or `timeout` passes
    pub fn wait(&self, timeout: Duration) -> Option<JobEvent<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl<T: Send + 'static> Default for BackgroundWorker<T> {
    fn default() -> Self {
        Self::new()
    }
}
