//! Serial Queue
//!
//! A single-worker FIFO executor that owns a piece of state.
//!
//! Jobs run one at a time, in submission order, on one named thread. The
//! state never leaves that thread, so jobs need no locking to touch it.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use tracing::{debug, error};

use crate::error::{Result, StorageError};

type Job<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Bounded-concurrency-1 executor guarding `S`
pub struct SerialQueue<S> {
    label: String,
    sender: Option<Sender<Job<S>>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: Send + 'static> SerialQueue<S> {
    /// Spawn the worker thread, handing it ownership of `state`
    pub fn spawn(label: impl Into<String>, state: S) -> Result<Self> {
        let label = label.into();
        let (sender, receiver) = channel::unbounded::<Job<S>>();

        let worker_label = label.clone();
        let worker = thread::Builder::new()
            .name(label.clone())
            .spawn(move || {
                let mut state = state;
                for job in receiver {
                    // A panicking job must not take the queue down with it.
                    if panic::catch_unwind(AssertUnwindSafe(|| job(&mut state))).is_err() {
                        error!(queue = %worker_label, "job panicked");
                    }
                }
                debug!(queue = %worker_label, "serial queue drained");
            })?;

        Ok(Self {
            label,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Enqueue a job; never blocks
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        match &self.sender {
            Some(sender) => sender.send(Box::new(job)).map_err(|_| StorageError::Closed),
            None => Err(StorageError::Closed),
        }
    }
}

impl<S> SerialQueue<S> {
    /// Name of the worker thread
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<S> Drop for SerialQueue<S> {
    /// Close the queue, let the worker finish every queued job, join it
    fn drop(&mut self) {
        drop(self.sender.take());

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() == thread::current().id() {
                // Dropped from one of its own jobs; the loop ends on its own.
                return;
            }
            if worker.join().is_err() {
                error!(queue = %self.label, "worker thread panicked");
            }
        }
    }
}
