//! Callback dispatch
//!
//! Completion callbacks never run on the store worker. They are handed to a
//! `Dispatch`, which decides where they run.

use tracing::warn;

use crate::error::Result;

use super::queue::SerialQueue;

/// A callback ready to run
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere completion callbacks can be sent
///
/// Implement this to deliver results into an event loop or UI thread.
pub trait Dispatch: Send + Sync + 'static {
    fn dispatch(&self, task: Task);
}

/// Default dispatcher: a dedicated FIFO callback thread
pub struct CallbackQueue {
    queue: SerialQueue<()>,
}

impl CallbackQueue {
    pub fn spawn(label: impl Into<String>) -> Result<Self> {
        Ok(Self {
            queue: SerialQueue::spawn(label, ())?,
        })
    }

    pub fn label(&self) -> &str {
        self.queue.label()
    }
}

impl Dispatch for CallbackQueue {
    fn dispatch(&self, task: Task) {
        if self.queue.submit(move |_| task()).is_err() {
            warn!(queue = %self.queue.label(), "callback queue closed, callback dropped");
        }
    }
}

/// Runs the callback immediately on the calling thread
///
/// Only used when no callback thread could be started.
pub struct InlineDispatch;

impl Dispatch for InlineDispatch {
    fn dispatch(&self, task: Task) {
        task()
    }
}
