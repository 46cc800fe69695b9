//! One-shot reply guard
//!
//! Carries a caller's callback through the execution queue. The callback is
//! dispatched exactly once: with the result when `send` is called, or with
//! `StorageError::Closed` if the reply is dropped unanswered (the job was
//! never run, or panicked).

use std::sync::Arc;

use crate::error::{Result, StorageError};

use super::dispatch::Dispatch;

type Callback<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

pub(crate) struct Reply<T: Send + 'static> {
    callback: Option<Callback<T>>,
    dispatch: Arc<dyn Dispatch>,
}

impl<T: Send + 'static> Reply<T> {
    pub(crate) fn new<F>(dispatch: Arc<dyn Dispatch>, callback: F) -> Self
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
            dispatch,
        }
    }

    pub(crate) fn send(mut self, result: Result<T>) {
        self.deliver(result);
    }

    fn deliver(&mut self, result: Result<T>) {
        if let Some(callback) = self.callback.take() {
            self.dispatch.dispatch(Box::new(move || callback(result)));
        }
    }
}

impl<T: Send + 'static> Drop for Reply<T> {
    fn drop(&mut self) {
        self.deliver(Err(StorageError::Closed));
    }
}
