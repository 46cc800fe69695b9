//! Blocking form
//!
//! Parks the calling thread until the callback form answers. Meant for CLIs,
//! scripts and benchmarks.
//!
//! Do not call these from a callback running on the engine's default
//! callback thread: the answer would be queued behind the caller and never
//! arrive.

use crossbeam::channel;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StorageError};

use super::Engine;

fn wait<R, F>(register: F) -> Result<R>
where
    R: Send + 'static,
    F: FnOnce(Box<dyn FnOnce(Result<R>) + Send + 'static>),
{
    let (tx, rx) = channel::bounded(1);
    register(Box::new(move |result: Result<R>| {
        let _ = tx.send(result);
    }));
    rx.recv().unwrap_or_else(|_| Err(StorageError::Closed))
}

impl Engine {
    /// Blocking form of [`Engine::get_with`]
    pub fn get_blocking<T>(&self, key: impl Into<String>) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        wait(|done| self.get_with(key, done))
    }

    /// Blocking form of [`Engine::put_with`]
    pub fn put_blocking<T>(&self, value: Option<&T>, key: impl Into<String>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        wait(|done| self.put_with(value, key, done))
    }

    /// Blocking form of [`Engine::delete_with`]
    pub fn delete_blocking(&self, key: impl Into<String>) -> Result<()> {
        wait(|done| self.delete_with(key, done))
    }

    /// Blocking form of [`Engine::clear_with`]
    pub fn clear_blocking(&self) -> Result<()> {
        wait(|done| self.clear_with(done))
    }
}
