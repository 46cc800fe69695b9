//! Async (suspend/resume) form
//!
//! Each method registers a one-shot continuation with the callback form and
//! awaits it. The futures need no particular runtime.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::{Result, StorageError};

use super::Engine;

/// A callback that resolves the paired receiver exactly once
fn continuation<R: Send + 'static>() -> (
    impl FnOnce(Result<R>) + Send + 'static,
    oneshot::Receiver<Result<R>>,
) {
    let (tx, rx) = oneshot::channel();
    let resume = move |result: Result<R>| {
        // The awaiting side may have been dropped; nobody is left to tell.
        let _ = tx.send(result);
    };
    (resume, rx)
}

async fn resumed<R>(rx: oneshot::Receiver<Result<R>>) -> Result<R> {
    rx.await.unwrap_or_else(|_| Err(StorageError::Closed))
}

impl Engine {
    /// Async form of [`Engine::get_with`]
    pub async fn get<T>(&self, key: impl Into<String>) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (resume, rx) = continuation::<Option<T>>();
        self.get_with(key, resume);
        resumed(rx).await
    }

    /// Async form of [`Engine::put_with`]
    pub async fn put<T>(&self, value: Option<&T>, key: impl Into<String>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let (resume, rx) = continuation::<()>();
        self.put_with(value, key, resume);
        resumed(rx).await
    }

    /// Async form of [`Engine::delete_with`]
    pub async fn delete(&self, key: impl Into<String>) -> Result<()> {
        let (resume, rx) = continuation::<()>();
        self.delete_with(key, resume);
        resumed(rx).await
    }

    /// Async form of [`Engine::clear_with`]
    pub async fn clear(&self) -> Result<()> {
        let (resume, rx) = continuation::<()>();
        self.clear_with(resume);
        resumed(rx).await
    }
}
