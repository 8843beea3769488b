//! Loader gate and operation queue
//!
//! Every host operation touching the engine waits on one shared completion:
//! the engine loader. Operations issued before it resolves sit in an
//! [`OperationQueue`] and are flushed in submission order afterwards.

use futures::{
    channel::oneshot,
    future::{BoxFuture, Shared},
    FutureExt,
};
use std::{collections::VecDeque, fmt, future::Future};

/// Cloneable handle on the one-time engine load.
///
/// Resolution is observed without blocking through [`EngineLoader::is_ready`];
/// async callers can `wait()` on it. A loader that never resolves stalls its
/// hosts indefinitely, as there is no load-failure path.
#[derive(Clone)]
pub struct EngineLoader {
    ready: Shared<BoxFuture<'static, bool>>,
}

impl EngineLoader {
    /// Loader that resolves when `load` completes
    pub fn new<F>(load: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            ready: load.map(|_| true).boxed().shared(),
        }
    }

    /// Drive the load on its own tokio task so it makes progress even while
    /// no host is polling. A load that panics never resolves.
    #[cfg(feature = "tokio-runtime")]
    pub fn spawn<F>(load: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = ::tokio::spawn(load);
        Self {
            ready: task.map(|joined| joined.is_ok()).boxed().shared(),
        }
    }

    /// Loader for an engine that is already available
    pub fn ready() -> Self {
        Self::new(futures::future::ready(()))
    }

    /// Loader resolved by hand through the returned trigger.
    ///
    /// Dropping the trigger without firing it leaves the loader pending.
    pub fn channel() -> (LoaderTrigger, Self) {
        let (sender, receiver) = oneshot::channel::<()>();
        let loader = Self {
            ready: receiver.map(|result| result.is_ok()).boxed().shared(),
        };
        (LoaderTrigger { sender }, loader)
    }

    /// Poll the load once without blocking
    pub fn is_ready(&self) -> bool {
        self.ready.clone().now_or_never().unwrap_or(false)
    }

    /// Resolve once the engine is loaded
    pub async fn wait(&self) {
        if !self.ready.clone().await {
            futures::future::pending::<()>().await;
        }
    }
}

impl fmt::Debug for EngineLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineLoader")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Fires the loader created by [`EngineLoader::channel`]
#[derive(Debug)]
pub struct LoaderTrigger {
    sender: oneshot::Sender<()>,
}

impl LoaderTrigger {
    pub fn fire(self) {
        if self.sender.send(()).is_err() {
            log::debug!("engine loaded after every loader handle was dropped");
        }
    }
}

/// FIFO queue of operations deferred behind the loader.
#[derive(Debug)]
pub struct OperationQueue<T> {
    pending: VecDeque<T>,
}

impl<T> OperationQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn push(&mut self, operation: T) {
        self.pending.push_back(operation);
    }

    /// Take every queued operation, oldest first
    pub fn drain(&mut self) -> Vec<T> {
        self.pending.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for OperationQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
