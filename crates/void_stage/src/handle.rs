//! Completion handles
//!
//! Engines that start a unit request and hand back something to poll
//! (rather than an async fn) plug in through [`HandleBackend`]. The engine
//! side completes or fails a [`UnitHandle`]; the navigator side awaits it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::LoaderError;
use crate::loader::UnitLoader;
use crate::Key;

/// Progress of a single unit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// Still running
    Pending,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed(String),
}

impl RequestState {
    /// Check if the request has finished either way
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

struct HandleData {
    state: RequestState,
    wakers: Vec<Waker>,
}

/// Shared completion flag for one unit request
///
/// Clones refer to the same request. The first `complete`/`fail` wins;
/// later calls are ignored.
#[derive(Clone)]
pub struct UnitHandle {
    data: Arc<Mutex<HandleData>>,
}

impl UnitHandle {
    /// Create a pending handle
    pub fn new() -> Self {
        Self::with_state(RequestState::Pending)
    }

    /// Create a handle that is already done
    pub fn done() -> Self {
        Self::with_state(RequestState::Done)
    }

    /// Create a handle that has already failed
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::with_state(RequestState::Failed(reason.into()))
    }

    fn with_state(state: RequestState) -> Self {
        Self {
            data: Arc::new(Mutex::new(HandleData {
                state,
                wakers: Vec::new(),
            })),
        }
    }

    /// Current state
    pub fn state(&self) -> RequestState {
        self.data.lock().state.clone()
    }

    /// Check if the request has finished (either way)
    pub fn is_done(&self) -> bool {
        self.data.lock().state.is_finished()
    }

    /// Mark the request as done
    pub fn complete(&self) {
        self.finish(RequestState::Done);
    }

    /// Mark the request as failed
    pub fn fail(&self, reason: impl Into<String>) {
        self.finish(RequestState::Failed(reason.into()));
    }

    fn finish(&self, state: RequestState) {
        let wakers = {
            let mut data = self.data.lock();
            if data.state.is_finished() {
                return;
            }
            data.state = state;
            std::mem::take(&mut data.wakers)
        };

        for waker in wakers {
            waker.wake();
        }
    }
}

impl Default for UnitHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UnitHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitHandle").field("state", &self.state()).finish()
    }
}

impl Future for UnitHandle {
    type Output = Result<(), String>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut guard = self.data.lock();
        let data = &mut *guard;
        match &data.state {
            RequestState::Done => Poll::Ready(Ok(())),
            RequestState::Failed(reason) => Poll::Ready(Err(reason.clone())),
            RequestState::Pending => {
                if !data.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    data.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// Engine side of handle-based unit loading
pub trait HandleBackend<U: Key>: Send + Sync {
    /// Start loading a unit additively
    fn request_load(&self, unit: &U) -> UnitHandle;

    /// Start unloading a unit
    fn request_unload(&self, unit: &U) -> UnitHandle;
}

/// Adapts a [`HandleBackend`] into a [`UnitLoader`]
pub struct HandleLoader<B> {
    backend: B,
}

impl<B> HandleLoader<B> {
    /// Wrap a backend
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Access the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<U: Key, B: HandleBackend<U>> UnitLoader<U> for HandleLoader<B> {
    async fn load(&self, unit: &U) -> Result<(), LoaderError> {
        let handle = self.backend.request_load(unit);
        handle
            .await
            .map_err(|reason| LoaderError::new(format!("{:?}", unit), reason))
    }

    async fn unload(&self, unit: &U) -> Result<(), LoaderError> {
        let handle = self.backend.request_unload(unit);
        handle
            .await
            .map_err(|reason| LoaderError::new(format!("{:?}", unit), reason))
    }
}
