//! # Worker abstraction and function-backed worker implementation.
//!
//! This module defines the [`Worker`] trait (the minimal contract a
//! runnable unit satisfies: request-stop and wait-for-exit) and a
//! convenient future-backed implementation [`WorkerFn`]. The common handle
//! type is [`WorkerRef`], an `Arc<dyn Worker>` suitable for sharing between
//! the engine loop and the runner that created the worker.
//!
//! A worker receives a [`CancellationToken`] and should check it regularly
//! to stop cooperatively when the engine kills it.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;

/// # Shared handle to a worker object.
///
/// This is the type start functions return and the engine stores.
pub type WorkerRef = Arc<dyn Worker>;

/// # Asynchronous, stoppable unit managed by the engine.
///
/// Between the moment a runner hands the worker to the engine and the
/// moment it finishes stopping, the engine owns it exclusively: the engine
/// calls [`kill`](Worker::kill), the runner calls [`wait`](Worker::wait).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use depvisor::{Worker, WorkerError};
///
/// struct Demo {
///     token: CancellationToken,
/// }
///
/// #[async_trait]
/// impl Worker for Demo {
///     fn kill(&self) {
///         self.token.cancel();
///     }
///
///     async fn wait(&self) -> Result<(), WorkerError> {
///         self.token.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + Sync {
    /// Asks the worker to stop. Non-blocking and idempotent; the worker
    /// exits at its own pace and the exit surfaces through [`wait`](Worker::wait).
    fn kill(&self);

    /// Blocks until the worker has fully released its resources, returning
    /// the exit error if any.
    async fn wait(&self) -> Result<(), WorkerError>;

    /// Optional status capability. Workers that override this show up with
    /// a `report` value in the engine report.
    fn report(&self) -> Option<serde_json::Value> {
        None
    }
}

enum WaitState {
    Running(JoinHandle<Result<(), WorkerError>>),
    Done(Result<(), WorkerError>),
}

/// # Future-backed worker implementation.
///
/// [`WorkerFn::spawn`] runs the supplied closure's future as a tokio task
/// and wires a fresh [`CancellationToken`] to it: [`kill`](Worker::kill)
/// cancels the token, [`wait`](Worker::wait) joins the task. A panic inside
/// the future is reported as a [`WorkerError::Fail`] rather than tearing
/// anything else down.
///
/// # Example
/// ```no_run
/// use tokio_util::sync::CancellationToken;
/// use depvisor::{WorkerFn, WorkerRef, WorkerError};
///
/// # async fn demo() {
/// let w: WorkerRef = WorkerFn::spawn(|token: CancellationToken| async move {
///     token.cancelled().await;
///     Ok::<_, WorkerError>(())
/// });
/// w.kill();
/// assert!(w.wait().await.is_ok());
/// # }
/// ```
pub struct WorkerFn {
    token: CancellationToken,
    state: Mutex<WaitState>,
}

impl WorkerFn {
    /// Spawns the future produced by `func` and returns the worker handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<Fnc, Fut>(func: Fnc) -> WorkerRef
    where
        Fnc: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let join = tokio::spawn(func(token.clone()));
        Arc::new(Self {
            token,
            state: Mutex::new(WaitState::Running(join)),
        })
    }
}

#[async_trait]
impl Worker for WorkerFn {
    fn kill(&self) {
        self.token.cancel();
    }

    async fn wait(&self) -> Result<(), WorkerError> {
        let mut state = self.state.lock().await;
        match &mut *state {
            WaitState::Done(result) => result.clone(),
            WaitState::Running(join) => {
                let result = match join.await {
                    Ok(res) => res,
                    Err(join_err) => Err(WorkerError::fail(join_err.to_string())),
                };
                *state = WaitState::Done(result.clone());
                result
            }
        }
    }
}
