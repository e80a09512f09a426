//! # Engine: the public facade.
//!
//! [`Engine::new`] validates the config and spawns the loop task; the
//! facade then talks to it exclusively through tickets. Dropping the
//! facade cancels the dying signal so an abandoned engine winds itself
//! down instead of leaking its loop.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::{EngineError, WorkerError};
use crate::events::{Bus, Event};
use crate::manifold::Manifold;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::core::{EngineCore, InstallTicket, ReportTicket};
use super::report::EngineReport;

enum LoopState {
    Running(JoinHandle<Result<(), WorkerError>>),
    Finished(Result<(), WorkerError>),
}

/// # Supervisor for a graph of dependency-connected workers.
///
/// Maintains a worker for every installed [`Manifold`], restarting workers
/// whenever their inputs change, until the engine is killed or a worker
/// exits with an error the configured classifier deems fatal.
///
/// # Example
/// ```no_run
/// use depvisor::{Engine, EngineConfig, Manifold, WorkerError, WorkerFn};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = Engine::new(EngineConfig::new(
///     |err: &WorkerError| err.is_fatal(),
///     |candidate, _worst| candidate,
/// ))?;
///
/// engine
///     .install("clock", Manifold::new(Vec::<String>::new(), |_res| async {
///         Ok(WorkerFn::spawn(|token| async move {
///             token.cancelled().await;
///             Ok(())
///         }))
///     }))
///     .await?;
///
/// engine.kill();
/// engine.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    dying: CancellationToken,
    bus: Bus,
    install_tx: mpsc::Sender<InstallTicket>,
    report_tx: mpsc::Sender<ReportTicket>,
    state: Mutex<LoopState>,
}

impl Engine {
    /// Creates an engine with no subscribers and starts its loop.
    ///
    /// Must be called from within a tokio runtime. The caller takes
    /// responsibility for the engine: [`kill`](Engine::kill) it when no
    /// longer needed and handle the error from [`wait`](Engine::wait).
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_subscribers(config, Vec::new())
    }

    /// Creates an engine that fans its lifecycle events out to the given
    /// subscribers.
    pub fn with_subscribers(
        config: EngineConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let bus = Bus::new(config.bus_capacity);
        let dying = CancellationToken::new();

        // The listener subscribes before the loop starts so the earliest
        // events are already observable.
        if !subscribers.is_empty() {
            let set = SubscriberSet::new(subscribers);
            let mut rx = bus.subscribe();
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    }
                }
                set.shutdown().await;
            });
        }

        let (core, install_tx, report_tx) = EngineCore::new(config, bus.clone(), dying.clone());
        let join = tokio::spawn(core.run());

        Ok(Self {
            dying,
            bus,
            install_tx,
            report_tx,
            state: Mutex::new(LoopState::Running(join)),
        })
    }

    /// Registers a manifold under `name` and schedules its first start.
    ///
    /// Fails with [`AlreadyInstalled`](EngineError::AlreadyInstalled) for a
    /// duplicate name, [`Cycle`](EngineError::Cycle) if the manifold would
    /// close a dependency cycle, and
    /// [`ShuttingDown`](EngineError::ShuttingDown) once the engine is
    /// dying. Blocks until the loop has accepted and answered.
    pub async fn install(
        &self,
        name: impl Into<String>,
        manifold: Manifold,
    ) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let ticket = InstallTicket {
            name: name.into(),
            manifold,
            reply: reply_tx,
        };
        tokio::select! {
            _ = self.dying.cancelled() => return Err(EngineError::ShuttingDown),
            sent = self.install_tx.send(ticket) => {
                if sent.is_err() {
                    return Err(EngineError::ShuttingDown);
                }
            }
        }
        reply_rx.await.map_err(|_| EngineError::ShuttingDown)?
    }

    /// Returns a loop-atomic snapshot of engine status.
    pub async fn report(&self) -> Result<EngineReport, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        tokio::select! {
            _ = self.dying.cancelled() => return Err(EngineError::ShuttingDown),
            sent = self.report_tx.send(ReportTicket { reply: reply_tx }) => {
                if sent.is_err() {
                    return Err(EngineError::ShuttingDown);
                }
            }
        }
        reply_rx.await.map_err(|_| EngineError::ShuttingDown)
    }

    /// Begins shutdown. Non-blocking and idempotent; every live worker is
    /// asked to stop and [`wait`](Engine::wait) unblocks once they are all
    /// drained.
    pub fn kill(&self) {
        self.dying.cancel();
    }

    /// Blocks until the loop has exited, returning the worst error seen.
    ///
    /// `Ok(())` means a clean shutdown: the engine was killed and every
    /// worker stopped without a fatal error.
    pub async fn wait(&self) -> Result<(), WorkerError> {
        let mut state = self.state.lock().await;
        match &mut *state {
            LoopState::Finished(result) => result.clone(),
            LoopState::Running(join) => {
                let result = match join.await {
                    Ok(result) => result,
                    Err(join_err) => Err(WorkerError::fatal(format!(
                        "engine loop terminated abnormally: {join_err}"
                    ))),
                };
                *state = LoopState::Finished(result.clone());
                result
            }
        }
    }

    /// Creates a receiver for the engine's lifecycle [`Event`]s.
    ///
    /// Independent of any subscribers passed at construction; every call
    /// returns a fresh receiver that observes all subsequent events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dying.cancel();
    }
}
