//! # Runner: one start attempt for one manifold.
//!
//! A runner is a single-use task dispatched by the loop's `request_start`.
//! Its whole life:
//!
//! ```text
//! sleep(delay)  | dying ─► report Dying, done
//! start(resources)
//!   Err ─► report the start error, done
//! hand worker to loop | dying ─► kill it ourselves
//! worker.wait()  (dying mid-wait ─► kill, keep waiting)
//! report the exit result
//! ```
//!
//! ## Rules
//! - At most one started ticket, exactly one stopped ticket, started
//!   always before stopped.
//! - Ownership of the worker moves with the started ticket; whichever side
//!   loses the handoff race kills it.
//! - The stopped send is unconditional: the loop drains stopped tickets
//!   until every runner has reported, so it cannot be lost.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;
use crate::manifold::StartFn;
use crate::resources::Resources;

use super::core::{StartedTicket, StoppedTicket};

pub(crate) struct Runner {
    pub name: String,
    pub delay: Duration,
    pub start: StartFn,
    pub resources: Resources,
    pub dying: CancellationToken,
    pub started_tx: mpsc::Sender<StartedTicket>,
    pub stopped_tx: mpsc::Sender<StoppedTicket>,
}

impl Runner {
    pub(crate) async fn run(self) {
        let Runner {
            name,
            delay,
            start,
            resources,
            dying,
            started_tx,
            stopped_tx,
        } = self;

        let result = async {
            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            tokio::select! {
                _ = &mut sleep => {}
                _ = dying.cancelled() => return Err(WorkerError::Dying),
            }

            let worker = start(resources).await?;

            tokio::select! {
                _ = dying.cancelled() => worker.kill(),
                sent = started_tx.send(StartedTicket {
                    name: name.clone(),
                    worker: Arc::clone(&worker),
                }) => {
                    if sent.is_err() {
                        worker.kill();
                    }
                }
            }

            tokio::select! {
                exit = worker.wait() => exit,
                _ = dying.cancelled() => {
                    worker.kill();
                    worker.wait().await
                }
            }
        }
        .await;

        let _ = stopped_tx.send(StoppedTicket { name, result }).await;
    }
}
