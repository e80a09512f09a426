//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [installed] manifold=api
//! [starting] manifold=api delay=0ns
//! [started] manifold=api
//! [stop-requested] manifold=uploader
//! [failed] manifold=uploader err="execution failed: connection refused"
//! [engine-dying]
//! [engine-stopped]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use;
/// implement a custom [`Subscribe`] for structured logging or metrics.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ManifoldInstalled => {
                println!("[installed] manifold={:?}", e.manifold);
            }
            EventKind::WorkerStarting => {
                println!("[starting] manifold={:?} delay={:?}", e.manifold, e.delay);
            }
            EventKind::WorkerStarted => {
                println!("[started] manifold={:?}", e.manifold);
            }
            EventKind::WorkerStopped => {
                println!("[stopped] manifold={:?}", e.manifold);
            }
            EventKind::WorkerFailed => {
                println!("[failed] manifold={:?} err={:?}", e.manifold, e.error);
            }
            EventKind::StopRequested => {
                println!("[stop-requested] manifold={:?}", e.manifold);
            }
            EventKind::EngineDying => {
                println!("[engine-dying]");
            }
            EventKind::EngineStopped => {
                println!("[engine-stopped]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
