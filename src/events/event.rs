//! # Lifecycle events emitted by the engine loop.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Install events**: manifold registration.
//! - **Worker lifecycle events**: start scheduling, handoff, stop, failure.
//! - **Engine events**: the dying transition and final stop.
//!
//! The [`Event`] struct carries optional metadata such as the manifold
//! name, an error message, and the restart delay.
//!
//! ## Ordering
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, so subscribers can re-establish order even when events
//! cross async channel boundaries.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A manifold was accepted and registered.
    ManifoldInstalled,

    /// A start attempt was scheduled; `delay` carries the pacing delay.
    WorkerStarting,
    /// A runner handed its worker to the loop and the loop accepted it.
    WorkerStarted,
    /// A worker stopped (clean exit, deliberate stop, or abandoned start).
    WorkerStopped,
    /// A worker stopped with an error; `error` carries the message.
    WorkerFailed,
    /// The loop asked a worker to stop (dependency change or shutdown).
    StopRequested,

    /// The engine began shutting down.
    EngineDying,
    /// The loop drained every worker and exited.
    EngineStopped,
}

/// Engine event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// Name of the manifold, if applicable.
    pub manifold: Option<String>,
    /// Error message, if the event represents a failure.
    pub error: Option<String>,
    /// Restart delay, if the event schedules one.
    pub delay: Option<Duration>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            manifold: None,
            error: None,
            delay: None,
        }
    }

    /// Attaches a manifold name.
    pub fn with_manifold(mut self, name: impl Into<String>) -> Self {
        self.manifold = Some(name.into());
        self
    }

    /// Attaches an error message.
    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    /// Attaches a restart delay.
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }
}
