//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging custom event handlers
//! (logging, metrics, alerting) into the engine. Each subscriber gets a
//! dedicated worker task and a bounded queue; panics are caught so a broken
//! observer cannot take the engine down with it.

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for engine observability.
///
/// ### Rules
/// - `on_event()` runs in a dedicated worker task, never in the loop.
/// - Events are processed sequentially per subscriber (FIFO).
/// - Queue overflow drops events for this subscriber only.
/// - Panics are caught and isolated.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in drop/panic diagnostics.
    fn name(&self) -> &'static str;

    /// Capacity of this subscriber's event queue.
    fn queue_capacity(&self) -> usize {
        256
    }
}
