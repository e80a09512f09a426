//! Engine events: types and broadcast bus.
//!
//! This module groups the event data model and the bus used to
//! publish/subscribe to lifecycle events emitted by the engine loop.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! All events are published by the loop itself, so subscribers observe
//! state changes in the exact order the loop recorded them.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
