//! # Event subscribers for the engine.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery
//! that delivers engine [`Event`](crate::events::Event)s to observers
//! without ever blocking the loop.
//!
//! ```text
//! Engine loop ── publish(Event) ──► Bus ──► subscriber listener
//!                                              │
//!                                              ├──► [queue] ─► worker ─► LogWriter
//!                                              └──► [queue] ─► worker ─► custom Subscribe
//! ```
//!
//! Slow subscribers only affect themselves: each one gets a bounded queue
//! and a dedicated worker task, and a full queue drops events for that
//! subscriber alone.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
