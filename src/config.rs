//! # Engine configuration.
//!
//! [`EngineConfig`] bundles the two error-policy callbacks with the two
//! restart delays and the event bus capacity.
//!
//! ## Sentinel values
//! - `error_delay` and `bounce_delay` must be strictly positive; a zero
//!   delay would turn a crash-looping worker into a busy loop, so
//!   [`EngineConfig::validate`] rejects it at construction.
//! - `bus_capacity` must be at least 1 (broadcast channels cannot be empty).
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use depvisor::{EngineConfig, WorkerError};
//!
//! let mut cfg = EngineConfig::new(
//!     |err: &WorkerError| err.is_fatal(),
//!     |candidate, _worst| candidate,
//! );
//! cfg.error_delay = Duration::from_millis(250);
//! cfg.bounce_delay = Duration::from_millis(20);
//!
//! assert!(cfg.validate().is_ok());
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::error::{EngineError, WorkerError};

/// Classifies a worker exit error: `true` kills the engine.
pub type IsFatalFn = Arc<dyn Fn(&WorkerError) -> bool + Send + Sync>;

/// Ranks two fatal errors and returns the more important one. The first
/// argument is the newly observed error, the second the current worst.
pub type MoreImportantFn = Arc<dyn Fn(WorkerError, WorkerError) -> WorkerError + Send + Sync>;

/// Configuration for a dependency [`Engine`](crate::Engine).
///
/// Controls fatal-error classification and ranking, the two restart delays,
/// and the capacity of the observability event bus.
#[derive(Clone)]
pub struct EngineConfig {
    /// Decides whether a worker exit error stops the whole engine.
    pub is_fatal: IsFatalFn,

    /// Ranks fatal errors so [`Engine::wait`](crate::Engine::wait) can
    /// return the worst one seen, not merely the first.
    pub more_important: MoreImportantFn,

    /// Delay before restarting a worker that failed with an unknown
    /// (non-fatal, non-missing) error.
    pub error_delay: Duration,

    /// Delay before restarting a worker that was deliberately stopped
    /// because its dependencies changed.
    pub bounce_delay: Duration,

    /// Capacity of the event bus broadcast channel. Slow subscribers that
    /// lag behind more than this many events skip the older ones.
    pub bus_capacity: usize,
}

impl EngineConfig {
    /// Creates a configuration with the supplied error policy and stock
    /// pacing: `error_delay = 3s`, `bounce_delay = 10ms`,
    /// `bus_capacity = 1024`.
    pub fn new<F, M>(is_fatal: F, more_important: M) -> Self
    where
        F: Fn(&WorkerError) -> bool + Send + Sync + 'static,
        M: Fn(WorkerError, WorkerError) -> WorkerError + Send + Sync + 'static,
    {
        Self {
            is_fatal: Arc::new(is_fatal),
            more_important: Arc::new(more_important),
            error_delay: Duration::from_secs(3),
            bounce_delay: Duration::from_millis(10),
            bus_capacity: 1024,
        }
    }

    /// Checks the config values are sensible.
    ///
    /// The two callbacks are required by construction, so only the numeric
    /// fields need checking here.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.error_delay == Duration::ZERO {
            return Err(EngineError::InvalidConfig {
                reason: "error_delay must be strictly positive".into(),
            });
        }
        if self.bounce_delay == Duration::ZERO {
            return Err(EngineError::InvalidConfig {
                reason: "bounce_delay must be strictly positive".into(),
            });
        }
        if self.bus_capacity == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "bus_capacity must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("error_delay", &self.error_delay)
            .field("bounce_delay", &self.bounce_delay)
            .field("bus_capacity", &self.bus_capacity)
            .finish_non_exhaustive()
    }
}
