//! # Error types used by the engine and by workers.
//!
//! This module defines two main error enums:
//!
//! - [`EngineError`] errors returned synchronously by engine operations
//!   (construction, install, report).
//! - [`WorkerError`] errors produced by worker startup and execution.
//!
//! Both types provide `as_label` helpers for logs/metrics. [`WorkerError`]
//! additionally distinguishes the two sentinels the engine reacts to:
//! [`WorkerError::Missing`] (a declared input has no live worker) and
//! [`WorkerError::Dying`] (the attempt was abandoned because the engine is
//! shutting down). Sentinels are matched as variants, never by message text.

use thiserror::Error;

/// # Errors returned by engine operations.
///
/// These are local to the caller: a failed install or report leaves the
/// engine state untouched.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The configuration failed validation at construction time.
    #[error("engine config validation failed: {reason}")]
    InvalidConfig {
        /// Which constraint was violated.
        reason: String,
    },

    /// A manifold with this name is already installed.
    #[error("manifold '{name}' is already installed")]
    AlreadyInstalled {
        /// The duplicate manifold name.
        name: String,
    },

    /// Installing the manifold would close a dependency cycle.
    #[error("dependency cycle detected: {}", .path.join(" -> "))]
    Cycle {
        /// Names along the cycle, first repeated at the end.
        path: Vec<String>,
    },

    /// The operation was attempted after the engine was killed.
    #[error("engine is shutting down")]
    ShuttingDown,
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::InvalidConfig { .. } => "engine_invalid_config",
            EngineError::AlreadyInstalled { .. } => "engine_already_installed",
            EngineError::Cycle { .. } => "engine_cycle_detected",
            EngineError::ShuttingDown => "engine_shutting_down",
        }
    }
}

/// # Errors produced by worker startup and execution.
///
/// A start function or a running worker reports its demise with one of
/// these. The engine interprets them:
///
/// - [`Missing`](WorkerError::Missing) do nothing; a dependency bounce will
///   re-drive the worker when an input changes.
/// - [`Dying`](WorkerError::Dying) the attempt was abandoned during engine
///   shutdown; never rescheduled.
/// - anything else is classified by the configured fatal classifier: fatal
///   errors kill the engine, transient ones are retried after the error
///   delay.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// A declared input has no live worker, or wanted data that no output
    /// adapter provides.
    #[error("missing dependency")]
    Missing,

    /// The start attempt was abandoned because the engine is shutting down.
    #[error("engine is shutting down")]
    Dying,

    /// Execution failed but may succeed if retried.
    #[error("execution failed: {reason}")]
    Fail {
        /// Human-readable failure description.
        reason: String,
    },

    /// Non-recoverable error; the stock classifiers treat it as fatal.
    #[error("fatal error: {reason}")]
    Fatal {
        /// Human-readable failure description.
        reason: String,
    },
}

impl WorkerError {
    /// Creates a transient failure.
    pub fn fail(reason: impl Into<String>) -> Self {
        WorkerError::Fail {
            reason: reason.into(),
        }
    }

    /// Creates a fatal failure.
    pub fn fatal(reason: impl Into<String>) -> Self {
        WorkerError::Fatal {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Missing => "worker_missing_dependency",
            WorkerError::Dying => "worker_engine_dying",
            WorkerError::Fail { .. } => "worker_failed",
            WorkerError::Fatal { .. } => "worker_fatal",
        }
    }

    /// True for the missing-dependency sentinel.
    pub fn is_missing(&self) -> bool {
        matches!(self, WorkerError::Missing)
    }

    /// True for the `Fatal` variant. This is what the stock classifier
    /// installed by [`EngineConfig::new`](crate::EngineConfig::new) checks;
    /// custom classifiers may rank errors however they like.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkerError::Fatal { .. })
    }
}
