//! # Resources: the frozen per-attempt view of peer workers.
//!
//! For every start attempt the engine loop captures, at the moment it
//! dispatches the runner, which peer workers exist and which output
//! adapters they declare, restricted to the manifold's declared inputs.
//! The start function only ever sees that snapshot.
//!
//! A frozen view cannot observe changes that happen mid-start, and that is
//! the point: the loop decides at dispatch time which peers count, so a
//! start racing a peer change simply fails with
//! [`Missing`](WorkerError::Missing) (or succeeds against the old peer) and
//! the subsequent dependency bounce re-drives it against fresh state.

use std::any::Any;
use std::collections::HashMap;

use crate::error::WorkerError;
use crate::manifold::OutputFn;
use crate::worker::WorkerRef;

/// Frozen lookup of peer workers, handed to a start function.
///
/// Every accessor answers [`WorkerError::Missing`] for names that are not
/// declared inputs, for inputs whose worker is not currently running, and,
/// when data is requested, for peers that declare no output adapter.
pub struct Resources {
    workers: HashMap<String, Option<WorkerRef>>,
    outputs: HashMap<String, Option<OutputFn>>,
}

impl Resources {
    pub(crate) fn new(
        workers: HashMap<String, Option<WorkerRef>>,
        outputs: HashMap<String, Option<OutputFn>>,
    ) -> Self {
        Self { workers, outputs }
    }

    /// Checks that the named input has a live worker, without extracting
    /// anything from it. Succeeds even when the peer declares no output
    /// adapter.
    pub fn exists(&self, name: &str) -> Result<(), WorkerError> {
        match self.workers.get(name) {
            Some(Some(_)) => Ok(()),
            _ => Err(WorkerError::Missing),
        }
    }

    /// Fills `out` from the named input's output adapter.
    ///
    /// Fails with [`Missing`](WorkerError::Missing) when the peer worker is
    /// not running or the peer declares no adapter; otherwise returns
    /// whatever the adapter returns.
    pub fn fill(&self, name: &str, out: &mut dyn Any) -> Result<(), WorkerError> {
        let worker = match self.workers.get(name) {
            Some(Some(worker)) => worker,
            _ => return Err(WorkerError::Missing),
        };
        match self.outputs.get(name) {
            Some(Some(convert)) => convert(worker, out),
            _ => Err(WorkerError::Missing),
        }
    }

    /// Typed convenience over [`fill`](Resources::fill) for adapters that
    /// write into an `Option<T>` out-parameter.
    pub fn get<T: 'static>(&self, name: &str) -> Result<T, WorkerError> {
        let mut slot: Option<T> = None;
        self.fill(name, &mut slot)?;
        slot.ok_or_else(|| WorkerError::fail(format!("output adapter for '{name}' left the out-parameter empty")))
    }
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut live: Vec<&str> = self
            .workers
            .iter()
            .filter(|(_, w)| w.is_some())
            .map(|(name, _)| name.as_str())
            .collect();
        live.sort_unstable();
        f.debug_struct("Resources")
            .field("inputs", &self.workers.len())
            .field("live", &live)
            .finish()
    }
}
