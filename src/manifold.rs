//! # Manifold: the static declaration of one supervised worker.
//!
//! A [`Manifold`] names the inputs a worker reads, supplies the async start
//! function that produces the worker, and optionally an output adapter that
//! exposes the worker's resource to its dependents. Once installed in an
//! engine a manifold is immutable and lives for the engine's lifetime.
//!
//! [`Manifolds`] is a plain named set of manifolds; the engine validates a
//! candidate set for cycles before accepting an install.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::WorkerError;
use crate::resources::Resources;
use crate::worker::WorkerRef;

/// Async start function: given a frozen [`Resources`] snapshot, produce a
/// running worker or fail.
pub type StartFn =
    Arc<dyn Fn(Resources) -> BoxFuture<'static, Result<WorkerRef, WorkerError>> + Send + Sync>;

/// Output adapter: given the manifold's live worker, fill the caller's
/// typed out-parameter. Absence means dependents may only test existence.
pub type OutputFn = Arc<dyn Fn(&WorkerRef, &mut dyn Any) -> Result<(), WorkerError> + Send + Sync>;

/// # Declaration of a supervised worker.
///
/// # Example
/// ```no_run
/// use depvisor::{Manifold, Resources, WorkerError, WorkerFn};
///
/// let manifold = Manifold::new(["database"], |res: Resources| async move {
///     res.exists("database")?;
///     Ok(WorkerFn::spawn(|token| async move {
///         token.cancelled().await;
///         Ok(())
///     }))
/// });
/// assert_eq!(manifold.inputs(), ["database"]);
/// ```
#[derive(Clone)]
pub struct Manifold {
    /// Names of the peer manifolds this worker reads.
    inputs: Vec<String>,
    /// Produces the worker for each start attempt.
    start: StartFn,
    /// Exposes the worker's resource to dependents, if declared.
    output: Option<OutputFn>,
}

impl Manifold {
    /// Creates a manifold from its input names and start function.
    pub fn new<I, S, F, Fut>(inputs: I, start: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Resources) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<WorkerRef, WorkerError>> + Send + 'static,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            start: Arc::new(move |res| -> BoxFuture<'static, Result<WorkerRef, WorkerError>> {
                Box::pin(start(res))
            }),
            output: None,
        }
    }

    /// Declares the output adapter dependents use to extract this worker's
    /// resource.
    pub fn with_output<F>(mut self, output: F) -> Self
    where
        F: Fn(&WorkerRef, &mut dyn Any) -> Result<(), WorkerError> + Send + Sync + 'static,
    {
        self.output = Some(Arc::new(output));
        self
    }

    /// The peer manifold names this one reads.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub(crate) fn start_fn(&self) -> StartFn {
        Arc::clone(&self.start)
    }

    pub(crate) fn output_fn(&self) -> Option<OutputFn> {
        self.output.clone()
    }
}

impl std::fmt::Debug for Manifold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manifold")
            .field("inputs", &self.inputs)
            .field("output", &self.output.is_some())
            .finish_non_exhaustive()
    }
}

/// # Named set of manifolds.
///
/// Used by [`validate`](crate::validate) to check a candidate graph for
/// cycles before the engine mutates any state.
#[derive(Clone, Debug, Default)]
pub struct Manifolds {
    entries: HashMap<String, Manifold>,
}

impl Manifolds {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a manifold, replacing any previous entry under the name.
    pub fn insert(&mut self, name: impl Into<String>, manifold: Manifold) {
        self.entries.insert(name.into(), manifold);
    }

    /// Looks up a manifold by name.
    pub fn get(&self, name: &str) -> Option<&Manifold> {
        self.entries.get(name)
    }

    /// True if a manifold is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of manifolds in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, manifold)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Manifold)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, Manifold)> for Manifolds {
    fn from_iter<T: IntoIterator<Item = (S, Manifold)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, manifold)| (name.into(), manifold))
                .collect(),
        }
    }
}
