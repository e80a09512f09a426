//! # depvisor
//!
//! **Depvisor** is a dependency-driven worker supervision library.
//!
//! It runs a collection of named long-lived tasks (*workers*) whose startup
//! depends on resources produced by other workers, and automatically
//! restarts workers when their declared dependencies change state. Every
//! subsystem of a larger agent process is expressed as a [`Manifold`]
//! plugged into one [`Engine`], which keeps the graph converged.
//!
//! ## Features
//!
//! | Area              | Description                                                        | Key types / traits                  |
//! |-------------------|--------------------------------------------------------------------|-------------------------------------|
//! | **Engine**        | Install manifolds, snapshot status, kill, await shutdown.          | [`Engine`], [`EngineReport`]        |
//! | **Manifolds**     | Declare inputs, a start function, an optional output adapter.      | [`Manifold`], [`Manifolds`]         |
//! | **Workers**       | Minimal runnable contract plus a future-backed implementation.     | [`Worker`], [`WorkerRef`], [`WorkerFn`] |
//! | **Resources**     | Frozen per-attempt view of peer workers, handed to start functions.| [`Resources`]                       |
//! | **Validation**    | Cycle detection over a manifold set.                               | [`validate`]                        |
//! | **Errors**        | Typed errors and the `Missing`/`Dying` sentinels.                  | [`EngineError`], [`WorkerError`]    |
//! | **Observability** | Lifecycle events fanned out to non-blocking subscribers.           | [`Event`], [`EventKind`], [`Subscribe`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber
//!   _(demo/reference only)_.
//!
//! ```no_run
//! use depvisor::{Engine, EngineConfig, Manifold, WorkerError, WorkerFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::new(EngineConfig::new(
//!         |err: &WorkerError| err.is_fatal(),
//!         |candidate, _worst| candidate,
//!     ))?;
//!
//!     // A worker with no dependencies.
//!     engine
//!         .install("api", Manifold::new(Vec::<String>::new(), |_res| async {
//!             Ok(WorkerFn::spawn(|token| async move {
//!                 token.cancelled().await;
//!                 Ok(())
//!             }))
//!         }))
//!         .await?;
//!
//!     // A worker that needs the api worker to exist before it can start.
//!     engine
//!         .install("uploader", Manifold::new(["api"], |res| async move {
//!             res.exists("api")?;
//!             Ok(WorkerFn::spawn(|token| async move {
//!                 token.cancelled().await;
//!                 Ok(())
//!             }))
//!         }))
//!         .await?;
//!
//!     engine.kill();
//!     engine.wait().await?;
//!     Ok(())
//! }
//! ```
//!
//! ---

mod config;
mod engine;
mod error;
mod graph;
mod manifold;
mod resources;
mod worker;

pub mod events;
pub mod subscribers;

// ---- Public re-exports ----

pub use config::{EngineConfig, IsFatalFn, MoreImportantFn};
pub use engine::{Engine, EngineReport, WorkerReport};
pub use error::{EngineError, WorkerError};
pub use graph::validate;
pub use manifold::{Manifold, Manifolds, OutputFn, StartFn};
pub use resources::Resources;
pub use worker::{Worker, WorkerFn, WorkerRef};

pub use events::{Event, EventKind};
pub use subscribers::Subscribe;

// Optional: expose a simple built-in logging subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
