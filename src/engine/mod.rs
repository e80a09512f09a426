//! Engine core: the loop actor and its collaborators.
//!
//! ## Files & responsibilities
//! - **handle.rs**: public [`Engine`] facade; validates config, wires the
//!   subscriber listener, spawns the loop task, exposes
//!   `install`/`report`/`kill`/`wait`.
//! - **core.rs**: the loop actor; sole owner of all mutable engine state.
//!   Serializes install requests and started/stopped notifications, decides
//!   restarts, bounces dependents, folds fatal errors.
//! - **runner.rs**: one transient task per start attempt: delay, start,
//!   worker handoff, wait-for-exit, exactly one stopped ticket.
//! - **report.rs**: the status snapshot types.
//!
//! ## Wiring (module-level flow)
//! ```text
//! Caller                         Engine loop (core.rs)                 Runner (per attempt)
//!   install(name, m) ──ticket──►  duplicate + cycle check
//!                                 record manifold, empty info
//!                                 request_start(name, 0) ────spawn───►  sleep(delay) | dying
//!                                                                       worker = start(resources)
//!                       ◄──started ticket── (or dying race: kill) ◄───  handoff
//!                                 accept: record worker,
//!                                 bounce dependents
//!                                                                       worker.wait()
//!                       ◄──stopped ticket─────────────────────────◄───  exit
//!                                 classify: retry | bounce |
//!                                 ignore | fatal shutdown
//!
//!   kill() ──cancel dying──►      request_stop(every worker)
//!   wait() ◄─ worst error ──      loop exits once all infos stopped
//! ```
//!
//! ## Rules
//! - Only the loop mutates `manifolds`, `dependents`, `current`,
//!   `worst_error`; everyone else sends tickets.
//! - Ticket channels have capacity 1: producers block while the loop is
//!   busy, which is the back-pressure model.
//! - A runner sends at most one started ticket and exactly one stopped
//!   ticket; the loop keeps draining stopped tickets until every runner
//!   has reported, so that send always succeeds.

mod core;
mod handle;
mod report;
mod runner;

pub use handle::Engine;
pub use report::{EngineReport, WorkerReport};
