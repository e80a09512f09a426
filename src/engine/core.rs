//! # The engine loop: single owner of all mutable state.
//!
//! One task runs [`EngineCore::run`] for the engine's whole life. Every
//! mutation of the worker graph happens inside one turn of its select
//! loop, so multi-field state transitions are atomic without any locks.
//!
//! ## Event sources
//! ```text
//! dying signal (observed once) ─► request_stop every current worker
//! install ticket               ─► duplicate check, cycle check, record,
//!                                 request_start(name, 0); reply to caller
//! started ticket               ─► accept worker (or kill it if unwanted),
//!                                 bounce dependents
//! stopped ticket               ─► classify exit: retry / bounce / ignore /
//!                                 fatal; reset info; bounce dependents if
//!                                 a live worker disappeared
//! report ticket                ─► snapshot status; reply to caller
//! ```
//!
//! After every turn the loop checks for termination: once the engine is
//! dying and every worker info is stopped, it exits with the folded worst
//! error. Runners still mid-flight keep their infos non-stopped, so the
//! loop is guaranteed to drain their stopped tickets before exiting.
//!
//! ## Rules
//! - Invariant violations (unknown manifold, duplicate start, unexpected
//!   stop) are engine bugs: they fold a descriptive fatal error into
//!   `worst_error` and cancel the dying token.
//! - A rejected worker (stopping or dying at handoff) is killed by the
//!   loop; its runner still reports the eventual exit.
//! - The dying check in `request_start` makes every scheduling decision a
//!   no-op during shutdown.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::{EngineError, WorkerError};
use crate::events::{Bus, Event, EventKind};
use crate::graph;
use crate::manifold::{Manifold, Manifolds};
use crate::resources::Resources;
use crate::worker::WorkerRef;

use super::report::{EngineReport, WorkerReport};
use super::runner::Runner;

/// Asks the loop to register a manifold.
pub(crate) struct InstallTicket {
    pub name: String,
    pub manifold: Manifold,
    pub reply: oneshot::Sender<Result<(), EngineError>>,
}

/// Notifies the loop that a runner produced a worker.
pub(crate) struct StartedTicket {
    pub name: String,
    pub worker: WorkerRef,
}

/// Notifies the loop of the demise of (or failure to create) a worker.
pub(crate) struct StoppedTicket {
    pub name: String,
    pub result: Result<(), WorkerError>,
}

/// Asks the loop for a status snapshot.
pub(crate) struct ReportTicket {
    pub reply: oneshot::Sender<EngineReport>,
}

/// What the loop learned from one select turn.
enum Turn {
    Dying,
    Install(InstallTicket),
    Started(StartedTicket),
    Stopped(StoppedTicket),
    Report(ReportTicket),
}

/// Per-manifold worker state. Only the loop touches it.
#[derive(Default)]
struct WorkerInfo {
    starting: bool,
    stopping: bool,
    worker: Option<WorkerRef>,
}

impl WorkerInfo {
    /// True unless a worker is assigned or a runner is in flight.
    fn stopped(&self) -> bool {
        self.worker.is_none() && !self.starting
    }
}

pub(crate) struct EngineCore {
    config: EngineConfig,
    bus: Bus,
    dying: CancellationToken,

    manifolds: Manifolds,
    dependents: HashMap<String, Vec<String>>,
    current: HashMap<String, WorkerInfo>,
    worst_error: Option<WorkerError>,

    install_rx: mpsc::Receiver<InstallTicket>,
    report_rx: mpsc::Receiver<ReportTicket>,
    started_rx: mpsc::Receiver<StartedTicket>,
    stopped_rx: mpsc::Receiver<StoppedTicket>,

    // Cloned into every runner the loop spawns.
    started_tx: mpsc::Sender<StartedTicket>,
    stopped_tx: mpsc::Sender<StoppedTicket>,
}

impl EngineCore {
    /// Builds the core and the two senders the facade keeps.
    pub(crate) fn new(
        config: EngineConfig,
        bus: Bus,
        dying: CancellationToken,
    ) -> (
        Self,
        mpsc::Sender<InstallTicket>,
        mpsc::Sender<ReportTicket>,
    ) {
        let (install_tx, install_rx) = mpsc::channel(1);
        let (report_tx, report_rx) = mpsc::channel(1);
        let (started_tx, started_rx) = mpsc::channel(1);
        let (stopped_tx, stopped_rx) = mpsc::channel(1);

        let core = Self {
            config,
            bus,
            dying,
            manifolds: Manifolds::new(),
            dependents: HashMap::new(),
            current: HashMap::new(),
            worst_error: None,
            install_rx,
            report_rx,
            started_rx,
            stopped_rx,
            started_tx,
            stopped_tx,
        };
        (core, install_tx, report_tx)
    }

    /// Runs the loop until the engine is dying and every worker stopped.
    pub(crate) async fn run(mut self) -> Result<(), WorkerError> {
        let mut saw_dying = false;
        loop {
            let turn = tokio::select! {
                _ = self.dying.cancelled(), if !saw_dying => Turn::Dying,
                Some(ticket) = self.install_rx.recv() => Turn::Install(ticket),
                Some(ticket) = self.started_rx.recv() => Turn::Started(ticket),
                Some(ticket) = self.stopped_rx.recv() => Turn::Stopped(ticket),
                Some(ticket) = self.report_rx.recv() => Turn::Report(ticket),
            };

            match turn {
                Turn::Dying => {
                    saw_dying = true;
                    self.bus.publish(Event::now(EventKind::EngineDying));
                    let names: Vec<String> = self.current.keys().cloned().collect();
                    for name in names {
                        self.request_stop(&name);
                    }
                }
                Turn::Install(ticket) => {
                    let outcome = self.handle_install(ticket.name, ticket.manifold);
                    let _ = ticket.reply.send(outcome);
                }
                Turn::Started(ticket) => self.handle_started(ticket.name, ticket.worker),
                Turn::Stopped(ticket) => self.handle_stopped(ticket.name, ticket.result),
                Turn::Report(ticket) => {
                    let _ = ticket.reply.send(self.handle_report());
                }
            }

            if self.dying.is_cancelled() && self.all_stopped() {
                self.bus.publish(Event::now(EventKind::EngineStopped));
                return match self.worst_error.take() {
                    None => Ok(()),
                    Some(worst) => Err(worst),
                };
            }
        }
    }

    /// Registers a manifold and schedules its first start attempt.
    fn handle_install(&mut self, name: String, manifold: Manifold) -> Result<(), EngineError> {
        if self.manifolds.contains(&name) {
            return Err(EngineError::AlreadyInstalled { name });
        }
        self.check_acyclic(&name, &manifold)?;

        for input in manifold.inputs() {
            self.dependents
                .entry(input.clone())
                .or_default()
                .push(name.clone());
        }
        self.manifolds.insert(name.clone(), manifold);
        self.current.insert(name.clone(), WorkerInfo::default());
        self.bus
            .publish(Event::now(EventKind::ManifoldInstalled).with_manifold(name.as_str()));
        self.request_start(&name, Duration::ZERO);
        Ok(())
    }

    /// Rejects the candidate manifold if it would close a dependency cycle.
    ///
    /// Runs on the candidate graph before any state mutation, so a
    /// rejected install is a true no-op.
    fn check_acyclic(&self, name: &str, candidate: &Manifold) -> Result<(), EngineError> {
        let mut edges: HashMap<&str, &[String]> = HashMap::with_capacity(self.manifolds.len() + 1);
        for (installed, manifold) in self.manifolds.iter() {
            edges.insert(installed, manifold.inputs());
        }
        edges.insert(name, candidate.inputs());
        graph::validate_edges(&edges)
    }

    /// Dispatches a runner for the named manifold after `delay`.
    fn request_start(&mut self, name: &str, delay: Duration) {
        let Some(manifold) = self.manifolds.get(name) else {
            self.fail(WorkerError::fatal(format!(
                "start requested for unknown manifold '{name}'"
            )));
            return;
        };
        let start = manifold.start_fn();
        let inputs: Vec<String> = manifold.inputs().to_vec();

        let stopped = self.current.get(name).map_or(true, |info| info.stopped());
        if !stopped {
            self.fail(WorkerError::fatal(format!(
                "second start requested for '{name}' worker"
            )));
        }
        if self.dying.is_cancelled() {
            return;
        }

        if let Some(info) = self.current.get_mut(name) {
            info.starting = true;
        }
        let resources = self.snapshot_resources(&inputs);
        self.bus.publish(
            Event::now(EventKind::WorkerStarting)
                .with_manifold(name)
                .with_delay(delay),
        );
        tokio::spawn(
            Runner {
                name: name.to_string(),
                delay,
                start,
                resources,
                dying: self.dying.clone(),
                started_tx: self.started_tx.clone(),
                stopped_tx: self.stopped_tx.clone(),
            }
            .run(),
        );
    }

    /// Captures the frozen per-attempt view of the named inputs.
    fn snapshot_resources(&self, inputs: &[String]) -> Resources {
        let mut workers = HashMap::with_capacity(inputs.len());
        let mut outputs = HashMap::with_capacity(inputs.len());
        for input in inputs {
            workers.insert(
                input.clone(),
                self.current.get(input).and_then(|info| info.worker.clone()),
            );
            outputs.insert(
                input.clone(),
                self.manifolds.get(input).and_then(|m| m.output_fn()),
            );
        }
        Resources::new(workers, outputs)
    }

    /// Records a worker handed over by its runner, or kills it if it is no
    /// longer wanted.
    fn handle_started(&mut self, name: String, worker: WorkerRef) {
        let (present, stopping) = match self.current.get(&name) {
            Some(info) => (info.worker.is_some(), info.stopping),
            None => {
                worker.kill();
                self.fail(WorkerError::fatal(format!(
                    "start reported for unknown manifold '{name}'"
                )));
                return;
            }
        };

        if present {
            // An engine bug: two live workers for one manifold. The fresh
            // one is surplus; its runner will report the exit.
            worker.kill();
            self.fail(WorkerError::fatal(format!(
                "unexpected start of '{name}' worker"
            )));
            return;
        }
        if stopping || self.dying.is_cancelled() {
            worker.kill();
            return;
        }

        if let Some(info) = self.current.get_mut(&name) {
            info.starting = false;
            info.worker = Some(worker);
        }
        self.bus
            .publish(Event::now(EventKind::WorkerStarted).with_manifold(name.as_str()));
        self.bounce_dependents(&name);
    }

    /// Interprets a worker's demise (or a failed start attempt).
    fn handle_stopped(&mut self, name: String, result: Result<(), WorkerError>) {
        let (was_stopping, had_worker, was_stopped) = match self.current.get(&name) {
            Some(info) => (info.stopping, info.worker.is_some(), info.stopped()),
            None => {
                self.fail(WorkerError::fatal(format!(
                    "stop reported for unknown manifold '{name}'"
                )));
                return;
            }
        };

        if was_stopped {
            self.fail(WorkerError::fatal(format!(
                "unexpected stop of '{name}' worker"
            )));
        } else if let Err(err) = &result {
            if (self.config.is_fatal)(err) {
                self.record_fatal(err.clone());
                self.dying.cancel();
            }
        }

        if let Some(info) = self.current.get_mut(&name) {
            *info = WorkerInfo::default();
        }
        match &result {
            Ok(()) | Err(WorkerError::Dying) => self
                .bus
                .publish(Event::now(EventKind::WorkerStopped).with_manifold(name.as_str())),
            Err(err) => self.bus.publish(
                Event::now(EventKind::WorkerFailed)
                    .with_manifold(name.as_str())
                    .with_error(err.to_string()),
            ),
        }

        if self.dying.is_cancelled() {
            return;
        }

        if was_stopping {
            // We stopped it ourselves; restart whatever else happened.
            self.request_start(&name, self.config.bounce_delay);
        } else {
            match &result {
                // Completed cleanly; nothing to do until an input changes.
                Ok(()) => {}
                // Cannot start against the current inputs; a bounce from an
                // input change will re-drive it.
                Err(WorkerError::Missing) => {}
                Err(_) => self.request_start(&name, self.config.error_delay),
            }
        }

        // Dependents only need to know when a live worker disappeared.
        if had_worker {
            self.bounce_dependents(&name);
        }
    }

    /// Starts every stopped dependent of the named manifold and stops every
    /// started one; the stopped ones reschedule themselves on their stopped
    /// tickets.
    fn bounce_dependents(&mut self, name: &str) {
        let Some(dependents) = self.dependents.get(name).cloned() else {
            return;
        };
        for dependent in dependents {
            let stopped = self
                .current
                .get(&dependent)
                .is_some_and(|info| info.stopped());
            if stopped {
                self.request_start(&dependent, self.config.bounce_delay);
            } else {
                self.request_stop(&dependent);
            }
        }
    }

    /// Ensures a running or starting worker will stop in the near future.
    fn request_stop(&mut self, name: &str) {
        let Some(info) = self.current.get_mut(name) else {
            return;
        };
        if info.stopping || info.stopped() {
            return;
        }
        info.stopping = true;
        if let Some(worker) = &info.worker {
            worker.kill();
        }
        self.bus
            .publish(Event::now(EventKind::StopRequested).with_manifold(name));
    }

    /// Synthesizes the status snapshot.
    fn handle_report(&self) -> EngineReport {
        let workers = self
            .current
            .iter()
            .map(|(name, info)| {
                (
                    name.clone(),
                    WorkerReport {
                        starting: info.starting,
                        stopping: info.stopping,
                        running: info.worker.is_some(),
                        report: info.worker.as_ref().and_then(|worker| worker.report()),
                    },
                )
            })
            .collect();
        EngineReport {
            is_dying: self.dying.is_cancelled(),
            manifold_count: self.manifolds.len(),
            workers,
        }
    }

    /// Marks the engine fatally broken: folds the error and begins
    /// shutdown. Used for invariant violations, which bypass the
    /// configured classifier.
    fn fail(&mut self, err: WorkerError) {
        self.record_fatal(err);
        self.dying.cancel();
    }

    /// Folds a fatal error into `worst_error`: the first one seeds the
    /// fold, later ones go through the configured ranker.
    fn record_fatal(&mut self, err: WorkerError) {
        self.worst_error = Some(match self.worst_error.take() {
            None => err,
            Some(worst) => (self.config.more_important)(err, worst),
        });
    }

    /// True when no worker is running or starting.
    fn all_stopped(&self) -> bool {
        self.current.values().all(|info| info.stopped())
    }
}
