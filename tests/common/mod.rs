#![allow(dead_code)]

//! Shared helpers for the integration tests: a fast-paced engine config,
//! counting manifolds, and report polling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use depvisor::{
    Engine, EngineConfig, EngineReport, Manifold, WorkerError, WorkerFn, WorkerRef,
};

/// Engine config with short delays so tests converge quickly.
pub fn config() -> EngineConfig {
    let mut cfg = EngineConfig::new(
        |err: &WorkerError| err.is_fatal(),
        |candidate, _worst| candidate,
    );
    cfg.error_delay = Duration::from_millis(50);
    cfg.bounce_delay = Duration::from_millis(10);
    cfg
}

pub fn engine() -> Engine {
    Engine::new(config()).expect("test config is valid")
}

/// Attempt and spawn counters shared with a manifold's start function.
///
/// `attempts` counts every start invocation, `spawned` only those that got
/// past their dependency checks and produced a worker.
#[derive(Clone, Default)]
pub struct Counters {
    attempts: Arc<AtomicUsize>,
    spawned: Arc<AtomicUsize>,
}

impl Counters {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

/// Worker that blocks until killed, then exits cleanly.
pub fn blocking_worker() -> WorkerRef {
    WorkerFn::spawn(|token| async move {
        token.cancelled().await;
        Ok(())
    })
}

/// Manifold that requires every input to have a live worker, then blocks
/// until killed. With no inputs it acts as a root of the graph.
pub fn chained_manifold(inputs: &[&str], counters: &Counters) -> Manifold {
    let names: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
    let check = names.clone();
    let counters = counters.clone();
    Manifold::new(names, move |res| {
        counters.attempts.fetch_add(1, Ordering::SeqCst);
        let check = check.clone();
        let counters = counters.clone();
        async move {
            for name in &check {
                res.exists(name)?;
            }
            counters.spawned.fetch_add(1, Ordering::SeqCst);
            Ok(blocking_worker())
        }
    })
}

/// Manifold whose worker exits cleanly the moment it starts.
pub fn oneshot_manifold(counters: &Counters) -> Manifold {
    let counters = counters.clone();
    Manifold::new(Vec::<String>::new(), move |_res| {
        counters.attempts.fetch_add(1, Ordering::SeqCst);
        counters.spawned.fetch_add(1, Ordering::SeqCst);
        async move { Ok(WorkerFn::spawn(|_token| async move { Ok(()) })) }
    })
}

/// Root manifold whose worker exits with a transient error when killed from
/// outside; the latest worker handle is parked in `slot` so tests can kill
/// it behind the engine's back.
pub fn fragile_manifold(counters: &Counters, slot: &Arc<Mutex<Option<WorkerRef>>>) -> Manifold {
    let counters = counters.clone();
    let slot = Arc::clone(slot);
    Manifold::new(Vec::<String>::new(), move |_res| {
        counters.attempts.fetch_add(1, Ordering::SeqCst);
        counters.spawned.fetch_add(1, Ordering::SeqCst);
        let slot = Arc::clone(&slot);
        async move {
            let worker = WorkerFn::spawn(|token| async move {
                token.cancelled().await;
                Err(WorkerError::fail("connection dropped"))
            });
            *slot.lock().unwrap() = Some(Arc::clone(&worker));
            Ok(worker)
        }
    })
}

/// True if the named worker is currently running according to the report.
pub fn running(report: &EngineReport, name: &str) -> bool {
    report.worker(name).map(|w| w.running).unwrap_or(false)
}

/// Polls the engine report until `pred` holds, panicking after 5 seconds.
pub async fn wait_for<F>(engine: &Engine, what: &str, mut pred: F) -> EngineReport
where
    F: FnMut(&EngineReport) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let mut last: Option<EngineReport> = None;
    while tokio::time::Instant::now() < deadline {
        if let Ok(report) = engine.report().await {
            if pred(&report) {
                return report;
            }
            last = Some(report);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}; last report: {last:?}");
}

/// Polls an arbitrary condition until it holds, panicking after 5 seconds.
pub async fn wait_until<F>(what: &str, mut cond: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}
