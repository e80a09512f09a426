//! End-to-end lifecycle behaviour: convergence, clean shutdown, report
//! contents, and the shutdown-in-progress guard on public operations.

mod common;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use depvisor::{Engine, EngineError, Manifold, Worker, WorkerError};

use common::Counters;

#[tokio::test]
async fn linear_chain_converges_and_shuts_down_cleanly() {
    let engine = common::engine();
    let a = Counters::default();
    let b = Counters::default();

    engine
        .install("a", common::chained_manifold(&[], &a))
        .await
        .unwrap();
    engine
        .install("b", common::chained_manifold(&["a"], &b))
        .await
        .unwrap();

    let report = common::wait_for(&engine, "a and b running", |r| {
        common::running(r, "a") && common::running(r, "b")
    })
    .await;
    assert!(!report.is_dying);
    assert_eq!(report.manifold_count, 2);
    assert_eq!(a.spawned(), 1);
    assert_eq!(b.spawned(), 1);

    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));
}

#[tokio::test]
async fn kill_is_idempotent_and_wait_can_be_repeated() {
    let engine = common::engine();
    let a = Counters::default();
    engine
        .install("a", common::chained_manifold(&[], &a))
        .await
        .unwrap();
    common::wait_for(&engine, "a running", |r| common::running(r, "a")).await;

    engine.kill();
    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));
    assert_eq!(engine.wait().await, Ok(()));
}

#[tokio::test]
async fn operations_after_kill_return_shutting_down() {
    let engine = common::engine();
    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));

    let spare = Counters::default();
    assert_eq!(
        engine
            .install("late", common::chained_manifold(&[], &spare))
            .await,
        Err(EngineError::ShuttingDown)
    );
    assert!(matches!(
        engine.report().await,
        Err(EngineError::ShuttingDown)
    ));
    assert_eq!(spare.attempts(), 0);
}

#[tokio::test]
async fn clean_exit_is_not_restarted() {
    let engine = common::engine();
    let a = Counters::default();
    engine
        .install("a", common::oneshot_manifold(&a))
        .await
        .unwrap();

    common::wait_until("a's first attempt", || a.spawned() == 1).await;
    // Several error-delay windows pass without a second attempt.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(a.attempts(), 1);

    let report = engine.report().await.unwrap();
    let worker = report.worker("a").unwrap();
    assert!(!worker.starting);
    assert!(!worker.stopping);
    assert!(!worker.running);

    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));
}

struct Reporting {
    token: CancellationToken,
}

#[async_trait]
impl Worker for Reporting {
    fn kill(&self) {
        self.token.cancel();
    }

    async fn wait(&self) -> Result<(), WorkerError> {
        self.token.cancelled().await;
        Ok(())
    }

    fn report(&self) -> Option<serde_json::Value> {
        Some(json!({ "connections": 3 }))
    }
}

#[tokio::test]
async fn reporter_capability_surfaces_in_report() {
    let engine = common::engine();
    engine
        .install(
            "api",
            Manifold::new(Vec::<String>::new(), |_res| async {
                let worker: depvisor::WorkerRef = std::sync::Arc::new(Reporting {
                    token: CancellationToken::new(),
                });
                Ok(worker)
            }),
        )
        .await
        .unwrap();

    let report = common::wait_for(&engine, "api running", |r| common::running(r, "api")).await;
    assert_eq!(
        report.worker("api").unwrap().report,
        Some(json!({ "connections": 3 }))
    );

    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));
}

#[tokio::test]
async fn dropping_the_engine_winds_the_loop_down() {
    let a = Counters::default();
    {
        let engine = common::engine();
        engine
            .install("a", common::chained_manifold(&[], &a))
            .await
            .unwrap();
        common::wait_for(&engine, "a running", |r| common::running(r, "a")).await;
    }
    // The drop cancelled the dying token; no further attempts happen.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(a.attempts(), 1);
}

#[tokio::test]
async fn events_receiver_observes_the_lifecycle() {
    let engine = common::engine();
    let mut events = engine.events();
    let a = Counters::default();
    engine
        .install("a", common::chained_manifold(&[], &a))
        .await
        .unwrap();
    common::wait_for(&engine, "a running", |r| common::running(r, "a")).await;
    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));

    let mut kinds = Vec::new();
    while let Ok(ev) = events.try_recv() {
        kinds.push(ev.kind);
    }
    assert!(kinds.contains(&depvisor::EventKind::ManifoldInstalled));
    assert!(kinds.contains(&depvisor::EventKind::WorkerStarted));
    assert!(kinds.contains(&depvisor::EventKind::EngineDying));
    assert!(kinds.contains(&depvisor::EventKind::EngineStopped));
}

#[tokio::test]
async fn engine_with_no_manifolds_shuts_down_cleanly() {
    let engine = Engine::new(common::config()).unwrap();
    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));
}
