//! Dependency-change propagation: missing-dependency retries driven by
//! bounces, and the full cascade across a chain.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use depvisor::WorkerRef;

use common::Counters;

#[tokio::test]
async fn missing_dependency_waits_for_a_bounce() {
    let engine = common::engine();
    let b = Counters::default();

    // b is installed before its input exists: the first attempt returns
    // the missing sentinel and the engine leaves b alone.
    engine
        .install("b", common::chained_manifold(&["a"], &b))
        .await
        .unwrap();
    common::wait_until("b's first attempt", || b.attempts() == 1).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(b.attempts(), 1, "missing dependency must not be polled");
    assert_eq!(b.spawned(), 0);

    // Installing a starts its worker; the started event bounces b, and the
    // retry finds its input in place.
    let a = Counters::default();
    engine
        .install("a", common::chained_manifold(&[], &a))
        .await
        .unwrap();
    common::wait_for(&engine, "b running", |r| common::running(r, "b")).await;
    assert_eq!(b.attempts(), 2, "one input change, one retry");
    assert_eq!(b.spawned(), 1);

    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));
}

#[tokio::test]
async fn bounce_cascade_restarts_the_whole_chain() {
    // A wide gap between the bounce and error delays keeps the instance
    // counting deterministic: every missing-input retry settles long before
    // the failed root is restarted.
    let mut cfg = common::config();
    cfg.error_delay = Duration::from_millis(150);
    let engine = depvisor::Engine::new(cfg).unwrap();
    let a = Counters::default();
    let b = Counters::default();
    let c = Counters::default();
    let a_worker: Arc<Mutex<Option<WorkerRef>>> = Arc::new(Mutex::new(None));

    engine
        .install("a", common::fragile_manifold(&a, &a_worker))
        .await
        .unwrap();
    engine
        .install("b", common::chained_manifold(&["a"], &b))
        .await
        .unwrap();
    engine
        .install("c", common::chained_manifold(&["b"], &c))
        .await
        .unwrap();
    common::wait_for(&engine, "chain running", |r| {
        common::running(r, "a") && common::running(r, "b") && common::running(r, "c")
    })
    .await;

    // Kill a's worker behind the engine's back. It exits with a transient
    // error, so a restarts after the error delay and the bounce propagates
    // down the chain.
    let worker = a_worker.lock().unwrap().take().unwrap();
    worker.kill();

    common::wait_until("a's second instance", || a.spawned() == 2).await;
    common::wait_for(&engine, "chain running again", |r| {
        common::running(r, "a") && common::running(r, "b") && common::running(r, "c")
    })
    .await;

    // Exactly one fresh worker instance per component.
    assert_eq!(a.spawned(), 2);
    assert_eq!(b.spawned(), 2);
    assert_eq!(c.spawned(), 2);

    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));
}

#[tokio::test]
async fn dependent_of_a_clean_exit_observes_the_disappearance() {
    let engine = common::engine();
    let a = Counters::default();
    let b = Counters::default();

    engine
        .install("a", common::oneshot_manifold(&a))
        .await
        .unwrap();
    engine
        .install("b", common::chained_manifold(&["a"], &b))
        .await
        .unwrap();

    // a's worker exits cleanly almost immediately; whether b ever saw it,
    // the engine settles with b down and no further attempts for either.
    common::wait_until("a finished", || a.spawned() == 1).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let report = engine.report().await.unwrap();
    assert!(!common::running(&report, "a"));
    assert!(!common::running(&report, "b"));
    assert_eq!(a.attempts(), 1);

    engine.kill();
    assert_eq!(engine.wait().await, Ok(()));
}
