//! A flaky root worker takes down and revives its dependents.
//!
//! The `source` worker fails once shortly after its first start; the engine
//! restarts it after the error delay and bounces `pump` and `sink` so they
//! reconnect to the fresh instance.
//!
//! Run with: `cargo run --example bounce_cascade --features logging`

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use depvisor::{Engine, EngineConfig, LogWriter, Manifold, WorkerError, WorkerFn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut cfg = EngineConfig::new(
        |err: &WorkerError| err.is_fatal(),
        |candidate, _worst| candidate,
    );
    cfg.error_delay = Duration::from_millis(200);
    cfg.bounce_delay = Duration::from_millis(50);

    let engine = Engine::with_subscribers(cfg, vec![Arc::new(LogWriter)])?;

    let failed_once = Arc::new(AtomicBool::new(false));
    engine
        .install(
            "source",
            Manifold::new(Vec::<String>::new(), move |_res| {
                let failed_once = Arc::clone(&failed_once);
                async move {
                    Ok(WorkerFn::spawn(move |token| async move {
                        if !failed_once.swap(true, Ordering::SeqCst) {
                            tokio::time::sleep(Duration::from_millis(300)).await;
                            return Err(WorkerError::fail("stream interrupted"));
                        }
                        token.cancelled().await;
                        Ok(())
                    }))
                }
            }),
        )
        .await?;

    for (name, input) in [("pump", "source"), ("sink", "pump")] {
        engine
            .install(
                name,
                Manifold::new([input], move |res| async move {
                    res.exists(input)?;
                    Ok(WorkerFn::spawn(|token| async move {
                        token.cancelled().await;
                        Ok(())
                    }))
                }),
            )
            .await?;
    }

    // Let the failure and the cascade play out, then shut down.
    tokio::time::sleep(Duration::from_secs(2)).await;
    engine.kill();
    engine.wait().await?;
    Ok(())
}
