//! Install a two-link chain, watch it converge, then shut down.
//!
//! Run with: `cargo run --example linear_chain --features logging`

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use depvisor::{Engine, EngineConfig, LogWriter, Manifold, WorkerError, WorkerFn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let engine = Engine::with_subscribers(
        EngineConfig::new(
            |err: &WorkerError| err.is_fatal(),
            |candidate, _worst| candidate,
        ),
        vec![Arc::new(LogWriter)],
    )?;

    engine
        .install(
            "api",
            Manifold::new(Vec::<String>::new(), |_res| async {
                Ok(WorkerFn::spawn(|token| async move {
                    token.cancelled().await;
                    Ok(())
                }))
            }),
        )
        .await?;

    engine
        .install(
            "watcher",
            Manifold::new(["api"], |res| async move {
                res.exists("api")?;
                Ok(WorkerFn::spawn(|token| async move {
                    token.cancelled().await;
                    Ok(())
                }))
            }),
        )
        .await?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    let report = engine.report().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    engine.kill();
    engine.wait().await?;
    Ok(())
}
