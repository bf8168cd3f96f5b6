//! autodev - improvement loop entry point
//!
//! Scans the game's Lua sources, develops the most severe findings and
//! writes accepted implementations under `generated_features/`.

use std::sync::Arc;

use autodev::{
    backend::Backends,
    config::Config,
    pipeline::Developer,
    source::{GameScanner, ScanRules},
    worker::ImprovementLoop,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autodev=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Autonomous Roblox game developer: game={} iterations={}",
        config.game_path.display(),
        config.max_iterations
    );

    let backends = Backends::from_config(&config);
    info!("Available backends: {:?}", backends.available());

    let scanner = GameScanner::new(
        config.src_path(),
        ScanRules {
            complex_conditionals: config.scan_complex_conditionals,
        },
    );
    let developer = Developer::from_config(&config, &backends);
    let mut improvement = ImprovementLoop::new(Arc::new(scanner), developer, &config);

    // Ctrl+C stops the loop at its next check
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current step");
                cancel.cancel();
            }
        });
    }

    let summary = improvement.run(&cancel).await;
    println!(
        "Features developed: {}/{}",
        summary.succeeded, summary.attempted
    );

    Ok(())
}
