//! autodev-setup - probe and smoke-test the hosted inference models.
//!
//! Writes `huggingface_config.json` into the game directory. Exits non-zero
//! when half or fewer of the smoke tests pass.

use autodev::{backend::GameAi, config::Config, setup};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autodev=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let inference = config.inference.clone().unwrap_or_default();
    if inference.api_token.is_none() {
        warn!("HF_API_TOKEN not set; using the anonymous Inference API tier");
    }
    info!("Hosted inference at {}", inference.base_url);

    let ai = GameAi::from_config(&inference);
    let report = setup::run_setup(&ai, &inference.base_url, &config.game_path).await?;

    println!(
        "Models available: {} ({})",
        report.manifest.models_loaded.len(),
        report.manifest.models_loaded.join(", ")
    );
    println!(
        "Smoke tests passed: {}/{}",
        report.passed(),
        report.smoke_tests.len()
    );
    println!("Configuration: {}", report.manifest_path.display());

    if !report.success {
        anyhow::bail!("setup completed with warnings: most smoke tests failed");
    }
    Ok(())
}
