//! autodev-train - teach the pattern service the game's code.
//!
//! Requires `PATTERN_SERVICE_URL`. Writes `roblox_game_patterns.json` and
//! `training_report.json` into the game directory.

use std::sync::Arc;

use autodev::{backend::PatternServiceClient, config::Config, train::Trainer};
use tracing::info;
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
    let Some(pattern) = config.pattern.as_ref() else {
        eprintln!("Pattern service not configured.");
        eprintln!("  1. Start the pattern-assisted coder service");
        eprintln!("  2. export PATTERN_SERVICE_URL=http://host:port");
        eprintln!("  3. Re-run autodev-train");
        anyhow::bail!("missing required environment variable: PATTERN_SERVICE_URL");
    };

    info!(
        "Training on {} with pattern service {}",
        config.game_path.display(),
        pattern.base_url
    );
    let trainer = Trainer::new(
        Arc::new(PatternServiceClient::new(pattern.base_url.clone())),
        &config.game_path,
    );

    match trainer.run().await? {
        Some(report) => {
            println!("Files trained: {}", report.files_trained);
            println!("Patterns learned: {}", report.patterns_found);
            println!(
                "Test success rate: {}/{}",
                report.test_successes, report.test_total
            );
            println!("Model saved to: {}", report.model_path.display());
            Ok(())
        }
        None => anyhow::bail!("no training data found under {}", config.src_path().display()),
    }
}
