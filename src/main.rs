use chrono::Local;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fabled_news::config::{ApiKey, Config};
use fabled_news::fetcher::Fetcher;
use fabled_news::generator::GeminiClient;
use fabled_news::models::TIMESTAMP_FORMAT;
use fabled_news::pipeline::{self, RunOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fabled_news=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Credential is checked before any work happens
    let api_key = ApiKey::from_env()?;

    info!(
        "Starting job at {}",
        Local::now().format(TIMESTAMP_FORMAT)
    );

    let config = Config::load_or_default("feeds.toml")?;
    info!("Loaded {} feeds from configuration", config.feeds.len());

    let fetcher = Fetcher::new(&config)?;
    let gemini = GeminiClient::new(&config.gemini, api_key)?;

    match pipeline::run(&config, &fetcher, &gemini).await? {
        RunOutcome::Published { count, path } => {
            info!("Success! Saved {} stories to {}", count, path.display())
        }
        RunOutcome::NoCandidates => info!("Run ended without candidates"),
        RunOutcome::GenerationFailed => info!("Run ended without publishing"),
    }

    Ok(())
}
