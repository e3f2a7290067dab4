use anyhow::Result;
use clap::Parser;
use fxgate::config::AppConfig;
use fxgate::log::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Values from .env never override the real environment
    let dotenv = dotenvy::dotenv();
    let config = AppConfig::parse();

    init_logging(config.verbose);
    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(_) => tracing::info!("No .env file found, using system environment variables"),
    }

    let result = fxgate::run(config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
