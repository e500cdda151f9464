//! Treasury server binary

use treasury_core::{Config, Treasury};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Guild Treasury");

    // Load configuration
    let config = Config::from_env()?;

    // Open the treasury
    let treasury = Treasury::open(config).await?;
    tracing::info!(
        accounts = treasury.account_count(),
        "Treasury opened successfully"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down treasury");
    treasury.shutdown().await?;
    Ok(())
}
