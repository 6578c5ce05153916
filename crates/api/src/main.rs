use anyhow::Context;

use piggybank_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    piggybank_observability::init(&config.log.filter, config.log.format);

    let app = piggybank_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        snapshots = config.storage.snapshot_dir.is_some(),
        log_format = %config.log.format,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
