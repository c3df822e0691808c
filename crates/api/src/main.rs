use anyhow::Context;

use rodstock_api::app::{self, services::AppServices};
use rodstock_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rodstock_observability::init();

    let config = AppConfig::from_env()?;
    let services = AppServices::from_config(&config)?;
    let router = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router).await?;
    Ok(())
}
