use std::net::SocketAddr;

use anyhow::Context;

use inventra_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    inventra_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.bootstrap_admin_api_key.is_none() {
        tracing::warn!("BOOTSTRAP_ADMIN_API_KEY not set; no account can obtain a token until one is provisioned");
    }

    let app = inventra_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, issuer = %config.token.issuer, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
