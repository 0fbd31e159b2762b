//! ironsign 服务入口

use std::sync::Arc;

use anyhow::{Context, Result};
use ironsign::{api, app_state::AppState, config::Config, infrastructure::logging};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // CONFIG_PATH 指向的 TOML 文件优先，否则读环境变量
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;

    let _log_guard = logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    config.validate().context("invalid configuration")?;

    tracing::info!(
        bind_addr = %config.server.bind_addr,
        oracle = %config.oracle.base_url,
        testnet = config.testnet,
        "starting ironsign"
    );

    let bind_addr = config.server.bind_addr.clone();
    let state = Arc::new(AppState::from_config(Arc::new(config)));
    let app = api::routes(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!(addr = %bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
    }
}
