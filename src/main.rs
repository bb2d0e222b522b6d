//! Mantle Hub 主入口

use std::sync::Arc;

use anyhow::{Context, Result};
use mantle_hub::{api, app_state::AppState, config::Config, infrastructure::logging};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 指向的文件优先）
    let config = Config::from_env_and_file(std::env::var("CONFIG_PATH").ok())?;

    // 3. 初始化日志
    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    config.validate().context("Invalid configuration")?;

    tracing::info!("Starting Mantle Hub wallet session gateway");

    let config = Arc::new(config);
    let state = Arc::new(AppState::new(Arc::clone(&config))?);
    let target = state.wallet.default_network();
    tracing::info!(
        chain_id = target.chain_id,
        network = %target.display_name,
        "Target network resolved"
    );

    // 4. 钱包外部事件（切链、切账户），由桥接端推送到 /api/wallet/provider-events
    if state.wallet.spawn_event_listener().is_some() {
        tracing::info!("Wallet event listener started");
    }

    let app = api::routes(Arc::clone(&state));

    // 5. 启动服务器
    let bind_addr = &config.server.bind_addr;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
