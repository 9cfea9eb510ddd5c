//! PayForge 主入口
//! 多链批量薪酬支付后端

use anyhow::{Context, Result};
use payforge::{api, app_state::AppState, config::Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 初始化日志（结构化日志，敏感字段在写入点脱敏）
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payforge=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PayForge multi-chain payroll backend");

    // 3. 加载配置（环境变量 > 配置文件 > 默认值）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;

    // 4. 初始化应用状态
    let bind_addr = config.server.bind_addr.clone();
    let state = AppState::new(config)?;
    tracing::info!(
        chains = state.registry.list().len(),
        "Chain registry initialized"
    );

    // 5. 启动HTTP服务
    let app = api::routes(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
