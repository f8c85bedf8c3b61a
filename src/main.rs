use booth_api::config::{publish_environment, AppConfig};
use booth_api::infrastructure::{clock::SystemClock, logger::Logger};
use booth_api::{server, AppState, UserStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载并验证配置
    let config = AppConfig::load()?;
    config.validate()?;
    publish_environment(config.environment);

    // 初始化日志
    Logger::init(&config.logging, config.environment)?;

    let users = UserStore::seeded(Arc::new(SystemClock));
    let state = AppState::new(config, users);

    server::serve(state).await
}
