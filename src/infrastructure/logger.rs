//! 日志基础设施

use tracing_subscriber::EnvFilter;

use crate::config::{Environment, LoggingConfig};

pub struct Logger;

impl Logger {
    /// 初始化全局 tracing subscriber
    ///
    /// 设置了 `RUST_LOG` 时以其为准，否则使用配置中的级别。
    /// 生产环境输出 JSON 行，开发环境输出带颜色的紧凑格式。
    pub fn init(config: &LoggingConfig, environment: Environment) -> anyhow::Result<()> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.level)?,
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false);

        let result = if environment.is_production() {
            builder.json().try_init()
        } else {
            builder.compact().with_ansi(true).try_init()
        };

        result.map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))
    }
}
