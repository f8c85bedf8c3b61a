//! # Booth API
//!
//! 用户管理 REST 服务，数据保存在进程内存中：
//! - 用户的增删改查，列表支持搜索和分页
//! - 请求体字段校验
//! - 请求日志、限流、CORS、安全响应头、统一错误处理

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;
pub mod server;
pub mod utils;

pub use crate::app::{users::UserStore, AppState};
pub use crate::config::AppConfig;
pub use crate::core::error::CoreError;
pub use crate::server::build_router;
