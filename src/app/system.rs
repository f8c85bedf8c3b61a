//! 根路径、健康检查与 404 处理器

use axum::{
    extract::{OriginalUri, State},
    http::Method,
    response::Json,
};
use serde_json::{json, Value};

use super::AppState;
use crate::core::error::CoreError;

/// API 信息
pub async fn api_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Bem-vindo à Booth API!",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "environment": state.config.environment.as_str(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// 健康检查
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// 未匹配的路由，回显原始路径（含查询串）和方法
///
/// 嵌套路由里 `Uri` 已去掉前缀，所以取 `OriginalUri`。
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> CoreError {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    CoreError::RouteNotFound {
        path,
        method: method.to_string(),
    }
}
