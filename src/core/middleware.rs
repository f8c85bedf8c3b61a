//! 核心中间件模块

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{any::Any, net::SocketAddr, time::Instant};
use tracing::{error, info, warn};

use super::error::CoreError;
use crate::app::AppState;

/// 客户端 IP，没有连接信息时（例如测试中）为 `unknown`
pub fn client_ip(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 请求日志中间件
///
/// 按状态码分级：5xx 为 error，4xx 为 warn，其余为 info。不修改响应。
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let ip = client_ip(&req);
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("Unknown")
        .to_string();

    let response = next.run(req).await;
    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;
    let content_length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();

    if status.is_server_error() {
        error!(%method, %uri, status = status.as_u16(), duration_ms, %ip, %user_agent, %content_length, "request");
    } else if status.is_client_error() {
        warn!(%method, %uri, status = status.as_u16(), duration_ms, %ip, %user_agent, %content_length, "request");
    } else {
        info!(%method, %uri, status = status.as_u16(), duration_ms, %ip, %user_agent, %content_length, "request");
    }

    response
}

/// 限流中间件，只挂在 `/api` 路由上
pub async fn rate_limiting_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, CoreError> {
    let client = client_ip(&req);

    let remaining = match state.rate_limiter.check(&client) {
        Ok(remaining) => remaining,
        Err(err) => {
            warn!("Rate limit exceeded for IP: {}", client);
            return Err(err);
        }
    };

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-ratelimit-limit",
        HeaderValue::from(state.rate_limiter.max_requests()),
    );
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));

    Ok(response)
}

/// 兜底：把 panic 转换成 500 内部错误
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "请求处理过程中发生 panic");
    CoreError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_panic_becomes_internal_error() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_client_ip_without_connect_info() {
        let req = Request::builder()
            .uri("/")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "unknown");
    }
}
