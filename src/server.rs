//! 路由与服务启动
//!
//! 中间件由外到内：panic 兜底 -> TraceLayer -> 请求日志 -> 安全响应头 -> CORS
//! -> 超时 -> 请求体上限 -> 路由。限流只作用于 `/api` 前缀，包括其中未匹配的路径。

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::app::{system, users::handler, AppState};
use crate::config::{AppConfig, CorsConfig};
use crate::core::middleware::{handle_panic, rate_limiting_middleware, request_logging_middleware};

/// 构建完整路由
pub fn build_router(state: AppState) -> Router {
    // 限流层同时覆盖 `/api` 下未匹配的路径
    let api = Router::new()
        .route("/health", get(system::health_check))
        .route("/users", get(handler::list_users).post(handler::create_user))
        .route(
            "/users/:id",
            get(handler::get_user)
                .put(handler::update_user)
                .delete(handler::delete_user),
        )
        .fallback(system::not_found)
        .layer(from_fn_with_state(state.clone(), rate_limiting_middleware));

    let config = state.config.clone();

    Router::new()
        .route("/", get(system::api_info))
        .nest("/api", api)
        .fallback(system::not_found)
        .layer(DefaultBodyLimit::max(config.http.body_limit_bytes))
        .layer(TimeoutLayer::new(config.timeout()))
        .layer(cors_layer(&config.cors))
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_DNS_PREFETCH_CONTROL,
                    HeaderValue::from_static("off"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::STRICT_TRANSPORT_SECURITY,
                    HeaderValue::from_static("max-age=15552000; includeSubDomains"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("cross-origin-opener-policy"),
                    HeaderValue::from_static("same-origin"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("cross-origin-resource-policy"),
                    HeaderValue::from_static("same-origin"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_XSS_PROTECTION,
                    HeaderValue::from_static("0"),
                )),
        )
        .layer(from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// CORS：配置的来源列表、允许凭证
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("忽略无效的 CORS 来源: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// 绑定地址并运行服务，直到收到 SIGINT / SIGTERM
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let config: &AppConfig = &state.config;
    let addr = config.socket_addr()?;
    let environment = config.environment;

    let app = build_router(state.clone());
    let listener = TcpListener::bind(addr).await?;

    info!("🚀 Servidor rodando na porta {}", addr.port());
    info!("📝 Environment: {}", environment);
    info!("👥 Usuários em memória: {}", state.users.count()?);
    info!("📝 Acesse: http://localhost:{}", addr.port());

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("服务器已关闭");
    Ok(())
}

/// 关闭信号处理
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("无法监听 Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("无法监听 SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT signal received: closing HTTP server"),
        _ = terminate => info!("SIGTERM signal received: closing HTTP server"),
    }
}
