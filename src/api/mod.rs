//! HTTP 网关
//!
//! 把钱包会话和协议目录暴露给浏览器 UI

use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::app_state::AppState;

pub mod handlers;
pub mod middleware;
pub mod network_api;
pub mod protocol_api;
pub mod response; // 统一响应格式
pub mod wallet_api;

pub use middleware::trace_id_middleware;

/// 组装全部路由和中间件
pub fn routes(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/networks", get(network_api::list_networks))
        .route("/api/protocols", get(protocol_api::list_protocols))
        .route("/api/protocols/:id", get(protocol_api::get_protocol))
        .route("/api/interactions", post(protocol_api::record_interaction))
        .route("/api/interactions/:address", get(protocol_api::list_interactions))
        .nest("/api/wallet", wallet_api::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(trace_id_middleware)),
        )
        .with_state(state)
}

/// 未配置来源时允许任意来源（本地开发）
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-trace-id")])
}
