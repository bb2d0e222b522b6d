//! 钱包会话 API
//!
//! 浏览器 UI 通过这些接口驱动会话：连接、断开、切换网络，并订阅会话变化

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use futures::{stream, Stream};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    api::{
        middleware::TraceId,
        response::{success_response, ApiResponse},
    },
    app_state::AppState,
    domain::{NetworkProfile, WalletSession},
    error::{AppError, WalletError},
    service::{wallet_provider::ProviderEvent, wallet_session_manager::SessionSigner},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(get_session))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .route("/network", get(get_network).post(select_network))
        .route("/preflight", post(preflight))
        .route("/events", get(session_events))
        .route("/provider-events", post(push_provider_event))
}

#[derive(Debug, Deserialize)]
pub struct SelectNetworkRequest {
    /// 名称、别名或链ID（十进制/十六进制）
    pub network: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreflightRequest {
    #[serde(default)]
    pub network: Option<String>,
}

/// 钱包桥接端转发的原始 EIP-1193 事件
#[derive(Debug, Deserialize)]
pub struct ProviderEventRequest {
    /// chainChanged / accountsChanged / disconnect
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct ProviderEventAck {
    /// 事件是否被分发（不关心的事件为 false）
    pub accepted: bool,
    pub event: Option<ProviderEvent>,
    /// 收到事件的监听者数量
    pub listeners: usize,
}

#[derive(Debug, Serialize)]
pub struct NetworkSelection {
    pub network: NetworkProfile,
    pub session: WalletSession,
}

/// GET /api/wallet/session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<WalletSession>>, AppError> {
    success_response(state.wallet.session())
}

/// POST /api/wallet/connect
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
) -> Result<Json<ApiResponse<WalletSession>>, AppError> {
    let session = state
        .wallet
        .connect()
        .await
        .map_err(|e| AppError::from(e).with_trace_id(trace_id.as_str()))?;
    success_response(session)
}

/// POST /api/wallet/disconnect
pub async fn disconnect(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<WalletSession>>, AppError> {
    state.wallet.disconnect();
    success_response(state.wallet.session())
}

/// GET /api/wallet/network
pub async fn get_network(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<NetworkProfile>>, AppError> {
    success_response(state.wallet.active_network())
}

/// POST /api/wallet/network
pub async fn select_network(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Json(req): Json<SelectNetworkRequest>,
) -> Result<Json<ApiResponse<NetworkSelection>>, AppError> {
    let profile = resolve_network(&state, &req.network, &trace_id)?;

    state
        .wallet
        .ensure_network(&profile)
        .await
        .map_err(|e| AppError::from(e).with_trace_id(trace_id.as_str()))?;

    success_response(NetworkSelection {
        network: profile,
        session: state.wallet.session(),
    })
}

/// POST /api/wallet/preflight
///
/// 交易构建前调用：返回已对齐网络的账户
pub async fn preflight(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    body: Option<Json<PreflightRequest>>,
) -> Result<Json<ApiResponse<SessionSigner>>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let signer = match req.network {
        Some(network) => {
            let profile = resolve_network(&state, &network, &trace_id)?;
            state.preflight.for_network(&profile).await
        }
        None => state.preflight.current().await,
    }
    .map_err(|e| AppError::from(e).with_trace_id(trace_id.as_str()))?;

    success_response(signer)
}

/// GET /api/wallet/events
///
/// 先推送当前快照，之后每次会话变化推送一次 `session` 事件
pub async fn session_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.wallet.subscribe();

    let events = stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let session = rx.borrow_and_update().clone();
        let data = serde_json::to_string(&session).unwrap_or_default();
        Some((Ok(Event::default().event("session").data(data)), (rx, false)))
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// POST /api/wallet/provider-events
///
/// 钱包桥接端把钱包侧的切链、切账户、断开推送到这里，会话随之更新
pub async fn push_provider_event(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Json(req): Json<ProviderEventRequest>,
) -> Result<Json<ApiResponse<ProviderEventAck>>, AppError> {
    let hub = state.provider_events.as_ref().ok_or_else(|| {
        AppError::from(WalletError::ProviderUnavailable).with_trace_id(trace_id.as_str())
    })?;

    let published = hub.publish_raw(&req.event, &req.data).map_err(|e| {
        AppError::bad_request(format!("invalid {} event: {}", req.event, e))
            .with_trace_id(trace_id.as_str())
    })?;

    let ack = match published {
        Some((event, listeners)) => ProviderEventAck {
            accepted: true,
            event: Some(event),
            listeners,
        },
        None => ProviderEventAck {
            accepted: false,
            event: None,
            listeners: 0,
        },
    };
    success_response(ack)
}

fn resolve_network(
    state: &AppState,
    identifier: &str,
    trace_id: &TraceId,
) -> Result<NetworkProfile, AppError> {
    state.networks.resolve(identifier).cloned().ok_or_else(|| {
        AppError::not_found(format!("unknown network: {}", identifier))
            .with_trace_id(trace_id.as_str())
    })
}
