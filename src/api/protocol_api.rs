//! 协议目录与交互记录 API

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    api::{
        middleware::TraceId,
        response::{success_response, ApiResponse},
    },
    app_state::AppState,
    domain::protocol::{all_protocols, find_protocol, Protocol},
    error::{AppError, WalletError},
    service::interaction_ledger::{InteractionCount, InteractionError},
};

#[derive(Debug, Deserialize)]
pub struct RecordInteractionRequest {
    #[serde(alias = "protocolId")]
    pub protocol_id: u32,
    /// 缺省时使用当前会话的账户
    #[serde(default)]
    pub address: Option<String>,
}

/// GET /api/protocols
pub async fn list_protocols() -> Result<Json<ApiResponse<&'static [Protocol]>>, AppError> {
    success_response(all_protocols())
}

/// GET /api/protocols/:id
pub async fn get_protocol(
    Extension(trace_id): Extension<TraceId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<&'static Protocol>>, AppError> {
    // 非数字 id 同样视为不存在
    id.parse::<u32>()
        .ok()
        .and_then(find_protocol)
        .map(ApiResponse::success)
        .map(Json)
        .ok_or_else(|| {
            AppError::not_found(format!("protocol not found: {}", id)).with_trace_id(trace_id.as_str())
        })
}

/// GET /api/interactions/:address
pub async fn list_interactions(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<Vec<InteractionCount>>>, AppError> {
    let counts = state
        .interactions
        .for_address(&address)
        .await
        .map_err(|e| interaction_error(e, &trace_id))?;
    success_response(counts)
}

/// POST /api/interactions
pub async fn record_interaction(
    State(state): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Json(req): Json<RecordInteractionRequest>,
) -> Result<Json<ApiResponse<InteractionCount>>, AppError> {
    let address = match req.address {
        Some(address) => address,
        None => state.wallet.get_active_address().ok_or_else(|| {
            AppError::from(WalletError::NotConnected).with_trace_id(trace_id.as_str())
        })?,
    };

    let count = state
        .interactions
        .record(&address, req.protocol_id)
        .await
        .map_err(|e| interaction_error(e, &trace_id))?;
    success_response(count)
}

fn interaction_error(err: InteractionError, trace_id: &TraceId) -> AppError {
    let error = match err {
        InteractionError::UnknownProtocol(_) => AppError::not_found(err.to_string()),
        InteractionError::InvalidAddress(_) => AppError::bad_request(err.to_string()),
    };
    error.with_trace_id(trace_id.as_str())
}
