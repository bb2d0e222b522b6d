use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::ConnectionState,
    error::AppError,
};

#[derive(Debug, Serialize)]
pub struct Healthz {
    pub status: &'static str,
    pub provider_available: bool,
    pub connection_state: ConnectionState,
    pub target_chain_id: u64,
    pub checked_at: DateTime<Utc>,
}

/// GET /healthz
pub async fn healthz(
    State(st): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Healthz>>, AppError> {
    let provider_available = st.wallet.has_provider();
    success_response(Healthz {
        // 没有钱包时服务仍可用，只是无法连接
        status: if provider_available { "ok" } else { "degraded" },
        provider_available,
        connection_state: st.wallet.session().connection_state(),
        target_chain_id: st.wallet.default_network().chain_id,
        checked_at: Utc::now(),
    })
}
