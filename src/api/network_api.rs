// Network registry API
// 返回可供选择的网络，前端据此渲染网络切换菜单

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::NetworkProfile,
    error::AppError,
};

/// GET /api/networks
/// 所有已注册网络，按链ID排序
pub async fn list_networks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<NetworkProfile>>>, AppError> {
    let networks = state.networks.list().into_iter().cloned().collect();
    success_response(networks)
}
