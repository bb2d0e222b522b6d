//! 网关响应格式
//!
//! 成功时返回 `{ code: 0, message: "success", data }`，`data` 是会话快照、网络或协议条目。
//!
//! 失败时由 `AppError` 输出，`code` 是字符串：钱包错误为其类别
//! （`provider_unavailable`、`user_rejected`、`network_mismatch`、`network_switch_failed`、
//! `already_connecting` 等），其余为 `bad_request` / `not_found`。
//! 钱包错误额外带 `user_rejected`，UI 据此区分"用户点了取消"和真正的故障：
//!
//! ```json
//! { "code": "network_mismatch", "message": "...", "user_rejected": true, "trace_id": "..." }
//! ```

use axum::Json;
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 成功恒为 0
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data,
        }
    }
}

/// 处理函数的统一返回
pub fn success_response<T: Serialize>(data: T) -> Result<Json<ApiResponse<T>>, AppError> {
    Ok(Json(ApiResponse::success(data)))
}
