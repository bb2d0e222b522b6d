use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::service::wallet_provider::ProviderError;

/// 钱包会话错误
///
/// 每个变体都带有可分支的类别（见 [`WalletError::kind`]），UI 据此选择提示文案。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("no wallet provider is available; install a wallet extension")]
    ProviderUnavailable,
    #[error("the request was rejected in the wallet")]
    UserRejected,
    #[error("wallet could not be aligned to chain {expected}: {source}")]
    NetworkMismatch {
        expected: u64,
        #[source]
        source: Box<WalletError>,
    },
    #[error("switching the wallet to chain {chain_id} failed: {source}")]
    NetworkSwitchFailed {
        chain_id: u64,
        #[source]
        source: ProviderError,
    },
    #[error("a wallet connection is already in progress")]
    AlreadyConnecting,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("the session was disconnected while the request was pending")]
    Interrupted,
    #[error("wallet provider error: {0}")]
    Provider(ProviderError),
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletErrorKind {
    ProviderUnavailable,
    UserRejected,
    NetworkMismatch,
    NetworkSwitchFailed,
    AlreadyConnecting,
    NotConnected,
    Interrupted,
    ProviderError,
}

impl WalletErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable => "provider_unavailable",
            Self::UserRejected => "user_rejected",
            Self::NetworkMismatch => "network_mismatch",
            Self::NetworkSwitchFailed => "network_switch_failed",
            Self::AlreadyConnecting => "already_connecting",
            Self::NotConnected => "not_connected",
            Self::Interrupted => "interrupted",
            Self::ProviderError => "provider_error",
        }
    }
}

impl WalletError {
    pub fn kind(&self) -> WalletErrorKind {
        match self {
            Self::ProviderUnavailable => WalletErrorKind::ProviderUnavailable,
            Self::UserRejected => WalletErrorKind::UserRejected,
            Self::NetworkMismatch { .. } => WalletErrorKind::NetworkMismatch,
            Self::NetworkSwitchFailed { .. } => WalletErrorKind::NetworkSwitchFailed,
            Self::AlreadyConnecting => WalletErrorKind::AlreadyConnecting,
            Self::NotConnected => WalletErrorKind::NotConnected,
            Self::Interrupted => WalletErrorKind::Interrupted,
            Self::Provider(_) => WalletErrorKind::ProviderError,
        }
    }

    /// 用户主动拒绝（包括拒绝切链/加链提示）
    pub fn is_user_rejection(&self) -> bool {
        match self {
            Self::UserRejected => true,
            Self::NetworkSwitchFailed { source, .. } => source.is_user_rejection(),
            Self::NetworkMismatch { source, .. } => source.is_user_rejection(),
            Self::Provider(source) => source.is_user_rejection(),
            _ => false,
        }
    }

    /// 用户可以直接重试（不需要安装钱包等外部操作）
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ProviderUnavailable)
    }
}

impl From<ProviderError> for WalletError {
    /// 账户请求阶段的错误映射；切链阶段的错误由会话管理器单独包装
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected(_) => Self::UserRejected,
            ProviderError::Unavailable(_) => Self::ProviderUnavailable,
            other => Self::Provider(other),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    NotFound,

    // 钱包错误码
    Wallet(WalletErrorKind),
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Wallet(kind) => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
    /// 仅钱包错误：是否为用户拒绝
    pub user_rejected: Option<bool>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_rejected: Option<bool>,
    trace_id: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            user_rejected: self.user_rejected,
            trace_id: self.trace_id.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::BadRequest,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
            user_rejected: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::NotFound,
            message: msg.into(),
            status: StatusCode::NOT_FOUND,
            trace_id: None,
            user_rejected: None,
        }
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        let status = match err.kind() {
            WalletErrorKind::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            WalletErrorKind::AlreadyConnecting
            | WalletErrorKind::NotConnected
            | WalletErrorKind::Interrupted => StatusCode::CONFLICT,
            WalletErrorKind::ProviderError => StatusCode::BAD_GATEWAY,
            WalletErrorKind::UserRejected
            | WalletErrorKind::NetworkMismatch
            | WalletErrorKind::NetworkSwitchFailed => StatusCode::BAD_REQUEST,
        };
        Self {
            code: AppErrorCode::Wallet(err.kind()),
            message: err.to_string(),
            status,
            trace_id: None,
            user_rejected: Some(err.is_user_rejection()),
        }
    }
}
