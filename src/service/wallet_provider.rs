//! 钱包 Provider 抽象
//!
//! 浏览器注入的钱包对象被抽象为一个能力接口，会话管理器只依赖这个 trait，
//! 测试中用假实现替换。

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::domain::NetworkProfile;

/// EIP-1193: 用户拒绝请求
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193: Provider 与所有链断开
pub const DISCONNECTED_CODE: i64 = 4900;
/// EIP-1193: Provider 与当前链断开
pub const CHAIN_DISCONNECTED_CODE: i64 = 4901;
/// 钱包不认识目标链（需要先 wallet_addEthereumChain）
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// JSON-RPC internal error，部分移动端钱包把 4902 包在这里
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Provider 原始错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("user rejected the request: {0}")]
    UserRejected(String),
    #[error("wallet does not recognize the chain: {0}")]
    UnrecognizedChain(String),
    #[error("wallet provider unavailable: {0}")]
    Unavailable(String),
    #[error("wallet rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("invalid wallet response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// 按 EIP-1193 错误码分类 JSON-RPC 错误
    pub fn from_rpc_error(code: i64, message: impl Into<String>, data: Option<&Value>) -> Self {
        let message = message.into();
        match code {
            USER_REJECTED_CODE => Self::UserRejected(message),
            UNRECOGNIZED_CHAIN_CODE => Self::UnrecognizedChain(message),
            DISCONNECTED_CODE | CHAIN_DISCONNECTED_CODE => Self::Unavailable(message),
            INTERNAL_ERROR_CODE if nested_code(data) == Some(UNRECOGNIZED_CHAIN_CODE) => {
                Self::UnrecognizedChain(message)
            }
            INTERNAL_ERROR_CODE if nested_code(data) == Some(USER_REJECTED_CODE) => {
                Self::UserRejected(message)
            }
            _ => Self::Rpc { code, message },
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::UserRejected(_))
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        matches!(self, Self::UnrecognizedChain(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// `error.data.originalError.code`
fn nested_code(data: Option<&Value>) -> Option<i64> {
    data?.get("originalError")?.get("code")?.as_i64()
}

/// 钱包在外部发生的变化
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ProviderEvent {
    /// 用户在钱包内切换了网络
    ChainChanged(u64),
    /// 用户切换/断开了账户，空列表表示已撤销授权
    AccountsChanged(Vec<String>),
    /// Provider 与所有链断开
    Disconnected,
}

/// 钱包能力接口
///
/// 每个方法都是一次挂起的钱包交互，可能弹出需要用户确认的提示。
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// 请求账户授权（eth_requestAccounts）
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// 查询当前链（eth_chainId）
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// 请求切换链（wallet_switchEthereumChain）
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

    /// 请求添加链（wallet_addEthereumChain）
    async fn add_chain(&self, profile: &NetworkProfile) -> Result<(), ProviderError>;

    /// 外部事件流，没有事件能力的 Provider 返回 None
    fn events(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_classify_standard_codes() {
        assert!(ProviderError::from_rpc_error(4001, "denied", None).is_user_rejection());
        assert!(ProviderError::from_rpc_error(4902, "unknown", None).is_unrecognized_chain());
        assert!(ProviderError::from_rpc_error(4900, "gone", None).is_unavailable());
        assert!(ProviderError::from_rpc_error(4901, "gone", None).is_unavailable());
        assert_eq!(
            ProviderError::from_rpc_error(-32002, "already pending", None),
            ProviderError::Rpc {
                code: -32002,
                message: "already pending".to_string()
            }
        );
    }

    #[test]
    fn test_classify_wrapped_unrecognized_chain() {
        let data = json!({ "originalError": { "code": 4902, "message": "Unrecognized chain ID" } });
        let err = ProviderError::from_rpc_error(-32603, "Internal error", Some(&data));
        assert!(err.is_unrecognized_chain());

        let data = json!({ "originalError": { "code": 4001 } });
        let err = ProviderError::from_rpc_error(-32603, "Internal error", Some(&data));
        assert!(err.is_user_rejection());

        let err = ProviderError::from_rpc_error(-32603, "Internal error", Some(&json!({})));
        assert!(matches!(err, ProviderError::Rpc { code: -32603, .. }));
    }
}
