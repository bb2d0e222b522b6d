//! 钱包会话领域模型
//!
//! 字段只能通过构造函数组合出来，保证 `address` 有值当且仅当状态为 `Connected`

use serde::{Deserialize, Serialize};

use crate::infrastructure::log_redact::{redact_address, SensitiveRedact};

/// 连接状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

/// 钱包会话快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    address: Option<String>,
    connection_state: ConnectionState,
    chain_id: Option<u64>,
    last_error: Option<String>,
}

impl WalletSession {
    /// 初始状态 / 主动断开后的状态
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// 连接失败后回退：仍为 Disconnected，但保留失败原因给 UI
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            last_error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn connecting() -> Self {
        Self {
            connection_state: ConnectionState::Connecting,
            ..Self::default()
        }
    }

    pub fn connected(address: impl Into<String>, chain_id: u64) -> Self {
        Self {
            address: Some(address.into()),
            connection_state: ConnectionState::Connected,
            chain_id: Some(chain_id),
            last_error: None,
        }
    }

    /// 会话失效（例如钱包在外部切换了链）
    pub fn errored(reason: impl Into<String>, chain_id: Option<u64>) -> Self {
        Self {
            address: None,
            connection_state: ConnectionState::Error,
            chain_id,
            last_error: Some(reason.into()),
        }
    }

    /// 记录网络对齐结果，不改变连接状态和地址
    pub(crate) fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// 已连接会话切换账户
    pub(crate) fn with_address(mut self, address: impl Into<String>) -> Self {
        if self.is_connected() {
            self.address = Some(address.into());
        }
        self
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    /// 不变量：address 有值 ⇔ Connected
    pub fn is_consistent(&self) -> bool {
        self.address.is_some() == self.is_connected()
    }
}

impl SensitiveRedact for WalletSession {
    fn redact(&self) -> String {
        format!(
            "state={} address={} chain_id={}",
            self.connection_state.as_str(),
            self.address
                .as_deref()
                .map(redact_address)
                .unwrap_or_else(|| "-".to_string()),
            self.chain_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bFd2";

    #[test]
    fn test_constructors_hold_address_invariant() {
        let sessions = [
            WalletSession::disconnected(),
            WalletSession::failed("rejected"),
            WalletSession::connecting(),
            WalletSession::connected(ADDR, 5003),
            WalletSession::errored("chain changed", Some(1)),
        ];
        for session in sessions {
            assert!(session.is_consistent(), "{:?}", session);
        }
    }

    #[test]
    fn test_with_address_ignored_unless_connected() {
        let session = WalletSession::connecting().with_address(ADDR);
        assert_eq!(session.address(), None);

        let session = WalletSession::connected(ADDR, 5000).with_address("0xabc");
        assert_eq!(session.address(), Some("0xabc"));
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(WalletSession::connected(ADDR, 5003)).unwrap();
        assert_eq!(value["connection_state"], "connected");
        assert_eq!(value["chain_id"], 5003);
        assert_eq!(value["address"], ADDR);
        assert!(value["last_error"].is_null());
    }

    #[test]
    fn test_redacted_log_form() {
        let session = WalletSession::connected(ADDR, 5003);
        assert_eq!(
            session.redact(),
            "state=connected address=0x742d...bFd2 chain_id=5003"
        );
        assert_eq!(
            WalletSession::disconnected().redact(),
            "state=disconnected address=- chain_id=-"
        );
    }
}
