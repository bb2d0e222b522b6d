//! EIP-1193 适配器
//!
//! 把 `request({ method, params })` 形式的钱包接口翻译成 `WalletProvider`。
//! 链ID在这里完成十六进制 ⇄ u64 的转换，上层只看到数值。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use super::wallet_provider::{ProviderError, ProviderEvent, WalletProvider};
use crate::{
    domain::NetworkProfile,
    utils::chain_id::{parse_chain_id, to_hex_chain_id},
};

pub const METHOD_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const METHOD_CHAIN_ID: &str = "eth_chainId";
pub const METHOD_SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
pub const METHOD_ADD_CHAIN: &str = "wallet_addEthereumChain";

/// EIP-1193 请求通道
#[async_trait]
pub trait Eip1193Transport: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// 原始事件流（chainChanged / accountsChanged / disconnect）
    fn events(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        None
    }
}

#[async_trait]
impl<T: Eip1193Transport + ?Sized> Eip1193Transport for Arc<T> {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        (**self).request(method, params).await
    }

    fn events(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        (**self).events()
    }
}

/// 基于 EIP-1193 通道的钱包 Provider
pub struct Eip1193Provider<T> {
    transport: T,
}

impl<T: Eip1193Transport> Eip1193Provider<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: Eip1193Transport> WalletProvider for Eip1193Provider<T> {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let result = self
            .transport
            .request(METHOD_REQUEST_ACCOUNTS, json!([]))
            .await?;

        let accounts = result.as_array().ok_or_else(|| {
            ProviderError::InvalidResponse(format!("{} returned {}", METHOD_REQUEST_ACCOUNTS, result))
        })?;

        accounts
            .iter()
            .map(|account| {
                account.as_str().map(str::to_string).ok_or_else(|| {
                    ProviderError::InvalidResponse(format!("non-string account: {}", account))
                })
            })
            .collect()
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let result = self.transport.request(METHOD_CHAIN_ID, json!([])).await?;
        parse_chain_id(&result).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        // 成功时钱包返回 null
        self.transport
            .request(
                METHOD_SWITCH_CHAIN,
                json!([{ "chainId": to_hex_chain_id(chain_id) }]),
            )
            .await?;
        Ok(())
    }

    async fn add_chain(&self, profile: &NetworkProfile) -> Result<(), ProviderError> {
        self.transport
            .request(METHOD_ADD_CHAIN, profile.add_chain_params())
            .await?;
        Ok(())
    }

    fn events(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        self.transport.events()
    }
}

/// 解析 EIP-1193 原始事件
///
/// 不关心的事件（connect / message）返回 None。
pub fn parse_provider_event(name: &str, payload: &Value) -> Result<Option<ProviderEvent>, ProviderError> {
    match name {
        "chainChanged" => parse_chain_id(payload)
            .map(|id| Some(ProviderEvent::ChainChanged(id)))
            .map_err(|e| ProviderError::InvalidResponse(e.to_string())),
        "accountsChanged" => {
            let accounts = payload
                .as_array()
                .ok_or_else(|| ProviderError::InvalidResponse(format!("accountsChanged payload: {}", payload)))?
                .iter()
                .filter_map(|a| a.as_str().map(str::to_string))
                .collect();
            Ok(Some(ProviderEvent::AccountsChanged(accounts)))
        }
        "disconnect" => Ok(Some(ProviderEvent::Disconnected)),
        _ => Ok(None),
    }
}

/// 钱包事件分发
///
/// 钱包桥接端（浏览器扩展或桌面钱包）把原始事件推到这里，
/// 会话管理器通过 `subscribe` 收到解析后的 `ProviderEvent`。
#[derive(Debug, Clone)]
pub struct ProviderEventHub {
    sender: broadcast::Sender<ProviderEvent>,
}

impl ProviderEventHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.sender.subscribe()
    }

    /// 分发事件，返回收到事件的订阅者数量
    pub fn publish(&self, event: ProviderEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::warn!(?event, "Wallet event dropped: no listener");
                0
            }
        }
    }

    /// 解析原始 EIP-1193 事件并分发
    ///
    /// 不关心的事件返回 `Ok(None)`，不会分发。
    pub fn publish_raw(&self, name: &str, payload: &Value) -> Result<Option<(ProviderEvent, usize)>, ProviderError> {
        let Some(event) = parse_provider_event(name, payload)? else {
            tracing::debug!(event = name, "Ignoring wallet event");
            return Ok(None);
        };
        let receivers = self.publish(event.clone());
        Ok(Some((event, receivers)))
    }
}

impl Default for ProviderEventHub {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// 按方法名返回预设结果，并记录所有请求
    struct ScriptedTransport {
        calls: Mutex<Vec<(String, Value)>>,
        respond: Box<dyn Fn(&str) -> Result<Value, ProviderError> + Send + Sync>,
    }

    impl ScriptedTransport {
        fn new(respond: impl Fn(&str) -> Result<Value, ProviderError> + Send + Sync + 'static) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            }
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Eip1193Transport for ScriptedTransport {
        async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
            self.calls.lock().unwrap().push((method.to_string(), params));
            (self.respond)(method)
        }
    }

    #[tokio::test]
    async fn test_chain_id_hex_is_decoded() {
        let provider = Eip1193Provider::new(ScriptedTransport::new(|_| Ok(json!("0x1388"))));
        assert_eq!(provider.chain_id().await.unwrap(), 5000);
    }

    #[tokio::test]
    async fn test_switch_chain_sends_hex() {
        let provider = Eip1193Provider::new(ScriptedTransport::new(|_| Ok(Value::Null)));
        provider.switch_chain(5003).await.unwrap();

        let calls = provider.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, METHOD_SWITCH_CHAIN);
        assert_eq!(calls[0].1, json!([{ "chainId": "0x138b" }]));
    }

    #[tokio::test]
    async fn test_add_chain_sends_full_profile() {
        let provider = Eip1193Provider::new(ScriptedTransport::new(|_| Ok(Value::Null)));
        let profile = NetworkProfile::mantle_sepolia();
        provider.add_chain(&profile).await.unwrap();

        let calls = provider.transport().calls();
        assert_eq!(calls[0].0, METHOD_ADD_CHAIN);
        assert_eq!(calls[0].1, profile.add_chain_params());
    }

    #[tokio::test]
    async fn test_request_accounts_rejects_malformed_result() {
        let provider = Eip1193Provider::new(ScriptedTransport::new(|_| Ok(json!("0xabc"))));
        let err = provider.request_accounts().await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));

        let provider = Eip1193Provider::new(ScriptedTransport::new(|_| Ok(json!([1, 2]))));
        assert!(provider.request_accounts().await.is_err());
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let provider = Eip1193Provider::new(ScriptedTransport::new(|_| {
            Err(ProviderError::from_rpc_error(4001, "User rejected the request.", None))
        }));
        let err = provider.request_accounts().await.unwrap_err();
        assert!(err.is_user_rejection());
    }

    #[test]
    fn test_parse_provider_events() {
        assert_eq!(
            parse_provider_event("chainChanged", &json!("0x1")).unwrap(),
            Some(ProviderEvent::ChainChanged(1))
        );
        assert_eq!(
            parse_provider_event("accountsChanged", &json!([])).unwrap(),
            Some(ProviderEvent::AccountsChanged(vec![]))
        );
        assert_eq!(
            parse_provider_event("disconnect", &json!({ "code": 4900 })).unwrap(),
            Some(ProviderEvent::Disconnected)
        );
        assert_eq!(parse_provider_event("connect", &json!({})).unwrap(), None);
        assert!(parse_provider_event("chainChanged", &json!(true)).is_err());
    }

    #[tokio::test]
    async fn test_event_hub_delivers_parsed_events() {
        let hub = ProviderEventHub::default();
        let mut rx = hub.subscribe();

        let published = hub.publish_raw("chainChanged", &json!("0x1388")).unwrap();
        assert_eq!(published, Some((ProviderEvent::ChainChanged(5000), 1)));
        assert_eq!(rx.recv().await.unwrap(), ProviderEvent::ChainChanged(5000));

        assert_eq!(hub.publish_raw("message", &json!({})).unwrap(), None);
        assert!(hub.publish_raw("accountsChanged", &json!("0xabc")).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_hub_without_listener() {
        let hub = ProviderEventHub::new(4);
        assert_eq!(hub.publish(ProviderEvent::Disconnected), 0);
    }
}
