//! JSON-RPC over HTTP 钱包通道
//!
//! 桌面钱包会在本地端口暴露 EIP-1193 兼容的 JSON-RPC 接口，
//! 账户授权和切链请求由钱包弹窗确认，所以超时需要比普通 RPC 长得多。

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::service::{
    eip1193::{Eip1193Transport, ProviderEventHub},
    wallet_provider::{ProviderError, ProviderEvent},
};

/// HTTP 钱包通道
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
    /// HTTP 通道本身不推送事件，事件由桥接端经网关转发进来
    events: ProviderEventHub,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
            events: ProviderEventHub::default(),
        })
    }

    /// 钱包桥接端推送事件的入口
    pub fn event_hub(&self) -> ProviderEventHub {
        self.events.clone()
    }
}

#[async_trait]
impl Eip1193Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });

        tracing::debug!(method, id, endpoint = %self.endpoint, "Sending wallet request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                // 连接失败视为没有可用钱包
                ProviderError::Unavailable(format!("wallet endpoint {}: {}", self.endpoint, e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to read body: {}", e)))?;

        let json: Value = match serde_json::from_str(&body) {
            Ok(json) => json,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::Rpc {
                    code: i64::from(status.as_u16()),
                    message: body,
                });
            }
            Err(e) => {
                return Err(ProviderError::InvalidResponse(format!(
                    "failed to parse JSON response: {}",
                    e
                )));
            }
        };

        decode_response(json)
    }

    fn events(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        Some(self.events.subscribe())
    }
}

/// 解析 JSON-RPC 响应体
pub(crate) fn decode_response(mut json: Value) -> Result<Value, ProviderError> {
    if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown wallet error");
        return Err(ProviderError::from_rpc_error(code, message, error.get("data")));
    }

    match json.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(ProviderError::InvalidResponse(
            "missing result field in wallet response".to_string(),
        )),
    }
}
