//! 交易前置检查
//!
//! 交易构建前必须拿到已连接的账户，并且钱包处于交易所在的链。

use std::sync::Arc;

use super::wallet_session_manager::{SessionSigner, WalletSessionManager};
use crate::{domain::NetworkProfile, error::WalletError};

pub struct TxPreflight {
    manager: Arc<WalletSessionManager>,
}

impl TxPreflight {
    pub fn new(manager: Arc<WalletSessionManager>) -> Self {
        Self { manager }
    }

    /// 在会话当前网络上发交易
    pub async fn current(&self) -> Result<SessionSigner, WalletError> {
        self.manager.prepare_transaction().await
    }

    /// 在指定网络上发交易，钱包不在该链时先切换
    pub async fn for_network(&self, profile: &NetworkProfile) -> Result<SessionSigner, WalletError> {
        if !self.manager.session().is_connected() {
            return Err(WalletError::NotConnected);
        }

        self.manager.ensure_network(profile).await?;
        let signer = self.manager.signer()?;
        tracing::debug!(chain_id = signer.chain_id(), "Transaction preflight passed");
        Ok(signer)
    }
}
