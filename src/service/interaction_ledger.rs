//! 协议交互计数
//!
//! 按钱包地址记录与目录中各协议的交互次数，进程内存储

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    domain::protocol::find_protocol,
    infrastructure::log_redact::redact_address,
    utils::address_validator::{AddressError, AddressValidator},
};

/// 某地址与某协议的交互次数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionCount {
    pub protocol_id: u32,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InteractionError {
    #[error("protocol {0} not found")]
    UnknownProtocol(u32),
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
}

/// 交互计数表（键为 EIP-55 地址）
#[derive(Debug, Clone, Default)]
pub struct InteractionLedger {
    counts: Arc<RwLock<HashMap<String, BTreeMap<u32, u64>>>>,
}

impl InteractionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次交互，返回累计次数
    pub async fn record(&self, address: &str, protocol_id: u32) -> Result<InteractionCount, InteractionError> {
        if find_protocol(protocol_id).is_none() {
            return Err(InteractionError::UnknownProtocol(protocol_id));
        }
        let address = AddressValidator::normalize_evm_address(address)?;

        let mut counts = self.counts.write().await;
        let count = counts
            .entry(address.clone())
            .or_default()
            .entry(protocol_id)
            .or_insert(0);
        *count += 1;

        tracing::debug!(
            address = %redact_address(&address),
            protocol_id,
            count = *count,
            "Protocol interaction recorded"
        );

        Ok(InteractionCount {
            protocol_id,
            count: *count,
        })
    }

    /// 地址的全部交互，按协议 id 排序；大小写不同的同一地址视为同一账户
    pub async fn for_address(&self, address: &str) -> Result<Vec<InteractionCount>, InteractionError> {
        let address = AddressValidator::normalize_evm_address(address)?;
        let counts = self.counts.read().await;

        Ok(counts
            .get(&address)
            .map(|per_protocol| {
                per_protocol
                    .iter()
                    .map(|(&protocol_id, &count)| InteractionCount { protocol_id, count })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[tokio::test]
    async fn test_record_accumulates_per_protocol() {
        let ledger = InteractionLedger::new();

        ledger.record(ADDRESS, 3).await.unwrap();
        ledger.record(ADDRESS, 1).await.unwrap();
        let latest = ledger.record(&ADDRESS.to_lowercase(), 1).await.unwrap();
        assert_eq!(latest, InteractionCount { protocol_id: 1, count: 2 });

        let counts = ledger.for_address(ADDRESS).await.unwrap();
        assert_eq!(
            counts,
            vec![
                InteractionCount { protocol_id: 1, count: 2 },
                InteractionCount { protocol_id: 3, count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_address_has_no_interactions() {
        let ledger = InteractionLedger::new();
        assert!(ledger.for_address(ADDRESS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unknown_protocol_and_bad_address() {
        let ledger = InteractionLedger::new();

        assert_eq!(
            ledger.record(ADDRESS, 99).await,
            Err(InteractionError::UnknownProtocol(99))
        );
        assert!(matches!(
            ledger.record("0x1234", 1).await,
            Err(InteractionError::InvalidAddress(_))
        ));
        assert!(ledger.for_address("not-an-address").await.is_err());
    }
}
