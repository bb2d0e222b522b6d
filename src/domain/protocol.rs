//! Mantle 生态协议目录
//!
//! 前端协议列表使用的精选条目，启动后不可变

use once_cell::sync::Lazy;
use serde::Serialize;

/// 协议分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProtocolCategory {
    DeFi,
    #[serde(rename = "NFT")]
    Nft,
    Infrastructure,
}

/// 外部链接
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Protocol {
    pub id: u32,
    pub name: String,
    pub category: ProtocolCategory,
    pub description: String,
    /// 锁仓量（美元）
    pub tvl: Option<u64>,
    pub metadata: ProtocolLinks,
}

fn link(url: &str) -> Option<String> {
    Some(url.to_string())
}

static PROTOCOLS: Lazy<Vec<Protocol>> = Lazy::new(|| {
    vec![
        Protocol {
            id: 1,
            name: "MantleSwap".into(),
            category: ProtocolCategory::DeFi,
            description: "Decentralized exchange built for the Mantle network".into(),
            tvl: Some(1_500_000),
            metadata: ProtocolLinks {
                website: link("https://mantleswap.xyz"),
                docs: link("https://docs.mantleswap.xyz"),
                twitter: link("https://twitter.com/MantleSwap"),
                github: None,
            },
        },
        Protocol {
            id: 2,
            name: "MantleNFT".into(),
            category: ProtocolCategory::Nft,
            description: "NFT marketplace optimized for Mantle L2".into(),
            tvl: Some(500_000),
            metadata: ProtocolLinks {
                website: link("https://mantlenft.xyz"),
                github: link("https://github.com/MantleNFT"),
                ..Default::default()
            },
        },
        Protocol {
            id: 3,
            name: "MantleVault".into(),
            category: ProtocolCategory::Infrastructure,
            description: "Secure asset management protocol for Mantle".into(),
            tvl: Some(2_000_000),
            metadata: ProtocolLinks {
                website: link("https://mantlevault.xyz"),
                docs: link("https://docs.mantlevault.xyz"),
                ..Default::default()
            },
        },
    ]
});

/// 全部协议，按 id 排序
pub fn all_protocols() -> &'static [Protocol] {
    &PROTOCOLS
}

pub fn find_protocol(id: u32) -> Option<&'static Protocol> {
    PROTOCOLS.iter().find(|p| p.id == id)
}
