//! 网络配置模块
//!
//! 定义钱包需要对齐的目标网络（EIP-3085 所需的全部信息）及内置网络注册表

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::utils::chain_id::{parse_chain_id_str, to_hex_chain_id};

/// 网络配置（启动时提供，运行期不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// 链 ID (EIP-155)
    pub chain_id: u64,
    /// 钱包中展示的网络名称
    pub display_name: String,
    /// 原生代币名称，缺省时使用符号
    #[serde(default)]
    pub native_currency_name: Option<String>,
    /// 原生代币符号 (MNT, ETH)
    pub native_currency_symbol: String,
    /// 原生代币精度
    #[serde(default = "default_decimals")]
    pub native_currency_decimals: u8,
    /// RPC 端点（按优先级排序）
    pub rpc_urls: Vec<String>,
    /// 区块浏览器（按优先级排序）
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

fn default_decimals() -> u8 {
    18
}

/// 网络配置校验错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("chain id must be greater than zero")]
    ZeroChainId,
    #[error("network {0} has no display name")]
    MissingName(u64),
    #[error("network {0} has no native currency symbol")]
    MissingSymbol(u64),
    #[error("network {0} must declare at least one RPC url")]
    MissingRpcUrl(u64),
    #[error("network {chain_id} has a non-http url: {url}")]
    InvalidUrl { chain_id: u64, url: String },
    #[error("network {chain_id} declares {decimals} decimals (max 36)")]
    InvalidDecimals { chain_id: u64, decimals: u8 },
}

impl NetworkProfile {
    pub fn native_currency_name(&self) -> &str {
        self.native_currency_name
            .as_deref()
            .unwrap_or(&self.native_currency_symbol)
    }

    /// 线路格式的链ID
    pub fn hex_chain_id(&self) -> String {
        to_hex_chain_id(self.chain_id)
    }

    /// 校验配置完整性
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.chain_id == 0 {
            return Err(ProfileError::ZeroChainId);
        }
        if self.display_name.trim().is_empty() {
            return Err(ProfileError::MissingName(self.chain_id));
        }
        if self.native_currency_symbol.trim().is_empty() {
            return Err(ProfileError::MissingSymbol(self.chain_id));
        }
        if self.rpc_urls.is_empty() {
            return Err(ProfileError::MissingRpcUrl(self.chain_id));
        }
        if self.native_currency_decimals > 36 {
            return Err(ProfileError::InvalidDecimals {
                chain_id: self.chain_id,
                decimals: self.native_currency_decimals,
            });
        }

        let all_urls = self.rpc_urls.iter().chain(self.block_explorer_urls.iter());
        for url in all_urls {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ProfileError::InvalidUrl {
                    chain_id: self.chain_id,
                    url: url.clone(),
                });
            }
        }

        Ok(())
    }

    /// `wallet_addEthereumChain` 参数 (EIP-3085)
    pub fn add_chain_params(&self) -> Value {
        json!([{
            "chainId": self.hex_chain_id(),
            "chainName": self.display_name,
            "nativeCurrency": {
                "name": self.native_currency_name(),
                "symbol": self.native_currency_symbol,
                "decimals": self.native_currency_decimals,
            },
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.block_explorer_urls,
        }])
    }

    /// Mantle 主网
    pub fn mantle() -> Self {
        Self {
            chain_id: 5000,
            display_name: "Mantle".to_string(),
            native_currency_name: Some("MNT".to_string()),
            native_currency_symbol: "MNT".to_string(),
            native_currency_decimals: 18,
            rpc_urls: vec!["https://rpc.mantle.xyz".to_string()],
            block_explorer_urls: vec!["https://explorer.mantle.xyz".to_string()],
        }
    }

    /// Mantle Sepolia 测试网
    pub fn mantle_sepolia() -> Self {
        Self {
            chain_id: 5003,
            display_name: "Mantle Sepolia".to_string(),
            native_currency_name: Some("MNT".to_string()),
            native_currency_symbol: "MNT".to_string(),
            native_currency_decimals: 18,
            rpc_urls: vec!["https://rpc.sepolia.mantle.xyz".to_string()],
            block_explorer_urls: vec!["https://explorer.sepolia.mantle.xyz".to_string()],
        }
    }

    /// Ethereum 主网（桥的 L1 侧）
    pub fn ethereum() -> Self {
        Self {
            chain_id: 1,
            display_name: "Ethereum".to_string(),
            native_currency_name: Some("Ether".to_string()),
            native_currency_symbol: "ETH".to_string(),
            native_currency_decimals: 18,
            rpc_urls: vec!["https://eth.llamarpc.com".to_string()],
            block_explorer_urls: vec!["https://etherscan.io".to_string()],
        }
    }

    /// Ethereum Sepolia 测试网（Mantle Sepolia 的 L1）
    pub fn ethereum_sepolia() -> Self {
        Self {
            chain_id: 11155111,
            display_name: "Ethereum Sepolia".to_string(),
            native_currency_name: Some("Sepolia Ether".to_string()),
            native_currency_symbol: "ETH".to_string(),
            native_currency_decimals: 18,
            rpc_urls: vec!["https://rpc.sepolia.org".to_string()],
            block_explorer_urls: vec!["https://sepolia.etherscan.io".to_string()],
        }
    }
}

struct RegistryEntry {
    canonical_name: &'static str,
    aliases: &'static [&'static str],
    profile: NetworkProfile,
}

/// 内置网络（静态初始化）
static BUILTIN_NETWORKS: Lazy<Vec<RegistryEntry>> = Lazy::new(|| {
    vec![
        RegistryEntry {
            canonical_name: "mantle",
            aliases: &["mantle-mainnet", "mnt"],
            profile: NetworkProfile::mantle(),
        },
        RegistryEntry {
            canonical_name: "mantle-sepolia",
            aliases: &["mantle-testnet", "mantle_sepolia"],
            profile: NetworkProfile::mantle_sepolia(),
        },
        RegistryEntry {
            canonical_name: "ethereum",
            aliases: &["eth", "mainnet"],
            profile: NetworkProfile::ethereum(),
        },
        RegistryEntry {
            canonical_name: "sepolia",
            aliases: &["ethereum-sepolia", "eth-sepolia"],
            profile: NetworkProfile::ethereum_sepolia(),
        },
    ]
});

/// 网络注册表
///
/// 按链ID、规范名称、别名或十进制/十六进制链ID查找网络
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    profiles: HashMap<u64, NetworkProfile>,
    names: HashMap<String, u64>,
}

impl NetworkRegistry {
    /// 创建预配置的注册表
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for entry in BUILTIN_NETWORKS.iter() {
            registry.register(entry.canonical_name, entry.aliases, entry.profile.clone());
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// 注册网络（同链ID会覆盖旧配置）
    pub fn register(&mut self, name: &str, aliases: &[&str], profile: NetworkProfile) {
        let chain_id = profile.chain_id;
        self.names.insert(name.to_lowercase(), chain_id);
        for alias in aliases {
            self.names.insert(alias.to_lowercase(), chain_id);
        }
        self.profiles.insert(chain_id, profile);
    }

    pub fn get(&self, chain_id: u64) -> Option<&NetworkProfile> {
        self.profiles.get(&chain_id)
    }

    /// 按名称、别名或链ID查找
    pub fn resolve(&self, identifier: &str) -> Option<&NetworkProfile> {
        let key = identifier.trim().to_lowercase();
        if let Some(chain_id) = self.names.get(&key) {
            return self.profiles.get(chain_id);
        }
        parse_chain_id_str(&key)
            .ok()
            .and_then(|chain_id| self.profiles.get(&chain_id))
    }

    /// 所有网络，按链ID排序
    pub fn list(&self) -> Vec<&NetworkProfile> {
        let mut profiles: Vec<_> = self.profiles.values().collect();
        profiles.sort_by_key(|p| p.chain_id);
        profiles
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_valid() {
        let registry = NetworkRegistry::new();
        assert_eq!(registry.list().len(), 4);
        for profile in registry.list() {
            assert!(profile.validate().is_ok(), "{:?}", profile);
        }
    }

    #[test]
    fn test_resolve_by_name_alias_and_id() {
        let registry = NetworkRegistry::new();
        assert_eq!(registry.resolve("mantle").unwrap().chain_id, 5000);
        assert_eq!(registry.resolve("MNT").unwrap().chain_id, 5000);
        assert_eq!(registry.resolve("mantle-sepolia").unwrap().chain_id, 5003);
        assert_eq!(registry.resolve("5003").unwrap().chain_id, 5003);
        assert_eq!(registry.resolve("0x138b").unwrap().chain_id, 5003);
        assert_eq!(registry.resolve("eth").unwrap().chain_id, 1);
        assert!(registry.resolve("solana").is_none());
        assert!(registry.resolve("42161").is_none());
    }

    #[test]
    fn test_add_chain_params_shape() {
        let params = NetworkProfile::mantle().add_chain_params();
        let entry = &params[0];
        assert_eq!(entry["chainId"], "0x1388");
        assert_eq!(entry["chainName"], "Mantle");
        assert_eq!(entry["nativeCurrency"]["symbol"], "MNT");
        assert_eq!(entry["nativeCurrency"]["decimals"], 18);
        assert_eq!(entry["rpcUrls"][0], "https://rpc.mantle.xyz");
        assert_eq!(entry["blockExplorerUrls"][0], "https://explorer.mantle.xyz");
    }

    #[test]
    fn test_currency_name_falls_back_to_symbol() {
        let mut profile = NetworkProfile::mantle();
        profile.native_currency_name = None;
        assert_eq!(profile.native_currency_name(), "MNT");
    }

    #[test]
    fn test_validate_rejects_incomplete_profiles() {
        let mut profile = NetworkProfile::mantle();
        profile.rpc_urls.clear();
        assert_eq!(profile.validate(), Err(ProfileError::MissingRpcUrl(5000)));

        let mut profile = NetworkProfile::mantle();
        profile.chain_id = 0;
        assert_eq!(profile.validate(), Err(ProfileError::ZeroChainId));

        let mut profile = NetworkProfile::mantle();
        profile.block_explorer_urls = vec!["ftp://explorer".to_string()];
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_profile_toml_defaults() {
        let profile: NetworkProfile = toml::from_str(
            r#"
chain_id = 5003
display_name = "Mantle Sepolia"
native_currency_symbol = "MNT"
rpc_urls = ["https://rpc.sepolia.mantle.xyz"]
"#,
        )
        .unwrap();
        assert_eq!(profile.native_currency_decimals, 18);
        assert!(profile.block_explorer_urls.is_empty());
        assert!(profile.validate().is_ok());
    }
}
