//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::{net::SocketAddr, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{NetworkProfile, NetworkRegistry};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// 允许跨域的前端地址，空表示不限制
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// 目标网络配置
///
/// `profile` 完整给出网络参数；否则按 `preset` 从内置网络中查找
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub profile: Option<NetworkProfile>,
}

/// 钱包 Provider 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// EIP-1193 JSON-RPC 端点，未设置时没有可用钱包
    #[serde(default)]
    pub url: Option<String>,
    /// 单次请求超时（包含用户确认弹窗的时间）
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_provider_timeout() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8088".into()),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            preset: Some(std::env::var("TARGET_NETWORK").unwrap_or_else(|_| "mantle-sepolia".into())),
            profile: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("WALLET_PROVIDER_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            timeout_secs: std::env::var("WALLET_PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_provider_timeout),
        }
    }
}

impl NetworkConfig {
    /// 解析出唯一的目标网络
    pub fn resolve(&self, registry: &NetworkRegistry) -> Result<NetworkProfile> {
        let profile = match (&self.profile, &self.preset) {
            (Some(profile), _) => profile.clone(),
            (None, Some(preset)) => registry
                .resolve(preset)
                .cloned()
                .with_context(|| format!("Unknown network preset: {}", preset))?,
            (None, None) => anyhow::bail!("Network config needs either a preset or a profile"),
        };

        profile
            .validate()
            .with_context(|| format!("Invalid network profile for chain {}", profile.chain_id))?;
        Ok(profile)
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            network: NetworkConfig::default(),
            provider: ProviderConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 目标网络
    pub fn target_network(&self) -> Result<NetworkProfile> {
        self.network.resolve(&NetworkRegistry::new())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        self.server
            .bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDR is not a socket address: {}", self.server.bind_addr))?;

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        self.target_network()?;

        if let Some(url) = &self.provider.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("WALLET_PROVIDER_URL must start with http:// or https://");
            }
        }

        if self.provider.timeout_secs == 0 {
            anyhow::bail!("WALLET_PROVIDER_TIMEOUT_SECS must be greater than zero");
        }

        Ok(())
    }
}
