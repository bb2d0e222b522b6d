use std::sync::Arc;

use crate::{
    config::Config,
    domain::{NetworkProfile, NetworkRegistry},
    infrastructure::http_transport::HttpTransport,
    service::{
        eip1193::{Eip1193Provider, ProviderEventHub},
        interaction_ledger::InteractionLedger,
        tx_preflight::TxPreflight,
        wallet_provider::WalletProvider,
        wallet_session_manager::WalletSessionManager,
    },
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub wallet: Arc<WalletSessionManager>,
    pub preflight: Arc<TxPreflight>,
    pub networks: Arc<NetworkRegistry>,
    pub interactions: InteractionLedger,
    /// 钱包桥接端推送事件的入口，没有 Provider 时为 None
    pub provider_events: Option<ProviderEventHub>,
    pub config: Arc<Config>,
}

impl AppState {
    /// 按配置创建应用状态
    ///
    /// 未配置钱包端点时仍可启动，connect 会返回 `ProviderUnavailable`
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let target = config.target_network()?;

        let mut provider_events = None;
        let provider: Option<Arc<dyn WalletProvider>> = match &config.provider.url {
            Some(url) => {
                let transport = HttpTransport::new(url.clone(), config.provider.timeout())?;
                provider_events = Some(transport.event_hub());
                tracing::info!(endpoint = %url, "Wallet provider configured");
                Some(Arc::new(Eip1193Provider::new(transport)))
            }
            None => {
                tracing::warn!("WALLET_PROVIDER_URL not set; wallet operations will report provider unavailable");
                None
            }
        };

        let state = Self::with_provider(provider, target, config);
        Ok(match provider_events {
            Some(hub) => state.with_provider_events(hub),
            None => state,
        })
    }

    /// 使用给定 Provider 创建（测试注入假钱包）
    pub fn with_provider(
        provider: Option<Arc<dyn WalletProvider>>,
        target: NetworkProfile,
        config: Arc<Config>,
    ) -> Self {
        let mut networks = NetworkRegistry::new();
        if networks.get(target.chain_id).is_none() {
            // 自定义网络也要能通过 API 按名称或链ID选择
            let name = target.display_name.to_lowercase().replace(' ', "-");
            networks.register(&name, &[], target.clone());
        }

        let wallet = Arc::new(WalletSessionManager::new(provider, target));
        let preflight = Arc::new(TxPreflight::new(Arc::clone(&wallet)));

        Self {
            wallet,
            preflight,
            networks: Arc::new(networks),
            interactions: InteractionLedger::new(),
            provider_events: None,
            config,
        }
    }

    /// 挂接钱包事件入口（与 Provider 的事件流是同一个 hub）
    pub fn with_provider_events(mut self, hub: ProviderEventHub) -> Self {
        self.provider_events = Some(hub);
        self
    }
}
