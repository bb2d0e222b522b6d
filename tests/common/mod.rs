//! 测试辅助模块
//! 提供可编程的假钱包和测试用应用状态

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use mantle_hub::{
    app_state::AppState,
    config::{Config, LoggingConfig, NetworkConfig, ProviderConfig, ServerConfig},
    domain::NetworkProfile,
    service::{ProviderError, ProviderEvent, ProviderEventHub, WalletProvider},
};
use tokio::sync::{broadcast, Semaphore};

pub const ACCOUNT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const OTHER_ACCOUNT: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

/// 假钱包收到的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RequestAccounts,
    ChainId,
    SwitchChain(u64),
    AddChain(u64),
}

impl Call {
    /// 会弹出用户提示的请求
    pub fn is_prompt(&self) -> bool {
        !matches!(self, Call::ChainId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    RequestAccounts,
    ChainId,
    SwitchChain,
    AddChain,
}

/// 可编程假钱包
///
/// - 记录所有请求
/// - 未知链上的 switch 返回 4902
/// - 可为某个方法排队预设错误
/// - `hold_prompts` 后账户请求会挂起，直到 `release_prompt`
pub struct FakeProvider {
    chain_id: Mutex<u64>,
    known_chains: Mutex<HashSet<u64>>,
    accounts: Mutex<Vec<String>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<Method, VecDeque<ProviderError>>>,
    prompt_gate: Mutex<Option<Arc<Semaphore>>>,
    events: ProviderEventHub,
}

impl FakeProvider {
    /// 当前在 `chain_id`，并且认识这条链
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id: Mutex::new(chain_id),
            known_chains: Mutex::new(HashSet::from([chain_id])),
            accounts: Mutex::new(vec![ACCOUNT.to_lowercase()]),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            prompt_gate: Mutex::new(None),
            events: ProviderEventHub::new(16),
        }
    }

    pub fn knowing(self, chains: &[u64]) -> Self {
        self.known_chains.lock().unwrap().extend(chains.iter().copied());
        self
    }

    pub fn with_accounts(self, accounts: &[&str]) -> Self {
        *self.accounts.lock().unwrap() = accounts.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn fail_next(&self, method: Method, err: ProviderError) {
        self.failures
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(err);
    }

    /// 账户请求挂起，模拟用户还没处理弹窗
    pub fn hold_prompts(&self) {
        *self.prompt_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_prompt(&self) {
        if let Some(gate) = self.prompt_gate.lock().unwrap().as_ref() {
            gate.add_permits(1);
        }
    }

    pub fn set_chain(&self, chain_id: u64) {
        *self.chain_id.lock().unwrap() = chain_id;
    }

    pub fn current_chain(&self) -> u64 {
        *self.chain_id.lock().unwrap()
    }

    pub fn emit(&self, event: ProviderEvent) {
        self.events.publish(event);
    }

    /// 钱包桥接端使用的事件入口
    pub fn event_hub(&self) -> ProviderEventHub {
        self.events.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_prompt()).count()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(&self, method: Method) -> Option<ProviderError> {
        self.failures
            .lock()
            .unwrap()
            .get_mut(&method)
            .and_then(|queue| queue.pop_front())
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.record(Call::RequestAccounts);

        let gate = self.prompt_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        if let Some(err) = self.take_failure(Method::RequestAccounts) {
            return Err(err);
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.record(Call::ChainId);
        if let Some(err) = self.take_failure(Method::ChainId) {
            return Err(err);
        }
        Ok(self.current_chain())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.record(Call::SwitchChain(chain_id));
        if let Some(err) = self.take_failure(Method::SwitchChain) {
            return Err(err);
        }
        if !self.known_chains.lock().unwrap().contains(&chain_id) {
            return Err(ProviderError::from_rpc_error(
                4902,
                format!("Unrecognized chain ID \"0x{:x}\"", chain_id),
                None,
            ));
        }
        self.set_chain(chain_id);
        Ok(())
    }

    async fn add_chain(&self, profile: &NetworkProfile) -> Result<(), ProviderError> {
        self.record(Call::AddChain(profile.chain_id));
        if let Some(err) = self.take_failure(Method::AddChain) {
            return Err(err);
        }
        self.known_chains.lock().unwrap().insert(profile.chain_id);
        Ok(())
    }

    fn events(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        Some(self.events.subscribe())
    }
}

pub fn rejected() -> ProviderError {
    ProviderError::from_rpc_error(4001, "User rejected the request.", None)
}

/// 测试配置（目标 Mantle Sepolia）
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            bind_addr: "127.0.0.1:0".into(),
            cors_allowed_origins: vec![],
        },
        logging: LoggingConfig {
            level: "debug".into(),
            format: "text".into(),
        },
        network: NetworkConfig {
            preset: Some("mantle-sepolia".into()),
            profile: None,
        },
        provider: ProviderConfig {
            url: None,
            timeout_secs: 5,
        },
    }
}

/// 创建测试应用状态
pub fn create_test_app_state(provider: Option<Arc<FakeProvider>>) -> Arc<AppState> {
    let hub = provider.as_ref().map(|p| p.event_hub());
    let state = AppState::with_provider(
        provider.map(|p| p as Arc<dyn WalletProvider>),
        NetworkProfile::mantle_sepolia(),
        Arc::new(test_config()),
    );
    Arc::new(match hub {
        Some(hub) => state.with_provider_events(hub),
        None => state,
    })
}
