//! 钱包会话管理器
//!
//! 应用内唯一持有 Provider 的组件，负责：
//! - connect / disconnect 生命周期
//! - 保证钱包在发起交易前处于目标链（切链，必要时先加链再切一次）
//! - 向 UI 广播会话快照
//!
//! 会话只通过本模块的方法写入。所有会弹出钱包提示的操作经过同一把异步锁串行执行，
//! 同一时间最多只有一个钱包提示在等待用户处理。

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;
use tokio::{
    sync::{broadcast::error::RecvError, watch, Mutex},
    task::JoinHandle,
};

use super::wallet_provider::{ProviderError, ProviderEvent, WalletProvider};
use crate::{
    domain::{ConnectionState, NetworkProfile, WalletSession},
    error::WalletError,
    infrastructure::log_redact::{redact_address, redact_addresses, SensitiveRedact},
    utils::address_validator::AddressValidator,
};

/// 已授权账户句柄，只有在会话已连接时才能取得
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSigner {
    address: String,
    chain_id: u64,
}

impl SessionSigner {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

pub struct WalletSessionManager {
    provider: Option<Arc<dyn WalletProvider>>,
    /// 启动配置的目标网络，connect 时对齐到这里
    default_network: NetworkProfile,
    /// 当前会话对齐的网络，ensure_network 成功后更新
    network: watch::Sender<NetworkProfile>,
    state: watch::Sender<WalletSession>,
    prompt_gate: Mutex<()>,
    connect_in_flight: AtomicBool,
    /// 每次 disconnect 递增，用来识别被中途断开的 connect
    epoch: AtomicU64,
}

impl WalletSessionManager {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, network: NetworkProfile) -> Self {
        let (state, _) = watch::channel(WalletSession::disconnected());
        let (network_tx, _) = watch::channel(network.clone());
        Self {
            provider,
            default_network: network,
            network: network_tx,
            state,
            prompt_gate: Mutex::new(()),
            connect_in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn with_provider(provider: Arc<dyn WalletProvider>, network: NetworkProfile) -> Self {
        Self::new(Some(provider), network)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// 当前会话快照
    pub fn session(&self) -> WalletSession {
        self.state.borrow().clone()
    }

    pub fn get_active_address(&self) -> Option<String> {
        self.state.borrow().address().map(str::to_string)
    }

    /// 订阅会话变化（只读）
    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.state.subscribe()
    }

    pub fn default_network(&self) -> &NetworkProfile {
        &self.default_network
    }

    pub fn active_network(&self) -> NetworkProfile {
        self.network.borrow().clone()
    }

    /// 连接钱包
    ///
    /// 请求账户授权后立即对齐目标网络，只有两步都成功才进入 `Connected`。
    /// 已有连接请求在等待时直接返回 `AlreadyConnecting`，不会弹出第二个提示。
    pub async fn connect(&self) -> Result<WalletSession, WalletError> {
        let provider = match &self.provider {
            Some(provider) => Arc::clone(provider),
            None => {
                tracing::warn!("Connect requested but no wallet provider is available");
                let err = WalletError::ProviderUnavailable;
                self.state.send_if_modified(|session| {
                    if session.is_connected() {
                        return false;
                    }
                    *session = WalletSession::failed(err.to_string());
                    true
                });
                return Err(err);
            }
        };

        if self
            .connect_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Connect rejected: another connection attempt is pending");
            return Err(WalletError::AlreadyConnecting);
        }
        let mut attempt = ConnectAttempt::new(self);

        let _gate = self.prompt_gate.lock().await;

        let current = self.session();
        if current.is_connected() {
            attempt.finish();
            tracing::debug!(session = %current.redact(), "Wallet already connected");
            return Ok(current);
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        self.publish(WalletSession::connecting());
        tracing::info!(target_chain = self.default_network.chain_id, "Connecting wallet");

        let result = self.run_connect(provider.as_ref()).await;
        attempt.finish();

        let next = match &result {
            Ok((address, chain_id)) => WalletSession::connected(address.clone(), *chain_id),
            Err(err) => WalletSession::failed(err.to_string()),
        };

        let mut interrupted = false;
        self.state.send_if_modified(|session| {
            if self.epoch.load(Ordering::Acquire) != epoch {
                interrupted = true;
                return false;
            }
            *session = next.clone();
            true
        });

        if interrupted {
            tracing::info!("Wallet was disconnected while connect was pending; discarding result");
            return Err(WalletError::Interrupted);
        }

        match result {
            Ok((address, chain_id)) => {
                self.network.send_replace(self.default_network.clone());
                tracing::info!(
                    address = %redact_address(&address),
                    chain_id,
                    "Wallet connected"
                );
                Ok(next)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    kind = err.kind().as_str(),
                    user_rejected = err.is_user_rejection(),
                    "Wallet connect failed"
                );
                Err(err)
            }
        }
    }

    async fn run_connect(&self, provider: &dyn WalletProvider) -> Result<(String, u64), WalletError> {
        let accounts = provider.request_accounts().await.map_err(WalletError::from)?;
        if accounts.len() > 1 {
            tracing::debug!(count = accounts.len(), "Wallet exposed several accounts; using the first");
        }

        let raw = accounts.into_iter().next().ok_or_else(|| {
            WalletError::Provider(ProviderError::InvalidResponse(
                "wallet returned no accounts".to_string(),
            ))
        })?;
        let address = AddressValidator::normalize_evm_address(&raw)
            .map_err(|e| WalletError::Provider(ProviderError::InvalidResponse(e.to_string())))?;

        let target = &self.default_network;
        self.align_network(provider, target)
            .await
            .map_err(|source| match source {
                // Provider 消失不是网络问题，原样上报（不可重试）
                WalletError::ProviderUnavailable => WalletError::ProviderUnavailable,
                source => WalletError::NetworkMismatch {
                    expected: target.chain_id,
                    source: Box::new(source),
                },
            })?;

        Ok((address, target.chain_id))
    }

    /// 断开连接（幂等）
    ///
    /// 不需要等待钱包，立即把会话重置为 `Disconnected`。
    pub fn disconnect(&self) {
        self.state.send_if_modified(|session| {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            let reset = WalletSession::disconnected();
            if *session == reset {
                return false;
            }
            *session = reset;
            true
        });
        self.network.send_if_modified(|network| {
            if *network == self.default_network {
                return false;
            }
            *network = self.default_network.clone();
            true
        });
        tracing::info!("Wallet disconnected");
    }

    /// 确保钱包处于目标链
    ///
    /// 已在目标链时不弹出任何提示。成功后目标网络成为会话的当前网络。
    pub async fn ensure_network(&self, target: &NetworkProfile) -> Result<(), WalletError> {
        let provider = match &self.provider {
            Some(provider) => Arc::clone(provider),
            None => return Err(WalletError::ProviderUnavailable),
        };

        let _gate = self.prompt_gate.lock().await;
        self.align_network(provider.as_ref(), target).await?;

        self.network.send_replace(target.clone());
        self.state.send_if_modified(|session| {
            if session.chain_id() == Some(target.chain_id) {
                return false;
            }
            *session = session.clone().with_chain_id(target.chain_id);
            true
        });
        Ok(())
    }

    /// 调用方必须持有 prompt_gate
    async fn align_network(
        &self,
        provider: &dyn WalletProvider,
        target: &NetworkProfile,
    ) -> Result<(), WalletError> {
        let chain_id = target.chain_id;
        let current = provider
            .chain_id()
            .await
            .map_err(|e| network_error(chain_id, e))?;

        if current == chain_id {
            tracing::debug!(chain_id, "Wallet already on target chain");
            return Ok(());
        }

        tracing::info!(from = current, to = chain_id, "Requesting wallet chain switch");
        match provider.switch_chain(chain_id).await {
            Ok(()) => {}
            Err(e) if e.is_unrecognized_chain() => {
                // 钱包不允许通过 switch 配置未知链：先 add，再重试 switch 一次
                tracing::info!(
                    chain_id,
                    name = %target.display_name,
                    "Chain unknown to wallet; requesting add chain"
                );
                provider
                    .add_chain(target)
                    .await
                    .map_err(|e| network_error(chain_id, e))?;
                provider
                    .switch_chain(chain_id)
                    .await
                    .map_err(|e| network_error(chain_id, e))?;
            }
            Err(e) => return Err(network_error(chain_id, e)),
        }

        tracing::info!(chain_id, "Wallet switched to target chain");
        Ok(())
    }

    /// 当前账户句柄
    pub fn signer(&self) -> Result<SessionSigner, WalletError> {
        let session = self.state.borrow();
        match (session.address(), session.chain_id()) {
            (Some(address), Some(chain_id)) if session.is_connected() => Ok(SessionSigner {
                address: address.to_string(),
                chain_id,
            }),
            _ => Err(WalletError::NotConnected),
        }
    }

    /// 构造交易前的前置检查：已连接，并且钱包处于当前网络
    pub async fn prepare_transaction(&self) -> Result<SessionSigner, WalletError> {
        if !self.session().is_connected() {
            return Err(WalletError::NotConnected);
        }
        let target = self.active_network();
        self.ensure_network(&target).await?;
        self.signer()
    }

    /// 处理钱包外部事件
    pub async fn handle_provider_event(&self, event: ProviderEvent) {
        // 等待进行中的提示结束，切链本身触发的 chainChanged 在网络更新后才处理
        let _gate = self.prompt_gate.lock().await;
        let expected = self.network.borrow().chain_id;

        match event {
            ProviderEvent::ChainChanged(chain_id) => {
                self.state.send_if_modified(|session| {
                    if !session.is_connected() {
                        return false;
                    }
                    if chain_id == expected {
                        if session.chain_id() == Some(chain_id) {
                            return false;
                        }
                        *session = session.clone().with_chain_id(chain_id);
                        return true;
                    }
                    tracing::warn!(
                        chain_id,
                        expected,
                        "Wallet switched chain outside the app; session invalidated"
                    );
                    *session = WalletSession::errored(
                        format!("wallet switched to chain {} (expected {})", chain_id, expected),
                        Some(chain_id),
                    );
                    true
                });
            }
            ProviderEvent::AccountsChanged(accounts) => {
                tracing::debug!(accounts = %redact_addresses(&accounts), "Wallet accounts changed");
                match accounts.first() {
                    None => {
                        if self.session().is_connected() {
                            tracing::info!("Wallet revoked account access");
                            self.reset_session(WalletSession::disconnected());
                        }
                    }
                    Some(raw) => match AddressValidator::normalize_evm_address(raw) {
                        Ok(address) => {
                            self.state.send_if_modified(|session| {
                                if !session.is_connected() || session.address() == Some(address.as_str()) {
                                    return false;
                                }
                                tracing::info!(address = %redact_address(&address), "Active account changed");
                                *session = session.clone().with_address(address.clone());
                                true
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Ignoring accountsChanged with invalid address");
                        }
                    },
                }
            }
            ProviderEvent::Disconnected => {
                if self.session().connection_state() != ConnectionState::Disconnected {
                    tracing::warn!("Wallet provider disconnected");
                    self.reset_session(WalletSession::failed("wallet provider disconnected"));
                }
            }
        }
    }

    /// 把 Provider 的事件流接到会话上
    ///
    /// Provider 没有事件能力时返回 None。任务持有弱引用，管理器释放后自动退出。
    pub fn spawn_event_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut events = self.provider.as_ref()?.events()?;
        let manager = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => match manager.upgrade() {
                        Some(manager) => manager.handle_provider_event(event).await,
                        None => break,
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Wallet event listener lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Wallet event stream closed");
                        break;
                    }
                }
            }
        }))
    }

    fn reset_session(&self, next: WalletSession) {
        self.state.send_if_modified(|session| {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            if *session == next {
                return false;
            }
            *session = next;
            true
        });
        self.network.send_replace(self.default_network.clone());
    }

    fn publish(&self, session: WalletSession) {
        tracing::debug!(session = %session.redact(), "Session updated");
        self.state.send_replace(session);
    }
}

/// 切链阶段的错误：环境缺失单独报告，其余都视为切链失败
fn network_error(chain_id: u64, err: ProviderError) -> WalletError {
    if err.is_unavailable() {
        WalletError::ProviderUnavailable
    } else {
        WalletError::NetworkSwitchFailed {
            chain_id,
            source: err,
        }
    }
}

/// 进行中的 connect
///
/// 无论正常结束还是 future 被丢弃都会释放重入标记；
/// 被丢弃时把停留在 `Connecting` 的会话回退为 `Disconnected`。
struct ConnectAttempt<'a> {
    manager: &'a WalletSessionManager,
    finished: bool,
}

impl<'a> ConnectAttempt<'a> {
    fn new(manager: &'a WalletSessionManager) -> Self {
        Self {
            manager,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.manager.state.send_if_modified(|session| {
                if session.connection_state() != ConnectionState::Connecting {
                    return false;
                }
                *session = WalletSession::failed("connection attempt was cancelled");
                true
            });
        }
        self.manager.connect_in_flight.store(false, Ordering::Release);
    }
}
