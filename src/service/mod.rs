pub mod eip1193;
pub mod interaction_ledger;
pub mod tx_preflight;
pub mod wallet_provider;
pub mod wallet_session_manager;

pub use eip1193::{Eip1193Provider, Eip1193Transport, ProviderEventHub};
pub use interaction_ledger::{InteractionCount, InteractionError, InteractionLedger};
pub use tx_preflight::TxPreflight;
pub use wallet_provider::{ProviderError, ProviderEvent, WalletProvider};
pub use wallet_session_manager::{SessionSigner, WalletSessionManager};
