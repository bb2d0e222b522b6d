//! Domain 模块
//!
//! 钱包会话、目标网络和协议目录的领域模型

pub mod network_profile;
pub mod protocol;
pub mod wallet_session;

// 重新导出常用类型
pub use network_profile::{NetworkProfile, NetworkRegistry, ProfileError};
pub use protocol::{Protocol, ProtocolCategory, ProtocolLinks};
pub use wallet_session::{ConnectionState, WalletSession};
