//! Mantle Hub - 钱包会话网关
//!
//! 应用内唯一持有钱包 Provider 的组件：连接、断开、网络对齐，并向 UI 推送会话状态

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode, WalletError, WalletErrorKind};
