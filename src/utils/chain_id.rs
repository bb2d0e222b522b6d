//! 链ID标准化模块
//!
//! 钱包在线路上使用 `0x` 十六进制链ID（EIP-695 / EIP-3326），
//! 应用内部统一使用 `u64` 十进制数值比较。所有边界处的转换都走这里。

use serde_json::Value;

/// 链ID解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainIdError {
    #[error("chain id is empty")]
    Empty,
    #[error("invalid chain id: {0}")]
    Invalid(String),
    #[error("chain id must be a string or number, got {0}")]
    UnexpectedType(String),
}

/// 解析字符串形式的链ID
///
/// 接受 `0x1388` / `0X1388`（十六进制）和 `5000`（十进制）。
pub fn parse_chain_id_str(raw: &str) -> Result<u64, ChainIdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ChainIdError::Empty);
    }

    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some("") => return Err(ChainIdError::Invalid(raw.to_string())),
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };

    parsed.map_err(|_| ChainIdError::Invalid(raw.to_string()))
}

/// 解析钱包返回的链ID（JSON值）
///
/// 大多数钱包返回十六进制字符串，少数旧实现直接返回数字。
pub fn parse_chain_id(value: &Value) -> Result<u64, ChainIdError> {
    match value {
        Value::String(s) => parse_chain_id_str(s),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ChainIdError::Invalid(n.to_string())),
        other => Err(ChainIdError::UnexpectedType(type_name(other).to_string())),
    }
}

/// 转换为线路格式：最短的小写 `0x` 十六进制（无前导零）
pub fn to_hex_chain_id(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
