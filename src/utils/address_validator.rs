//! 地址验证模块
//!
//! 钱包返回的账户地址在进入会话前统一校验并转换为 EIP-55 校验和格式

use std::str::FromStr;

use ethers::{types::Address, utils::to_checksum};

/// 地址验证错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must be 20 bytes (40 hex chars): {0}")]
    InvalidLength(String),
    #[error("address contains non-hex characters: {0}")]
    InvalidHex(String),
    #[error("address fails EIP-55 checksum: {0}")]
    BadChecksum(String),
}

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    /// 验证EVM地址并返回校验和格式
    ///
    /// 全小写/全大写地址视为未带校验和，直接接受；
    /// 大小写混合的地址必须通过 EIP-55 校验。
    pub fn normalize_evm_address(address: &str) -> Result<String, AddressError> {
        let trimmed = address.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(address.to_string()))?;

        if hex_part.len() != 40 {
            return Err(AddressError::InvalidLength(address.to_string()));
        }
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex(address.to_string()));
        }

        let parsed = Address::from_str(hex_part)
            .map_err(|_| AddressError::InvalidHex(address.to_string()))?;
        let checksummed = to_checksum(&parsed, None);

        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && checksummed[2..] != *hex_part {
            return Err(AddressError::BadChecksum(address.to_string()));
        }

        Ok(checksummed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_address_is_checksummed() {
        let normalized = AddressValidator::normalize_evm_address(
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
        )
        .unwrap();
        assert_eq!(normalized, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_valid_checksum_passes() {
        let addr = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
        assert_eq!(AddressValidator::normalize_evm_address(addr).unwrap(), addr);
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let addr = "0xfb6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
        assert_eq!(
            AddressValidator::normalize_evm_address(addr),
            Err(AddressError::BadChecksum(addr.to_string()))
        );
    }

    #[test]
    fn test_malformed_addresses() {
        assert!(matches!(
            AddressValidator::normalize_evm_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            AddressValidator::normalize_evm_address("0x1234"),
            Err(AddressError::InvalidLength(_))
        ));
        assert!(matches!(
            AddressValidator::normalize_evm_address("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(AddressError::InvalidHex(_))
        ));
        assert!(AddressValidator::normalize_evm_address("").is_err());
    }
}
