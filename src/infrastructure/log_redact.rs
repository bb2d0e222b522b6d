//! 日志脱敏
//! 账户地址不以明文进入日志

/// 可脱敏trait
pub trait SensitiveRedact {
    fn redact(&self) -> String;
}

/// 脱敏地址（显示前6位和后4位）
pub fn redact_address(address: &str) -> String {
    if address.len() < 10 || !address.is_ascii() {
        return "*".repeat(address.chars().count());
    }

    let prefix = &address[..6];
    let suffix = &address[address.len() - 4..];
    format!("{}...{}", prefix, suffix)
}

/// 脱敏地址列表（accountsChanged 事件）
pub fn redact_addresses(addresses: &[String]) -> String {
    let parts: Vec<String> = addresses.iter().map(|a| redact_address(a)).collect();
    format!("[{}]", parts.join(", "))
}
