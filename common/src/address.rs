use crate::error::{GatewayError, Result};

/// Validates and normalizes an EVM address to its lowercase `0x`-prefixed
/// form. Validation happens exactly once at the entry point; everything
/// downstream assumes the normalized form (spec §4.2).
pub fn normalize_address(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GatewayError::InvalidAddress(raw.to_string()));
    }

    Ok(format!("0x{}", hex_part.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mixed_case_and_lowercases() {
        let addr = normalize_address("0xABC0000000000000000000000000000000ABC1").unwrap();
        assert_eq!(addr, "0xabc0000000000000000000000000000000abc1");
    }

    #[test]
    fn accepts_missing_0x_prefix() {
        let addr = normalize_address("abc0000000000000000000000000000000abc1").unwrap();
        assert_eq!(addr, "0xabc0000000000000000000000000000000abc1");
    }

    #[test]
    fn rejects_short_address() {
        assert!(normalize_address("0xabc").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        assert!(normalize_address("0xzzzz000000000000000000000000000000abc1").is_err());
    }
}
