use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Validates an Ethereum address string.
///
/// Checks that the address has the correct format (0x + 40 hex characters).
/// If the address contains mixed case, the EIP-55 checksum is verified and
/// a mismatch yields `Ok(false)`.
pub fn validate_address(address: &str) -> Result<bool, EthError> {
    let hex_part = hex_body(address)?;

    // All-lowercase or all-uppercase carries no checksum to verify.
    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());

    if is_all_lower || is_all_upper {
        return Ok(true);
    }

    let checksummed = checksum_address(&format!("0x{}", hex_part.to_lowercase()))?;
    Ok(checksummed[2..] == *hex_part)
}

/// Boolean form of [`validate_address`]: format plus EIP-55 checksum.
pub fn is_valid_address(address: &str) -> bool {
    matches!(validate_address(address), Ok(true))
}

/// `0x` followed by 40 hex digits, in any case. No checksum check.
pub fn is_hex_address(address: &str) -> bool {
    hex_body(address).is_ok()
}

/// Adds a missing `0x` prefix to an address reported without one.
///
/// Some SDK builds hand back the bare 40-digit hex form; `eth_getBalance`
/// rejects it, so addresses are normalized before they reach the RPC layer.
pub fn normalize_address(address: &str) -> String {
    if address.starts_with("0x") || address.starts_with("0X") {
        address.to_string()
    } else {
        format!("0x{address}")
    }
}

/// Applies EIP-55 mixed-case checksum encoding to an Ethereum address.
///
/// The input should be a 0x-prefixed address in any case. Returns the
/// checksummed version.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    let hex_part = hex_body(address)?.to_lowercase();

    // EIP-55: hash the lowercase hex address (without 0x).
    let hash = Keccak256::digest(hex_part.as_bytes());
    let hash_hex = hex::encode(hash);

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (c, nibble) in hex_part.chars().zip(hash_hex.chars()) {
        // Uppercase letters whose hash nibble is >= 8.
        if c.is_ascii_alphabetic() && nibble.to_digit(16).unwrap_or(0) >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}

fn hex_body(address: &str) -> Result<&str, EthError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    Ok(hex_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip55_checksum_known_addresses() {
        // Test vectors from EIP-55.
        let cases = [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ];

        for expected in &cases {
            let lower = format!("0x{}", expected[2..].to_lowercase());
            let result = checksum_address(&lower).unwrap();
            assert_eq!(&result, expected, "checksum mismatch for {expected}");
        }
    }

    #[test]
    fn validate_valid_checksummed_address() {
        assert!(validate_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap());
    }

    #[test]
    fn validate_all_uppercase_hex_address() {
        assert!(validate_address("0xABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap());
        assert!(is_valid_address("0xABCDEF0123456789ABCDEF0123456789ABCDEF01"));
    }

    #[test]
    fn validate_all_lowercase_address() {
        assert!(validate_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap());
    }

    #[test]
    fn validate_bad_checksum_returns_false() {
        // Intentionally wrong case on a letter to break checksum.
        let addr = "0x5AAEB6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert!(!validate_address(addr).unwrap());
        assert!(!is_valid_address(addr));
    }

    #[test]
    fn validate_short_address_errors() {
        assert!(validate_address("0x5aAeb6053F").is_err());
    }

    #[test]
    fn validate_no_prefix_errors() {
        assert!(validate_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
    }

    #[test]
    fn validate_non_hex_chars_errors() {
        assert!(validate_address("0xGGGGb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
    }

    #[test]
    fn bitcoin_address_is_not_an_evm_address() {
        assert!(!is_valid_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"));
        assert!(!is_hex_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"));
    }

    #[test]
    fn hex_address_ignores_checksum_case() {
        let addr = "0xaBcDeF0123456789ABCDEF0123456789ABCDEF01";
        assert!(is_hex_address(addr));
        assert!(!is_valid_address(addr));
        assert!(!is_hex_address("0xaBcDeF0123456789ABCDEF0123456789ABCDEF0"));
        assert!(!is_hex_address("aBcDeF0123456789ABCDEF0123456789ABCDEF0123"));
    }

    #[test]
    fn normalize_adds_missing_prefix() {
        assert_eq!(
            normalize_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        );
        assert_eq!(normalize_address("0xabc"), "0xabc");
    }
}
