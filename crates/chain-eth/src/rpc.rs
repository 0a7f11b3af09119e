//! EVM JSON-RPC params and result parsing.

use serde_json::{json, Value};

use crate::address::normalize_address;
use crate::error::EthError;

pub const GET_BALANCE: &str = "eth_getBalance";
pub const SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";

/// Params for `eth_getBalance` at the latest block.
pub fn balance_params(address: &str) -> Value {
    json!([normalize_address(address), "latest"])
}

/// Params for `eth_sendRawTransaction` with a 0x-prefixed hex payload.
pub fn send_raw_transaction_params(signed_tx: &[u8]) -> Value {
    json!([format!("0x{}", hex::encode(signed_tx))])
}

/// Parse a hex `QUANTITY` (e.g. a wei balance) into an integer.
///
/// Balances are read as u128: 2^128 wei is far above any real supply, and
/// the value never passes through a float.
pub fn parse_quantity(result: &Value) -> Result<u128, EthError> {
    let raw = result
        .as_str()
        .ok_or_else(|| EthError::EncodingError(format!("expected hex quantity, got {result}")))?;

    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| EthError::EncodingError(format!("quantity {raw:?} lacks 0x prefix")))?;

    if digits.is_empty() {
        return Err(EthError::EncodingError("empty quantity".into()));
    }

    u128::from_str_radix(digits, 16)
        .map_err(|e| EthError::EncodingError(format!("quantity {raw:?}: {e}")))
}

/// `eth_sendRawTransaction` result: the 32-byte transaction hash.
pub fn parse_transaction_hash(result: &Value) -> Result<String, EthError> {
    let hash = result
        .as_str()
        .ok_or_else(|| EthError::EncodingError(format!("expected tx hash, got {result}")))?;

    let digits = hash.strip_prefix("0x").unwrap_or(hash);
    if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::EncodingError(format!("malformed tx hash {hash:?}")));
    }
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_params_normalize_prefix() {
        let params = balance_params("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        assert_eq!(params[0], "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        assert_eq!(params[1], "latest");
    }

    #[test]
    fn parses_one_ether() {
        let wei = parse_quantity(&json!("0xde0b6b3a7640000")).unwrap();
        assert_eq!(wei, 1_000_000_000_000_000_000);
    }

    #[test]
    fn parses_zero_quantity() {
        assert_eq!(parse_quantity(&json!("0x0")).unwrap(), 0);
    }

    #[test]
    fn quantity_above_f64_precision_is_exact() {
        // 2^53 + 1 wei
        assert_eq!(parse_quantity(&json!("0x20000000000001")).unwrap(), 9_007_199_254_740_993);
    }

    #[test]
    fn rejects_unprefixed_quantity() {
        assert!(parse_quantity(&json!("1234")).is_err());
        assert!(parse_quantity(&json!("0x")).is_err());
        assert!(parse_quantity(&json!(12)).is_err());
    }

    #[test]
    fn send_params_are_prefixed_hex() {
        let params = send_raw_transaction_params(&[0x02, 0xf8]);
        assert_eq!(params[0], "0x02f8");
    }

    #[test]
    fn parses_transaction_hash() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(parse_transaction_hash(&json!(hash)).unwrap(), hash);
        assert!(parse_transaction_hash(&json!("0x1234")).is_err());
    }
}
