//! Solana JSON-RPC request params and response parsing.
//!
//! Only the read paths the wallet needs (balances, blockhash) plus
//! `sendTransaction` for broadcasting an already-signed payload.

use base64::Engine;
use serde_json::{json, Value};

use crate::error::SolError;

pub const GET_BALANCE: &str = "getBalance";
pub const GET_TOKEN_ACCOUNT_BALANCE: &str = "getTokenAccountBalance";
pub const GET_LATEST_BLOCKHASH: &str = "getLatestBlockhash";
pub const SEND_TRANSACTION: &str = "sendTransaction";

/// JSON-RPC error code returned for params that reference a missing account.
const INVALID_PARAMS: i64 = -32602;

pub fn balance_params(address: &str) -> Value {
    json!([address, { "commitment": "confirmed" }])
}

pub fn token_account_balance_params(token_account: &str) -> Value {
    json!([token_account, { "commitment": "confirmed" }])
}

pub fn latest_blockhash_params() -> Value {
    json!([{ "commitment": "finalized" }])
}

/// Params for `sendTransaction` with the signed wire bytes encoded as base64.
pub fn send_transaction_params(signed_tx: &[u8]) -> Value {
    let encoded = base64::engine::general_purpose::STANDARD.encode(signed_tx);
    json!([encoded, { "encoding": "base64", "preflightCommitment": "confirmed" }])
}

/// `getBalance` result: `{ "context": {..}, "value": <lamports> }`.
pub fn parse_balance(result: &Value) -> Result<u64, SolError> {
    result
        .get("value")
        .and_then(Value::as_u64)
        .ok_or_else(|| SolError::InvalidResponse(format!("getBalance: unexpected result {result}")))
}

/// `getTokenAccountBalance` result: the raw amount is a decimal string in
/// `value.amount` (token amounts can exceed 2^53, so it is never read from
/// `uiAmount`).
pub fn parse_token_account_balance(result: &Value) -> Result<u64, SolError> {
    let amount = result
        .get("value")
        .and_then(|v| v.get("amount"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            SolError::InvalidResponse(format!("getTokenAccountBalance: unexpected result {result}"))
        })?;

    amount
        .parse::<u64>()
        .map_err(|e| SolError::InvalidResponse(format!("token amount {amount:?}: {e}")))
}

/// `getLatestBlockhash` result: `value.blockhash` as Base58.
pub fn parse_latest_blockhash(result: &Value) -> Result<String, SolError> {
    result
        .get("value")
        .and_then(|v| v.get("blockhash"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            SolError::InvalidResponse(format!("getLatestBlockhash: unexpected result {result}"))
        })
}

/// `sendTransaction` result: the transaction signature.
pub fn parse_signature(result: &Value) -> Result<String, SolError> {
    result
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| SolError::InvalidResponse(format!("sendTransaction: unexpected result {result}")))
}

/// Whether an RPC error object means the queried account does not exist.
///
/// A token account that was never created holds zero tokens, so callers
/// treat this as a zero balance rather than a failure.
pub fn is_missing_account_error(error: &Value) -> bool {
    let code = error.get("code").and_then(Value::as_i64);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    code == Some(INVALID_PARAMS) && message.contains("could not find account")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_params_carry_address() {
        let params = balance_params("So11111111111111111111111111111111111111112");
        assert_eq!(params[0], "So11111111111111111111111111111111111111112");
    }

    #[test]
    fn parses_lamports() {
        let result = json!({ "context": { "slot": 1 }, "value": 1_500_000_000u64 });
        assert_eq!(parse_balance(&result).unwrap(), 1_500_000_000);
    }

    #[test]
    fn balance_without_value_is_an_error() {
        assert!(parse_balance(&json!({ "context": {} })).is_err());
    }

    #[test]
    fn parses_token_amount_from_string() {
        let result = json!({
            "context": { "slot": 1 },
            "value": { "amount": "9007199254740993", "decimals": 9, "uiAmount": 9007199.254740993 }
        });
        assert_eq!(parse_token_account_balance(&result).unwrap(), 9_007_199_254_740_993);
    }

    #[test]
    fn non_numeric_token_amount_is_an_error() {
        let result = json!({ "value": { "amount": "lots", "decimals": 9 } });
        assert!(parse_token_account_balance(&result).is_err());
    }

    #[test]
    fn parses_blockhash() {
        let result = json!({ "value": { "blockhash": "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N", "lastValidBlockHeight": 10 } });
        assert_eq!(
            parse_latest_blockhash(&result).unwrap(),
            "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N"
        );
    }

    #[test]
    fn send_params_are_base64() {
        let params = send_transaction_params(&[1, 2, 3]);
        assert_eq!(params[0], "AQID");
        assert_eq!(params[1]["encoding"], "base64");
    }

    #[test]
    fn detects_missing_account() {
        let error = json!({ "code": -32602, "message": "Invalid param: could not find account" });
        assert!(is_missing_account_error(&error));
    }

    #[test]
    fn other_errors_are_not_missing_account() {
        let error = json!({ "code": -32005, "message": "Node is behind" });
        assert!(!is_missing_account_error(&error));
    }
}
