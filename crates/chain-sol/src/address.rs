//! Solana address validation.
//!
//! Solana addresses are Base58-encoded 32-byte values. A wallet (system
//! account) address is an Ed25519 public key and therefore decompresses to a
//! point on the curve; program derived addresses deliberately do not. Funds
//! sent to an off-curve address can only be moved by the owning program, so
//! the wallet refuses them as transfer recipients.

use crate::error::SolError;

/// Validate a Solana address string.
///
/// A valid Solana address is a Base58-encoded string that decodes to exactly
/// 32 bytes. Returns `Ok(true)` if valid, or an error if decoding fails or
/// the length is wrong. Curve membership is not checked here; see
/// [`validate_wallet_address`].
pub fn validate_address(address: &str) -> Result<bool, SolError> {
    address_to_bytes(address)?;
    Ok(true)
}

/// Validate an address that is expected to belong to a user wallet.
///
/// On top of [`validate_address`], the decoded bytes must be a valid
/// compressed Ed25519 point.
pub fn validate_wallet_address(address: &str) -> Result<bool, SolError> {
    let bytes = address_to_bytes(address)?;
    if !is_on_curve(&bytes) {
        return Err(SolError::InvalidPublicKey(format!(
            "{address} is not an Ed25519 public key"
        )));
    }
    Ok(true)
}

/// Boolean form of [`validate_wallet_address`], for form validation.
pub fn is_valid_wallet_address(address: &str) -> bool {
    validate_wallet_address(address).is_ok()
}

/// Decode a Solana address string to its 32-byte representation.
///
/// Returns an error if the address is not valid Base58 or does not decode
/// to exactly 32 bytes.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })?;

    Ok(arr)
}

/// Encode 32 bytes as a Solana address (Base58 string).
pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

/// Check if 32 bytes represent a valid Ed25519 curve point.
///
/// Uses `curve25519-dalek` to attempt decompression. If it succeeds, the
/// point is on the curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}
