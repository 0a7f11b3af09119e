//! Solana chain support for the wallet session core.
//!
//! This crate handles Solana address validation, associated token account
//! derivation and the small slice of the JSON-RPC surface the wallet reads
//! balances through, without pulling in `solana-sdk` or
//! `solana-client` (which drag in 200+ transitive dependencies).
//!
//! Requests are described as method name + `serde_json` params; the HTTP
//! transport lives in `wallet-session`.

pub mod address;
pub mod error;
pub mod rpc;
pub mod spl_token;

// Re-export key public types for ergonomic imports.
pub use address::{
    address_to_bytes, bytes_to_address, is_on_curve, is_valid_wallet_address, validate_address,
    validate_wallet_address,
};
pub use error::SolError;
pub use spl_token::{
    derive_associated_token_address, associated_token_address_for, ASSOCIATED_TOKEN_PROGRAM_ID,
    TOKEN_PROGRAM_ID,
};
