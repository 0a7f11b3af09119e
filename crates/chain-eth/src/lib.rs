//! Ethereum/EVM chain support for the wallet session core.
//!
//! This crate provides:
//! - Ethereum address format checks and EIP-55 checksums
//! - EVM network definitions for the chains the wallet can switch between
//! - JSON-RPC params and result parsing for balance reads and raw broadcast

pub mod address;
pub mod chains;
pub mod error;
pub mod rpc;

pub use address::{
    checksum_address, is_hex_address, is_valid_address, normalize_address, validate_address,
};
pub use chains::{by_chain_id, EvmChain};
pub use error::EthError;
