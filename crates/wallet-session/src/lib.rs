//! Multi-chain wallet session core.
//!
//! One authenticated session per chain (Solana, Ethereum, Polygon, Base,
//! Bitcoin), each resolving its own address; a single active network; and
//! per-asset balance slots that refresh independently. [`AppContext`] owns
//! all of it. The embedded-wallet SDK is reached only through the traits in
//! [`provider`] and [`auth`].

pub mod amount;
pub mod auth;
pub mod balance;
pub mod config;
pub mod context;
pub mod error;
pub mod explorer;
pub mod logging;
pub mod provider;
pub mod registry;
pub mod rpc;
pub mod selector;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod types;
pub mod watch_only;

#[cfg(test)]
mod mock;

use std::sync::OnceLock;

pub use context::AppContext;
pub use error::WalletError;

use registry::ChainRegistry;
use types::NetworkId;

uniffi::setup_scaffolding!();

// ─── UniFFI-exported types ───────────────────────────────────────────

/// A supported network, as seen by the mobile shells.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NetworkInfo {
    pub id: String,
    pub chain: String,
    pub display_name: String,
    pub native_symbol: String,
    pub native_decimals: u8,
    pub evm_chain_id: Option<u64>,
    pub is_testnet: bool,
}

// ─── UniFFI-exported functions ───────────────────────────────────────
// Amounts cross the boundary as decimal strings: u128 has no FFI mapping.

fn builtin_registry() -> &'static ChainRegistry {
    static REGISTRY: OnceLock<ChainRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ChainRegistry::builtin)
}

fn parse_network(network: &str) -> Result<NetworkId, WalletError> {
    network.trim().parse()
}

/// Every built-in network in registry order
#[uniffi::export]
pub fn supported_networks() -> Vec<NetworkInfo> {
    builtin_registry()
        .networks()
        .iter()
        .map(|n| NetworkInfo {
            id: n.id.to_string(),
            chain: n.chain.to_string(),
            display_name: n.display_name.clone(),
            native_symbol: n.native_symbol.clone(),
            native_decimals: n.native_decimals,
            evm_chain_id: n.evm_chain_id,
            is_testnet: n.is_testnet,
        })
        .collect()
}

/// Check a recipient address for a network without touching the network
#[uniffi::export]
pub fn validate_recipient(network: String, address: String) -> Result<bool, WalletError> {
    builtin_registry().validate_address(parse_network(&network)?, address.trim())
}

/// Parse a user-entered decimal amount into smallest units
#[uniffi::export]
pub fn parse_amount(amount: String, decimals: u8) -> Result<String, WalletError> {
    Ok(amount::to_smallest_unit(&amount, decimals)?.to_string())
}

/// Format a raw native balance the way the network displays it
#[uniffi::export]
pub fn format_native_amount(raw: String, network: String) -> Result<String, WalletError> {
    let config = builtin_registry().resolve(parse_network(&network)?)?;
    let raw: u128 = raw
        .trim()
        .parse()
        .map_err(|e| WalletError::InvalidAmount(format!("{raw:?}: {e}")))?;
    Ok(amount::format_for_display(raw, config.native_decimals, config.display_rule))
}

/// Explorer link for a transaction hash or an address
#[uniffi::export]
pub fn explorer_link(network: String, value: String) -> Result<String, WalletError> {
    builtin_registry().explorer_url_auto(parse_network(&network)?, value.trim())
}

/// Network an asset-list row switches to
#[uniffi::export]
pub fn network_for_asset_row(chain_name: String) -> String {
    builtin_registry().network_for_asset_row(&chain_name).to_string()
}
