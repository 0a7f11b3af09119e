use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum WalletError {
    #[error("Unknown chain or network: {0}")]
    UnknownChain(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid address: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a chain session could not produce its address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressResolutionError {
    #[error("user is not logged in")]
    NotAuthenticated,

    #[error("address lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider error: {0}")]
    ProviderError(String),
}

/// Failures reported by an SDK adapter or a chain RPC endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("transport: {0}")]
    Transport(String),

    #[error("rpc: {0}")]
    Rpc(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<ProviderError> for AddressResolutionError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NotAuthenticated => AddressResolutionError::NotAuthenticated,
            other => AddressResolutionError::ProviderError(other.to_string()),
        }
    }
}

impl From<AddressResolutionError> for WalletError {
    fn from(e: AddressResolutionError) -> Self {
        match e {
            AddressResolutionError::NotAuthenticated => WalletError::NotAuthenticated,
            AddressResolutionError::Timeout(after) => {
                WalletError::Timeout(format!("address lookup after {after:?}"))
            }
            AddressResolutionError::ProviderError(msg) => WalletError::Provider(msg),
        }
    }
}

impl From<ProviderError> for WalletError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NotAuthenticated => WalletError::NotAuthenticated,
            ProviderError::InsufficientFunds(msg) => WalletError::InsufficientBalance(msg),
            other => WalletError::Provider(other.to_string()),
        }
    }
}

impl From<chain_btc::error::BtcError> for ProviderError {
    fn from(e: chain_btc::error::BtcError) -> Self {
        ProviderError::Rpc(format!("BTC: {e}"))
    }
}

impl From<chain_eth::error::EthError> for ProviderError {
    fn from(e: chain_eth::error::EthError) -> Self {
        ProviderError::Rpc(format!("ETH: {e}"))
    }
}

impl From<chain_sol::error::SolError> for ProviderError {
    fn from(e: chain_sol::error::SolError) -> Self {
        ProviderError::Rpc(format!("SOL: {e}"))
    }
}
