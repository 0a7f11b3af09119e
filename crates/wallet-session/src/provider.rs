//! Capability traits over the embedded-wallet SDK and chain endpoints.
//!
//! The SDK owns keys, authentication and signing. This crate only asks it
//! narrow questions through [`WalletSdk`]; everything chain-specific a
//! session needs is behind [`ChainClient`].

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::config::ApiCredential;
use crate::error::ProviderError;
use crate::registry::{NetworkConfig, TrackedAsset};
use crate::types::{ChainFamily, ChainId, NetworkId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub public_address: String,
    pub email: Option<String>,
}

/// A native-asset transfer the SDK is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransfer {
    pub network: NetworkId,
    pub evm_chain_id: Option<u64>,
    pub from: String,
    pub to: String,
    /// Smallest units (lamports, wei, satoshis)
    pub amount: u128,
    /// Solana only: blockhash the transaction is anchored to
    pub recent_blockhash: Option<String>,
}

/// One SDK connection, scoped to a chain family.
#[async_trait]
pub trait WalletSdk: Send + Sync {
    async fn is_logged_in(&self) -> Result<bool, ProviderError>;

    async fn user_info(&self) -> Result<UserInfo, ProviderError>;

    /// Serialized signed transaction, ready for broadcast.
    async fn sign_transfer(&self, transfer: &UnsignedTransfer) -> Result<Vec<u8>, ProviderError>;

    async fn reveal_private_key(&self) -> Result<SecretString, ProviderError>;

    async fn logout(&self) -> Result<(), ProviderError>;
}

/// Opens SDK connections.
pub trait WalletSdkFactory: Send + Sync {
    fn connect(
        &self,
        family: ChainFamily,
        network: &NetworkConfig,
        credential: &ApiCredential,
    ) -> Result<Arc<dyn WalletSdk>, ProviderError>;
}

/// Everything a chain session needs: identity, balances, transfers.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain(&self) -> ChainId;

    async fn is_authenticated(&self) -> Result<bool, ProviderError>;

    async fn resolve_address(&self) -> Result<String, ProviderError>;

    /// Native balance of `address` on `network`, in smallest units.
    async fn native_balance(&self, network: &NetworkConfig, address: &str) -> Result<u128, ProviderError>;

    /// Balance of a non-native tracked asset, in the asset's smallest units.
    async fn token_balance(
        &self,
        network: &NetworkConfig,
        address: &str,
        asset: &TrackedAsset,
    ) -> Result<u128, ProviderError>;

    /// Sign and broadcast a native transfer. Returns the transaction hash
    /// (or signature).
    async fn send_native(
        &self,
        network: &NetworkConfig,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<String, ProviderError>;

    async fn reveal_private_key(&self) -> Result<SecretString, ProviderError>;

    async fn logout(&self) -> Result<(), ProviderError>;
}

/// Builds one client per chain session.
pub trait ClientFactory: Send + Sync {
    fn create(
        &self,
        chain: ChainId,
        network: &NetworkConfig,
        credential: &ApiCredential,
    ) -> Result<Arc<dyn ChainClient>, ProviderError>;

    /// Forget cached SDK connections so the next `create` reconnects with
    /// the current credential.
    fn reset(&self) {}
}
