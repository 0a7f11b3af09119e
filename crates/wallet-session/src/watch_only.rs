//! SDK adapter that serves fixed, configured addresses and never signs.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::config::ApiCredential;
use crate::error::ProviderError;
use crate::provider::{UnsignedTransfer, UserInfo, WalletSdk, WalletSdkFactory};
use crate::registry::NetworkConfig;
use crate::types::ChainFamily;

pub struct WatchOnlySdk {
    address: String,
}

impl WatchOnlySdk {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl WalletSdk for WatchOnlySdk {
    async fn is_logged_in(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn user_info(&self) -> Result<UserInfo, ProviderError> {
        Ok(UserInfo {
            public_address: self.address.clone(),
            email: None,
        })
    }

    async fn sign_transfer(&self, _transfer: &UnsignedTransfer) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::Rejected("watch-only wallet cannot sign".into()))
    }

    async fn reveal_private_key(&self) -> Result<SecretString, ProviderError> {
        Err(ProviderError::Unsupported("watch-only wallet holds no keys".into()))
    }

    async fn logout(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Connects each chain family to its configured address. Families with no
/// address get no session.
pub struct WatchOnlyFactory {
    addresses: BTreeMap<ChainFamily, String>,
}

impl WatchOnlyFactory {
    pub fn new(addresses: BTreeMap<ChainFamily, String>) -> Self {
        Self { addresses }
    }
}

fn is_valid_for(network: &NetworkConfig, address: &str) -> bool {
    match network.family() {
        ChainFamily::Solana => chain_sol::is_valid_wallet_address(address),
        ChainFamily::Evm => chain_eth::is_hex_address(address),
        ChainFamily::Bitcoin => chain_btc::address::is_valid_address(address, network.btc_network()),
    }
}

impl WalletSdkFactory for WatchOnlyFactory {
    fn connect(
        &self,
        family: ChainFamily,
        network: &NetworkConfig,
        _credential: &ApiCredential,
    ) -> Result<Arc<dyn WalletSdk>, ProviderError> {
        let address = self
            .addresses
            .get(&family)
            .map(|a| a.trim())
            .ok_or_else(|| ProviderError::Unsupported(format!("no watch-only address for {family}")))?;
        if !is_valid_for(network, address) {
            return Err(ProviderError::Rejected(format!(
                "{address:?} is not a valid {} address",
                network.display_name
            )));
        }
        Ok(Arc::new(WatchOnlySdk::new(address)))
    }
}
