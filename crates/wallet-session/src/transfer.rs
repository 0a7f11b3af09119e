use serde::Serialize;
use tracing::{info, warn};

use crate::amount::to_smallest_unit;
use crate::error::WalletError;
use crate::explorer::ExplorerKind;
use crate::registry::ChainRegistry;
use crate::session::SessionSet;
use crate::types::NetworkId;

/// A native transfer as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: String,
    /// Decimal amount in whole units, e.g. `"0.25"`.
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub network: NetworkId,
    pub tx_hash: String,
    pub explorer_url: String,
}

/// Send `request` from the wallet's address on `network`.
///
/// Checks run in order: recipient format, amount, then that the sender's
/// address has resolved. The broadcast is attempted once.
pub async fn send_native(
    registry: &ChainRegistry,
    sessions: &SessionSet,
    network: NetworkId,
    request: &TransferRequest,
) -> Result<TransferReceipt, WalletError> {
    let config = registry.resolve(network)?;
    let to = request.to.trim();

    if !registry.validate_address(network, to)? {
        return Err(WalletError::InvalidAddressFormat(format!(
            "{to:?} is not a {} address",
            config.display_name
        )));
    }

    let amount = to_smallest_unit(&request.amount, config.native_decimals)?;
    if amount == 0 {
        return Err(WalletError::InvalidAmount("amount must be greater than zero".into()));
    }

    let chain = network.chain();
    let session = sessions.get(chain).ok_or(WalletError::NotAuthenticated)?;
    let from = session.resolved_address().ok_or(WalletError::NotAuthenticated)?;

    let tx_hash = session
        .client()
        .send_native(config, from, to, amount)
        .await
        .map_err(|e| {
            warn!(%chain, %network, error = %e, "transfer failed");
            WalletError::from(e)
        })?;

    let explorer_url = registry.explorer_url(network, ExplorerKind::Tx, &tx_hash)?;
    info!(%chain, %network, tx = %tx_hash, "transfer broadcast");
    Ok(TransferReceipt {
        network,
        tx_hash,
        explorer_url,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::ApiCredential;
    use crate::error::ProviderError;
    use crate::mock::MockFactory;
    use crate::storage::WalletStorage;
    use crate::types::ChainId;

    const SOL_RECIPIENT: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const EVM_RECIPIENT: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    fn sessions(factory: Arc<MockFactory>) -> (Arc<ChainRegistry>, SessionSet) {
        let registry = Arc::new(ChainRegistry::builtin());
        let sessions = SessionSet::new(
            registry.clone(),
            factory,
            WalletStorage::in_memory(),
            Duration::from_secs(10),
        );
        sessions.initialize_all(&ApiCredential::new("pk"));
        (registry, sessions)
    }

    fn request(to: &str, amount: &str) -> TransferRequest {
        TransferRequest {
            to: to.into(),
            amount: amount.into(),
        }
    }

    #[tokio::test]
    async fn sends_and_links_to_explorer() {
        let factory = MockFactory::new();
        let client = factory.client(ChainId::Solana).with_send_result(Ok("5sig".into()));
        let (registry, sessions) = sessions(factory);
        sessions.resolve_address(ChainId::Solana).await.unwrap();

        let receipt = send_native(
            &registry,
            &sessions,
            NetworkId::SolanaDevnet,
            &request(SOL_RECIPIENT, "0.5"),
        )
        .await
        .unwrap();

        assert_eq!(receipt.tx_hash, "5sig");
        assert_eq!(
            receipt.explorer_url,
            "https://explorer.solana.com/tx/5sig?cluster=devnet"
        );
        assert_eq!(client.sends(), 1);
    }

    #[tokio::test]
    async fn bad_recipient_is_rejected_before_anything_else() {
        let factory = MockFactory::new();
        let (registry, sessions) = sessions(factory.clone());

        let err = send_native(
            &registry,
            &sessions,
            NetworkId::BitcoinMainnet,
            &request(EVM_RECIPIENT, "not a number"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WalletError::InvalidAddressFormat(_)));
        assert_eq!(factory.client(ChainId::Bitcoin).sends(), 0);
    }

    #[tokio::test]
    async fn amount_is_checked_before_sender() {
        let (registry, sessions) = sessions(MockFactory::new());
        for amount in ["", "-1", "1.0000000000000000001", "0"] {
            let err = send_native(
                &registry,
                &sessions,
                NetworkId::EthereumMainnet,
                &request(EVM_RECIPIENT, amount),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, WalletError::InvalidAmount(_)), "{amount:?}: {err}");
        }
    }

    #[tokio::test]
    async fn unresolved_sender_is_not_authenticated() {
        let factory = MockFactory::new();
        let (registry, sessions) = sessions(factory.clone());
        let err = send_native(
            &registry,
            &sessions,
            NetworkId::BaseMainnet,
            &request(EVM_RECIPIENT, "0.01"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WalletError::NotAuthenticated));
        assert_eq!(factory.client(ChainId::Base).sends(), 0);
    }

    #[tokio::test]
    async fn broadcast_failure_is_returned_once() {
        let factory = MockFactory::new();
        let client = factory
            .client(ChainId::Ethereum)
            .with_send_result(Err(ProviderError::InsufficientFunds("gas * price + value".into())));
        let (registry, sessions) = sessions(factory);
        sessions.resolve_address(ChainId::Ethereum).await.unwrap();

        let err = send_native(
            &registry,
            &sessions,
            NetworkId::EthereumSepolia,
            &request(EVM_RECIPIENT, "1"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WalletError::InsufficientBalance(_)));
        assert_eq!(client.sends(), 1);
    }
}
