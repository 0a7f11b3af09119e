//! Application context: owns the registry, sessions, selector and balances
//! and routes events between them.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::auth::{AuthFlow, AuthSdk, SocialLoginOutcome, SocialProvider};
use crate::balance::{AssetBalance, BalanceAggregator};
use crate::config::{ApiCredential, WalletConfig};
use crate::error::WalletError;
use crate::provider::{ClientFactory, WalletSdkFactory};
use crate::registry::{ChainRegistry, NetworkConfig};
use crate::rpc::{JsonRpcClient, SdkClientFactory};
use crate::selector::{NetworkSelector, NetworkSwitch};
use crate::session::SessionSet;
use crate::storage::WalletStorage;
use crate::transfer::{self, TransferReceipt, TransferRequest};
use crate::types::{ChainId, NetworkId};

pub struct AppContext {
    registry: Arc<ChainRegistry>,
    storage: WalletStorage,
    sessions: Arc<SessionSet>,
    selector: Arc<NetworkSelector>,
    balances: BalanceAggregator,
    auth: Option<AuthFlow>,
    credential: ApiCredential,
}

impl AppContext {
    pub fn new(
        registry: ChainRegistry,
        factory: Arc<dyn ClientFactory>,
        storage: WalletStorage,
        credential: ApiCredential,
        initial: NetworkId,
        resolve_timeout: Duration,
    ) -> Result<Self, WalletError> {
        let registry = Arc::new(registry);
        let selector = Arc::new(NetworkSelector::new(registry.clone(), initial)?);
        let sessions = Arc::new(SessionSet::new(
            registry.clone(),
            factory,
            storage.clone(),
            resolve_timeout,
        ));
        let balances = BalanceAggregator::new(registry.clone(), sessions.clone(), selector.clone());
        Ok(Self {
            registry,
            storage,
            sessions,
            selector,
            balances,
            auth: None,
            credential,
        })
    }

    /// Context wired to public RPC endpoints through `sdk_factory`.
    pub fn from_config(
        config: &WalletConfig,
        sdk_factory: Arc<dyn WalletSdkFactory>,
        credential: ApiCredential,
    ) -> Result<Self, WalletError> {
        let registry = config.build_registry()?;
        let storage = match &config.storage_dir {
            Some(dir) => WalletStorage::open(dir)?,
            None => WalletStorage::in_memory(),
        };
        let rpc = JsonRpcClient::new(config.rpc_timeout())?;
        let factory = Arc::new(SdkClientFactory::new(sdk_factory, rpc));
        Self::new(
            registry,
            factory,
            storage,
            credential,
            config.network,
            config.address_timeout(),
        )
    }

    pub fn with_auth(mut self, sdk: Arc<dyn AuthSdk>, redirect_base: impl Into<String>) -> Self {
        self.auth = Some(AuthFlow::new(sdk, self.storage.clone(), redirect_base));
        self
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionSet {
        &self.sessions
    }

    pub fn storage(&self) -> &WalletStorage {
        &self.storage
    }

    /// Build every chain session. Returns how many came up.
    pub fn startup(&self) -> usize {
        self.sessions.initialize_all(&self.credential)
    }

    /// Resolve each chain's address and refresh its balances as soon as it
    /// resolves. Chains settle independently.
    pub async fn sync(&self) {
        let chains = self.sessions.chains().into_iter().map(|chain| async move {
            if self.sessions.resolve_address(chain).await.is_ok() {
                self.balances.refresh_one(chain).await;
            }
        });
        join_all(chains).await;
    }

    pub async fn refresh_balances(&self) {
        self.balances.refresh_all().await;
    }

    pub fn active_network(&self) -> NetworkId {
        self.selector.current()
    }

    pub fn active_network_config(&self) -> Result<&NetworkConfig, WalletError> {
        self.selector.current_config()
    }

    pub fn subscribe_network(&self) -> watch::Receiver<NetworkId> {
        self.selector.subscribe()
    }

    /// Switch the active network and refresh the chain it lands on. A
    /// switch to the current network does nothing.
    pub async fn switch_network(&self, network: NetworkId) -> Result<Option<NetworkSwitch>, WalletError> {
        let switch = self.selector.switch_to(network)?;
        if let Some(switch) = switch {
            self.balances.on_network_switched(switch).await;
        }
        Ok(switch)
    }

    /// A row of the asset list was picked: switch to its chain's mainnet.
    pub async fn select_asset_row(&self, chain_name: &str) -> Result<NetworkId, WalletError> {
        let network = self.registry.network_for_asset_row(chain_name);
        self.switch_network(network).await?;
        Ok(network)
    }

    /// Display address for `chain`: resolved, or remembered from a
    /// previous run while resolution is pending.
    pub fn address(&self, chain: ChainId) -> Option<String> {
        self.sessions.get(chain)?.display_address().map(str::to_owned)
    }

    pub fn asset_list(&self) -> Vec<AssetBalance> {
        self.balances.balances()
    }

    pub fn primary_balance(&self) -> Option<AssetBalance> {
        self.balances.primary_balance()
    }

    /// Send on the active network, then refresh its balances.
    pub async fn send_transaction(&self, request: &TransferRequest) -> Result<TransferReceipt, WalletError> {
        let network = self.selector.current();
        let receipt = transfer::send_native(&self.registry, &self.sessions, network, request).await?;
        self.balances.refresh_one(network.chain()).await;
        Ok(receipt)
    }

    /// Export the active chain's key through the SDK.
    pub async fn reveal_private_key(&self) -> Result<SecretString, WalletError> {
        let chain = self.selector.current().chain();
        let session = self.sessions.get(chain).ok_or(WalletError::NotAuthenticated)?;
        let key = session.client().reveal_private_key().await?;
        info!(%chain, "private key revealed");
        Ok(key)
    }

    fn auth(&self) -> Result<&AuthFlow, WalletError> {
        self.auth
            .as_ref()
            .ok_or_else(|| WalletError::Config("login is not configured".into()))
    }

    /// Fresh sessions and balances after a login.
    async fn reauthenticated(&self) {
        self.sessions.replace_all(&self.credential);
        self.balances.reset();
        self.sync().await;
    }

    pub async fn login_with_email(&self, email: &str) -> Result<(), WalletError> {
        self.auth()?.login_with_email(email).await?;
        self.reauthenticated().await;
        Ok(())
    }

    pub async fn begin_social_login(&self, provider: SocialProvider) -> Result<SocialLoginOutcome, WalletError> {
        let outcome = self.auth()?.begin_social_login(provider).await?;
        if outcome == SocialLoginOutcome::LoggedIn {
            self.reauthenticated().await;
        }
        Ok(outcome)
    }

    /// Call on every start; completes a pending redirect login if there is
    /// one.
    pub async fn complete_redirect(&self) -> Result<bool, WalletError> {
        let logged_in = self.auth()?.complete_redirect().await?;
        if logged_in {
            self.reauthenticated().await;
        }
        Ok(logged_in)
    }

    /// Log every chain out, drop all sessions and forget balances. SDK
    /// logout failures are logged and do not stop the local cleanup.
    pub async fn logout(&self) -> Result<(), WalletError> {
        let logouts = self.sessions.all().into_iter().map(|session| async move {
            if let Err(e) = session.client().logout().await {
                warn!(chain = %session.chain(), error = %e, "SDK logout failed");
            }
        });
        join_all(logouts).await;

        self.sessions.invalidate_all()?;
        self.balances.reset();
        info!("logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::auth::RedirectRequest;
    use crate::balance::FetchState;
    use crate::error::ProviderError;
    use crate::mock::MockFactory;
    use crate::storage::keys;

    fn context(factory: Arc<MockFactory>, initial: NetworkId) -> AppContext {
        AppContext::new(
            ChainRegistry::builtin(),
            factory,
            WalletStorage::in_memory(),
            ApiCredential::new("pk_test"),
            initial,
            Duration::from_secs(10),
        )
        .unwrap()
    }

    struct EmailOnly;

    #[async_trait]
    impl AuthSdk for EmailOnly {
        async fn login_with_email_otp(&self, _email: &str) -> Result<SecretString, ProviderError> {
            Ok(SecretString::from("did:email"))
        }

        async fn login_with_redirect(&self, _request: &RedirectRequest) -> Result<(), ProviderError> {
            Err(ProviderError::Unsupported("redirect".into()))
        }

        async fn login_with_popup(&self, _provider: SocialProvider) -> Result<SecretString, ProviderError> {
            Err(ProviderError::Unsupported("popup".into()))
        }

        async fn redirect_result(&self) -> Result<Option<SecretString>, ProviderError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn sync_resolves_and_fills_balances() {
        let factory = MockFactory::new();
        factory.client(ChainId::Solana).with_native(2_000_000_000);
        factory.client(ChainId::Bitcoin).logged_out();
        let ctx = context(factory, NetworkId::SolanaMainnet);
        assert_eq!(ctx.startup(), 5);

        ctx.sync().await;

        let primary = ctx.primary_balance().unwrap();
        assert_eq!(primary.symbol, "SOL");
        assert_eq!(primary.amount, "2");
        assert_eq!(ctx.address(ChainId::Solana).as_deref(), Some("solana-wallet"));
        assert_eq!(ctx.address(ChainId::Bitcoin), None);
        let btc = ctx
            .asset_list()
            .into_iter()
            .find(|b| b.chain == ChainId::Bitcoin)
            .unwrap();
        assert_eq!(btc.fetch_state, FetchState::Idle);
    }

    #[tokio::test]
    async fn switching_to_current_network_does_not_refetch() {
        let factory = MockFactory::new();
        let ctx = context(factory.clone(), NetworkId::EthereumMainnet);
        ctx.startup();
        ctx.sync().await;
        let eth = factory.client(ChainId::Ethereum);
        let before = eth.balance_queries();

        assert_eq!(ctx.switch_network(NetworkId::EthereumMainnet).await.unwrap(), None);
        assert_eq!(ctx.switch_network(NetworkId::EthereumMainnet).await.unwrap(), None);

        assert_eq!(eth.balance_queries(), before);
    }

    #[tokio::test]
    async fn unknown_network_leaves_selection_alone() {
        let factory = MockFactory::new();
        let ctx = AppContext::new(
            ChainRegistry::with_networks(&[NetworkId::SolanaMainnet, NetworkId::EthereumMainnet]),
            factory,
            WalletStorage::in_memory(),
            ApiCredential::new("pk_test"),
            NetworkId::SolanaMainnet,
            Duration::from_secs(10),
        )
        .unwrap();
        ctx.startup();

        assert!(matches!(
            ctx.switch_network(NetworkId::BitcoinTestnet).await,
            Err(WalletError::UnknownChain(_))
        ));
        assert!(ctx.select_asset_row("Bitcoin").await.is_err());
        assert_eq!(ctx.active_network(), NetworkId::SolanaMainnet);
    }

    #[tokio::test]
    async fn asset_row_switches_to_mainnet_and_refreshes() {
        let factory = MockFactory::new();
        factory.client(ChainId::Polygon).with_native(12_345 * 10u128.pow(18));
        let ctx = context(factory.clone(), NetworkId::SolanaMainnet);
        ctx.startup();
        ctx.sessions().resolve_all().await;

        assert_eq!(ctx.select_asset_row("Polygon").await.unwrap(), NetworkId::PolygonMainnet);

        let primary = ctx.primary_balance().unwrap();
        assert_eq!(primary.symbol, "MATIC");
        assert_eq!(primary.display_amount(), "12,345.00");
        assert_eq!(factory.client(ChainId::Polygon).native_queries(), 1);
    }

    #[tokio::test]
    async fn send_uses_active_network() {
        let factory = MockFactory::new();
        let ctx = context(factory.clone(), NetworkId::BaseMainnet);
        ctx.startup();
        ctx.sync().await;

        let receipt = ctx
            .send_transaction(&TransferRequest {
                to: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".into(),
                amount: "0.001".into(),
            })
            .await
            .unwrap();

        assert_eq!(receipt.network, NetworkId::BaseMainnet);
        assert_eq!(receipt.explorer_url, "https://basescan.org/tx/base-tx");
        assert_eq!(factory.client(ChainId::Base).sends(), 1);
    }

    #[tokio::test]
    async fn reveal_goes_to_active_chain() {
        let ctx = context(MockFactory::new(), NetworkId::BitcoinMainnet);
        ctx.startup();
        let key = ctx.reveal_private_key().await.unwrap();
        assert_eq!(key.expose_secret(), "bitcoin-private-key");
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let factory = MockFactory::new();
        let ctx = context(factory.clone(), NetworkId::SolanaMainnet);
        ctx.storage().durable().set(keys::TOKEN, "did").unwrap();
        ctx.startup();
        ctx.sync().await;

        ctx.logout().await.unwrap();
        ctx.logout().await.unwrap();

        assert_eq!(factory.client(ChainId::Solana).logouts(), 1);
        assert!(ctx.sessions().chains().is_empty());
        assert_eq!(ctx.storage().durable().get(keys::TOKEN).unwrap(), None);
        assert!(ctx.asset_list().iter().all(|b| b.fetch_state == FetchState::Idle));
        assert!(matches!(
            ctx.reveal_private_key().await,
            Err(WalletError::NotAuthenticated)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn logout_while_syncing_forgets_the_address() {
        let factory = MockFactory::new();
        factory.client(ChainId::Solana).with_delay(Duration::from_secs(2));
        let ctx = context(factory, NetworkId::SolanaMainnet);
        ctx.startup();

        let (_, logout) = tokio::join!(ctx.sync(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            ctx.logout().await
        });
        logout.unwrap();

        assert_eq!(ctx.storage().durable().get(keys::USER).unwrap(), None);
        assert_eq!(ctx.address(ChainId::Solana), None);
    }

    #[tokio::test]
    async fn login_rebuilds_sessions() {
        let factory = MockFactory::new();
        let ctx = context(factory.clone(), NetworkId::SolanaMainnet).with_auth(Arc::new(EmailOnly), "http://localhost:3000");
        ctx.startup();

        ctx.login_with_email("ada@example.com").await.unwrap();

        assert_eq!(factory.resets(), 2);
        assert_eq!(ctx.storage().durable().get(keys::LOGIN_TYPE).unwrap().as_deref(), Some("EMAIL"));
        let persisted: BTreeMap<_, _> = ctx.storage().persisted_addresses().unwrap();
        assert_eq!(persisted.len(), 5);
        assert!(ctx.begin_social_login(SocialProvider::Google).await.is_err());
    }

    #[tokio::test]
    async fn login_without_auth_is_a_config_error() {
        let ctx = context(MockFactory::new(), NetworkId::SolanaMainnet);
        assert!(matches!(
            ctx.login_with_email("ada@example.com").await,
            Err(WalletError::Config(_))
        ));
    }
}
