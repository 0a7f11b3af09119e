//! Scriptable chain clients for unit tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::config::ApiCredential;
use crate::error::ProviderError;
use crate::provider::{ChainClient, ClientFactory};
use crate::registry::{NetworkConfig, TrackedAsset};
use crate::types::{ChainId, NetworkId};

pub struct MockClient {
    chain: ChainId,
    logged_in: AtomicBool,
    address: Mutex<Result<String, ProviderError>>,
    native: Mutex<Result<u128, ProviderError>>,
    token: Mutex<Result<u128, ProviderError>>,
    send: Mutex<Result<String, ProviderError>>,
    delay: Mutex<Duration>,
    native_on: Mutex<BTreeMap<NetworkId, u128>>,
    delay_on: Mutex<BTreeMap<NetworkId, Duration>>,
    networks_queried: Mutex<Vec<NetworkId>>,
    address_queries: AtomicUsize,
    auth_checks: AtomicUsize,
    native_queries: AtomicUsize,
    token_queries: AtomicUsize,
    sends: AtomicUsize,
    logouts: AtomicUsize,
}

impl MockClient {
    pub fn new(chain: ChainId) -> Arc<Self> {
        Arc::new(Self {
            chain,
            logged_in: AtomicBool::new(true),
            address: Mutex::new(Ok(format!("{chain}-wallet"))),
            native: Mutex::new(Ok(0)),
            token: Mutex::new(Ok(0)),
            send: Mutex::new(Ok(format!("{chain}-tx"))),
            delay: Mutex::new(Duration::ZERO),
            native_on: Mutex::new(BTreeMap::new()),
            delay_on: Mutex::new(BTreeMap::new()),
            networks_queried: Mutex::new(Vec::new()),
            address_queries: AtomicUsize::new(0),
            auth_checks: AtomicUsize::new(0),
            native_queries: AtomicUsize::new(0),
            token_queries: AtomicUsize::new(0),
            sends: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
        })
    }

    pub fn with_address(self: Arc<Self>, address: &str) -> Arc<Self> {
        *self.address.lock().unwrap() = Ok(address.to_string());
        self
    }

    pub fn failing_address(self: Arc<Self>, message: &str) -> Arc<Self> {
        *self.address.lock().unwrap() = Err(ProviderError::Transport(message.to_string()));
        self
    }

    pub fn logged_out(self: Arc<Self>) -> Arc<Self> {
        self.logged_in.store(false, Ordering::SeqCst);
        self
    }

    pub fn with_native(self: Arc<Self>, amount: u128) -> Arc<Self> {
        *self.native.lock().unwrap() = Ok(amount);
        self
    }

    pub fn failing_native(self: Arc<Self>, message: &str) -> Arc<Self> {
        *self.native.lock().unwrap() = Err(ProviderError::Rpc(message.to_string()));
        self
    }

    pub fn with_token(self: Arc<Self>, amount: u128) -> Arc<Self> {
        *self.token.lock().unwrap() = Ok(amount);
        self
    }

    pub fn failing_token(self: Arc<Self>, message: &str) -> Arc<Self> {
        *self.token.lock().unwrap() = Err(ProviderError::Rpc(message.to_string()));
        self
    }

    pub fn with_send_result(self: Arc<Self>, result: Result<String, ProviderError>) -> Arc<Self> {
        *self.send.lock().unwrap() = result;
        self
    }

    /// Every call sleeps this long first.
    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.delay.lock().unwrap() = delay;
        self
    }

    /// Native balance reported when queried on `network`.
    pub fn with_native_on(self: Arc<Self>, network: NetworkId, amount: u128) -> Arc<Self> {
        self.native_on.lock().unwrap().insert(network, amount);
        self
    }

    /// Balance queries on `network` sleep this long instead.
    pub fn with_delay_on(self: Arc<Self>, network: NetworkId, delay: Duration) -> Arc<Self> {
        self.delay_on.lock().unwrap().insert(network, delay);
        self
    }

    pub fn address_queries(&self) -> usize {
        self.address_queries.load(Ordering::SeqCst)
    }

    pub fn auth_checks(&self) -> usize {
        self.auth_checks.load(Ordering::SeqCst)
    }

    pub fn native_queries(&self) -> usize {
        self.native_queries.load(Ordering::SeqCst)
    }

    pub fn token_queries(&self) -> usize {
        self.token_queries.load(Ordering::SeqCst)
    }

    pub fn balance_queries(&self) -> usize {
        self.native_queries() + self.token_queries()
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    pub fn networks_queried(&self) -> Vec<NetworkId> {
        self.networks_queried.lock().unwrap().clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn pause_on(&self, network: NetworkId) {
        let delay = self.delay_on.lock().unwrap().get(&network).copied();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => self.pause().await,
        }
    }
}

#[async_trait]
impl ChainClient for MockClient {
    fn chain(&self) -> ChainId {
        self.chain
    }

    async fn is_authenticated(&self) -> Result<bool, ProviderError> {
        self.auth_checks.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.logged_in.load(Ordering::SeqCst))
    }

    async fn resolve_address(&self) -> Result<String, ProviderError> {
        self.address_queries.fetch_add(1, Ordering::SeqCst);
        self.address.lock().unwrap().clone()
    }

    async fn native_balance(&self, network: &NetworkConfig, _address: &str) -> Result<u128, ProviderError> {
        self.native_queries.fetch_add(1, Ordering::SeqCst);
        self.networks_queried.lock().unwrap().push(network.id);
        self.pause_on(network.id).await;
        if let Some(amount) = self.native_on.lock().unwrap().get(&network.id) {
            return Ok(*amount);
        }
        self.native.lock().unwrap().clone()
    }

    async fn token_balance(
        &self,
        network: &NetworkConfig,
        _address: &str,
        _asset: &TrackedAsset,
    ) -> Result<u128, ProviderError> {
        self.token_queries.fetch_add(1, Ordering::SeqCst);
        self.networks_queried.lock().unwrap().push(network.id);
        self.pause_on(network.id).await;
        self.token.lock().unwrap().clone()
    }

    async fn send_native(
        &self,
        _network: &NetworkConfig,
        _from: &str,
        _to: &str,
        _amount: u128,
    ) -> Result<String, ProviderError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.send.lock().unwrap().clone()
    }

    async fn reveal_private_key(&self) -> Result<SecretString, ProviderError> {
        Ok(SecretString::from(format!("{}-private-key", self.chain)))
    }

    async fn logout(&self) -> Result<(), ProviderError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one [`MockClient`] per chain, created on first use.
#[derive(Default)]
pub struct MockFactory {
    clients: Mutex<BTreeMap<ChainId, Arc<MockClient>>>,
    failing: Mutex<BTreeSet<ChainId>>,
    resets: AtomicUsize,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn client(&self, chain: ChainId) -> Arc<MockClient> {
        self.clients
            .lock()
            .unwrap()
            .entry(chain)
            .or_insert_with(|| MockClient::new(chain))
            .clone()
    }

    pub fn fail_create(&self, chain: ChainId) {
        self.failing.lock().unwrap().insert(chain);
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ClientFactory for MockFactory {
    fn create(
        &self,
        chain: ChainId,
        _network: &NetworkConfig,
        _credential: &ApiCredential,
    ) -> Result<Arc<dyn ChainClient>, ProviderError> {
        if self.failing.lock().unwrap().contains(&chain) {
            return Err(ProviderError::Transport(format!("{chain}: connection refused")));
        }
        Ok(self.client(chain))
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}
