//! One authenticated client per chain, each resolving its own address.
//!
//! Sessions are created together by [`SessionSet::initialize_all`] and
//! dropped together by [`SessionSet::invalidate_all`]. In between the map is
//! read-only; each session's address resolution runs at most once and every
//! caller observes the same outcome.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::ApiCredential;
use crate::error::{AddressResolutionError, WalletError};
use crate::provider::{ChainClient, ClientFactory};
use crate::registry::ChainRegistry;
use crate::storage::WalletStorage;
use crate::types::{ChainId, NetworkId};

pub type AddressResult = Result<String, AddressResolutionError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressState {
    Pending,
    Resolved(String),
    Failed(AddressResolutionError),
}

pub struct ChainSession {
    chain: ChainId,
    network: NetworkId,
    client: Arc<dyn ChainClient>,
    resolution: OnceCell<AddressResult>,
    provisional_address: Option<String>,
}

impl ChainSession {
    pub fn new(
        chain: ChainId,
        network: NetworkId,
        client: Arc<dyn ChainClient>,
        provisional_address: Option<String>,
    ) -> Self {
        Self {
            chain,
            network,
            client,
            resolution: OnceCell::new(),
            provisional_address,
        }
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Network this session was created for.
    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    pub fn state(&self) -> AddressState {
        match self.resolution.get() {
            None => AddressState::Pending,
            Some(Ok(address)) => AddressState::Resolved(address.clone()),
            Some(Err(e)) => AddressState::Failed(e.clone()),
        }
    }

    pub fn resolved_address(&self) -> Option<&str> {
        match self.resolution.get() {
            Some(Ok(address)) => Some(address),
            _ => None,
        }
    }

    /// Address to show right now: the resolved one, else the one remembered
    /// from the last run while resolution is still pending.
    pub fn display_address(&self) -> Option<&str> {
        match self.resolution.get() {
            Some(Ok(address)) => Some(address),
            Some(Err(_)) => None,
            None => self.provisional_address.as_deref(),
        }
    }
}

async fn query_address(client: &dyn ChainClient, timeout: Duration) -> AddressResult {
    let lookup = async {
        if !client.is_authenticated().await? {
            return Err(AddressResolutionError::NotAuthenticated);
        }
        Ok(client.resolve_address().await?)
    };

    tokio::time::timeout(timeout, lookup)
        .await
        .map_err(|_| AddressResolutionError::Timeout(timeout))?
}

pub struct SessionSet {
    registry: Arc<ChainRegistry>,
    factory: Arc<dyn ClientFactory>,
    storage: WalletStorage,
    resolve_timeout: Duration,
    sessions: RwLock<BTreeMap<ChainId, Arc<ChainSession>>>,
}

impl SessionSet {
    pub fn new(
        registry: Arc<ChainRegistry>,
        factory: Arc<dyn ClientFactory>,
        storage: WalletStorage,
        resolve_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            factory,
            storage,
            resolve_timeout,
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a session for every registered chain, replacing any existing
    /// ones. A chain whose client cannot be built is logged and skipped.
    /// Returns the number of sessions created.
    pub fn initialize_all(&self, credential: &ApiCredential) -> usize {
        self.factory.reset();

        let provisional = self.storage.persisted_addresses().unwrap_or_else(|e| {
            warn!(error = %e, "could not read persisted addresses");
            BTreeMap::new()
        });

        let mut sessions = BTreeMap::new();
        for chain in self.registry.chains() {
            let Some(network_id) = self.registry.default_network(chain) else {
                continue;
            };
            let network = match self.registry.resolve(network_id) {
                Ok(network) => network,
                Err(e) => {
                    warn!(%chain, error = %e, "no network for chain");
                    continue;
                }
            };
            match self.factory.create(chain, network, credential) {
                Ok(client) => {
                    let session = ChainSession::new(
                        chain,
                        network_id,
                        client,
                        provisional.get(&chain).cloned(),
                    );
                    sessions.insert(chain, Arc::new(session));
                }
                Err(e) => warn!(%chain, network = %network_id, error = %e, "chain session unavailable"),
            }
        }

        let created = sessions.len();
        *self.sessions.write().unwrap_or_else(PoisonError::into_inner) = sessions;
        info!(sessions = created, "chain sessions initialised");
        created
    }

    /// Re-create every session after re-authentication. Addresses
    /// remembered for the previous user are forgotten first.
    pub fn replace_all(&self, credential: &ApiCredential) -> usize {
        if let Err(e) = self.storage.forget_addresses() {
            warn!(error = %e, "could not clear persisted addresses");
        }
        self.initialize_all(credential)
    }

    fn is_live(&self, session: &Arc<ChainSession>) -> bool {
        self.get(session.chain)
            .is_some_and(|live| Arc::ptr_eq(&live, session))
    }

    /// Drop every session and the auth state persisted for them. Safe to
    /// call repeatedly.
    pub fn invalidate_all(&self) -> Result<(), WalletError> {
        let dropped = std::mem::take(&mut *self.sessions.write().unwrap_or_else(PoisonError::into_inner));
        if !dropped.is_empty() {
            info!(sessions = dropped.len(), "chain sessions invalidated");
        }
        self.storage.clear_auth()?;
        Ok(())
    }

    pub fn get(&self, chain: ChainId) -> Option<Arc<ChainSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chain)
            .cloned()
    }

    pub fn chains(&self) -> Vec<ChainId> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    pub fn all(&self) -> Vec<Arc<ChainSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn resolved_address(&self, chain: ChainId) -> Option<String> {
        self.get(chain)?.resolved_address().map(str::to_owned)
    }

    /// Resolve `chain`'s address. Concurrent callers share one lookup and
    /// the outcome is kept for the session's lifetime.
    pub async fn resolve_address(&self, chain: ChainId) -> AddressResult {
        let session = self
            .get(chain)
            .ok_or_else(|| AddressResolutionError::ProviderError(format!("no session for {chain}")))?;

        session
            .resolution
            .get_or_init(|| async {
                let outcome = query_address(session.client.as_ref(), self.resolve_timeout).await;
                match &outcome {
                    // A session replaced or dropped mid-lookup must not write
                    // its address into the next session's storage.
                    Ok(address) if !self.is_live(&session) => {
                        debug!(%chain, %address, "address resolved for a retired session");
                    }
                    Ok(address) => {
                        debug!(%chain, %address, "address resolved");
                        if let Err(e) = self.storage.persist_address(chain, address) {
                            warn!(%chain, error = %e, "could not persist address");
                        }
                    }
                    Err(e) => warn!(%chain, error = %e, "address resolution failed"),
                }
                outcome
            })
            .await
            .clone()
    }

    /// Resolve every session's address concurrently.
    pub async fn resolve_all(&self) -> Vec<(ChainId, AddressResult)> {
        let lookups = self.chains().into_iter().map(|chain| async move {
            (chain, self.resolve_address(chain).await)
        });
        join_all(lookups).await
    }
}
