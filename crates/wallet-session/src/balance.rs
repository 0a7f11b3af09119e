//! Per-asset balance slots, refreshed per chain.
//!
//! Every tracked asset owns one slot. A refresh stamps the slots it is about
//! to fill with a fresh generation; a result is written back only if the slot
//! still carries that generation, so anything invalidated or re-requested in
//! the meantime discards the late answer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::amount::{format_for_display, to_decimal_string, DisplayRule};
use crate::error::ProviderError;
use crate::registry::{AssetKind, ChainRegistry, TrackedAsset};
use crate::selector::{NetworkSelector, NetworkSwitch};
use crate::session::SessionSet;
use crate::types::{ChainId, NetworkId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchState {
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetBalance {
    pub chain: ChainId,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub display_rule: DisplayRule,
    pub native: bool,
    /// Exact decimal amount. `"0"` while idle and after a failed fetch.
    pub amount: String,
    pub raw: u128,
    pub fetch_state: FetchState,
    /// Network the amount was read from.
    pub network: Option<NetworkId>,
    pub error: Option<String>,
    #[serde(skip)]
    generation: u64,
}

impl AssetBalance {
    fn idle(asset: &TrackedAsset) -> Self {
        Self {
            chain: asset.chain,
            symbol: asset.symbol.clone(),
            name: asset.name.clone(),
            decimals: asset.decimals,
            display_rule: asset.display_rule,
            native: asset.kind == AssetKind::Native,
            amount: "0".into(),
            raw: 0,
            fetch_state: FetchState::Idle,
            network: None,
            error: None,
            generation: 0,
        }
    }

    fn clear(&mut self, generation: u64) {
        self.amount = "0".into();
        self.raw = 0;
        self.fetch_state = FetchState::Idle;
        self.network = None;
        self.error = None;
        self.generation = generation;
    }

    /// Amount rounded for display.
    pub fn display_amount(&self) -> String {
        format_for_display(self.raw, self.decimals, self.display_rule)
    }
}

pub struct BalanceAggregator {
    registry: Arc<ChainRegistry>,
    sessions: Arc<SessionSet>,
    selector: Arc<NetworkSelector>,
    slots: RwLock<Vec<AssetBalance>>,
    generation: AtomicU64,
}

impl BalanceAggregator {
    pub fn new(
        registry: Arc<ChainRegistry>,
        sessions: Arc<SessionSet>,
        selector: Arc<NetworkSelector>,
    ) -> Self {
        let slots = registry.assets().iter().map(AssetBalance::idle).collect();
        Self {
            registry,
            sessions,
            selector,
            slots: RwLock::new(slots),
            generation: AtomicU64::new(0),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Every slot back to Idle; in-flight results are discarded.
    pub fn reset(&self) {
        let generation = self.next_generation();
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        for slot in slots.iter_mut() {
            slot.clear(generation);
        }
    }

    /// `chain`'s slots back to Idle; in-flight results for them are discarded.
    pub fn invalidate(&self, chain: ChainId) {
        let generation = self.next_generation();
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        for slot in slots.iter_mut().filter(|s| s.chain == chain) {
            slot.clear(generation);
        }
    }

    /// Network `chain`'s balances are read from: the active network when
    /// `chain` is active, otherwise the network its session was created for.
    fn target_network(&self, chain: ChainId, session_network: NetworkId) -> NetworkId {
        let active = self.selector.current();
        if active.chain() == chain {
            active
        } else {
            session_network
        }
    }

    /// Mark `chain`'s slots Loading and hand back (slot index, generation,
    /// asset) for each.
    fn begin(&self, chain: ChainId) -> Vec<(usize, u64, TrackedAsset)> {
        let generation = self.next_generation();
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let mut started = Vec::new();
        for (index, slot) in slots.iter_mut().enumerate().filter(|(_, s)| s.chain == chain) {
            slot.fetch_state = FetchState::Loading;
            slot.error = None;
            slot.generation = generation;
            if let Some(asset) = self.registry.assets().get(index) {
                started.push((index, generation, asset.clone()));
            }
        }
        started
    }

    fn settle(
        &self,
        index: usize,
        generation: u64,
        network: NetworkId,
        result: Result<u128, ProviderError>,
    ) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = slots.get_mut(index) else {
            return;
        };
        if slot.generation != generation {
            debug!(chain = %slot.chain, symbol = %slot.symbol, "discarding stale balance");
            return;
        }

        slot.network = Some(network);
        match result {
            Ok(raw) => {
                slot.raw = raw;
                slot.amount = to_decimal_string(raw, slot.decimals);
                slot.fetch_state = FetchState::Ready;
                slot.error = None;
            }
            Err(e) => {
                warn!(chain = %slot.chain, symbol = %slot.symbol, %network, error = %e, "balance fetch failed");
                slot.raw = 0;
                slot.amount = "0".into();
                slot.fetch_state = FetchState::Error;
                slot.error = Some(e.to_string());
            }
        }
    }

    /// Fetch every tracked asset of `chain` concurrently. Does nothing until
    /// the chain's address has resolved.
    pub async fn refresh_one(&self, chain: ChainId) {
        let Some(session) = self.sessions.get(chain) else {
            return;
        };
        let Some(address) = session.resolved_address().map(str::to_owned) else {
            debug!(%chain, "no resolved address, skipping balance refresh");
            return;
        };

        let network_id = self.target_network(chain, session.network());
        let network = match self.registry.resolve(network_id) {
            Ok(network) => network,
            Err(e) => {
                warn!(%chain, network = %network_id, error = %e, "balance network not registered");
                return;
            }
        };

        let client = session.client();
        let fetches = self.begin(chain).into_iter().map(|(index, generation, asset)| {
            let address = address.as_str();
            async move {
                let result = match &asset.kind {
                    AssetKind::Native => client.native_balance(network, address).await,
                    AssetKind::SplToken { .. } => client.token_balance(network, address, &asset).await,
                };
                self.settle(index, generation, network_id, result);
            }
        });
        join_all(fetches).await;
    }

    /// Refresh every chain with a resolved address, concurrently.
    pub async fn refresh_all(&self) {
        let chains: Vec<ChainId> = self
            .sessions
            .all()
            .iter()
            .filter(|s| s.resolved_address().is_some())
            .map(|s| s.chain())
            .collect();
        join_all(chains.into_iter().map(|chain| self.refresh_one(chain))).await;
    }

    /// React to an active-network change: a change of address scheme clears
    /// the new chain's slots first, then the new chain is refreshed once.
    pub async fn on_network_switched(&self, switch: NetworkSwitch) {
        let chain = switch.current.chain();
        if switch.changes_family() {
            self.invalidate(chain);
        }
        self.refresh_one(chain).await;
    }

    /// Every slot in registry order.
    pub fn balances(&self) -> Vec<AssetBalance> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn balance(&self, chain: ChainId, symbol: &str) -> Option<AssetBalance> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.chain == chain && s.symbol == symbol)
            .cloned()
    }

    /// Native balance of the active chain.
    pub fn primary_balance(&self) -> Option<AssetBalance> {
        let chain = self.selector.current().chain();
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.chain == chain && s.native)
            .cloned()
    }
}
