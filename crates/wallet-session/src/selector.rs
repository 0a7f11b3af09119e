use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::error::WalletError;
use crate::registry::{ChainRegistry, NetworkConfig};
use crate::types::NetworkId;

/// A completed change of the active network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSwitch {
    pub previous: NetworkId,
    pub current: NetworkId,
}

impl NetworkSwitch {
    /// Whether the address scheme changed (e.g. Solana to an EVM chain).
    pub fn changes_family(&self) -> bool {
        self.previous.chain().family() != self.current.chain().family()
    }

    pub fn changes_chain(&self) -> bool {
        self.previous.chain() != self.current.chain()
    }
}

/// Holds the single active network. Switching never touches chain sessions.
pub struct NetworkSelector {
    registry: Arc<ChainRegistry>,
    current: watch::Sender<NetworkId>,
}

impl NetworkSelector {
    pub fn new(registry: Arc<ChainRegistry>, initial: NetworkId) -> Result<Self, WalletError> {
        registry.resolve(initial)?;
        let (current, _) = watch::channel(initial);
        Ok(Self { registry, current })
    }

    pub fn current(&self) -> NetworkId {
        *self.current.borrow()
    }

    pub fn current_config(&self) -> Result<&NetworkConfig, WalletError> {
        self.registry.resolve(self.current())
    }

    /// Change notifications for UI observers.
    pub fn subscribe(&self) -> watch::Receiver<NetworkId> {
        self.current.subscribe()
    }

    /// Make `network` active. Unregistered networks are rejected and leave
    /// the selection unchanged; selecting the current network is a no-op and
    /// returns `None`.
    pub fn switch_to(&self, network: NetworkId) -> Result<Option<NetworkSwitch>, WalletError> {
        if !self.registry.contains(network) {
            error!(%network, "switch to unregistered network");
            return Err(WalletError::UnknownChain(network.to_string()));
        }

        let mut previous = None;
        self.current.send_if_modified(|current| {
            if *current == network {
                return false;
            }
            previous = Some(*current);
            *current = network;
            true
        });

        let switch = previous.map(|previous| NetworkSwitch {
            previous,
            current: network,
        });
        if let Some(switch) = &switch {
            info!(from = %switch.previous, to = %switch.current, "active network switched");
        }
        Ok(switch)
    }

    /// [`Self::switch_to`] for a network named by string.
    pub fn switch_to_name(&self, name: &str) -> Result<Option<NetworkSwitch>, WalletError> {
        let network = name.parse::<NetworkId>().map_err(|e| {
            error!(name, "switch to unknown network");
            e
        })?;
        self.switch_to(network)
    }
}
