//! Static table of supported networks and tracked assets.
//!
//! Built once at startup from the built-in table plus configuration
//! overrides, then shared read-only behind an `Arc`.

use std::collections::BTreeMap;

use chain_btc::network::BtcNetwork;
use chain_eth::EvmChain;
use serde::Serialize;
use tracing::debug;

use crate::amount::DisplayRule;
use crate::error::WalletError;
use crate::explorer::{self, ExplorerKind};
use crate::types::{ChainFamily, ChainId, NetworkId};

/// Mint of the MAGAL SPL token tracked alongside SOL.
pub const MAGAL_MINT: &str = "A2ZbCHUEiHgSwFJ9EqgdYrFF255RQpAZP2xEC62fpump";

pub const SOLANA_MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";
pub const SOLANA_DEVNET_RPC: &str = "https://api.devnet.solana.com";

#[derive(Debug, Clone, Serialize)]
pub struct NetworkConfig {
    pub id: NetworkId,
    pub chain: ChainId,
    pub display_name: String,
    /// JSON-RPC endpoint, or the Esplora base URL for Bitcoin
    pub rpc_url: String,
    pub explorer_tx_template: String,
    pub explorer_address_template: String,
    pub native_symbol: String,
    pub native_decimals: u8,
    pub display_rule: DisplayRule,
    pub evm_chain_id: Option<u64>,
    pub is_testnet: bool,
}

impl NetworkConfig {
    pub fn family(&self) -> ChainFamily {
        self.chain.family()
    }

    /// Bitcoin network used for address validation; mainnet for
    /// non-Bitcoin configs.
    pub fn btc_network(&self) -> BtcNetwork {
        if self.id == NetworkId::BitcoinTestnet {
            BtcNetwork::Testnet
        } else {
            BtcNetwork::Mainnet
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AssetKind {
    Native,
    SplToken { mint: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackedAsset {
    pub chain: ChainId,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub display_rule: DisplayRule,
    pub kind: AssetKind,
}

fn solana_network(
    id: NetworkId,
    display_name: &str,
    rpc_url: &str,
    tx_template: &str,
    address_template: &str,
) -> NetworkConfig {
    NetworkConfig {
        id,
        chain: ChainId::Solana,
        display_name: display_name.into(),
        rpc_url: rpc_url.into(),
        explorer_tx_template: tx_template.into(),
        explorer_address_template: address_template.into(),
        native_symbol: "SOL".into(),
        native_decimals: 9,
        display_rule: DisplayRule::Fixed(6),
        evm_chain_id: None,
        is_testnet: id.is_testnet(),
    }
}

fn evm_network(id: NetworkId, display_name: &str, chain: &EvmChain, rule: DisplayRule) -> NetworkConfig {
    NetworkConfig {
        id,
        chain: id.chain(),
        display_name: display_name.into(),
        rpc_url: chain.rpc_url.into(),
        explorer_tx_template: chain.tx_url(explorer::PLACEHOLDER),
        explorer_address_template: chain.address_url(explorer::PLACEHOLDER),
        native_symbol: chain.symbol.into(),
        native_decimals: chain.decimals,
        display_rule: rule,
        evm_chain_id: Some(chain.chain_id),
        is_testnet: chain.is_testnet,
    }
}

fn bitcoin_network(id: NetworkId, display_name: &str, network: BtcNetwork, path: &str) -> NetworkConfig {
    let base = "https://www.blockchain.com/explorer";
    NetworkConfig {
        id,
        chain: ChainId::Bitcoin,
        display_name: display_name.into(),
        rpc_url: network.default_esplora_url().into(),
        explorer_tx_template: format!("{base}/transactions/{path}/{}", explorer::PLACEHOLDER),
        explorer_address_template: format!("{base}/addresses/{path}/{}", explorer::PLACEHOLDER),
        native_symbol: "BTC".into(),
        native_decimals: 8,
        display_rule: DisplayRule::Fixed(8),
        evm_chain_id: None,
        is_testnet: network != BtcNetwork::Mainnet,
    }
}

fn builtin_network(id: NetworkId) -> NetworkConfig {
    use chain_eth::chains::{BASE, ETHEREUM, POLYGON, POLYGON_AMOY, SEPOLIA};

    match id {
        NetworkId::SolanaMainnet => solana_network(
            id,
            "Solana (Mainnet)",
            SOLANA_MAINNET_RPC,
            "https://solscan.io/tx/{value}",
            "https://solscan.io/account/{value}",
        ),
        NetworkId::SolanaDevnet => solana_network(
            id,
            "Solana (Devnet)",
            SOLANA_DEVNET_RPC,
            "https://explorer.solana.com/tx/{value}?cluster=devnet",
            "https://explorer.solana.com/address/{value}?cluster=devnet",
        ),
        NetworkId::EthereumMainnet => evm_network(id, "Ethereum (Mainnet)", &ETHEREUM, DisplayRule::EtherLike),
        NetworkId::EthereumSepolia => evm_network(id, "Ethereum (Sepolia)", &SEPOLIA, DisplayRule::EtherLike),
        NetworkId::PolygonMainnet => evm_network(id, "Polygon (Mainnet)", &POLYGON, DisplayRule::Tiered),
        NetworkId::PolygonAmoy => evm_network(id, "Polygon (Amoy)", &POLYGON_AMOY, DisplayRule::Tiered),
        NetworkId::BaseMainnet => evm_network(id, "Base (Mainnet)", &BASE, DisplayRule::EtherLike),
        NetworkId::BitcoinMainnet => {
            bitcoin_network(id, "Bitcoin (Mainnet)", BtcNetwork::Mainnet, "btc")
        }
        NetworkId::BitcoinTestnet => {
            bitcoin_network(id, "Bitcoin (Testnet)", BtcNetwork::Testnet, "btc-testnet")
        }
    }
}

/// Supported networks, tracked assets and the network each chain's session
/// is scoped to.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    networks: Vec<NetworkConfig>,
    session_networks: BTreeMap<ChainId, NetworkId>,
    assets: Vec<TrackedAsset>,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ChainRegistry {
    /// Every supported network with its public endpoint.
    pub fn builtin() -> Self {
        Self::with_networks(&NetworkId::ALL)
    }

    /// A registry restricted to `ids`. Chains with no listed network get no
    /// session and no balance slots.
    pub fn with_networks(ids: &[NetworkId]) -> Self {
        let networks: Vec<NetworkConfig> = NetworkId::ALL
            .into_iter()
            .filter(|id| ids.contains(id))
            .map(builtin_network)
            .collect();

        let mut assets = Vec::new();
        for chain in ChainId::ALL {
            let Some(native) = networks.iter().find(|n| n.chain == chain) else {
                continue;
            };
            assets.push(TrackedAsset {
                chain,
                symbol: native.native_symbol.clone(),
                name: chain.display_name().to_string(),
                decimals: native.native_decimals,
                display_rule: native.display_rule,
                kind: AssetKind::Native,
            });
            if chain == ChainId::Solana {
                assets.push(TrackedAsset {
                    chain,
                    symbol: "MAGAL".into(),
                    name: "Magal".into(),
                    decimals: 9,
                    display_rule: DisplayRule::Tiered,
                    kind: AssetKind::SplToken {
                        mint: MAGAL_MINT.into(),
                    },
                });
            }
        }

        Self {
            networks,
            session_networks: BTreeMap::new(),
            assets,
        }
    }

    /// Point a network at a different RPC (or Esplora) endpoint.
    pub fn set_rpc_url(&mut self, id: NetworkId, url: impl Into<String>) -> Result<(), WalletError> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(WalletError::Config(format!("{id}: rpc url {url:?} is not http(s)")));
        }
        let network = self
            .networks
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| WalletError::Config(format!("{id} is not registered")))?;
        network.rpc_url = url;
        Ok(())
    }

    /// Scope `chain`'s session to `id` instead of the chain's mainnet.
    pub fn set_session_network(&mut self, chain: ChainId, id: NetworkId) -> Result<(), WalletError> {
        if id.chain() != chain {
            return Err(WalletError::Config(format!("{id} does not belong to {chain}")));
        }
        if !self.contains(id) {
            return Err(WalletError::Config(format!("{id} is not registered")));
        }
        self.session_networks.insert(chain, id);
        Ok(())
    }

    pub fn resolve(&self, id: NetworkId) -> Result<&NetworkConfig, WalletError> {
        self.networks
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| WalletError::UnknownChain(id.to_string()))
    }

    pub fn contains(&self, id: NetworkId) -> bool {
        self.networks.iter().any(|n| n.id == id)
    }

    pub fn networks(&self) -> &[NetworkConfig] {
        &self.networks
    }

    /// Chains with at least one registered network, in registry order.
    pub fn chains(&self) -> Vec<ChainId> {
        ChainId::ALL
            .into_iter()
            .filter(|c| self.networks.iter().any(|n| n.chain == *c))
            .collect()
    }

    pub fn networks_for(&self, chain: ChainId) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.iter().filter(move |n| n.chain == chain)
    }

    /// Network a chain's session is scoped to: the configured one, else the
    /// first mainnet, else whatever is registered.
    pub fn default_network(&self, chain: ChainId) -> Option<NetworkId> {
        if let Some(id) = self.session_networks.get(&chain) {
            return Some(*id);
        }
        self.networks_for(chain)
            .find(|n| !n.is_testnet)
            .or_else(|| self.networks_for(chain).next())
            .map(|n| n.id)
    }

    pub fn assets(&self) -> &[TrackedAsset] {
        &self.assets
    }

    pub fn assets_for(&self, chain: ChainId) -> impl Iterator<Item = &TrackedAsset> {
        self.assets.iter().filter(move |a| a.chain == chain)
    }

    /// Syntactic address check for `id`'s chain. Never touches the network.
    pub fn validate_address(&self, id: NetworkId, candidate: &str) -> Result<bool, WalletError> {
        let network = self.resolve(id)?;
        let valid = match network.family() {
            ChainFamily::Solana => chain_sol::is_valid_wallet_address(candidate),
            ChainFamily::Evm => {
                let valid = chain_eth::is_hex_address(candidate);
                if valid && !chain_eth::is_valid_address(candidate) {
                    debug!(network = %id, address = candidate, "mixed-case address fails EIP-55 checksum");
                }
                valid
            }
            ChainFamily::Bitcoin => {
                chain_btc::address::is_valid_address(candidate, network.btc_network())
            }
        };
        Ok(valid)
    }

    /// Network to switch to when a row of the aggregated asset list is
    /// picked. Rows name their chain; unknown names land on Solana mainnet.
    pub fn network_for_asset_row(&self, chain_name: &str) -> NetworkId {
        let Ok(chain) = chain_name.parse::<ChainId>() else {
            return NetworkId::SolanaMainnet;
        };
        NetworkId::ALL
            .into_iter()
            .find(|id| id.chain() == chain && !id.is_testnet())
            .unwrap_or(NetworkId::SolanaMainnet)
    }

    pub fn explorer_url(&self, id: NetworkId, kind: ExplorerKind, value: &str) -> Result<String, WalletError> {
        let network = self.resolve(id)?;
        let template = match kind {
            ExplorerKind::Tx => &network.explorer_tx_template,
            ExplorerKind::Address => &network.explorer_address_template,
        };
        Ok(explorer::render(template, value))
    }

    /// Like [`Self::explorer_url`], guessing the kind from the value's shape.
    pub fn explorer_url_auto(&self, id: NetworkId, value: &str) -> Result<String, WalletError> {
        let kind = explorer::classify(id.chain().family(), value);
        self.explorer_url(id, kind, value)
    }
}
