//! EVM networks the wallet can switch between. All use 18-decimal natives.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvmChain {
    /// EIP-155 chain ID, signed into every transaction.
    pub chain_id: u64,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    /// Public JSON-RPC endpoint. Rate limited; override for production use.
    pub rpc_url: &'static str,
    pub explorer_url: &'static str,
    pub is_testnet: bool,
}

impl EvmChain {
    const fn new(
        chain_id: u64,
        name: &'static str,
        symbol: &'static str,
        rpc_url: &'static str,
        explorer_url: &'static str,
        is_testnet: bool,
    ) -> Self {
        Self {
            chain_id,
            name,
            symbol,
            decimals: 18,
            rpc_url,
            explorer_url,
            is_testnet,
        }
    }

    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{hash}", self.explorer_url)
    }

    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{address}", self.explorer_url)
    }
}

pub const ETHEREUM: EvmChain = EvmChain::new(
    1,
    "Ethereum",
    "ETH",
    "https://eth.llamarpc.com",
    "https://etherscan.io",
    false,
);

pub const SEPOLIA: EvmChain = EvmChain::new(
    11_155_111,
    "Sepolia",
    "ETH",
    "https://rpc.sepolia.org",
    "https://sepolia.etherscan.io",
    true,
);

pub const POLYGON: EvmChain = EvmChain::new(
    137,
    "Polygon",
    "MATIC",
    "https://polygon-rpc.com",
    "https://polygonscan.com",
    false,
);

pub const POLYGON_AMOY: EvmChain = EvmChain::new(
    80_002,
    "Polygon Amoy",
    "MATIC",
    "https://rpc-amoy.polygon.technology",
    "https://amoy.polygonscan.com",
    true,
);

pub const BASE: EvmChain = EvmChain::new(
    8453,
    "Base",
    "ETH",
    "https://mainnet.base.org",
    "https://basescan.org",
    false,
);

pub const ALL: [EvmChain; 5] = [ETHEREUM, SEPOLIA, POLYGON, POLYGON_AMOY, BASE];

pub fn by_chain_id(chain_id: u64) -> Option<&'static EvmChain> {
    ALL.iter().find(|c| c.chain_id == chain_id)
}
