use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Supported blockchains. Each one gets its own session and balance slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainId {
    Solana,
    Ethereum,
    Polygon,
    Base,
    Bitcoin,
}

impl ChainId {
    pub const ALL: [ChainId; 5] = [
        ChainId::Solana,
        ChainId::Ethereum,
        ChainId::Polygon,
        ChainId::Base,
        ChainId::Bitcoin,
    ];

    /// Address and signing scheme this chain belongs to
    pub fn family(&self) -> ChainFamily {
        match self {
            ChainId::Solana => ChainFamily::Solana,
            ChainId::Ethereum | ChainId::Polygon | ChainId::Base => ChainFamily::Evm,
            ChainId::Bitcoin => ChainFamily::Bitcoin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Solana => "solana",
            ChainId::Ethereum => "ethereum",
            ChainId::Polygon => "polygon",
            ChainId::Base => "base",
            ChainId::Bitcoin => "bitcoin",
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ChainId::Solana => "Solana",
            ChainId::Ethereum => "Ethereum",
            ChainId::Polygon => "Polygon",
            ChainId::Base => "Base",
            ChainId::Bitcoin => "Bitcoin",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChainId::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| WalletError::UnknownChain(s.to_string()))
    }
}

/// Chains grouped by address format and signing scheme. EVM chains share
/// one SDK connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainFamily {
    Solana,
    #[serde(rename = "ethereum-like", alias = "evm")]
    Evm,
    Bitcoin,
}

impl ChainFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Solana => "solana",
            ChainFamily::Evm => "ethereum-like",
            ChainFamily::Bitcoin => "bitcoin",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selectable network variants (mainnet/testnet per chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkId {
    SolanaMainnet,
    SolanaDevnet,
    EthereumMainnet,
    EthereumSepolia,
    PolygonMainnet,
    PolygonAmoy,
    BaseMainnet,
    BitcoinMainnet,
    BitcoinTestnet,
}

impl NetworkId {
    pub const ALL: [NetworkId; 9] = [
        NetworkId::SolanaMainnet,
        NetworkId::SolanaDevnet,
        NetworkId::EthereumMainnet,
        NetworkId::EthereumSepolia,
        NetworkId::PolygonMainnet,
        NetworkId::PolygonAmoy,
        NetworkId::BaseMainnet,
        NetworkId::BitcoinMainnet,
        NetworkId::BitcoinTestnet,
    ];

    pub fn chain(&self) -> ChainId {
        match self {
            NetworkId::SolanaMainnet | NetworkId::SolanaDevnet => ChainId::Solana,
            NetworkId::EthereumMainnet | NetworkId::EthereumSepolia => ChainId::Ethereum,
            NetworkId::PolygonMainnet | NetworkId::PolygonAmoy => ChainId::Polygon,
            NetworkId::BaseMainnet => ChainId::Base,
            NetworkId::BitcoinMainnet | NetworkId::BitcoinTestnet => ChainId::Bitcoin,
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(
            self,
            NetworkId::SolanaDevnet
                | NetworkId::EthereumSepolia
                | NetworkId::PolygonAmoy
                | NetworkId::BitcoinTestnet
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::SolanaMainnet => "solana-mainnet",
            NetworkId::SolanaDevnet => "solana-devnet",
            NetworkId::EthereumMainnet => "ethereum-mainnet",
            NetworkId::EthereumSepolia => "ethereum-sepolia",
            NetworkId::PolygonMainnet => "polygon-mainnet",
            NetworkId::PolygonAmoy => "polygon-amoy",
            NetworkId::BaseMainnet => "base-mainnet",
            NetworkId::BitcoinMainnet => "bitcoin-mainnet",
            NetworkId::BitcoinTestnet => "bitcoin-testnet",
        }
    }

    /// Suffix used for per-network environment overrides, e.g.
    /// `RPC_URL_SOLANA_MAINNET`.
    pub fn env_suffix(&self) -> String {
        self.as_str().replace('-', "_").to_ascii_uppercase()
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetworkId::ALL
            .into_iter()
            .find(|n| n.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| WalletError::UnknownChain(s.to_string()))
    }
}
