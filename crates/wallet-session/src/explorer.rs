//! Block explorer links. Pure string templating over the per-network
//! templates; `{value}` is replaced by the hash, signature or address.

use serde::{Deserialize, Serialize};

use crate::types::ChainFamily;

pub const PLACEHOLDER: &str = "{value}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorerKind {
    Tx,
    Address,
}

/// Guess whether `value` is a transaction id or an address on a chain of
/// the given family.
///
/// On Solana, 88 base58 characters are a signature. Elsewhere 64 hex digits
/// (optionally `0x`-prefixed) are an EVM transaction hash or a Bitcoin txid.
/// Anything else is treated as an address.
pub fn classify(family: ChainFamily, value: &str) -> ExplorerKind {
    let is_tx = match family {
        ChainFamily::Solana => value.len() == 88 && bs58::decode(value).into_vec().is_ok(),
        ChainFamily::Evm | ChainFamily::Bitcoin => {
            let hex_body = value.strip_prefix("0x").unwrap_or(value);
            hex_body.len() == 64 && hex_body.bytes().all(|b| b.is_ascii_hexdigit())
        }
    };

    if is_tx {
        ExplorerKind::Tx
    } else {
        ExplorerKind::Address
    }
}

pub fn render(template: &str, value: &str) -> String {
    template.replace(PLACEHOLDER, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evm_hash_is_a_transaction() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(classify(ChainFamily::Evm, &hash), ExplorerKind::Tx);
        assert_eq!(classify(ChainFamily::Bitcoin, &"cd".repeat(32)), ExplorerKind::Tx);
    }

    #[test]
    fn solana_signature_is_a_transaction() {
        let signature = bs58::encode([0xffu8; 64]).into_string();
        assert_eq!(signature.len(), 88);
        assert_eq!(classify(ChainFamily::Solana, &signature), ExplorerKind::Tx);
        assert_eq!(classify(ChainFamily::Evm, &signature), ExplorerKind::Address);
    }

    #[test]
    fn addresses_fall_through() {
        assert_eq!(
            classify(ChainFamily::Evm, "0xABCDEF0123456789ABCDEF0123456789ABCDEF01"),
            ExplorerKind::Address
        );
        assert_eq!(
            classify(ChainFamily::Solana, "11111111111111111111111111111111"),
            ExplorerKind::Address
        );
        assert_eq!(
            classify(ChainFamily::Bitcoin, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"),
            ExplorerKind::Address
        );
    }

    #[test]
    fn renders_placeholder() {
        assert_eq!(
            render("https://etherscan.io/tx/{value}", "0xabc"),
            "https://etherscan.io/tx/0xabc"
        );
    }
}
