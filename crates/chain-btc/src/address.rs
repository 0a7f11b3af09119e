use bitcoin::address::{Address, NetworkUnchecked};

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// Validate a Bitcoin address string for the given network.
///
/// Supports P2PKH, P2SH, P2WPKH, P2WSH, and P2TR address formats.
/// Returns `true` if the address is valid for the specified network,
/// `false` if it is valid but for a different network.
pub fn validate_address(address: &str, network: BtcNetwork) -> Result<bool, BtcError> {
    let parsed = address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("failed to parse address: {e}")))?;

    Ok(parsed.is_valid_for_network(network.to_bitcoin_network()))
}

/// Boolean form of [`validate_address`]: parse failures and wrong-network
/// addresses are both `false`.
pub fn is_valid_address(address: &str, network: BtcNetwork) -> bool {
    matches!(validate_address(address, network), Ok(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_known_mainnet_address() {
        let valid = validate_address(
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            BtcNetwork::Mainnet,
        )
        .unwrap();
        assert!(valid);
    }

    #[test]
    fn validate_mainnet_address_on_testnet_returns_false() {
        let valid = validate_address(
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            BtcNetwork::Testnet,
        )
        .unwrap();
        assert!(!valid);
    }

    #[test]
    fn validate_garbage_address_returns_error() {
        let result = validate_address("notanaddress!!!", BtcNetwork::Mainnet);
        assert!(result.is_err());
    }

    #[test]
    fn validate_p2pkh_mainnet_address() {
        // Satoshi's genesis coinbase address.
        assert!(is_valid_address(
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
            BtcNetwork::Mainnet
        ));
    }

    #[test]
    fn validate_testnet_bech32_address() {
        assert!(is_valid_address(
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
            BtcNetwork::Testnet
        ));
    }

    #[test]
    fn evm_address_is_not_a_bitcoin_address() {
        assert!(!is_valid_address(
            "0xABCDEF0123456789ABCDEF0123456789ABCDEF01",
            BtcNetwork::Mainnet
        ));
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        assert!(!is_valid_address(
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5",
            BtcNetwork::Mainnet
        ));
    }
}
