//! Esplora REST response types.
//!
//! Bitcoin Core's JSON-RPC has no address-balance call, so balances come
//! from an Esplora indexer (`GET {base}/address/{address}`) and signed
//! transactions are broadcast with `POST {base}/tx` (hex body, txid reply).

use serde::Deserialize;

use crate::error::BtcError;

/// Funding/spending totals for one side (confirmed chain or mempool).
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct TxoStats {
    pub funded_txo_count: u64,
    pub funded_txo_sum: u64,
    pub spent_txo_count: u64,
    pub spent_txo_sum: u64,
    pub tx_count: u64,
}

impl TxoStats {
    /// Unspent value in satoshis.
    pub fn balance(&self) -> u64 {
        self.funded_txo_sum.saturating_sub(self.spent_txo_sum)
    }
}

/// `GET /address/{address}` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    pub chain_stats: TxoStats,
    #[serde(default)]
    pub mempool_stats: TxoStats,
}

impl AddressInfo {
    /// Confirmed balance in satoshis. Mempool activity is not counted.
    pub fn confirmed_balance(&self) -> u64 {
        self.chain_stats.balance()
    }
}

/// Path of the address summary endpoint relative to the Esplora base URL.
pub fn address_path(base_url: &str, address: &str) -> String {
    format!("{}/address/{address}", base_url.trim_end_matches('/'))
}

/// Path of the broadcast endpoint relative to the Esplora base URL.
pub fn broadcast_path(base_url: &str) -> String {
    format!("{}/tx", base_url.trim_end_matches('/'))
}

pub fn parse_address_info(body: &serde_json::Value) -> Result<AddressInfo, BtcError> {
    AddressInfo::deserialize(body)
        .map_err(|e| BtcError::InvalidResponse(format!("address info: {e}")))
}

/// Broadcast reply: the 64-hex-digit txid as plain text.
pub fn parse_txid(body: &str) -> Result<String, BtcError> {
    let txid = body.trim();
    if txid.len() != 64 || !txid.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BtcError::InvalidResponse(format!("unexpected broadcast reply {txid:?}")));
    }
    Ok(txid.to_string())
}
