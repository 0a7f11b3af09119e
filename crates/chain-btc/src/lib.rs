//! Bitcoin chain support for the wallet session core.
//!
//! Provides address validation for legacy, SegWit and Taproot formats and
//! the Esplora REST response types the wallet reads balances from.

pub mod address;
pub mod error;
pub mod esplora;
pub mod network;
