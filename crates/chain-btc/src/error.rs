use thiserror::Error;

/// Bitcoin chain operation errors.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),
}
