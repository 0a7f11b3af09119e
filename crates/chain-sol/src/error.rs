use thiserror::Error;

/// Solana chain operation errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_public_key() {
        let err = SolError::InvalidPublicKey("not on curve".into());
        assert_eq!(err.to_string(), "invalid public key: not on curve");
    }

    #[test]
    fn display_invalid_address() {
        let err = SolError::InvalidAddress("bad decode".into());
        assert_eq!(err.to_string(), "invalid address: bad decode");
    }

    #[test]
    fn display_invalid_response() {
        let err = SolError::InvalidResponse("missing value".into());
        assert_eq!(err.to_string(), "invalid rpc response: missing value");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(SolError::SerializationError("test".into()));
        assert!(err.to_string().contains("test"));
    }
}
