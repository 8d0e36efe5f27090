//! Error types for Gangway

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors surfaced by the bridge.
///
/// Transport and handshake failures are non-fatal: the reconciler fans them
/// out to error listeners and keeps cycling. Nothing in here ever escapes
/// the reconciliation loop as a panic or an early return.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_failure() {
        let decode = BridgeError::Decode("invalid utf-8 sequence".into());
        assert_eq!(decode.to_string(), "Decode error: invalid utf-8 sequence");

        let config = BridgeError::Config("BRIDGE_HOST must not be empty".into());
        assert_eq!(
            config.to_string(),
            "Configuration error: BRIDGE_HOST must not be empty"
        );
    }
}
