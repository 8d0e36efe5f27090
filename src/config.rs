//! Configuration for Gangway
//!
//! CLI arguments and environment variable handling using clap. Defaults
//! live here and in `BridgeConfig::default()`; there is no implicit global
//! state.

use clap::Parser;
use std::time::Duration;

use crate::bridge::BridgeConfig;
use crate::types::{BridgeError, Result};

/// Gangway - self-healing WebSocket bridge
#[derive(Parser, Debug, Clone)]
#[command(name = "gangway")]
#[command(about = "Self-healing WebSocket bridge for chat relays")]
pub struct Args {
    /// Host of the WebSocket endpoint to bridge to
    #[arg(long, env = "BRIDGE_HOST", default_value = "localhost")]
    pub host: String,

    /// Port of the WebSocket endpoint
    #[arg(long, env = "BRIDGE_PORT", default_value = "10209")]
    pub port: u16,

    /// Reconciliation cycle interval in milliseconds
    #[arg(long, env = "CYCLE_INTERVAL_MS", default_value = "250")]
    pub cycle_interval_ms: u64,

    /// Display name attached to outbound chat envelopes
    #[arg(long, env = "CHAT_USER", default_value = "gangway")]
    pub chat_user: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Bridge configuration derived from these arguments.
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            host: self.host.clone(),
            port: self.port,
            cycle_interval: Duration::from_millis(self.cycle_interval_ms),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(BridgeError::Config("BRIDGE_HOST must not be empty".into()));
        }
        if self.cycle_interval_ms == 0 {
            return Err(BridgeError::Config(
                "CYCLE_INTERVAL_MS must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["gangway"]);
        assert_eq!(args.host, "localhost");
        assert_eq!(args.port, 10209);
        assert_eq!(args.cycle_interval_ms, 250);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_bridge_config_derivation() {
        let args = Args::parse_from([
            "gangway",
            "--host",
            "example.com",
            "--port",
            "9000",
            "--cycle-interval-ms",
            "100",
        ]);
        let config = args.bridge_config();
        assert_eq!(config.host, "example.com");
        assert_eq!(config.port, 9000);
        assert_eq!(config.cycle_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let args = Args::parse_from(["gangway", "--cycle-interval-ms", "0"]);
        assert!(matches!(args.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let args = Args::parse_from(["gangway", "--host", " "]);
        assert!(matches!(args.validate(), Err(BridgeError::Config(_))));
    }
}
