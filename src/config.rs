/// Session configuration.
///
/// Everything has a sensible default; `from_env` overrides from the
/// environment for deployments (a `.env` file is honored).

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Network identifier used for mnemonic signer derivation
pub const DEFAULT_NETWORK: &str = "mainnet";

/// Signature scheme identifier passed to the L2 client during binding
pub const DEFAULT_SIGNATURE_SCHEME: &str = "EIP1271Signature";

/// Interval between periodic full balance refreshes
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

// ============================================================================
// SESSION CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Network identifier for mnemonic signer derivation
    pub network: String,
    /// Signature scheme identifier for L2 account binding
    pub signature_scheme: String,
    /// Periodic balance refresh interval
    pub refresh_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            network: DEFAULT_NETWORK.to_string(),
            signature_scheme: DEFAULT_SIGNATURE_SCHEME.to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }
}

impl SessionConfig {
    /// Build a config from `WALLET_NETWORK`, `WALLET_SIGNATURE_SCHEME` and
    /// `WALLET_REFRESH_SECS`, falling back to defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let network = std::env::var("WALLET_NETWORK")
            .unwrap_or_else(|_| DEFAULT_NETWORK.to_string());
        let signature_scheme = std::env::var("WALLET_SIGNATURE_SCHEME")
            .unwrap_or_else(|_| DEFAULT_SIGNATURE_SCHEME.to_string());
        let refresh_secs = std::env::var("WALLET_REFRESH_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);

        SessionConfig {
            network,
            signature_scheme,
            refresh_interval: Duration::from_secs(refresh_secs),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
