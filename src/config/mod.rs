//! Configuration for the paper trading engine

pub mod venues;

use serde::{Deserialize, Serialize};

pub use venues::VenueEndpoints;

/// The Graph API key environment variable name
pub const GRAPH_API_KEY_ENV: &str = "GRAPH_API_KEY";

/// CoinGecko API key environment variable name (optional, demo tier)
pub const COINGECKO_API_KEY_ENV: &str = "COINGECKO_API_KEY";

/// Price resolution settings shared by the aggregator and venue adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// How long a cached quote stays fresh (seconds)
    pub cache_ttl_secs: u64,
    /// Minimum spacing between requests to one venue (milliseconds)
    pub min_request_interval_ms: u64,
    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
    /// Attempts per venue request before giving up
    pub max_retries: u32,
    /// Base delay for linear retry backoff (milliseconds); attempt N waits N x base
    pub retry_backoff_ms: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 30,
            min_request_interval_ms: 100,
            request_timeout_secs: 5,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Venue endpoints
    pub endpoints: VenueEndpoints,
    /// Price resolution settings
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Path to the append-only trade log file (JSONL), if any
    #[serde(default)]
    pub trade_log_path: Option<String>,
    /// Path to persist ledger balances across restarts, if any
    #[serde(default)]
    pub ledger_state_file: Option<String>,
}

impl Config {
    /// Build a configuration from environment variables, falling back to
    /// public endpoints where nothing is set
    pub fn from_env() -> Self {
        Self {
            endpoints: VenueEndpoints::from_env(),
            pricing: PricingConfig::default(),
            trade_log_path: std::env::var("TRADE_LOG_PATH").ok(),
            ledger_state_file: std::env::var("LEDGER_STATE_FILE").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: VenueEndpoints::default(),
            pricing: PricingConfig::default(),
            trade_log_path: None,
            ledger_state_file: None,
        }
    }
}
