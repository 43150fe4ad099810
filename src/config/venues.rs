//! Venue endpoint configuration
//!
//! Supports multiple configuration methods:
//! 1. Per-venue URL env vars (COINGECKO_API_URL, DEXSCREENER_API_URL, ...) -
//!    highest priority
//! 2. API keys (GRAPH_API_KEY, COINGECKO_API_KEY) - builds URLs automatically
//! 3. Public endpoint fallbacks - rate limited, fine for simulation
//!
//! The Uniswap subgraph venue is the one venue with no keyless fallback: it
//! stays unconfigured (and unsupported) unless GRAPH_API_KEY is set.

use serde::{Deserialize, Serialize};
use url::Url;

use super::{COINGECKO_API_KEY_ENV, GRAPH_API_KEY_ENV};
use crate::error::{Error, Result};

/// Environment variable names
mod env_vars {
    // Per-venue URLs (highest priority)
    pub const COINGECKO_API_URL: &str = "COINGECKO_API_URL";
    pub const DEFILLAMA_API_URL: &str = "DEFILLAMA_API_URL";
    pub const DEXSCREENER_API_URL: &str = "DEXSCREENER_API_URL";
    pub const UNISWAP_SUBGRAPH_URL: &str = "UNISWAP_SUBGRAPH_URL";
}

/// Public endpoints (rate limited)
mod public_endpoints {
    pub const COINGECKO: &str = "https://api.coingecko.com/api/v3";
    pub const DEFILLAMA: &str = "https://coins.llama.fi";
    pub const DEXSCREENER: &str = "https://api.dexscreener.com";
}

/// Uniswap V3 subgraph ID on The Graph decentralized network (Ethereum)
pub const UNISWAP_V3_SUBGRAPH_ID: &str = "5zvR82QoaXYFyDEKLZ9t6v9adgnptxYpKpSbxtgVENFV";

/// Resolved endpoints for every price venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueEndpoints {
    /// CoinGecko API base URL
    #[serde(default = "default_coingecko")]
    pub coingecko: String,
    /// Optional CoinGecko demo API key
    #[serde(default)]
    pub coingecko_api_key: Option<String>,
    /// DefiLlama coins API base URL
    #[serde(default = "default_defillama")]
    pub defillama: String,
    /// DexScreener API base URL
    #[serde(default = "default_dexscreener")]
    pub dexscreener: String,
    /// Full Uniswap V3 subgraph endpoint; None leaves the venue unsupported
    #[serde(default)]
    pub uniswap_subgraph: Option<String>,
}

fn default_coingecko() -> String {
    public_endpoints::COINGECKO.to_string()
}

fn default_defillama() -> String {
    public_endpoints::DEFILLAMA.to_string()
}

fn default_dexscreener() -> String {
    public_endpoints::DEXSCREENER.to_string()
}

impl VenueEndpoints {
    /// Resolve endpoints from environment variables
    ///
    /// Priority per venue:
    /// 1. Per-venue URL env var
    /// 2. URL derived from an API key, where the venue has one
    /// 3. Public endpoint fallback
    pub fn from_env() -> Self {
        let coingecko = std::env::var(env_vars::COINGECKO_API_URL)
            .unwrap_or_else(|_| public_endpoints::COINGECKO.to_string());
        let defillama = std::env::var(env_vars::DEFILLAMA_API_URL)
            .unwrap_or_else(|_| public_endpoints::DEFILLAMA.to_string());
        let dexscreener = std::env::var(env_vars::DEXSCREENER_API_URL)
            .unwrap_or_else(|_| public_endpoints::DEXSCREENER.to_string());

        let uniswap_subgraph = std::env::var(env_vars::UNISWAP_SUBGRAPH_URL)
            .ok()
            .or_else(|| std::env::var(GRAPH_API_KEY_ENV).ok().map(|key| subgraph_url(&key)));
        if uniswap_subgraph.is_none() {
            tracing::debug!("no GRAPH_API_KEY set, Uniswap subgraph venue disabled");
        }

        Self {
            coingecko,
            coingecko_api_key: std::env::var(COINGECKO_API_KEY_ENV).ok(),
            defillama,
            dexscreener,
            uniswap_subgraph,
        }
    }

    /// Build the subgraph endpoint from an API key
    pub fn with_graph_api_key(mut self, api_key: &str) -> Self {
        self.uniswap_subgraph = Some(subgraph_url(api_key));
        self
    }

    /// Check that every configured endpoint parses as a URL
    pub fn validate(&self) -> Result<()> {
        let mut urls = vec![
            self.coingecko.as_str(),
            self.defillama.as_str(),
            self.dexscreener.as_str(),
        ];
        if let Some(ref subgraph) = self.uniswap_subgraph {
            urls.push(subgraph.as_str());
        }
        for raw in urls {
            Url::parse(raw).map_err(|e| Error::Config(format!("bad endpoint {raw}: {e}")))?;
        }
        Ok(())
    }
}

fn subgraph_url(api_key: &str) -> String {
    format!(
        "https://gateway.thegraph.com/api/{}/subgraphs/id/{}",
        api_key, UNISWAP_V3_SUBGRAPH_ID
    )
}

impl Default for VenueEndpoints {
    fn default() -> Self {
        Self {
            coingecko: default_coingecko(),
            coingecko_api_key: None,
            defillama: default_defillama(),
            dexscreener: default_dexscreener(),
            uniswap_subgraph: None,
        }
    }
}
