//! DexScreener price venue
//!
//! Pool-based: one token trades in many pairs, so a quote requires picking
//! a pair first. Pairs quoted in the canonical stable (USDC) are preferred,
//! then pairs quoted in the canonical native asset (WETH); anything else is
//! ignored. Among the candidates the deepest pool wins, and its USD
//! liquidity sets the quote's confidence.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{addr_lower, cached_price, PriceVenue, VenueClient};
use crate::config::Config;
use crate::error::Result;
use crate::pricing::{Confidence, PriceQuote, QuoteCache};
use crate::tokens::{CANONICAL_NATIVE, CANONICAL_STABLE};

const VENUE_NAME: &str = "dexscreener";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pair {
    base_token: PairToken,
    quote_token: PairToken,
    #[serde(default)]
    price_usd: Option<String>,
    #[serde(default)]
    liquidity: Option<Liquidity>,
}

#[derive(Debug, Deserialize)]
struct PairToken {
    address: String,
}

#[derive(Debug, Deserialize)]
struct Liquidity {
    #[serde(default)]
    usd: Option<f64>,
}

impl Pair {
    fn base_is(&self, token: &Address) -> bool {
        self.base_token.address.eq_ignore_ascii_case(&addr_lower(token))
    }

    fn quote_is(&self, token: &Address) -> bool {
        self.quote_token.address.eq_ignore_ascii_case(&addr_lower(token))
    }

    fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    fn price_usd(&self) -> Option<f64> {
        self.price_usd.as_deref()?.parse().ok()
    }
}

pub struct DexScreenerVenue {
    client: VenueClient,
    cache: QuoteCache,
    base_url: String,
}

impl DexScreenerVenue {
    pub fn new(config: &Config) -> Self {
        Self {
            client: VenueClient::new(&config.pricing),
            cache: QuoteCache::new(Duration::from_secs(config.pricing.cache_ttl_secs)),
            base_url: config.endpoints.dexscreener.clone(),
        }
    }

    async fn fetch(&self, token: Address) -> Result<Option<PriceQuote>> {
        let url = format!("{}/latest/dex/tokens/{}", self.base_url, addr_lower(&token));
        let body = self.client.get_json(&url).await?;
        let response: TokenResponse = serde_json::from_value(body)?;
        Ok(select_quote(token, response.pairs.unwrap_or_default()))
    }
}

/// Apply the pair-selection policy and turn the winner into a quote
fn select_quote(token: Address, pairs: Vec<Pair>) -> Option<PriceQuote> {
    let candidates: Vec<&Pair> = pairs.iter().filter(|p| p.base_is(&token)).collect();

    let stable_quoted: Vec<&Pair> = candidates
        .iter()
        .copied()
        .filter(|p| p.quote_is(&CANONICAL_STABLE))
        .collect();
    let native_quoted: Vec<&Pair> = candidates
        .iter()
        .copied()
        .filter(|p| p.quote_is(&CANONICAL_NATIVE))
        .collect();

    let pool = if !stable_quoted.is_empty() {
        stable_quoted
    } else if !native_quoted.is_empty() {
        native_quoted
    } else {
        return None;
    };

    let best = pool
        .into_iter()
        .max_by(|a, b| a.liquidity_usd().total_cmp(&b.liquidity_usd()))?;

    let price = best.price_usd()?;
    let confidence = Confidence::from_liquidity_usd(best.liquidity_usd());
    PriceQuote::new(token, price, VENUE_NAME, confidence)
}

#[async_trait]
impl PriceVenue for DexScreenerVenue {
    fn name(&self) -> &'static str {
        VENUE_NAME
    }

    async fn get_price(&self, token: Address) -> Result<Option<PriceQuote>> {
        cached_price(&self.cache, token, VENUE_NAME, || self.fetch(token)).await
    }

    async fn supports(&self, token: Address) -> bool {
        matches!(self.get_price(token).await, Ok(Some(_)))
    }
}
