//! Price venue adapters
//!
//! Each venue wraps one external price source and normalizes its response
//! into a [`PriceQuote`] or "no price available". Venue failures never leave
//! this layer: transport errors are retried by [`VenueClient`] and exhausted
//! retries surface as `Ok(None)`.

mod client;
mod coingecko;
mod defillama;
mod dexscreener;
mod uniswap;

#[cfg(test)]
pub mod mock;

pub use client::VenueClient;
pub use coingecko::CoinGeckoVenue;
pub use defillama::DefiLlamaVenue;
pub use dexscreener::DexScreenerVenue;
pub use uniswap::UniswapVenue;

use alloy::primitives::Address;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::pricing::{Confidence, PriceQuote, QuoteCache};

/// Capability interface for one external price source
#[async_trait]
pub trait PriceVenue: Send + Sync {
    /// Venue name, used in quotes and logs
    fn name(&self) -> &'static str;

    /// USD price for a token, or None when this venue has no usable quote
    async fn get_price(&self, token: Address) -> Result<Option<PriceQuote>>;

    /// Whether this venue can price the token at all
    async fn supports(&self, token: Address) -> bool;
}

/// Build the default venue list in priority order, most reliable first
///
/// The Uniswap subgraph venue joins the list only when its endpoint is
/// configured; the other three have keyless public endpoints.
pub fn default_venues(config: &Config) -> Vec<Arc<dyn PriceVenue>> {
    let mut venues: Vec<Arc<dyn PriceVenue>> = vec![
        Arc::new(CoinGeckoVenue::new(config)),
        Arc::new(DefiLlamaVenue::new(config)),
        Arc::new(DexScreenerVenue::new(config)),
    ];
    if config.endpoints.uniswap_subgraph.is_some() {
        venues.push(Arc::new(UniswapVenue::new(config)));
    } else {
        tracing::debug!("Uniswap subgraph endpoint unconfigured, venue skipped");
    }
    venues
}

/// Lowercase 0x-prefixed form of an address, the way venue APIs key tokens
pub(crate) fn addr_lower(token: &Address) -> String {
    format!("{token:#x}")
}

/// Cache-then-fetch policy shared by every venue adapter
///
/// A fresh high-confidence cache hit short-circuits the request. A fresh
/// lower-confidence hit is still usable: a refresh is attempted, and the
/// cached quote backs it up when the refresh yields nothing. Transport
/// errors on a cold fetch are logged and reported as "no price".
pub(crate) async fn cached_price<F, Fut>(
    cache: &QuoteCache,
    token: Address,
    venue: &'static str,
    fetch: F,
) -> Result<Option<PriceQuote>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<PriceQuote>>>,
{
    if let Some(hit) = cache.get(&token).await {
        if hit.confidence == Confidence::High {
            tracing::trace!(venue, %token, "high-confidence cache hit");
            return Ok(Some(hit));
        }
        let refreshed = match fetch().await {
            Ok(Some(fresh)) => {
                cache.insert(fresh.clone()).await;
                fresh
            }
            Ok(None) => hit,
            Err(e) => {
                tracing::debug!(venue, %token, error = %e, "refresh failed, keeping cached quote");
                hit
            }
        };
        return Ok(Some(refreshed));
    }

    match fetch().await {
        Ok(Some(quote)) => {
            cache.insert(quote.clone()).await;
            Ok(Some(quote))
        }
        Ok(None) => Ok(None),
        Err(e) => {
            tracing::warn!(venue, %token, error = %e, "venue yielded no price after retries");
            Ok(None)
        }
    }
}
