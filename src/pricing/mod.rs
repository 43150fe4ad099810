//! Multi-venue price resolution
//!
//! The aggregator holds venue adapters in a fixed priority order and walks
//! them until one produces a quote. Winning quotes land in a top-level TTL
//! cache that is independent of the adapters' own caches, so a repeat
//! lookup within the window never touches a venue at all.

mod quote;

pub use quote::{Confidence, PriceQuote, QuoteCache};

use alloy::primitives::Address;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::venues::{self, PriceVenue};

pub struct PriceAggregator {
    venues: Vec<Arc<dyn PriceVenue>>,
    cache: QuoteCache,
}

impl PriceAggregator {
    /// Build an aggregator over an explicit, priority-ordered venue list
    pub fn new(venues: Vec<Arc<dyn PriceVenue>>, cache_ttl: Duration) -> Self {
        Self {
            venues,
            cache: QuoteCache::new(cache_ttl),
        }
    }

    /// Build an aggregator with the default venue set for a configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            venues::default_venues(config),
            Duration::from_secs(config.pricing.cache_ttl_secs),
        )
    }

    /// Resolve a USD quote for a token
    ///
    /// Venues are tried strictly in priority order; the first quote wins and
    /// later venues are not queried. A venue that errors is logged and
    /// skipped. Returns None when no venue can price the token.
    pub async fn get_price(&self, token: Address) -> Option<PriceQuote> {
        if let Some(cached) = self.cache.get(&token).await {
            tracing::trace!(%token, venue = cached.venue, "aggregator cache hit");
            return Some(cached);
        }

        for venue in &self.venues {
            match venue.get_price(token).await {
                Ok(Some(quote)) => {
                    tracing::debug!(
                        %token,
                        venue = venue.name(),
                        price = quote.usd_price,
                        "price resolved"
                    );
                    self.cache.insert(quote.clone()).await;
                    return Some(quote);
                }
                Ok(None) => {
                    tracing::trace!(%token, venue = venue.name(), "venue has no price");
                }
                Err(e) => {
                    tracing::warn!(%token, venue = venue.name(), error = %e, "venue failed");
                }
            }
        }

        tracing::debug!(%token, "no venue produced a price");
        None
    }

    /// Resolve quotes for several tokens concurrently
    pub async fn get_prices(&self, tokens: &[Address]) -> Vec<Option<PriceQuote>> {
        join_all(tokens.iter().map(|&token| self.get_price(token))).await
    }

    /// Whether any venue can price the token
    ///
    /// Satisfied by a live cache hit or the first venue whose `supports`
    /// answers true; later venues are not consulted.
    pub async fn is_supported(&self, token: Address) -> bool {
        if self.cache.get(&token).await.is_some() {
            return true;
        }
        for venue in &self.venues {
            if venue.supports(token).await {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venues::mock::MockVenue;
    use alloy::primitives::address;

    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    const WBTC: Address = address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599");

    fn aggregator(venues: Vec<Arc<dyn PriceVenue>>) -> PriceAggregator {
        PriceAggregator::new(venues, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_first_venue_wins() {
        let primary = Arc::new(MockVenue::new("primary").with_price(WETH, 3500.0));
        let secondary = Arc::new(MockVenue::new("secondary").with_price(WETH, 3600.0));
        let agg = aggregator(vec![primary.clone(), secondary.clone()]);

        let quote = agg.get_price(WETH).await.unwrap();
        assert_eq!(quote.usd_price, 3500.0);
        assert_eq!(quote.venue, "primary");
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_hit() {
        let empty = Arc::new(MockVenue::new("empty"));
        let second = Arc::new(MockVenue::new("second").with_price(WETH, 5.0));
        let third = Arc::new(MockVenue::new("third").with_price(WETH, 9.0));
        let agg = aggregator(vec![empty.clone(), second.clone(), third.clone()]);

        let quote = agg.get_price(WETH).await.unwrap();
        assert_eq!(quote.usd_price, 5.0);
        assert_eq!(empty.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn test_erroring_venue_is_skipped() {
        let broken = Arc::new(MockVenue::new("broken").failing());
        let backup = Arc::new(MockVenue::new("backup").with_price(WETH, 3500.0));
        let agg = aggregator(vec![broken.clone(), backup.clone()]);

        let quote = agg.get_price(WETH).await.unwrap();
        assert_eq!(quote.venue, "backup");
        assert_eq!(broken.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_venues_empty_returns_none() {
        let a = Arc::new(MockVenue::new("a"));
        let b = Arc::new(MockVenue::new("b").failing());
        let agg = aggregator(vec![a, b]);

        assert!(agg.get_price(WETH).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_idempotence() {
        let venue = Arc::new(MockVenue::new("venue").with_price(WETH, 3500.0));
        let agg = aggregator(vec![venue.clone()]);

        let first = agg.get_price(WETH).await.unwrap();
        let second = agg.get_price(WETH).await.unwrap();

        assert_eq!(first.usd_price, second.usd_price);
        assert_eq!(first.fetched_at, second.fetched_at);
        // the second call was served from the aggregator cache
        assert_eq!(venue.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expires_and_refetches() {
        let venue = Arc::new(MockVenue::new("venue").with_price(WETH, 3500.0));
        let agg = aggregator(vec![venue.clone()]);

        agg.get_price(WETH).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        agg.get_price(WETH).await.unwrap();

        assert_eq!(venue.calls(), 2);
    }

    #[tokio::test]
    async fn test_get_prices_batch() {
        let venue = Arc::new(
            MockVenue::new("venue")
                .with_price(WETH, 3500.0)
                .with_price(WBTC, 95_000.0),
        );
        let unknown = address!("1111111111111111111111111111111111111111");
        let agg = aggregator(vec![venue]);

        let quotes = agg.get_prices(&[WETH, WBTC, unknown]).await;
        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0].as_ref().unwrap().usd_price, 3500.0);
        assert_eq!(quotes[1].as_ref().unwrap().usd_price, 95_000.0);
        assert!(quotes[2].is_none());
    }

    #[tokio::test]
    async fn test_is_supported_stops_at_first_supporting_venue() {
        let empty = Arc::new(MockVenue::new("empty"));
        let holder = Arc::new(MockVenue::new("holder").with_price(WETH, 3500.0));
        let agg = aggregator(vec![empty, holder]);

        assert!(agg.is_supported(WETH).await);
        assert!(!agg.is_supported(WBTC).await);
    }

    #[tokio::test]
    async fn test_is_supported_by_cache_hit() {
        let venue = Arc::new(MockVenue::new("venue").with_price(WETH, 3500.0));
        let agg = aggregator(vec![venue.clone()]);

        agg.get_price(WETH).await.unwrap();
        assert!(agg.is_supported(WETH).await);
        // answered from cache, no supports() probe needed
        assert_eq!(venue.calls(), 1);
    }
}
