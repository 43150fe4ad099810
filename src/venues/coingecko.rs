//! CoinGecko price venue
//!
//! Uses the `simple/token_price` endpoint keyed by contract address. The
//! public endpoint works without a key; a demo API key is attached as a
//! header when configured.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{addr_lower, cached_price, PriceVenue, VenueClient};
use crate::config::Config;
use crate::error::Result;
use crate::pricing::{Confidence, PriceQuote, QuoteCache};

const VENUE_NAME: &str = "coingecko";

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

pub struct CoinGeckoVenue {
    client: VenueClient,
    cache: QuoteCache,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoVenue {
    pub fn new(config: &Config) -> Self {
        Self {
            client: VenueClient::new(&config.pricing),
            cache: QuoteCache::new(Duration::from_secs(config.pricing.cache_ttl_secs)),
            base_url: config.endpoints.coingecko.clone(),
            api_key: config.endpoints.coingecko_api_key.clone(),
        }
    }

    async fn fetch(&self, token: Address) -> Result<Option<PriceQuote>> {
        let addr = addr_lower(&token);
        let url = format!(
            "{}/simple/token_price/ethereum?contract_addresses={}&vs_currencies=usd",
            self.base_url, addr
        );

        let body = match &self.api_key {
            Some(key) => {
                self.client
                    .get_json_with_headers(&url, &[(API_KEY_HEADER, key.clone())])
                    .await?
            }
            None => self.client.get_json(&url).await?,
        };

        Ok(parse_price(token, &body))
    }
}

/// Pull the USD price out of a `{"0x...": {"usd": 1.23}}` response
fn parse_price(token: Address, body: &Value) -> Option<PriceQuote> {
    let usd = body.get(addr_lower(&token))?.get("usd")?.as_f64()?;
    // CoinGecko aggregates across markets; its quotes are trusted as-is
    PriceQuote::new(token, usd, VENUE_NAME, Confidence::High)
}

#[async_trait]
impl PriceVenue for CoinGeckoVenue {
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

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use serde_json::json;

    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    #[test]
    fn test_parse_price() {
        let body = json!({
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2": { "usd": 3512.34 }
        });
        let quote = parse_price(WETH, &body).unwrap();
        assert_eq!(quote.usd_price, 3512.34);
        assert_eq!(quote.venue, "coingecko");
        assert_eq!(quote.confidence, Confidence::High);
    }

    #[test]
    fn test_parse_price_missing_token() {
        let body = json!({});
        assert!(parse_price(WETH, &body).is_none());
    }

    #[test]
    fn test_parse_price_rejects_zero() {
        let body = json!({
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2": { "usd": 0.0 }
        });
        assert!(parse_price(WETH, &body).is_none());
    }
}
