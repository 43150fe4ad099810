//! DefiLlama price venue
//!
//! The coins API reports its own confidence score alongside each price,
//! which maps directly onto our confidence tiers.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{addr_lower, cached_price, PriceVenue, VenueClient};
use crate::config::Config;
use crate::error::Result;
use crate::pricing::{Confidence, PriceQuote, QuoteCache};

const VENUE_NAME: &str = "defillama";

#[derive(Debug, Deserialize)]
struct CoinsResponse {
    #[serde(default)]
    coins: HashMap<String, Coin>,
}

#[derive(Debug, Deserialize)]
struct Coin {
    price: f64,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct DefiLlamaVenue {
    client: VenueClient,
    cache: QuoteCache,
    base_url: String,
}

impl DefiLlamaVenue {
    pub fn new(config: &Config) -> Self {
        Self {
            client: VenueClient::new(&config.pricing),
            cache: QuoteCache::new(Duration::from_secs(config.pricing.cache_ttl_secs)),
            base_url: config.endpoints.defillama.clone(),
        }
    }

    async fn fetch(&self, token: Address) -> Result<Option<PriceQuote>> {
        let key = coin_key(&token);
        let url = format!("{}/prices/current/{}", self.base_url, key);
        let body = self.client.get_json(&url).await?;
        let response: CoinsResponse = serde_json::from_value(body)?;
        Ok(parse_price(token, &response))
    }
}

fn coin_key(token: &Address) -> String {
    format!("ethereum:{}", addr_lower(token))
}

fn parse_price(token: Address, response: &CoinsResponse) -> Option<PriceQuote> {
    let coin = response.coins.get(&coin_key(&token))?;
    let confidence = coin
        .confidence
        .map(Confidence::from_score)
        .unwrap_or(Confidence::Medium);
    PriceQuote::new(token, coin.price, VENUE_NAME, confidence)
}

#[async_trait]
impl PriceVenue for DefiLlamaVenue {
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
