//! Uniswap V3 subgraph price venue
//!
//! Derives a USD price from the token's ETH-denominated price
//! (`derivedETH`) and the current ETH/USD bundle price. Requires a Graph
//! gateway endpoint; without one the venue reports every token as
//! unsupported.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{addr_lower, cached_price, PriceVenue, VenueClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pricing::{Confidence, PriceQuote, QuoteCache};

const VENUE_NAME: &str = "uniswap_v3";

const TOKEN_PRICE_QUERY: &str = r#"
    query TokenPrice($id: ID!) {
        token(id: $id) {
            id
            symbol
            derivedETH
            totalValueLockedUSD
        }
        bundle(id: "1") {
            ethPriceUSD
        }
    }
"#;

/// GraphQL response envelope
#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

pub struct UniswapVenue {
    client: VenueClient,
    cache: QuoteCache,
    endpoint: Option<String>,
}

impl UniswapVenue {
    pub fn new(config: &Config) -> Self {
        Self {
            client: VenueClient::new(&config.pricing),
            cache: QuoteCache::new(Duration::from_secs(config.pricing.cache_ttl_secs)),
            endpoint: config.endpoints.uniswap_subgraph.clone(),
        }
    }

    async fn fetch(&self, token: Address) -> Result<Option<PriceQuote>> {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint,
            None => return Ok(None),
        };

        let variables = json!({ "id": addr_lower(&token) });
        let body = self
            .client
            .post_graphql(endpoint, TOKEN_PRICE_QUERY, variables)
            .await?;

        let response: GraphQLResponse = serde_json::from_value(body)?;
        if let Some(errors) = response.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::Venue(format!("GraphQL errors: {messages:?}")));
        }
        let data = response
            .data
            .ok_or_else(|| Error::Venue("no data in GraphQL response".to_string()))?;

        Ok(parse_price(token, &data))
    }
}

/// Compute USD price from `derivedETH x ethPriceUSD`
fn parse_price(token: Address, data: &Value) -> Option<PriceQuote> {
    let token_data = data.get("token")?;
    if token_data.is_null() {
        return None;
    }

    let derived_eth = field_as_f64(token_data, "derivedETH")?;
    let eth_price = field_as_f64(data.get("bundle")?, "ethPriceUSD")?;
    let tvl = field_as_f64(token_data, "totalValueLockedUSD").unwrap_or(0.0);

    PriceQuote::new(
        token,
        derived_eth * eth_price,
        VENUE_NAME,
        Confidence::from_liquidity_usd(tvl),
    )
}

/// Subgraph numerics arrive as decimal strings
fn field_as_f64(value: &Value, field: &str) -> Option<f64> {
    value.get(field)?.as_str()?.parse().ok()
}

#[async_trait]
impl PriceVenue for UniswapVenue {
    fn name(&self) -> &'static str {
        VENUE_NAME
    }

    async fn get_price(&self, token: Address) -> Result<Option<PriceQuote>> {
        if self.endpoint.is_none() {
            return Ok(None);
        }
        cached_price(&self.cache, token, VENUE_NAME, || self.fetch(token)).await
    }

    async fn supports(&self, token: Address) -> bool {
        self.endpoint.is_some() && matches!(self.get_price(token).await, Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    #[test]
    fn test_parse_price() {
        let data = json!({
            "token": {
                "id": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                "symbol": "WETH",
                "derivedETH": "1",
                "totalValueLockedUSD": "250000000"
            },
            "bundle": { "ethPriceUSD": "3500.25" }
        });
        let quote = parse_price(WETH, &data).unwrap();
        assert_eq!(quote.usd_price, 3500.25);
        assert_eq!(quote.confidence, Confidence::High);
    }

    #[test]
    fn test_parse_price_unknown_token() {
        let data = json!({
            "token": null,
            "bundle": { "ethPriceUSD": "3500.25" }
        });
        assert!(parse_price(WETH, &data).is_none());
    }

    #[test]
    fn test_parse_price_zero_derived_eth_is_invalid() {
        let data = json!({
            "token": {
                "derivedETH": "0",
                "totalValueLockedUSD": "1000"
            },
            "bundle": { "ethPriceUSD": "3500.25" }
        });
        assert!(parse_price(WETH, &data).is_none());
    }

    #[test]
    fn test_low_tvl_lowers_confidence() {
        let data = json!({
            "token": {
                "derivedETH": "0.001",
                "totalValueLockedUSD": "5000"
            },
            "bundle": { "ethPriceUSD": "3500.0" }
        });
        let quote = parse_price(WETH, &data).unwrap();
        assert_eq!(quote.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_is_unsupported() {
        let venue = UniswapVenue::new(&Config::default());
        assert!(!venue.supports(WETH).await);
        assert!(venue.get_price(WETH).await.unwrap().is_none());
    }
}
