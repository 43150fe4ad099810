//! Price quotes and the TTL cache they live in

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// How much a venue trusts its own quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Map a pool's USD liquidity to a confidence tier
    pub fn from_liquidity_usd(liquidity: f64) -> Self {
        if liquidity >= 100_000.0 {
            Confidence::High
        } else if liquidity >= 10_000.0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Map a venue-reported confidence score in [0, 1] to a tier
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Confidence::High
        } else if score >= 0.5 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// A USD price for one token from one venue
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    /// The priced token
    pub token: Address,
    /// USD price, always positive and finite
    pub usd_price: f64,
    /// Which venue produced the quote
    pub venue: &'static str,
    /// When the venue answered
    pub fetched_at: DateTime<Utc>,
    /// Venue-reported confidence tier
    pub confidence: Confidence,
}

impl PriceQuote {
    /// Build a quote, rejecting zero and non-finite prices
    pub fn new(
        token: Address,
        usd_price: f64,
        venue: &'static str,
        confidence: Confidence,
    ) -> Option<Self> {
        if !usd_price.is_finite() || usd_price <= 0.0 {
            return None;
        }
        Some(Self {
            token,
            usd_price,
            venue,
            fetched_at: Utc::now(),
            confidence,
        })
    }
}

struct CacheEntry {
    quote: PriceQuote,
    inserted: Instant,
}

/// TTL cache of quotes keyed by token
///
/// Used at two levels: each venue adapter keeps its own, and the aggregator
/// keeps one on top. Readers within the TTL window may observe slightly
/// stale prices; that is accepted.
pub struct QuoteCache {
    entries: RwLock<HashMap<Address, CacheEntry>>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fresh cached quote for a token, if any
    pub async fn get(&self, token: &Address) -> Option<PriceQuote> {
        let entries = self.entries.read().await;
        let entry = entries.get(token)?;
        if entry.inserted.elapsed() < self.ttl {
            Some(entry.quote.clone())
        } else {
            None
        }
    }

    /// Cache a quote, superseding any previous entry for the token
    pub async fn insert(&self, quote: PriceQuote) {
        let mut entries = self.entries.write().await;
        entries.insert(
            quote.token,
            CacheEntry {
                quote,
                inserted: Instant::now(),
            },
        );
    }

    /// Drop every cached quote
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
