//! Simulated DEX spot trading
//!
//! Paper-trades tokens against real venue prices without touching a chain:
//! - Resolves USD prices from multiple venues with priority fallback,
//!   per-venue rate limiting/retry, and short-TTL caching
//! - Tracks per-token balances in an always-non-negative ledger
//! - Settles trades at the ratio of two independently sourced USD quotes
//!   and records every attempt in an append-only history
//!
//! No component signs, submits, or simulates on-chain transactions; prices
//! are the only thing fetched from the outside world.

pub mod config;
pub mod engine;
pub mod ledger;
pub mod pricing;
pub mod tokens;
pub mod venues;

mod error;

// Re-export commonly used types
pub use config::{Config, PricingConfig, VenueEndpoints, COINGECKO_API_KEY_ENV, GRAPH_API_KEY_ENV};
pub use engine::{Trade, TradeEngine, TradeLogWriter, TradeResult};
pub use error::{Error, Result};
pub use ledger::{BalanceLedger, BalanceStore, JsonFileStore};
pub use pricing::{Confidence, PriceAggregator, PriceQuote};
pub use venues::PriceVenue;
