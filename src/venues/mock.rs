//! Canned-price venue for tests

use alloy::primitives::Address;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::PriceVenue;
use crate::error::{Error, Result};
use crate::pricing::{Confidence, PriceQuote};

/// Test venue with fixed prices, an optional failure mode, and a call counter
pub struct MockVenue {
    name: &'static str,
    prices: HashMap<Address, f64>,
    failing: bool,
    calls: AtomicUsize,
}

impl MockVenue {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            prices: HashMap::new(),
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_price(mut self, token: Address, usd_price: f64) -> Self {
        self.prices.insert(token, usd_price);
        self
    }

    /// Every get_price call returns an error
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// How many times get_price has been called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceVenue for MockVenue {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn get_price(&self, token: Address) -> Result<Option<PriceQuote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::Venue(format!("{} is down", self.name)));
        }
        Ok(self
            .prices
            .get(&token)
            .and_then(|&price| PriceQuote::new(token, price, self.name, Confidence::High)))
    }

    async fn supports(&self, token: Address) -> bool {
        !self.failing && self.prices.contains_key(&token)
    }
}
