//! Trade engine
//!
//! Orchestrates one conversion: advisory balance check, concurrent price
//! resolution for both legs, settlement against the ledger, and the
//! append-only trade record. Failures before settlement leave every balance
//! unchanged; failed attempts still produce a history record with
//! `success = false`.

mod history;

pub use history::{Trade, TradeHistory, TradeLogWriter};

use alloy::primitives::Address;
use std::sync::Arc;

use crate::error::Error;
use crate::ledger::BalanceLedger;
use crate::pricing::PriceAggregator;
use crate::tokens::registry;

/// Outcome of one `execute_trade` call
pub struct TradeResult {
    pub success: bool,
    pub trade: Option<Trade>,
    pub error: Option<Error>,
}

impl TradeResult {
    fn executed(trade: Trade) -> Self {
        Self {
            success: true,
            trade: Some(trade),
            error: None,
        }
    }

    fn rejected(trade: Trade, error: Error) -> Self {
        Self {
            success: false,
            trade: Some(trade),
            error: Some(error),
        }
    }
}

pub struct TradeEngine {
    aggregator: Arc<PriceAggregator>,
    ledger: Arc<BalanceLedger>,
    history: TradeHistory,
    trade_log: Option<TradeLogWriter>,
}

impl TradeEngine {
    pub fn new(aggregator: Arc<PriceAggregator>, ledger: Arc<BalanceLedger>) -> Self {
        Self {
            aggregator,
            ledger,
            history: TradeHistory::new(),
            trade_log: None,
        }
    }

    /// Mirror every trade record into a JSONL file
    pub fn with_trade_log(mut self, writer: TradeLogWriter) -> Self {
        self.trade_log = Some(writer);
        self
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    pub fn aggregator(&self) -> &PriceAggregator {
        &self.aggregator
    }

    /// Convert `from_amount` of one token into another at the ratio of
    /// their independently sourced USD prices
    ///
    /// Zero and non-finite amounts are rejected. Trading a token into
    /// itself is allowed: both legs price identically, so the ledger nets
    /// to a no-op and only the record remains.
    pub async fn execute_trade(
        &self,
        from_token: Address,
        to_token: Address,
        from_amount: f64,
    ) -> TradeResult {
        if !from_amount.is_finite() || from_amount <= 0.0 {
            let error = Error::InvalidAmount(format!(
                "trade amount must be positive and finite, got {from_amount}"
            ));
            return self.reject(from_token, to_token, from_amount, error).await;
        }

        let available = self.ledger.get_balance(from_token).await;
        if from_amount > available {
            let error = Error::InsufficientBalance {
                requested: from_amount,
                available,
            };
            return self.reject(from_token, to_token, from_amount, error).await;
        }

        let (from_quote, to_quote) = tokio::join!(
            self.aggregator.get_price(from_token),
            self.aggregator.get_price(to_token)
        );
        let from_price = match from_quote {
            Some(quote) => quote.usd_price,
            None => {
                return self
                    .reject(from_token, to_token, from_amount, Error::PriceUnavailable(from_token))
                    .await;
            }
        };
        let to_price = match to_quote {
            Some(quote) => quote.usd_price,
            None => {
                return self
                    .reject(from_token, to_token, from_amount, Error::PriceUnavailable(to_token))
                    .await;
            }
        };

        let from_value_usd = from_amount * from_price;
        let to_amount = from_value_usd / to_price;
        if !to_amount.is_finite() {
            let error = Error::InvalidAmount(format!(
                "conversion produced a non-finite amount ({from_amount} x {from_price} / {to_price})"
            ));
            return self.reject(from_token, to_token, from_amount, error).await;
        }

        // The debit re-validates against the live balance: a concurrent
        // trade may have spent this token since the advisory check above.
        if let Err(error) = self.ledger.debit(from_token, from_amount).await {
            return self.reject(from_token, to_token, from_amount, error).await;
        }
        // Credit of a validated finite non-negative amount cannot fail; if
        // it ever does, restore the debit so no half-applied trade remains.
        if let Err(error) = self.ledger.credit(to_token, to_amount).await {
            let _ = self.ledger.credit(from_token, from_amount).await;
            return self.reject(from_token, to_token, from_amount, error).await;
        }

        let trade = Trade::executed(from_token, to_token, from_amount, to_amount);
        self.record(&trade).await;

        let tokens = registry();
        tracing::info!(
            from = %tokens.symbol_or_short(&from_token),
            to = %tokens.symbol_or_short(&to_token),
            from_amount,
            to_amount,
            rate = trade.exchange_rate,
            value_usd = from_value_usd,
            "trade executed"
        );

        TradeResult::executed(trade)
    }

    /// All recorded trade attempts, oldest-first
    pub async fn list_trades(&self, limit: Option<usize>) -> Vec<Trade> {
        self.history.list(limit).await
    }

    async fn reject(
        &self,
        from_token: Address,
        to_token: Address,
        from_amount: f64,
        error: Error,
    ) -> TradeResult {
        tracing::warn!(
            %from_token,
            %to_token,
            from_amount,
            error = %error,
            "trade rejected"
        );
        let trade = Trade::rejected(from_token, to_token, from_amount, error.to_string());
        self.record(&trade).await;
        TradeResult::rejected(trade, error)
    }

    async fn record(&self, trade: &Trade) {
        self.history.append(trade.clone()).await;
        if let Some(ref log) = self.trade_log {
            if let Err(e) = log.write(trade) {
                tracing::warn!(error = %e, "failed to write trade log entry");
            }
        }
    }
}
