//! Trade records, the in-memory history, and the JSONL trade log

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// One settled (or rejected) conversion attempt
///
/// Immutable once created; appended to the history and never mutated or
/// deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub from_token: Address,
    pub to_token: Address,
    pub from_amount: f64,
    pub to_amount: f64,
    /// to_amount / from_amount; zero for failed attempts
    pub exchange_rate: f64,
    pub success: bool,
    pub error: Option<String>,
}

impl Trade {
    pub fn executed(from_token: Address, to_token: Address, from_amount: f64, to_amount: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            from_token,
            to_token,
            from_amount,
            to_amount,
            exchange_rate: to_amount / from_amount,
            success: true,
            error: None,
        }
    }

    pub fn rejected(from_token: Address, to_token: Address, from_amount: f64, error: String) -> Self {
        Self {
            timestamp: Utc::now(),
            from_token,
            to_token,
            from_amount,
            to_amount: 0.0,
            exchange_rate: 0.0,
            success: false,
            error: Some(error),
        }
    }
}

/// Append-only, oldest-first record of trade attempts
pub struct TradeHistory {
    trades: RwLock<Vec<Trade>>,
}

impl TradeHistory {
    pub fn new() -> Self {
        Self {
            trades: RwLock::new(Vec::new()),
        }
    }

    pub async fn append(&self, trade: Trade) {
        self.trades.write().await.push(trade);
    }

    /// Trades oldest-first; with a limit, the most recent N in the same order
    pub async fn list(&self, limit: Option<usize>) -> Vec<Trade> {
        let trades = self.trades.read().await;
        match limit {
            Some(n) => {
                let start = trades.len().saturating_sub(n);
                trades[start..].to_vec()
            }
            None => trades.clone(),
        }
    }

    pub async fn len(&self) -> usize {
        self.trades.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trades.read().await.is_empty()
    }
}

impl Default for TradeHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends trade records to a JSONL file, one object per line
pub struct TradeLogWriter {
    path: PathBuf,
}

impl TradeLogWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, trade: &Trade) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(trade)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    #[test]
    fn test_executed_trade_rate() {
        let trade = Trade::executed(USDC, WETH, 100.0, 5.0);
        assert!(trade.success);
        assert_eq!(trade.exchange_rate, 0.05);
        assert!(trade.error.is_none());
    }

    #[tokio::test]
    async fn test_history_is_oldest_first() {
        let history = TradeHistory::new();
        history.append(Trade::executed(USDC, WETH, 100.0, 5.0)).await;
        history.append(Trade::executed(USDC, WETH, 200.0, 10.0)).await;
        history.append(Trade::executed(USDC, WETH, 300.0, 15.0)).await;

        let all = history.list(None).await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].from_amount, 100.0);
        assert_eq!(all[2].from_amount, 300.0);

        let recent = history.list(Some(2)).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].from_amount, 200.0);
        assert_eq!(recent[1].from_amount, 300.0);
    }

    #[test]
    fn test_log_writer_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.jsonl");
        let writer = TradeLogWriter::new(&path);

        writer.write(&Trade::executed(USDC, WETH, 100.0, 5.0)).unwrap();
        writer
            .write(&Trade::rejected(USDC, WETH, 50.0, "no price".to_string()))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"success\":true"));
        assert!(lines[1].contains("no price"));
    }
}
