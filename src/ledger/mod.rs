//! In-memory balance ledger
//!
//! The authoritative record of token balances. Every quantity is
//! non-negative at all times: mutations validate and apply under a single
//! write-lock acquisition, so a debit that would overdraw fails atomically
//! and leaves the ledger untouched. This also closes the stale-check race
//! between concurrent trades: both may pass an advisory balance read, but
//! the second debit re-validates against the live balance and fails instead
//! of going negative.

mod store;

pub use store::{BalanceStore, JsonFileStore};

use alloy::primitives::Address;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};

pub struct BalanceLedger {
    balances: RwLock<HashMap<Address, f64>>,
    store: Option<Arc<dyn BalanceStore>>,
}

impl BalanceLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    /// Create a ledger seeded with initial balances
    pub fn with_balances(balances: HashMap<Address, f64>) -> Self {
        Self {
            balances: RwLock::new(balances),
            store: None,
        }
    }

    /// Attach a durable store; mutations are mirrored into it
    pub fn with_store(mut self, store: Arc<dyn BalanceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Load a ledger from a durable store
    pub async fn load(store: Arc<dyn BalanceStore>) -> std::io::Result<Self> {
        let balances = store.load_all().await?;
        Ok(Self {
            balances: RwLock::new(balances),
            store: Some(store),
        })
    }

    /// Current balance for a token; unknown tokens read as zero
    pub async fn get_balance(&self, token: Address) -> f64 {
        self.balances
            .read()
            .await
            .get(&token)
            .copied()
            .unwrap_or(0.0)
    }

    /// Add to a token's balance
    pub async fn credit(&self, token: Address, amount: f64) -> Result<()> {
        validate_amount(amount)?;
        let new_balance = {
            let mut balances = self.balances.write().await;
            let balance = balances.entry(token).or_insert(0.0);
            *balance += amount;
            *balance
        };
        self.persist(token, new_balance).await;
        Ok(())
    }

    /// Remove from a token's balance; fails atomically on overdraw
    pub async fn debit(&self, token: Address, amount: f64) -> Result<()> {
        validate_amount(amount)?;
        let new_balance = {
            let mut balances = self.balances.write().await;
            let available = balances.get(&token).copied().unwrap_or(0.0);
            if amount > available {
                return Err(Error::InsufficientBalance {
                    requested: amount,
                    available,
                });
            }
            let new_balance = available - amount;
            if new_balance == 0.0 {
                balances.remove(&token);
            } else {
                balances.insert(token, new_balance);
            }
            new_balance
        };
        self.persist(token, new_balance).await;
        Ok(())
    }

    /// Overwrite a token's balance
    pub async fn set_balance(&self, token: Address, amount: f64) -> Result<()> {
        validate_amount(amount)?;
        {
            let mut balances = self.balances.write().await;
            if amount == 0.0 {
                balances.remove(&token);
            } else {
                balances.insert(token, amount);
            }
        }
        self.persist(token, amount).await;
        Ok(())
    }

    /// Snapshot of all non-zero balances, in unspecified order
    pub async fn list_balances(&self) -> Vec<(Address, f64)> {
        self.balances
            .read()
            .await
            .iter()
            .filter(|(_, &amount)| amount != 0.0)
            .map(|(&token, &amount)| (token, amount))
            .collect()
    }

    async fn persist(&self, token: Address, quantity: f64) {
        if let Some(ref store) = self.store {
            if let Err(e) = store.save(token, quantity).await {
                tracing::warn!(%token, error = %e, "failed to persist balance");
            }
        }
    }
}

impl Default for BalanceLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(Error::InvalidAmount(format!("{amount} is not finite")));
    }
    if amount < 0.0 {
        return Err(Error::InvalidAmount(format!("{amount} is negative")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    #[tokio::test]
    async fn test_unknown_token_reads_zero() {
        let ledger = BalanceLedger::new();
        assert_eq!(ledger.get_balance(USDC).await, 0.0);
    }

    #[tokio::test]
    async fn test_credit_and_debit() {
        let ledger = BalanceLedger::new();
        ledger.credit(USDC, 1000.0).await.unwrap();
        assert_eq!(ledger.get_balance(USDC).await, 1000.0);

        ledger.debit(USDC, 300.0).await.unwrap();
        assert_eq!(ledger.get_balance(USDC).await, 700.0);
    }

    #[tokio::test]
    async fn test_overdraw_fails_atomically() {
        let ledger = BalanceLedger::new();
        ledger.set_balance(USDC, 10.0).await.unwrap();

        let result = ledger.debit(USDC, 15.0).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientBalance {
                requested,
                available
            }) if requested == 15.0 && available == 10.0
        ));
        assert_eq!(ledger.get_balance(USDC).await, 10.0);
    }

    #[tokio::test]
    async fn test_negative_amounts_rejected() {
        let ledger = BalanceLedger::new();
        assert!(matches!(
            ledger.credit(USDC, -1.0).await,
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.debit(USDC, -1.0).await,
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.set_balance(USDC, -1.0).await,
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.credit(USDC, f64::NAN).await,
            Err(Error::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_debit_to_zero_prunes_entry() {
        let ledger = BalanceLedger::new();
        ledger.set_balance(USDC, 50.0).await.unwrap();
        ledger.debit(USDC, 50.0).await.unwrap();

        assert_eq!(ledger.get_balance(USDC).await, 0.0);
        assert!(ledger.list_balances().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_balances() {
        let ledger = BalanceLedger::new();
        ledger.set_balance(USDC, 1000.0).await.unwrap();
        ledger.set_balance(WETH, 2.5).await.unwrap();

        let mut balances = ledger.list_balances().await;
        balances.sort_by_key(|(token, _)| *token);
        assert_eq!(balances.len(), 2);
        assert!(balances.contains(&(USDC, 1000.0)));
        assert!(balances.contains(&(WETH, 2.5)));
    }

    #[tokio::test]
    async fn test_zero_credit_is_noop() {
        let ledger = BalanceLedger::new();
        ledger.credit(USDC, 0.0).await.unwrap();
        assert_eq!(ledger.get_balance(USDC).await, 0.0);
    }

    #[tokio::test]
    async fn test_store_mirrors_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("balances.json");
        let store = Arc::new(JsonFileStore::new(&path));
        let ledger = BalanceLedger::new().with_store(store.clone());

        ledger.credit(USDC, 1000.0).await.unwrap();
        ledger.debit(USDC, 400.0).await.unwrap();

        let reloaded = BalanceLedger::load(store).await.unwrap();
        assert_eq!(reloaded.get_balance(USDC).await, 600.0);
    }
}
