//! Balance persistence seam
//!
//! Durability is an external concern: the ledger calls into a
//! [`BalanceStore`] after each mutation when one is configured, and store
//! failures never fail the mutation itself. [`JsonFileStore`] is the
//! shipped implementation, a single JSON file of address -> quantity.

use alloy::primitives::Address;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Durable backing for ledger balances
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Load every persisted balance
    async fn load_all(&self) -> std::io::Result<HashMap<Address, f64>>;

    /// Load one token's persisted quantity
    async fn load(&self, token: Address) -> std::io::Result<Option<f64>> {
        Ok(self.load_all().await?.get(&token).copied())
    }

    /// Persist one token's quantity
    async fn save(&self, token: Address, quantity: f64) -> std::io::Result<()>;
}

/// JSON-file-backed balance store
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    write_guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    async fn read_map(&self) -> std::io::Result<HashMap<Address, f64>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl BalanceStore for JsonFileStore {
    async fn load_all(&self) -> std::io::Result<HashMap<Address, f64>> {
        self.read_map().await
    }

    async fn save(&self, token: Address, quantity: f64) -> std::io::Result<()> {
        let _guard = self.write_guard.lock().await;
        let mut balances = self.read_map().await?;
        if quantity == 0.0 {
            balances.remove(&token);
        } else {
            balances.insert(token, quantity);
        }
        let content = serde_json::to_string_pretty(&balances)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(&self.path, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("balances.json"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("balances.json"));

        store.save(USDC, 1000.0).await.unwrap();
        store.save(WETH, 2.5).await.unwrap();

        let balances = store.load_all().await.unwrap();
        assert_eq!(balances.get(&USDC), Some(&1000.0));
        assert_eq!(balances.get(&WETH), Some(&2.5));
        assert_eq!(store.load(USDC).await.unwrap(), Some(1000.0));
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("balances.json"));

        store.save(USDC, 1000.0).await.unwrap();
        store.save(USDC, 0.0).await.unwrap();

        assert!(store.load_all().await.unwrap().is_empty());
    }
}
