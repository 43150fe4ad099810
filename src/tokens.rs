//! Shared token registry
//!
//! Centralizes token metadata (addresses, decimals, symbols) so the venue
//! adapters and the trade engine agree on what a token is. Metadata is
//! best-effort: unknown tokens still trade and price normally, they just
//! have no symbol and default decimals.

use alloy::primitives::{address, Address};
use std::collections::HashMap;

/// Token metadata
#[derive(Debug, Clone, Copy)]
pub struct TokenInfo {
    /// Token symbol (e.g., "USDC", "WETH")
    pub symbol: &'static str,
    /// Number of decimals
    pub decimals: u8,
    /// Whether this is a stablecoin (pegged to $1)
    pub is_stablecoin: bool,
}

impl TokenInfo {
    /// Create a stablecoin token info
    pub const fn stablecoin(symbol: &'static str, decimals: u8) -> Self {
        Self {
            symbol,
            decimals,
            is_stablecoin: true,
        }
    }

    /// Create a non-stablecoin token info
    pub const fn token(symbol: &'static str, decimals: u8) -> Self {
        Self {
            symbol,
            decimals,
            is_stablecoin: false,
        }
    }
}

/// Well-known token addresses (Ethereum mainnet)
pub mod addresses {
    use super::*;

    pub const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    pub const USDT: Address = address!("dac17f958d2ee523a2206206994597c13d831ec7");
    pub const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
    pub const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    pub const WBTC: Address = address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599");
}

/// The canonical stable reference asset for pair selection
pub const CANONICAL_STABLE: Address = addresses::USDC;

/// The canonical native (wrapped) asset, the fallback quote currency
pub const CANONICAL_NATIVE: Address = addresses::WETH;

/// Token registry providing token info lookups
pub struct TokenRegistry {
    tokens: HashMap<Address, TokenInfo>,
}

impl TokenRegistry {
    /// Create a new token registry with all known tokens
    pub fn new() -> Self {
        use addresses::*;

        let mut tokens = HashMap::new();

        tokens.insert(USDC, TokenInfo::stablecoin("USDC", 6));
        tokens.insert(USDT, TokenInfo::stablecoin("USDT", 6));
        tokens.insert(DAI, TokenInfo::stablecoin("DAI", 18));

        tokens.insert(WETH, TokenInfo::token("WETH", 18));
        tokens.insert(WBTC, TokenInfo::token("WBTC", 8));

        Self { tokens }
    }

    /// Get token info by address
    pub fn get(&self, address: &Address) -> Option<&TokenInfo> {
        self.tokens.get(address)
    }

    /// Get token info by address string (handles lowercase comparison)
    pub fn get_by_str(&self, address: &str) -> Option<&TokenInfo> {
        let addr = address.parse::<Address>().ok()?;
        self.get(&addr)
    }

    /// Symbol for an address, or a shortened hex form for unknown tokens
    pub fn symbol_or_short(&self, address: &Address) -> String {
        match self.get(address) {
            Some(info) => info.symbol.to_string(),
            None => {
                let hex = address.to_string();
                format!("{}…{}", &hex[..6], &hex[hex.len() - 4..])
            }
        }
    }

    /// Check if an address is a known stablecoin
    pub fn is_stablecoin(&self, address: &Address) -> bool {
        self.tokens
            .get(address)
            .map(|t| t.is_stablecoin)
            .unwrap_or(false)
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global token registry (lazy initialized)
static REGISTRY: std::sync::OnceLock<TokenRegistry> = std::sync::OnceLock::new();

/// Get the global token registry
pub fn registry() -> &'static TokenRegistry {
    REGISTRY.get_or_init(TokenRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usdc_is_stablecoin() {
        let registry = TokenRegistry::new();
        assert!(registry.is_stablecoin(&addresses::USDC));
        assert!(registry.is_stablecoin(&addresses::USDT));
        assert!(registry.is_stablecoin(&addresses::DAI));
    }

    #[test]
    fn test_weth_not_stablecoin() {
        let registry = TokenRegistry::new();
        assert!(!registry.is_stablecoin(&addresses::WETH));
        assert!(!registry.is_stablecoin(&addresses::WBTC));
    }

    #[test]
    fn test_token_info() {
        let registry = TokenRegistry::new();

        let usdc = registry.get(&addresses::USDC).unwrap();
        assert_eq!(usdc.symbol, "USDC");
        assert_eq!(usdc.decimals, 6);
        assert!(usdc.is_stablecoin);

        let weth = registry.get(&addresses::WETH).unwrap();
        assert_eq!(weth.symbol, "WETH");
        assert_eq!(weth.decimals, 18);
        assert!(!weth.is_stablecoin);
    }

    #[test]
    fn test_unknown_token_symbol_shortened() {
        let registry = TokenRegistry::new();
        let unknown = address!("1111111111111111111111111111111111111111");
        let symbol = registry.symbol_or_short(&unknown);
        assert!(symbol.starts_with("0x1111"));
        assert!(symbol.len() < 15);
    }

    #[test]
    fn test_canonical_assets_registered() {
        let registry = TokenRegistry::new();
        assert!(registry.is_stablecoin(&CANONICAL_STABLE));
        assert!(registry.get(&CANONICAL_NATIVE).is_some());
    }

    #[test]
    fn test_global_registry() {
        let reg = registry();
        assert!(reg.get(&addresses::USDC).is_some());
        assert!(reg.get_by_str("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").is_some());
    }
}
