//! Paper trading CLI
//!
//! Thin front end over the library: resolve a price, execute a simulated
//! trade, or inspect balances and history.

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dex_paper_trader::tokens::{addresses, registry};
use dex_paper_trader::{
    BalanceLedger, Config, Error, JsonFileStore, PriceAggregator, Result, TradeEngine,
    TradeLogWriter,
};

/// Starting balance when no ledger state file is configured
const SEED_USDC_BALANCE: f64 = 10_000.0;

#[derive(Parser)]
#[command(name = "dex-paper")]
#[command(about = "Simulated DEX spot trading against live venue prices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the current USD price of a token
    Price {
        /// Token address or a well-known symbol (USDC, WETH, ...)
        token: String,
    },

    /// Execute a simulated trade
    Trade {
        /// Token to sell
        from: String,

        /// Token to buy
        to: String,

        /// Amount of the source token to convert
        amount: f64,
    },

    /// List current balances
    Balances,

    /// List recorded trades, oldest first
    Trades {
        /// Only the most recent N trades
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = Config::from_env();
    config.endpoints.validate()?;

    let aggregator = Arc::new(PriceAggregator::from_config(&config));
    let ledger = Arc::new(build_ledger(&config).await?);
    let mut engine = TradeEngine::new(aggregator.clone(), ledger.clone());
    if let Some(ref path) = config.trade_log_path {
        engine = engine.with_trade_log(TradeLogWriter::new(path));
    }

    match cli.command {
        Commands::Price { token } => {
            let token = parse_token(&token)?;
            match aggregator.get_price(token).await {
                Some(quote) => println!("{}", serde_json::to_string_pretty(&quote)?),
                None => println!("no venue produced a price for {token}"),
            }
        }

        Commands::Trade { from, to, amount } => {
            let from = parse_token(&from)?;
            let to = parse_token(&to)?;
            let result = engine.execute_trade(from, to, amount).await;
            if let Some(error) = result.error {
                return Err(error);
            }
            if let Some(trade) = result.trade {
                println!("{}", serde_json::to_string_pretty(&trade)?);
            }
        }

        Commands::Balances => {
            let tokens = registry();
            let mut balances = ledger.list_balances().await;
            balances.sort_by_key(|(token, _)| *token);
            if balances.is_empty() {
                println!("no balances");
            }
            for (token, amount) in balances {
                println!("{:>12.6}  {}  ({token})", amount, tokens.symbol_or_short(&token));
            }
        }

        Commands::Trades { limit } => {
            for trade in engine.list_trades(limit).await {
                println!("{}", serde_json::to_string(&trade)?);
            }
        }

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn build_ledger(config: &Config) -> Result<BalanceLedger> {
    match config.ledger_state_file {
        Some(ref path) => BalanceLedger::load(Arc::new(JsonFileStore::new(path)))
            .await
            .map_err(|e| Error::Config(format!("failed to load ledger state from {path}: {e}"))),
        None => {
            let mut seed = HashMap::new();
            seed.insert(addresses::USDC, SEED_USDC_BALANCE);
            Ok(BalanceLedger::with_balances(seed))
        }
    }
}

/// Accept a raw address or one of the well-known symbols
fn parse_token(input: &str) -> Result<Address> {
    let symbol_match = match input.to_uppercase().as_str() {
        "USDC" => Some(addresses::USDC),
        "USDT" => Some(addresses::USDT),
        "DAI" => Some(addresses::DAI),
        "WETH" => Some(addresses::WETH),
        "WBTC" => Some(addresses::WBTC),
        _ => None,
    };
    if let Some(token) = symbol_match {
        return Ok(token);
    }
    input
        .parse::<Address>()
        .map_err(|e| Error::InvalidToken(format!("{input}: {e}")))
}
