//! Error types for the paper trading engine

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("insufficient balance: have {available} but need {requested}")]
    InsufficientBalance { requested: f64, available: f64 },

    #[error("no venue produced a price for {0}")]
    PriceUnavailable(Address),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid token address: {0}")]
    InvalidToken(String),

    #[error("venue error: {0}")]
    Venue(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
