use std::io;
use std::result::Result as StdResult;
use thiserror::Error;

use crate::contract::SellPhase;

#[derive(Debug, Error)]
pub enum Error {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("API invalid data: {0}")]
    ApiInvalidData(String),
    #[error("API invalid format: {0}")]
    ApiInvalidFormat(String),
    #[error("API authentication failed: {0}")]
    ApiAuthFailed(String),
    #[error("Session expired: {0}")]
    SessionExpired(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Contract error: {0}")]
    ContractError(String),
    #[error("Trading is not enabled on this bonding curve")]
    TradingDisabled,
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
    #[error("Creation event missing from receipt logs: {0}")]
    MissingCreationEvent(String),
    #[error("Sell interrupted during {phase:?}: {reason}")]
    SellInterrupted { phase: SellPhase, reason: String },
    #[error("Solana RPC error: {0}")]
    SolanaRpcError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ApiInvalidFormat(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::ParseError(format!("transaction deserialization failed: {}", err))
    }
}

impl From<bs58::decode::Error> for Error {
    fn from(err: bs58::decode::Error) -> Self {
        Error::ParseError(format!("base58 decode failed: {}", err))
    }
}

pub type Result<T> = StdResult<T, Error>;
