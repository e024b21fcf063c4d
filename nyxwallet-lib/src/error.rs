use std::path::PathBuf;

use thiserror::Error;

use crate::session::Activity;

pub type Result<T> = std::result::Result<T, WalletError>;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no config directory available on this platform")]
    NoConfigDir,

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} responded with {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed chain response: {0}")]
    MalformedResponse(String),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("failed to build transaction: {0}")]
    Transaction(String),

    #[error("transaction {hash} rejected with code {code}: {raw_log}")]
    TxRejected {
        hash: String,
        code: u32,
        raw_log: String,
    },

    #[error("transaction {0} was not included before the timeout")]
    BroadcastTimeout(String),

    #[error("invalid gas price {0:?}")]
    InvalidGasPrice(String),

    #[error("invalid amount {0:?}: expected a positive integer")]
    InvalidAmount(String),

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("no mnemonic provided")]
    MissingMnemonic,

    #[error("signer exposes no accounts")]
    NoAccounts,

    #[error("{0} is already in progress")]
    AlreadyInFlight(Activity),
}

impl WalletError {
    pub(crate) fn transaction(err: impl std::fmt::Display) -> Self {
        WalletError::Transaction(err.to_string())
    }

    pub(crate) fn key_derivation(err: impl std::fmt::Display) -> Self {
        WalletError::KeyDerivation(err.to_string())
    }
}
