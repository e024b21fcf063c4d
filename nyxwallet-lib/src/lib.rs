//! Wallet session for the Nyx chain.
//!
//! A [`WalletSession`] derives an account from a mnemonic, connects a query
//! client and a mixnet contract client, caches balance and delegations, and
//! runs the four wallet actions while tracking what is in flight.

mod actions;
mod capability;
mod coin;
mod config;
mod connect;
mod connector;
mod error;
mod mixnet;
mod nyxd;
mod session;
mod signer;

#[cfg(test)]
mod testing;

pub use capability::{
    AccountData, ConnectedClients, Connector, DelegationCapability, DelegationRecord, MixId,
    QueryAndTransferCapability, SignerCapability, TxOutcome,
};
pub use coin::{AUTO_GAS_MULTIPLIER, Coin, FeeMode, GasPrice, parse_amount};
pub use config::Config;
pub use connector::NyxdConnector;
pub use error::{Result, WalletError};
pub use mixnet::MixnetClient;
pub use nyxd::NyxdClient;
pub use session::{Activity, ActivityLog, LoadingFlags, LogEntry, Mnemonic, SessionSnapshot, WalletSession};
pub use signer::HdSigner;
