//! Capabilities the session consumes.
//!
//! The session never talks to the chain directly. It is handed a [`Connector`]
//! which produces a signer and the two clients, and every action only depends
//! on the smallest trait that covers its call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::coin::{Coin, FeeMode};
use crate::config::Config;
use crate::error::Result;
use crate::session::Mnemonic;

/// Identifier of a mixnode in the mixnet contract
pub type MixId = u32;

/// An account exposed by a signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountData {
    pub address: String,
    pub public_key: Vec<u8>,
}

/// Result of a transaction that made it into a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    pub transaction_hash: String,
    pub height: u64,
    pub gas_wanted: u64,
    pub gas_used: u64,
}

/// A delegation as stored by the mixnet contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRecord {
    pub mix_id: MixId,
    pub owner: String,
    pub amount: Coin,
    pub cumulative_reward_ratio: String,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub proxy: Option<String>,
}

/// Holder of a private key
#[async_trait]
pub trait SignerCapability: Send + Sync {
    async fn accounts(&self) -> Result<Vec<AccountData>>;
}

/// Generic signing and querying client
#[async_trait]
pub trait QueryAndTransferCapability: Send + Sync {
    async fn balance(&self, address: &str, denom: &str) -> Result<Coin>;

    async fn send_tokens(
        &self,
        from: &str,
        to: &str,
        amount: &[Coin],
        fee: FeeMode,
        memo: &str,
    ) -> Result<TxOutcome>;

    async fn withdraw_rewards(
        &self,
        delegator: &str,
        validator: &str,
        fee: FeeMode,
        memo: &str,
    ) -> Result<TxOutcome>;
}

/// Client bound to the mixnet contract and a sender address
#[async_trait]
pub trait DelegationCapability: Send + Sync {
    fn sender(&self) -> &str;

    async fn delegator_delegations(&self, delegator: &str) -> Result<Vec<DelegationRecord>>;

    async fn delegate_to_mixnode(
        &self,
        mix_id: MixId,
        fee: FeeMode,
        funds: &[Coin],
    ) -> Result<TxOutcome>;

    async fn undelegate_from_mixnode(&self, mix_id: MixId, fee: FeeMode) -> Result<TxOutcome>;
}

/// The pair of clients produced by the client half of the connection flow
#[derive(Clone)]
pub struct ConnectedClients {
    pub query: Arc<dyn QueryAndTransferCapability>,
    pub delegation: Arc<dyn DelegationCapability>,
}

/// Builds capabilities out of a mnemonic
#[async_trait]
pub trait Connector: Send + Sync {
    async fn signer(
        &self,
        mnemonic: &Mnemonic,
        config: &Config,
    ) -> Result<Arc<dyn SignerCapability>>;

    async fn clients(&self, mnemonic: &Mnemonic, config: &Config) -> Result<ConnectedClients>;
}
