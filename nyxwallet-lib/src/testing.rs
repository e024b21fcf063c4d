//! Capability doubles for session tests.
//!
//! `MockChain` plays both clients. Every call is recorded, can be made to
//! fail by name, and can be held open with a [`Gate`] so tests can observe
//! the session while a request is in flight.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use crate::capability::{
    AccountData, ConnectedClients, Connector, DelegationCapability, DelegationRecord, MixId,
    QueryAndTransferCapability, SignerCapability, TxOutcome,
};
use crate::coin::{Coin, FeeMode};
use crate::config::Config;
use crate::error::{Result, WalletError};
use crate::session::Mnemonic;

pub const ACCOUNT: &str = "n1testaccount";
pub const SENDER: &str = "n1testsender";

/// Holds calls until the test releases them
pub struct Gate {
    entered: Notify,
    release: Semaphore,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
        })
    }

    async fn pass(&self) {
        self.entered.notify_one();
        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
    }

    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self, calls: usize) {
        self.release.add_permits(calls);
    }
}

pub struct MockChain {
    pub balance: Mutex<Coin>,
    pub delegations: Mutex<Vec<DelegationRecord>>,
    pub calls: Mutex<Vec<String>>,
    pub failing: Mutex<HashSet<&'static str>>,
    pub gate: Mutex<Option<Arc<Gate>>>,
    pub balance_queries: AtomicUsize,
    pub delegation_queries: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    next_height: AtomicUsize,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            balance: Mutex::new(Coin::new(0, "unym")),
            delegations: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            gate: Mutex::new(None),
            balance_queries: AtomicUsize::new(0),
            delegation_queries: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            next_height: AtomicUsize::new(100),
        }
    }
}

pub fn delegation(mix_id: MixId, amount: u128) -> DelegationRecord {
    DelegationRecord {
        mix_id,
        owner: SENDER.to_string(),
        amount: Coin::new(amount, "unym"),
        cumulative_reward_ratio: "0.000001".to_string(),
        height: 10,
        proxy: None,
    }
}

impl MockChain {
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn hold_with(&self, gate: Arc<Gate>) {
        *self.gate.lock().unwrap() = Some(gate);
    }

    pub fn set_delegations(&self, records: Vec<DelegationRecord>) {
        *self.delegations.lock().unwrap() = records;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, op: &'static str, call: String) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(op) {
            return Err(WalletError::MalformedResponse(format!("{op} failed")));
        }
        Ok(())
    }

    fn outcome(&self) -> TxOutcome {
        let height = self.next_height.fetch_add(1, Ordering::SeqCst) as u64;
        TxOutcome {
            transaction_hash: format!("HASH{height}"),
            height,
            gas_wanted: 140_000,
            gas_used: 100_000,
        }
    }
}

#[async_trait]
impl QueryAndTransferCapability for MockChain {
    async fn balance(&self, address: &str, denom: &str) -> Result<Coin> {
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        self.enter("balance", format!("balance {address} {denom}")).await?;
        Ok(self.balance.lock().unwrap().clone())
    }

    async fn send_tokens(
        &self,
        from: &str,
        to: &str,
        amount: &[Coin],
        _fee: FeeMode,
        memo: &str,
    ) -> Result<TxOutcome> {
        let amount: Vec<String> = amount.iter().map(|c| format!("{}{}", c.amount, c.denom)).collect();
        self.enter("send", format!("send {from} {to} {} {memo}", amount.join(",")))
            .await?;
        Ok(self.outcome())
    }

    async fn withdraw_rewards(
        &self,
        delegator: &str,
        validator: &str,
        _fee: FeeMode,
        _memo: &str,
    ) -> Result<TxOutcome> {
        self.enter("withdraw", format!("withdraw {delegator} {validator}"))
            .await?;
        Ok(self.outcome())
    }
}

#[async_trait]
impl DelegationCapability for MockChain {
    fn sender(&self) -> &str {
        SENDER
    }

    async fn delegator_delegations(&self, delegator: &str) -> Result<Vec<DelegationRecord>> {
        self.delegation_queries.fetch_add(1, Ordering::SeqCst);
        self.enter("delegations", format!("delegations {delegator}")).await?;
        Ok(self.delegations.lock().unwrap().clone())
    }

    async fn delegate_to_mixnode(
        &self,
        mix_id: MixId,
        _fee: FeeMode,
        funds: &[Coin],
    ) -> Result<TxOutcome> {
        let funds: Vec<String> = funds.iter().map(|c| format!("{}{}", c.amount, c.denom)).collect();
        self.enter("delegate", format!("delegate {mix_id} {}", funds.join(",")))
            .await?;
        Ok(self.outcome())
    }

    async fn undelegate_from_mixnode(&self, mix_id: MixId, _fee: FeeMode) -> Result<TxOutcome> {
        self.enter("undelegate", format!("undelegate {mix_id}")).await?;
        Ok(self.outcome())
    }
}

struct MockSigner {
    accounts: Vec<AccountData>,
}

#[async_trait]
impl SignerCapability for MockSigner {
    async fn accounts(&self) -> Result<Vec<AccountData>> {
        Ok(self.accounts.clone())
    }
}

pub struct MockConnector {
    pub chain: Arc<MockChain>,
    pub address: Mutex<String>,
    pub fail_signer: bool,
    pub fail_clients: bool,
    pub no_accounts: bool,
    pub client_builds: AtomicUsize,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self {
            chain: Arc::new(MockChain::default()),
            address: Mutex::new(ACCOUNT.to_string()),
            fail_signer: false,
            fail_clients: false,
            no_accounts: false,
            client_builds: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn signer(
        &self,
        mnemonic: &Mnemonic,
        _config: &Config,
    ) -> Result<Arc<dyn SignerCapability>> {
        if self.fail_signer {
            return Err(WalletError::InvalidMnemonic(format!(
                "{} words",
                mnemonic.word_count()
            )));
        }
        let accounts = if self.no_accounts {
            Vec::new()
        } else {
            vec![AccountData {
                address: self.address.lock().unwrap().clone(),
                public_key: vec![2; 33],
            }]
        };
        Ok(Arc::new(MockSigner { accounts }))
    }

    async fn clients(&self, _mnemonic: &Mnemonic, _config: &Config) -> Result<ConnectedClients> {
        if self.fail_clients {
            return Err(WalletError::UnexpectedStatus {
                endpoint: "mock".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.client_builds.fetch_add(1, Ordering::SeqCst);
        Ok(ConnectedClients {
            query: self.chain.clone(),
            delegation: self.chain.clone(),
        })
    }
}
