use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

use crate::capability::{Connector, DelegationCapability, DelegationRecord, QueryAndTransferCapability};
use crate::coin::Coin;
use crate::config::Config;
use crate::error::{Result, WalletError};

/// Secret phrase. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Mnemonic(String);

impl Mnemonic {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self(phrase.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mnemonic(<{} words redacted>)", self.word_count())
    }
}

/// Every async activity the session can have in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    Account,
    Clients,
    Balance,
    Delegations,
    Send,
    Delegate,
    Undelegate,
    Withdraw,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activity::Account => "account derivation",
            Activity::Clients => "client connection",
            Activity::Balance => "balance refresh",
            Activity::Delegations => "delegation refresh",
            Activity::Send => "send tokens",
            Activity::Delegate => "delegate",
            Activity::Undelegate => "undelegate all",
            Activity::Withdraw => "withdraw rewards",
        };
        f.write_str(name)
    }
}

/// One flag per activity, true only while that activity is running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub account: bool,
    pub clients: bool,
    pub balance: bool,
    pub delegations: bool,
    pub send: bool,
    pub delegate: bool,
    pub undelegate: bool,
    pub withdraw: bool,
}

impl LoadingFlags {
    pub fn get(&self, activity: Activity) -> bool {
        match activity {
            Activity::Account => self.account,
            Activity::Clients => self.clients,
            Activity::Balance => self.balance,
            Activity::Delegations => self.delegations,
            Activity::Send => self.send,
            Activity::Delegate => self.delegate,
            Activity::Undelegate => self.undelegate,
            Activity::Withdraw => self.withdraw,
        }
    }

    fn slot(&mut self, activity: Activity) -> &mut bool {
        match activity {
            Activity::Account => &mut self.account,
            Activity::Clients => &mut self.clients,
            Activity::Balance => &mut self.balance,
            Activity::Delegations => &mut self.delegations,
            Activity::Send => &mut self.send,
            Activity::Delegate => &mut self.delegate,
            Activity::Undelegate => &mut self.undelegate,
            Activity::Withdraw => &mut self.withdraw,
        }
    }

    /// True while any part of the connection is still being established
    pub fn connecting(&self) -> bool {
        self.account || self.clients || self.balance
    }
}

/// A completed action, as shown in the activity log
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub activity: Activity,
    pub payload: String,
}

/// Append-only log that evicts its oldest entry once full
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

pub(crate) struct SessionState {
    pub(crate) mnemonic: Option<Mnemonic>,
    pub(crate) account: Option<String>,
    pub(crate) query: Option<Arc<dyn QueryAndTransferCapability>>,
    pub(crate) delegation: Option<Arc<dyn DelegationCapability>>,
    pub(crate) balance: Option<Coin>,
    pub(crate) delegations: Option<Vec<DelegationRecord>>,
    pub(crate) loading: LoadingFlags,
    pub(crate) log: ActivityLog,
    /// Bumped whenever the account or the client pair changes
    pub(crate) epoch: u64,
}

impl SessionState {
    pub(crate) fn raise(&mut self, activity: Activity) -> Result<()> {
        let flag = self.loading.slot(activity);
        if *flag {
            log::warn!("{activity} requested while already in progress");
            return Err(WalletError::AlreadyInFlight(activity));
        }
        *flag = true;
        Ok(())
    }
}

/// Point-in-time copy of the session for rendering
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub has_mnemonic: bool,
    pub account: Option<String>,
    pub sender: Option<String>,
    pub clients_connected: bool,
    pub balance: Option<Coin>,
    pub delegations: Option<Vec<DelegationRecord>>,
    pub loading: LoadingFlags,
    pub log: Vec<LogEntry>,
}

/// Shared handle over the wallet session.
///
/// Clones refer to the same state. The state lock is only held for short
/// synchronous sections and never across a network call.
#[derive(Clone)]
pub struct WalletSession {
    pub(crate) config: Arc<Config>,
    pub(crate) connector: Arc<dyn Connector>,
    state: Arc<Mutex<SessionState>>,
}

/// Clears its activity flag when dropped, whether the call finished or not
pub(crate) struct InFlight {
    state: Arc<Mutex<SessionState>>,
    activity: Activity,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state.loading.slot(self.activity) = false;
    }
}

impl WalletSession {
    pub fn new(config: Config, connector: Arc<dyn Connector>) -> Self {
        let log = ActivityLog::with_capacity(config.log_capacity);
        Self {
            config: Arc::new(config),
            connector,
            state: Arc::new(Mutex::new(SessionState {
                mnemonic: None,
                account: None,
                query: None,
                delegation: None,
                balance: None,
                delegations: None,
                loading: LoadingFlags::default(),
                log,
                epoch: 0,
            })),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Guard clearing the flag of an activity that was raised under the lock
    pub(crate) fn guard(&self, activity: Activity) -> InFlight {
        InFlight {
            state: Arc::clone(&self.state),
            activity,
        }
    }

    /// Raise the flag for `activity`, refusing if it is already raised
    pub(crate) fn begin(&self, activity: Activity) -> Result<InFlight> {
        self.lock().raise(activity)?;
        Ok(self.guard(activity))
    }

    pub(crate) fn append_log(&self, activity: Activity, payload: String) -> LogEntry {
        let entry = LogEntry {
            timestamp: Local::now(),
            activity,
            payload,
        };
        self.lock().log.push(entry.clone());
        entry
    }

    pub fn loading(&self) -> LoadingFlags {
        self.lock().loading
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            has_mnemonic: state.mnemonic.is_some(),
            account: state.account.clone(),
            sender: state.delegation.as_ref().map(|client| client.sender().to_string()),
            clients_connected: state.query.is_some() && state.delegation.is_some(),
            balance: state.balance.clone(),
            delegations: state.delegations.clone(),
            loading: state.loading,
            log: state.log.iter().cloned().collect(),
        }
    }
}

/// Log a failed activity to the diagnostic sink and pass the result through
pub(crate) fn report<T>(activity: Activity, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        log::error!("{activity} failed: {err}");
    }
    result
}
