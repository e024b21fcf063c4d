use serde::Serialize;

use crate::capability::{MixId, TxOutcome};
use crate::coin::{Coin, FeeMode, parse_amount};
use crate::error::{Result, WalletError};
use crate::session::{Activity, LogEntry, WalletSession, report};

/// One line of the undelegate-all log entry
#[derive(Debug, Clone, Serialize)]
struct Undelegation {
    mix_id: MixId,
    #[serde(flatten)]
    tx: TxOutcome,
}

fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WalletError::MissingParameter(name));
    }
    Ok(value)
}

/// Invoking an action returns `Ok(None)` when the session is not ready for it
/// and `Ok(Some(entry))` with the appended log entry once it succeeded.
impl WalletSession {
    pub async fn send_tokens(&self, recipient: &str, amount: &str) -> Result<Option<LogEntry>> {
        let (account, client) = {
            let state = self.lock();
            match (state.account.clone(), state.query.clone()) {
                (Some(account), Some(client)) => (account, client),
                _ => {
                    log::debug!("send ignored, no account or client yet");
                    return Ok(None);
                }
            }
        };
        let recipient = report(Activity::Send, required(recipient, "recipient"))?;
        let amount = report(Activity::Send, parse_amount(amount))?;

        let _flag = self.begin(Activity::Send)?;
        let funds = [Coin::new(amount, self.config.denom.as_str())];
        let tx = report(
            Activity::Send,
            client
                .send_tokens(&account, recipient, &funds, FeeMode::Auto, &self.config.memo)
                .await,
        )?;
        log::info!("sent {} to {recipient} in {}", funds[0], tx.transaction_hash);
        self.record(Activity::Send, &tx).map(Some)
    }

    pub async fn delegate(&self, mix_id: MixId, amount: &str) -> Result<Option<LogEntry>> {
        let Some(client) = self.lock().delegation.clone() else {
            log::debug!("delegate ignored, no mixnet client yet");
            return Ok(None);
        };
        let amount = report(Activity::Delegate, parse_amount(amount))?;

        let _flag = self.begin(Activity::Delegate)?;
        let funds = [Coin::new(amount, self.config.denom.as_str())];
        let tx = report(
            Activity::Delegate,
            client.delegate_to_mixnode(mix_id, FeeMode::Auto, &funds).await,
        )?;
        log::info!("delegated {} to mixnode {mix_id} in {}", funds[0], tx.transaction_hash);
        self.record(Activity::Delegate, &tx).map(Some)
    }

    /// Undelegate every cached delegation, one transaction at a time.
    ///
    /// Stops at the first failure. Transactions already included stay on
    /// chain and nothing is logged for the partial run.
    pub async fn undelegate_all(&self) -> Result<Option<LogEntry>> {
        let (client, delegations) = {
            let state = self.lock();
            let Some(client) = state.delegation.clone() else {
                log::debug!("undelegate ignored, no mixnet client yet");
                return Ok(None);
            };
            (client, state.delegations.clone().unwrap_or_default())
        };

        let _flag = self.begin(Activity::Undelegate)?;
        if delegations.is_empty() {
            log::info!("no delegations to undelegate");
            return Ok(None);
        }

        let mut undelegations = Vec::with_capacity(delegations.len());
        for record in &delegations {
            let tx = report(
                Activity::Undelegate,
                client
                    .undelegate_from_mixnode(record.mix_id, FeeMode::Auto)
                    .await,
            )?;
            log::info!("undelegated from mixnode {} in {}", record.mix_id, tx.transaction_hash);
            undelegations.push(Undelegation {
                mix_id: record.mix_id,
                tx,
            });
        }
        self.record(Activity::Undelegate, &undelegations).map(Some)
    }

    /// Withdraw the connected account's staking rewards from `validator`
    pub async fn withdraw_rewards(&self, validator: &str) -> Result<Option<LogEntry>> {
        let (account, client) = {
            let state = self.lock();
            match (state.account.clone(), state.query.clone()) {
                (Some(account), Some(client)) => (account, client),
                _ => {
                    log::debug!("withdraw ignored, no account or client yet");
                    return Ok(None);
                }
            }
        };
        let validator = report(Activity::Withdraw, required(validator, "validator address"))?;

        let _flag = self.begin(Activity::Withdraw)?;
        let tx = report(
            Activity::Withdraw,
            client
                .withdraw_rewards(&account, validator, FeeMode::Auto, &self.config.memo)
                .await,
        )?;
        log::info!("withdrew rewards from {validator} in {}", tx.transaction_hash);
        self.record(Activity::Withdraw, &tx).map(Some)
    }

    fn record<T: Serialize>(&self, activity: Activity, payload: &T) -> Result<LogEntry> {
        let payload = serde_json::to_string_pretty(payload)?;
        Ok(self.append_log(activity, payload))
    }
}
