use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use cosmrs::AccountId;
use cosmrs::bank::MsgSend;
use cosmrs::distribution::MsgWithdrawDelegatorReward;
use cosmrs::tendermint::chain;
use cosmrs::tx::{self, Fee, Msg, SignDoc, SignerInfo};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::OnceCell;

use crate::capability::{QueryAndTransferCapability, TxOutcome};
use crate::coin::{Coin, FeeMode, GasPrice};
use crate::config::Config;
use crate::error::{Result, WalletError};
use crate::signer::HdSigner;

const TX_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Signing client talking to the LCD REST endpoint of a Nyx validator
pub struct NyxdClient {
    http: reqwest::Client,
    api_url: String,
    signer: Arc<HdSigner>,
    gas_price: GasPrice,
    broadcast_timeout: Duration,
    chain_id: OnceCell<chain::Id>,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: Coin,
}

#[derive(Debug, Deserialize)]
struct GasInfo {
    gas_used: String,
}

#[derive(Debug, Deserialize)]
struct SimulateResponse {
    gas_info: GasInfo,
}

#[derive(Debug, Deserialize)]
struct LcdTxResponse {
    #[serde(default)]
    height: String,
    txhash: String,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    raw_log: String,
    #[serde(default)]
    gas_wanted: String,
    #[serde(default)]
    gas_used: String,
}

#[derive(Debug, Deserialize)]
struct TxEnvelope {
    tx_response: LcdTxResponse,
}

#[derive(Debug, Deserialize)]
struct SmartQueryResponse<T> {
    data: T,
}

fn parse_u64(field: &str, raw: &str) -> Result<u64> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| WalletError::MalformedResponse(format!("{field} is not a number: {raw:?}")))
}

impl LcdTxResponse {
    fn into_outcome(self) -> Result<TxOutcome> {
        if self.code != 0 {
            return Err(WalletError::TxRejected {
                hash: self.txhash,
                code: self.code,
                raw_log: self.raw_log,
            });
        }
        Ok(TxOutcome {
            height: parse_u64("height", &self.height)?,
            gas_wanted: parse_u64("gas_wanted", &self.gas_wanted)?,
            gas_used: parse_u64("gas_used", &self.gas_used)?,
            transaction_hash: self.txhash,
        })
    }
}

/// Account number and sequence of an account, for plain and vesting accounts alike
fn account_numbers(account: &Value) -> Result<(u64, u64)> {
    const BASES: [&str; 3] = [
        "/account",
        "/account/base_account",
        "/account/base_vesting_account/base_account",
    ];
    for base in BASES {
        let number = account.pointer(&format!("{base}/account_number"));
        let sequence = account.pointer(&format!("{base}/sequence"));
        if let (Some(Value::String(number)), Some(Value::String(sequence))) = (number, sequence) {
            return Ok((
                parse_u64("account_number", number)?,
                parse_u64("sequence", sequence)?,
            ));
        }
    }
    Err(WalletError::MalformedResponse(
        "account has no account_number/sequence".to_string(),
    ))
}

impl NyxdClient {
    pub fn new(config: &Config, signer: Arc<HdSigner>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            signer,
            gas_price: config.gas_price.parse()?,
            broadcast_timeout: Duration::from_secs(config.broadcast_timeout_secs),
            chain_id: OnceCell::new(),
        })
    }

    pub fn address(&self) -> &AccountId {
        self.signer.account_id()
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let endpoint = format!("{}{}", self.api_url, path);
        log::debug!("GET {endpoint}");
        let response = self.http.get(&endpoint).send().await?;
        Self::decode(endpoint, response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let endpoint = format!("{}{}", self.api_url, path);
        log::debug!("POST {endpoint}");
        let response = self.http.post(&endpoint).json(body).send().await?;
        Self::decode(endpoint, response).await
    }

    async fn decode<T: DeserializeOwned>(endpoint: String, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WalletError::UnexpectedStatus {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    pub async fn chain_id(&self) -> Result<&chain::Id> {
        self.chain_id
            .get_or_try_init(|| async {
                let info: Value = self
                    .get_json("/cosmos/base/tendermint/v1beta1/node_info")
                    .await?;
                let network = info
                    .pointer("/default_node_info/network")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        WalletError::MalformedResponse("node_info has no network".to_string())
                    })?;
                network.parse::<chain::Id>().map_err(WalletError::transaction)
            })
            .await
    }

    async fn account_numbers(&self) -> Result<(u64, u64)> {
        let account: Value = self
            .get_json(&format!("/cosmos/auth/v1beta1/accounts/{}", self.address()))
            .await?;
        account_numbers(&account)
    }

    /// Query a CosmWasm contract with a JSON message
    pub async fn query_contract<T: DeserializeOwned>(&self, contract: &str, query: &Value) -> Result<T> {
        let encoded = BASE64.encode(serde_json::to_vec(query)?);
        let path = format!("/cosmwasm/wasm/v1/contract/{contract}/smart/{encoded}");
        let response: SmartQueryResponse<T> = self.get_json(&path).await?;
        Ok(response.data)
    }

    fn sign(
        &self,
        messages: &[cosmrs::Any],
        memo: &str,
        fee: Fee,
        chain_id: &chain::Id,
        account_number: u64,
        sequence: u64,
    ) -> Result<Vec<u8>> {
        let body = tx::Body::new(messages.to_vec(), memo, 0u32);
        let auth_info = SignerInfo::single_direct(Some(self.signer.public_key()), sequence).auth_info(fee);
        let sign_doc = SignDoc::new(&body, &auth_info, chain_id, account_number)
            .map_err(WalletError::transaction)?;
        let signing_key = self.signer.signing_key()?;
        let raw = sign_doc.sign(&signing_key).map_err(WalletError::transaction)?;
        raw.to_bytes().map_err(WalletError::transaction)
    }

    async fn simulate(&self, tx_bytes: &[u8]) -> Result<u64> {
        let response: SimulateResponse = self
            .post_json(
                "/cosmos/tx/v1beta1/simulate",
                &json!({ "tx_bytes": BASE64.encode(tx_bytes) }),
            )
            .await?;
        parse_u64("gas_used", &response.gas_info.gas_used)
    }

    async fn wait_for_inclusion(&self, hash: &str) -> Result<TxOutcome> {
        let deadline = tokio::time::Instant::now() + self.broadcast_timeout;
        loop {
            let endpoint = format!("{}/cosmos/tx/v1beta1/txs/{hash}", self.api_url);
            let response = self.http.get(&endpoint).send().await?;
            if response.status().is_success() {
                let envelope: TxEnvelope = response.json().await?;
                return envelope.tx_response.into_outcome();
            }
            if tokio::time::Instant::now() + TX_POLL_INTERVAL > deadline {
                return Err(WalletError::BroadcastTimeout(hash.to_string()));
            }
            tokio::time::sleep(TX_POLL_INTERVAL).await;
        }
    }

    /// Sign, broadcast and wait for a set of messages to be included in a block
    pub async fn sign_and_broadcast(
        &self,
        messages: Vec<cosmrs::Any>,
        fee: FeeMode,
        memo: &str,
    ) -> Result<TxOutcome> {
        let chain_id = self.chain_id().await?.clone();
        let (account_number, sequence) = self.account_numbers().await?;

        let simulated = match fee {
            FeeMode::Auto => {
                let probe_fee = Fee::from_amount_and_gas(self.gas_price.fee_for(0).to_cosmos()?, 0u64);
                let probe = self.sign(&messages, memo, probe_fee, &chain_id, account_number, sequence)?;
                Some(self.simulate(&probe).await?)
            }
            FeeMode::Fixed(_) => None,
        };
        let gas_limit = fee
            .gas_limit(simulated)
            .ok_or_else(|| WalletError::Transaction("no gas estimate available".to_string()))?;
        let fee_amount = self.gas_price.fee_for(gas_limit);
        log::debug!("gas limit {gas_limit}, fee {fee_amount}");

        let tx_fee = Fee::from_amount_and_gas(fee_amount.to_cosmos()?, gas_limit);
        let tx_bytes = self.sign(&messages, memo, tx_fee, &chain_id, account_number, sequence)?;

        let envelope: TxEnvelope = self
            .post_json(
                "/cosmos/tx/v1beta1/txs",
                &json!({
                    "tx_bytes": BASE64.encode(&tx_bytes),
                    "mode": "BROADCAST_MODE_SYNC",
                }),
            )
            .await?;
        let checked = envelope.tx_response;
        if checked.code != 0 {
            return checked.into_outcome();
        }

        let hash = checked.txhash;
        log::debug!("broadcast {hash}, waiting for inclusion");
        let outcome = self.wait_for_inclusion(&hash).await?;
        log::info!("transaction {} included at height {}", outcome.transaction_hash, outcome.height);
        Ok(outcome)
    }
}

fn parse_account(raw: &str) -> Result<AccountId> {
    raw.parse::<AccountId>().map_err(WalletError::transaction)
}

#[async_trait]
impl QueryAndTransferCapability for NyxdClient {
    async fn balance(&self, address: &str, denom: &str) -> Result<Coin> {
        let response: BalanceResponse = self
            .get_json(&format!(
                "/cosmos/bank/v1beta1/balances/{address}/by_denom?denom={denom}"
            ))
            .await?;
        Ok(response.balance)
    }

    async fn send_tokens(
        &self,
        from: &str,
        to: &str,
        amount: &[Coin],
        fee: FeeMode,
        memo: &str,
    ) -> Result<TxOutcome> {
        let msg = MsgSend {
            from_address: parse_account(from)?,
            to_address: parse_account(to)?,
            amount: amount
                .iter()
                .map(Coin::to_cosmos)
                .collect::<Result<Vec<_>>>()?,
        };
        let any = msg.to_any().map_err(WalletError::transaction)?;
        self.sign_and_broadcast(vec![any], fee, memo).await
    }

    async fn withdraw_rewards(
        &self,
        delegator: &str,
        validator: &str,
        fee: FeeMode,
        memo: &str,
    ) -> Result<TxOutcome> {
        let msg = MsgWithdrawDelegatorReward {
            delegator_address: parse_account(delegator)?,
            validator_address: parse_account(validator)?,
        };
        let any = msg.to_any().map_err(WalletError::transaction)?;
        self.sign_and_broadcast(vec![any], fee, memo).await
    }
}
