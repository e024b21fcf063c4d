use std::sync::Arc;

use async_trait::async_trait;
use cosmrs::AccountId;
use cosmrs::cosmwasm::MsgExecuteContract;
use cosmrs::tx::Msg;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::{DelegationCapability, DelegationRecord, MixId, TxOutcome};
use crate::coin::{Coin, FeeMode};
use crate::error::{Result, WalletError};
use crate::nyxd::NyxdClient;

/// Page size requested from the contract when listing delegations
const DELEGATIONS_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MixnetExecuteMsg {
    DelegateToMixnode { mix_id: MixId },
    UndelegateFromMixnode { mix_id: MixId },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MixnetQueryMsg {
    GetDelegatorDelegations {
        delegator: String,
        start_after: Option<Value>,
        limit: Option<u32>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagedDelegatorDelegations {
    pub delegations: Vec<DelegationRecord>,
    #[serde(default)]
    pub start_next_after: Option<Value>,
}

/// Client bound to the mixnet contract
pub struct MixnetClient {
    nyxd: Arc<NyxdClient>,
    sender: String,
    contract: String,
}

impl MixnetClient {
    pub fn new(nyxd: Arc<NyxdClient>, sender: impl Into<String>, contract: impl Into<String>) -> Self {
        Self {
            nyxd,
            sender: sender.into(),
            contract: contract.into(),
        }
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    async fn execute(
        &self,
        msg: &MixnetExecuteMsg,
        fee: FeeMode,
        memo: &str,
        funds: &[Coin],
    ) -> Result<TxOutcome> {
        let contract: AccountId = self
            .contract
            .parse()
            .map_err(WalletError::transaction)?;
        let execute = MsgExecuteContract {
            sender: self.nyxd.address().clone(),
            contract,
            msg: serde_json::to_vec(msg)?,
            funds: funds
                .iter()
                .map(Coin::to_cosmos)
                .collect::<Result<Vec<_>>>()?,
        };
        let any = execute.to_any().map_err(WalletError::transaction)?;
        self.nyxd.sign_and_broadcast(vec![any], fee, memo).await
    }
}

#[async_trait]
impl DelegationCapability for MixnetClient {
    fn sender(&self) -> &str {
        &self.sender
    }

    async fn delegator_delegations(&self, delegator: &str) -> Result<Vec<DelegationRecord>> {
        let mut delegations = Vec::new();
        let mut start_after = None;
        loop {
            let query = serde_json::to_value(MixnetQueryMsg::GetDelegatorDelegations {
                delegator: delegator.to_string(),
                start_after: start_after.take(),
                limit: Some(DELEGATIONS_PAGE_LIMIT),
            })?;
            let page: PagedDelegatorDelegations =
                self.nyxd.query_contract(&self.contract, &query).await?;
            delegations.extend(page.delegations);
            match page.start_next_after {
                Some(next) if !next.is_null() => start_after = Some(next),
                _ => break,
            }
        }
        log::debug!("{} delegations for {delegator}", delegations.len());
        Ok(delegations)
    }

    async fn delegate_to_mixnode(
        &self,
        mix_id: MixId,
        fee: FeeMode,
        funds: &[Coin],
    ) -> Result<TxOutcome> {
        let msg = MixnetExecuteMsg::DelegateToMixnode { mix_id };
        self.execute(&msg, fee, "Mixnet::DelegateToMixnode", funds).await
    }

    async fn undelegate_from_mixnode(&self, mix_id: MixId, fee: FeeMode) -> Result<TxOutcome> {
        let msg = MixnetExecuteMsg::UndelegateFromMixnode { mix_id };
        self.execute(&msg, fee, "Mixnet::UndelegateFromMixnode", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn execute_messages_use_contract_casing() {
        let delegate = serde_json::to_value(MixnetExecuteMsg::DelegateToMixnode { mix_id: 7 }).unwrap();
        assert_eq!(delegate, json!({ "delegate_to_mixnode": { "mix_id": 7 } }));

        let undelegate =
            serde_json::to_value(MixnetExecuteMsg::UndelegateFromMixnode { mix_id: 7 }).unwrap();
        assert_eq!(undelegate, json!({ "undelegate_from_mixnode": { "mix_id": 7 } }));
    }

    #[test]
    fn delegations_query_shape() {
        let query = serde_json::to_value(MixnetQueryMsg::GetDelegatorDelegations {
            delegator: "n1owner".to_string(),
            start_after: None,
            limit: Some(DELEGATIONS_PAGE_LIMIT),
        })
        .unwrap();
        assert_eq!(
            query,
            json!({
                "get_delegator_delegations": {
                    "delegator": "n1owner",
                    "start_after": null,
                    "limit": 100
                }
            })
        );
    }

    #[test]
    fn parses_contract_page() {
        let page: PagedDelegatorDelegations = serde_json::from_value(json!({
            "delegations": [{
                "owner": "n1owner",
                "mix_id": 12,
                "cumulative_reward_ratio": "0.000012",
                "amount": { "denom": "unym", "amount": "5000000" },
                "height": 1234,
                "proxy": null
            }],
            "start_next_after": [12, "n1owner"]
        }))
        .unwrap();
        assert_eq!(page.delegations.len(), 1);
        assert_eq!(page.delegations[0].mix_id, 12);
        assert_eq!(page.delegations[0].amount, Coin::new(5_000_000, "unym"));
        assert_eq!(page.start_next_after, Some(json!([12, "n1owner"])));
    }
}
