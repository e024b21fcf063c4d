use crate::error::{Result, WalletError};
use crate::session::{Activity, Mnemonic, WalletSession, report};

impl WalletSession {
    /// Derive the account and build both clients from `mnemonic`.
    ///
    /// The two halves run concurrently and update the session independently,
    /// so one may succeed while the other fails. The first error is returned
    /// once both have finished.
    pub async fn connect(&self, mnemonic: Mnemonic) -> Result<()> {
        if mnemonic.is_blank() {
            log::warn!("connect requested without a mnemonic");
            return Err(WalletError::MissingMnemonic);
        }
        self.lock().mnemonic = Some(mnemonic.clone());

        let (account, clients) =
            tokio::join!(self.derive_account(&mnemonic), self.connect_clients(&mnemonic));
        account.and(clients)
    }

    async fn derive_account(&self, mnemonic: &Mnemonic) -> Result<()> {
        let _flag = self.begin(Activity::Account)?;
        let result = async {
            let signer = self.connector.signer(mnemonic, &self.config).await?;
            signer
                .accounts()
                .await?
                .into_iter()
                .next()
                .map(|account| account.address)
                .ok_or(WalletError::NoAccounts)
        }
        .await;
        let address = report(Activity::Account, result)?;

        let mut state = self.lock();
        if state.account.as_deref() != Some(address.as_str()) {
            log::info!("account {address}");
            state.account = Some(address);
            state.balance = None;
            state.epoch += 1;
        }
        Ok(())
    }

    async fn connect_clients(&self, mnemonic: &Mnemonic) -> Result<()> {
        let _flag = self.begin(Activity::Clients)?;
        let clients = report(
            Activity::Clients,
            self.connector.clients(mnemonic, &self.config).await,
        )?;

        let mut state = self.lock();
        state.query = Some(clients.query);
        state.delegation = Some(clients.delegation);
        state.balance = None;
        state.delegations = None;
        state.epoch += 1;
        Ok(())
    }

    /// Fetch the balance if account and client are known and nothing is cached.
    /// Returns whether a balance was stored.
    pub async fn refresh_balance(&self) -> Result<bool> {
        let (account, query, epoch, _flag) = {
            let mut state = self.lock();
            let (Some(account), Some(query)) = (state.account.clone(), state.query.clone()) else {
                return Ok(false);
            };
            if state.balance.is_some() || state.loading.balance {
                return Ok(false);
            }
            state.raise(Activity::Balance)?;
            (account, query, state.epoch, self.guard(Activity::Balance))
        };

        let balance = report(
            Activity::Balance,
            query.balance(&account, &self.config.denom).await,
        )?;

        let mut state = self.lock();
        if state.epoch != epoch {
            log::debug!("dropping balance fetched for a replaced account or client");
            return Ok(false);
        }
        log::debug!("balance of {account}: {balance}");
        state.balance = Some(balance);
        Ok(true)
    }

    /// Fetch the delegation list if a delegation client exists and nothing is cached.
    /// Returns whether a list was stored.
    pub async fn refresh_delegations(&self) -> Result<bool> {
        let (client, epoch, _flag) = {
            let mut state = self.lock();
            let Some(client) = state.delegation.clone() else {
                return Ok(false);
            };
            if state.delegations.is_some() || state.loading.delegations {
                return Ok(false);
            }
            state.raise(Activity::Delegations)?;
            (client, state.epoch, self.guard(Activity::Delegations))
        };

        let delegations = report(
            Activity::Delegations,
            client.delegator_delegations(client.sender()).await,
        )?;

        let mut state = self.lock();
        if state.epoch != epoch {
            log::debug!("dropping delegations fetched for a replaced client");
            return Ok(false);
        }
        state.delegations = Some(delegations);
        Ok(true)
    }

    /// Run every refresh whose inputs are available and whose output is not cached
    pub async fn refresh_stale(&self) -> Result<()> {
        let (balance, delegations) = tokio::join!(self.refresh_balance(), self.refresh_delegations());
        balance.and(delegations).map(|_| ())
    }

    /// Forget the cached balance and delegations so the next refresh fetches them again
    pub fn invalidate_cache(&self) {
        let mut state = self.lock();
        state.balance = None;
        state.delegations = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::coin::Coin;
    use crate::config::Config;
    use crate::testing::{ACCOUNT, Gate, MockConnector, SENDER, delegation};

    const PHRASE: &str = "word1 word2 word3 word4 word5 word6 word7 word8 word9 word10 word11 \
        word12 word13 word14 word15 word16 word17 word18 word19 word20 word21 word22 word23 word24";

    fn session_with(connector: MockConnector) -> (WalletSession, Arc<MockConnector>) {
        let connector = Arc::new(connector);
        (WalletSession::new(Config::default(), connector.clone()), connector)
    }

    #[tokio::test]
    async fn connect_then_refresh_yields_account_and_zero_balance() {
        let (session, _) = session_with(MockConnector::default());
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.account.as_deref(), Some(ACCOUNT));
        assert!(snapshot.clients_connected);
        assert!(snapshot.has_mnemonic);
        assert_eq!(snapshot.loading, Default::default());

        session.refresh_stale().await.unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.balance, Some(Coin::new(0, "unym")));
        assert_eq!(snapshot.delegations, Some(vec![]));
        assert_eq!(snapshot.sender.as_deref(), Some(SENDER));
    }

    #[tokio::test]
    async fn blank_mnemonic_is_rejected_without_touching_state() {
        let (session, connector) = session_with(MockConnector::default());
        let err = session.connect(Mnemonic::new("   ")).await.unwrap_err();
        assert!(matches!(err, WalletError::MissingMnemonic));
        assert!(!session.snapshot().has_mnemonic);
        assert_eq!(connector.client_builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_derivation_leaves_account_unset_but_clients_connect() {
        let (session, _) = session_with(MockConnector {
            fail_signer: true,
            ..MockConnector::default()
        });
        let err = session.connect(Mnemonic::new(PHRASE)).await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));

        let snapshot = session.snapshot();
        assert!(snapshot.account.is_none());
        assert!(snapshot.clients_connected);
        assert!(!snapshot.loading.account);
        assert!(!snapshot.loading.clients);

        // no account, so no balance either
        assert!(!session.refresh_balance().await.unwrap());
        assert!(session.snapshot().balance.is_none());
    }

    #[tokio::test]
    async fn failed_client_construction_keeps_account() {
        let (session, _) = session_with(MockConnector {
            fail_clients: true,
            ..MockConnector::default()
        });
        assert!(session.connect(Mnemonic::new(PHRASE)).await.is_err());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.account.as_deref(), Some(ACCOUNT));
        assert!(!snapshot.clients_connected);
    }

    #[tokio::test]
    async fn signer_without_accounts_is_an_error() {
        let (session, _) = session_with(MockConnector {
            no_accounts: true,
            ..MockConnector::default()
        });
        let err = session.connect(Mnemonic::new(PHRASE)).await.unwrap_err();
        assert!(matches!(err, WalletError::NoAccounts));
        assert!(session.snapshot().account.is_none());
    }

    #[tokio::test]
    async fn cached_balance_is_not_refetched() {
        let (session, connector) = session_with(MockConnector::default());
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();

        assert!(session.refresh_balance().await.unwrap());
        *connector.chain.balance.lock().unwrap() = Coin::new(999, "unym");
        assert!(!session.refresh_balance().await.unwrap());
        session.refresh_stale().await.unwrap();

        assert_eq!(connector.chain.balance_queries.load(Ordering::SeqCst), 1);
        assert_eq!(session.snapshot().balance, Some(Coin::new(0, "unym")));
    }

    #[tokio::test]
    async fn concurrent_refreshes_fetch_once() {
        let (session, connector) = session_with(MockConnector::default());
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();

        let gate = Gate::new();
        connector.chain.hold_with(gate.clone());
        let first = tokio::spawn({
            let session = session.clone();
            async move { session.refresh_balance().await }
        });
        gate.wait_entered().await;
        assert!(session.loading().balance);
        assert!(!session.refresh_balance().await.unwrap());

        gate.release(1);
        assert!(first.await.unwrap().unwrap());
        assert!(!session.loading().balance);
        assert_eq!(connector.chain.balance_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnecting_fetches_balance_for_the_new_pair() {
        let (session, connector) = session_with(MockConnector::default());
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();
        session.refresh_stale().await.unwrap();

        *connector.address.lock().unwrap() = "n1otheraccount".to_string();
        *connector.chain.balance.lock().unwrap() = Coin::new(42, "unym");
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();
        assert!(session.snapshot().balance.is_none());

        session.refresh_stale().await.unwrap();
        assert_eq!(session.snapshot().balance, Some(Coin::new(42, "unym")));
        assert_eq!(connector.chain.balance_queries.load(Ordering::SeqCst), 2);
        assert!(
            connector
                .chain
                .calls()
                .contains(&"balance n1otheraccount unym".to_string())
        );
    }

    #[tokio::test]
    async fn balance_for_replaced_clients_is_discarded() {
        let (session, connector) = session_with(MockConnector::default());
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();

        let gate = Gate::new();
        connector.chain.hold_with(gate.clone());
        let stale = tokio::spawn({
            let session = session.clone();
            async move { session.refresh_balance().await }
        });
        gate.wait_entered().await;

        *connector.chain.gate.lock().unwrap() = None;
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();
        gate.release(1);

        assert!(!stale.await.unwrap().unwrap());
        assert!(session.snapshot().balance.is_none());
    }

    #[tokio::test]
    async fn delegations_are_listed_for_the_client_sender() {
        let (session, connector) = session_with(MockConnector::default());
        connector
            .chain
            .set_delegations(vec![delegation(1, 100), delegation(2, 200)]);
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();

        assert!(session.refresh_delegations().await.unwrap());
        assert!(!session.refresh_delegations().await.unwrap());
        let delegations = session.snapshot().delegations.unwrap();
        assert_eq!(delegations.len(), 2);
        assert_eq!(connector.chain.delegation_queries.load(Ordering::SeqCst), 1);
        assert!(connector.chain.calls().contains(&format!("delegations {SENDER}")));
    }

    #[tokio::test]
    async fn invalidated_cache_is_fetched_again() {
        let (session, connector) = session_with(MockConnector::default());
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();
        session.refresh_stale().await.unwrap();

        connector.chain.set_delegations(vec![delegation(9, 1)]);
        session.invalidate_cache();
        assert!(session.snapshot().delegations.is_none());
        session.refresh_stale().await.unwrap();

        assert_eq!(session.snapshot().delegations, Some(vec![delegation(9, 1)]));
        assert_eq!(connector.chain.balance_queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_balance_query_leaves_balance_unset() {
        let (session, connector) = session_with(MockConnector::default());
        connector.chain.fail("balance");
        session.connect(Mnemonic::new(PHRASE)).await.unwrap();

        assert!(session.refresh_balance().await.is_err());
        let snapshot = session.snapshot();
        assert!(snapshot.balance.is_none());
        assert!(!snapshot.loading.balance);
    }
}
