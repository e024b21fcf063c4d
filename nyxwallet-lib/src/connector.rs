use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::{ConnectedClients, Connector, DelegationCapability, SignerCapability};
use crate::config::Config;
use crate::error::{Result, WalletError};
use crate::mixnet::MixnetClient;
use crate::nyxd::NyxdClient;
use crate::session::Mnemonic;
use crate::signer::HdSigner;

/// Connects to a Nyx validator's LCD endpoint with an HD derived key
#[derive(Debug, Default, Clone, Copy)]
pub struct NyxdConnector;

fn derive(mnemonic: &Mnemonic, config: &Config) -> Result<HdSigner> {
    HdSigner::from_mnemonic(mnemonic, &config.bech32_prefix, &config.derivation_path)
}

#[async_trait]
impl Connector for NyxdConnector {
    async fn signer(
        &self,
        mnemonic: &Mnemonic,
        config: &Config,
    ) -> Result<Arc<dyn SignerCapability>> {
        Ok(Arc::new(derive(mnemonic, config)?))
    }

    async fn clients(&self, mnemonic: &Mnemonic, config: &Config) -> Result<ConnectedClients> {
        let signer = Arc::new(derive(mnemonic, config)?);
        let sender = match &config.sender_address {
            Some(sender) => sender.clone(),
            None => signer
                .accounts()
                .await?
                .into_iter()
                .next()
                .map(|account| account.address)
                .ok_or(WalletError::NoAccounts)?,
        };

        let nyxd = Arc::new(NyxdClient::new(config, signer)?);
        let chain_id = nyxd.chain_id().await?;
        log::info!("connected to {} ({chain_id})", config.api_url);

        let mixnet = MixnetClient::new(
            Arc::clone(&nyxd),
            sender,
            config.mixnet_contract_address.clone(),
        );
        log::debug!(
            "mixnet client for contract {} acting as {}",
            mixnet.contract(),
            mixnet.sender()
        );

        Ok(ConnectedClients {
            query: nyxd,
            delegation: Arc::new(mixnet),
        })
    }
}
