use std::fmt;

use async_trait::async_trait;
use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic as Bip39Mnemonic};
use cosmrs::AccountId;
use cosmrs::crypto::PublicKey;
use cosmrs::crypto::secp256k1::SigningKey;

use crate::capability::{AccountData, SignerCapability};
use crate::error::{Result, WalletError};
use crate::session::Mnemonic;

/// secp256k1 key derived from a BIP-39 mnemonic along a BIP-32 path
pub struct HdSigner {
    secret: [u8; 32],
    public_key: PublicKey,
    account_id: AccountId,
}

impl fmt::Debug for HdSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdSigner")
            .field("address", &self.account_id.to_string())
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl HdSigner {
    pub fn from_mnemonic(mnemonic: &Mnemonic, prefix: &str, derivation_path: &str) -> Result<Self> {
        let phrase = Bip39Mnemonic::parse_in_normalized(Language::English, mnemonic.expose())
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        let seed = phrase.to_seed("");

        let path: DerivationPath = derivation_path
            .parse()
            .map_err(WalletError::key_derivation)?;
        let xprv = XPrv::derive_from_path(seed, &path).map_err(WalletError::key_derivation)?;
        let secret: [u8; 32] = xprv.to_bytes();

        let signing_key = SigningKey::from_slice(&secret).map_err(WalletError::key_derivation)?;
        let public_key = signing_key.public_key();
        let account_id = public_key
            .account_id(prefix)
            .map_err(WalletError::key_derivation)?;

        log::debug!("derived account {account_id}");
        Ok(Self {
            secret,
            public_key,
            account_id,
        })
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Compressed public key, hex encoded
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.to_bytes())
    }

    /// Fresh signing key for a single signature
    pub(crate) fn signing_key(&self) -> Result<SigningKey> {
        SigningKey::from_slice(&self.secret).map_err(WalletError::key_derivation)
    }
}

#[async_trait]
impl SignerCapability for HdSigner {
    async fn accounts(&self) -> Result<Vec<AccountData>> {
        Ok(vec![AccountData {
            address: self.account_id.to_string(),
            public_key: self.public_key.to_bytes(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
        abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon \
        abandon abandon abandon abandon abandon art";
    const PATH: &str = "m/44'/118'/0'/0/0";

    #[test]
    fn derivation_is_deterministic_and_prefixed() {
        let mnemonic = Mnemonic::new(PHRASE);
        let first = HdSigner::from_mnemonic(&mnemonic, "n", PATH).unwrap();
        let second = HdSigner::from_mnemonic(&mnemonic, "n", PATH).unwrap();
        assert_eq!(first.account_id(), second.account_id());
        assert!(first.account_id().to_string().starts_with("n1"));
        assert_eq!(first.public_key().to_bytes().len(), 33);
        assert_eq!(first.public_key_hex().len(), 66);
    }

    #[test]
    fn prefix_changes_only_the_encoding() {
        let mnemonic = Mnemonic::new(PHRASE);
        let nym = HdSigner::from_mnemonic(&mnemonic, "n", PATH).unwrap();
        let cosmos = HdSigner::from_mnemonic(&mnemonic, "cosmos", PATH).unwrap();
        assert!(cosmos.account_id().to_string().starts_with("cosmos1"));
        assert_eq!(nym.account_id().to_bytes(), cosmos.account_id().to_bytes());
    }

    #[test]
    fn invalid_phrase_is_rejected() {
        let mnemonic = Mnemonic::new("definitely not a valid mnemonic phrase");
        let err = HdSigner::from_mnemonic(&mnemonic, "n", PATH).unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let signer = HdSigner::from_mnemonic(&Mnemonic::new(PHRASE), "n", PATH).unwrap();
        let rendered = format!("{signer:?}");
        assert!(rendered.contains("address"));
        assert!(rendered.contains(&signer.public_key_hex()));
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn lists_a_single_account() {
        let signer = HdSigner::from_mnemonic(&Mnemonic::new(PHRASE), "n", PATH).unwrap();
        let accounts = signer.accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].address, signer.account_id().to_string());
    }
}
