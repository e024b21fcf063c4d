use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletError};

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "NYXWALLET_CONFIG";

const CONFIG_DIR_NAME: &str = "nyxwallet";
const CONFIG_FILE_NAME: &str = "config.json";

/// Static settings consumed by the session. Nothing here is produced at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LCD (REST) endpoint of a Nyx validator
    pub api_url: String,
    /// Bech32 human readable part for account addresses
    pub bech32_prefix: String,
    /// Denomination used for balances, transfers and delegations
    pub denom: String,
    /// Gas price as `<amount><denom>`, e.g. `0.025unym`
    pub gas_price: String,
    pub mixnet_contract_address: String,
    /// Sender for the mixnet client. Falls back to the signer's first account.
    pub sender_address: Option<String>,
    pub derivation_path: String,
    /// Maximum number of entries retained by the activity log
    pub log_capacity: usize,
    /// How long to wait for a broadcast transaction to land in a block
    pub broadcast_timeout_secs: u64,
    pub memo: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://api.nymtech.net".to_string(),
            bech32_prefix: "n".to_string(),
            denom: "unym".to_string(),
            gas_price: "0.025unym".to_string(),
            mixnet_contract_address:
                "n17srjznxl9dvzdkpwpw24gg668wc73val88a6m5ajg6ankwvz9wtst0cznr".to_string(),
            sender_address: None,
            derivation_path: "m/44'/118'/0'/0/0".to_string(),
            log_capacity: 200,
            broadcast_timeout_secs: 60,
            memo: "sent from nyxwallet".to_string(),
        }
    }
}

impl Config {
    /// Default location, honouring `NYXWALLET_CONFIG`
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        let dir = dirs::config_dir().ok_or(WalletError::NoConfigDir)?;
        Ok(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, or defaults if no file exists yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| WalletError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let write_err = |source| WalletError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).map_err(write_err)
    }

    /// Directory holding the config file, used for the diagnostic log as well
    pub fn data_dir() -> Result<PathBuf> {
        let path = Self::default_path()?;
        Ok(path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("nyxwallet-config-{}-{name}", std::process::id()))
            .join(CONFIG_FILE_NAME)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = scratch_path("missing");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.denom, "unym");
        assert_eq!(config.bech32_prefix, "n");
    }

    #[test]
    fn saved_config_loads_back() {
        let path = scratch_path("saved");
        let config = Config {
            api_url: "http://localhost:1317".to_string(),
            sender_address: Some("n1sender".to_string()),
            log_capacity: 5,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = scratch_path("partial");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "api_url": "http://127.0.0.1:1317" }"#).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url, "http://127.0.0.1:1317");
        assert_eq!(loaded.gas_price, Config::default().gas_price);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
