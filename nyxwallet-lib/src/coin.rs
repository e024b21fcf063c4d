use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletError};

/// Gas multiplier applied to simulated usage when the fee is estimated
pub const AUTO_GAS_MULTIPLIER: f64 = 1.4;

/// An amount of a single denomination, as returned by the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub amount: String,
    pub denom: String,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            amount: amount.to_string(),
            denom: denom.into(),
        }
    }

    pub fn amount_u128(&self) -> Result<u128> {
        self.amount
            .parse()
            .map_err(|_| WalletError::InvalidAmount(self.amount.clone()))
    }

    pub(crate) fn to_cosmos(&self) -> Result<cosmrs::Coin> {
        Ok(cosmrs::Coin {
            denom: self.denom.parse().map_err(WalletError::transaction)?,
            amount: self.amount_u128()?,
        })
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.denom)
    }
}

/// Parse a user supplied amount of base denomination units
pub fn parse_amount(raw: &str) -> Result<u128> {
    let trimmed = raw.trim();
    match trimmed.parse::<u128>() {
        Ok(0) | Err(_) => Err(WalletError::InvalidAmount(raw.to_string())),
        Ok(amount) => Ok(amount),
    }
}

/// Price paid per unit of gas
#[derive(Debug, Clone, PartialEq)]
pub struct GasPrice {
    pub amount: f64,
    pub denom: String,
}

impl FromStr for GasPrice {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| WalletError::InvalidGasPrice(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        let amount: f64 = amount
            .parse()
            .map_err(|_| WalletError::InvalidGasPrice(s.to_string()))?;
        if !amount.is_finite() || amount < 0.0 || denom.is_empty() {
            return Err(WalletError::InvalidGasPrice(s.to_string()));
        }
        Ok(Self {
            amount,
            denom: denom.to_string(),
        })
    }
}

impl GasPrice {
    /// Fee for the given gas limit, rounded up to a whole unit
    pub fn fee_for(&self, gas_limit: u64) -> Coin {
        let amount = (gas_limit as f64 * self.amount).ceil() as u128;
        Coin::new(amount, self.denom.clone())
    }
}

/// How the fee of a transaction is determined
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FeeMode {
    /// Simulate the transaction and scale the gas used by [`AUTO_GAS_MULTIPLIER`]
    #[default]
    Auto,
    /// Use the given gas limit as is
    Fixed(u64),
}

impl FeeMode {
    /// Gas limit to request, given the simulated usage when in `Auto` mode
    pub fn gas_limit(&self, simulated: Option<u64>) -> Option<u64> {
        match self {
            FeeMode::Fixed(limit) => Some(*limit),
            FeeMode::Auto => simulated.map(|used| (used as f64 * AUTO_GAS_MULTIPLIER).round() as u64),
        }
    }
}
