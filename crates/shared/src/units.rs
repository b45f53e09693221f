//! Base-unit currency arithmetic. The contract accounts in wei; humans type
//! decimal ether. Conversion happens once at the input boundary and never
//! inside the core.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
const ETHER_DECIMALS: usize = 18;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Wei(pub u128);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount '{0}' contains invalid characters")]
    InvalidDigit(String),
    #[error("amount '{0}' has more than 18 fractional digits")]
    TooPrecise(String),
    #[error("amount '{0}' exceeds the representable range")]
    Overflow(String),
}

impl Wei {
    pub fn zero() -> Self {
        Wei(0)
    }

    pub fn from_ether(ether: u128) -> Result<Self, AmountParseError> {
        ether
            .checked_mul(WEI_PER_ETHER)
            .map(Wei)
            .ok_or_else(|| AmountParseError::Overflow(ether.to_string()))
    }

    /// Parses a human-entered decimal ether amount, e.g. `"0.05"` or `"1"`.
    /// A sign is never accepted; amounts are magnitudes.
    pub fn from_ether_str(raw: &str) -> Result<Self, AmountParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AmountParseError::Empty);
        }

        let (integer, fraction) = match trimmed.split_once('.') {
            Some((i, f)) => (i, f),
            None => (trimmed, ""),
        };
        if integer.is_empty() && fraction.is_empty() {
            return Err(AmountParseError::InvalidDigit(raw.to_string()));
        }
        if !integer.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountParseError::InvalidDigit(raw.to_string()));
        }
        if fraction.len() > ETHER_DECIMALS {
            return Err(AmountParseError::TooPrecise(raw.to_string()));
        }

        let whole: u128 = if integer.is_empty() {
            0
        } else {
            integer
                .parse()
                .map_err(|_| AmountParseError::Overflow(raw.to_string()))?
        };
        let mut fraction_wei: u128 = 0;
        if !fraction.is_empty() {
            let scale = 10u128.pow((ETHER_DECIMALS - fraction.len()) as u32);
            let digits: u128 = fraction
                .parse()
                .map_err(|_| AmountParseError::Overflow(raw.to_string()))?;
            fraction_wei = digits * scale;
        }

        whole
            .checked_mul(WEI_PER_ETHER)
            .and_then(|w| w.checked_add(fraction_wei))
            .map(Wei)
            .ok_or_else(|| AmountParseError::Overflow(raw.to_string()))
    }

    /// Decimal ether rendering with trailing fractional zeros trimmed.
    pub fn to_ether_string(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let fraction = self.0 % WEI_PER_ETHER;
        if fraction == 0 {
            return whole.to_string();
        }
        let padded = format!("{fraction:018}");
        format!("{whole}.{}", padded.trim_end_matches('0'))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Wei) -> Option<Wei> {
        self.0.checked_add(other.0).map(Wei)
    }

    pub fn checked_sub(self, other: Wei) -> Option<Wei> {
        self.0.checked_sub(other.0).map(Wei)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", self.to_ether_string())
    }
}
