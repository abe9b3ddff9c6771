//! # Amounts
//!
//! Balances, fees and vote weights are unsigned 64-bit counts of nano-units.
//! All arithmetic is checked: overflow and underflow surface as
//! [`ArithmeticError`] and never wrap or panic.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Denominations of the native coin, in nano-units.
pub mod unit {
    /// 1 nano
    pub const NANO: u64 = 1;
    /// 10^3 nano
    pub const MICRO: u64 = 1_000;
    /// 10^6 nano
    pub const MILLI: u64 = 1_000_000;
    /// 10^9 nano
    pub const COIN: u64 = 1_000_000_000;
}

/// Amount arithmetic failure.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ArithmeticError {
    /// Result exceeds `u64::MAX` nano.
    #[error("amount overflow")]
    Overflow,
    /// Result would be negative.
    #[error("amount underflow")]
    Underflow,
}

/// A non-negative amount of nano-units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero.
    pub const ZERO: Amount = Amount(0);
    /// One nano.
    pub const ONE: Amount = Amount(1);
    /// Largest representable amount.
    pub const MAX: Amount = Amount(u64::MAX);

    /// Amount from raw nano-units.
    pub const fn from_nano(nano: u64) -> Self {
        Self(nano)
    }

    /// Amount from micro-units, saturating at [`Amount::MAX`].
    pub const fn from_micro(micro: u64) -> Self {
        Self(micro.saturating_mul(unit::MICRO))
    }

    /// Amount from whole coins, saturating at [`Amount::MAX`].
    pub const fn from_coins(coins: u64) -> Self {
        Self(coins.saturating_mul(unit::COIN))
    }

    /// Raw nano-units.
    pub const fn nano(self) -> u64 {
        self.0
    }

    /// Whether the amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self + other`.
    pub fn checked_add(self, other: Amount) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(ArithmeticError::Overflow)
    }

    /// `self - other`.
    pub fn checked_sub(self, other: Amount) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(ArithmeticError::Underflow)
    }

    /// `self * factor`, used for `gas_price * gas`.
    pub fn checked_mul(self, factor: u64) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_mul(factor)
            .map(Amount)
            .ok_or(ArithmeticError::Overflow)
    }

    /// `self - other`, clamped at zero.
    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Sum an iterator of amounts.
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(iter: I) -> Result<Amount, ArithmeticError> {
        iter.into_iter()
            .try_fold(Amount::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / unit::COIN;
        let frac = self.0 % unit::COIN;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let digits = format!("{frac:09}");
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}
