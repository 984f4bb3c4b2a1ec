//! Decimal token amounts
//!
//! Balances arrive as decimal strings. They are parsed into whole units plus
//! micro-units so totals do not depend on float rounding, and rendered with
//! exactly six decimal places. Any `u128` balance the backend can hold is
//! representable.

use crate::error::{Result, WalletError};
use crate::types::Coin;
use std::fmt;
use std::str::FromStr;

/// Number of decimal places in formatted totals.
pub const DISPLAY_DECIMALS: u32 = 6;

const MICROS_PER_UNIT: u32 = 1_000_000;

/// Non-negative amount with micro-unit precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount {
    whole: u128,
    micros: u32,
}

impl Amount {
    pub const ZERO: Amount = Amount { whole: 0, micros: 0 };

    pub fn from_units(whole: u128) -> Self {
        Amount { whole, micros: 0 }
    }

    pub fn whole(&self) -> u128 {
        self.whole
    }

    pub fn micros(&self) -> u32 {
        self.micros
    }

    pub fn is_zero(&self) -> bool {
        *self == Amount::ZERO
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        let micros = self.micros + other.micros;
        let carry = u128::from(micros / MICROS_PER_UNIT);
        let whole = self.whole.checked_add(other.whole)?.checked_add(carry)?;
        Some(Amount {
            whole,
            micros: micros % MICROS_PER_UNIT,
        })
    }
}

impl FromStr for Amount {
    type Err = String;

    /// Digits with an optional fraction. Fractions longer than six digits
    /// round half-up to the nearest micro-unit.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err("no digits".to_string());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err("not a decimal number".to_string());
        }

        let whole = if int_part.is_empty() {
            0
        } else {
            int_part.parse::<u128>().map_err(|_| "overflow".to_string())?
        };

        let digits = frac_part.as_bytes();
        let mut micros: u32 = 0;
        for i in 0..DISPLAY_DECIMALS as usize {
            let d = digits.get(i).map_or(0, |b| u32::from(b - b'0'));
            micros = micros * 10 + d;
        }
        let round_up = digits
            .get(DISPLAY_DECIMALS as usize)
            .is_some_and(|b| *b >= b'5');

        let amount = Amount { whole, micros };
        if round_up {
            amount
                .checked_add(Amount { whole: 0, micros: 1 })
                .ok_or_else(|| "overflow".to_string())
        } else {
            Ok(amount)
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.whole,
            self.micros,
            width = DISPLAY_DECIMALS as usize
        )
    }
}

/// Parse a decimal amount string such as `"1000"` or `"12.5"`.
pub fn parse_amount(s: &str) -> Result<Amount> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(WalletError::InvalidInput("amount cannot be empty".to_string()));
    }
    trimmed
        .parse::<Amount>()
        .map_err(|e| WalletError::InvalidInput(format!("invalid amount '{}': {}", trimmed, e)))
}

/// Parse an amount that must be strictly positive (used for transfers).
pub fn parse_positive_amount(s: &str) -> Result<Amount> {
    let amount = parse_amount(s).map_err(|_| {
        WalletError::InvalidInput(format!("amount must be positive, got '{}'", s.trim()))
    })?;
    if amount.is_zero() {
        return Err(WalletError::InvalidInput(format!(
            "amount must be positive, got '{}'",
            s.trim()
        )));
    }
    Ok(amount)
}

/// Sum every coin amount regardless of denomination.
pub fn sum_balances(balances: &[Coin]) -> Result<Amount> {
    balances.iter().try_fold(Amount::ZERO, |acc, coin| {
        let amount = parse_amount(&coin.amount)?;
        acc.checked_add(amount).ok_or_else(|| {
            WalletError::InvalidInput("balance total overflows".to_string())
        })
    })
}

/// Render with exactly six decimal places.
pub fn format_amount(amount: Amount) -> String {
    amount.to_string()
}

/// `format_amount(sum_balances(..))`
pub fn total_balance(balances: &[Coin]) -> Result<String> {
    Ok(format_amount(sum_balances(balances)?))
}
