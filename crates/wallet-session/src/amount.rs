//! Exact amount conversion between smallest units and decimal strings.
//!
//! RPC endpoints report integers (lamports, wei, satoshis). They are kept as
//! `u128` and only ever divided with integer arithmetic; display rounding is
//! applied last, to the already-exact value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest supported decimals value (10^38 still fits in a u128).
pub const MAX_DECIMALS: u8 = 38;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount must not carry a sign: {0:?}")]
    Signed(String),

    #[error("malformed amount: {0:?}")]
    Malformed(String),

    #[error("{input:?} has more than {decimals} decimal places")]
    TooPrecise { input: String, decimals: u8 },

    #[error("amount does not fit in 128 bits")]
    Overflow,

    #[error("unsupported decimals: {0}")]
    UnsupportedDecimals(u8),
}

impl From<AmountError> for crate::error::WalletError {
    fn from(e: AmountError) -> Self {
        crate::error::WalletError::InvalidAmount(e.to_string())
    }
}

/// How a balance is rounded for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayRule {
    /// Always this many decimal places (BTC: 8, SOL: 6).
    Fixed(u8),
    /// 6 places below 0.01, otherwise 4.
    EtherLike,
    /// 6 places below 0.01, 4 below 1, 2 below 1000, 2 with separators above.
    Tiered,
}

fn pow10(exp: u32) -> Option<u128> {
    10u128.checked_pow(exp)
}

/// Render a smallest-unit integer as an exact decimal string.
///
/// Trailing fractional zeros are dropped and whole values carry no point:
/// `to_decimal_string(1_500_000_000, 9) == "1.5"`.
pub fn to_decimal_string(raw: u128, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }

    let width = decimals as usize;
    let digits = format!("{raw:0>pad$}", pad = width + 1);
    let (whole, frac) = digits.split_at(digits.len() - width);
    let frac = frac.trim_end_matches('0');

    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}

/// Parse a user-entered decimal amount into smallest units, exactly.
///
/// Surrounding whitespace is ignored. Signs, exponents, separators and
/// more fractional digits than `decimals` are rejected.
pub fn to_smallest_unit(input: &str, decimals: u8) -> Result<u128, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }

    let amount = input.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }
    if amount.starts_with('-') || amount.starts_with('+') {
        return Err(AmountError::Signed(amount.to_string()));
    }

    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(AmountError::Malformed(amount.to_string()));
    }

    if frac.len() > decimals as usize {
        return Err(AmountError::TooPrecise {
            input: amount.to_string(),
            decimals,
        });
    }

    let scale = pow10(decimals as u32).ok_or(AmountError::Overflow)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| AmountError::Overflow)?
    };

    let frac_units = if frac.is_empty() {
        0
    } else {
        let pad = pow10((decimals as usize - frac.len()) as u32).ok_or(AmountError::Overflow)?;
        frac.parse::<u128>().map_err(|_| AmountError::Overflow)? * pad
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or(AmountError::Overflow)
}

/// Whether `raw / 10^decimals < 10^exp`.
fn below_pow10(raw: u128, decimals: u8, exp: i32) -> bool {
    let shift = decimals as i32 + exp;
    if shift < 0 {
        return raw == 0;
    }
    match pow10(shift as u32) {
        Some(limit) => raw < limit,
        None => true,
    }
}

/// Round `raw` (with `decimals` places) half-up to `places` places.
/// Returns the scaled integer, i.e. the value times 10^places.
fn round_half_up(raw: u128, decimals: u8, places: u8) -> u128 {
    if places >= decimals {
        let factor = pow10((places - decimals) as u32).unwrap_or(u128::MAX);
        return raw.saturating_mul(factor);
    }

    let Some(divisor) = pow10((decimals - places) as u32) else {
        return 0;
    };
    let quotient = raw / divisor;
    let remainder = raw % divisor;
    if remainder >= divisor - remainder {
        quotient + 1
    } else {
        quotient
    }
}

fn group_thousands(whole: &str) -> String {
    let mut out = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn fixed_places(raw: u128, decimals: u8, places: u8, grouped: bool) -> String {
    let scaled = round_half_up(raw, decimals, places);
    let Some(unit) = pow10(places as u32) else {
        return scaled.to_string();
    };

    let whole = (scaled / unit).to_string();
    let whole = if grouped { group_thousands(&whole) } else { whole };

    if places == 0 {
        whole
    } else {
        format!("{whole}.{:0>width$}", scaled % unit, width = places as usize)
    }
}

/// Format a balance for the UI according to its display rule.
pub fn format_for_display(raw: u128, decimals: u8, rule: DisplayRule) -> String {
    if raw == 0 {
        return "0".to_string();
    }
    if below_pow10(raw, decimals, -6) {
        return "< 0.000001".to_string();
    }

    match rule {
        DisplayRule::Fixed(places) => fixed_places(raw, decimals, places, false),
        DisplayRule::EtherLike => {
            let places = if below_pow10(raw, decimals, -2) { 6 } else { 4 };
            fixed_places(raw, decimals, places, false)
        }
        DisplayRule::Tiered => {
            if below_pow10(raw, decimals, -2) {
                fixed_places(raw, decimals, 6, false)
            } else if below_pow10(raw, decimals, 0) {
                fixed_places(raw, decimals, 4, false)
            } else if below_pow10(raw, decimals, 3) {
                fixed_places(raw, decimals, 2, false)
            } else {
                fixed_places(raw, decimals, 2, true)
            }
        }
    }
}
