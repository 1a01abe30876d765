//! Display-denomination parsing and formatting.
//!
//! The parse path is integer-exact: `"0.1"` on an 8-decimals chain is
//! `10_000_000`, never a float rounding away from it.

use crate::error::CoreError;

/// Parses a display-denomination decimal string (`"0.1"`, `"12"`,
/// `"0.00000289"`) into base units of a chain with `decimals` places.
/// More fractional digits than the chain carries is an error, not a
/// truncation.
pub fn try_display_to_amount(s: &str, decimals: u8) -> Result<u64, CoreError> {
    let s = s.trim();
    let invalid = || CoreError::InvalidAmount(s.to_string());
    if s.is_empty() {
        return Err(invalid());
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if frac_part.len() > decimals as usize {
        return Err(invalid());
    }

    let int_value: u64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| invalid())?
    };

    let mut frac_value: u64 = 0;
    if !frac_part.is_empty() {
        frac_value = frac_part.parse().map_err(|_| invalid())?;
        for _ in 0..(decimals as usize - frac_part.len()) {
            frac_value = frac_value.checked_mul(10).ok_or(CoreError::AmountOverflow)?;
        }
    }

    let scale = 10u64.checked_pow(decimals as u32).ok_or(CoreError::AmountOverflow)?;
    int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or(CoreError::AmountOverflow)
}

/// Formats base units back into the display denomination, trimming
/// trailing fractional zeros.
pub fn amount_to_display(amount: u64, decimals: u8) -> String {
    let scale = 10u64.pow(decimals as u32);
    let int_part = amount / scale;
    let frac_part = amount % scale;
    if frac_part == 0 {
        return int_part.to_string();
    }
    let frac = format!("{:0width$}", frac_part, width = decimals as usize);
    format!("{}.{}", int_part, frac.trim_end_matches('0'))
}
