/// Amount codec.
///
/// Converts between human decimal strings and smallest-unit integers given
/// an asset's precision, and rounds L2 transfer amounts down to the nearest
/// value representable in the packed amount encoding (35-bit mantissa times
/// a 5-bit base-10 exponent). The network rejects unpackable amounts, so
/// transfers must be pre-rounded.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::errors::ValidationError;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Mantissa width of the packed amount encoding
pub const AMOUNT_MANTISSA_BITS: u32 = 35;

/// Largest mantissa representable in the packed encoding
pub const MAX_AMOUNT_MANTISSA: u128 = (1 << AMOUNT_MANTISSA_BITS) - 1;

/// Maximum decimal precision supported by the parser
pub const MAX_PRECISION: u32 = 28;

// ============================================================================
// PARSING & FORMATTING
// ============================================================================

/// Parse a decimal amount string into a smallest-unit integer using the
/// asset's precision. Digits beyond the precision are truncated toward
/// zero, so "1.2345" at precision 2 parses to 123.
///
/// The result is bounded by the 96-bit decimal mantissa (about 7.9e28
/// smallest units), well below `u128::MAX`: amounts beyond that range are
/// rejected even though `format_units` can render them. Round-tripping is
/// only guaranteed inside the decimal range.
pub fn parse_units(amount: &str, decimals: u32) -> Result<u128, ValidationError> {
    if decimals > MAX_PRECISION {
        return Err(ValidationError::UnsupportedPrecision(decimals));
    }

    let value = Decimal::from_str(amount.trim())
        .map_err(|_| ValidationError::InvalidAmount(amount.to_string()))?;

    if value.is_sign_negative() {
        return Err(ValidationError::NegativeAmount(amount.to_string()));
    }

    let truncated = value.round_dp_with_strategy(decimals, RoundingStrategy::ToZero);
    let scale = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);

    truncated
        .checked_mul(scale)
        .and_then(|raw| raw.trunc().to_u128())
        .ok_or_else(|| ValidationError::AmountOverflow(amount.to_string()))
}

/// Format a smallest-unit integer as a decimal string using the asset's
/// precision. Exact over the full `u128` range; trailing fractional zeros
/// are trimmed.
pub fn format_units(raw: u128, decimals: u32) -> String {
    if decimals == 0 {
        return raw.to_string();
    }

    let digits = raw.to_string();
    let width = decimals as usize;
    let (whole, frac) = if digits.len() > width {
        let split = digits.len() - width;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = width))
    };

    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}

// ============================================================================
// PACKED AMOUNT ROUNDING
// ============================================================================

/// Round a smallest-unit amount down to the nearest value exactly
/// representable in the packed amount encoding. Idempotent, and the result
/// is always less than or equal to the input.
pub fn closest_packable_amount(amount: u128) -> u128 {
    let mut mantissa = amount;
    let mut exponent = 0u32;
    while mantissa > MAX_AMOUNT_MANTISSA {
        mantissa /= 10;
        exponent += 1;
    }
    mantissa * 10u128.pow(exponent)
}

/// Whether an amount is already exactly representable in the packed encoding.
pub fn is_packable_amount(amount: u128) -> bool {
    closest_packable_amount(amount) == amount
}

// ============================================================================
// TESTS
// ============================================================================
