//! Fixed-point arithmetic over 256-bit unsigned integers.
//!
//! Every point value in the scoring pipeline is a [`U256`] scaled by
//! 10^6. Values arrive from the chain already multiplied by 10^6 (USDC
//! payment-token decimals); rules that mint their own points multiply by
//! [`SCALE`] themselves so they survive the single division performed at
//! total-score emission.
//!
//! All arithmetic is checked: overflow is a hard failure that aborts the
//! wallet replay in progress, never a silent wrap.

use alloy::primitives::U256;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Precision factor carried through the whole computation (10^6).
///
/// Division by this factor happens exactly once, when a total is emitted.
pub const SCALE: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

/// Divisor for percent-times-100 boost coefficients (300 means x3.0).
pub const PERCENT_DIVISOR: U256 = U256::from_limbs([100, 0, 0, 0]);

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Error returned when a payload field is not a valid hex-prefixed U256.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid 256-bit hex value: {0:?}")]
pub struct InvalidPoints(pub String);

/// Error returned when a checked 256-bit operation overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("256-bit arithmetic overflow")]
pub struct ArithmeticOverflow;

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a hex-prefixed 256-bit unsigned integer from an event payload.
///
/// Payload fields are stored as `0x`-prefixed hex strings. Anything else
/// (missing prefix, empty digits, non-hex characters, more than 256 bits)
/// is rejected.
///
/// # Errors
///
/// Returns [`InvalidPoints`] when the string is not a valid hex value.
pub fn parse_hex_u256(raw: &str) -> Result<U256, InvalidPoints> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| InvalidPoints(raw.to_owned()))?;

    if digits.is_empty() {
        return Err(InvalidPoints(raw.to_owned()));
    }

    U256::from_str_radix(digits, 16).map_err(|_| InvalidPoints(raw.to_owned()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHECKED OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Checked addition of two point values.
///
/// # Errors
///
/// Returns [`ArithmeticOverflow`] when the sum exceeds 256 bits.
pub fn checked_add(a: U256, b: U256) -> Result<U256, ArithmeticOverflow> {
    a.checked_add(b).ok_or(ArithmeticOverflow)
}

/// Checked multiplication of two point values.
///
/// # Errors
///
/// Returns [`ArithmeticOverflow`] when the product exceeds 256 bits.
pub fn checked_mul(a: U256, b: U256) -> Result<U256, ArithmeticOverflow> {
    a.checked_mul(b).ok_or(ArithmeticOverflow)
}

/// Apply a percent-times-100 coefficient: `value * coef / 100`.
///
/// A coefficient of `300` therefore multiplies by 3.0, `150` by 1.5.
/// The division truncates, matching integer semantics everywhere else in
/// the pipeline.
///
/// # Errors
///
/// Returns [`ArithmeticOverflow`] when the intermediate product exceeds
/// 256 bits.
pub fn mul_percent(value: U256, coef: u64) -> Result<U256, ArithmeticOverflow> {
    let product = checked_mul(value, U256::from(coef))?;
    Ok(product / PERCENT_DIVISOR)
}

/// Divide a raw scaled total by 10^6, flooring.
///
/// This is the single precision-dropping division of the pipeline; it is
/// only ever applied to a finished sum.
#[must_use]
pub fn to_display_units(raw: U256) -> U256 {
    raw / SCALE
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
