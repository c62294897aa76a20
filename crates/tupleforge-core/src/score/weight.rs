//! Match weights produced by constraint weight functions.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::WeightError;

/// Multiplier applied to a constraint weight for a single match.
///
/// Weight functions may return `i32`, `i64` or [`Decimal`]; all convert
/// into this enum.
///
/// # Examples
///
/// ```
/// use tupleforge_core::MatchWeight;
/// use rust_decimal::Decimal;
///
/// assert_eq!(MatchWeight::from(3).to_integral(), Ok(3));
/// assert!(MatchWeight::from(Decimal::new(15, 1)).to_integral().is_err());
/// assert!(MatchWeight::from(-2i64).is_negative());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchWeight {
    Int(i32),
    Long(i64),
    Decimal(Decimal),
}

impl MatchWeight {
    /// The unit weight used when a constraint has no weight function.
    pub const ONE: MatchWeight = MatchWeight::Int(1);

    pub fn is_negative(&self) -> bool {
        match self {
            MatchWeight::Int(v) => *v < 0,
            MatchWeight::Long(v) => *v < 0,
            MatchWeight::Decimal(v) => v.is_sign_negative() && !v.is_zero(),
        }
    }

    /// Returns the weight as an integer, rejecting fractional decimals.
    pub fn to_integral(&self) -> Result<i64, WeightError> {
        match self {
            MatchWeight::Int(v) => Ok(i64::from(*v)),
            MatchWeight::Long(v) => Ok(*v),
            MatchWeight::Decimal(v) => {
                if !v.fract().is_zero() {
                    return Err(WeightError::NonIntegral(v.to_string()));
                }
                v.to_i64().ok_or(WeightError::Overflow)
            }
        }
    }

    /// Returns the weight as a decimal.
    pub fn to_decimal(&self) -> Decimal {
        match self {
            MatchWeight::Int(v) => Decimal::from(*v),
            MatchWeight::Long(v) => Decimal::from(*v),
            MatchWeight::Decimal(v) => *v,
        }
    }
}

impl Default for MatchWeight {
    fn default() -> Self {
        MatchWeight::ONE
    }
}

impl fmt::Display for MatchWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchWeight::Int(v) => write!(f, "{}", v),
            MatchWeight::Long(v) => write!(f, "{}", v),
            MatchWeight::Decimal(v) => write!(f, "{}", v),
        }
    }
}

impl From<i32> for MatchWeight {
    fn from(value: i32) -> Self {
        MatchWeight::Int(value)
    }
}

impl From<i64> for MatchWeight {
    fn from(value: i64) -> Self {
        MatchWeight::Long(value)
    }
}

impl From<usize> for MatchWeight {
    fn from(value: usize) -> Self {
        match i64::try_from(value) {
            Ok(v) => MatchWeight::Long(v),
            Err(_) => MatchWeight::Decimal(Decimal::from(value)),
        }
    }
}

impl From<Decimal> for MatchWeight {
    fn from(value: Decimal) -> Self {
        MatchWeight::Decimal(value)
    }
}

/// Multiplies an integer level by an integral weight with overflow checks.
pub(crate) fn scale_level(level: i64, factor: i64) -> Result<i64, WeightError> {
    level.checked_mul(factor).ok_or(WeightError::Overflow)
}

/// Multiplies a fixed-point level by a decimal weight, rounding to the
/// level's precision.
pub(crate) fn scale_decimal_level(level: i64, weight: Decimal) -> Result<i64, WeightError> {
    Decimal::from(level)
        .checked_mul(weight)
        .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|v| v.to_i64())
        .ok_or(WeightError::Overflow)
}
