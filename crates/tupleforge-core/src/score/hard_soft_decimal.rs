//! HardSoftDecimalScore - Two-level score with i64 precision and ×100000 scaling
//!
//! Internal values are scaled by 100000 to provide 5 decimal places of
//! precision without heap allocation.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::traits::{parse_level, ParseableScore, Score, ScoreParseError};
use super::weight::{scale_decimal_level, MatchWeight};
use super::ScoreLevel;
use crate::error::WeightError;

/// Scale factor for 5 decimal places of precision.
const SCALE: i64 = 100_000;
const SCALE_DIGITS: u32 = 5;

/// A hard/soft score with fixed-point decimal levels.
///
/// Unlike the integer score types, this score accepts fractional match
/// weights.
///
/// # Examples
///
/// ```
/// use tupleforge_core::{HardSoftDecimalScore, MatchWeight, Score};
/// use rust_decimal::Decimal;
///
/// let weight = HardSoftDecimalScore::of(0, 1);
/// let scaled = weight.scale(&MatchWeight::from(Decimal::new(25, 1))).unwrap();
/// assert_eq!(scaled.to_string(), "0hard/2.5soft");
///
/// let score = HardSoftDecimalScore::of_scaled(-150000, -250000);
/// assert_eq!(format!("{}", score), "-1.5hard/-2.5soft");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardSoftDecimalScore {
    hard: i64,
    soft: i64,
}

impl HardSoftDecimalScore {
    /// The zero score.
    pub const ZERO: HardSoftDecimalScore = HardSoftDecimalScore { hard: 0, soft: 0 };

    /// One hard constraint weight (scaled).
    pub const ONE_HARD: HardSoftDecimalScore = HardSoftDecimalScore {
        hard: SCALE,
        soft: 0,
    };

    /// One soft constraint weight (scaled).
    pub const ONE_SOFT: HardSoftDecimalScore = HardSoftDecimalScore {
        hard: 0,
        soft: SCALE,
    };

    /// Creates a new score from unscaled values.
    #[inline]
    pub const fn of(hard: i64, soft: i64) -> Self {
        HardSoftDecimalScore {
            hard: hard * SCALE,
            soft: soft * SCALE,
        }
    }

    /// Creates a new score from pre-scaled values.
    #[inline]
    pub const fn of_scaled(hard: i64, soft: i64) -> Self {
        HardSoftDecimalScore { hard, soft }
    }

    /// Creates a score from decimal levels, rounding to 5 places.
    pub fn of_decimal(hard: Decimal, soft: Decimal) -> Option<Self> {
        Some(HardSoftDecimalScore {
            hard: to_scaled(hard)?,
            soft: to_scaled(soft)?,
        })
    }

    #[inline]
    pub const fn hard_scaled(&self) -> i64 {
        self.hard
    }

    #[inline]
    pub const fn soft_scaled(&self) -> i64 {
        self.soft
    }

    pub fn hard(&self) -> Decimal {
        Decimal::new(self.hard, SCALE_DIGITS).normalize()
    }

    pub fn soft(&self) -> Decimal {
        Decimal::new(self.soft, SCALE_DIGITS).normalize()
    }
}

fn to_scaled(value: Decimal) -> Option<i64> {
    value
        .checked_mul(Decimal::from(SCALE))?
        .round_dp(0)
        .to_i64()
}

impl Score for HardSoftDecimalScore {
    fn zero() -> Self {
        HardSoftDecimalScore::ZERO
    }

    fn levels() -> &'static [ScoreLevel] {
        &[ScoreLevel::Hard, ScoreLevel::Soft]
    }

    score_level_methods!(HardSoftDecimalScore { hard, soft } => of_scaled);

    fn scale(&self, weight: &MatchWeight) -> Result<Self, WeightError> {
        let factor = weight.to_decimal();
        Ok(HardSoftDecimalScore::of_scaled(
            scale_decimal_level(self.hard, factor)?,
            scale_decimal_level(self.soft, factor)?,
        ))
    }
}

impl_level_ops!(HardSoftDecimalScore { hard, soft } => of_scaled);

impl fmt::Debug for HardSoftDecimalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HardSoftDecimalScore({}, {})", self.hard(), self.soft())
    }
}

impl fmt::Display for HardSoftDecimalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}soft", self.hard(), self.soft())
    }
}

impl ParseableScore for HardSoftDecimalScore {
    fn parse(s: &str) -> Result<Self, ScoreParseError> {
        let s = s.trim();
        let mut parts = s.split('/');
        let hard: Decimal = parse_level(parts.next(), "hard", s)?;
        let soft: Decimal = parse_level(parts.next(), "soft", s)?;
        if parts.next().is_some() {
            return Err(ScoreParseError::new(format!(
                "HardSoftDecimalScore '{}' has too many levels",
                s
            )));
        }
        HardSoftDecimalScore::of_decimal(hard, soft).ok_or_else(|| {
            ScoreParseError::new(format!("HardSoftDecimalScore '{}' is out of range", s))
        })
    }

    fn to_string_repr(&self) -> String {
        self.to_string()
    }
}
