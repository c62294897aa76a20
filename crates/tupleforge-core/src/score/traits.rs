//! The `Score` contract used by the scoring sink.

use std::fmt::{Debug, Display};
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use super::weight::MatchWeight;
use super::ScoreLevel;
use crate::error::WeightError;

/// A totally ordered score with one or more `i64` levels.
///
/// Higher-priority levels compare first. The scoring sink accumulates
/// impacts exclusively through [`scale`](Score::scale) and the checked
/// arithmetic methods, so a running total that would leave the `i64`
/// range is reported as [`WeightError::Overflow`] and never stored.
pub trait Score:
    Copy
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + Eq
    + Ord
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// The identity for addition.
    fn zero() -> Self;

    /// The kind of each level, highest priority first.
    fn levels() -> &'static [ScoreLevel];

    /// Raw level values in the same order as [`levels`](Score::levels).
    fn to_level_numbers(&self) -> Vec<i64>;

    /// Multiplies every level by a match weight.
    ///
    /// Integer score types reject fractional weights. Every type rejects a
    /// product that leaves the `i64` range.
    fn scale(&self, weight: &MatchWeight) -> Result<Self, WeightError>;

    fn checked_add(self, other: Self) -> Result<Self, WeightError>;

    fn checked_sub(self, other: Self) -> Result<Self, WeightError>;

    fn checked_neg(self) -> Result<Self, WeightError>;

    /// True if no hard level is negative.
    fn is_feasible(&self) -> bool {
        Self::levels()
            .iter()
            .zip(self.to_level_numbers())
            .all(|(level, v)| *level != ScoreLevel::Hard || v >= 0)
    }

    /// True if any hard level is non-zero.
    fn has_hard_component(&self) -> bool {
        Self::levels()
            .iter()
            .zip(self.to_level_numbers())
            .any(|(level, v)| *level == ScoreLevel::Hard && v != 0)
    }
}

/// A score that can be read from and written to text.
///
/// Formats: `"42"` for [`SimpleScore`](super::SimpleScore), `"-1hard/-20soft"`
/// for the hard/soft types. Decimal levels accept fractions such as
/// `"-1.5hard/0soft"`.
pub trait ParseableScore: Score {
    fn parse(s: &str) -> Result<Self, ScoreParseError>;

    fn to_string_repr(&self) -> String;
}

/// Error when parsing a score from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreParseError {
    pub message: String,
}

impl ScoreParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ScoreParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Score parse error: {}", self.message)
    }
}

impl std::error::Error for ScoreParseError {}

/// Parses one `"<number><suffix>"` level of `whole`.
pub(crate) fn parse_level<T>(
    part: Option<&str>,
    suffix: &str,
    whole: &str,
) -> Result<T, ScoreParseError>
where
    T: FromStr,
    T::Err: Display,
{
    let part = part
        .map(str::trim)
        .ok_or_else(|| ScoreParseError::new(format!("'{}' has no {} level", whole, suffix)))?;
    let number = part.strip_suffix(suffix).ok_or_else(|| {
        ScoreParseError::new(format!("level '{}' must end with '{}'", part, suffix))
    })?;
    number
        .parse::<T>()
        .map_err(|e| ScoreParseError::new(format!("invalid {} level '{}': {}", suffix, number, e)))
}
