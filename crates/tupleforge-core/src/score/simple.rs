//! Single-level integer score.

use std::fmt;

use super::traits::{parse_level, ParseableScore, Score, ScoreParseError};
use super::ScoreLevel;

/// A score with one integer level.
///
/// # Examples
///
/// ```
/// use tupleforge_core::{MatchWeight, Score, SimpleScore, WeightError};
///
/// let weight = SimpleScore::of(-5);
/// assert_eq!(weight.scale(&MatchWeight::from(3)), Ok(SimpleScore::of(-15)));
/// assert!(SimpleScore::of(-3) > SimpleScore::of(-5));
/// assert_eq!(
///     SimpleScore::of(i64::MAX).checked_add(SimpleScore::ONE),
///     Err(WeightError::Overflow)
/// );
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleScore {
    score: i64,
}

impl SimpleScore {
    pub const ZERO: SimpleScore = SimpleScore { score: 0 };

    /// The usual constraint weight.
    pub const ONE: SimpleScore = SimpleScore { score: 1 };

    #[inline]
    pub const fn of(score: i64) -> Self {
        SimpleScore { score }
    }

    #[inline]
    pub const fn score(&self) -> i64 {
        self.score
    }
}

impl Score for SimpleScore {
    fn zero() -> Self {
        SimpleScore::ZERO
    }

    fn levels() -> &'static [ScoreLevel] {
        &[ScoreLevel::Soft]
    }

    /// A single-level score is feasible while it is not negative.
    fn is_feasible(&self) -> bool {
        self.score >= 0
    }

    score_level_methods!(SimpleScore { score } => of);
    integer_scale!(SimpleScore { score } => of);
}

impl_level_ops!(SimpleScore { score } => of);

impl fmt::Debug for SimpleScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleScore({})", self.score)
    }
}

impl fmt::Display for SimpleScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.score)
    }
}

impl ParseableScore for SimpleScore {
    /// Accepts a bare integer. An `init` suffix is tolerated.
    fn parse(s: &str) -> Result<Self, ScoreParseError> {
        let s = s.trim();
        let suffix = if s.ends_with("init") { "init" } else { "" };
        parse_level(Some(s), suffix, s).map(SimpleScore::of)
    }

    fn to_string_repr(&self) -> String {
        self.score.to_string()
    }
}

impl From<i64> for SimpleScore {
    fn from(score: i64) -> Self {
        SimpleScore::of(score)
    }
}
