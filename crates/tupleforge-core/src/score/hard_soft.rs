//! Two-level integer score.

use std::fmt;

use super::traits::Score;
use super::ScoreLevel;

/// A hard level and a soft level. Soft only breaks ties between equal
/// hard levels.
///
/// # Examples
///
/// ```
/// use tupleforge_core::{HardSoftScore, Score};
///
/// assert!(HardSoftScore::of(0, -200) > HardSoftScore::of(-1, -100));
/// assert!(!HardSoftScore::of_hard(-1).is_feasible());
/// assert!(HardSoftScore::of_hard(-1).checked_neg().is_ok());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardSoftScore {
    hard: i64,
    soft: i64,
}

impl HardSoftScore {
    pub const ZERO: HardSoftScore = HardSoftScore::of(0, 0);
    pub const ONE_HARD: HardSoftScore = HardSoftScore::of_hard(1);
    pub const ONE_SOFT: HardSoftScore = HardSoftScore::of_soft(1);

    #[inline]
    pub const fn of(hard: i64, soft: i64) -> Self {
        HardSoftScore { hard, soft }
    }

    #[inline]
    pub const fn of_hard(hard: i64) -> Self {
        HardSoftScore::of(hard, 0)
    }

    #[inline]
    pub const fn of_soft(soft: i64) -> Self {
        HardSoftScore::of(0, soft)
    }

    #[inline]
    pub const fn hard(&self) -> i64 {
        self.hard
    }

    #[inline]
    pub const fn soft(&self) -> i64 {
        self.soft
    }
}

impl Score for HardSoftScore {
    fn zero() -> Self {
        HardSoftScore::ZERO
    }

    fn levels() -> &'static [ScoreLevel] {
        &[ScoreLevel::Hard, ScoreLevel::Soft]
    }

    score_level_methods!(HardSoftScore { hard, soft } => of);
    integer_scale!(HardSoftScore { hard, soft } => of);
}

impl_level_ops!(HardSoftScore { hard, soft } => of);

impl fmt::Debug for HardSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HardSoftScore({}, {})", self.hard, self.soft)
    }
}

impl fmt::Display for HardSoftScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}soft", self.hard, self.soft)
    }
}

impl_suffixed_parse!(HardSoftScore { hard => "hard", soft => "soft" } => of);
