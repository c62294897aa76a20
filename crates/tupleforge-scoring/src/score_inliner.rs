//! Scoring sink shared by all terminal nodes of a session.

use tupleforge_core::{
    ConstraintRef, ImpactType, InvariantViolation, MatchWeight, Score, WeightError,
};

/// Undo token for one applied impact.
///
/// Not `Clone`: each token reverses exactly one impact and is consumed by
/// [`ScoreInliner::undo`].
#[derive(Debug, PartialEq, Eq)]
pub struct ScoreImpact<Sc: Score> {
    constraint: usize,
    delta: Sc,
}

impl<Sc: Score> ScoreImpact<Sc> {
    /// Signed score change this impact applied.
    pub fn delta(&self) -> Sc {
        self.delta
    }

    pub fn constraint(&self) -> usize {
        self.constraint
    }
}

#[derive(Debug)]
struct InlinerEntry<Sc: Score> {
    constraint_ref: ConstraintRef,
    impact_type: ImpactType,
    weight: Sc,
    score: Sc,
    match_count: usize,
}

/// Keeps the running total and per-constraint scores.
///
/// The inliner never recomputes: every change goes through
/// [`impact`](Self::impact) and is reversed by replaying its token.
#[derive(Debug)]
pub struct ScoreInliner<Sc: Score> {
    entries: Vec<InlinerEntry<Sc>>,
    total: Sc,
}

impl<Sc: Score> ScoreInliner<Sc> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            total: Sc::zero(),
        }
    }

    /// Registers a constraint and returns its index.
    pub fn register(
        &mut self,
        constraint_ref: ConstraintRef,
        impact_type: ImpactType,
        weight: Sc,
    ) -> usize {
        self.entries.push(InlinerEntry {
            constraint_ref,
            impact_type,
            weight,
            score: Sc::zero(),
            match_count: 0,
        });
        self.entries.len() - 1
    }

    /// Applies one match of `constraint` scaled by `match_weight`.
    ///
    /// # Errors
    ///
    /// Penalties and rewards reject negative match weights. Scaling errors
    /// from the score type (fractional or overflowing weights) are passed
    /// through, as is an overflow of the constraint score or the total.
    /// Nothing is applied on error.
    pub fn impact(
        &mut self,
        constraint: usize,
        match_weight: &MatchWeight,
    ) -> Result<ScoreImpact<Sc>, WeightError> {
        let entry = &mut self.entries[constraint];
        if entry.impact_type.requires_non_negative() && match_weight.is_negative() {
            return Err(WeightError::Negative(match_weight.to_string()));
        }
        let scaled = entry.weight.scale(match_weight)?;
        let delta = match entry.impact_type {
            ImpactType::Penalty => scaled.checked_neg()?,
            ImpactType::Reward | ImpactType::Mixed => scaled,
        };
        let score = entry.score.checked_add(delta)?;
        let total = self.total.checked_add(delta)?;
        entry.score = score;
        entry.match_count += 1;
        self.total = total;
        Ok(ScoreImpact { constraint, delta })
    }

    /// Reverses a previously applied impact.
    ///
    /// # Errors
    ///
    /// Fails with [`WeightError::Overflow`] when the remaining matches no
    /// longer fit the score's range. The token is consumed and nothing is
    /// changed.
    pub fn undo(&mut self, impact: ScoreImpact<Sc>) -> Result<(), WeightError> {
        let entry = &mut self.entries[impact.constraint];
        let score = entry.score.checked_sub(impact.delta)?;
        let total = self.total.checked_sub(impact.delta)?;
        entry.score = score;
        entry.match_count -= 1;
        self.total = total;
        Ok(())
    }

    pub fn score(&self) -> Sc {
        self.total
    }

    pub fn constraint_score(&self, constraint: usize) -> Sc {
        self.entries[constraint].score
    }

    pub fn match_count(&self, constraint: usize) -> usize {
        self.entries[constraint].match_count
    }

    pub fn weight(&self, constraint: usize) -> Sc {
        self.entries[constraint].weight
    }

    pub fn constraint_ref(&self, constraint: usize) -> &ConstraintRef {
        &self.entries[constraint].constraint_ref
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that the total equals the sum of the constraint scores.
    pub(crate) fn verify(&self) -> Result<(), InvariantViolation> {
        let sum = self
            .entries
            .iter()
            .try_fold(Sc::zero(), |acc, e| acc.checked_add(e.score));
        match sum {
            Ok(sum) if sum == self.total => Ok(()),
            Ok(sum) => Err(InvariantViolation::ScoreCorruption {
                expected: sum.to_string(),
                actual: self.total.to_string(),
            }),
            Err(_) => Err(InvariantViolation::ScoreCorruption {
                expected: "a sum within range".to_string(),
                actual: self.total.to_string(),
            }),
        }
    }
}

impl<Sc: Score> Default for ScoreInliner<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use tupleforge_core::{HardSoftScore, SimpleScore};

    use super::*;

    fn inliner<Sc: Score>(impact_type: ImpactType, weight: Sc) -> (ScoreInliner<Sc>, usize) {
        let mut inliner = ScoreInliner::new();
        let idx = inliner.register(ConstraintRef::new("", "c"), impact_type, weight);
        (inliner, idx)
    }

    #[test]
    fn test_penalty_negates() {
        let (mut inl, c) = inliner(ImpactType::Penalty, HardSoftScore::of_hard(1));
        let impact = inl.impact(c, &MatchWeight::from(3)).unwrap();
        assert_eq!(impact.delta(), HardSoftScore::of_hard(-3));
        assert_eq!(inl.score(), HardSoftScore::of_hard(-3));
        assert_eq!(inl.match_count(c), 1);

        inl.undo(impact).unwrap();
        assert_eq!(inl.score(), HardSoftScore::ZERO);
        assert_eq!(inl.match_count(c), 0);
    }

    #[test]
    fn test_reward_and_mixed_keep_sign() {
        let (mut inl, c) = inliner(ImpactType::Reward, SimpleScore::of(2));
        inl.impact(c, &MatchWeight::from(5)).unwrap();
        assert_eq!(inl.score(), SimpleScore::of(10));

        let (mut inl, c) = inliner(ImpactType::Mixed, SimpleScore::of(2));
        inl.impact(c, &MatchWeight::from(-5)).unwrap();
        assert_eq!(inl.score(), SimpleScore::of(-10));
    }

    #[test]
    fn test_negative_weight_rejected_for_penalty() {
        let (mut inl, c) = inliner(ImpactType::Penalty, SimpleScore::of(1));
        let err = inl.impact(c, &MatchWeight::from(-1)).unwrap_err();
        assert!(matches!(err, WeightError::Negative(_)));
        assert_eq!(inl.score(), SimpleScore::ZERO);
        assert_eq!(inl.match_count(c), 0);
    }

    #[test]
    fn test_fractional_weight_rejected_for_integer_score() {
        let (mut inl, c) = inliner(ImpactType::Penalty, SimpleScore::of(1));
        let err = inl
            .impact(c, &MatchWeight::from(Decimal::new(15, 1)))
            .unwrap_err();
        assert!(matches!(err, WeightError::NonIntegral(_)));
    }

    #[test]
    fn test_overflow_rejected() {
        let (mut inl, c) = inliner(ImpactType::Reward, SimpleScore::of(i64::MAX));
        assert_eq!(
            inl.impact(c, &MatchWeight::from(2)).unwrap_err(),
            WeightError::Overflow
        );
    }

    #[test]
    fn test_total_overflow_leaves_state_untouched() {
        let (mut inl, c) = inliner(ImpactType::Reward, SimpleScore::of(i64::MAX));
        let first = inl.impact(c, &MatchWeight::ONE).unwrap();
        assert_eq!(inl.score(), SimpleScore::of(i64::MAX));

        assert_eq!(
            inl.impact(c, &MatchWeight::ONE).unwrap_err(),
            WeightError::Overflow
        );
        assert_eq!(inl.score(), SimpleScore::of(i64::MAX));
        assert_eq!(inl.constraint_score(c), SimpleScore::of(i64::MAX));
        assert_eq!(inl.match_count(c), 1);

        inl.undo(first).unwrap();
        assert_eq!(inl.score(), SimpleScore::ZERO);
    }

    #[test]
    fn test_total_overflow_across_constraints() {
        let mut inl = ScoreInliner::new();
        let max = SimpleScore::of(i64::MAX);
        let a = inl.register(ConstraintRef::new("", "a"), ImpactType::Penalty, max);
        let b = inl.register(ConstraintRef::new("", "b"), ImpactType::Penalty, SimpleScore::of(2));
        inl.impact(a, &MatchWeight::ONE).unwrap();
        // a alone is in range, a + b is not
        assert_eq!(
            inl.impact(b, &MatchWeight::ONE).unwrap_err(),
            WeightError::Overflow
        );
        assert_eq!(inl.constraint_score(b), SimpleScore::ZERO);
        assert_eq!(inl.match_count(b), 0);
        assert!(inl.verify().is_ok());
    }

    #[test]
    fn test_penalty_of_min_weight_overflows() {
        let (mut inl, c) = inliner(ImpactType::Penalty, SimpleScore::of(i64::MIN));
        assert_eq!(
            inl.impact(c, &MatchWeight::ONE).unwrap_err(),
            WeightError::Overflow
        );
        assert_eq!(inl.match_count(c), 0);
    }

    #[test]
    fn test_verify() {
        let mut inl = ScoreInliner::new();
        let a = inl.register(ConstraintRef::new("", "a"), ImpactType::Penalty, SimpleScore::ONE);
        let b = inl.register(ConstraintRef::new("", "b"), ImpactType::Reward, SimpleScore::of(4));
        inl.impact(a, &MatchWeight::ONE).unwrap();
        inl.impact(b, &MatchWeight::ONE).unwrap();
        assert_eq!(inl.score(), SimpleScore::of(3));
        assert!(inl.verify().is_ok());
    }
}
