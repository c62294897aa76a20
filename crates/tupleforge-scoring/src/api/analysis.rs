//! Score analysis types for detailed constraint tracking.
//!
//! This module provides types for analyzing constraint matches in detail,
//! including which values are involved in each match, score explanations,
//! and value-level indictments.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tupleforge_core::{ConstraintRef, Score, Value, ValueType};

/// Reference to a fact or value involved in a constraint match.
///
/// Two references are equal when their values are equal; for facts that
/// means the same fact id.
#[derive(Clone)]
pub struct EntityRef {
    /// Type name of the value (e.g., "Shift", "Employee").
    pub type_name: String,
    /// String representation for display.
    pub display: String,
    value: Value,
}

impl EntityRef {
    pub fn new<T: ValueType>(value: T) -> Self {
        Self::from_value(Value::new(value))
    }

    pub fn from_value(value: Value) -> Self {
        let (type_name, display) = match value.as_fact() {
            Some(fact) => (fact.type_name().to_string(), format!("{:?}", fact)),
            None => (value.type_name().to_string(), format!("{:?}", value)),
        };
        Self {
            type_name,
            display,
            value,
        }
    }

    /// Attempts to downcast to the concrete type, looking through fact
    /// handles.
    pub fn as_entity<T: 'static>(&self) -> Option<&T> {
        self.value.get::<T>()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the short type name (without module path).
    pub fn short_type_name(&self) -> &str {
        self.type_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.type_name)
    }
}

impl Debug for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRef")
            .field("type", &self.short_type_name())
            .field("display", &self.display)
            .finish()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for EntityRef {}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

/// Justification for why a constraint matched.
#[derive(Clone)]
pub struct ConstraintJustification {
    /// Values involved in the match.
    pub entities: Vec<EntityRef>,
    /// Human-readable description of why the constraint matched.
    pub description: String,
    custom: Option<Arc<dyn Any + Send + Sync>>,
}

impl ConstraintJustification {
    /// Creates a justification from entities, auto-generating description.
    pub fn new(entities: Vec<EntityRef>) -> Self {
        let description = if entities.is_empty() {
            "No entities".to_string()
        } else {
            entities
                .iter()
                .map(|e| e.display.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        Self {
            entities,
            description,
            custom: None,
        }
    }

    pub fn with_description(entities: Vec<EntityRef>, description: String) -> Self {
        Self {
            entities,
            description,
            custom: None,
        }
    }

    /// Wraps a user-defined justification object.
    pub fn custom<J: Debug + Send + Sync + 'static>(data: J) -> Self {
        Self {
            entities: Vec::new(),
            description: format!("{:?}", data),
            custom: Some(Arc::new(data)),
        }
    }

    /// Returns the user-defined justification, if it is a `J`.
    pub fn custom_data<J: 'static>(&self) -> Option<&J> {
        self.custom.as_deref()?.downcast_ref::<J>()
    }
}

impl Debug for ConstraintJustification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintJustification")
            .field("entities", &self.entities)
            .field("description", &self.description)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// One live match of a constraint.
#[derive(Debug, Clone)]
pub struct ConstraintMatch<Sc: Score> {
    /// Reference to the constraint that matched.
    pub constraint_ref: ConstraintRef,
    /// Score impact of this match.
    pub score: Sc,
    pub justification: ConstraintJustification,
    /// Values blamed for this match.
    pub indicted: Vec<EntityRef>,
}

/// Per-constraint breakdown in a score explanation.
#[derive(Debug, Clone)]
pub struct ConstraintAnalysis<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    /// Constraint weight (score per unit match weight).
    pub weight: Sc,
    /// Total score from this constraint.
    pub score: Sc,
    pub matches: Vec<ConstraintMatch<Sc>>,
    /// Whether this is a hard constraint.
    pub is_hard: bool,
}

impl<Sc: Score> ConstraintAnalysis<Sc> {
    pub fn new(
        constraint_ref: ConstraintRef,
        weight: Sc,
        score: Sc,
        matches: Vec<ConstraintMatch<Sc>>,
    ) -> Self {
        Self {
            constraint_ref,
            is_hard: weight.has_hard_component(),
            weight,
            score,
            matches,
        }
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn name(&self) -> &str {
        &self.constraint_ref.name
    }
}

/// Complete score explanation with per-constraint breakdown.
#[derive(Debug, Clone)]
pub struct ScoreExplanation<Sc: Score> {
    pub score: Sc,
    pub constraint_analyses: Vec<ConstraintAnalysis<Sc>>,
}

impl<Sc: Score> ScoreExplanation<Sc> {
    pub fn new(score: Sc, constraint_analyses: Vec<ConstraintAnalysis<Sc>>) -> Self {
        Self {
            score,
            constraint_analyses,
        }
    }

    /// Returns the total match count across all constraints.
    pub fn total_match_count(&self) -> usize {
        self.constraint_analyses.iter().map(|a| a.match_count()).sum()
    }

    /// Returns constraints with non-zero scores.
    pub fn non_zero_constraints(&self) -> Vec<&ConstraintAnalysis<Sc>> {
        self.constraint_analyses
            .iter()
            .filter(|a| a.score != Sc::zero())
            .collect()
    }

    pub fn all_matches(&self) -> Vec<&ConstraintMatch<Sc>> {
        self.constraint_analyses
            .iter()
            .flat_map(|a| &a.matches)
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&ConstraintAnalysis<Sc>> {
        self.constraint_analyses
            .iter()
            .find(|a| a.constraint_ref.full_name() == name || a.name() == name)
    }
}

/// Analysis of how a single value impacts the score.
#[derive(Debug, Clone)]
pub struct Indictment<Sc: Score> {
    pub entity: EntityRef,
    /// Total score impact from matches blaming this value.
    pub score: Sc,
    /// Matches involving this value, grouped by constraint.
    pub constraint_matches: HashMap<ConstraintRef, Vec<ConstraintMatch<Sc>>>,
}

impl<Sc: Score> Indictment<Sc> {
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            score: Sc::zero(),
            constraint_matches: HashMap::new(),
        }
    }

    pub fn add_match(&mut self, constraint_match: ConstraintMatch<Sc>) {
        self.score = self.score + constraint_match.score;
        self.constraint_matches
            .entry(constraint_match.constraint_ref.clone())
            .or_default()
            .push(constraint_match);
    }

    pub fn match_count(&self) -> usize {
        self.constraint_matches.values().map(|v| v.len()).sum::<usize>()
    }

    pub fn violated_constraints(&self) -> Vec<&ConstraintRef> {
        self.constraint_matches.keys().collect()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraint_matches.len()
    }
}

/// Map of indictments for analyzing which values cause violations.
#[derive(Debug, Clone)]
pub struct IndictmentMap<Sc: Score> {
    pub indictments: HashMap<EntityRef, Indictment<Sc>>,
}

impl<Sc: Score> IndictmentMap<Sc> {
    pub fn new() -> Self {
        Self {
            indictments: HashMap::new(),
        }
    }

    /// Builds an indictment map from a collection of matches, blaming each
    /// match's indicted values.
    pub fn from_matches(matches: Vec<ConstraintMatch<Sc>>) -> Self {
        let mut map = Self::new();
        for m in matches {
            for entity in &m.indicted {
                map.indictments
                    .entry(entity.clone())
                    .or_insert_with(|| Indictment::new(entity.clone()))
                    .add_match(m.clone());
            }
        }
        map
    }

    pub fn get(&self, entity: &EntityRef) -> Option<&Indictment<Sc>> {
        self.indictments.get(entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.indictments.keys()
    }

    /// Returns entities sorted by worst score impact (most negative first).
    pub fn worst_entities(&self) -> Vec<&EntityRef> {
        let mut entities: Vec<_> = self.indictments.keys().collect();
        entities.sort_by(|a, b| {
            let score_a = &self.indictments[*a].score;
            let score_b = &self.indictments[*b].score;
            score_a.cmp(score_b).then_with(|| a.value().cmp(b.value()))
        });
        entities
    }

    pub fn len(&self) -> usize {
        self.indictments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indictments.is_empty()
    }
}

impl<Sc: Score> Default for IndictmentMap<Sc> {
    fn default() -> Self {
        Self::new()
    }
}
