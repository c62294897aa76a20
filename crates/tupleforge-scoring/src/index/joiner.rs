//! Erased joiner definitions and their compiled index layout.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tupleforge_core::{BuildError, Value};

use crate::tuple::Tuple;

/// Extracts an index key from a tuple.
pub type KeyFn = Arc<dyn Fn(&Tuple) -> Value + Send + Sync>;

/// Residual predicate over a `(left, right)` pair.
pub type PairPredicate = Arc<dyn Fn(&Tuple, &Tuple) -> bool + Send + Sync>;

/// One key per index level.
pub(crate) type IndexKeys = SmallVec<[Value; 2]>;

/// How an indexed joiner compares `left(l)` with `right(r)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinerType {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl JoinerType {
    /// Returns the comparison with its operands swapped.
    pub fn flip(self) -> Self {
        match self {
            JoinerType::Equal => JoinerType::Equal,
            JoinerType::LessThan => JoinerType::GreaterThan,
            JoinerType::LessThanOrEqual => JoinerType::GreaterThanOrEqual,
            JoinerType::GreaterThan => JoinerType::LessThan,
            JoinerType::GreaterThanOrEqual => JoinerType::LessThanOrEqual,
        }
    }

    /// Evaluates `left <op> right`.
    pub fn matches(self, left: &Value, right: &Value) -> bool {
        match self {
            JoinerType::Equal => left == right,
            JoinerType::LessThan => left < right,
            JoinerType::LessThanOrEqual => left <= right,
            JoinerType::GreaterThan => left > right,
            JoinerType::GreaterThanOrEqual => left >= right,
        }
    }
}

/// The type a joiner reads on its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RightType {
    pub id: TypeId,
    pub name: &'static str,
}

impl RightType {
    pub fn of<E: 'static>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }
}

/// A type-erased joiner as recorded by the graph builder.
#[derive(Clone)]
pub enum JoinerDef {
    Indexed {
        joiner_type: JoinerType,
        left: KeyFn,
        right: KeyFn,
        right_type: Option<RightType>,
    },
    Filtering {
        predicate: PairPredicate,
        right_type: Option<RightType>,
    },
}

impl JoinerDef {
    pub fn indexed(joiner_type: JoinerType, left: KeyFn, right: KeyFn) -> Self {
        JoinerDef::Indexed {
            joiner_type,
            left,
            right,
            right_type: None,
        }
    }

    pub fn filtering(predicate: PairPredicate) -> Self {
        JoinerDef::Filtering {
            predicate,
            right_type: None,
        }
    }

    /// Records the type the right-hand key function reads.
    pub fn reading<E: 'static>(self) -> Self {
        let ty = Some(RightType::of::<E>());
        match self {
            JoinerDef::Indexed {
                joiner_type,
                left,
                right,
                ..
            } => JoinerDef::Indexed {
                joiner_type,
                left,
                right,
                right_type: ty,
            },
            JoinerDef::Filtering { predicate, .. } => JoinerDef::Filtering {
                predicate,
                right_type: ty,
            },
        }
    }

    pub fn right_type(&self) -> Option<RightType> {
        match self {
            JoinerDef::Indexed { right_type, .. } | JoinerDef::Filtering { right_type, .. } => {
                *right_type
            }
        }
    }

    pub fn joiner_type(&self) -> Option<JoinerType> {
        match self {
            JoinerDef::Indexed { joiner_type, .. } => Some(*joiner_type),
            JoinerDef::Filtering { .. } => None,
        }
    }
}

impl fmt::Debug for JoinerDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinerDef::Indexed { joiner_type, .. } => write!(f, "Indexed({:?})", joiner_type),
            JoinerDef::Filtering { .. } => f.write_str("Filtering"),
        }
    }
}

#[derive(Clone)]
struct IndexLevel {
    joiner_type: JoinerType,
    left: SmallVec<[KeyFn; 2]>,
    right: SmallVec<[KeyFn; 2]>,
}

impl IndexLevel {
    fn key(fns: &[KeyFn], tuple: &Tuple) -> Value {
        if fns.len() == 1 {
            (fns[0])(tuple)
        } else {
            Value::new(fns.iter().map(|f| f(tuple)).collect::<Vec<Value>>())
        }
    }
}

/// Joiners compiled into index levels plus one residual predicate.
///
/// Consecutive equal joiners share one hash level keyed by a composite
/// key. Every comparison joiner gets its own ordered level.
#[derive(Clone, Default)]
pub(crate) struct JoinerSet {
    levels: Vec<IndexLevel>,
    filters: Vec<PairPredicate>,
}

impl JoinerSet {
    pub(crate) fn compile(defs: &[JoinerDef]) -> Result<Self, BuildError> {
        let mut set = JoinerSet::default();
        let mut first_filter = None;

        for (position, def) in defs.iter().enumerate() {
            match def {
                JoinerDef::Indexed {
                    joiner_type,
                    left,
                    right,
                    ..
                } => {
                    if let Some(position) = first_filter {
                        return Err(BuildError::FilteringBeforeIndexing { position });
                    }
                    let extends_equal = *joiner_type == JoinerType::Equal
                        && set
                            .levels
                            .last()
                            .is_some_and(|l| l.joiner_type == JoinerType::Equal);
                    if let Some(level) = set.levels.last_mut().filter(|_| extends_equal) {
                        level.left.push(Arc::clone(left));
                        level.right.push(Arc::clone(right));
                    } else {
                        set.levels.push(IndexLevel {
                            joiner_type: *joiner_type,
                            left: SmallVec::from_elem(Arc::clone(left), 1),
                            right: SmallVec::from_elem(Arc::clone(right), 1),
                        });
                    }
                }
                JoinerDef::Filtering { predicate, .. } => {
                    first_filter.get_or_insert(position);
                    set.filters.push(Arc::clone(predicate));
                }
            }
        }
        Ok(set)
    }

    /// Level kinds for the index holding left tuples.
    pub(crate) fn left_kinds(&self) -> Vec<JoinerType> {
        self.levels.iter().map(|l| l.joiner_type).collect()
    }

    /// Level kinds for the index holding right tuples.
    pub(crate) fn right_kinds(&self) -> Vec<JoinerType> {
        self.levels.iter().map(|l| l.joiner_type.flip()).collect()
    }

    pub(crate) fn left_keys(&self, tuple: &Tuple) -> IndexKeys {
        self.levels
            .iter()
            .map(|l| IndexLevel::key(&l.left, tuple))
            .collect()
    }

    pub(crate) fn right_keys(&self, tuple: &Tuple) -> IndexKeys {
        self.levels
            .iter()
            .map(|l| IndexLevel::key(&l.right, tuple))
            .collect()
    }

    /// Evaluates the filtering joiners on a pair the index already matched.
    pub(crate) fn accepts(&self, left: &Tuple, right: &Tuple) -> bool {
        self.filters.iter().all(|f| f(left, right))
    }

    pub(crate) fn level_count(&self) -> usize {
        self.levels.len()
    }
}
