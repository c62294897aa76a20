//! Type-erased tuple values.
//!
//! Tuples carry heterogeneous elements: fact handles, group keys and
//! collector results. [`Value`] erases the concrete type while keeping
//! structural equality, hashing and a total order, so values can key hash
//! and ordered join indexes as well as group and distinct tables.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::fact::FactHandle;

/// Types usable as tuple elements produced by mappings, group keys and
/// collector results.
pub trait ValueType: Ord + Hash + Debug + Send + Sync + 'static {}

impl<T: Ord + Hash + Debug + Send + Sync + 'static> ValueType for T {}

/// Object-safe comparison surface implemented for every
/// `Ord + Hash + Debug + Send + Sync` type.
pub trait DynValue: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn value_type(&self) -> TypeId;
    fn type_name(&self) -> &'static str;
    fn dyn_eq(&self, other: &dyn DynValue) -> bool;
    fn dyn_cmp(&self, other: &dyn DynValue) -> Ordering;
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T: Ord + Hash + Debug + Send + Sync + 'static> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn dyn_eq(&self, other: &dyn DynValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    // Values of different types order by TypeId, which is stable within a
    // process but carries no meaning.
    fn dyn_cmp(&self, other: &dyn DynValue) -> Ordering {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => self.cmp(other),
            None => TypeId::of::<T>().cmp(&other.value_type()),
        }
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// A cheaply clonable, type-erased value.
///
/// # Examples
///
/// ```
/// use tupleforge_core::Value;
///
/// let a = Value::new(3u32);
/// assert_eq!(a, Value::new(3u32));
/// assert_ne!(a, Value::new(3u64));
/// assert!(Value::new(2u32) < Value::new(3u32));
/// assert_eq!(a.get::<u32>(), Some(&3));
/// ```
#[derive(Clone)]
pub struct Value(Arc<dyn DynValue>);

impl Value {
    /// Wraps a value. Wrapping a `Value` returns it unchanged.
    pub fn new<T: Ord + Hash + Debug + Send + Sync + 'static>(value: T) -> Self {
        if let Some(inner) = (&value as &dyn Any).downcast_ref::<Value>() {
            return inner.clone();
        }
        Value(Arc::new(value))
    }

    /// The value used as the key of an ungrouped aggregate.
    pub fn unit() -> Self {
        Value::new(())
    }

    /// Returns the wrapped value, or the payload of a wrapped fact handle.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        let any = self.0.as_any();
        if let Some(value) = any.downcast_ref::<T>() {
            return Some(value);
        }
        any.downcast_ref::<FactHandle>()
            .and_then(|handle| handle.downcast_ref::<T>())
    }

    pub fn as_fact(&self) -> Option<&FactHandle> {
        self.0.as_any().downcast_ref::<FactHandle>()
    }

    /// Returns the `TypeId` of the wrapped value.
    pub fn value_type(&self) -> TypeId {
        self.0.value_type()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }
}

impl From<FactHandle> for Value {
    fn from(handle: FactHandle) -> Self {
        Value(Arc::new(handle))
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.dyn_eq(&*other.0)
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.dyn_cmp(&*other.0)
    }
}
