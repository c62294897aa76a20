//! Fact handles.
//!
//! A fact is an opaque domain value owned by the session. Its identity is
//! the handle id assigned on insertion, never structural equality: two
//! equal-looking facts inserted twice are two facts.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of an inserted fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(pub u64);

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Types that can be inserted into a session as facts.
pub trait Fact: Debug + Send + Sync + 'static {}

impl<T: Debug + Send + Sync + 'static> Fact for T {}

/// Object-safe view of a fact payload.
pub trait FactData: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Debug + Send + Sync> FactData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Handle to an inserted fact.
///
/// Cloning is cheap; the payload is shared. Equality, hashing and ordering
/// use only the [`FactId`].
#[derive(Clone)]
pub struct FactHandle {
    id: FactId,
    type_id: TypeId,
    type_name: &'static str,
    data: Arc<dyn FactData>,
}

impl FactHandle {
    pub fn new<T: Debug + Send + Sync + 'static>(id: FactId, data: T) -> Self {
        Self {
            id,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            data: Arc::new(data),
        }
    }

    #[inline]
    pub fn id(&self) -> FactId {
        self.id
    }

    /// Returns the `TypeId` of the payload.
    #[inline]
    pub fn fact_type(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name without its module path.
    pub fn short_type_name(&self) -> &'static str {
        self.type_name.rsplit("::").next().unwrap_or(self.type_name)
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (*self.data).as_any().downcast_ref::<T>()
    }

    /// Returns a handle with the same identity and a new payload.
    ///
    /// The payload type must not change across an update.
    pub fn with_data<T: Debug + Send + Sync + 'static>(&self, data: T) -> Option<Self> {
        if TypeId::of::<T>() != self.type_id {
            return None;
        }
        Some(Self {
            id: self.id,
            type_id: self.type_id,
            type_name: self.type_name,
            data: Arc::new(data),
        })
    }
}

impl Debug for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.data, f)
    }
}

impl PartialEq for FactHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FactHandle {}

impl Hash for FactHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for FactHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FactHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
