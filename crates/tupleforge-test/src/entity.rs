//! Generic entity test fixtures.
//!
//! Entities belong to an entity group and may be assigned a value; values
//! belong to a value group. Groups and values are referenced by code so the
//! fixtures can be used as facts, join keys and group keys alike.
//!
//! # Example
//!
//! ```
//! use tupleforge_test::entity::{TestEntity, TestValue};
//!
//! let value = TestValue::new("v1", "vg1");
//! let entity = TestEntity::assigned("e1", "eg1", &value);
//! assert_eq!(entity.value.as_deref(), Some("v1"));
//! assert!(TestEntity::unassigned("e2", "eg1").value.is_none());
//! ```

/// A group that entities belong to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestEntityGroup {
    pub code: String,
}

impl TestEntityGroup {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// A group that values belong to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestValueGroup {
    pub code: String,
}

impl TestValueGroup {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// A value that can be assigned to entities.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestValue {
    pub code: String,
    pub group: String,
}

impl TestValue {
    pub fn new(code: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            group: group.into(),
        }
    }
}

/// A test entity with a group and an optional value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestEntity {
    pub code: String,
    pub group: String,
    pub value: Option<String>,
}

impl TestEntity {
    /// Creates a new test entity with the given group and value code.
    pub fn new(code: impl Into<String>, group: impl Into<String>, value: Option<String>) -> Self {
        Self {
            code: code.into(),
            group: group.into(),
            value,
        }
    }

    /// Creates a test entity assigned to `value`.
    pub fn assigned(code: impl Into<String>, group: impl Into<String>, value: &TestValue) -> Self {
        Self::new(code, group, Some(value.code.clone()))
    }

    /// Creates a test entity with no value assigned.
    pub fn unassigned(code: impl Into<String>, group: impl Into<String>) -> Self {
        Self::new(code, group, None)
    }

    /// Returns a copy of this entity assigned to `value`.
    pub fn with_value(&self, value: Option<&TestValue>) -> Self {
        Self {
            value: value.map(|v| v.code.clone()),
            ..self.clone()
        }
    }
}
