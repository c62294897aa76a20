//! Shared test fixtures for TupleForge crates.
//!
//! This crate provides plain data types and a seeded population generator.
//! It does NOT depend on `tupleforge-scoring` to avoid circular dependencies.
//!
//! - [`entity`] - Entities, entity groups, values and value groups
//! - [`population`] - Reproducible random populations of those types
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! tupleforge-test = { workspace = true }
//! ```
//!
//! Then generate a population:
//!
//! ```
//! use tupleforge_test::{PopulationSizes, TestPopulation};
//!
//! let population = TestPopulation::generate(7, PopulationSizes::small());
//! assert_eq!(population.entities.len(), PopulationSizes::small().entities);
//! ```

pub mod entity;
pub mod population;

pub use entity::{TestEntity, TestEntityGroup, TestValue, TestValueGroup};
pub use population::{PopulationSizes, TestPopulation};
