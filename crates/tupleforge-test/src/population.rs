//! Seeded random populations of test fixtures.
//!
//! The same seed and sizes always produce the same population, so property
//! tests can replay a failing case from its seed.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::entity::{TestEntity, TestEntityGroup, TestValue, TestValueGroup};

/// How many of each fixture a population holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationSizes {
    pub entity_groups: usize,
    pub value_groups: usize,
    pub values: usize,
    pub entities: usize,
    /// Percentage of entities left without a value.
    pub unassigned_percent: u32,
}

impl PopulationSizes {
    pub fn small() -> Self {
        Self {
            entity_groups: 2,
            value_groups: 2,
            values: 4,
            entities: 8,
            unassigned_percent: 20,
        }
    }

    pub fn medium() -> Self {
        Self {
            entity_groups: 5,
            value_groups: 3,
            values: 12,
            entities: 40,
            unassigned_percent: 10,
        }
    }
}

/// A reproducible population of groups, values and entities.
#[derive(Debug, Clone)]
pub struct TestPopulation {
    pub entity_groups: Vec<TestEntityGroup>,
    pub value_groups: Vec<TestValueGroup>,
    pub values: Vec<TestValue>,
    pub entities: Vec<TestEntity>,
    rng: ChaCha8Rng,
}

impl TestPopulation {
    /// Generates a population from `seed`.
    ///
    /// # Panics
    ///
    /// Panics if `sizes` asks for entities or values without any group.
    pub fn generate(seed: u64, sizes: PopulationSizes) -> Self {
        assert!(sizes.entities == 0 || sizes.entity_groups > 0);
        assert!(sizes.values == 0 || sizes.value_groups > 0);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let entity_groups: Vec<_> = (0..sizes.entity_groups)
            .map(|i| TestEntityGroup::new(format!("eg{}", i)))
            .collect();
        let value_groups: Vec<_> = (0..sizes.value_groups)
            .map(|i| TestValueGroup::new(format!("vg{}", i)))
            .collect();
        let values: Vec<_> = (0..sizes.values)
            .map(|i| {
                let group = &value_groups[rng.random_range(0..value_groups.len())];
                TestValue::new(format!("v{}", i), group.code.clone())
            })
            .collect();

        let mut population = Self {
            entity_groups,
            value_groups,
            values,
            entities: Vec::new(),
            rng,
        };
        for i in 0..sizes.entities {
            let group = population.random_entity_group().code.clone();
            let value = if population.rng.random_range(0..100) < sizes.unassigned_percent {
                None
            } else {
                population.random_value().map(|v| v.code.clone())
            };
            population
                .entities
                .push(TestEntity::new(format!("e{}", i), group, value));
        }
        population
    }

    /// The generator's random source, continuing after generation.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn random_value(&mut self) -> Option<&TestValue> {
        if self.values.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..self.values.len());
        self.values.get(index)
    }

    pub fn random_entity_group(&mut self) -> &TestEntityGroup {
        let index = self.rng.random_range(0..self.entity_groups.len());
        &self.entity_groups[index]
    }

    /// Index of a random entity.
    pub fn random_entity_index(&mut self) -> usize {
        self.rng.random_range(0..self.entities.len())
    }

    /// A random permutation of `items`.
    pub fn shuffled<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        out.shuffle(&mut self.rng);
        out
    }

    /// A copy of entity `index` with a random value, or none.
    pub fn reassigned(&mut self, index: usize) -> TestEntity {
        let value = if self.rng.random_bool(0.2) {
            None
        } else {
            self.random_value().cloned()
        };
        self.entities[index].with_value(value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_population() {
        let a = TestPopulation::generate(42, PopulationSizes::medium());
        let b = TestPopulation::generate(42, PopulationSizes::medium());
        assert_eq!(a.entities, b.entities);
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn test_values_reference_existing_groups() {
        let population = TestPopulation::generate(3, PopulationSizes::medium());
        for value in &population.values {
            assert!(population
                .value_groups
                .iter()
                .any(|g| g.code == value.group));
        }
        for entity in &population.entities {
            assert!(population
                .entity_groups
                .iter()
                .any(|g| g.code == entity.group));
        }
    }

    #[test]
    fn test_shuffled_is_permutation() {
        let mut population = TestPopulation::generate(9, PopulationSizes::small());
        let entities = population.entities.clone();
        let mut shuffled = population.shuffled(&entities);
        shuffled.sort();
        let mut sorted = entities;
        sorted.sort();
        assert_eq!(shuffled, sorted);
    }
}
