use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rust_decimal::Decimal;
use tupleforge_config::{EnvironmentMode, SessionConfig};
use tupleforge_core::{
    FactHandle, FactId, HardSoftDecimalScore, HardSoftScore, InvariantViolation, SimpleScore,
    TupleForgeError, WeightError,
};
use tupleforge_test::{
    PopulationSizes, TestEntity, TestEntityGroup, TestPopulation, TestValue, TestValueGroup,
};

use super::{ConstraintSession, FactListener};
use crate::api::{ConstraintWeightOverrides, EntityRef};
use crate::collector::{count, count_distinct};
use crate::stream::joiner::{equal, equal_bi};
use crate::stream::ConstraintFactory;

fn build<Sc: tupleforge_core::ParseableScore>(
    factory: &ConstraintFactory<Sc>,
) -> ConstraintSession<Sc> {
    factory.build_session(&SessionConfig::default()).unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_group_count_over_self_join() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .join(equal(|e: &TestEntity| e.group.clone()))
        .group_by((), (count(),))
        .penalize_with(SimpleScore::of(1), |n: &usize| *n)
        .as_constraint("Group pairs");

    let mut session = build(&factory);
    let e1 = session.insert(TestEntity::unassigned("e1", "g1")).unwrap();
    session.insert(TestEntity::unassigned("e2", "g1")).unwrap();
    session.insert(TestEntity::unassigned("e3", "g1")).unwrap();
    session.insert(TestEntity::unassigned("e4", "g2")).unwrap();

    // 3 * 3 pairs in g1, 1 in g2; one group tuple for the whole stream
    assert_eq!(session.score(), SimpleScore::of(-10));
    assert_eq!(session.match_count("Group pairs"), Some(1));

    session.retract(&e1).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-5));
}

#[test]
fn test_group_count_over_quad_stream() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .join(equal_bi(
            |e: &TestEntity| e.value.clone(),
            |v: &TestValue| Some(v.code.clone()),
        ))
        .join(equal_bi(
            |_: &TestEntity, v: &TestValue| v.group.clone(),
            |g: &TestValueGroup| g.code.clone(),
        ))
        .join(equal_bi(
            |e: &TestEntity, _: &TestValue, _: &TestValueGroup| e.group.clone(),
            |g: &TestEntityGroup| g.code.clone(),
        ))
        .group_by((), (count(),))
        .penalize_with(SimpleScore::of(1), |n: &usize| *n)
        .as_constraint("Complete chains");

    let mut session = build(&factory);
    let v1 = TestValue::new("v1", "vg1");
    let v2 = TestValue::new("v2", "vg1");
    session.insert(TestEntityGroup::new("g1")).unwrap();
    session.insert(TestValueGroup::new("vg1")).unwrap();
    session.insert(v1.clone()).unwrap();
    session.insert(v2.clone()).unwrap();
    let entities: Vec<FactHandle> = (0..5)
        .map(|i| {
            let value = if i % 2 == 0 { &v1 } else { &v2 };
            let entity = TestEntity::assigned(format!("e{i}"), "g1", value);
            session.insert(entity).unwrap()
        })
        .collect();
    // Chains through a group nobody has are dropped.
    session.insert(TestEntity::assigned("e5", "g2", &v1)).unwrap();
    session.insert(TestEntity::unassigned("e6", "g1")).unwrap();

    assert_eq!(session.score(), SimpleScore::of(-5));
    assert_eq!(session.match_count("Complete chains"), Some(1));

    for entity in &entities[..3] {
        session.retract(entity).unwrap();
    }
    assert_eq!(session.score(), SimpleScore::of(-2));
}

#[test]
fn test_exists_without_joiners_over_chain() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .join(equal_bi(|e: &TestEntity| e.group.clone(), |g: &TestEntityGroup| {
            g.code.clone()
        }))
        .join(equal_bi(
            |e: &TestEntity, _: &TestEntityGroup| e.value.clone(),
            |v: &TestValue| Some(v.code.clone()),
        ))
        .if_exists::<TestValueGroup>(())
        .penalize(SimpleScore::of(1))
        .as_constraint("Chain with value group");

    let mut session = build(&factory);
    let value = TestValue::new("v1", "vg1");
    session.insert(TestEntityGroup::new("g1")).unwrap();
    session.insert(value.clone()).unwrap();
    session.insert(TestEntity::assigned("e1", "g1", &value)).unwrap();
    assert_eq!(session.match_count("Chain with value group"), Some(0));

    let vg1 = session.insert(TestValueGroup::new("vg1")).unwrap();
    assert_eq!(session.match_count("Chain with value group"), Some(1));

    // A second candidate does not re-emit the chain.
    let vg2 = session.insert(TestValueGroup::new("vg2")).unwrap();
    assert_eq!(session.match_count("Chain with value group"), Some(1));
    session.retract(&vg1).unwrap();
    assert_eq!(session.match_count("Chain with value group"), Some(1));

    session.retract(&vg2).unwrap();
    assert_eq!(session.match_count("Chain with value group"), Some(0));
    assert_eq!(session.score(), SimpleScore::ZERO);
}

#[test]
fn test_flatten_with_duplicates() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .join(equal_bi(|e: &TestEntity| e.group.clone(), |g: &TestEntityGroup| {
            g.code.clone()
        }))
        .join(equal_bi(
            |e: &TestEntity, _: &TestEntityGroup| e.value.clone(),
            |v: &TestValue| Some(v.code.clone()),
        ))
        .flatten_last(|v: &TestValue| vec![v.code.clone(), v.code.clone(), v.group.clone()])
        .penalize(SimpleScore::of(1))
        .as_constraint("Flattened");

    let mut session = build(&factory);
    let value = TestValue::new("v1", "vg1");
    session.insert(TestEntityGroup::new("g1")).unwrap();
    let v = session.insert(value.clone()).unwrap();
    for code in ["e1", "e2", "e3"] {
        session.insert(TestEntity::assigned(code, "g1", &value)).unwrap();
    }

    assert_eq!(session.match_count("Flattened"), Some(9));
    let per_item = session
        .match_tuples("Flattened")
        .unwrap()
        .iter()
        .fold(BTreeMap::new(), |mut acc, t| {
            *acc.entry(t.element::<String>(2).clone()).or_insert(0) += 1;
            acc
        });
    assert_eq!(per_item.get("v1"), Some(&6));
    assert_eq!(per_item.get("vg1"), Some(&3));

    session.retract(&v).unwrap();
    assert_eq!(session.match_count("Flattened"), Some(0));
}

#[test]
fn test_map_then_distinct() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .join(equal_bi(|e: &TestEntity| e.group.clone(), |g: &TestEntityGroup| {
            g.code.clone()
        }))
        .map(|e: &TestEntity, g: &TestEntityGroup| {
            BTreeSet::from([g.code.clone(), e.value.clone().unwrap_or_default()])
        })
        .distinct()
        .penalize(SimpleScore::of(1))
        .as_constraint("Distinct pairs");

    let mut session = build(&factory);
    let value = TestValue::new("v1", "vg1");
    session.insert(TestEntityGroup::new("g1")).unwrap();
    session.insert(TestEntityGroup::new("g2")).unwrap();
    let e1 = session.insert(TestEntity::assigned("e1", "g1", &value)).unwrap();
    let e2 = session.insert(TestEntity::assigned("e2", "g1", &value)).unwrap();
    session.insert(TestEntity::assigned("e3", "g2", &value)).unwrap();

    assert_eq!(session.match_count("Distinct pairs"), Some(2));

    session.retract(&e1).unwrap();
    assert_eq!(session.match_count("Distinct pairs"), Some(2));
    session.retract(&e2).unwrap();
    assert_eq!(session.match_count("Distinct pairs"), Some(1));
}

fn shared_value_pairs(weight: Option<i32>) -> SimpleScore {
    let factory = ConstraintFactory::<SimpleScore>::new();
    let pairs = factory
        .for_each_unique_pair(equal(|e: &TestEntity| e.value.clone()))
        .filter(|a: &TestEntity, _: &TestEntity| a.value.is_some());
    let builder = match weight {
        Some(w) => {
            pairs.penalize_with(SimpleScore::of(1), move |_: &TestEntity, _: &TestEntity| w)
        }
        None => pairs.penalize(SimpleScore::of(1)),
    };
    builder.as_constraint("Shared value");

    let mut session = build(&factory);
    let v1 = TestValue::new("v1", "vg1");
    let v2 = TestValue::new("v2", "vg1");
    session.insert(TestEntity::assigned("e1", "g1", &v1)).unwrap();
    session.insert(TestEntity::assigned("e2", "g1", &v1)).unwrap();
    session.insert(TestEntity::assigned("e3", "g1", &v2)).unwrap();
    session.insert(TestEntity::assigned("e4", "g2", &v2)).unwrap();
    session.insert(TestEntity::unassigned("e5", "g2")).unwrap();
    session.insert(TestEntity::unassigned("e6", "g2")).unwrap();
    session.score()
}

#[test]
fn test_penalize_constant_vs_weight_function() {
    assert_eq!(shared_value_pairs(None), SimpleScore::of(-2));
    assert_eq!(shared_value_pairs(Some(2)), SimpleScore::of(-4));
}

// ============================================================================
// Properties over generated populations
// ============================================================================

fn roster_constraints(factory: &ConstraintFactory<HardSoftScore>) {
    factory
        .for_each_unique_pair(equal(|e: &TestEntity| e.value.clone()))
        .filter(|a: &TestEntity, _: &TestEntity| a.value.is_some())
        .penalize(HardSoftScore::ONE_HARD)
        .as_constraint_in("roster", "Value conflict");

    factory
        .for_each::<TestEntity>()
        .filter(|e: &TestEntity| e.value.is_none())
        .penalize(HardSoftScore::ONE_SOFT)
        .as_constraint_in("roster", "Unassigned");

    factory
        .for_each::<TestEntity>()
        .join(equal_bi(|e: &TestEntity| e.value.clone(), |v: &TestValue| {
            Some(v.code.clone())
        }))
        .group_by(
            (|e: &TestEntity, _: &TestValue| e.group.clone(),),
            (count_distinct(|_: &TestEntity, v: &TestValue| v.group.clone()),),
        )
        .filter(|_: &String, groups: &usize| *groups > 1)
        .penalize_with(HardSoftScore::ONE_SOFT, |_: &String, groups: &usize| {
            *groups - 1
        })
        .as_constraint_in("roster", "Group spread");

    factory
        .for_each::<TestValue>()
        .if_not_exists(equal_bi(|v: &TestValue| Some(v.code.clone()), |e: &TestEntity| {
            e.value.clone()
        }))
        .penalize(HardSoftScore::ONE_SOFT)
        .as_constraint_in("roster", "Unused value");

    factory
        .for_each::<TestEntity>()
        .map(|e: &TestEntity| e.group.clone())
        .distinct()
        .reward(HardSoftScore::ONE_SOFT)
        .as_constraint_in("roster", "Groups in use");
}

const ROSTER: [&str; 5] = [
    "roster/Value conflict",
    "roster/Unassigned",
    "roster/Group spread",
    "roster/Unused value",
    "roster/Groups in use",
];

fn roster_session(config: &SessionConfig) -> ConstraintSession<HardSoftScore> {
    let factory = ConstraintFactory::new();
    roster_constraints(&factory);
    factory.build_session(config).unwrap()
}

fn snapshot(session: &ConstraintSession<HardSoftScore>) -> (HardSoftScore, Vec<usize>) {
    let counts = ROSTER
        .iter()
        .map(|name| session.match_count(name).unwrap())
        .collect();
    (session.score(), counts)
}

/// Scores the population in a fresh session, inserting in shuffled order.
fn from_scratch(population: &mut TestPopulation) -> (HardSoftScore, Vec<usize>) {
    let mut session = roster_session(&SessionConfig::default());
    let entities = population.entities.clone();
    let values = population.values.clone();
    for entity in population.shuffled(&entities) {
        session.insert(entity).unwrap();
    }
    for value in population.shuffled(&values) {
        session.insert(value).unwrap();
    }
    snapshot(&session)
}

/// Inserts the population, then applies `steps` random reassignments,
/// retractions and reinsertions.
fn run_workload(
    population: &mut TestPopulation,
    session: &mut ConstraintSession<HardSoftScore>,
    steps: usize,
) {
    for value in population.values.clone() {
        session.insert(value).unwrap();
    }
    let mut handles: Vec<FactHandle> = population
        .entities
        .clone()
        .into_iter()
        .map(|e| session.insert(e).unwrap())
        .collect();

    for _ in 0..steps {
        let index = population.random_entity_index();
        if population.rng().random_bool(0.1) {
            session.retract(&handles[index]).unwrap();
            handles[index] = session.insert(population.entities[index].clone()).unwrap();
        } else {
            let moved = population.reassigned(index);
            handles[index] = session.update(&handles[index], moved.clone()).unwrap();
            population.entities[index] = moved;
        }
    }
}

#[test]
fn test_incremental_matches_from_scratch() {
    for seed in [1, 7, 42, 1234] {
        let mut population = TestPopulation::generate(seed, PopulationSizes::medium());
        let mut session = roster_session(&SessionConfig::default());
        run_workload(&mut population, &mut session, 200);

        let incremental = snapshot(&session);
        assert_eq!(incremental, from_scratch(&mut population), "seed {}", seed);
    }
}

#[test]
fn test_insertion_order_does_not_change_matches() {
    let mut population = TestPopulation::generate(99, PopulationSizes::medium());
    let first = from_scratch(&mut population);
    for _ in 0..5 {
        assert_eq!(from_scratch(&mut population), first);
    }
}

#[test]
fn test_retracting_everything_restores_empty_state() {
    let mut population = TestPopulation::generate(5, PopulationSizes::medium());
    let mut session = roster_session(&SessionConfig::default());
    let empty = snapshot(&session);

    let mut handles = Vec::new();
    for value in population.values.clone() {
        handles.push(session.insert(value).unwrap());
    }
    for entity in population.entities.clone() {
        handles.push(session.insert(entity).unwrap());
    }
    assert_ne!(snapshot(&session), empty);

    for handle in population.shuffled(&handles) {
        session.retract(&handle).unwrap();
    }
    assert_eq!(snapshot(&session), empty);
    assert_eq!(session.fact_count(), 0);
    assert_eq!(session.explain().total_match_count(), 0);
}

#[test]
fn test_insert_then_retract_is_idempotent() {
    let mut population = TestPopulation::generate(11, PopulationSizes::small());
    let mut session = roster_session(&SessionConfig::default());
    run_workload(&mut population, &mut session, 20);
    let before = snapshot(&session);

    let value = TestValue::new("extra", "vg0");
    let entity = TestEntity::assigned("extra", "eg0", &value);
    let h1 = session.insert(value).unwrap();
    let h2 = session.insert(entity).unwrap();
    session.retract(&h1).unwrap();
    session.retract(&h2).unwrap();

    assert_eq!(snapshot(&session), before);
}

#[test]
fn test_join_matches_naive_cross_product() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .join(equal_bi(|e: &TestEntity| e.value.clone(), |v: &TestValue| {
            Some(v.code.clone())
        }))
        .penalize(SimpleScore::of(1))
        .as_constraint("Assigned");

    let mut population = TestPopulation::generate(21, PopulationSizes::medium());
    let mut session = build(&factory);
    let entities = population.entities.clone();
    let values = population.values.clone();
    for value in population.shuffled(&values) {
        session.insert(value).unwrap();
    }
    for entity in population.shuffled(&entities) {
        session.insert(entity).unwrap();
    }

    let expected: BTreeSet<(String, String)> = entities
        .iter()
        .flat_map(|e| values.iter().map(move |v| (e, v)))
        .filter(|(e, v)| e.value.as_deref() == Some(v.code.as_str()))
        .map(|(e, v)| (e.code.clone(), v.code.clone()))
        .collect();
    let actual: BTreeSet<(String, String)> = session
        .match_tuples("Assigned")
        .unwrap()
        .iter()
        .map(|t| {
            (
                t.element::<TestEntity>(0).code.clone(),
                t.element::<TestValue>(1).code.clone(),
            )
        })
        .collect();
    assert_eq!(actual, expected);
    assert_eq!(session.match_count("Assigned"), Some(expected.len()));
}

#[test]
fn test_group_disappears_when_last_member_leaves() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .group_by((|e: &TestEntity| e.group.clone(),), (count(),))
        .penalize(SimpleScore::of(1))
        .as_constraint("Group");

    let mut session = build(&factory);
    let a = session.insert(TestEntity::unassigned("a", "g1")).unwrap();
    let b = session.insert(TestEntity::unassigned("b", "g1")).unwrap();
    assert_eq!(session.match_count("Group"), Some(1));

    session.retract(&a).unwrap();
    assert_eq!(session.match_count("Group"), Some(1));
    assert_eq!(session.match_tuples("Group").unwrap()[0].element::<usize>(1), &1);

    session.retract(&b).unwrap();
    assert_eq!(session.match_count("Group"), Some(0));
    assert_eq!(session.score(), SimpleScore::ZERO);
}

#[test]
fn test_update_moves_entity_between_groups() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .group_by((|e: &TestEntity| e.group.clone(),), (count(),))
        .penalize_with(SimpleScore::of(1), |_: &String, n: &usize| n * n)
        .as_constraint("Crowding");

    let mut session = build(&factory);
    let a = session.insert(TestEntity::unassigned("a", "g1")).unwrap();
    session.insert(TestEntity::unassigned("b", "g1")).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-4));

    let a = session.update(&a, TestEntity::unassigned("a", "g2")).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-2));
    assert_eq!(a.id(), FactId(0));
}

// ============================================================================
// Errors and poisoning
// ============================================================================

#[derive(Debug)]
struct Hours(i64);

#[test]
fn test_negative_weight_poisons_session() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Hours>()
        .penalize_with(SimpleScore::of(1), |h: &Hours| h.0)
        .as_constraint_in("pkg", "Hours");

    let mut session = build(&factory);
    session.insert(Hours(3)).unwrap();
    let err = session.insert(Hours(-1)).unwrap_err();
    assert_eq!(
        err,
        TupleForgeError::Weight {
            constraint: "pkg/Hours".to_string(),
            source: WeightError::Negative("-1".to_string()),
        }
    );
    assert!(session.is_poisoned());

    let err = session.insert(Hours(1)).unwrap_err();
    assert_eq!(err, TupleForgeError::from(InvariantViolation::Poisoned));
    // Introspection still works.
    assert!(session.explain().get("Hours").is_some());
}

#[test]
fn test_impact_accepts_negative_weight() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Hours>()
        .impact_with(SimpleScore::of(1), |h: &Hours| h.0)
        .as_constraint("Hours");

    let mut session = build(&factory);
    session.insert(Hours(3)).unwrap();
    session.insert(Hours(-5)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-2));
}

#[test]
fn test_fractional_weight_needs_decimal_score() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Hours>()
        .penalize_with(SimpleScore::of(1), |_: &Hours| Decimal::new(15, 1))
        .as_constraint("Half hours");
    let mut session = build(&factory);
    let err = session.insert(Hours(1)).unwrap_err();
    assert!(matches!(
        err,
        TupleForgeError::Weight {
            source: WeightError::NonIntegral(_),
            ..
        }
    ));

    let factory = ConstraintFactory::<HardSoftDecimalScore>::new();
    factory
        .for_each::<Hours>()
        .penalize_with(HardSoftDecimalScore::ONE_SOFT, |_: &Hours| Decimal::new(15, 1))
        .as_constraint("Half hours");
    let mut session = build(&factory);
    session.insert(Hours(1)).unwrap();
    assert_eq!(
        session.score(),
        HardSoftDecimalScore::of_decimal(Decimal::ZERO, Decimal::new(-15, 1)).unwrap()
    );
}

#[test]
fn test_running_total_overflow_poisons_session() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Hours>()
        .reward(SimpleScore::of(i64::MAX))
        .as_constraint("Unbounded");

    let mut session = build(&factory);
    session.insert(Hours(1)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(i64::MAX));

    let err = session.insert(Hours(2)).unwrap_err();
    assert_eq!(
        err,
        TupleForgeError::Weight {
            constraint: "Unbounded".to_string(),
            source: WeightError::Overflow,
        }
    );
    assert!(session.is_poisoned());
    // The rejected match left the score alone.
    assert_eq!(session.score(), SimpleScore::of(i64::MAX));
    assert_eq!(session.match_count("Unbounded"), Some(1));
}

fn hours_session() -> ConstraintSession<SimpleScore> {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Hours>()
        .penalize(SimpleScore::of(1))
        .as_constraint("Hours");
    build(&factory)
}

#[test]
fn test_duplicate_fact_insert() {
    let mut session = hours_session();
    let h = session.insert(Hours(1)).unwrap();
    let err = session.on_fact_inserted(h.clone()).unwrap_err();
    assert_eq!(err, TupleForgeError::from(InvariantViolation::DuplicateFact(h.id().0)));
    assert!(session.is_poisoned());
}

#[test]
fn test_retract_unknown_fact() {
    let mut session = hours_session();
    let stranger = FactHandle::new(FactId(77), Hours(1));
    let err = session.retract(&stranger).unwrap_err();
    assert_eq!(err, TupleForgeError::from(InvariantViolation::UnknownFact(77)));
}

#[test]
fn test_after_update_without_before_update() {
    let mut session = hours_session();
    let h = session.insert(Hours(1)).unwrap();
    let err = session.on_fact_after_update(h.clone()).unwrap_err();
    assert_eq!(err, TupleForgeError::from(InvariantViolation::UpdateNotStarted(h.id().0)));
}

#[test]
fn test_before_update_twice() {
    let mut session = hours_session();
    let h = session.insert(Hours(1)).unwrap();
    session.on_fact_before_update(&h).unwrap();
    let err = session.on_fact_before_update(&h).unwrap_err();
    assert_eq!(err, TupleForgeError::from(InvariantViolation::UpdateInProgress(h.id().0)));
}

#[test]
fn test_update_cannot_change_fact_type() {
    let mut session = hours_session();
    let h = session.insert(Hours(1)).unwrap();
    let err = session.update(&h, TestValue::new("v", "g")).unwrap_err();
    assert_eq!(err, TupleForgeError::from(InvariantViolation::FactTypeChanged(h.id().0)));
    assert!(session.is_poisoned());
}

#[test]
fn test_listener_protocol_update_in_two_steps() {
    let mut session = hours_session();
    let h = session.insert(Hours(1)).unwrap();
    session.insert(Hours(2)).unwrap();

    session.on_fact_before_update(&h).unwrap();
    // The retract is held back until the after-update settles.
    assert_eq!(session.match_count("Hours"), Some(2));
    session
        .on_fact_after_update(FactHandle::new(h.id(), Hours(5)))
        .unwrap();
    assert_eq!(session.match_count("Hours"), Some(2));
    assert_eq!(
        session.fact(h.id()).and_then(|f| f.downcast_ref::<Hours>()).map(|h| h.0),
        Some(5)
    );
}

#[test]
fn test_retract_during_update() {
    let mut session = hours_session();
    let h = session.insert(Hours(1)).unwrap();
    session.on_fact_before_update(&h).unwrap();
    session.on_fact_retracted(&h).unwrap();
    assert_eq!(session.match_count("Hours"), Some(0));
    assert_eq!(session.fact_count(), 0);
    assert!(!session.is_poisoned());
}

// ============================================================================
// Environment modes, explanation and configuration
// ============================================================================

#[test]
fn test_assert_modes_accept_consistent_workload() {
    for mode in [EnvironmentMode::FastAssert, EnvironmentMode::FullAssert] {
        let config = SessionConfig::default().with_environment_mode(mode);
        let mut population = TestPopulation::generate(3, PopulationSizes::small());
        let mut session = roster_session(&config);
        run_workload(&mut population, &mut session, 40);
        assert!(!session.is_poisoned());
        assert_eq!(session.environment_mode(), mode);
    }
}

#[test]
fn test_node_sharing_does_not_change_results() {
    let mut shared_population = TestPopulation::generate(17, PopulationSizes::medium());
    let mut split_population = shared_population.clone();

    let mut shared = roster_session(&SessionConfig::default());
    let mut split = roster_session(&SessionConfig::default().with_node_sharing(false));
    assert!(split.plan().node_count() > shared.plan().node_count());

    run_workload(&mut shared_population, &mut shared, 100);
    run_workload(&mut split_population, &mut split, 100);
    assert_eq!(snapshot(&shared), snapshot(&split));
}

#[test]
fn test_explain_and_indictments() {
    let mut session = roster_session(&SessionConfig::default());
    let value = TestValue::new("v1", "vg1");
    session.insert(value.clone()).unwrap();
    let a = session.insert(TestEntity::assigned("a", "g1", &value)).unwrap();
    let b = session.insert(TestEntity::assigned("b", "g1", &value)).unwrap();
    session.insert(TestEntity::unassigned("c", "g2")).unwrap();

    let explanation = session.explain();
    assert_eq!(explanation.score, session.score());
    let conflict = explanation.get("Value conflict").unwrap();
    assert_eq!(conflict.match_count(), 1);
    assert_eq!(conflict.score, HardSoftScore::of_hard(-1));
    assert_eq!(
        explanation.get("roster/Unassigned").unwrap().match_count(),
        1
    );

    let indictments = session.indictments();
    let of_a = indictments.get(&EntityRef::from_value(a.into())).unwrap();
    assert_eq!(of_a.score, HardSoftScore::of_hard(-1));
    assert!(indictments.get(&EntityRef::from_value(b.into())).is_some());
}

#[test]
fn test_configured_weight_overrides() {
    let config = SessionConfig::from_toml_str(
        r#"
        [constraint_weights]
        "roster/Unassigned" = "3hard/0soft"
        "Groups in use" = "0hard/0soft"
        "#,
    )
    .unwrap();
    let mut session = roster_session(&config);
    session.insert(TestEntity::unassigned("a", "g1")).unwrap();
    assert_eq!(session.score(), HardSoftScore::of_hard(-3));

    let factory = ConstraintFactory::new();
    roster_constraints(&factory);
    let mut overrides = ConstraintWeightOverrides::new();
    overrides.put("Unassigned", HardSoftScore::of_soft(10));
    let mut session = factory
        .build_session_with(&SessionConfig::default(), &overrides)
        .unwrap();
    session.insert(TestEntity::unassigned("a", "g1")).unwrap();
    assert_eq!(
        session.constraint_score("Unassigned"),
        Some(HardSoftScore::of_soft(-10))
    );
}

#[test]
fn test_invalid_configured_weight() {
    let config = SessionConfig::default().with_constraint_weight("roster/Unassigned", "heavy");
    let factory = ConstraintFactory::<HardSoftScore>::new();
    roster_constraints(&factory);
    let err = factory.build_session(&config).unwrap_err();
    assert!(matches!(err, TupleForgeError::Config(_)));
}
