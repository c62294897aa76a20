use std::collections::BTreeSet;

use tupleforge_config::SessionConfig;
use tupleforge_core::{BuildError, HardSoftScore, SimpleScore, TupleForgeError, Value};
use tupleforge_test::{TestEntity, TestValue};

use super::joiner::{equal, equal_bi, filtering, greater_than, less_than};
use super::ConstraintFactory;
use crate::api::{ConstraintJustification, EntityRef};
use crate::collector::{count, max, sum, to_set};
use crate::graph::NodeType;
use crate::session::ConstraintSession;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Shift {
    id: u32,
    employee: Option<u32>,
    start: i64,
    end: i64,
}

impl Shift {
    fn new(id: u32, employee: Option<u32>, start: i64, end: i64) -> Self {
        Self {
            id,
            employee,
            start,
            end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Employee {
    id: u32,
    skills: Vec<String>,
}

fn session<Sc: tupleforge_core::ParseableScore>(
    factory: &ConstraintFactory<Sc>,
) -> ConstraintSession<Sc> {
    factory.build_session(&SessionConfig::default()).unwrap()
}

#[test]
fn test_filter_penalize_tracks_inserts_and_retracts() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_none())
        .penalize(SimpleScore::of(1))
        .as_constraint("Unassigned");

    let mut session = session(&factory);
    let a = session.insert(Shift::new(1, None, 0, 8)).unwrap();
    let b = session.insert(Shift::new(2, None, 8, 16)).unwrap();
    session.insert(Shift::new(3, Some(1), 0, 8)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-2));

    session.retract(&a).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-1));

    session.update(&b, Shift::new(2, Some(4), 8, 16)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(0));
    assert_eq!(session.match_count("Unassigned"), Some(0));
}

#[test]
fn test_join_equal_bi_counts_pairs() {
    let factory = ConstraintFactory::<HardSoftScore>::new();
    factory
        .for_each::<Employee>()
        .join(equal_bi(|e: &Employee| Some(e.id), |s: &Shift| s.employee))
        .penalize(HardSoftScore::ONE_SOFT)
        .as_constraint("Assigned shift");

    let mut session = session(&factory);
    session
        .insert(Employee {
            id: 1,
            skills: vec![],
        })
        .unwrap();
    session.insert(Shift::new(1, Some(1), 0, 8)).unwrap();
    session.insert(Shift::new(2, Some(1), 8, 16)).unwrap();
    session.insert(Shift::new(3, Some(2), 0, 8)).unwrap();
    session.insert(Shift::new(4, None, 0, 8)).unwrap();

    assert_eq!(session.score(), HardSoftScore::of_soft(-2));
    let tuples = session.match_tuples("Assigned shift").unwrap();
    let shift_ids: BTreeSet<u32> = tuples.iter().map(|t| t.element::<Shift>(1).id).collect();
    assert_eq!(shift_ids, BTreeSet::from([1, 2]));
}

#[test]
fn test_unique_pair_reports_each_pair_once() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each_unique_pair(equal(|s: &Shift| s.employee))
        .filter(|a: &Shift, b: &Shift| a.employee.is_some() && a.start < b.end && b.start < a.end)
        .penalize(SimpleScore::of(1))
        .as_constraint("Overlap");

    let mut session = session(&factory);
    session.insert(Shift::new(1, Some(1), 0, 8)).unwrap();
    session.insert(Shift::new(2, Some(1), 4, 12)).unwrap();
    session.insert(Shift::new(3, Some(1), 6, 10)).unwrap();
    session.insert(Shift::new(4, Some(2), 0, 8)).unwrap();

    // (1,2), (1,3), (2,3)
    assert_eq!(session.score(), SimpleScore::of(-3));
    for tuple in session.match_tuples("Overlap").unwrap() {
        assert!(tuple.element::<Shift>(0).id < tuple.element::<Shift>(1).id);
    }
}

#[test]
fn test_comparison_joiner_uses_ordering() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .join(less_than(|a: &Shift| a.end, |b: &Shift| b.start))
        .penalize(SimpleScore::of(1))
        .as_constraint("Sequential");

    let mut session = session(&factory);
    session.insert(Shift::new(1, None, 0, 4)).unwrap();
    session.insert(Shift::new(2, None, 5, 9)).unwrap();
    session.insert(Shift::new(3, None, 10, 12)).unwrap();

    // 1 before 2, 1 before 3, 2 before 3
    assert_eq!(session.score(), SimpleScore::of(-3));
}

#[test]
fn test_indexed_and_filtering_joiners_combine() {
    use super::joiner::Joiner;

    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .join(
            equal(|s: &Shift| s.employee)
                .and(greater_than(|a: &Shift| a.start, |b: &Shift| b.start))
                .and(filtering(|a: &Shift, b: &Shift| a.id != b.id + 10)),
        )
        .penalize(SimpleScore::of(1))
        .as_constraint("Later shift");

    let mut session = session(&factory);
    session.insert(Shift::new(1, Some(1), 0, 4)).unwrap();
    session.insert(Shift::new(2, Some(1), 4, 8)).unwrap();
    session.insert(Shift::new(11, Some(1), 8, 12)).unwrap();
    session.insert(Shift::new(3, Some(2), 8, 12)).unwrap();

    // (2,1), (11,2); (11,1) is filtered out
    assert_eq!(session.score(), SimpleScore::of(-2));
}

#[test]
fn test_if_exists_and_if_not_exists() {
    let factory = ConstraintFactory::<HardSoftScore>::new();
    factory
        .for_each::<Employee>()
        .if_not_exists(equal_bi(|e: &Employee| Some(e.id), |s: &Shift| s.employee))
        .penalize(HardSoftScore::ONE_SOFT)
        .as_constraint("Idle employee");
    factory
        .for_each::<Shift>()
        .if_exists(equal_bi(|s: &Shift| s.employee, |e: &Employee| Some(e.id)))
        .reward(HardSoftScore::ONE_HARD)
        .as_constraint("Staffed shift");

    let mut session = session(&factory);
    let alice = Employee {
        id: 1,
        skills: vec![],
    };
    session.insert(alice).unwrap();
    assert_eq!(session.score(), HardSoftScore::of(0, -1));

    let shift = session.insert(Shift::new(1, Some(1), 0, 8)).unwrap();
    assert_eq!(session.score(), HardSoftScore::of(1, 0));

    session.retract(&shift).unwrap();
    assert_eq!(session.score(), HardSoftScore::of(0, -1));
}

#[test]
fn test_exists_in_filtered_stream() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    let unassigned = factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_none());
    factory
        .for_each::<TestValue>()
        .if_exists_in(unassigned, ())
        .penalize(SimpleScore::of(1))
        .as_constraint("Values while unassigned");

    let mut session = session(&factory);
    session.insert(TestValue::new("v1", "vg")).unwrap();
    session.insert(Shift::new(1, Some(1), 0, 8)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(0));
    let open = session.insert(Shift::new(2, None, 0, 8)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-1));
    session.update(&open, Shift::new(2, Some(3), 0, 8)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(0));
}

#[test]
fn test_group_by_key_with_sum_and_max() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_some())
        .group_by(
            (|s: &Shift| s.employee,),
            (sum(|s: &Shift| s.end - s.start), max(|s: &Shift| s.end)),
        )
        .filter(|_: &Option<u32>, hours: &i64, _: &Option<i64>| *hours > 8)
        .penalize_with(SimpleScore::of(1), |_: &Option<u32>, hours: &i64, _: &Option<i64>| {
            *hours - 8
        })
        .as_constraint("Overtime");

    let mut session = session(&factory);
    session.insert(Shift::new(1, Some(1), 0, 8)).unwrap();
    let late = session.insert(Shift::new(2, Some(1), 8, 12)).unwrap();
    session.insert(Shift::new(3, Some(2), 0, 6)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-4));

    let tuples = session.match_tuples("Overtime").unwrap();
    assert_eq!(tuples.len(), 1);
    assert_eq!(tuples[0].element::<Option<i64>>(2), &Some(12));

    session.retract(&late).unwrap();
    assert_eq!(session.score(), SimpleScore::of(0));
}

#[test]
fn test_group_by_without_keys_emits_single_tuple() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .group_by((), (count(),))
        .penalize_with(SimpleScore::of(1), |n: &usize| *n)
        .as_constraint("Shift count");

    let mut session = session(&factory);
    assert_eq!(session.match_count("Shift count"), Some(0));
    let a = session.insert(Shift::new(1, None, 0, 8)).unwrap();
    session.insert(Shift::new(2, None, 0, 8)).unwrap();
    assert_eq!(session.match_count("Shift count"), Some(1));
    assert_eq!(session.score(), SimpleScore::of(-2));
    session.retract(&a).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-1));
}

#[test]
fn test_group_by_two_keys_to_set() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .group_by(
            (|e: &TestEntity| e.group.clone(), |e: &TestEntity| e.value.is_some()),
            (to_set(|e: &TestEntity| e.code.clone()),),
        )
        .filter(|_: &String, assigned: &bool, _: &BTreeSet<String>| !*assigned)
        .penalize_with(
            SimpleScore::of(1),
            |_: &String, _: &bool, codes: &BTreeSet<String>| codes.len(),
        )
        .as_constraint("Unassigned per group");

    let mut session = session(&factory);
    let v = TestValue::new("v1", "vg1");
    session.insert(TestEntity::unassigned("e1", "eg1")).unwrap();
    session.insert(TestEntity::unassigned("e2", "eg1")).unwrap();
    session.insert(TestEntity::unassigned("e3", "eg2")).unwrap();
    session.insert(TestEntity::assigned("e4", "eg2", &v)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-3));
    assert_eq!(session.match_count("Unassigned per group"), Some(2));
}

#[test]
fn test_map_and_distinct() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .map(|e: &TestEntity| e.group.clone())
        .distinct()
        .penalize(SimpleScore::of(1))
        .as_constraint("Used group");

    let mut session = session(&factory);
    let e1 = session.insert(TestEntity::unassigned("e1", "eg1")).unwrap();
    session.insert(TestEntity::unassigned("e2", "eg1")).unwrap();
    session.insert(TestEntity::unassigned("e3", "eg2")).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-2));

    session.retract(&e1).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-2));
}

#[test]
fn test_map2_builds_bi_stream() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .map2(|s: &Shift| s.employee, |s: &Shift| s.end - s.start)
        .filter(|employee: &Option<u32>, _: &i64| employee.is_none())
        .penalize_with(SimpleScore::of(1), |_: &Option<u32>, hours: &i64| *hours)
        .as_constraint("Unstaffed hours");

    let mut session = session(&factory);
    session.insert(Shift::new(1, None, 0, 8)).unwrap();
    session.insert(Shift::new(2, Some(1), 0, 8)).unwrap();
    session.insert(Shift::new(3, None, 10, 12)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-10));
}

#[test]
fn test_flatten_last_expands_collections() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Employee>()
        .flatten_last(|e: &Employee| e.skills.clone())
        .filter(|skill: &String| skill.starts_with("night"))
        .penalize(SimpleScore::of(1))
        .as_constraint("Night skill");

    let mut session = session(&factory);
    let e = session
        .insert(Employee {
            id: 1,
            skills: vec!["night-a".into(), "day".into(), "night-b".into()],
        })
        .unwrap();
    assert_eq!(session.score(), SimpleScore::of(-2));
    session.retract(&e).unwrap();
    assert_eq!(session.score(), SimpleScore::of(0));
}

#[test]
fn test_bi_flatten_last_keeps_left_element() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .join(equal_bi(|s: &Shift| s.employee, |e: &Employee| Some(e.id)))
        .flatten_last(|e: &Employee| e.skills.clone())
        .filter(|s: &Shift, skill: &String| s.start >= 20 && skill == "night")
        .penalize(SimpleScore::of(1))
        .as_constraint("Night shift skill");

    let mut session = session(&factory);
    session
        .insert(Employee {
            id: 1,
            skills: vec!["night".into(), "night".into()],
        })
        .unwrap();
    session.insert(Shift::new(1, Some(1), 22, 30)).unwrap();
    session.insert(Shift::new(2, Some(1), 8, 16)).unwrap();
    // Duplicates in the flattened collection are separate tuples.
    assert_eq!(session.score(), SimpleScore::of(-2));
}

#[test]
fn test_tri_join_and_quad_join() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .join(equal_bi(
            |e: &TestEntity| e.value.clone(),
            |v: &TestValue| Some(v.code.clone()),
        ))
        .join(equal_bi(
            |_: &TestEntity, v: &TestValue| v.group.clone(),
            |g: &tupleforge_test::TestValueGroup| g.code.clone(),
        ))
        .join(filtering(
            |e: &TestEntity, _: &TestValue, _: &tupleforge_test::TestValueGroup, o: &Employee| {
                e.code.len() as u32 == o.id
            },
        ))
        .penalize(SimpleScore::of(1))
        .as_constraint("Chain");

    let mut session = session(&factory);
    let v = TestValue::new("v1", "vg1");
    session.insert(tupleforge_test::TestValueGroup::new("vg1")).unwrap();
    session.insert(v.clone()).unwrap();
    session.insert(TestEntity::assigned("e1", "eg1", &v)).unwrap();
    session.insert(TestEntity::unassigned("e2", "eg1")).unwrap();
    session
        .insert(Employee {
            id: 2,
            skills: vec![],
        })
        .unwrap();
    assert_eq!(session.score(), SimpleScore::of(-1));
    assert_eq!(session.match_tuples("Chain").unwrap()[0].arity(), 4);
}

#[test]
fn test_quad_if_exists_with_filtering() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<TestEntity>()
        .join(equal_bi(
            |e: &TestEntity| e.value.clone(),
            |v: &TestValue| Some(v.code.clone()),
        ))
        .join(equal_bi(|_: &TestEntity, _: &TestValue| 0i64, |s: &Shift| s.start))
        .join(less_than(|_: &TestEntity, _: &TestValue, a: &Shift| a.id, |b: &Shift| b.id))
        .if_exists(filtering(
            |_: &TestEntity, _: &TestValue, a: &Shift, b: &Shift, o: &Employee| {
                a.employee == Some(o.id) && b.employee == Some(o.id)
            },
        ))
        .penalize(SimpleScore::of(1))
        .as_constraint("Double booked");

    let mut session = session(&factory);
    let v = TestValue::new("v1", "vg1");
    session.insert(v.clone()).unwrap();
    session.insert(TestEntity::assigned("e1", "g1", &v)).unwrap();
    session.insert(Shift::new(1, Some(7), 0, 8)).unwrap();
    session.insert(Shift::new(2, Some(7), 0, 8)).unwrap();
    session.insert(Shift::new(3, Some(8), 0, 8)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(0));

    let alice = session
        .insert(Employee {
            id: 7,
            skills: vec![],
        })
        .unwrap();
    assert_eq!(session.score(), SimpleScore::of(-1));
    assert_eq!(session.match_tuples("Double booked").unwrap()[0].arity(), 4);

    session.retract(&alice).unwrap();
    assert_eq!(session.score(), SimpleScore::of(0));
}

#[test]
fn test_group_by_key_on_quad_stream() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .join(equal(|s: &Shift| s.start))
        .join(equal_bi(|a: &Shift, _: &Shift| a.start, |c: &Shift| c.start))
        .join(equal_bi(
            |a: &Shift, _: &Shift, _: &Shift| a.start,
            |d: &Shift| d.start,
        ))
        .group_by(
            (|a: &Shift, _: &Shift, _: &Shift, _: &Shift| a.start,),
            (count(),),
        )
        .filter(|start: &i64, _: &usize| *start == 0)
        .penalize_with(SimpleScore::of(1), |_: &i64, n: &usize| *n)
        .as_constraint("Quadruple overlaps");

    let mut session = session(&factory);
    session.insert(Shift::new(1, None, 0, 8)).unwrap();
    let late = session.insert(Shift::new(2, None, 8, 16)).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-1));

    session.insert(Shift::new(3, None, 0, 4)).unwrap();
    // 2^4 quads start at 0
    assert_eq!(session.score(), SimpleScore::of(-16));
    session.retract(&late).unwrap();
    assert_eq!(session.score(), SimpleScore::of(-16));
}

#[test]
fn test_reward_and_impact_with_weights() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .reward_with(SimpleScore::of(2), |s: &Shift| (s.end - s.start) as i32)
        .as_constraint("Hours");
    factory
        .for_each::<Shift>()
        .impact_with(SimpleScore::of(1), |s: &Shift| 4 - (s.end - s.start))
        .as_constraint("Balance");

    let mut session = session(&factory);
    session.insert(Shift::new(1, None, 0, 8)).unwrap();
    // reward 2 * 8, impact 1 * (4 - 8)
    assert_eq!(session.constraint_score("Hours"), Some(SimpleScore::of(16)));
    assert_eq!(session.constraint_score("Balance"), Some(SimpleScore::of(-4)));
    assert_eq!(session.score(), SimpleScore::of(12));
}

#[test]
fn test_custom_justification_and_indictment() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .filter(|s: &Shift| s.employee.is_none())
        .penalize(SimpleScore::of(1))
        .justify_with(|s: &Shift| {
            ConstraintJustification::with_description(
                vec![EntityRef::new(s.id)],
                format!("shift {} is unassigned", s.id),
            )
        })
        .indict_with(|s: &Shift| vec![Value::new(s.id)])
        .as_constraint_in("roster", "Unassigned");

    let mut session = session(&factory);
    session.insert(Shift::new(7, None, 0, 8)).unwrap();

    let matches = session.matches("roster/Unassigned").unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(
        matches[0].justification.description,
        "shift 7 is unassigned"
    );
    assert_eq!(matches[0].indicted, vec![EntityRef::new(7u32)]);
    assert!(session.indictments().get(&EntityRef::new(7u32)).is_some());
}

#[test]
fn test_unterminated_stream_fails_build() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    factory
        .for_each::<Shift>()
        .penalize(SimpleScore::of(1))
        .as_constraint("All shifts");
    let _dangling = factory
        .for_each::<Employee>()
        .filter(|e: &Employee| e.id > 3);

    let err = factory.build_session(&SessionConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        TupleForgeError::Build(BuildError::UnterminatedStream { .. })
    ));
}

#[test]
fn test_duplicate_constraint_name_fails_build() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    for _ in 0..2 {
        factory
            .for_each::<Shift>()
            .penalize(SimpleScore::of(1))
            .as_constraint("Twice");
    }
    let err = factory.build_plan(&SessionConfig::default()).unwrap_err();
    assert_eq!(err, BuildError::DuplicateConstraint("Twice".to_string()));
}

#[test]
fn test_streams_share_one_graph() {
    let factory = ConstraintFactory::<SimpleScore>::new();
    let shifts = factory.for_each::<Shift>();
    shifts
        .clone()
        .penalize(SimpleScore::of(1))
        .as_constraint("A");
    shifts
        .filter(|s: &Shift| s.start > 0)
        .penalize(SimpleScore::of(1))
        .as_constraint("B");

    let plan = factory.build_plan(&SessionConfig::default()).unwrap();
    let sources = plan
        .node_order()
        .iter()
        .filter(|&&n| plan.node_type(n) == Some(NodeType::From))
        .count();
    assert_eq!(sources, 1);
    assert_eq!(plan.constraint_count(), 2);
}
