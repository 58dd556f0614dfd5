use derived_repo::{Example, Filter, Query, RepoError, Sort, Value};

use crate::setup;
use crate::support::member::Member;
use crate::support::member_repository::MemberRepository;

fn seed(members: &MemberRepository) {
    for (name, age, score) in [("a", 10, 2.5), ("b", 20, 9.0), ("c", 30, 5.0)] {
        members
            .save(&Member::new(name, age).with_score(score))
            .unwrap();
    }
}

fn scores(members: &MemberRepository) -> Vec<f64> {
    members.find_all().unwrap().iter().map(|m| m.score).collect()
}

#[test]
fn float_fields_round_trip() {
    let (members, _) = setup();
    let saved = members.save(&Member::new("a", 10).with_score(7.25)).unwrap();
    assert_eq!(members.get(&saved.id.unwrap()).unwrap(), saved);
}

#[test]
fn sort_by_float_field() {
    let (members, _) = setup();
    seed(&members);

    let names = members
        .find_projected(&Query::all().with_sort(Sort::desc("score")), |m| m.username)
        .unwrap();
    assert_eq!(names, vec!["b", "c", "a"]);
}

#[test]
fn int_and_float_operands_compare_by_value() {
    let (members, _) = setup();
    seed(&members);

    assert_eq!(members.count_by(&Filter::new().gt("score", 5)).unwrap(), 1);
    assert_eq!(members.count_by(&Filter::new().ge("score", 5)).unwrap(), 2);
    assert_eq!(members.count_by(&Filter::new().equal("age", 20.0)).unwrap(), 1);
}

#[test]
fn bulk_update_on_float_field() {
    let (members, _) = setup();
    seed(&members);

    let updated = members
        .bulk_update(&Filter::new().lt("score", 6), "score", |s| s.plus(0.5))
        .unwrap();
    assert_eq!(updated, 2);
    assert_eq!(scores(&members), vec![3.0, 9.0, 5.5]);

    members
        .bulk_update(&Filter::all(), "score", |s| s.plus(1))
        .unwrap();
    assert_eq!(scores(&members), vec![4.0, 10.0, 6.5]);
}

#[test]
fn zero_score_is_left_out_of_examples() {
    let (members, _) = setup();
    seed(&members);

    let found = members
        .find_one_by_example(&Example::of(Member::named("b")))
        .unwrap()
        .unwrap();
    assert_eq!(found.score, 9.0);
}

#[test]
fn non_finite_scores_are_rejected() {
    let (members, _) = setup();
    seed(&members);

    for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = members
            .save(&Member::named("bad").with_score(score))
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    assert_eq!(members.count().unwrap(), 3);
    assert_eq!(members.find_all().unwrap().len(), 3);
}

#[test]
fn bulk_update_to_infinity_writes_nothing() {
    let (members, _) = setup();
    seed(&members);

    let err = members
        .bulk_update(&Filter::all(), "score", |_| Value::Float(f64::INFINITY))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(scores(&members), vec![2.5, 9.0, 5.0]);
}
