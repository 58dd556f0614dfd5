use derived_repo::{Filter, RepoError, Value};

use crate::setup;
use crate::support::member::Member;

fn seed(members: &crate::support::member_repository::MemberRepository) {
    for (i, age) in [10, 20, 30, 40, 50].into_iter().enumerate() {
        members.save(&Member::new(&format!("member{}", i + 1), age)).unwrap();
    }
}

#[test]
fn bulk_age_plus() {
    let (members, _) = setup();
    seed(&members);

    let updated = members.bulk_age_plus(30).unwrap();
    assert_eq!(updated, 3);

    let member5 = members.find_by_username("member5").unwrap().remove(0);
    assert_eq!(member5.age, 51);
}

#[test]
fn strictly_greater_updates_two() {
    let (members, _) = setup();
    seed(&members);

    let updated = members
        .bulk_update(&Filter::new().gt("age", 30), "age", |age| age.plus(1))
        .unwrap();
    assert_eq!(updated, 2);

    let ages: Vec<_> = members.find_all().unwrap().iter().map(|m| m.age).collect();
    assert_eq!(ages, vec![10, 20, 30, 41, 51]);
}

#[test]
fn caller_copies_are_not_refreshed() {
    let (members, _) = setup();
    seed(&members);
    let stale = members.find_by_username("member5").unwrap().remove(0);

    members.bulk_age_plus(30).unwrap();

    assert_eq!(stale.age, 50);
    assert_eq!(members.get(&stale.id.unwrap()).unwrap().age, 51);
}

#[test]
fn rejected_value_writes_nothing() {
    let (members, _) = setup();
    seed(&members);

    let err = members
        .bulk_update(&Filter::all(), "age", |age| match age.as_i64() {
            Some(50) => Value::Null,
            _ => age.plus(1),
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let ages: Vec<_> = members.find_all().unwrap().iter().map(|m| m.age).collect();
    assert_eq!(ages, vec![10, 20, 30, 40, 50]);
}

#[test]
fn overflow_is_rejected() {
    let (members, _) = setup();
    members.save(&Member::new("old", i32::MAX)).unwrap();

    let err = members.bulk_age_plus(0).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn wide_unsigned_values_are_not_truncated() {
    let (members, _) = setup();
    let mut big = Member::new("big", 10);
    big.team_id = Some(u64::MAX);
    let mut near = Member::new("near", 10);
    near.team_id = Some(i64::MAX as u64);
    members.save_all(&[big, near]).unwrap();

    assert_eq!(
        members.count_by(&Filter::new().equal("team_id", u64::MAX)).unwrap(),
        1
    );

    let updated = members
        .bulk_update(&Filter::new().equal("username", "big"), "team_id", |v| v.clone())
        .unwrap();
    assert_eq!(updated, 1);

    let big = members.find_member_by_username("big").unwrap().unwrap();
    assert_eq!(big.team_id, Some(u64::MAX));
}
