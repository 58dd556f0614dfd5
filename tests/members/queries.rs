use derived_repo::{Filter, Query, RepoError, Sort};

use crate::setup;
use crate::support::member::Member;

#[test]
fn find_by_username_and_age_greater_than() {
    let (members, _) = setup();
    members.save(&Member::new("member", 10)).unwrap();
    let member2 = members.save(&Member::new("member", 20)).unwrap();

    let found = members
        .find_by_username_and_age_greater_than("member", 15)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, member2.username);
    assert_eq!(found[0].age, member2.age);
}

#[test]
fn named_and_hand_written_queries() {
    let (members, _) = setup();
    let member = members.save(&Member::new("memberA", 10)).unwrap();

    assert_eq!(members.find_by_username("memberA").unwrap(), vec![member.clone()]);
    assert_eq!(members.find_user("memberA", 10).unwrap(), vec![member]);
    assert!(members.find_user("memberA", 11).unwrap().is_empty());
}

#[test]
fn find_by_names() {
    let (members, _) = setup();
    for name in ["memberA", "memberB", "memberC"] {
        members.save(&Member::new(name, 10)).unwrap();
    }

    let found = members.find_by_names(&["memberA", "memberC"]).unwrap();
    let names: Vec<_> = found.iter().map(|m| m.username.as_str()).collect();
    assert_eq!(names, vec!["memberA", "memberC"]);
}

#[test]
fn return_types() {
    let (members, _) = setup();
    members.save(&Member::new("memberA", 10)).unwrap();
    members.save(&Member::new("memberA", 20)).unwrap();

    assert_eq!(members.find_member_by_username("memberC").unwrap(), None);
    assert!(members.find_list_by_username("memberC").unwrap().is_empty());
    assert_eq!(members.find_list_by_username("memberA").unwrap().len(), 2);

    let err = members.find_member_by_username("memberA").unwrap_err();
    assert_eq!(
        err,
        RepoError::NonUniqueResult {
            collection: "members".into(),
            count: 2,
        }
    );
}

#[test]
fn find_first_ignores_uniqueness() {
    let (members, _) = setup();
    members.save(&Member::new("memberA", 10)).unwrap();
    members.save(&Member::new("memberA", 20)).unwrap();

    let query = Query::matching(Filter::new().equal("username", "memberA"))
        .with_sort(Sort::desc("age"));
    let first = members.find_first(&query).unwrap().unwrap();
    assert_eq!(first.age, 20);
}

#[test]
fn nulls_only_match_null_checks() {
    let (members, teams) = setup();
    let team = teams.save(&crate::support::team::Team::new("teamA")).unwrap();
    members.save(&Member::new("member1", 10).in_team(&team)).unwrap();
    members.save(&Member::new("member2", 20)).unwrap();

    let without_team = members.count_by(&Filter::new().is_null("team_id")).unwrap();
    assert_eq!(without_team, 1);

    // Comparisons never match a null field.
    let not_team = members
        .count_by(&Filter::new().not_equal("team_id", team.id.unwrap()))
        .unwrap();
    assert_eq!(not_team, 0);
}

#[test]
fn ties_keep_insertion_order() {
    let (members, _) = setup();
    for (name, age) in [("c", 20), ("a", 10), ("b", 20), ("d", 10)] {
        members.save(&Member::new(name, age)).unwrap();
    }

    let sorted = members
        .find_all_by(&Query::all().with_sort(Sort::asc("age")))
        .unwrap();
    let names: Vec<_> = sorted.iter().map(|m| m.username.as_str()).collect();
    assert_eq!(names, vec!["a", "d", "c", "b"]);
}

#[test]
fn invalid_queries_fail_before_touching_the_store() {
    let (members, _) = setup();
    members.save(&Member::new("memberA", 10)).unwrap();

    let unknown = members.find_all_by(&Query::matching(Filter::new().equal("nickname", "x")));
    assert!(matches!(unknown, Err(RepoError::Validation(_))));

    let mismatched = members.count_by(&Filter::new().gt("username", 3));
    assert!(matches!(mismatched, Err(RepoError::Validation(_))));

    let bad_sort = members.find_all_by(&Query::all().with_sort(Sort::asc("rank")));
    assert!(matches!(bad_sort, Err(RepoError::Validation(_))));

    let bad_delete = members.delete_by(&Filter::new().equal("nickname", "memberA"));
    assert!(matches!(bad_delete, Err(RepoError::Validation(_))));
    assert_eq!(members.count().unwrap(), 1);
}
