use derived_repo::{Example, ExampleMatcher, RepoError, StringMatcher};

use crate::setup;
use crate::support::member::Member;
use crate::support::team::Team;

#[test]
fn query_by_example_ignoring_age() {
    let (members, teams) = setup();
    let team = teams.save(&Team::new("teamA")).unwrap();
    members.save(&Member::new("memberA", 0).in_team(&team)).unwrap();
    members.save(&Member::new("memberB", 0).in_team(&team)).unwrap();
    members.save(&Member::new("memberA", 35).in_team(&team)).unwrap();

    let probe = Member::named("memberA").in_team(&team);
    let example =
        Example::of(probe).with_matcher(ExampleMatcher::matching().with_ignore_paths(["age"]));
    let found = members.find_all_by_example(&example).unwrap();

    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|m| m.username == "memberA"));
    assert_eq!(members.count_by_example(&example).unwrap(), 2);
}

#[test]
fn default_age_is_not_matched() {
    let (members, _) = setup();
    members.save(&Member::new("memberA", 10)).unwrap();

    let example = Example::of(Member::named("memberA"));
    assert!(members.exists_by_example(&example).unwrap());
    assert_eq!(
        members.find_one_by_example(&example).unwrap().map(|m| m.age),
        Some(10)
    );
}

#[test]
fn string_matcher() {
    let (members, _) = setup();
    for name in ["alpha", "alphabet", "beta"] {
        members.save(&Member::named(name)).unwrap();
    }

    let example = Example::of(Member::named("alpha"))
        .with_matcher(ExampleMatcher::matching().with_string_matcher(StringMatcher::StartsWith));
    assert_eq!(members.count_by_example(&example).unwrap(), 2);

    let contains = Example::of(Member::named("et"))
        .with_matcher(ExampleMatcher::matching().with_string_matcher(StringMatcher::Contains));
    let names: Vec<_> = members
        .find_all_by_example(&contains)
        .unwrap()
        .into_iter()
        .map(|m| m.username)
        .collect();
    assert_eq!(names, vec!["alphabet", "beta"]);
}

#[test]
fn include_nulls_requires_missing_team() {
    let (members, teams) = setup();
    let team = teams.save(&Team::new("teamA")).unwrap();
    members.save(&Member::new("memberA", 0)).unwrap();
    members.save(&Member::new("memberA", 0).in_team(&team)).unwrap();

    let example = Example::of(Member::named("memberA"))
        .with_matcher(ExampleMatcher::matching().with_include_nulls());
    let found = members.find_one_by_example(&example).unwrap().unwrap();
    assert_eq!(found.team_id, None);
}

#[test]
fn unknown_ignored_path_is_rejected() {
    let (members, _) = setup();
    let example = Example::of(Member::named("memberA"))
        .with_matcher(ExampleMatcher::matching().with_ignore_paths(["team"]));
    assert!(matches!(
        members.find_all_by_example(&example),
        Err(RepoError::Validation(_))
    ));
}
