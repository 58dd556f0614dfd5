use derived_repo::{Query, Sort};

use crate::setup;
use crate::support::member::{Member, MemberDto};
use crate::support::member_repository::{NestedProjection, TeamInfo};
use crate::support::team::Team;

#[test]
fn username_list() {
    let (members, _) = setup();
    members.save(&Member::new("memberA", 10)).unwrap();
    members.save(&Member::new("memberB", 20)).unwrap();

    assert_eq!(members.find_username_list().unwrap(), vec!["memberA", "memberB"]);
}

#[test]
fn member_dto_joins_team_name() {
    let (members, teams) = setup();
    let team = teams.save(&Team::new("teamA")).unwrap();
    let member = members.save(&Member::new("memberA", 10).in_team(&team)).unwrap();
    let loner = members.save(&Member::new("memberB", 10)).unwrap();

    assert_eq!(
        members.find_member_dto(&teams).unwrap(),
        vec![
            MemberDto {
                id: member.id.unwrap(),
                username: "memberA".into(),
                team_name: Some("teamA".into()),
            },
            MemberDto {
                id: loner.id.unwrap(),
                username: "memberB".into(),
                team_name: None,
            },
        ]
    );
}

#[test]
fn fetch_join_resolves_teams_eagerly() {
    let (members, teams) = setup();
    let team_a = teams.save(&Team::new("teamA")).unwrap();
    let team_b = teams.save(&Team::new("teamB")).unwrap();
    members.save(&Member::new("member1", 10).in_team(&team_a)).unwrap();
    members.save(&Member::new("member2", 20).in_team(&team_b)).unwrap();

    let joined = members
        .fetch_join(members.find_all().unwrap(), "team_id", &teams)
        .unwrap();
    let pairs: Vec<_> = joined
        .iter()
        .map(|j| {
            (
                j.record.username.as_str(),
                j.associated.as_ref().map(|t| t.name.as_str()),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![("member1", Some("teamA")), ("member2", Some("teamB"))]
    );

    // Teams renamed after the join are not reflected in it.
    let mut renamed = team_a.clone();
    renamed.name = "teamZ".into();
    teams.save(&renamed).unwrap();
    assert_eq!(joined[0].associated.as_ref().map(|t| t.name.as_str()), Some("teamA"));
}

#[test]
fn nested_projection() {
    let (members, teams) = setup();
    let team = teams.save(&Team::new("teamA")).unwrap();
    members.save(&Member::new("memberA", 0).in_team(&team)).unwrap();
    members.save(&Member::new("memberB", 0).in_team(&team)).unwrap();

    let result = members.find_projections_by_username("memberA", &teams).unwrap();
    assert_eq!(
        result,
        vec![NestedProjection {
            username: "memberA".into(),
            team: Some(TeamInfo {
                name: "teamA".into()
            }),
        }]
    );
}

#[test]
fn projected_query_with_ordering() {
    let (members, _) = setup();
    for (name, age) in [("a", 30), ("b", 10), ("c", 20)] {
        members.save(&Member::new(name, age)).unwrap();
    }

    let labels = members
        .find_projected(&Query::all().with_sort(Sort::asc("age")), |m| {
            format!("{}:{}", m.username, m.age)
        })
        .unwrap();
    assert_eq!(labels, vec!["b:10", "c:20", "a:30"]);
}
