use derived_repo::RepoError;

use crate::setup;
use crate::support::member::Member;

#[test]
fn save_then_find_by_id() {
    let (members, _) = setup();

    let saved = members.save(&Member::named("memberA")).unwrap();
    let found = members.find_by_id(&saved.id.unwrap()).unwrap().unwrap();

    assert_eq!(found.id, saved.id);
    assert_eq!(found.username, "memberA");
    assert_eq!(found, saved);
}

#[test]
fn basic_crud() {
    let (members, _) = setup();

    let member1 = members.save(&Member::named("memberA")).unwrap();
    let member2 = members.save(&Member::named("memberB")).unwrap();

    assert_eq!(members.get(&member1.id.unwrap()).unwrap(), member1);
    assert_eq!(members.get(&member2.id.unwrap()).unwrap(), member2);

    let all = members.find_all().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(members.count().unwrap(), 2);

    members.delete(&member1).unwrap();
    members.delete(&member2).unwrap();

    assert_eq!(members.count().unwrap(), 0);
    assert_eq!(members.find_by_id(&member1.id.unwrap()).unwrap(), None);
}

#[test]
fn count_matches_find_all() {
    let (members, _) = setup();
    for i in 0..7 {
        members.save(&Member::new(&format!("member{}", i), i)).unwrap();
    }
    members.delete_by_id(&3).unwrap();

    assert_eq!(members.count().unwrap(), members.find_all().unwrap().len());
    assert_eq!(members.count().unwrap(), 6);
}

#[test]
fn get_missing_is_not_found() {
    let (members, _) = setup();
    let err = members.get(&42).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { ref collection, .. } if collection == "members"));
}

#[test]
fn ids_are_not_reused_after_delete() {
    let (members, _) = setup();
    let first = members.save(&Member::named("member1")).unwrap();
    members.delete(&first).unwrap();

    let second = members.save(&Member::named("member2")).unwrap();
    assert_eq!(first.id, Some(1));
    assert_eq!(second.id, Some(2));
}

#[test]
fn update_versioned_detects_lost_writes() {
    let (members, _) = setup();
    let saved = members.save(&Member::new("memberA", 10)).unwrap();
    let id = saved.id.unwrap();

    let loaded = members.find_versioned_by_id(&id).unwrap().unwrap();
    assert_eq!(loaded.version, 1);

    // A second writer gets there first.
    let mut other = loaded.data.clone();
    other.age = 11;
    members.save(&other).unwrap();

    let mut mine = loaded.data;
    mine.age = 12;
    let err = members.update_versioned(&mine, loaded.version).unwrap_err();
    assert_eq!(
        err,
        RepoError::ConcurrentModification {
            collection: "members".into(),
            id: "1".into(),
            expected: 1,
            actual: 2,
        }
    );

    let fresh = members.find_versioned_by_id(&id).unwrap().unwrap();
    mine.age = 13;
    let written = members.update_versioned(&mine, fresh.version).unwrap();
    assert_eq!(written.version, 3);
    assert_eq!(members.get(&id).unwrap().age, 13);
}

#[test]
fn update_versioned_of_deleted_row() {
    let (members, _) = setup();
    let saved = members.save(&Member::new("memberA", 10)).unwrap();
    members.delete(&saved).unwrap();

    let err = members.update_versioned(&saved, 1).unwrap_err();
    assert!(matches!(err, RepoError::ConcurrentModification { actual: 0, .. }));
}
