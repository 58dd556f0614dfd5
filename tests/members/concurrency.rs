use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use derived_repo::{Filter, InMemoryRecordStore, RepoError, RepositoriesExt};

use crate::support::logging;
use crate::support::member::Member;

const THREADS: usize = 8;
const PER_THREAD: usize = 25;

#[test]
fn concurrent_saves_get_distinct_ids() {
    logging::init();
    let store = InMemoryRecordStore::new();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let members = store.repository::<Member>();
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|i| {
                        members
                            .save(&Member::new(&format!("member-{t}-{i}"), i as i32))
                            .unwrap()
                            .id
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.extend(handle.join().unwrap());
    }

    let members = store.repository::<Member>();
    assert_eq!(ids.len(), THREADS * PER_THREAD);
    assert_eq!(members.count().unwrap(), THREADS * PER_THREAD);
}

#[test]
fn concurrent_bulk_updates_are_not_lost() {
    logging::init();
    let store = InMemoryRecordStore::new();
    let members = store.repository::<Member>();
    for i in 0..10 {
        members.save(&Member::new(&format!("member{i}"), 0)).unwrap();
    }

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let members = members.clone();
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    members
                        .bulk_update(&Filter::new(), "age", |age| age.plus(1))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let expected = (THREADS * PER_THREAD) as i32;
    assert!(members.find_all().unwrap().iter().all(|m| m.age == expected));
}

#[test]
fn only_one_versioned_update_wins() {
    logging::init();
    let store = InMemoryRecordStore::new();
    let members = store.repository::<Member>();
    let saved = members.save(&Member::new("member1", 10)).unwrap();
    let version = members
        .find_versioned_by_id(&saved.id.unwrap())
        .unwrap()
        .unwrap()
        .version;

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let members = members.clone();
            let barrier = Arc::clone(&barrier);
            let mut record = saved.clone();
            thread::spawn(move || {
                record.age = 20 + t as i32;
                barrier.wait();
                members.update_versioned(&record, version)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results.iter().filter(|r| r.is_err()).all(|r| matches!(
        r,
        Err(RepoError::ConcurrentModification { expected, actual, .. })
            if *expected == version && *actual == version + 1
    )));
    assert_eq!(
        members
            .find_versioned_by_id(&saved.id.unwrap())
            .unwrap()
            .unwrap()
            .version,
        version + 1
    );
}
