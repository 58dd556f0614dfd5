use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use derived_repo::{
    AuditingRepository, FixedAuditor, FixedClock, InMemoryRecordStore, RepositoriesExt,
};

use crate::support::logging;
use crate::support::member::Member;

#[test]
fn created_stamps_are_kept_and_modified_stamps_refresh() {
    logging::init();
    let store = InMemoryRecordStore::new();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let clock = FixedClock::at(start);
    let members = AuditingRepository::new(
        store.repository::<Member>(),
        FixedAuditor::new("admin"),
        clock.clone(),
    );

    let mut member = members.save(&Member::new("member1", 10)).unwrap();
    assert_eq!(member.audit.created_at, Some(start));
    assert_eq!(member.audit.last_modified_at, Some(start));

    clock.advance(Duration::milliseconds(100));
    member.username = "member2".into();
    let updated = members.save(&member).unwrap();

    assert_eq!(updated.audit.created_by.as_deref(), Some("admin"));
    assert_eq!(updated.audit.created_at, Some(start));
    assert_eq!(
        updated.audit.last_modified_at,
        Some(start + Duration::milliseconds(100))
    );
    assert_eq!(members.get(&updated.id.unwrap()).unwrap(), updated);
}

#[test]
fn audit_fields_are_not_queryable() {
    logging::init();
    let store = InMemoryRecordStore::new();
    let members = AuditingRepository::new(
        store.repository::<Member>(),
        || None::<String>,
        FixedClock::at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
    );
    let saved = members.save(&Member::new("member1", 10)).unwrap();

    assert_eq!(saved.audit.created_by, None);
    assert!(saved.audit.created_at.is_some());
    assert!(members
        .find_field_values(&derived_repo::Query::all(), "audit")
        .is_err());
}

#[test]
fn racing_creates_agree_on_one_creator() {
    logging::init();
    let store = InMemoryRecordStore::new();
    let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let members = AuditingRepository::new(
                store.repository::<Member>(),
                FixedAuditor::new(format!("writer{t}")),
                clock.clone(),
            );
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut member = Member::new("shared", t);
                member.id = Some(42);
                barrier.wait();
                members.save(&member)
            })
        })
        .collect();

    let saved: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter_map(Result::ok)
        .collect();
    assert!(!saved.is_empty());

    let stored = store.repository::<Member>().get(&42).unwrap();
    assert!(saved
        .iter()
        .all(|m| m.audit.created_by == stored.audit.created_by));
    assert_eq!(store.repository::<Member>().count().unwrap(), 1);
}
