//! Cursor Tests
//!
//! Tests for full key-space iteration.

use std::collections::BTreeSet;

use tyrantkv::mock::MockServer;
use tyrantkv::Handle;

fn setup() -> (MockServer, Handle) {
    let server = MockServer::start().unwrap();
    let db = Handle::open(&server.host(), server.port()).unwrap();
    (server, db)
}

fn collect_keys(db: &mut Handle) -> Vec<Vec<u8>> {
    db.keys()
        .unwrap()
        .collect::<tyrantkv::Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn test_keys_yields_every_key_once() {
    let (_server, mut db) = setup();
    for i in 0..50 {
        db.put(format!("key_{:03}", i), "v").unwrap();
    }

    let keys = collect_keys(&mut db);
    assert_eq!(keys.len(), 50);

    let unique: BTreeSet<_> = keys.into_iter().collect();
    assert_eq!(unique.len(), 50);
    assert!(unique.contains(&b"key_000".to_vec()));
    assert!(unique.contains(&b"key_049".to_vec()));
}

#[test]
fn test_keys_restarts() {
    let (_server, mut db) = setup();
    db.put("a", "1").unwrap();
    db.put("b", "2").unwrap();
    db.put("c", "3").unwrap();

    // Abandon the first iteration part way through
    let first = db.keys().unwrap().next().unwrap().unwrap();
    assert!(!first.is_empty());

    assert_eq!(collect_keys(&mut db).len(), 3);
    assert_eq!(collect_keys(&mut db).len(), 3);
}

#[test]
fn test_keys_on_empty_store() {
    let (_server, mut db) = setup();
    let mut keys = db.keys().unwrap();
    assert!(keys.next().is_none());
    // Fused: stays exhausted
    assert!(keys.next().is_none());
}

#[test]
fn test_manual_iteration() {
    let (_server, mut db) = setup();
    db.put("x", "1").unwrap();
    db.put("y", "2").unwrap();

    db.iter_init().unwrap();
    let mut seen = Vec::new();
    while let Some(key) = db.iter_next().unwrap() {
        seen.push(key);
    }
    assert_eq!(seen, vec![b"x".to_vec(), b"y".to_vec()]);
    assert_eq!(db.iter_next().unwrap(), None);
}

#[test]
fn test_iter_next_without_init() {
    let (_server, mut db) = setup();
    db.put("x", "1").unwrap();
    assert_eq!(db.iter_next().unwrap(), None);
}

#[test]
fn test_cursors_are_per_handle() {
    let server = MockServer::start().unwrap();
    let mut first = Handle::open(&server.host(), server.port()).unwrap();
    let mut second = Handle::open(&server.host(), server.port()).unwrap();
    first.put("a", "1").unwrap();
    first.put("b", "2").unwrap();

    first.iter_init().unwrap();
    assert_eq!(first.iter_next().unwrap(), Some(b"a".to_vec()));

    // Iterating on another handle does not move the first cursor
    assert_eq!(collect_keys(&mut second).len(), 2);
    assert_eq!(first.iter_next().unwrap(), Some(b"b".to_vec()));
    assert_eq!(first.iter_next().unwrap(), None);
}

#[test]
fn test_keys_sees_deleted_keys_removed() {
    let (_server, mut db) = setup();
    db.put("a", "1").unwrap();
    db.put("b", "2").unwrap();
    db.out("a").unwrap();

    assert_eq!(collect_keys(&mut db), vec![b"b".to_vec()]);
}
