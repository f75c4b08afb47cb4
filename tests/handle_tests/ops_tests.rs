//! Operation Tests
//!
//! Every store operation exercised against the mock server.

use std::collections::HashMap;
use std::net::TcpListener;
use std::thread;

use tyrantkv::mock::MockServer;
use tyrantkv::protocol::{read_command, write_reply, Body, Command, Reply, MAX_PAYLOAD_SIZE};
use tyrantkv::wire::sequence_to_list;
use tyrantkv::{
    ErrorCode, ExtOptions, Handle, MiscOptions, PutMode, RestoreOptions, TyrantError, Value,
};

fn setup() -> (MockServer, Handle) {
    let server = MockServer::builder()
        .extension("echo", |key, value| {
            let mut result = key.to_vec();
            result.extend_from_slice(value);
            Some(result)
        })
        .extension("fail", |_, _| None)
        .start()
        .unwrap();
    let db = Handle::open(&server.host(), server.port()).unwrap();
    (server, db)
}

// =============================================================================
// Put / Get Tests
// =============================================================================

#[test]
fn test_put_get() {
    let (_server, mut db) = setup();
    db.put("k", "v").unwrap();
    assert_eq!(db.get("k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn test_get_missing_is_none() {
    let (_server, mut db) = setup();
    assert_eq!(db.get("missing").unwrap(), None);
}

#[test]
fn test_put_overwrites() {
    let (_server, mut db) = setup();
    db.put("k", "one").unwrap();
    db.put("k", "two").unwrap();
    assert_eq!(db.get("k").unwrap(), Some(b"two".to_vec()));
}

#[test]
fn test_put_binary_values() {
    let (_server, mut db) = setup();
    let value = vec![0u8, 1, 2, 255, 0];
    db.put(&b"bin\x00key"[..], value.clone()).unwrap();
    assert_eq!(db.get(&b"bin\x00key"[..]).unwrap(), Some(value));
}

#[test]
fn test_put_concat() {
    let (_server, mut db) = setup();
    db.put("k", "a").unwrap();
    assert!(db.put_with("k", "b", PutMode::Concat).unwrap());
    assert_eq!(db.get("k").unwrap(), Some(b"ab".to_vec()));
}

#[test]
fn test_put_keep() {
    let (_server, mut db) = setup();
    assert!(db.put_with("k", "first", PutMode::Keep).unwrap());
    assert!(!db.put_with("k", "second", PutMode::Keep).unwrap());
    assert_eq!(db.get("k").unwrap(), Some(b"first".to_vec()));
}

#[test]
fn test_put_shift_left() {
    let (_server, mut db) = setup();
    db.put("k", "abc").unwrap();
    db.put_with("k", "def", PutMode::ConcatShiftLeft { width: 4 })
        .unwrap();
    assert_eq!(db.get("k").unwrap(), Some(b"cdef".to_vec()));
}

#[test]
fn test_put_no_reply() {
    let (_server, mut db) = setup();
    assert!(db.put_with("k", "v", PutMode::NoReply).unwrap());
    // Requests on one connection are served in order
    assert_eq!(db.get("k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn test_put_mode_from_code() {
    use tyrantkv::options::{RDBPUT, RDBPUTCAT, RDBPUTKEEP, RDBPUTNR, RDBPUTSHL};

    assert_eq!(PutMode::from_code(RDBPUT, None).unwrap(), PutMode::Overwrite);
    assert_eq!(PutMode::from_code(RDBPUTKEEP, None).unwrap(), PutMode::Keep);
    assert_eq!(PutMode::from_code(RDBPUTCAT, None).unwrap(), PutMode::Concat);
    assert_eq!(
        PutMode::from_code(RDBPUTSHL, Some(8)).unwrap(),
        PutMode::ConcatShiftLeft { width: 8 }
    );
    assert_eq!(PutMode::from_code(RDBPUTNR, None).unwrap(), PutMode::NoReply);
    assert!(PutMode::from_code(RDBPUTSHL, None).is_err());
    assert!(PutMode::from_code(99, None).is_err());
    assert_eq!(PutMode::Concat.code(), RDBPUTCAT);
}

#[test]
fn test_numeric_keys_and_values_are_text() {
    let (_server, mut db) = setup();
    db.put(1, 2).unwrap();
    db.put(1.5, 0.25).unwrap();

    assert_eq!(db.get("1").unwrap(), Some(b"2".to_vec()));
    assert_eq!(db.get("1.5").unwrap(), Some(b"0.25".to_vec()));
    assert_eq!(db.get(1).unwrap(), Some(b"2".to_vec()));
}

#[test]
fn test_unconvertible_arguments_are_local_errors() {
    let (server, mut db) = setup();

    let err = db.put(true, "v").unwrap_err();
    assert!(matches!(err, TyrantError::InvalidArgument(_)));
    assert!(err.is_local());

    assert!(db.get(Value::Nil).unwrap_err().is_local());
    assert!(db.put("k", None::<&str>).unwrap_err().is_local());
    assert!(server.store().is_empty());
}

#[test]
fn test_oversized_value_rejected_before_sending() {
    let (server, mut db) = setup();

    let err = db.put("big", vec![0u8; MAX_PAYLOAD_SIZE as usize + 1]).unwrap_err();
    assert!(matches!(err, TyrantError::InvalidArgument(_)));
    assert!(err.is_local());
    assert!(server.store().is_empty());

    // Nothing reached the socket, so the connection is still in sync
    db.put("small", "v").unwrap();
    assert_eq!(db.get("small").unwrap(), Some(b"v".to_vec()));
}

// =============================================================================
// Batched Tests
// =============================================================================

#[test]
fn test_put_list_get_list() {
    let (_server, mut db) = setup();

    let mut mapping = HashMap::new();
    mapping.insert("a", "1");
    mapping.insert("b", "2");
    db.put_list(mapping, MiscOptions::NONE).unwrap();

    let found = db.get_list(["a", "b"], MiscOptions::NONE).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found.get(&b"a"[..]), Some(&b"1".to_vec()));
    assert_eq!(found.get(&b"b"[..]), Some(&b"2".to_vec()));
}

#[test]
fn test_get_list_skips_missing() {
    let (_server, mut db) = setup();
    db.put("present", "yes").unwrap();

    let found = db.get_list(vec!["present", "absent"], MiscOptions::NO_UPDATE_LOG).unwrap();
    assert_eq!(found.len(), 1);
    assert!(found.contains_key(&b"present"[..]));
}

#[test]
fn test_get_list_sends_options() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let command = read_command(&mut stream).unwrap();
        write_reply(&mut stream, &Reply::ok(Body::List(Default::default()))).unwrap();
        command
    });

    let mut db = Handle::open("127.0.0.1", port).unwrap();
    let found = db.get_list(["a"], MiscOptions::NO_UPDATE_LOG).unwrap();
    assert!(found.is_empty());

    match server.join().unwrap() {
        Command::Misc { name, options, .. } => {
            assert_eq!(name, b"getlist".to_vec());
            assert_eq!(options, MiscOptions::NO_UPDATE_LOG.bits());
        }
        other => panic!("expected misc command, got {:?}", other),
    }
}

#[test]
fn test_put_list_numeric_values() {
    let (_server, mut db) = setup();
    db.put_list(vec![("n", Value::from(10)), ("f", Value::from(2.5))], MiscOptions::NO_UPDATE_LOG)
        .unwrap();

    assert_eq!(db.get("n").unwrap(), Some(b"10".to_vec()));
    assert_eq!(db.get("f").unwrap(), Some(b"2.5".to_vec()));
}

#[test]
fn test_out_list() {
    let (_server, mut db) = setup();
    db.put_list(vec![("a", "1"), ("b", "2"), ("c", "3")], MiscOptions::NONE)
        .unwrap();

    db.out_list(["a", "b"], MiscOptions::NONE).unwrap();
    assert_eq!(db.rnum().unwrap(), 1);
    assert_eq!(db.get("c").unwrap(), Some(b"3".to_vec()));
}

#[test]
fn test_out_list_missing_key_fails() {
    let (_server, mut db) = setup();
    db.put("a", "1").unwrap();

    let err = db.out_list(["a", "zzz"], MiscOptions::NONE).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Misc);
    assert_eq!(db.get("a").unwrap(), None);
}

#[test]
fn test_misc_raw_call() {
    let (_server, mut db) = setup();
    db.put("k", "v").unwrap();

    let reply = db
        .misc("getlist", MiscOptions::NONE, sequence_to_list(["k"]))
        .unwrap();
    let elements: Vec<&[u8]> = reply.iter().collect();
    assert_eq!(elements, vec![&b"k"[..], &b"v"[..]]);

    let err = db
        .misc("no_such_proc", MiscOptions::NONE, sequence_to_list(["k"]))
        .unwrap_err();
    assert!(matches!(err, TyrantError::Remote { code: ErrorCode::Misc }));
}

// =============================================================================
// Out / Vsize Tests
// =============================================================================

#[test]
fn test_out() {
    let (_server, mut db) = setup();
    db.put("k", "v").unwrap();
    db.out("k").unwrap();
    assert_eq!(db.get("k").unwrap(), None);
}

#[test]
fn test_out_missing_is_no_record() {
    let (_server, mut db) = setup();
    let err = db.out("missing").unwrap_err();
    assert!(err.is_no_record());
    assert_eq!(err.code().as_i32(), 7);
    assert_eq!(err.message(), "no record found");

    assert!(db.del("missing").unwrap_err().is_no_record());
}

#[test]
fn test_vsize() {
    let (_server, mut db) = setup();
    db.put("k", "hello").unwrap();
    assert_eq!(db.vsize("k").unwrap(), Some(5));
    assert_eq!(db.vsize("missing").unwrap(), None);
}

// =============================================================================
// Counter Tests
// =============================================================================

#[test]
fn test_add_num() {
    let (_server, mut db) = setup();
    assert_eq!(db.add_num("counter", 5.0).unwrap(), 5.0);
    assert_eq!(db.add_num("counter", 3.0).unwrap(), 8.0);
    assert_eq!(db.add_num("counter", -0.5).unwrap(), 7.5);
}

#[test]
fn test_add_int() {
    let (_server, mut db) = setup();
    assert_eq!(db.add_int("n", 2).unwrap(), 2);
    assert_eq!(db.add_int("n", 3).unwrap(), 5);
    assert_eq!(db.add_int("n", -10).unwrap(), -5);
    assert_eq!(db.vsize("n").unwrap(), Some(4));
}

#[test]
fn test_add_to_non_numeric_record_fails() {
    let (_server, mut db) = setup();
    db.put("text", "abc").unwrap();

    assert_eq!(db.add_num("text", 1.0).unwrap_err().code(), ErrorCode::Misc);
    assert_eq!(db.add_int("text", 1).unwrap_err().code(), ErrorCode::Misc);
}

// =============================================================================
// Prefix Search Tests
// =============================================================================

#[test]
fn test_fwmkeys() {
    let (_server, mut db) = setup();
    for key in ["pre1", "pre2", "pre3", "other"] {
        db.put(key, "v").unwrap();
    }

    let all = db.fwmkeys("pre", None).unwrap();
    assert_eq!(all, vec![b"pre1".to_vec(), b"pre2".to_vec(), b"pre3".to_vec()]);

    let limited = db.fwmkeys("pre", Some(2)).unwrap();
    assert_eq!(limited.len(), 2);
    assert!(limited.iter().all(|key| key.starts_with(b"pre")));

    assert!(db.fwmkeys("nothing", None).unwrap().is_empty());
}

// =============================================================================
// Extension Tests
// =============================================================================

#[test]
fn test_ext() {
    let (_server, mut db) = setup();
    let result = db.ext("echo", "key", "value", ExtOptions::LOCK_RECORD).unwrap();
    assert_eq!(result, b"keyvalue".to_vec());
}

#[test]
fn test_ext_failure() {
    let (_server, mut db) = setup();
    assert_eq!(
        db.ext("fail", "k", "v", ExtOptions::NONE).unwrap_err().code(),
        ErrorCode::Misc
    );
    assert!(db
        .ext("unknown", "k", "v", ExtOptions::LOCK_RECORD | ExtOptions::LOCK_GLOBAL)
        .is_err());
}

// =============================================================================
// Administration Tests
// =============================================================================

#[test]
fn test_sync_and_optimize() {
    let (_server, mut db) = setup();
    db.sync().unwrap();
    db.optimize(None).unwrap();
    db.optimize(Some("bnum=1000")).unwrap();
}

#[test]
fn test_vanish() {
    let (_server, mut db) = setup();
    db.put("a", "1").unwrap();
    db.put("b", "2").unwrap();
    db.vanish().unwrap();
    assert!(db.is_empty().unwrap());
}

#[test]
fn test_copy_and_restore() {
    let (_server, mut db) = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.tkvs");
    let path = path.to_str().unwrap();

    db.put("a", "1").unwrap();
    db.put("b", "2").unwrap();
    db.copy(path).unwrap();

    db.vanish().unwrap();
    db.put("c", "3").unwrap();

    db.restore(path, 0, RestoreOptions::CONSISTENCY_CHECK).unwrap();
    assert_eq!(db.rnum().unwrap(), 2);
    assert_eq!(db.get("a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(db.get("c").unwrap(), None);
}

#[test]
fn test_restore_missing_file_fails() {
    let (_server, mut db) = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.tkvs");

    let err = db
        .restore(path.to_str().unwrap(), 0, RestoreOptions::NONE)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Misc);
}

#[test]
fn test_set_master() {
    let (server, mut db) = setup();
    db.set_master(Some("master.local"), 1979, 0, RestoreOptions::NONE)
        .unwrap();

    let stat = db.stat_map().unwrap();
    assert_eq!(stat.get("mhost").map(String::as_str), Some("master.local"));
    assert_eq!(stat.get("mport").map(String::as_str), Some("1979"));
    assert_eq!(server.store().master(), Some(("master.local".to_string(), 1979)));

    db.set_master(None, 0, 0, RestoreOptions::NONE).unwrap();
    assert!(!db.stat_map().unwrap().contains_key("mhost"));
}

// =============================================================================
// Introspection Tests
// =============================================================================

#[test]
fn test_rnum_and_size() {
    let (_server, mut db) = setup();
    assert_eq!(db.rnum().unwrap(), 0);
    assert!(db.is_empty().unwrap());

    db.put("ab", "cde").unwrap();
    assert_eq!(db.rnum().unwrap(), 1);
    assert_eq!(db.len().unwrap(), 1);
    assert_eq!(db.size().unwrap(), 5);
}

#[test]
fn test_stat() {
    let (_server, mut db) = setup();
    db.put("k", "v").unwrap();

    let text = db.stat().unwrap();
    assert!(text.contains("rnum\t1\n"));

    let stat = db.stat_map().unwrap();
    assert_eq!(stat.get("type").map(String::as_str), Some("mock"));
    assert_eq!(stat.get("rnum").map(String::as_str), Some("1"));
}
