//! Wire-List Tests
//!
//! Tests for value conversion and the flat list encodings.

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;
use tyrantkv::wire::{
    format_number, list_to_mapping, list_to_sequence, mapping_to_list, sequence_to_list, Value,
    WireList,
};

// =============================================================================
// Value Conversion Tests
// =============================================================================

#[test]
fn test_text_and_bytes_pass_through() {
    assert_eq!(Value::from("abc").into_wire(), Some(b"abc".to_vec()));
    assert_eq!(Value::from(vec![0u8, 255, 7]).into_wire(), Some(vec![0u8, 255, 7]));
    assert_eq!(Value::from(&b"\x00\x01"[..]).into_wire(), Some(vec![0u8, 1]));
}

#[test]
fn test_integers_become_decimal_text() {
    assert_eq!(Value::from(42).into_wire(), Some(b"42".to_vec()));
    assert_eq!(Value::from(-7i64).into_wire(), Some(b"-7".to_vec()));
    assert_eq!(Value::from(0u32).into_wire(), Some(b"0".to_vec()));
}

#[test]
fn test_booleans_and_nil_are_not_convertible() {
    assert_eq!(Value::from(true).into_wire(), None);
    assert_eq!(Value::Nil.into_wire(), None);
    assert_eq!(Value::from(None::<&str>).into_wire(), None);
    assert!(!Value::from(false).is_convertible());
    assert!(Value::from(Some("x")).is_convertible());
}

#[test]
fn test_format_number() {
    assert_eq!(format_number(5.0), "5");
    assert_eq!(format_number(1.5), "1.5");
    assert_eq!(format_number(-2.25), "-2.25");
    assert_eq!(format_number(0.0), "0");
    assert_eq!(format_number(0.1), "0.1");
    assert_eq!(format_number(0.0001), "0.0001");
    assert_eq!(format_number(1e-5), "1e-05");
    assert_eq!(format_number(1e15), "1e+15");
    assert_eq!(format_number(123456789.0), "123456789");
    assert_eq!(format_number(f64::NAN), "nan");
    assert_eq!(format_number(f64::INFINITY), "inf");
    assert_eq!(format_number(f64::NEG_INFINITY), "-inf");
}

// =============================================================================
// Sequence Encoding Tests
// =============================================================================

#[test]
fn test_sequence_to_list_preserves_order() {
    let list = sequence_to_list(["c", "a", "b"]);
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(0), Some(&b"c"[..]));
    assert_eq!(list.get(1), Some(&b"a"[..]));
    assert_eq!(list.get(2), Some(&b"b"[..]));
}

#[test]
fn test_sequence_to_list_mixed_values() {
    let list = sequence_to_list(vec![
        Value::from("a"),
        Value::from(1),
        Value::from(2.5),
        Value::from(true),
        Value::Nil,
    ]);
    assert_eq!(list_to_sequence(list), vec![b"a".to_vec(), b"1".to_vec(), b"2.5".to_vec()]);
}

#[test]
fn test_empty_sequence() {
    let list = sequence_to_list(Vec::<String>::new());
    assert!(list.is_empty());
    assert!(list_to_sequence(list).is_empty());
}

// =============================================================================
// Mapping Encoding Tests
// =============================================================================

#[test]
fn test_mapping_to_list_alternates_keys_and_values() {
    let mut mapping = BTreeMap::new();
    mapping.insert("a", "1");
    mapping.insert("b", "2");

    let list = mapping_to_list(mapping);
    let elements: Vec<&[u8]> = list.iter().collect();
    assert_eq!(elements, vec![&b"a"[..], &b"1"[..], &b"b"[..], &b"2"[..]]);
}

#[test]
fn test_mapping_to_list_drops_unconvertible_pairs() {
    let entries = vec![
        (Value::from("a"), Value::from("1")),
        (Value::from("b"), Value::from(true)),
        (Value::Nil, Value::from("3")),
        (Value::from(4), Value::from(4.5)),
    ];

    let list = mapping_to_list(entries);
    assert_eq!(list.len(), 4);
    assert_eq!(list.payload_len(), "a1".len() + "44.5".len());

    let mapping = list_to_mapping(list);
    assert_eq!(mapping.get(&b"a"[..]), Some(&b"1".to_vec()));
    assert_eq!(mapping.get(&b"4"[..]), Some(&b"4.5".to_vec()));
}

#[test]
fn test_list_to_mapping_ignores_trailing_element() {
    let list = WireList::from(vec![b"k".to_vec(), b"v".to_vec(), b"orphan".to_vec()]);
    let mapping = list_to_mapping(list);
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.get(&b"k"[..]), Some(&b"v".to_vec()));
}

#[test]
fn test_list_to_mapping_later_keys_win() {
    let list: WireList = vec![b"k".to_vec(), b"old".to_vec(), b"k".to_vec(), b"new".to_vec()]
        .into_iter()
        .collect();
    let mapping = list_to_mapping(list);
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.get(&b"k"[..]), Some(&b"new".to_vec()));
}

#[test]
fn test_pairs_view() {
    let list = mapping_to_list(vec![("x", "1"), ("y", "2")]);
    let pairs: Vec<(&[u8], &[u8])> = list.pairs().collect();
    assert_eq!(pairs, vec![(&b"x"[..], &b"1"[..]), (&b"y"[..], &b"2"[..])]);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_sequence_roundtrip(items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..50)) {
        let list = sequence_to_list(items.clone());
        prop_assert_eq!(list.len(), items.len());
        prop_assert_eq!(list_to_sequence(list), items);
    }

    #[test]
    fn prop_mapping_roundtrip(mapping in prop::collection::hash_map(
        prop::collection::vec(any::<u8>(), 0..16),
        prop::collection::vec(any::<u8>(), 0..32),
        0..50,
    )) {
        let list = mapping_to_list(mapping.clone());
        prop_assert_eq!(list.len(), mapping.len() * 2);
        let decoded: HashMap<Vec<u8>, Vec<u8>> = list_to_mapping(list);
        prop_assert_eq!(decoded, mapping);
    }

    #[test]
    fn prop_integers_match_display(n in any::<i64>()) {
        prop_assert_eq!(Value::from(n).into_wire(), Some(n.to_string().into_bytes()));
    }
}
