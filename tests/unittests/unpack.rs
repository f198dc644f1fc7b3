// Structured unpack/repack behavior, including the array cycle guard.
use strand::mirror::{repack, unpack_value};
use strand::{Heap, TypeTag, Value};

#[test]
fn test_scalar_unpack_has_type_and_payload() {
    let heap = Heap::new();
    let o = unpack_value(Value::Double(1.5), &heap).unwrap();
    assert_eq!(o.type_tag, TypeTag::Double);
    assert_eq!(o.as_double(), Some(1.5));
}

#[test]
fn test_null_and_invalid_have_no_payload() {
    let heap = Heap::new();
    assert!(unpack_value(Value::Null, &heap).unwrap().payload.is_none());
    assert!(unpack_value(Value::Invalid, &heap)
        .unwrap()
        .payload
        .is_none());
}

#[test]
fn test_unpack_materializes_array_eagerly() {
    let mut heap = Heap::new();
    let inner = heap.alloc_array(vec![Value::Int(10), Value::Int(20)]);
    let outer = heap.alloc_array(vec![inner, Value::Int(30)]);
    let o = unpack_value(outer, &heap).unwrap();
    let members = o.members().unwrap();
    assert_eq!(members[0].members().unwrap()[1].as_int(), Some(20));
    assert_eq!(members[1].as_int(), Some(30));
}

#[test]
fn test_unpack_then_repack_int_array_roundtrips() {
    // [1, 2, 3] through the mirror and back equals the original
    let mut heap = Heap::new();
    let original = heap.alloc_array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let obj = unpack_value(original, &heap).unwrap();
    let rebuilt = repack(&obj, &mut heap).unwrap();

    let (h1, h2) = match (original, rebuilt) {
        (Value::Array(a), Value::Array(b)) => (a, b),
        other => panic!("expected two arrays, got {:?}", other),
    };
    let before = heap.get_array(h1).unwrap();
    let after = heap.get_array(h2).unwrap();
    assert_eq!(before.len(), after.len());
    assert_eq!(before, after);
}

#[test]
fn test_unpack_directly_cyclic_array_terminates() {
    let mut heap = Heap::new();
    let v = heap.alloc_array(vec![Value::Int(1)]);
    let h = match v {
        Value::Array(h) => h,
        _ => unreachable!(),
    };
    heap.get_array_mut(h).unwrap().push(v);

    let o = unpack_value(v, &heap).unwrap();
    let members = o.members().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1].handle(), Some(h));
}

#[test]
fn test_unpack_indirectly_cyclic_arrays_terminate() {
    // a contains b, b contains a
    let mut heap = Heap::new();
    let a = heap.alloc_array(vec![]);
    let b = heap.alloc_array(vec![a]);
    let ah = match a {
        Value::Array(h) => h,
        _ => unreachable!(),
    };
    heap.get_array_mut(ah).unwrap().push(b);

    let o = unpack_value(a, &heap).unwrap();
    let inner_b = &o.members().unwrap()[0];
    assert_eq!(inner_b.members().unwrap()[0].handle(), Some(ah));
}

#[test]
fn test_duplicate_sibling_arrays_unpack_fully() {
    // the same array twice in one parent is sharing, not a cycle
    let mut heap = Heap::new();
    let shared = heap.alloc_array(vec![Value::Int(5)]);
    let parent = heap.alloc_array(vec![shared, shared]);
    let o = unpack_value(parent, &heap).unwrap();
    let members = o.members().unwrap();
    assert_eq!(members[0].members().unwrap()[0].as_int(), Some(5));
    assert_eq!(members[1].members().unwrap()[0].as_int(), Some(5));
}

#[test]
fn test_unpack_string_and_repack_allocates_copy() {
    let mut heap = Heap::new();
    let v = heap.alloc_str("mirror");
    let o = unpack_value(v, &heap).unwrap();
    assert_eq!(o.as_str(), Some("mirror"));
    let rebuilt = repack(&o, &mut heap).unwrap();
    match (v, rebuilt) {
        (Value::Str(h1), Value::Str(h2)) => {
            assert_ne!(h1, h2);
            assert_eq!(heap.get_str(h2), Some("mirror"));
        }
        other => panic!("expected strings, got {:?}", other),
    }
}
